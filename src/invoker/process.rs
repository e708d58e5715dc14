//! Child process plumbing shared by the tool wrappers

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Lines of stderr kept for error reports
pub(crate) const STDERR_TAIL_LINES: usize = 20;

/// Grace period for pipe readers once the child has exited
const DRAIN_GRACE: Duration = Duration::from_secs(2);

fn spawn(mut command: Command, tool: &'static str) -> Result<Child> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so a timeout also reaches helpers like ffmpeg
    #[cfg(unix)]
    command.process_group(0);

    command
        .spawn()
        .map_err(|e| Error::ExternalTool(format!("Failed to execute {}: {}", tool, e)))
}

fn timeout_error(tool: &'static str, limit: Duration) -> Error {
    Error::ToolTimeout {
        tool,
        seconds: limit.as_secs(),
    }
}

/// Wait for the child, killing its whole process group and reaping it when
/// `limit` elapses first
async fn wait_within(
    child: &mut Child,
    tool: &'static str,
    limit: Option<Duration>,
) -> Result<ExitStatus> {
    let waited = match limit {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(waited) => waited,
            Err(_) => {
                tracing::warn!(tool, seconds = limit.as_secs(), "tool timed out, killing it");
                kill_process_group(child, tool);
                // kill() also waits, so no zombie is left behind
                if let Err(e) = child.kill().await {
                    tracing::warn!(tool, error = %e, "failed to kill timed out tool");
                }
                return Err(timeout_error(tool, limit));
            }
        },
        None => child.wait().await,
    };

    waited.map_err(|e| Error::ExternalTool(format!("Failed to wait for {}: {}", tool, e)))
}

#[cfg(unix)]
fn kill_process_group(child: &Child, tool: &'static str) {
    let Some(pgid) = child.id().and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: kill(2) takes no pointers; a negative pid targets the group the
    // child leads (see `spawn`).
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let e = std::io::Error::last_os_error();
        tracing::debug!(tool, error = %e, "could not signal tool process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child, _tool: &'static str) {}

/// Run a command to completion and collect its output
pub(crate) async fn run_collected(
    command: Command,
    tool: &'static str,
    limit: Option<Duration>,
) -> Result<Output> {
    let mut child = spawn(command, tool)?;

    let stdout_task = child.stdout.take().map(|stdout| tokio::spawn(read_all(stdout)));
    let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(read_all(stderr)));

    let status = match wait_within(&mut child, tool, limit).await {
        Ok(status) => status,
        Err(e) => {
            abort_drain(stdout_task);
            abort_drain(stderr_task);
            return Err(e);
        }
    };

    Ok(Output {
        status,
        stdout: finish_drain(stdout_task).await,
        stderr: finish_drain(stderr_task).await,
    })
}

/// Run a command to completion, logging stderr lines as they arrive
///
/// stdout is logged at debug level. Returns the exit status and the last
/// [`STDERR_TAIL_LINES`] lines of stderr.
pub(crate) async fn run_streamed(
    command: Command,
    tool: &'static str,
    limit: Option<Duration>,
) -> Result<(ExitStatus, String)> {
    let mut child = spawn(command, tool)?;

    let stderr_task = child
        .stderr
        .take()
        .map(|stderr| tokio::spawn(drain_lines(stderr, tool, true)));
    let stdout_task = child
        .stdout
        .take()
        .map(|stdout| tokio::spawn(drain_lines(stdout, tool, false)));

    let status = match wait_within(&mut child, tool, limit).await {
        Ok(status) => status,
        Err(e) => {
            abort_drain(stderr_task);
            abort_drain(stdout_task);
            return Err(e);
        }
    };

    let stderr_tail = finish_drain(stderr_task).await;
    finish_drain(stdout_task).await;

    Ok((status, stderr_tail))
}

async fn read_all<R>(mut reader: R) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Err(e) = reader.read_to_end(&mut buf).await {
        tracing::debug!(error = %e, "stopped reading tool output");
    }
    buf
}

async fn drain_lines<R>(reader: R, tool: &'static str, is_stderr: bool) -> String
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if is_stderr {
                    tracing::warn!(tool, line = %line, "tool stderr");
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                } else {
                    tracing::debug!(tool, line = %line, "tool stdout");
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(tool, error = %e, "stopped reading tool output");
                break;
            }
        }
    }

    Vec::from(tail).join("\n")
}

fn abort_drain<T>(task: Option<JoinHandle<T>>) {
    if let Some(task) = task {
        task.abort();
    }
}

// A grandchild can inherit the pipe and keep it open after the tool exits,
// so the readers only get a short grace period.
async fn finish_drain<T: Default>(task: Option<JoinHandle<T>>) -> T {
    let Some(mut task) = task else {
        return T::default();
    };
    match tokio::time::timeout(DRAIN_GRACE, &mut task).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "output reader task failed");
            T::default()
        }
        Err(_) => {
            task.abort();
            T::default()
        }
    }
}

/// Last `max_lines` non-empty lines of a tool's output
pub(crate) fn tail_lines(bytes: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
