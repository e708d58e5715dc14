//! Startup sweep of artifacts left behind by a previous run

use super::{SwallowedStage, naming, report_swallowed};
use chrono::Utc;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Remove artifacts older than `max_age` from `temp_dir`
///
/// Only files whose names parse as generated artifact names, or companions
/// derived from them like `.part` files, are considered; their age comes from
/// the timestamp in the name. Errors are reported and skipped. Returns the
/// number of files removed.
pub async fn sweep_stale_artifacts(temp_dir: &Path, max_age: Duration) -> usize {
    let mut entries = match tokio::fs::read_dir(temp_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            report_swallowed(SwallowedStage::Sweep, temp_dir, &e);
            return 0;
        }
    };

    let now = Utc::now();
    let mut removed = 0;

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                report_swallowed(SwallowedStage::Sweep, temp_dir, &e);
                break;
            }
        };

        let path = entry.path();
        let Some(created_at) = entry.file_name().to_str().and_then(naming::parse_timestamp) else {
            continue;
        };
        // Names stamped in the future count as brand new
        let age = now
            .signed_duration_since(created_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        if age < max_age {
            continue;
        }

        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                report_swallowed(SwallowedStage::Sweep, &path, &e);
                continue;
            }
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = ?path, "removed stale artifact");
                removed += 1;
            }
            Err(e) => report_swallowed(SwallowedStage::Sweep, &path, &e),
        }
    }

    if removed > 0 {
        info!(removed, dir = ?temp_dir, "swept stale artifacts");
    }
    removed
}
