//! Temporary artifact file names
//!
//! Names look like `1718035200123-k3j9x0qa.mp3`: wall-clock milliseconds, a
//! random lowercase alphanumeric suffix and a fixed extension. Uniqueness is
//! best-effort; two requests would need the same millisecond and the same
//! 8-character suffix to collide.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;

/// Extension given to every artifact, whatever the tool actually wrote
pub const ARTIFACT_EXTENSION: &str = "mp3";

/// Content type announced for artifacts
pub const ARTIFACT_CONTENT_TYPE: &str = "audio/mpeg";

const SUFFIX_LEN: usize = 8;

/// Generate a fresh artifact file name
pub fn generate_file_name() -> String {
    generate_file_name_at(Utc::now())
}

fn generate_file_name_at(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    format!("{}-{}.{}", now.timestamp_millis(), suffix, ARTIFACT_EXTENSION)
}

/// Split a name into its artifact stem (`<millis>-<suffix>`) and the rest
///
/// Accepts the generated name itself and anything a tool derives from it by
/// appending or swapping extensions (`.mp3.part`, `.webm`, `.temp.mp3`).
/// Returns `None` for anything that does not look like one of ours, so foreign
/// files in the temp directory are never mistaken for artifacts.
pub fn split_stem(name: &str) -> Option<(&str, &str)> {
    let (stem, rest) = name.split_once('.')?;
    let (millis, suffix) = stem.split_once('-')?;

    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    if suffix.len() != SUFFIX_LEN
        || !suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
    {
        return None;
    }
    if millis.is_empty() || !millis.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some((stem, rest))
}

/// Whether `name` is a file derived from the artifact with this stem
pub fn is_companion(name: &str, stem: &str) -> bool {
    matches!(split_stem(name), Some((other, _)) if other == stem)
}

/// Recover the creation time encoded in an artifact (or companion) name
pub fn parse_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let (stem, _) = split_stem(name)?;
    let (millis, _) = stem.split_once('-')?;
    DateTime::from_timestamp_millis(millis.parse().ok()?)
}
