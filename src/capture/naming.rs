//! Output file naming
//!
//! `photo.png` saves as `photo.jpg`; if that is taken, `photo_1.jpg`,
//! `photo_2.jpg` and so on, tried in order.

use std::path::{Path, PathBuf};

use crate::error::SaveError;

/// Extension of every saved annotation
pub const OUTPUT_EXTENSION: &str = "jpg";

/// File name for `stem` with the given collision suffix (0 = none)
pub fn candidate_name(stem: &str, suffix: u32) -> String {
    if suffix == 0 {
        format!("{stem}.{OUTPUT_EXTENSION}")
    } else {
        format!("{stem}_{suffix}.{OUTPUT_EXTENSION}")
    }
}

/// First unused name in `dir`, trying suffixes `start..=max_suffix`
///
/// Suffixes below `start` are taken to be already tried, so exhaustion
/// always reports the whole range `0..=max_suffix` as attempted.
/// Returns the path and the suffix it was built with.
pub fn next_free_name(
    dir: &Path,
    stem: &str,
    start: u32,
    max_suffix: u32,
) -> Result<(PathBuf, u32), SaveError> {
    for suffix in start..=max_suffix {
        let path = dir.join(candidate_name(stem, suffix));
        let taken = path
            .try_exists()
            .map_err(|err| SaveError::io(&path, err))?;
        if !taken {
            return Ok((path, suffix));
        }
    }
    Err(SaveError::NamingExhausted {
        stem: stem.to_string(),
        attempts: max_suffix.saturating_add(1),
    })
}
