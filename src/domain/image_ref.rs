//! Locator for the image being annotated

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::StartError;

const FILE_SCHEME: &str = "file://";

/// Read-only reference to the source image of a session
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageReference {
    path: PathBuf,
}

impl ImageReference {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse a plain path or a `file://` URI
    pub fn parse(locator: &str) -> Result<Self, StartError> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(StartError::Configuration("empty image reference".into()));
        }
        if let Some(rest) = locator.strip_prefix(FILE_SCHEME) {
            // file://host/path is not supported, only file:///path
            if !rest.starts_with('/') {
                return Err(StartError::Configuration(format!(
                    "unsupported file URI: {locator}"
                )));
            }
            let path = percent_decode(rest).ok_or_else(|| {
                StartError::Configuration(format!("malformed escape in file URI: {locator}"))
            })?;
            return Ok(Self::from_path(path));
        }
        if let Some((scheme, _)) = locator.split_once("://")
            && !scheme.is_empty()
            && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        {
            return Err(StartError::Configuration(format!(
                "unsupported scheme '{scheme}' in {locator}"
            )));
        }
        Ok(Self::from_path(locator))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without its extension, the basis for output names
    pub fn file_stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|s| s.to_str())
    }
}

/// Decode `%XX` escapes in a URI path; None on a bad escape or non-UTF-8 result
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
