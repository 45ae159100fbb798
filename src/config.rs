//! Configuration persistence for snapmark settings

use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for StrokeColor {
    fn default() -> Self {
        Self {
            r: 0.9,
            g: 0.1,
            b: 0.1,
        }
    }
}

impl StrokeColor {
    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ]
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root cache directory (None = platform cache dir)
    pub cache_root: Option<PathBuf>,
    /// Subdirectory of the cache root that receives saved annotations
    pub cache_subdir: String,
    /// Pen color for new strokes
    pub pen_color: StrokeColor,
    /// Pen width in image pixels
    pub pen_width: f32,
    /// JPEG quality for saved images (1-100)
    pub jpeg_quality: u8,
    /// Upper bound on `name_N` suffixes tried before a save gives up
    pub max_name_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_root: None,
            cache_subdir: "annotations".to_string(),
            pen_color: StrokeColor::default(),
            pen_width: 6.0,
            jpeg_quality: 100,
            max_name_attempts: 10_000,
        }
    }
}

impl AppConfig {
    /// Application directory name under the platform config and cache dirs
    pub const APP_DIR: &'static str = "snapmark";
    const FILE_NAME: &'static str = "config.json";

    /// Location of the config file, if the platform has a config dir
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::APP_DIR).join(Self::FILE_NAME))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            log::warn!("No config directory available, using defaults");
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    /// Parse a config file at an explicit location
    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Directory that saved annotations land in
    pub fn destination_dir(&self) -> Option<PathBuf> {
        let root = match &self.cache_root {
            Some(root) => root.clone(),
            None => dirs::cache_dir()?.join(Self::APP_DIR),
        };
        Some(root.join(&self.cache_subdir))
    }

    fn sanitized(mut self) -> Self {
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self.max_name_attempts = self.max_name_attempts.max(1);
        if !(self.pen_width.is_finite() && self.pen_width > 0.0) {
            self.pen_width = Self::default().pen_width;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_color_to_rgba() {
        let color = StrokeColor {
            r: 1.0,
            g: 0.0,
            b: 0.5,
        };
        assert_eq!(color.to_rgba_u8(), [255, 0, 128, 255]);
    }

    #[test]
    fn test_destination_uses_cache_root_override() {
        let config = AppConfig {
            cache_root: Some(PathBuf::from("/tmp/snapmark-test")),
            ..Default::default()
        };
        assert_eq!(
            config.destination_dir(),
            Some(PathBuf::from("/tmp/snapmark-test/annotations"))
        );
    }

    #[test]
    fn test_partial_config_fills_defaults_and_clamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "jpeg_quality": 0, "pen_width": -2.0 }"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.jpeg_quality, 1);
        assert_eq!(config.pen_width, 6.0);
        assert_eq!(config.cache_subdir, "annotations");
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
