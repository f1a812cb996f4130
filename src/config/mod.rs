//! Configuration management for ResizeDrop

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::{Result, ResizeDropError};

/// Default target width in pixels
pub const DEFAULT_WIDTH: u32 = 35;
/// Default target height in pixels
pub const DEFAULT_HEIGHT: u32 = 30;
/// Downloads triggered back to back before pausing
pub const DEFAULT_BATCH_SIZE: usize = 8;
/// Pause between download chunks, in milliseconds
pub const DEFAULT_PAUSE_MS: u64 = 5000;

/// Largest accepted target dimension
pub const MAX_DIMENSION: u32 = 32768;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resize request defaults
    pub resize: ResizeConfig,

    /// Download loop settings
    pub delivery: DeliveryConfig,

    /// How a selection reacts to failed files
    pub batch: BatchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Parameters handed to the resize capability for every file of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Maximum output width in pixels
    pub width: u32,
    /// Maximum output height in pixels
    pub height: u32,
    /// Output encoding
    pub format: ImageFormat,
    /// Output quality (1-100); only lossy formats use it
    pub quality: u8,
    /// Clockwise rotation in degrees (0, 90, 180 or 270)
    pub rotation: u16,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            format: ImageFormat::Png,
            quality: 100,
            rotation: 0,
        }
    }
}

impl ResizeConfig {
    /// Create a resize configuration with the default 35x30 PNG target
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target dimensions
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set quality
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set output format
    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set rotation
    pub fn rotation(mut self, degrees: u16) -> Self {
        self.rotation = degrees;
        self
    }

    /// Validate the request parameters
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ResizeDropError::invalid_parameters(format!(
                "Dimensions must be greater than 0, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(ResizeDropError::invalid_parameters(format!(
                "Dimensions must be at most {MAX_DIMENSION}, got {}x{}",
                self.width, self.height
            )));
        }
        if self.quality == 0 || self.quality > 100 {
            return Err(ResizeDropError::invalid_parameters(format!(
                "Quality must be between 1-100, got {}",
                self.quality
            )));
        }
        if !matches!(self.rotation, 0 | 90 | 180 | 270) {
            return Err(ResizeDropError::invalid_parameters(format!(
                "Rotation must be 0, 90, 180 or 270, got {}",
                self.rotation
            )));
        }
        Ok(())
    }
}

/// Download loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Downloads per chunk
    pub batch_size: usize,

    /// Pause between chunks in milliseconds
    pub pause_ms: u64,

    /// Directory the default sink writes into (None = current directory)
    pub output_dir: Option<PathBuf>,

    /// Give delivered files the output format's extension
    pub match_extension: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            pause_ms: DEFAULT_PAUSE_MS,
            output_dir: None,
            match_extension: false,
        }
    }
}

impl DeliveryConfig {
    /// Pause between chunks
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

/// Selection failure policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// One failed file discards the whole selection
    #[default]
    AllOrNothing,
    /// Keep and deliver the files that resized, report the rest
    Partial,
}

/// Batch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub policy: BatchPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    #[default]
    Png,
    WebP,
}

impl ImageFormat {
    /// Get file extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    /// Get MIME type for this format
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ResizeDropError::config(
                format!("Failed to read config file {:?}: {}", path.as_ref(), e)
            ))?;

        let extension = path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(ResizeDropError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        }
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let extension = path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let content = match extension.to_lowercase().as_str() {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| ResizeDropError::config(format!("TOML serialization failed: {e}")))?,
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| ResizeDropError::config(format!("YAML serialization failed: {e}")))?,
            _ => return Err(ResizeDropError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        };

        std::fs::write(&path, content)
            .map_err(|e| ResizeDropError::config(
                format!("Failed to write config file {:?}: {}", path.as_ref(), e)
            ))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.resize.validate()
            .map_err(|e| ResizeDropError::config(format!("Invalid [resize] section: {e}")))?;

        if self.delivery.batch_size == 0 {
            return Err(ResizeDropError::config(
                "Batch size must be greater than 0"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.resize.width, 35);
        assert_eq!(config.resize.height, 30);
        assert_eq!(config.resize.format, ImageFormat::Png);
        assert_eq!(config.resize.quality, 100);
        assert_eq!(config.resize.rotation, 0);
        assert_eq!(config.delivery.batch_size, 8);
        assert_eq!(config.delivery.pause(), Duration::from_millis(5000));
        assert_eq!(config.batch.policy, BatchPolicy::AllOrNothing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            "[resize]\nwidth = 120\n\n[batch]\npolicy = \"partial\"\n"
        ).unwrap();
        assert_eq!(config.resize.width, 120);
        assert_eq!(config.resize.height, DEFAULT_HEIGHT);
        assert_eq!(config.batch.policy, BatchPolicy::Partial);
        assert_eq!(config.delivery.pause_ms, DEFAULT_PAUSE_MS);
    }

    #[test]
    fn test_config_file_io() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.delivery.match_extension = true;

        let toml_path = dir.path().join("resizedrop.toml");
        config.to_file(&toml_path).unwrap();
        let loaded = Config::from_file(&toml_path).unwrap();
        assert!(loaded.delivery.match_extension);

        let yaml_path = dir.path().join("resizedrop.yaml");
        config.to_file(&yaml_path).unwrap();
        let loaded = Config::from_file(&yaml_path).unwrap();
        assert!(loaded.validate().is_ok());

        assert!(config.to_file(dir.path().join("resizedrop.ini")).is_err());
    }

    #[test]
    fn test_resize_validation() {
        assert!(ResizeConfig::new().validate().is_ok());
        assert!(ResizeConfig::new().size(0, 30).validate().is_err());
        assert!(ResizeConfig::new().size(35, 0).validate().is_err());
        assert!(ResizeConfig::new().quality(0).validate().is_err());
        assert!(ResizeConfig::new().rotation(45).validate().is_err());
        assert!(ResizeConfig::new().rotation(270).validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = Config::default();
        config.delivery.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_image_format_properties() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
        assert_eq!(ImageFormat::WebP.mime_type(), "image/webp");
    }
}
