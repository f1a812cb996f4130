//! Error types and handling for ResizeDrop

use thiserror::Error;

/// Result type alias for ResizeDrop operations
pub type Result<T> = std::result::Result<T, ResizeDropError>;

/// Main error type for ResizeDrop operations
#[derive(Debug, Error)]
pub enum ResizeDropError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid resize parameters (width, height, quality, rotation)
    #[error("Invalid resize parameters: {message}")]
    InvalidParameters { message: String },

    /// The resize capability rejected a file
    #[error("Failed to resize {name}: {message}")]
    ResizeFailed { name: String, message: String },

    /// A data URI could not be turned back into bytes
    #[error("Malformed data URI: {message} (file: {name:?})")]
    DataUri {
        message: String,
        name: Option<String>,
    },

    /// A download sink reported a failure
    #[error("Failed to download {name}: {message}")]
    DeliveryFailed { name: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),

    /// Runtime errors (blocking task panics, channel failures)
    #[error("System resource error: {message}")]
    SystemError { message: String },
}

impl ResizeDropError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a new resize failure for the named file
    pub fn resize<N: Into<String>, S: Into<String>>(name: N, message: S) -> Self {
        Self::ResizeFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new data URI error
    pub fn data_uri<S: Into<String>>(message: S, name: Option<String>) -> Self {
        Self::DataUri {
            message: message.into(),
            name,
        }
    }

    /// Create a new delivery failure for the named file
    pub fn delivery<N: Into<String>, S: Into<String>>(name: N, message: S) -> Self {
        Self::DeliveryFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new system error
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::SystemError {
            message: message.into(),
        }
    }

    /// Get the associated file name if available
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::ResizeFailed { name, .. } | Self::DeliveryFailed { name, .. } => Some(name),
            Self::DataUri { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("File system error: {e}"),
            Self::ImageError(e) => format!("Image processing failed: {e}"),
            Self::InvalidParameters { message } => {
                format!("{message}. Width and height must be positive whole numbers")
            }
            Self::ResizeFailed { name, .. } => {
                format!("Could not resize {name}. Supported formats: JPEG, PNG, WebP, GIF, TIFF, BMP")
            }
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for ResizeDropError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {err}"))
    }
}

impl From<serde_yaml::Error> for ResizeDropError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {err}"))
    }
}

impl From<base64::DecodeError> for ResizeDropError {
    fn from(err: base64::DecodeError) -> Self {
        Self::data_uri(format!("invalid base64 payload: {err}"), None)
    }
}

/// Error context extension for attaching the selected file's name
pub trait ErrorContext<T> {
    /// Add file name context to an error
    fn with_file_name(self, name: &str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ResizeDropError>,
{
    fn with_file_name(self, name: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            ResizeDropError::DataUri { message, name: None } => ResizeDropError::DataUri {
                message,
                name: Some(name.to_string()),
            },
            ResizeDropError::ImageError(err) => ResizeDropError::resize(name, err.to_string()),
            other => other,
        })
    }
}
