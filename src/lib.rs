//! ResizeDrop - batch image resizing with throttled delivery
//!
//! Select a set of images, resize each one to fit a target width and height,
//! then hand the results to a download sink a few at a time, pausing between
//! chunks so hosts that cap simultaneous downloads do not drop any.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use resizedrop::{AlwaysFocused, DirectorySink, ImageResizer, ProcessingEngine, SourceFile};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let resizer = ImageResizer::new(
//!     ProcessingEngine::new(),
//!     DirectorySink::new("resized"),
//!     AlwaysFocused,
//! );
//! resizer.set_width(120);
//! resizer.set_height(80);
//!
//! let files = vec![SourceFile::from_path("input.jpg").await?];
//! let report = resizer.handle_selection(files).await;
//! println!("resized {} files in {} chunks", report.resized, report.delivery.chunks);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod delivery;
pub mod error;
pub mod processing;
pub mod session;

// Re-export commonly used types
pub use config::{BatchPolicy, Config, DeliveryConfig, ImageFormat, ResizeConfig};
pub use delivery::{AlwaysFocused, DeliveryScheduler, DirectorySink, DownloadSink, FocusFlag, FocusProbe, MemorySink};
pub use error::{Result, ResizeDropError};
pub use processing::{ProcessingEngine, ResizeCapability, ResizeRequest, ResizedImage, SourceFile};
pub use session::{ImageResizer, Phase, SelectionReport, SessionEvent, SessionState};

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging from `RUST_LOG`, writing to stderr
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init() {
    if tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish()
    ).is_ok() {
        info!("ResizeDrop v{} initialized", VERSION);
    }
}

/// Initialize logging from the `[logging]` config section
pub fn init_with_config(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.logging.level)
        .map_err(|e| ResizeDropError::config(
            format!("Invalid log level '{}': {}", config.logging.level, e)
        ))?;

    // stdout is reserved for results and JSON summaries
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if config.logging.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if installed.is_ok() {
        info!("ResizeDrop v{} initialized with custom config", VERSION);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_init() {
        // Should not fail on multiple calls
        init();
        init();
        assert!(init_with_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "resizedrop=verbose".to_string();
        assert!(init_with_config(&config).is_err());
    }
}
