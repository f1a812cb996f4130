//! Chunked download loop with a pause between chunks

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{DeliveryConfig, ImageFormat, DEFAULT_BATCH_SIZE, DEFAULT_PAUSE_MS};
use crate::delivery::{DownloadSink, FocusProbe};
use crate::processing::{delivered_name, ResizedImage};

/// Something observed while delivering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryEvent {
    /// A chunk is about to be downloaded (`index` is 0-based)
    ChunkStarted { index: usize, total: usize, len: usize },
    /// The sink accepted a download
    Downloaded { name: String },
    /// A download failed or is suspected to have failed
    Warning { message: String },
    /// The loop is sleeping before the next chunk
    Paused { duration: Duration },
}

/// Outcome of a download loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub chunks: usize,
    pub delivered: usize,
    pub warnings: Vec<String>,
}

/// Triggers downloads in fixed-size chunks, sleeping between chunks so the
/// host does not throttle simultaneous downloads
#[derive(Debug, Clone)]
pub struct DeliveryScheduler {
    batch_size: usize,
    pause: Duration,
    rename_to: Option<ImageFormat>,
}

impl Default for DeliveryScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, Duration::from_millis(DEFAULT_PAUSE_MS))
    }
}

impl DeliveryScheduler {
    /// Create a scheduler; a zero batch size is treated as 1
    pub fn new(batch_size: usize, pause: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pause,
            rename_to: None,
        }
    }

    /// Build a scheduler from config; `format` is the resize output format
    pub fn from_config(config: &DeliveryConfig, format: ImageFormat) -> Self {
        let mut scheduler = Self::new(config.batch_size, config.pause());
        if config.match_extension {
            scheduler.rename_to = Some(format);
        }
        scheduler
    }

    /// Number of chunks needed for `items` downloads
    pub fn chunk_count(&self, items: usize) -> usize {
        items.div_ceil(self.batch_size)
    }

    fn download_name(&self, image: &ResizedImage) -> String {
        match self.rename_to {
            Some(format) => delivered_name(&image.name, format, true),
            None => image.name.clone(),
        }
    }

    /// Run the download loop to completion.
    ///
    /// Each chunk is downloaded back to back. Afterwards the focus probe is
    /// read once; if focus is gone, the chunk's last file is reported as a
    /// suspected failure. There is no pause after the final chunk and no way
    /// to stop the loop early.
    pub async fn deliver<S, P, F>(
        &self,
        images: &[ResizedImage],
        sink: &S,
        probe: &P,
        mut on_event: F,
    ) -> DeliveryReport
    where
        S: DownloadSink + ?Sized,
        P: FocusProbe + ?Sized,
        F: FnMut(DeliveryEvent),
    {
        let total = self.chunk_count(images.len());
        let mut report = DeliveryReport {
            chunks: total,
            ..DeliveryReport::default()
        };

        for (index, chunk) in images.chunks(self.batch_size).enumerate() {
            info!("Downloading chunk {} of {} ({} files)", index + 1, total, chunk.len());
            on_event(DeliveryEvent::ChunkStarted { index, total, len: chunk.len() });

            for image in chunk {
                let name = self.download_name(image);
                match sink.download(&name, &image.bytes) {
                    Ok(()) => {
                        debug!("Downloaded {}", name);
                        report.delivered += 1;
                        on_event(DeliveryEvent::Downloaded { name });
                    }
                    Err(e) => {
                        warn!("{}", e);
                        let message = format!("Failed to download {name}");
                        report.warnings.push(message.clone());
                        on_event(DeliveryEvent::Warning { message });
                    }
                }
            }

            if !probe.has_focus() {
                if let Some(last) = chunk.last() {
                    let message = format!("Failed to download {}", self.download_name(last));
                    warn!("Host lost focus after chunk {}: {}", index + 1, message);
                    report.warnings.push(message.clone());
                    on_event(DeliveryEvent::Warning { message });
                }
            }

            if index + 1 < total {
                debug!("Pausing {:?} before next chunk", self.pause);
                on_event(DeliveryEvent::Paused { duration: self.pause });
                tokio::time::sleep(self.pause).await;
            }
        }

        report
    }
}
