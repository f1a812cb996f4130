//! The image resizer session: selection handling and download orchestration

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{join_all, try_join_all};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::{BatchPolicy, Config, DeliveryConfig, ResizeConfig};
use crate::delivery::{DeliveryEvent, DeliveryReport, DeliveryScheduler, DownloadSink, FocusProbe};
use crate::error::{Result, ResizeDropError};
use crate::processing::{ResizeCapability, ResizeRequest, ResizedImage, SourceFile};

pub mod render;
pub mod state;

pub use render::*;
pub use state::*;

/// Alert shown when a selection fails to resize
pub const RESIZE_FAILURE_MESSAGE: &str = "Failed to resize/upload one or more images.";
/// Completion notice emitted at the end of every selection
pub const COMPLETION_MESSAGE: &str = "Downloads complete.";

const EVENT_CAPACITY: usize = 1024;

/// Outcome of one [`ImageResizer::handle_selection`] call
#[derive(Debug, Default)]
pub struct SelectionReport {
    /// Files resized and stored
    pub resized: usize,
    /// Names of files that failed to resize (partial policy only)
    pub failed: Vec<String>,
    pub delivery: DeliveryReport,
    /// Set when the whole selection failed
    pub error: Option<ResizeDropError>,
}

impl SelectionReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Resizes selected files and downloads the results in throttled chunks.
///
/// `R` is the resize capability, `S` the download sink and `P` the focus
/// probe. All methods take `&self`; state lives behind a mutex that is never
/// held across an await, and changes are published to subscribers.
pub struct ImageResizer<R, S, P> {
    capability: R,
    sink: S,
    probe: P,
    request: ResizeConfig,
    delivery: DeliveryConfig,
    policy: BatchPolicy,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl<R, S, P> ImageResizer<R, S, P>
where
    R: ResizeCapability,
    S: DownloadSink,
    P: FocusProbe,
{
    /// Create a session with default settings (35x30 PNG, chunks of 8, 5s pause)
    pub fn new(capability: R, sink: S, probe: P) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            capability,
            sink,
            probe,
            request: ResizeConfig::default(),
            delivery: DeliveryConfig::default(),
            policy: BatchPolicy::default(),
            state: Mutex::new(SessionState::default()),
            events,
        }
    }

    /// Apply a loaded configuration
    pub fn with_config(mut self, config: &Config) -> Self {
        self.request = config.resize;
        self.delivery = config.delivery.clone();
        self.policy = config.batch.policy;
        {
            let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
            state.width = config.resize.width;
            state.height = config.resize.height;
        }
        self
    }

    pub fn set_width(&self, width: u32) {
        self.lock().width = width;
    }

    pub fn set_height(&self, height: u32) {
        self.lock().height = height;
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    /// Receive state change events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Text rendering of the stored results
    pub fn listing(&self) -> Vec<String> {
        let results = Arc::clone(&self.lock().results);
        render_listing(&results)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn set_phase(&self, phase: Phase) {
        self.lock().phase = phase;
        self.emit(SessionEvent::PhaseChanged(phase));
    }

    fn alert(&self, message: &str) {
        self.lock().append_alert(message);
        self.emit(SessionEvent::Alert { message: message.to_string() });
    }

    /// Resize one file and fetch the resulting data URI back into bytes
    pub async fn resize_file(&self, file: &SourceFile, request: &ResizeRequest) -> Result<ResizedImage> {
        let uri = self.capability.resize(file, request).await?;
        ResizedImage::from_data_uri(&file.name, uri)
    }

    /// Resize every selected file concurrently, store the results and
    /// download them.
    ///
    /// Width and height are read once, before any file is resized. Under the
    /// all-or-nothing policy a single failure discards every result and
    /// nothing is downloaded. The completion event is emitted in every case.
    pub async fn handle_selection(&self, files: Vec<SourceFile>) -> SelectionReport {
        let request = {
            let mut state = self.lock();
            state.alert.clear();
            self.request.size(state.width, state.height)
        };

        self.set_phase(Phase::Loading);
        info!(
            "Resizing {} files to {}x{} {:?}",
            files.len(),
            request.width,
            request.height,
            request.format
        );

        let report = match self.resize_all(&files, &request).await {
            Ok((results, failed)) if results.is_empty() && !failed.is_empty() => {
                let e = ResizeDropError::resize(failed.join(", "), "no file of the selection could be resized");
                self.fail(e, failed)
            }
            Ok((results, failed)) => {
                for name in &failed {
                    self.alert(&format!("Failed to resize {name}"));
                }
                self.download(results, failed).await
            }
            Err(e) => self.fail(e, Vec::new()),
        };

        self.set_phase(Phase::Idle);
        info!("{}", COMPLETION_MESSAGE);
        self.emit(SessionEvent::Completed {
            message: COMPLETION_MESSAGE.to_string(),
        });

        report
    }

    /// Run all resizes concurrently; results keep the selection order
    async fn resize_all(
        &self,
        files: &[SourceFile],
        request: &ResizeRequest,
    ) -> Result<(Vec<ResizedImage>, Vec<String>)> {
        request.validate()?;

        let resizes = files.iter().map(|file| self.resize_file(file, request));

        match self.policy {
            BatchPolicy::AllOrNothing => Ok((try_join_all(resizes).await?, Vec::new())),
            BatchPolicy::Partial => {
                let mut results = Vec::with_capacity(files.len());
                let mut failed = Vec::new();
                for (file, outcome) in files.iter().zip(join_all(resizes).await) {
                    match outcome {
                        Ok(image) => results.push(image),
                        Err(e) => {
                            warn!("Skipping {}: {}", file.name, e);
                            failed.push(file.name.clone());
                        }
                    }
                }
                Ok((results, failed))
            }
        }
    }

    /// Discard every result and raise the generic failure alert
    fn fail(&self, e: ResizeDropError, failed: Vec<String>) -> SelectionReport {
        error!("Resize batch failed: {}", e);
        self.lock().results = Arc::from(Vec::new());
        self.alert(RESIZE_FAILURE_MESSAGE);
        SelectionReport {
            failed,
            error: Some(e),
            ..SelectionReport::default()
        }
    }

    async fn download(&self, results: Vec<ResizedImage>, failed: Vec<String>) -> SelectionReport {
        let results: Arc<[ResizedImage]> = results.into();
        let resized = results.len();

        self.lock().results = Arc::clone(&results);
        self.emit(SessionEvent::ResultsStored { count: resized });
        self.set_phase(Phase::Downloading);

        let scheduler = DeliveryScheduler::from_config(&self.delivery, self.request.format);
        let delivery = scheduler
            .deliver(&results, &self.sink, &self.probe, |event| {
                if let DeliveryEvent::Warning { message } = &event {
                    self.lock().append_alert(message);
                }
                self.emit(SessionEvent::Delivery(event));
            })
            .await;

        SelectionReport {
            resized,
            failed,
            delivery,
            error: None,
        }
    }
}
