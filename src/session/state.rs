//! Session state and the events published when it changes

use std::sync::Arc;

use crate::config::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::delivery::DeliveryEvent;
use crate::processing::ResizedImage;

/// Where a session is in its selection cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// Resizes are in flight
    Loading,
    /// Results are stored and the download loop is running
    Downloading,
}

/// Everything the session shows to the user
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Results of the last successful selection, in selection order
    pub results: Arc<[ResizedImage]>,
    pub phase: Phase,
    /// Last error(s), one per line; empty when there is nothing to report
    pub alert: String,
    pub width: u32,
    pub height: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            results: Arc::from(Vec::new()),
            phase: Phase::Idle,
            alert: String::new(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Add a line to the alert
    pub fn append_alert(&mut self, message: &str) {
        if !self.alert.is_empty() {
            self.alert.push('\n');
        }
        self.alert.push_str(message);
    }
}

/// Published on every visible state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged(Phase),
    ResultsStored { count: usize },
    Delivery(DeliveryEvent),
    Alert { message: String },
    /// Emitted once at the end of every selection, successful or not
    Completed { message: String },
}
