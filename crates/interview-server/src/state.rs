//! Shared application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use interview_core::InterviewController;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<InterviewController>,
    /// When the server started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(controller: Arc<InterviewController>) -> Self {
        Self {
            controller,
            started_at: Utc::now(),
        }
    }

    /// Seconds since the server started.
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
