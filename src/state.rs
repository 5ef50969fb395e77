//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::UrlService;
use crate::telemetry::MetricsRecorder;

#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<UrlService>,
    pub metrics: Arc<dyn MetricsRecorder>,
}

impl AppState {
    pub fn new(url_service: Arc<UrlService>, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            url_service,
            metrics,
        }
    }
}
