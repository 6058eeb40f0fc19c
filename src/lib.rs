use std::sync::Arc;

use configuration::Environment;

pub mod configuration;
pub mod domain;
pub mod form_client;
pub mod record_store;
pub mod routes;
pub mod startup;
pub mod telemetry;

/// Shared by every request. Each flow holds its own store handle because the
/// two flows authenticate with different keys.
pub struct AppState<S> {
    pub subscriber_store: Arc<S>,
    pub inquiry_store: Arc<S>,
    pub environment: Environment,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            subscriber_store: Arc::clone(&self.subscriber_store),
            inquiry_store: Arc::clone(&self.inquiry_store),
            environment: self.environment,
        }
    }
}
