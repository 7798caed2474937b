pub mod config;
pub mod envelope;
pub mod errors;
pub mod handler;
pub mod metrics_defs;
pub mod overflow;
pub mod report;
pub mod service;

use crate::errors::IngestError;
use crate::handler::WebhookHandler;
use crate::overflow::FailureStore;
use crate::service::IngestService;
use shared::http::run_http_service;
use sheets::RowAppender;
use std::sync::Arc;

/// Builds the webhook service and serves it until the listener fails.
pub async fn run(
    config: config::Config,
    appender: Arc<dyn RowAppender>,
    overflow: Arc<dyn FailureStore>,
) -> Result<(), IngestError> {
    let handler = WebhookHandler::new(config.secret_token.clone(), appender, overflow);
    let service = IngestService::new(handler);
    run_http_service(&config.listener.host, config.listener.port, service).await
}
