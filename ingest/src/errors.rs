use thiserror::Error;

/// Errors that can escape the webhook service.
///
/// Per-request failures are turned into HTTP responses inside the handler;
/// only listener-level problems surface here.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
