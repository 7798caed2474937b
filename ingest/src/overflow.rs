use crate::report::CallReport;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum OverflowError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One report that could not be delivered, with the context needed to
/// reconcile it by hand later.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub timestamp: String,
    pub error: String,
    pub data: CallReport,
}

/// Durable sink for reports whose spreadsheet delivery failed.
#[async_trait]
pub trait FailureStore: Send + Sync {
    /// Appends one record. Existing records are never altered or removed.
    async fn record(&self, report: &CallReport, reason: &str) -> Result<(), OverflowError>;

    async fn load(&self) -> Result<Vec<FailureRecord>, OverflowError>;
}

/// Failure store backed by a single JSON array file.
///
/// Appending reads the whole array, pushes the new record, and writes the
/// array back. All writers go through one mutex, so concurrent failures
/// serialize instead of interleaving partial writes.
pub struct FilesystemFailureStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilesystemFailureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FilesystemFailureStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Reads the current records. Caller must hold the lock.
    async fn read_records(&self) -> Result<Vec<FailureRecord>, OverflowError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(records) => Ok(records),
            Err(e) => {
                // Unreadable store: set the bytes aside rather than append
                // into (or truncate) a file we cannot parse.
                let quarantine = self.path.with_extension("json.corrupt");
                tracing::error!(
                    path = %self.path.display(),
                    quarantine = %quarantine.display(),
                    error = %e,
                    "overflow store unreadable; moving it aside and starting fresh"
                );
                tokio::fs::rename(&self.path, &quarantine).await?;
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl FailureStore for FilesystemFailureStore {
    async fn record(&self, report: &CallReport, reason: &str) -> Result<(), OverflowError> {
        let _guard = self.lock.lock().await;

        let mut records = self.read_records().await?;
        records.push(FailureRecord {
            timestamp: Utc::now().to_rfc3339(),
            error: reason.to_string(),
            data: report.clone(),
        });

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(&records)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Vec<FailureRecord>, OverflowError> {
        let _guard = self.lock.lock().await;
        self.read_records().await
    }
}

// No-op failure store for wiring and tests
pub struct NoopFailureStore;

#[async_trait]
impl FailureStore for NoopFailureStore {
    async fn record(&self, _report: &CallReport, _reason: &str) -> Result<(), OverflowError> {
        Ok(())
    }

    async fn load(&self) -> Result<Vec<FailureRecord>, OverflowError> {
        Ok(Vec::new())
    }
}
