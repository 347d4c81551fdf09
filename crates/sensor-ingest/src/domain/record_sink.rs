use crate::domain::{IngestResult, LogRecord};
use async_trait::async_trait;

/// Trait for persisting decoded uplinks
///
/// Implementations should:
/// - Append the record as one JSON line to the log named by `log_key`
/// - Keep earlier records intact
/// - Serialize concurrent appends to the same log
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Append a record to a device log
    async fn append(&self, log_key: &str, record: &LogRecord) -> IngestResult<()>;
}
