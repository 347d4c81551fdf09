use sensor_payload::PayloadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Payload decode error: {0}")]
    Payload(#[from] PayloadError),

    #[error("Invalid uplink event: {0}")]
    InvalidEvent(String),

    #[error("Invalid device catalog: {0}")]
    InvalidCatalog(String),

    #[error("Record sink error: {0}")]
    Sink(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IngestError {
    /// Short error kind for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Payload(e) => e.kind().as_str(),
            IngestError::InvalidEvent(_) => "INVALID_EVENT",
            IngestError::InvalidCatalog(_) => "INVALID_CATALOG",
            IngestError::Sink(_) => "SINK",
            IngestError::Serialization(_) => "SERIALIZATION",
        }
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
