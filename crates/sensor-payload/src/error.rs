use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed base64 payload: {0}")]
    MalformedInput(#[from] base64::DecodeError),

    #[error("insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("unknown device: {0}")]
    UnknownDevice(String),

    #[error("unsupported port: {0}")]
    UnsupportedPort(u8),

    #[error("port required for {0} decoder")]
    MissingPort(&'static str),

    #[error("unmapped {field} value: {value:#04x}")]
    UnmappedEnum { field: &'static str, value: u8 },
}

impl PayloadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PayloadError::MalformedInput(_) => ErrorKind::MalformedInput,
            PayloadError::InsufficientData { .. } => ErrorKind::OutOfRange,
            PayloadError::UnknownDevice(_) => ErrorKind::UnknownDevice,
            PayloadError::UnsupportedPort(_) | PayloadError::MissingPort(_) => {
                ErrorKind::UnsupportedPort
            }
            PayloadError::UnmappedEnum { .. } => ErrorKind::UnmappedEnum,
        }
    }
}

/// Stable, coarse classification of decode failures for callers and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedInput,
    OutOfRange,
    UnknownDevice,
    UnsupportedPort,
    UnmappedEnum,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedInput => "MALFORMED_INPUT",
            ErrorKind::OutOfRange => "OUT_OF_RANGE",
            ErrorKind::UnknownDevice => "UNKNOWN_DEVICE",
            ErrorKind::UnsupportedPort => "UNSUPPORTED_PORT",
            ErrorKind::UnmappedEnum => "UNMAPPED_ENUM",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, PayloadError>;
