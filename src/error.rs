//! Error types for StopAnyAds

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StopError {
    #[error("Process {0} not found")]
    ProcessNotFound(u32),

    #[error("Access denied for process {0}")]
    AccessDenied(u32),

    #[error("Process enumeration is not available on this system")]
    EnumerationUnavailable,

    #[error("Failed to run {command}: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the current user's home directory")]
    HomeDirUnavailable,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Background reset task panicked")]
    TaskPanicked,

    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

pub type Result<T> = std::result::Result<T, StopError>;
