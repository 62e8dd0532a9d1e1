use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// The primary error type for the `gdm70x-lib` library.
#[derive(Error, Debug)]
pub enum GdmError {
    #[error("Timeout: no data from the meter within the read window")]
    Timeout,

    #[error("Sync lost: {0}")]
    SyncLost(String),

    #[error("Callback aborted the cycle: {0}")]
    CallbackAborted(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Could not allocate the image buffer")]
    ResourceExhausted,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl GdmError {
    /// Errors after which calling `run_cycle` again is expected to recover.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GdmError::Timeout | GdmError::SyncLost(_))
    }
}

pub type Result<T> = std::result::Result<T, GdmError>;
