use std::path::PathBuf;

use reqwest::StatusCode;

/// Why a single country was not written.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Status code: {}", .status.as_u16())]
    Status { status: StatusCode },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// A missing remote file is an expected outcome; everything else is
    /// unexpected and aborts the run when fail-fast is on.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FetchError::Status { .. })
    }
}

/// Errors that end a whole run rather than a single country.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("cannot create output directory {}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fail-fast stopped the run at `country`.
    #[error("update aborted at {country}")]
    Aborted {
        country: String,
        #[source]
        source: FetchError,
    },
}
