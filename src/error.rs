use thiserror::Error;

use crate::models::RunStatus;

pub type Result<T> = std::result::Result<T, InformerError>;

/// Error type for the ETF Informer backend
#[derive(Error, Debug)]
pub enum InformerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote API error ({status}): {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown tool function: {0}")]
    UnknownTool(String),

    #[error("Run ended with status: {0}")]
    RunFailed(RunStatus),

    #[error("Run did not reach a terminal state after {attempts} polls")]
    PollTimeout { attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
