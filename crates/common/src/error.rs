//! Common error types for ipvs-proxy components.

use std::fmt;

/// A specialized Result type for IPVS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for IPVS operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{tool} not found: {reason}")]
    ToolNotFound { tool: String, reason: String },

    #[error("`{command}` exited with {}: {stderr}", exit_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("IPVS error: failed to {action}: {source}")]
    IPVS {
        action: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Wrap `source` as the failure of an IPVS `action`.
    pub fn ipvs(action: impl fmt::Display, source: Error) -> Self {
        Error::IPVS {
            action: action.to_string(),
            source: Box::new(source),
        }
    }
}
