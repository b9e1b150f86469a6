use integral_core::ValidationError;
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Message shown when the service rejects a calculation without saying why
pub const DEFAULT_CALCULATION_ERROR: &str = "Failed to calculate the integral";

/// Message shown when a failure carries no text at all
pub const DEFAULT_CONNECTION_ERROR: &str = "Could not connect to the server";

#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected by the service (`success: false` or non-2xx status)
    #[error("{message}")]
    Calculation { message: String, status: Option<u16> },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Typesetting failed: {0}")]
    Typeset(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn calculation(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Calculation {
            message: message.into(),
            status,
        }
    }

    pub fn typeset<E: std::fmt::Display>(e: E) -> Self {
        Self::Typeset(e.to_string())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Validation(_) => ErrorCategory::Validation,
            ClientError::Calculation { .. }
            | ClientError::Transport(_)
            | ClientError::Decode(_) => ErrorCategory::Transport,
            ClientError::Typeset(_) => ErrorCategory::Rendering,
            ClientError::InvalidStateTransition { .. }
            | ClientError::Config(_)
            | ClientError::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Text for the error panel
    pub fn user_message(&self) -> String {
        let message = match self {
            ClientError::Calculation { message, .. } => message.trim().to_string(),
            other => other.to_string(),
        };

        if message.is_empty() {
            DEFAULT_CONNECTION_ERROR.to_string()
        } else {
            message
        }
    }
}

/// Where a failure is surfaced and how the UI recovers from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCategory {
    /// Inline next to the offending input; blocks submission
    Validation,
    /// Error panel; recoverable by resubmitting
    Transport,
    /// Logged only; the affected panel is hidden
    Rendering,
    /// Programming or setup error outside the submit cycle
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Transport => "transport",
            ErrorCategory::Rendering => "rendering",
            ErrorCategory::Internal => "internal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "validation" => Some(ErrorCategory::Validation),
            "transport" => Some(ErrorCategory::Transport),
            "rendering" => Some(ErrorCategory::Rendering),
            "internal" => Some(ErrorCategory::Internal),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
