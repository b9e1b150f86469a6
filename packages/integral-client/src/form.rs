use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClientError, Result};

/// Raw text of the three form inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub function: String,
    pub lower_limit: String,
    pub upper_limit: String,
}

impl FormInput {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            ..Default::default()
        }
    }

    pub fn with_limits(mut self, lower: impl Into<String>, upper: impl Into<String>) -> Self {
        self.lower_limit = lower.into();
        self.upper_limit = upper.into();
        self
    }
}

/// Form state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormState {
    Idle,
    Calculating {
        submission_id: Uuid,
        started_at: DateTime<Utc>,
    },
}

impl FormState {
    pub fn state_name(&self) -> &'static str {
        match self {
            FormState::Idle => "idle",
            FormState::Calculating { .. } => "calculating",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, FormState::Calculating { .. })
    }
}

impl Default for FormState {
    fn default() -> Self {
        FormState::Idle
    }
}

/// State machine guarding the single in-flight calculation
#[derive(Debug, Default)]
pub struct FormStateMachine {
    state: FormState,
}

impl FormStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Transition: IDLE → CALCULATING
    pub fn begin(&mut self) -> Result<Uuid> {
        match self.state {
            FormState::Idle => {
                let submission_id = Uuid::new_v4();
                self.state = FormState::Calculating {
                    submission_id,
                    started_at: Utc::now(),
                };
                Ok(submission_id)
            }
            _ => Err(ClientError::InvalidStateTransition {
                from: self.state.state_name().to_string(),
                to: "calculating".to_string(),
            }),
        }
    }

    /// Transition: CALCULATING → IDLE; returns the elapsed milliseconds
    pub fn finish(&mut self) -> Result<u64> {
        match &self.state {
            FormState::Calculating { started_at, .. } => {
                let elapsed_ms = (Utc::now() - *started_at).num_milliseconds().max(0) as u64;
                self.state = FormState::Idle;
                Ok(elapsed_ms)
            }
            _ => Err(ClientError::InvalidStateTransition {
                from: self.state.state_name().to_string(),
                to: "idle".to_string(),
            }),
        }
    }
}
