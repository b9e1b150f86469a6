//! Error types for integral-core

use std::fmt;
use thiserror::Error;

/// Form field that owns an inline error display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    /// The function expression input
    Function,
    /// The lower/upper limit pair
    Limits,
}

impl FieldId {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Function => "function",
            FieldId::Limits => "limits",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Client-side validation failure
///
/// The `Display` text is the message shown in the inline error display of
/// [`ValidationError::field`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a function")]
    EmptyFunction,

    #[error("Invalid characters detected")]
    InvalidCharacters,

    #[error("Multiple division is not allowed")]
    RepeatedDivision,

    #[error("Multiple multiplication is not allowed")]
    RepeatedMultiplication,

    #[error("Provide both limits or leave both empty")]
    IncompleteLimits,

    #[error("Limits must be valid numbers")]
    NonNumericLimit,

    #[error("The lower limit must be less than the upper limit")]
    LimitsOutOfOrder,
}

impl ValidationError {
    /// Inline error display this error is reported in
    pub fn field(&self) -> FieldId {
        match self {
            ValidationError::EmptyFunction
            | ValidationError::InvalidCharacters
            | ValidationError::RepeatedDivision
            | ValidationError::RepeatedMultiplication => FieldId::Function,
            ValidationError::IncompleteLimits
            | ValidationError::NonNumericLimit
            | ValidationError::LimitsOutOfOrder => FieldId::Limits,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ValidationError>;
