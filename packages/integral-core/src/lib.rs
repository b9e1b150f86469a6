//! Integral calculator client core
//!
//! Pure, synchronous building blocks shared by every front end:
//!
//! - `domain`: the `/calculate` request/response contract
//! - `validation`: live and submit-time input checks
//! - `input`: symbol and function insertion helpers for the function input
//!
//! ## Usage
//!
//! ```rust
//! use integral_core::{validate_form, CalculationRequest};
//!
//! let request = validate_form("x^2", "0", "1").unwrap();
//! assert_eq!(request, CalculationRequest::definite("x^2", "0", "1"));
//! ```

pub mod domain;
pub mod error;
pub mod input;
pub mod validation;

pub use error::{FieldId, Result, ValidationError};

pub use domain::{
    CalculationPayload, CalculationRequest, CalculationResponse, DefiniteValue, IntegralLimits,
    LimitValue, ProcedureStep, ResponseLimits, StepLabel,
};
pub use input::{InputBuffer, FUNCTIONS, SYMBOLS};
pub use validation::{
    check_function_expression, check_limits, validate_form, validate_function_expression,
    validate_limits, Validation,
};
