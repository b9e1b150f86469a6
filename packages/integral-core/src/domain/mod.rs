//! Domain layer for the `/calculate` contract
//!
//! # Domain Models
//!
//! - `CalculationRequest`: function text plus optional limit pair
//! - `CalculationResponse`: result payload returned by the calculation service
//! - `ProcedureStep`: one entry of the step-by-step derivation
//!
//! Both the request and the response are transient: one pair is created per
//! submit cycle and dropped once the result (or the error) is on screen.
//!
//! # Wire Format
//!
//! Requests always carry both limit keys; an indefinite integral sends empty
//! strings:
//!
//! ```rust
//! use integral_core::domain::CalculationRequest;
//!
//! let request = CalculationRequest::indefinite("x^2");
//! let json = serde_json::to_value(&request).unwrap();
//! assert_eq!(json["function"], "x^2");
//! assert_eq!(json["lower_limit"], "");
//! assert_eq!(json["upper_limit"], "");
//! ```
//!
//! Every response field except `success` is optional so that failure payloads
//! (`{"success": false, "error": "..."}`) decode. Unknown fields are ignored.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ═══════════════════════════════════════════════════════════════════════════
// Request
// ═══════════════════════════════════════════════════════════════════════════

/// Integration bounds, kept as the trimmed text the user typed
///
/// The calculation service parses the bounds itself; the client only checks
/// that they are finite numbers in increasing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegralLimits {
    pub lower: String,
    pub upper: String,
}

impl IntegralLimits {
    pub fn new(lower: impl Into<String>, upper: impl Into<String>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
        }
    }
}

/// Request sent to `POST /calculate`
///
/// Both limits are present or both are absent; the type makes the mixed case
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "CalculationPayload", try_from = "CalculationPayload")]
pub struct CalculationRequest {
    pub function: String,
    pub limits: Option<IntegralLimits>,
}

impl CalculationRequest {
    /// Request an antiderivative only
    pub fn indefinite(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            limits: None,
        }
    }

    /// Request an antiderivative plus the definite value between two bounds
    ///
    /// # Examples
    ///
    /// ```rust
    /// use integral_core::domain::CalculationRequest;
    ///
    /// let request = CalculationRequest::definite("sin(x)", "0", "3.14");
    /// assert!(request.is_definite());
    /// ```
    pub fn definite(
        function: impl Into<String>,
        lower: impl Into<String>,
        upper: impl Into<String>,
    ) -> Self {
        Self {
            function: function.into(),
            limits: Some(IntegralLimits::new(lower, upper)),
        }
    }

    pub fn is_definite(&self) -> bool {
        self.limits.is_some()
    }
}

/// JSON body of `POST /calculate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationPayload {
    pub function: String,
    #[serde(default)]
    pub lower_limit: String,
    #[serde(default)]
    pub upper_limit: String,
}

impl From<CalculationRequest> for CalculationPayload {
    fn from(request: CalculationRequest) -> Self {
        let (lower_limit, upper_limit) = match request.limits {
            Some(limits) => (limits.lower, limits.upper),
            None => (String::new(), String::new()),
        };

        Self {
            function: request.function,
            lower_limit,
            upper_limit,
        }
    }
}

impl TryFrom<CalculationPayload> for CalculationRequest {
    type Error = ValidationError;

    fn try_from(payload: CalculationPayload) -> Result<Self, Self::Error> {
        let lower = payload.lower_limit.trim();
        let upper = payload.upper_limit.trim();

        let limits = match (lower.is_empty(), upper.is_empty()) {
            (true, true) => None,
            (false, false) => Some(IntegralLimits::new(lower, upper)),
            _ => return Err(ValidationError::IncompleteLimits),
        };

        Ok(Self {
            function: payload.function,
            limits,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Response
// ═══════════════════════════════════════════════════════════════════════════

/// Value of a definite integral
///
/// The service returns a JSON number when the result evaluates numerically
/// and a string when it stays symbolic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefiniteValue {
    Numeric(f64),
    Symbolic(String),
}

impl DefiniteValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DefiniteValue::Numeric(value) => Some(*value),
            DefiniteValue::Symbolic(_) => None,
        }
    }
}

impl fmt::Display for DefiniteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefiniteValue::Numeric(value) => write!(f, "{}", value),
            DefiniteValue::Symbolic(text) => write!(f, "{}", text),
        }
    }
}

/// One bound as echoed back by the service (number or text)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LimitValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for LimitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitValue::Number(value) => write!(f, "{}", value),
            LimitValue::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Bounds echoed back with a definite result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseLimits {
    pub lower: LimitValue,
    pub upper: LimitValue,
}

/// Sequence label of a procedure step (`1`, `"2a"`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepLabel {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for StepLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepLabel::Number(n) => write!(f, "{}", n),
            StepLabel::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<u64> for StepLabel {
    fn from(n: u64) -> Self {
        StepLabel::Number(n.into())
    }
}

impl From<&str> for StepLabel {
    fn from(text: &str) -> Self {
        StepLabel::Text(text.to_string())
    }
}

/// One unit of the step-by-step derivation
///
/// Steps are displayed in the order the service sends them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureStep {
    pub step: StepLabel,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
    /// Marks the closing "differentiate back" check
    #[serde(default)]
    pub verification: bool,
}

impl ProcedureStep {
    pub fn new(step: impl Into<StepLabel>, description: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            description: description.into(),
            explanation: None,
            latex: None,
            verification: false,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn with_latex(mut self, latex: impl Into<String>) -> Self {
        self.latex = Some(latex.into());
        self
    }

    pub fn verified(mut self) -> Self {
        self.verification = true;
        self
    }
}

/// Result payload of `POST /calculate`
///
/// # Examples
///
/// ```rust
/// use integral_core::domain::{CalculationResponse, DefiniteValue};
///
/// let body = r#"{
///     "success": true,
///     "original_function": "x^{2}",
///     "indefinite_integral": "\\frac{x^{3}}{3}",
///     "is_definite": true,
///     "definite_integral": 0.3333333333,
///     "limits": {"lower": 0.0, "upper": 1.0}
/// }"#;
///
/// let response: CalculationResponse = serde_json::from_str(body).unwrap();
/// assert_eq!(response.definite_integral, Some(DefiniteValue::Numeric(0.3333333333)));
/// assert!(response.steps().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalculationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// LaTeX of the parsed integrand
    #[serde(default)]
    pub original_function: String,
    /// LaTeX of the antiderivative (without `+ C`)
    #[serde(default)]
    pub indefinite_integral: String,
    /// Plain-text antiderivative; preferred over the LaTeX in text output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indefinite_integral_text: Option<String>,
    #[serde(default)]
    pub is_definite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definite_integral: Option<DefiniteValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definite_integral_latex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResponseLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<Vec<ProcedureStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_url: Option<String>,
}

impl CalculationResponse {
    /// Procedure steps in display order (empty when the service sent none)
    pub fn steps(&self) -> &[ProcedureStep] {
        self.procedure.as_deref().unwrap_or(&[])
    }

    /// Definite value, only when the response is flagged as definite
    pub fn definite_value(&self) -> Option<&DefiniteValue> {
        if self.is_definite {
            self.definite_integral.as_ref()
        } else {
            None
        }
    }

    /// Plot URL, ignoring empty strings
    pub fn plot(&self) -> Option<&str> {
        self.plot_url.as_deref().filter(|url| !url.is_empty())
    }
}
