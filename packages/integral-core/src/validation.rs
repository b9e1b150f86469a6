//! Client-side input validation
//!
//! Validation runs twice: live, while the user types (to drive the inline
//! error displays), and once more on submit. An empty function is "not yet
//! invalid" while typing but blocks submission.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::CalculationRequest;
use crate::error::{Result, ValidationError};

static INVALID_CHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9+\-*/^().,\s]").expect("valid regex"));
static REPEATED_DIVISION: Lazy<Regex> = Lazy::new(|| Regex::new(r"/{2,}").expect("valid regex"));
static REPEATED_MULTIPLICATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*{3,}").expect("valid regex"));

/// Outcome of a live validation check
///
/// `message` is `None` whenever the inline error display should be cleared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validation {
    pub valid: bool,
    pub message: Option<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(err: &ValidationError) -> Self {
        Self {
            valid: false,
            message: Some(err.to_string()),
        }
    }

    fn from_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(err) => Self::invalid(&err),
        }
    }
}

/// Check a function expression while it is being typed
///
/// # Examples
///
/// ```rust
/// use integral_core::validation::validate_function_expression;
///
/// assert!(validate_function_expression("x^2 + sin(x)").valid);
/// assert!(!validate_function_expression("x $ 2").valid);
/// assert!(validate_function_expression("   ").message.is_none());
/// ```
pub fn validate_function_expression(text: &str) -> Validation {
    Validation::from_result(check_function_expression(text))
}

/// Check the limit pair while it is being typed
pub fn validate_limits(lower: &str, upper: &str) -> Validation {
    Validation::from_result(check_limits(lower, upper).map(|_| ()))
}

/// Final check before submission; builds the request on success
///
/// Values are trimmed before they go into the request.
pub fn validate_form(function: &str, lower: &str, upper: &str) -> Result<CalculationRequest> {
    let function = function.trim();
    if function.is_empty() {
        return Err(ValidationError::EmptyFunction);
    }

    check_function_expression(function)?;

    let request = match check_limits(lower, upper)? {
        Some((lower, upper)) => CalculationRequest::definite(function, lower, upper),
        None => CalculationRequest::indefinite(function),
    };

    Ok(request)
}

/// First rule violated by `text`, if any (empty text passes)
pub fn check_function_expression(text: &str) -> Result<()> {
    let value = text.trim();
    if value.is_empty() {
        return Ok(());
    }

    if INVALID_CHARACTERS.is_match(value) {
        return Err(ValidationError::InvalidCharacters);
    }
    if REPEATED_DIVISION.is_match(value) {
        return Err(ValidationError::RepeatedDivision);
    }
    if REPEATED_MULTIPLICATION.is_match(value) {
        return Err(ValidationError::RepeatedMultiplication);
    }

    Ok(())
}

/// Validate the limit pair, returning the trimmed bounds when both are given
pub fn check_limits<'a>(lower: &'a str, upper: &'a str) -> Result<Option<(&'a str, &'a str)>> {
    let lower = lower.trim();
    let upper = upper.trim();

    match (lower.is_empty(), upper.is_empty()) {
        (true, true) => return Ok(None),
        (false, false) => {}
        _ => return Err(ValidationError::IncompleteLimits),
    }

    let lower_num = parse_bound(lower)?;
    let upper_num = parse_bound(upper)?;

    if lower_num >= upper_num {
        return Err(ValidationError::LimitsOutOfOrder);
    }

    Ok(Some((lower, upper)))
}

fn parse_bound(text: &str) -> Result<f64> {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::NonNumericLimit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_expressions() {
        for expr in ["x^2", "sin(x) * cos(x)", "1/(1 + x^2)", "x**2", "exp(-x), 2.5*x"] {
            assert!(validate_function_expression(expr).valid, "{}", expr);
        }
    }

    #[test]
    fn test_invalid_characters() {
        let result = validate_function_expression("x & y");
        assert!(!result.valid);
        assert_eq!(result.message.as_deref(), Some("Invalid characters detected"));
    }

    #[test]
    fn test_repeated_operators() {
        assert_eq!(
            check_function_expression("x // 2"),
            Err(ValidationError::RepeatedDivision)
        );
        assert_eq!(
            check_function_expression("x *** 2"),
            Err(ValidationError::RepeatedMultiplication)
        );
        // "**" is exponentiation
        assert_eq!(check_function_expression("x ** 2"), Ok(()));
    }

    #[test]
    fn test_invalid_characters_reported_first() {
        assert_eq!(
            check_function_expression("x // 2 #"),
            Err(ValidationError::InvalidCharacters)
        );
    }

    #[test]
    fn test_empty_expression_is_not_yet_invalid() {
        assert_eq!(validate_function_expression(""), Validation::ok());
        assert_eq!(validate_function_expression("  \t"), Validation::ok());
    }

    #[test]
    fn test_limits_table() {
        assert!(validate_limits("", "").valid);
        assert!(!validate_limits("1", "").valid);
        assert!(!validate_limits("", "1").valid);
        assert!(!validate_limits("2", "1").valid);
        assert!(!validate_limits("1", "1").valid);
        assert!(validate_limits("1", "2").valid);
        assert!(validate_limits(" -1.5 ", "2e1").valid);
    }

    #[test]
    fn test_limits_messages() {
        assert_eq!(
            check_limits("1", ""),
            Err(ValidationError::IncompleteLimits)
        );
        assert_eq!(check_limits("a", "2"), Err(ValidationError::NonNumericLimit));
        assert_eq!(check_limits("inf", "2"), Err(ValidationError::NonNumericLimit));
        assert_eq!(check_limits("NaN", "2"), Err(ValidationError::NonNumericLimit));
        assert_eq!(check_limits("3", "2"), Err(ValidationError::LimitsOutOfOrder));
    }

    #[test]
    fn test_validate_form_builds_request() {
        let request = validate_form("  x^2 ", " 0", "1 ").unwrap();
        assert_eq!(request, CalculationRequest::definite("x^2", "0", "1"));

        let request = validate_form("x", "", "").unwrap();
        assert_eq!(request, CalculationRequest::indefinite("x"));
    }

    #[test]
    fn test_validate_form_rejects_empty_function() {
        assert_eq!(
            validate_form("   ", "", ""),
            Err(ValidationError::EmptyFunction)
        );
    }

    #[test]
    fn test_validate_form_rejects_bad_expression() {
        assert_eq!(
            validate_form("x @ 2", "", ""),
            Err(ValidationError::InvalidCharacters)
        );
    }

    proptest! {
        #[test]
        fn prop_disallowed_character_is_invalid(
            prefix in "[a-z0-9+() ]{0,8}",
            bad in "[!@#$%&=\\[\\]{}<>?;:'\"|~`_]",
            suffix in "[a-z0-9+() ]{0,8}",
        ) {
            let text = format!("{}{}{}", prefix, bad, suffix);
            prop_assert!(!validate_function_expression(&text).valid);
        }

        #[test]
        fn prop_ordered_finite_limits_are_valid(a in -1.0e6f64..1.0e6, delta in 1.0e-3f64..1.0e6) {
            let lower = a.to_string();
            let upper = (a + delta).to_string();
            prop_assert!(validate_limits(&lower, &upper).valid);
            prop_assert!(!validate_limits(&upper, &lower).valid);
        }
    }
}
