//! Result renderer
//!
//! Maps a `CalculationResponse` onto the page. Rendering always starts by
//! hiding every result and error panel, so "showing results" and "showing an
//! error" never overlap.

use std::sync::Arc;

use integral_core::{CalculationResponse, DefiniteValue, ProcedureStep, ResponseLimits};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::typeset::Typesetter;
use crate::view::{escape_html, Page, PanelId, PlotImage, StepBlock};

pub const PLOT_ALT_TEXT: &str = "Function plot";

/// Wrap LaTeX in display-math delimiters
pub fn display_math(latex: &str) -> String {
    format!("\\[{}\\]", latex)
}

/// Markup of the definite value line
///
/// Numbers are shown with six decimals; symbolic results verbatim.
pub fn format_definite_value(value: &DefiniteValue) -> String {
    match value {
        DefiniteValue::Numeric(n) => format!("<strong>Numeric value:</strong> {:.6}", n),
        DefiniteValue::Symbolic(text) => {
            format!("<strong>Result:</strong> {}", escape_html(text))
        }
    }
}

fn definite_formula(
    limits: Option<&ResponseLimits>,
    latex: Option<&str>,
    value: &DefiniteValue,
) -> String {
    let bounds = limits
        .map(|l| format!("_{{{}}}^{{{}}}", l.lower, l.upper))
        .unwrap_or_default();
    let result = latex
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string());

    display_math(&format!("\\int{} f(x) \\, dx = {}", bounds, result))
}

fn step_block(step: &ProcedureStep) -> StepBlock {
    StepBlock {
        label: step.step.to_string(),
        description: step.description.clone(),
        explanation: step.explanation.clone().filter(|e| !e.is_empty()),
        formula: step
            .latex
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(display_math),
        verified: step.verification,
    }
}

#[derive(Default, Clone)]
pub struct Renderer {
    typesetter: Option<Arc<dyn Typesetter>>,
    asset_base: Option<ClientConfig>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_typesetter(mut self, typesetter: Arc<dyn Typesetter>) -> Self {
        self.typesetter = Some(typesetter);
        self
    }

    /// Resolve server-relative plot URLs against the configured base URL
    pub fn with_asset_base(mut self, config: ClientConfig) -> Self {
        self.asset_base = Some(config);
        self
    }

    /// Render `response`, typeset the new markup, then scroll to the results
    pub async fn render(&self, page: &Mutex<Page>, response: &CalculationResponse) {
        let fragments = {
            let mut page = page.lock();
            self.write_page(&mut page, response)
        };

        self.typeset(&fragments).await;

        page.lock().scroll_target = Some(PanelId::Results);
    }

    /// Write the response into the page; returns the display-math fragments
    /// that need typesetting
    pub fn write_page(&self, page: &mut Page, response: &CalculationResponse) -> Vec<String> {
        page.hide_all_results();
        page.results_visible = true;

        let mut fragments = Vec::new();

        page.original_function = display_math(&format!("f(x) = {}", response.original_function));
        page.indefinite_integral = display_math(&format!(
            "\\int f(x) \\, dx = {} + C",
            response.indefinite_integral
        ));
        page.indefinite_integral_text = response
            .indefinite_integral_text
            .clone()
            .filter(|t| !t.trim().is_empty());
        fragments.push(page.original_function.clone());
        fragments.push(page.indefinite_integral.clone());

        match response.definite_value() {
            Some(value) => {
                page.definite_visible = true;
                page.definite_integral = definite_formula(
                    response.limits.as_ref(),
                    response.definite_integral_latex.as_deref(),
                    value,
                );
                page.definite_value = format_definite_value(value);
                page.definite_result = Some(value.clone());
                fragments.push(page.definite_integral.clone());
            }
            None => {
                page.definite_integral.clear();
                page.definite_value.clear();
                page.definite_result = None;
            }
        }

        page.steps = response.steps().iter().map(step_block).collect();
        if !page.steps.is_empty() {
            page.procedure_visible = true;
            fragments.extend(page.steps.iter().filter_map(|s| s.formula.clone()));
        }

        page.plot = response.plot().map(|url| PlotImage {
            src: match &self.asset_base {
                Some(config) => config.resolve(url),
                None => url.to_string(),
            },
            alt: PLOT_ALT_TEXT.to_string(),
        });
        page.plot_visible = page.plot.is_some();

        debug!(
            "Rendered result (definite: {}, steps: {}, plot: {})",
            page.definite_visible,
            page.steps.len(),
            page.plot_visible
        );

        fragments
    }

    async fn typeset(&self, fragments: &[String]) {
        let Some(typesetter) = &self.typesetter else {
            return;
        };

        if let Err(e) = typesetter.typeset(fragments).await {
            error!("Math typesetting failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use integral_core::LimitValue;

    fn definite_response(value: DefiniteValue) -> CalculationResponse {
        CalculationResponse {
            success: true,
            original_function: "x^{2}".to_string(),
            indefinite_integral: "\\frac{x^{3}}{3}".to_string(),
            is_definite: true,
            definite_integral: Some(value),
            limits: Some(ResponseLimits {
                lower: LimitValue::Number(0.0),
                upper: LimitValue::Number(1.0),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_numeric_value_has_six_decimals() {
        assert_eq!(
            format_definite_value(&DefiniteValue::Numeric(3.14159265)),
            "<strong>Numeric value:</strong> 3.141593"
        );
    }

    #[test]
    fn test_symbolic_value_is_verbatim() {
        assert_eq!(
            format_definite_value(&DefiniteValue::Symbolic("sqrt(pi)/2".to_string())),
            "<strong>Result:</strong> sqrt(pi)/2"
        );
    }

    #[test]
    fn test_write_page_formulas() {
        let mut page = Page::new();
        let response = definite_response(DefiniteValue::Numeric(1.0 / 3.0));

        Renderer::new().write_page(&mut page, &response);

        assert_eq!(page.original_function, "\\[f(x) = x^{2}\\]");
        assert_eq!(
            page.indefinite_integral,
            "\\[\\int f(x) \\, dx = \\frac{x^{3}}{3} + C\\]"
        );
        assert_eq!(
            page.definite_integral,
            "\\[\\int_{0}^{1} f(x) \\, dx = 0.3333333333333333\\]"
        );
        assert!(page.definite_value.ends_with("0.333333"));
    }

    #[test]
    fn test_definite_latex_preferred() {
        let mut page = Page::new();
        let mut response = definite_response(DefiniteValue::Numeric(0.5));
        response.definite_integral_latex = Some("\\frac{1}{2}".to_string());

        Renderer::new().write_page(&mut page, &response);

        assert!(page.definite_integral.ends_with("= \\frac{1}{2}\\]"));
    }

    #[test]
    fn test_indefinite_hides_definite_panel() {
        let mut page = Page::new();
        page.definite_visible = true;
        page.definite_value = "stale".to_string();

        let response = CalculationResponse {
            success: true,
            original_function: "x".to_string(),
            indefinite_integral: "\\frac{x^{2}}{2}".to_string(),
            ..Default::default()
        };
        Renderer::new().write_page(&mut page, &response);

        assert!(!page.definite_visible);
        assert!(page.definite_value.is_empty());
    }

    #[test]
    fn test_symbolic_value_survives_to_text_output() {
        let mut page = Page::new();
        let mut response =
            definite_response(DefiniteValue::Symbolic("Piecewise((1, a < 1) & b)".to_string()));
        response.indefinite_integral_text = Some("x**3/3".to_string());

        Renderer::new().write_page(&mut page, &response);

        assert_eq!(
            page.definite_value,
            "<strong>Result:</strong> Piecewise((1, a &lt; 1) &amp; b)"
        );
        let text = page.to_text();
        assert!(text.contains("Result: Piecewise((1, a < 1) & b)"), "{}", text);
        assert!(text.contains("∫ f(x) dx = x**3/3 + C"), "{}", text);
    }

    #[test]
    fn test_blank_plain_antiderivative_is_ignored() {
        let mut page = Page::new();
        let mut response = definite_response(DefiniteValue::Numeric(1.0));
        response.indefinite_integral_text = Some("  ".to_string());

        Renderer::new().write_page(&mut page, &response);

        assert_eq!(page.indefinite_integral_text, None);
        assert!(page.to_text().contains("\\int f(x) \\, dx = \\frac{x^{3}}{3} + C"));
    }

    #[test]
    fn test_plot_url_resolved_against_base() {
        let mut page = Page::new();
        let response = CalculationResponse {
            success: true,
            plot_url: Some("/static/plots/p.png".to_string()),
            ..Default::default()
        };

        Renderer::new()
            .with_asset_base(ClientConfig::default())
            .write_page(&mut page, &response);

        let plot = page.plot.unwrap();
        assert_eq!(plot.src, "http://127.0.0.1:5000/static/plots/p.png");
        assert_eq!(plot.alt, PLOT_ALT_TEXT);
        assert!(page.plot_visible);
    }

    #[test]
    fn test_step_block_skips_empty_optional_fields() {
        let step = ProcedureStep {
            explanation: Some(String::new()),
            latex: Some(String::new()),
            ..ProcedureStep::new(1u64, "Identify the integrand")
        };
        let block = step_block(&step);
        assert!(block.explanation.is_none());
        assert!(block.formula.is_none());
    }
}
