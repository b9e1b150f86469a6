//! View binding
//!
//! `Page` is the single object every component writes to: it holds what the
//! calculator page currently shows (panels, inline errors, busy indicator,
//! submit control, scroll target). It is constructed once and injected into
//! the renderer and the orchestrator; nothing reaches for it globally.
//!
//! A page can be exported as a standalone HTML document or as plain text.

use std::fmt::Write as _;

use integral_core::{DefiniteValue, FieldId, Validation};
use serde::Serialize;
use tracing::error;

/// MathJax bundle loaded by exported documents
pub const MATHJAX_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js";

/// Panels that can be shown, hidden or scrolled to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelId {
    Results,
    Error,
    DefiniteResult,
    Procedure,
    Plot,
    Loading,
}

impl PanelId {
    /// Element id used in exported HTML
    pub fn element_id(&self) -> &'static str {
        match self {
            PanelId::Results => "results-section",
            PanelId::Error => "error-section",
            PanelId::DefiniteResult => "definite-result",
            PanelId::Procedure => "procedure-section",
            PanelId::Plot => "plot-section",
            PanelId::Loading => "loading-overlay",
        }
    }
}

/// Inline error display next to an input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InlineError {
    pub message: String,
    pub shown: bool,
}

/// One rendered procedure step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepBlock {
    pub label: String,
    pub description: String,
    pub explanation: Option<String>,
    /// Display-math markup, already delimited
    pub formula: Option<String>,
    pub verified: bool,
}

pub const VERIFIED_BADGE: &str = "✓ Verified";

impl StepBlock {
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let class = if self.verified {
            "procedure-step verification"
        } else {
            "procedure-step"
        };

        let _ = write!(html, r#"<div class="{}"><div class="step-header">"#, class);
        let _ = write!(
            html,
            r#"<span class="step-number">{}</span><span class="step-description">{}</span>"#,
            escape_html(&self.label),
            escape_html(&self.description)
        );
        if self.verified {
            let _ = write!(
                html,
                r#"<span class="verification-badge">{}</span>"#,
                VERIFIED_BADGE
            );
        }
        html.push_str("</div>");

        if let Some(explanation) = &self.explanation {
            let _ = write!(
                html,
                r#"<div class="step-explanation">{}</div>"#,
                escape_html(explanation)
            );
        }
        if let Some(formula) = &self.formula {
            let _ = write!(html, r#"<div class="step-formula">{}</div>"#, formula);
        }

        html.push_str("</div>");
        html
    }
}

/// Plot image element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlotImage {
    pub src: String,
    pub alt: String,
}

/// State of the calculator page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub function_error: InlineError,
    pub limits_error: InlineError,

    pub submit_enabled: bool,
    pub loading_visible: bool,

    pub results_visible: bool,
    pub original_function: String,
    pub indefinite_integral: String,
    /// Plain-text antiderivative, when the service sent one
    pub indefinite_integral_text: Option<String>,

    pub definite_visible: bool,
    pub definite_integral: String,
    /// Markup of the numeric/symbolic value line
    pub definite_value: String,
    /// Value behind `definite_value`, as received
    pub definite_result: Option<DefiniteValue>,

    pub procedure_visible: bool,
    pub steps: Vec<StepBlock>,

    pub plot_visible: bool,
    pub plot: Option<PlotImage>,

    pub error_visible: bool,
    pub error_message: String,

    pub scroll_target: Option<PanelId>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    /// Initial page: every panel hidden, submit enabled
    pub fn new() -> Self {
        Self {
            function_error: InlineError::default(),
            limits_error: InlineError::default(),
            submit_enabled: true,
            loading_visible: false,
            results_visible: false,
            original_function: String::new(),
            indefinite_integral: String::new(),
            indefinite_integral_text: None,
            definite_visible: false,
            definite_integral: String::new(),
            definite_value: String::new(),
            definite_result: None,
            procedure_visible: false,
            steps: Vec::new(),
            plot_visible: false,
            plot: None,
            error_visible: false,
            error_message: String::new(),
            scroll_target: None,
        }
    }

    pub fn is_visible(&self, panel: PanelId) -> bool {
        match panel {
            PanelId::Results => self.results_visible,
            PanelId::Error => self.error_visible,
            PanelId::DefiniteResult => self.definite_visible,
            PanelId::Procedure => self.procedure_visible,
            PanelId::Plot => self.plot_visible,
            PanelId::Loading => self.loading_visible,
        }
    }

    // ── inline errors ────────────────────────────────────────────────────

    fn inline_mut(&mut self, field: FieldId) -> &mut InlineError {
        match field {
            FieldId::Function => &mut self.function_error,
            FieldId::Limits => &mut self.limits_error,
        }
    }

    /// Message currently shown for `field`, if any
    pub fn inline_error(&self, field: FieldId) -> Option<&str> {
        let display = match field {
            FieldId::Function => &self.function_error,
            FieldId::Limits => &self.limits_error,
        };
        if display.shown {
            Some(display.message.as_str())
        } else {
            None
        }
    }

    pub fn show_inline_error(&mut self, field: FieldId, message: impl Into<String>) {
        let display = self.inline_mut(field);
        display.message = message.into();
        display.shown = true;
    }

    pub fn clear_inline_error(&mut self, field: FieldId) {
        let display = self.inline_mut(field);
        display.message.clear();
        display.shown = false;
    }

    pub fn apply_validation(&mut self, field: FieldId, validation: &Validation) {
        match &validation.message {
            Some(message) => self.show_inline_error(field, message.clone()),
            None => self.clear_inline_error(field),
        }
    }

    // ── busy indicator ───────────────────────────────────────────────────

    pub fn show_loading(&mut self) {
        self.loading_visible = true;
        self.submit_enabled = false;
    }

    pub fn hide_loading(&mut self) {
        self.loading_visible = false;
        self.submit_enabled = true;
    }

    // ── result / error panels ────────────────────────────────────────────

    /// Hide every result and error panel
    pub fn hide_all_results(&mut self) {
        self.results_visible = false;
        self.error_visible = false;
        self.definite_visible = false;
        self.procedure_visible = false;
        self.plot_visible = false;
    }

    /// Show `message` in the error panel, hiding any result
    pub fn display_error(&mut self, message: impl Into<String>) {
        self.hide_all_results();
        self.error_visible = true;
        self.error_message = message.into();
        self.scroll_target = Some(PanelId::Error);
    }

    /// The plot image failed to load: hide its panel only
    pub fn plot_load_failed(&mut self) {
        self.plot_visible = false;
        error!(
            "Failed to load plot image: {}",
            self.plot.as_ref().map(|p| p.src.as_str()).unwrap_or("<none>")
        );
    }

    /// Markup of the procedure container
    pub fn procedure_html(&self) -> String {
        self.steps.iter().map(StepBlock::to_html).collect()
    }

    // ── export ───────────────────────────────────────────────────────────

    /// Standalone HTML document of the current page
    ///
    /// Hidden panels keep the `hidden` class, as on the live page.
    pub fn to_html_document(&self, title: &str) -> String {
        let mut html = String::new();
        let _ = writeln!(html, "<!DOCTYPE html>");
        let _ = writeln!(html, r#"<html lang="en"><head><meta charset="utf-8">"#);
        let _ = writeln!(html, "<title>{}</title>", escape_html(title));
        let _ = writeln!(
            html,
            "<style>.hidden{{display:none}}.verification-badge{{color:#2e7d32;margin-left:.5em}}</style>"
        );
        let _ = writeln!(html, r#"<script id="MathJax-script" async src="{}"></script>"#, MATHJAX_SCRIPT_URL);
        let _ = writeln!(html, "</head><body>");

        let _ = writeln!(
            html,
            r#"<section id="{}"{}>"#,
            PanelId::Results.element_id(),
            hidden_attr(self.results_visible)
        );
        let _ = writeln!(html, r#"<div id="original-function">{}</div>"#, self.original_function);
        let _ = writeln!(html, r#"<div id="indefinite-integral">{}</div>"#, self.indefinite_integral);
        let _ = writeln!(
            html,
            r#"<div id="{}"{}><div id="definite-integral">{}</div><div id="definite-value">{}</div></div>"#,
            PanelId::DefiniteResult.element_id(),
            hidden_attr(self.definite_visible),
            self.definite_integral,
            self.definite_value
        );
        let _ = writeln!(
            html,
            r#"<div id="{}"{}><div id="integration-procedure">{}</div></div>"#,
            PanelId::Procedure.element_id(),
            hidden_attr(self.procedure_visible),
            self.procedure_html()
        );
        let _ = writeln!(
            html,
            r#"<div id="{}"{}>{}</div>"#,
            PanelId::Plot.element_id(),
            hidden_attr(self.plot_visible),
            self.plot
                .as_ref()
                .map(|p| format!(
                    r#"<img id="plot-image" src="{}" alt="{}">"#,
                    escape_html(&p.src),
                    escape_html(&p.alt)
                ))
                .unwrap_or_default()
        );
        let _ = writeln!(html, "</section>");

        let _ = writeln!(
            html,
            r#"<section id="{}"{}><p id="error-message">{}</p></section>"#,
            PanelId::Error.element_id(),
            hidden_attr(self.error_visible),
            escape_html(&self.error_message)
        );
        let _ = writeln!(html, "</body></html>");
        html
    }

    /// Plain-text rendition for terminals
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        if self.error_visible {
            let _ = writeln!(out, "Error: {}", self.error_message);
            return out;
        }
        if !self.results_visible {
            return out;
        }

        let _ = writeln!(out, "{}", strip_math_delimiters(&self.original_function));
        match &self.indefinite_integral_text {
            Some(text) => {
                let _ = writeln!(out, "∫ f(x) dx = {} + C", text);
            }
            None => {
                let _ = writeln!(out, "{}", strip_math_delimiters(&self.indefinite_integral));
            }
        }

        if self.definite_visible {
            let _ = writeln!(out, "{}", strip_math_delimiters(&self.definite_integral));
            match &self.definite_result {
                Some(DefiniteValue::Numeric(n)) => {
                    let _ = writeln!(out, "Numeric value: {:.6}", n);
                }
                Some(DefiniteValue::Symbolic(text)) => {
                    let _ = writeln!(out, "Result: {}", text);
                }
                None => {}
            }
        }

        if self.procedure_visible {
            let _ = writeln!(out);
            let _ = writeln!(out, "Procedure:");
            for step in &self.steps {
                let badge = if step.verified {
                    format!(" [{}]", VERIFIED_BADGE)
                } else {
                    String::new()
                };
                let _ = writeln!(out, "  {}. {}{}", step.label, step.description, badge);
                if let Some(explanation) = &step.explanation {
                    let _ = writeln!(out, "     {}", explanation);
                }
                if let Some(formula) = &step.formula {
                    let _ = writeln!(out, "     {}", strip_math_delimiters(formula));
                }
            }
        }

        if self.plot_visible {
            if let Some(plot) = &self.plot {
                let _ = writeln!(out);
                let _ = writeln!(out, "Plot: {}", plot.src);
            }
        }

        out
    }
}

fn hidden_attr(visible: bool) -> &'static str {
    if visible {
        ""
    } else {
        r#" class="hidden""#
    }
}

/// Escape text for insertion as HTML text content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn strip_math_delimiters(markup: &str) -> &str {
    markup
        .trim()
        .trim_start_matches("\\[")
        .trim_end_matches("\\]")
        .trim()
}
