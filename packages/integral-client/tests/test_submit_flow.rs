//! Integration tests for the submit → request → render cycle
//!
//! The calculation service is replaced by in-process mocks; HTTP status and
//! body handling goes through `interpret_response` exactly as the reqwest
//! client does.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use integral_client::{
    interpret_response, CalculationService, ClientError, FormInput, FormOrchestrator, FormState,
    Page, PanelId, Renderer, Result, SubmitOutcome, Typesetter,
};
use integral_core::{CalculationRequest, CalculationResponse, FieldId};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::Notify;

/// Replays a fixed HTTP status/body and counts calls
struct ScriptedService {
    status: u16,
    body: String,
    calls: AtomicUsize,
    last_request: Mutex<Option<CalculationRequest>>,
}

impl ScriptedService {
    fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }
}

#[async_trait]
impl CalculationService for ScriptedService {
    async fn calculate(&self, request: &CalculationRequest) -> Result<CalculationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());
        interpret_response(self.status, &self.body)
    }
}

/// Holds every call until released
struct GatedService {
    calls: AtomicUsize,
    started: Notify,
    release: Notify,
}

#[async_trait]
impl CalculationService for GatedService {
    async fn calculate(&self, _request: &CalculationRequest) -> Result<CalculationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(antiderivative_of_x())
    }
}

fn antiderivative_of_x() -> CalculationResponse {
    CalculationResponse {
        success: true,
        original_function: "x".to_string(),
        indefinite_integral: "\\frac{x^{2}}{2}".to_string(),
        ..Default::default()
    }
}

/// First call never completes; later calls succeed
struct HangsOnceService {
    calls: AtomicUsize,
}

#[async_trait]
impl CalculationService for HangsOnceService {
    async fn calculate(&self, _request: &CalculationRequest) -> Result<CalculationResponse> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok(antiderivative_of_x())
    }
}

/// First call panics; later calls succeed
struct PanicsOnceService {
    calls: AtomicUsize,
}

#[async_trait]
impl CalculationService for PanicsOnceService {
    async fn calculate(&self, _request: &CalculationRequest) -> Result<CalculationResponse> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("service crashed");
        }
        Ok(antiderivative_of_x())
    }
}

struct RecordingTypesetter {
    fragments: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl Typesetter for RecordingTypesetter {
    async fn typeset(&self, fragments: &[String]) -> Result<()> {
        self.fragments.lock().extend_from_slice(fragments);
        if self.fail {
            Err(ClientError::typeset("engine unavailable"))
        } else {
            Ok(())
        }
    }
}

fn orchestrator(service: Arc<dyn CalculationService>) -> FormOrchestrator {
    FormOrchestrator::new(service, Arc::new(Mutex::new(Page::new())))
}

const DEFINITE_BODY: &str = r#"{
    "success": true,
    "original_function": "\\sin{\\left(x \\right)}",
    "indefinite_integral": "- \\cos{\\left(x \\right)}",
    "is_definite": true,
    "definite_integral": 3.14159265,
    "definite_integral_latex": "\\pi",
    "limits": {"lower": 0.0, "upper": 3.0},
    "procedure": [
        {"step": 1, "description": "Identify the function", "latex": "f(x) = \\sin(x)"},
        {"step": 2, "description": "Integrate", "explanation": "Known antiderivative"},
        {"step": 3, "description": "Check by differentiating", "verification": true}
    ],
    "plot_url": "/static/plots/plot_1.png"
}"#;

#[tokio::test]
async fn test_definite_value_rendered_with_six_decimals() {
    let service = ScriptedService::new(200, DEFINITE_BODY);
    let orch = orchestrator(service.clone());

    let outcome = orch
        .submit(&FormInput::new("sin(x)").with_limits("0", "3"))
        .await;

    assert!(outcome.is_rendered());
    assert_eq!(
        service.last_request.lock().clone(),
        Some(CalculationRequest::definite("sin(x)", "0", "3"))
    );

    let page = orch.page().lock();
    assert!(page.results_visible);
    assert!(page.definite_visible);
    assert_eq!(
        page.definite_value,
        "<strong>Numeric value:</strong> 3.141593"
    );
    assert_eq!(
        page.definite_integral,
        "\\[\\int_{0}^{3} f(x) \\, dx = \\pi\\]"
    );
}

#[tokio::test]
async fn test_procedure_steps_render_in_order() {
    let orch = orchestrator(ScriptedService::new(200, DEFINITE_BODY));

    orch.submit(&FormInput::new("sin(x)").with_limits("0", "3"))
        .await;

    let page = orch.page().lock();
    assert!(page.procedure_visible);
    let labels: Vec<&str> = page.steps.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["1", "2", "3"]);

    assert_eq!(page.steps[0].formula.as_deref(), Some("\\[f(x) = \\sin(x)\\]"));
    assert_eq!(page.steps[1].explanation.as_deref(), Some("Known antiderivative"));
    assert!(!page.steps[1].verified);
    assert!(page.steps[2].verified);
    assert!(page.procedure_html().contains("✓ Verified"));
}

#[tokio::test]
async fn test_empty_procedure_leaves_panel_hidden() {
    let body = r#"{"success": true, "original_function": "1", "indefinite_integral": "x", "is_definite": false, "procedure": []}"#;
    let orch = orchestrator(ScriptedService::new(200, body));

    // Stale steps from an earlier render must not survive
    orch.page().lock().steps.push(integral_client::StepBlock {
        label: "9".to_string(),
        description: "stale".to_string(),
        explanation: None,
        formula: None,
        verified: false,
    });

    orch.submit(&FormInput::new("1")).await;

    let page = orch.page().lock();
    assert!(page.results_visible);
    assert!(!page.procedure_visible);
    assert!(page.steps.is_empty());
    assert!(page.procedure_html().is_empty());
}

#[tokio::test]
async fn test_server_error_shown_verbatim() {
    let service = ScriptedService::new(200, r#"{"success": false, "error": "bad expression"}"#);
    let orch = orchestrator(service);

    let outcome = orch.submit(&FormInput::new("x")).await;

    assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
    let page = orch.page().lock();
    assert!(page.error_visible);
    assert!(!page.results_visible);
    assert_eq!(page.error_message, "bad expression");
    assert_eq!(page.scroll_target, Some(PanelId::Error));
}

#[tokio::test]
async fn test_http_error_status_shows_default_message() {
    let orch = orchestrator(ScriptedService::new(502, "<html>Bad Gateway</html>"));

    orch.submit(&FormInput::new("x")).await;

    assert_eq!(
        orch.page().lock().error_message,
        integral_client::DEFAULT_CALCULATION_ERROR
    );
}

#[tokio::test]
async fn test_submit_while_calculating_is_ignored() {
    let service = Arc::new(GatedService {
        calls: AtomicUsize::new(0),
        started: Notify::new(),
        release: Notify::new(),
    });
    let orch = orchestrator(service.clone());
    let form = FormInput::new("x");

    let first = orch.submit(&form);
    let second = async {
        service.started.notified().await;

        assert!(matches!(orch.state(), FormState::Calculating { .. }));
        {
            let page = orch.page().lock();
            assert!(page.loading_visible);
            assert!(!page.submit_enabled);
        }

        let outcome = orch.submit(&form).await;
        service.release.notify_one();
        outcome
    };

    let (first, second) = tokio::join!(first, second);

    assert!(first.is_rendered());
    assert_eq!(second, SubmitOutcome::Ignored);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    assert_eq!(orch.state(), FormState::Idle);
    assert!(orch.page().lock().submit_enabled);
}

#[tokio::test]
async fn test_invalid_submission_makes_no_request() {
    let service = ScriptedService::new(200, DEFINITE_BODY);
    let orch = orchestrator(service.clone());

    let outcome = orch
        .submit(&FormInput::new("x").with_limits("2", "1"))
        .await;

    assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        orch.page().lock().inline_error(FieldId::Limits),
        Some("The lower limit must be less than the upper limit")
    );
}

#[tokio::test]
async fn test_empty_function_blocks_submission() {
    let service = ScriptedService::new(200, DEFINITE_BODY);
    let orch = orchestrator(service.clone());

    let outcome = orch.submit(&FormInput::new("   ")).await;

    assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        orch.page().lock().inline_error(FieldId::Function),
        Some("Please enter a function")
    );
}

#[tokio::test]
async fn test_error_then_success_swaps_panels() {
    let failing = orchestrator(ScriptedService::new(
        400,
        r#"{"success": false, "error": "Provide both limits or none"}"#,
    ));
    failing.submit(&FormInput::new("x")).await;
    assert!(failing.page().lock().error_visible);

    // Same page, new service: the next successful render hides the error
    let page = failing.page().clone();
    let working = FormOrchestrator::new(ScriptedService::new(200, DEFINITE_BODY), page.clone());
    working
        .submit(&FormInput::new("sin(x)").with_limits("0", "3"))
        .await;

    let page = page.lock();
    assert!(page.results_visible);
    assert!(!page.error_visible);
}

#[tokio::test]
async fn test_typesetting_failure_is_not_fatal() {
    let typesetter = Arc::new(RecordingTypesetter {
        fragments: Mutex::new(Vec::new()),
        fail: true,
    });
    let orch = orchestrator(ScriptedService::new(200, DEFINITE_BODY))
        .with_renderer(Renderer::new().with_typesetter(typesetter.clone()));

    let outcome = orch
        .submit(&FormInput::new("sin(x)").with_limits("0", "3"))
        .await;

    assert!(outcome.is_rendered());
    let page = orch.page().lock();
    assert!(page.results_visible);
    assert_eq!(page.scroll_target, Some(PanelId::Results));

    // original, indefinite, definite, one step formula
    let fragments = typesetter.fragments.lock();
    assert_eq!(fragments.len(), 4);
    assert!(fragments.iter().all(|f| f.starts_with("\\[") && f.ends_with("\\]")));
}

#[tokio::test]
async fn test_plot_failure_hides_only_plot() {
    let orch = orchestrator(ScriptedService::new(200, DEFINITE_BODY));
    orch.submit(&FormInput::new("sin(x)").with_limits("0", "3"))
        .await;

    {
        let page = orch.page().lock();
        assert!(page.plot_visible);
        assert_eq!(
            page.plot.as_ref().map(|p| p.src.as_str()),
            Some("/static/plots/plot_1.png")
        );
    }

    orch.page().lock().plot_load_failed();

    let page = orch.page().lock();
    assert!(!page.plot_visible);
    assert!(page.results_visible);
    assert!(page.definite_visible);
    assert!(page.procedure_visible);
}

#[tokio::test]
async fn test_cancelled_submit_returns_to_idle() {
    let service = Arc::new(HangsOnceService {
        calls: AtomicUsize::new(0),
    });
    let orch = orchestrator(service.clone());
    let form = FormInput::new("x");

    let timed_out = tokio::time::timeout(Duration::from_millis(20), orch.submit(&form)).await;
    assert!(timed_out.is_err());

    assert!(!orch.is_busy());
    assert_eq!(orch.state(), FormState::Idle);
    {
        let page = orch.page().lock();
        assert!(!page.loading_visible);
        assert!(page.submit_enabled);
    }

    // The next submission reaches the service again
    let outcome = orch.submit(&form).await;
    assert!(outcome.is_rendered());
    assert_eq!(service.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_panicking_service_returns_to_idle() {
    let service = Arc::new(PanicsOnceService {
        calls: AtomicUsize::new(0),
    });
    let orch = Arc::new(orchestrator(service.clone()));

    let task = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.submit(&FormInput::new("x")).await })
    };
    assert!(task.await.is_err());

    assert!(!orch.is_busy());
    {
        let page = orch.page().lock();
        assert!(!page.loading_visible);
        assert!(page.submit_enabled);
    }

    let outcome = orch.submit(&FormInput::new("x")).await;
    assert!(outcome.is_rendered());
    assert_eq!(service.calls.load(Ordering::SeqCst), 2);
}
