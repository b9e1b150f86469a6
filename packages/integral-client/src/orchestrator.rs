use std::sync::Arc;

use integral_core::{
    validate_form, validate_function_expression, validate_limits, FieldId, Validation,
    ValidationError,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::CalculationService;
use crate::form::{FormInput, FormState, FormStateMachine};
use crate::render::Renderer;
use crate::view::Page;

/// What a call to [`FormOrchestrator::submit`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A calculation was already in flight; nothing happened
    Ignored,
    /// Validation failed; the inline error is on the page
    Invalid(ValidationError),
    /// The result is on the page
    Rendered { submission_id: Uuid, elapsed_ms: u64 },
    /// The error panel shows `message`
    Failed { submission_id: Uuid, message: String },
}

impl SubmitOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, SubmitOutcome::Rendered { .. })
    }
}

/// Wires submit → validation → request → render
///
/// The busy state lives here; the page and the calculation service are
/// injected. `submit` takes `&self`, so overlapping submits from the same
/// task see the guard and all but the first are ignored.
pub struct FormOrchestrator {
    service: Arc<dyn CalculationService>,
    renderer: Renderer,
    page: Arc<Mutex<Page>>,
    state: Mutex<FormStateMachine>,
}

impl FormOrchestrator {
    pub fn new(service: Arc<dyn CalculationService>, page: Arc<Mutex<Page>>) -> Self {
        Self {
            service,
            renderer: Renderer::new(),
            page,
            state: Mutex::new(FormStateMachine::new()),
        }
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn page(&self) -> &Arc<Mutex<Page>> {
        &self.page
    }

    pub fn state(&self) -> FormState {
        self.state.lock().state().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().is_busy()
    }

    /// Live check of the function input
    pub fn on_function_input(&self, text: &str) -> Validation {
        let validation = validate_function_expression(text);
        self.page.lock().apply_validation(FieldId::Function, &validation);
        validation
    }

    /// Live check of the limit inputs
    pub fn on_limits_input(&self, lower: &str, upper: &str) -> Validation {
        let validation = validate_limits(lower, upper);
        self.page.lock().apply_validation(FieldId::Limits, &validation);
        validation
    }

    /// Hide every result and error panel
    pub fn clear_results(&self) {
        self.page.lock().hide_all_results();
    }

    pub async fn submit(&self, form: &FormInput) -> SubmitOutcome {
        if self.is_busy() {
            debug!("Submit ignored: calculation already in flight");
            return SubmitOutcome::Ignored;
        }

        let request = match validate_form(&form.function, &form.lower_limit, &form.upper_limit) {
            Ok(request) => request,
            Err(e) => {
                debug!("Submit blocked by validation: {}", e);
                self.page.lock().show_inline_error(e.field(), e.to_string());
                return SubmitOutcome::Invalid(e);
            }
        };

        let submission_id = match self.state.lock().begin() {
            Ok(id) => id,
            Err(_) => return SubmitOutcome::Ignored,
        };
        let in_flight = InFlight::new(self, submission_id);

        {
            let mut page = self.page.lock();
            page.clear_inline_error(FieldId::Function);
            page.clear_inline_error(FieldId::Limits);
            page.show_loading();
        }

        info!(
            "Submission {} started (function: {}, definite: {})",
            submission_id,
            request.function,
            request.is_definite()
        );

        let result = self.service.calculate(&request).await;

        let failure = match result {
            Ok(response) => {
                self.renderer.render(&self.page, &response).await;
                None
            }
            Err(e) => {
                warn!("Submission {} failed ({}): {}", submission_id, e.category(), e);
                let message = e.user_message();
                self.page.lock().display_error(message.clone());
                Some(message)
            }
        };

        let elapsed_ms = in_flight.complete();

        match failure {
            None => {
                info!("Submission {} rendered in {}ms", submission_id, elapsed_ms);
                SubmitOutcome::Rendered {
                    submission_id,
                    elapsed_ms,
                }
            }
            Some(message) => SubmitOutcome::Failed {
                submission_id,
                message,
            },
        }
    }
}

/// Returns the form to Idle when a submission ends
///
/// Also runs when the `submit` future is dropped mid-flight or a collaborator
/// panics, so the loading overlay never outlives its submission.
struct InFlight<'a> {
    orchestrator: &'a FormOrchestrator,
    submission_id: Uuid,
    released: bool,
}

impl<'a> InFlight<'a> {
    fn new(orchestrator: &'a FormOrchestrator, submission_id: Uuid) -> Self {
        Self {
            orchestrator,
            submission_id,
            released: false,
        }
    }

    /// Normal completion; returns the elapsed milliseconds
    fn complete(mut self) -> u64 {
        self.release()
    }

    fn release(&mut self) -> u64 {
        self.released = true;
        self.orchestrator.page.lock().hide_loading();

        match self.orchestrator.state.lock().finish() {
            Ok(ms) => ms,
            Err(e) => {
                warn!("Submission {}: {}", self.submission_id, e);
                0
            }
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                "Submission {} abandoned before completion",
                self.submission_id
            );
            self.release();
        }
    }
}
