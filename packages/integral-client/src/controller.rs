//! Form controller: binds UI events to the input buffers and the orchestrator
//!
//! Submissions are forwarded over a channel; [`run_submissions`] drains it and
//! spawns one `submit` per request so that a submit arriving while another is
//! in flight reaches the orchestrator's guard and is ignored there.

use std::sync::Arc;

use integral_core::InputBuffer;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

use crate::events::{
    enter_navigation, global_shortcut, EventBus, FocusAction, InputId, Key, Shortcut,
    Subscription, UiEvent,
};
use crate::form::FormInput;
use crate::orchestrator::{FormOrchestrator, SubmitOutcome};

/// Editable state of the three inputs plus focus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub function: InputBuffer,
    pub lower_limit: InputBuffer,
    pub upper_limit: InputBuffer,
    pub focus: InputId,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            function: InputBuffer::default(),
            lower_limit: InputBuffer::default(),
            upper_limit: InputBuffer::default(),
            focus: InputId::Function,
        }
    }
}

impl FormFields {
    pub fn buffer_mut(&mut self, input: InputId) -> &mut InputBuffer {
        match input {
            InputId::Function => &mut self.function,
            InputId::LowerLimit => &mut self.lower_limit,
            InputId::UpperLimit => &mut self.upper_limit,
        }
    }

    pub fn to_form_input(&self) -> FormInput {
        FormInput::new(self.function.value())
            .with_limits(self.lower_limit.value(), self.upper_limit.value())
    }
}

#[derive(Clone)]
pub struct FormController {
    orchestrator: Arc<FormOrchestrator>,
    fields: Arc<Mutex<FormFields>>,
    submissions: mpsc::UnboundedSender<FormInput>,
}

impl FormController {
    pub fn new(
        orchestrator: Arc<FormOrchestrator>,
        submissions: mpsc::UnboundedSender<FormInput>,
    ) -> Self {
        Self {
            orchestrator,
            fields: Arc::new(Mutex::new(FormFields::default())),
            submissions,
        }
    }

    pub fn fields(&self) -> FormFields {
        self.fields.lock().clone()
    }

    pub fn orchestrator(&self) -> &Arc<FormOrchestrator> {
        &self.orchestrator
    }

    /// Install every handler; dispose the returned handles to tear down
    pub fn bind(&self, bus: &EventBus<UiEvent>) -> Vec<Subscription> {
        let validation = self.clone();
        let buttons = self.clone();
        let keyboard = self.clone();
        let submit = self.clone();
        let plot = self.clone();

        vec![
            bus.subscribe(move |event| {
                if let UiEvent::Input { input, value } = event {
                    validation.set_input(*input, value);
                }
            }),
            bus.subscribe(move |event| match event {
                UiEvent::SymbolButton(symbol) => buttons.insert_symbol(symbol),
                UiEvent::FunctionButton(name) => buttons.insert_function(name),
                _ => {}
            }),
            bus.subscribe(move |event| {
                if let UiEvent::KeyDown(key_event) = event {
                    keyboard.handle_key(key_event);
                }
            }),
            bus.subscribe(move |event| {
                if let UiEvent::Submit = event {
                    submit.request_submit();
                }
            }),
            bus.subscribe(move |event| {
                if let UiEvent::PlotLoadError = event {
                    plot.orchestrator.page().lock().plot_load_failed();
                }
            }),
        ]
    }

    /// Replace the text of an input and run live validation
    pub fn set_input(&self, input: InputId, value: &str) {
        {
            let mut fields = self.fields.lock();
            *fields.buffer_mut(input) = InputBuffer::new(value);
        }
        self.validate(input);
    }

    fn validate(&self, input: InputId) {
        let fields = self.fields();
        match input {
            InputId::Function => {
                self.orchestrator.on_function_input(fields.function.value());
            }
            InputId::LowerLimit | InputId::UpperLimit => {
                self.orchestrator
                    .on_limits_input(fields.lower_limit.value(), fields.upper_limit.value());
            }
        }
    }

    pub fn insert_symbol(&self, symbol: &str) {
        {
            let mut fields = self.fields.lock();
            fields.function.insert_at_cursor(symbol);
            fields.focus = InputId::Function;
        }
        self.validate(InputId::Function);
    }

    pub fn insert_function(&self, name: &str) {
        {
            let mut fields = self.fields.lock();
            fields.function.insert_function_call(name);
            fields.focus = InputId::Function;
        }
        self.validate(InputId::Function);
    }

    pub fn handle_key(&self, event: &crate::events::KeyEvent) {
        if let Some(shortcut) = global_shortcut(event, self.orchestrator.is_busy()) {
            match shortcut {
                Shortcut::Submit => self.request_submit(),
                Shortcut::ClearResults => self.orchestrator.clear_results(),
            }
            return;
        }

        if let Some(action) = enter_navigation(event) {
            match action {
                FocusAction::Focus(next) => self.fields.lock().focus = next,
                FocusAction::Submit => self.request_submit(),
            }
            return;
        }

        if event.key == Key::Char('(')
            && !event.modifiers.shift
            && event.target == Some(InputId::Function)
        {
            let inserted = self.fields.lock().function.auto_close_paren();
            if inserted {
                self.validate(InputId::Function);
            }
        }
    }

    /// Queue a submission of the current field values
    pub fn request_submit(&self) {
        let form = self.fields.lock().to_form_input();
        if self.submissions.send(form).is_err() {
            warn!("Submission dropped: no submission driver is running");
        }
    }
}

/// Tally of the submissions handled by [`run_submissions`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionSummary {
    pub rendered: usize,
    pub failed: usize,
    pub invalid: usize,
    pub ignored: usize,
    pub panicked: usize,
}

impl SubmissionSummary {
    fn record(&mut self, joined: std::result::Result<SubmitOutcome, JoinError>) {
        match joined {
            Ok(SubmitOutcome::Rendered { .. }) => self.rendered += 1,
            Ok(SubmitOutcome::Failed { .. }) => self.failed += 1,
            Ok(SubmitOutcome::Invalid(_)) => self.invalid += 1,
            Ok(SubmitOutcome::Ignored) => self.ignored += 1,
            Err(e) => {
                warn!("Submission task panicked: {}", e);
                self.panicked += 1;
            }
        }
    }

    pub fn total(&self) -> usize {
        self.rendered + self.failed + self.invalid + self.ignored + self.panicked
    }
}

/// Drain queued submissions until the channel closes
///
/// Each submission runs on its own task. Finished tasks are reaped as they
/// complete, so a long session holds only the tasks still in flight.
pub async fn run_submissions(
    orchestrator: Arc<FormOrchestrator>,
    mut submissions: mpsc::UnboundedReceiver<FormInput>,
) -> SubmissionSummary {
    let mut tasks = JoinSet::new();
    let mut summary = SubmissionSummary::default();

    loop {
        tokio::select! {
            Some(form) = submissions.recv() => {
                let orchestrator = orchestrator.clone();
                tasks.spawn(async move { orchestrator.submit(&form).await });
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                summary.record(joined);
            }
            else => break,
        }
    }

    debug!("Submission driver finished ({} submissions)", summary.total());
    summary
}
