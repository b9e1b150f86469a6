/*
 * Integral Client - presentation layer of the integral calculator
 *
 * Talks to a remote `POST /calculate` service and renders its result.
 *
 * Architecture:
 * - Request client (pluggable `CalculationService`, reqwest in production)
 * - Page view binding (injected, no globals)
 * - Result renderer + optional math typesetter
 * - Form orchestrator (Idle/Calculating guard)
 * - Event bus with disposable subscriptions
 */

// Public modules
pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod form;
pub mod orchestrator;
pub mod render;
pub mod typeset;
pub mod view;

// Re-exports
pub use api::{interpret_response, CalculationService, HttpCalculationService};
pub use config::{ClientConfig, ConfigError, ConfigResult};
pub use controller::{run_submissions, FormController, FormFields, SubmissionSummary};
pub use error::{
    ClientError, ErrorCategory, Result, DEFAULT_CALCULATION_ERROR, DEFAULT_CONNECTION_ERROR,
};
pub use events::{
    enter_navigation, global_shortcut, EventBus, FocusAction, InputId, Key, KeyEvent, Modifiers,
    Shortcut, Subscription, UiEvent,
};
pub use form::{FormInput, FormState, FormStateMachine};
pub use orchestrator::{FormOrchestrator, SubmitOutcome};
pub use render::{display_math, format_definite_value, Renderer};
pub use typeset::{DelimiterCheck, Typesetter};
pub use view::{Page, PanelId, PlotImage, StepBlock};
