//! Event subscription and keyboard handling
//!
//! Handlers are registered with [`EventBus::subscribe`], which returns a
//! [`Subscription`]. Dropping (or disposing) the subscription unregisters the
//! handler, so a test can tear down exactly what it wired up.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;
type HandlerList<E> = Mutex<Vec<(u64, Handler<E>)>>;

/// Synchronous event bus
pub struct EventBus<E> {
    handlers: Arc<HandlerList<E>>,
    next_id: AtomicU64,
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `handler`; it stays live until the returned handle is disposed
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().push((id, Arc::new(handler)));

        let handlers: Weak<HandlerList<E>> = Arc::downgrade(&self.handlers);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(handlers) = handlers.upgrade() {
                    handlers.lock().retain(|(handler_id, _)| *handler_id != id);
                }
            })),
        }
    }

    /// Call every live handler in subscription order
    ///
    /// Handlers run outside the registry lock and may subscribe or dispose.
    pub fn emit(&self, event: &E) {
        let handlers: Vec<Handler<E>> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

/// Disposer handle returned by [`EventBus::subscribe`]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn dispose(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// UI events
// ═══════════════════════════════════════════════════════════════════════════

/// Focusable form inputs, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputId {
    Function,
    LowerLimit,
    UpperLimit,
}

impl InputId {
    pub fn next(&self) -> Option<InputId> {
        match self {
            InputId::Function => Some(InputId::LowerLimit),
            InputId::LowerLimit => Some(InputId::UpperLimit),
            InputId::UpperLimit => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Escape,
    Char(char),
    Other(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Input that had focus, if any
    pub target: Option<InputId>,
}

impl KeyEvent {
    pub fn new(key: Key, target: Option<InputId>) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            target,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    KeyDown(KeyEvent),
    /// The user edited an input; carries its new text
    Input { input: InputId, value: String },
    SymbolButton(String),
    FunctionButton(String),
    Submit,
    PlotLoadError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusAction {
    Focus(InputId),
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Submit,
    ClearResults,
}

/// Enter (without Shift) walks the inputs, submitting from the last one
pub fn enter_navigation(event: &KeyEvent) -> Option<FocusAction> {
    if event.key != Key::Enter || event.modifiers.shift {
        return None;
    }
    // Ctrl/Cmd+Enter belongs to the global shortcut
    if event.modifiers.ctrl || event.modifiers.meta {
        return None;
    }

    let target = event.target?;
    Some(match target.next() {
        Some(next) => FocusAction::Focus(next),
        None => FocusAction::Submit,
    })
}

/// Page-wide shortcuts: Ctrl/Cmd+Enter submits unless busy, Escape clears
pub fn global_shortcut(event: &KeyEvent, busy: bool) -> Option<Shortcut> {
    match event.key {
        Key::Enter if event.modifiers.ctrl || event.modifiers.meta => {
            if busy {
                None
            } else {
                Some(Shortcut::Submit)
            }
        }
        Key::Escape => Some(Shortcut::ClearResults),
        _ => None,
    }
}
