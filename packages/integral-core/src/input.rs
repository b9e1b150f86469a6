//! Editing helpers for the function input
//!
//! Positions are character offsets, so multi-byte input never splits a
//! code point.

/// Symbol buttons: (label, inserted text)
pub const SYMBOLS: &[(&str, &str)] = &[
    ("+", "+"),
    ("−", "-"),
    ("×", "*"),
    ("÷", "/"),
    ("xⁿ", "^"),
    ("(", "("),
    (")", ")"),
    ("x", "x"),
    ("π", "pi"),
    ("e", "E"),
];

/// Function buttons; each inserts `name()` with the caret inside
pub const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "exp", "log", "ln",
    "sqrt", "abs",
];

/// Text of an input control plus its selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputBuffer {
    value: String,
    selection_start: usize,
    selection_end: usize,
}

impl InputBuffer {
    /// New buffer with the caret at the end
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let end = value.chars().count();
        Self {
            value,
            selection_start: end,
            selection_end: end,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn selection(&self) -> (usize, usize) {
        (self.selection_start, self.selection_end)
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    /// Set the selection; offsets are clamped and ordered
    pub fn set_selection_range(&mut self, start: usize, end: usize) {
        let len = self.len();
        let (start, end) = (start.min(len), end.min(len));
        self.selection_start = start.min(end);
        self.selection_end = start.max(end);
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.set_selection_range(pos, pos);
    }

    fn byte_offset(&self, pos: usize) -> usize {
        self.value
            .char_indices()
            .nth(pos)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len())
    }

    fn text_after_selection(&self) -> &str {
        &self.value[self.byte_offset(self.selection_end)..]
    }

    /// Replace the selection with `text`, leaving `cursor_shift` characters
    /// of the inserted text before the caret
    fn splice(&mut self, text: &str, cursor_shift: usize) {
        let start = self.byte_offset(self.selection_start);
        let end = self.byte_offset(self.selection_end);
        self.value.replace_range(start..end, text);

        let caret = self.selection_start + cursor_shift;
        self.set_cursor(caret);
    }

    /// Insert `text` over the selection; the caret lands after it
    ///
    /// # Examples
    ///
    /// ```rust
    /// use integral_core::input::InputBuffer;
    ///
    /// let mut input = InputBuffer::new("x2");
    /// input.set_cursor(1);
    /// input.insert_at_cursor("^");
    /// assert_eq!(input.value(), "x^2");
    /// assert_eq!(input.selection(), (2, 2));
    /// ```
    pub fn insert_at_cursor(&mut self, text: &str) {
        self.splice(text, text.chars().count());
    }

    /// Insert `name()` over the selection with the caret between the parentheses
    pub fn insert_function_call(&mut self, name: &str) {
        let call = format!("{}()", name);
        self.splice(&call, name.chars().count() + 1);
    }

    /// Handle a typed `(`
    ///
    /// Inserts `()` with the caret inside unless the text after the selection
    /// already starts with `)`. Returns false when the keystroke should be
    /// left to the control.
    pub fn auto_close_paren(&mut self) -> bool {
        if self.text_after_selection().starts_with(')') {
            return false;
        }
        self.splice("()", 1);
        true
    }
}
