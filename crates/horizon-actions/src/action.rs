//! The action model.
//!
//! An [`Action`] is a named user command that can be bound to buttons, menu
//! items, and keyboard shortcuts. Every action is exactly one of three kinds
//! ([`ActionKind`]):
//!
//! - **Simple**: runs an invoke behavior, or follows a link
//! - **Toggle**: a boolean state read and written through a get/set pair
//! - **Choice group**: one of N values, read and written through a get/set
//!   pair, with an ordered list of [`Choice`]s
//!
//! Actions are built with a small builder and then handed to an
//! [`ActionContext`](crate::ActionContext):
//!
//! ```
//! use horizon_actions::{Action, Choice};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! let undo = Action::simple("undo", |_event, _focus| false)
//!     .with_label("Undo")
//!     .with_shortcut("Ctrl+Z");
//!
//! let wrap = Arc::new(AtomicBool::new(false));
//! let (get, set) = (wrap.clone(), wrap.clone());
//! let word_wrap = Action::toggle(
//!     "word-wrap",
//!     move || get.load(Ordering::SeqCst),
//!     move |on| set.store(on, Ordering::SeqCst),
//! )
//! .with_label_key("WORD_WRAP");
//!
//! assert!(undo.is_simple());
//! assert!(word_wrap.is_toggle());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::environment::Environment;
use crate::error::ShortcutError;
use crate::event::{FocusedElement, KeyEvent};
use crate::shortcut::{IntoShortcut, KeySequence};

/// Behavior of a simple action. Returns `true` if it moved focus itself.
pub type InvokeFn = Arc<dyn Fn(Option<&KeyEvent>, Option<&FocusedElement>) -> bool + Send + Sync>;
/// Reads a toggle action's state.
pub type GetBoolFn = Arc<dyn Fn() -> bool + Send + Sync>;
/// Writes a toggle action's state.
pub type SetBoolFn = Arc<dyn Fn(bool) + Send + Sync>;
/// Reads a choice group's current value.
pub type GetChoiceFn = Arc<dyn Fn() -> String + Send + Sync>;
/// Writes a choice group's current value.
pub type SetChoiceFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Characters that may not appear in action names. Commas and colons are
/// used when shortcuts and choices are encoded as text.
const RESERVED_NAME_CHARS: [char; 4] = [',', ':', '"', '\''];

/// Check whether `name` can be used as an action name.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || RESERVED_NAME_CHARS.contains(&c))
}

// =============================================================================
// Display Text
// =============================================================================

/// A display string given either literally or as a translation key.
///
/// Keys are resolved through the environment's translator when the action is
/// added to a context (and again on update if a new key was set). After that
/// the text is fixed; it does not follow later changes in the translator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayText {
    text: Option<String>,
    pending_key: Option<String>,
}

impl DisplayText {
    /// Literal text.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            pending_key: None,
        }
    }

    /// A translation key, resolved at registration.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            text: None,
            pending_key: Some(key.into()),
        }
    }

    /// The resolved text, if any.
    pub fn get(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Check whether a translation key is still waiting to be resolved.
    pub fn is_pending(&self) -> bool {
        self.pending_key.is_some()
    }

    /// Resolve a pending key. Returns `true` if one was resolved.
    pub(crate) fn resolve(&mut self, env: &Environment) -> bool {
        match self.pending_key.take() {
            Some(key) => {
                self.text = Some(env.translate(&key));
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// Choice
// =============================================================================

/// One option of a choice-group action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    label: DisplayText,
    value: String,
    icon: Option<String>,
    shortcut: Option<KeySequence>,
    shortcut_error: Option<ShortcutError>,
    disabled: bool,
}

impl Choice {
    /// Create a choice with a literal label.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: DisplayText::literal(label),
            value: value.into(),
            icon: None,
            shortcut: None,
            shortcut_error: None,
            disabled: false,
        }
    }

    /// Create a choice whose label is a translation key.
    pub fn with_key(label_key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: DisplayText::key(label_key),
            ..Self::new("", value)
        }
    }

    /// Set the icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the shortcut. Invalid shortcuts are reported when the action is
    /// added to a context.
    pub fn with_shortcut(mut self, shortcut: impl IntoShortcut) -> Self {
        self.assign_shortcut(shortcut);
        self
    }

    /// Set whether this choice is disabled.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// The value written through the group's setter.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The display label.
    pub fn label(&self) -> Option<&str> {
        self.label.get()
    }

    /// The icon.
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// The shortcut that selects this choice.
    pub fn shortcut(&self) -> Option<&KeySequence> {
        self.shortcut.as_ref()
    }

    /// Check whether this choice is disabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Set the display label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = DisplayText::literal(label);
    }

    /// Set the shortcut.
    pub fn set_shortcut(&mut self, shortcut: Option<KeySequence>) {
        self.shortcut = shortcut;
        self.shortcut_error = None;
    }

    /// Set whether this choice is disabled.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    fn assign_shortcut(&mut self, shortcut: impl IntoShortcut) {
        match shortcut.into_shortcut() {
            Ok(sequence) => self.set_shortcut(Some(sequence)),
            Err(err) => {
                self.shortcut = None;
                self.shortcut_error = Some(err);
            }
        }
    }
}

// =============================================================================
// Action Kind and Value
// =============================================================================

/// The kind of an action, with the fields that kind needs.
#[derive(Clone)]
pub enum ActionKind {
    /// Runs `invoke`, or navigates to `href` if there is no behavior.
    Simple {
        invoke: Option<InvokeFn>,
        href: Option<String>,
    },
    /// A boolean state.
    Toggle {
        get: GetBoolFn,
        set: SetBoolFn,
        on_label: DisplayText,
        off_label: DisplayText,
    },
    /// One of several values.
    ChoiceGroup {
        get: GetChoiceFn,
        set: SetChoiceFn,
        choices: Vec<Choice>,
    },
}

impl fmt::Debug for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Simple { invoke, href } => f
                .debug_struct("Simple")
                .field("has_invoke", &invoke.is_some())
                .field("href", href)
                .finish(),
            ActionKind::Toggle {
                on_label,
                off_label,
                ..
            } => f
                .debug_struct("Toggle")
                .field("on_label", on_label)
                .field("off_label", off_label)
                .finish_non_exhaustive(),
            ActionKind::ChoiceGroup { choices, .. } => f
                .debug_struct("ChoiceGroup")
                .field("choices", choices)
                .finish_non_exhaustive(),
        }
    }
}

/// A value read from or written to a toggle or choice-group action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionValue {
    Bool(bool),
    Choice(String),
}

impl ActionValue {
    /// The value as a toggle state. Choice values are true when non-empty.
    pub fn as_bool(&self) -> bool {
        match self {
            ActionValue::Bool(value) => *value,
            ActionValue::Choice(value) => !value.is_empty(),
        }
    }

    /// The value as a choice value.
    pub fn as_choice(&self) -> String {
        match self {
            ActionValue::Bool(value) => value.to_string(),
            ActionValue::Choice(value) => value.clone(),
        }
    }
}

impl From<bool> for ActionValue {
    fn from(value: bool) -> Self {
        ActionValue::Bool(value)
    }
}

impl From<&str> for ActionValue {
    fn from(value: &str) -> Self {
        ActionValue::Choice(value.to_string())
    }
}

impl From<String> for ActionValue {
    fn from(value: String) -> Self {
        ActionValue::Choice(value)
    }
}

// =============================================================================
// Action
// =============================================================================

/// A named user command.
#[derive(Clone)]
pub struct Action {
    name: String,
    kind: ActionKind,
    label: DisplayText,
    title: DisplayText,
    context_label: DisplayText,
    icon: Option<String>,
    icon_type: Option<String>,
    disabled: bool,
    hidden: bool,
    shortcut: Option<KeySequence>,
    shortcut_error: Option<ShortcutError>,
}

impl Action {
    /// Create an action of the given kind.
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: DisplayText::default(),
            title: DisplayText::default(),
            context_label: DisplayText::default(),
            icon: None,
            icon_type: None,
            disabled: false,
            hidden: false,
            shortcut: None,
            shortcut_error: None,
        }
    }

    /// Create a simple action with an invoke behavior.
    ///
    /// The behavior receives the triggering key event and focused element,
    /// when there are any, and returns `true` if it moved focus itself.
    pub fn simple<F>(name: impl Into<String>, invoke: F) -> Self
    where
        F: Fn(Option<&KeyEvent>, Option<&FocusedElement>) -> bool + Send + Sync + 'static,
    {
        Self::new(
            name,
            ActionKind::Simple {
                invoke: Some(Arc::new(invoke)),
                href: None,
            },
        )
    }

    /// Create a simple action that navigates to `href`.
    pub fn link(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self::new(
            name,
            ActionKind::Simple {
                invoke: None,
                href: Some(href.into()),
            },
        )
    }

    /// Create a toggle action.
    pub fn toggle<G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        G: Fn() -> bool + Send + Sync + 'static,
        S: Fn(bool) + Send + Sync + 'static,
    {
        Self::new(
            name,
            ActionKind::Toggle {
                get: Arc::new(get),
                set: Arc::new(set),
                on_label: DisplayText::default(),
                off_label: DisplayText::default(),
            },
        )
    }

    /// Create a choice-group action.
    pub fn choice<G, S>(name: impl Into<String>, get: G, set: S, choices: Vec<Choice>) -> Self
    where
        G: Fn() -> String + Send + Sync + 'static,
        S: Fn(&str) + Send + Sync + 'static,
    {
        Self::new(
            name,
            ActionKind::ChoiceGroup {
                get: Arc::new(get),
                set: Arc::new(set),
                choices,
            },
        )
    }

    // -------------------------------------------------------------------------
    // Builder
    // -------------------------------------------------------------------------

    /// Set a literal label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = DisplayText::literal(label);
        self
    }

    /// Set the label from a translation key.
    pub fn with_label_key(mut self, key: impl Into<String>) -> Self {
        self.label = DisplayText::key(key);
        self
    }

    /// Set a literal title (tooltip).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = DisplayText::literal(title);
        self
    }

    /// Set the title from a translation key.
    pub fn with_title_key(mut self, key: impl Into<String>) -> Self {
        self.title = DisplayText::key(key);
        self
    }

    /// Set a literal context-menu label.
    pub fn with_context_label(mut self, label: impl Into<String>) -> Self {
        self.context_label = DisplayText::literal(label);
        self
    }

    /// Set the context-menu label from a translation key.
    pub fn with_context_label_key(mut self, key: impl Into<String>) -> Self {
        self.context_label = DisplayText::key(key);
        self
    }

    /// Set the labels shown for a toggle's on and off states. Ignored for
    /// other kinds.
    pub fn with_state_labels(mut self, on: DisplayText, off: DisplayText) -> Self {
        if let ActionKind::Toggle {
            on_label,
            off_label,
            ..
        } = &mut self.kind
        {
            *on_label = on;
            *off_label = off;
        }
        self
    }

    /// Set the icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the icon type hint.
    pub fn with_icon_type(mut self, icon_type: impl Into<String>) -> Self {
        self.icon_type = Some(icon_type.into());
        self
    }

    /// Set whether the action starts disabled.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Set whether the action starts hidden.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Set the primary shortcut. Invalid shortcuts are reported, and
    /// dropped, when the action is added to a context.
    pub fn with_shortcut(mut self, shortcut: impl IntoShortcut) -> Self {
        match shortcut.into_shortcut() {
            Ok(sequence) => self.set_shortcut(Some(sequence)),
            Err(err) => {
                self.shortcut = None;
                self.shortcut_error = Some(err);
            }
        }
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The action's unique name within its context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind and its fields.
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Check if this is a simple action.
    pub fn is_simple(&self) -> bool {
        matches!(self.kind, ActionKind::Simple { .. })
    }

    /// Check if this is a toggle action.
    pub fn is_toggle(&self) -> bool {
        matches!(self.kind, ActionKind::Toggle { .. })
    }

    /// Check if this is a choice-group action.
    pub fn is_choice_group(&self) -> bool {
        matches!(self.kind, ActionKind::ChoiceGroup { .. })
    }

    /// The label.
    pub fn label(&self) -> Option<&str> {
        self.label.get()
    }

    /// The label, falling back to the name.
    pub fn display_label(&self) -> &str {
        self.label().filter(|l| !l.is_empty()).unwrap_or(&self.name)
    }

    /// The title (tooltip).
    pub fn title(&self) -> Option<&str> {
        self.title.get()
    }

    /// The context-menu label.
    pub fn context_label(&self) -> Option<&str> {
        self.context_label.get()
    }

    /// The toggle's on-state label.
    pub fn on_label(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Toggle { on_label, .. } => on_label.get(),
            _ => None,
        }
    }

    /// The toggle's off-state label.
    pub fn off_label(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Toggle { off_label, .. } => off_label.get(),
            _ => None,
        }
    }

    /// The icon.
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// The icon type hint.
    pub fn icon_type(&self) -> Option<&str> {
        self.icon_type.as_deref()
    }

    /// The link target of a simple action.
    pub fn href(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Simple { href, .. } => href.as_deref(),
            _ => None,
        }
    }

    /// Check whether the action is disabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Check whether the action is hidden.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Check whether the action can be activated (neither disabled nor hidden).
    pub fn is_available(&self) -> bool {
        !self.disabled && !self.hidden
    }

    /// The primary shortcut.
    pub fn shortcut(&self) -> Option<&KeySequence> {
        self.shortcut.as_ref()
    }

    /// The choices of a choice group. Empty for other kinds.
    pub fn choices(&self) -> &[Choice] {
        match &self.kind {
            ActionKind::ChoiceGroup { choices, .. } => choices,
            _ => &[],
        }
    }

    /// Find a choice by value.
    pub fn find_choice(&self, value: &str) -> Option<&Choice> {
        self.choices().iter().find(|c| c.value == value)
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Set a literal label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = DisplayText::literal(label);
    }

    /// Set the label from a translation key, resolved on the next update.
    pub fn set_label_key(&mut self, key: impl Into<String>) {
        self.label = DisplayText::key(key);
    }

    /// Set a literal title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = DisplayText::literal(title);
    }

    /// Set a literal context-menu label.
    pub fn set_context_label(&mut self, label: impl Into<String>) {
        self.context_label = DisplayText::literal(label);
    }

    /// Set the icon.
    pub fn set_icon(&mut self, icon: Option<String>) {
        self.icon = icon;
    }

    /// Set the icon type hint.
    pub fn set_icon_type(&mut self, icon_type: Option<String>) {
        self.icon_type = icon_type;
    }

    /// Set whether the action is disabled.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Set whether the action is hidden.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Set the primary shortcut.
    pub fn set_shortcut(&mut self, shortcut: Option<KeySequence>) {
        self.shortcut = shortcut;
        self.shortcut_error = None;
    }

    /// Mutable access to a choice group's choices.
    pub fn choices_mut(&mut self) -> Option<&mut Vec<Choice>> {
        match &mut self.kind {
            ActionKind::ChoiceGroup { choices, .. } => Some(choices),
            _ => None,
        }
    }

    /// Mutable access to one choice.
    pub fn choice_mut(&mut self, value: &str) -> Option<&mut Choice> {
        self.choices_mut()?.iter_mut().find(|c| c.value == value)
    }

    // -------------------------------------------------------------------------
    // Registry support
    // -------------------------------------------------------------------------

    /// Resolve every pending translation key.
    pub(crate) fn resolve_text(&mut self, env: &Environment) {
        self.label.resolve(env);
        self.title.resolve(env);
        self.context_label.resolve(env);
        match &mut self.kind {
            ActionKind::Toggle {
                on_label,
                off_label,
                ..
            } => {
                on_label.resolve(env);
                off_label.resolve(env);
            }
            ActionKind::ChoiceGroup { choices, .. } => {
                for choice in choices {
                    choice.label.resolve(env);
                }
            }
            ActionKind::Simple { .. } => {}
        }
    }

    /// Take the errors recorded by `with_shortcut` calls whose input did not
    /// parse, paired with the choice they belong to.
    pub(crate) fn take_shortcut_errors(&mut self) -> Vec<(Option<String>, ShortcutError)> {
        let mut errors = Vec::new();
        if let Some(err) = self.shortcut_error.take() {
            errors.push((None, err));
        }
        if let Some(choices) = self.choices_mut() {
            for choice in choices {
                if let Some(err) = choice.shortcut_error.take() {
                    errors.push((Some(choice.value.clone()), err));
                }
            }
        }
        errors
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("disabled", &self.disabled)
            .field("hidden", &self.hidden)
            .field("shortcut", &self.shortcut.as_ref().map(ToString::to_string))
            .finish_non_exhaustive()
    }
}
