//! Keyboard input as seen by the action registry.
//!
//! The host translates its native key-down notifications into [`KeyEvent`]s.
//! Each event carries the DOM-style key code, the modifiers held, and a
//! classification of the element that had focus ([`FocusedElement`]), which
//! the interpreter uses to avoid stealing keystrokes from text fields.

use crate::key::{self, Key};

/// Keyboard modifiers that may be held during a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held (Option on macOS).
    pub alt: bool,
    /// The Meta key is held (Command on macOS, Windows key elsewhere).
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        control: true,
        ..Self::NONE
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    /// Meta modifier only.
    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Control + Shift.
    pub const CTRL_SHIFT: Self = Self {
        control: true,
        shift: true,
        ..Self::NONE
    };

    /// Control + Alt.
    pub const CTRL_ALT: Self = Self {
        control: true,
        alt: true,
        ..Self::NONE
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }

    /// Check if any modifier other than Shift is pressed.
    pub fn any_besides_shift(&self) -> bool {
        self.control || self.alt || self.meta
    }

    /// The same modifiers with Shift released.
    pub fn without_shift(self) -> Self {
        Self {
            shift: false,
            ..self
        }
    }
}

/// Identifies a DOM subtree that scopes an action context.
///
/// The host assigns scope ids however it likes (element ids, widget handles);
/// the registry only compares them. [`ScopeId::ROOT`] is the document root
/// that the global context lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    /// The document root.
    pub const ROOT: ScopeId = ScopeId(0);

    /// Wrap a host-assigned scope identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Check if this is the document root.
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

/// The `type` of an `<input>` element, as far as character entry is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    /// Any text-like input (text, search, password, email, number, ...).
    Text,
    /// `type="button"`.
    Button,
    /// `type="checkbox"`.
    Checkbox,
    /// `type="radio"`.
    Radio,
    /// `type="submit"`.
    Submit,
    /// `type="image"`, a graphical submit button.
    Image,
    /// `type="reset"`.
    Reset,
}

/// The kind of element that has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementKind {
    /// An `<input>` of the given type.
    Input(InputType),
    /// A multi-line `<textarea>`.
    TextArea,
    /// A `<select>` list; typed characters jump between options.
    Select,
    /// An element with `contenteditable` set.
    ContentEditable,
    /// A `<button>` element.
    Button,
    /// Anything else (`<div>`, `<span>`, the document body).
    #[default]
    Other,
}

/// Accessibility roles whose widgets support type-ahead.
const TYPE_AHEAD_ROLES: [&str; 2] = ["option", "treeitem"];

/// Classification of the element that has keyboard focus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusedElement {
    /// What kind of element it is.
    pub kind: ElementKind,
    /// Its accessibility role, if any.
    pub role: Option<String>,
    /// Registry scopes enclosing the element, innermost first. The root scope
    /// is implicit and need not be listed.
    pub scopes: Vec<ScopeId>,
}

impl FocusedElement {
    /// Create a classification for an element of the given kind.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Set the accessibility role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the enclosing scope chain, innermost first.
    pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = ScopeId>) -> Self {
        self.scopes = scopes.into_iter().collect();
        self
    }

    /// Check whether typing into this element produces characters.
    pub fn accepts_characters(&self) -> bool {
        let by_kind = match self.kind {
            ElementKind::Input(input_type) => input_type == InputType::Text,
            ElementKind::TextArea | ElementKind::Select | ElementKind::ContentEditable => true,
            ElementKind::Button | ElementKind::Other => false,
        };
        by_kind
            || self
                .role
                .as_deref()
                .is_some_and(|role| TYPE_AHEAD_ROLES.contains(&role))
    }
}

/// A key-down event delivered to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// DOM key code of the pressed key.
    pub key_code: u16,
    /// Modifiers held during the press.
    pub modifiers: KeyboardModifiers,
    /// The element that had focus.
    pub target: FocusedElement,
    default_prevented: bool,
}

impl KeyEvent {
    /// Create a key event targeting an unclassified element.
    pub fn new(key_code: u16, modifiers: KeyboardModifiers) -> Self {
        Self {
            key_code,
            modifiers,
            target: FocusedElement::default(),
            default_prevented: false,
        }
    }

    /// Create a key event for a key from the key table.
    pub fn for_key(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self::new(key.code(), modifiers)
    }

    /// Set the focused element.
    pub fn with_target(mut self, target: FocusedElement) -> Self {
        self.target = target;
        self
    }

    /// The pressed key, if it is in the key table.
    pub fn key(&self) -> Option<Key> {
        Key::from_code(self.key_code)
    }

    /// Check if the pressed key is itself a modifier (Shift, Ctrl, Alt, Meta).
    pub fn is_modifier_key(&self) -> bool {
        key::is_modifier_code(self.key_code)
    }

    /// Suppress the host's default handling of this key press.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Check if default handling was suppressed.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}
