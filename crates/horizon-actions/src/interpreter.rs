//! Turning key presses into shortcut combinations.
//!
//! The [`KeyEventInterpreter`] is a pure function of the key code, the held
//! modifiers, the focused-element classification, and the shortcut support
//! mode. It never mutates anything; partial-sequence state lives in the
//! registry.

use horizon_actions_core::logging::targets;

use crate::environment::{Platform, ShortcutSupport};
use crate::event::{KeyEvent, KeyboardModifiers};
use crate::key::Key;
use crate::shortcut::KeyCombination;

/// Letters that form the standard editing shortcuts under the platform's
/// command modifier: select all, copy, paste, cut, undo, redo.
const EDITING_LETTERS: [Key; 6] = [Key::A, Key::C, Key::V, Key::X, Key::Z, Key::Y];

/// Converts key presses into canonical key combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEventInterpreter {
    platform: Platform,
}

impl KeyEventInterpreter {
    /// Create an interpreter for the given platform.
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// The platform this interpreter normalizes for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Interpret a key press.
    ///
    /// Returns `None` if the key is not in the key table, if it would type or
    /// edit text in the focused element, or if it is a bare printable key while
    /// sequences are disabled.
    pub fn interpret(&self, event: &KeyEvent, support: ShortcutSupport) -> Option<KeyCombination> {
        let key = Key::from_code(event.key_code)?;
        let held = event.modifiers;

        let modifiers = if key.is_letter() && !held.any_besides_shift() {
            held.without_shift()
        } else {
            held
        };
        let combination = KeyCombination::new(key, modifiers);

        if event.target.accepts_characters() && self.is_text_entry(key, held) {
            tracing::trace!(
                target: targets::INTERPRETER,
                %combination,
                "key belongs to the focused text control"
            );
            return None;
        }

        if support == ShortcutSupport::Single && key.is_printable() && !held.any_besides_shift() {
            return None;
        }

        Some(combination)
    }

    /// Check whether a key press could type a character or trigger a
    /// standard editing command in a text control.
    fn is_text_entry(&self, key: Key, held: KeyboardModifiers) -> bool {
        if key.is_printable() {
            if !held.control && !held.meta && !held.alt {
                return true;
            }
            // Option composes characters on Mac, AltGr (reported as Ctrl+Alt)
            // does elsewhere.
            let composing = match self.platform {
                Platform::Mac => held.alt && !held.control && !held.meta,
                Platform::Standard => held.control && held.alt && !held.meta,
            };
            if composing {
                return true;
            }
        }

        let other_command_modifiers = match self.platform {
            Platform::Mac => held.control || held.alt,
            Platform::Standard => held.meta || held.alt,
        };
        self.platform.command_held(held)
            && !other_command_modifiers
            && EDITING_LETTERS.contains(&key)
    }
}
