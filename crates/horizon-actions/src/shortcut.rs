//! Shortcut values.
//!
//! - [`KeyCombination`]: one key plus the modifiers that must be held
//! - [`KeySequence`]: an ordered sequence of 1 to 4 combinations
//!
//! Shortcuts are structured values. Text is only involved at the edges:
//! parsing user or configuration input, the canonical [`Display`](fmt::Display)
//! form used for storage, and the human-readable form from
//! [`KeySequence::display`].
//!
//! # Canonical text
//!
//! A combination is written `[Ctrl+][Alt+][Meta+][Shift+]<Key>`, with the
//! modifiers in exactly that order and key tokens taken from the key table.
//! Combinations in a sequence are separated by commas:
//!
//! ```
//! use horizon_actions::{KeySequence, Platform};
//!
//! let seq: KeySequence = "Ctrl+F2,G,H".parse().unwrap();
//! assert_eq!(seq.count(), 3);
//! assert_eq!(seq.to_string(), "Ctrl+F2,G,H");
//! assert_eq!(seq.display(Platform::Standard), "Ctrl+F2, G, H");
//! ```
//!
//! Shift is implied on a bare letter ("a" and "A" are the same key press),
//! so `Shift+A` with no other modifier is rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::environment::Platform;
use crate::error::ShortcutError;
use crate::event::KeyboardModifiers;
use crate::key::Key;

/// Maximum number of key combinations in a sequence.
pub const MAX_KEY_SEQUENCE_LENGTH: usize = 4;

// =============================================================================
// Key Combination
// =============================================================================

/// A single key combination (one key with modifiers).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyCombination {
    /// The primary key.
    pub key: Key,
    /// The modifier keys that must be held.
    pub modifiers: KeyboardModifiers,
}

impl KeyCombination {
    /// Create a new key combination from a key and modifiers.
    pub fn new(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self { key, modifiers }
    }

    /// Create a key combination with no modifiers.
    pub fn key_only(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::NONE)
    }

    /// Create a Ctrl+key combination.
    pub fn ctrl(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::CTRL)
    }

    /// Create an Alt+key combination.
    pub fn alt(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::ALT)
    }

    /// Create a Meta+key combination.
    pub fn meta(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::META)
    }

    /// Create a Ctrl+Shift+key combination.
    pub fn ctrl_shift(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::CTRL_SHIFT)
    }

    /// Check whether Shift is held on a letter with nothing else. Such a
    /// combination can never be produced by the interpreter.
    pub fn has_redundant_shift(&self) -> bool {
        self.key.is_letter() && self.modifiers.shift && !self.modifiers.any_besides_shift()
    }

    /// Render for people, substituting platform names for modifiers.
    pub fn display(&self, platform: Platform) -> String {
        let mut parts = Vec::with_capacity(5);
        for (held, canonical) in self.modifier_tokens() {
            if held {
                parts.push(platform.modifier_label(canonical));
            }
        }
        parts.push(self.key.name());
        parts.join("+")
    }

    fn modifier_tokens(&self) -> [(bool, &'static str); 4] {
        [
            (self.modifiers.control, "Ctrl"),
            (self.modifiers.alt, "Alt"),
            (self.modifiers.meta, "Meta"),
            (self.modifiers.shift, "Shift"),
        ]
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (held, token) in self.modifier_tokens() {
            if held {
                write!(f, "{token}+")?;
            }
        }
        f.write_str(self.key.name())
    }
}

impl FromStr for KeyCombination {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(ShortcutError::EmptyCombination(s.to_string()));
        }

        let mut tokens: Vec<&str> = text.split('+').collect();
        let key_token = tokens.pop().unwrap_or_default();
        if key_token.is_empty() {
            return Err(ShortcutError::MissingKey(text.to_string()));
        }

        let mut modifiers = KeyboardModifiers::NONE;
        // Rank of the last modifier seen, enforcing Ctrl < Alt < Meta < Shift.
        let mut last_rank = 0;
        for token in tokens {
            let (rank, flag) = match token {
                "Ctrl" => (1, &mut modifiers.control),
                "Alt" => (2, &mut modifiers.alt),
                "Meta" => (3, &mut modifiers.meta),
                "Shift" => (4, &mut modifiers.shift),
                other => {
                    return Err(ShortcutError::UnknownModifier {
                        modifier: other.to_string(),
                        combination: text.to_string(),
                    });
                }
            };
            if rank <= last_rank {
                return Err(ShortcutError::ModifierOrder(text.to_string()));
            }
            last_rank = rank;
            *flag = true;
        }

        let key = Key::from_name(key_token).ok_or_else(|| ShortcutError::UnknownKey {
            key: key_token.to_string(),
            combination: text.to_string(),
        })?;

        let combination = KeyCombination::new(key, modifiers);
        if combination.has_redundant_shift() {
            return Err(ShortcutError::RedundantShift(text.to_string()));
        }
        Ok(combination)
    }
}

// =============================================================================
// Key Sequence
// =============================================================================

/// How a run of pressed combinations relates to a [`KeySequence`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceMatch {
    /// The pressed combinations are the whole sequence.
    ExactMatch,
    /// The pressed combinations are a strict prefix; more keys are expected.
    PartialMatch,
    /// The pressed combinations diverge from the sequence.
    NoMatch,
}

/// A keyboard shortcut: an ordered sequence of 1 to 4 key combinations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeySequence {
    combinations: Vec<KeyCombination>,
}

impl KeySequence {
    /// Create a key sequence from a single key and modifiers.
    pub fn single(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self::from_combination(KeyCombination::new(key, modifiers))
    }

    /// Create a key sequence from a [`KeyCombination`].
    pub fn from_combination(combo: KeyCombination) -> Self {
        Self {
            combinations: vec![combo],
        }
    }

    /// Create a key sequence from several combinations.
    ///
    /// Fails if `combos` is empty, longer than [`MAX_KEY_SEQUENCE_LENGTH`], or
    /// contains a combination with a redundant Shift.
    pub fn from_combinations(combos: Vec<KeyCombination>) -> Result<Self, ShortcutError> {
        let sequence = Self {
            combinations: combos,
        };
        sequence.validate()?;
        Ok(sequence)
    }

    /// Create a key sequence with no modifiers.
    pub fn key_only(key: Key) -> Self {
        Self::from_combination(KeyCombination::key_only(key))
    }

    /// Create a Ctrl+key shortcut.
    pub fn ctrl(key: Key) -> Self {
        Self::from_combination(KeyCombination::ctrl(key))
    }

    /// Create an Alt+key shortcut.
    pub fn alt(key: Key) -> Self {
        Self::from_combination(KeyCombination::alt(key))
    }

    /// Create a Ctrl+Shift+key shortcut.
    pub fn ctrl_shift(key: Key) -> Self {
        Self::from_combination(KeyCombination::ctrl_shift(key))
    }

    /// Check the structural rules that parsing enforces.
    ///
    /// Values built from parts (rather than parsed) are checked here before
    /// they are registered.
    pub fn validate(&self) -> Result<(), ShortcutError> {
        if self.combinations.is_empty() {
            return Err(ShortcutError::Empty);
        }
        if self.combinations.len() > MAX_KEY_SEQUENCE_LENGTH {
            return Err(ShortcutError::TooLong {
                count: self.combinations.len(),
                max: MAX_KEY_SEQUENCE_LENGTH,
            });
        }
        if let Some(combo) = self.combinations.iter().find(|c| c.has_redundant_shift()) {
            return Err(ShortcutError::RedundantShift(combo.to_string()));
        }
        Ok(())
    }

    /// Get the number of key combinations in this sequence.
    pub fn count(&self) -> usize {
        self.combinations.len()
    }

    /// Check if this is a single-combination shortcut.
    pub fn is_single(&self) -> bool {
        self.combinations.len() == 1
    }

    /// Get the key combinations in this sequence.
    pub fn combinations(&self) -> &[KeyCombination] {
        &self.combinations
    }

    /// Get the first key combination, if any.
    pub fn first(&self) -> Option<&KeyCombination> {
        self.combinations.first()
    }

    /// Check if a run of pressed combinations matches this shortcut.
    pub fn matches_partial(&self, pressed: &[KeyCombination]) -> SequenceMatch {
        if pressed.is_empty() || pressed.len() > self.combinations.len() {
            return SequenceMatch::NoMatch;
        }
        if !self.combinations.starts_with(pressed) {
            return SequenceMatch::NoMatch;
        }
        if pressed.len() == self.combinations.len() {
            SequenceMatch::ExactMatch
        } else {
            SequenceMatch::PartialMatch
        }
    }

    /// Check if either sequence is a strict prefix of the other.
    pub fn is_ambiguous_with(&self, other: &KeySequence) -> bool {
        self.combinations.len() != other.combinations.len()
            && (self.combinations.starts_with(&other.combinations)
                || other.combinations.starts_with(&self.combinations))
    }

    /// Render for people: platform modifier names, parts joined by `", "`.
    pub fn display(&self, platform: Platform) -> String {
        self.combinations
            .iter()
            .map(|combo| combo.display(platform))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, combo) in self.combinations.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{combo}")?;
        }
        Ok(())
    }
}

impl FromStr for KeySequence {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ShortcutError::Empty);
        }

        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() > MAX_KEY_SEQUENCE_LENGTH {
            return Err(ShortcutError::TooLong {
                count: parts.len(),
                max: MAX_KEY_SEQUENCE_LENGTH,
            });
        }

        let combinations = parts
            .into_iter()
            .map(|part| {
                if part.trim().is_empty() {
                    Err(ShortcutError::EmptyCombination(s.to_string()))
                } else {
                    part.parse::<KeyCombination>()
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { combinations })
    }
}

impl From<KeyCombination> for KeySequence {
    fn from(combo: KeyCombination) -> Self {
        Self::from_combination(combo)
    }
}

impl Serialize for KeySequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeySequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Conversion
// =============================================================================

/// Anything that can name a shortcut: canonical text or a structured value.
///
/// Registry operations accept `impl IntoShortcut`, so callers can pass either
/// `"Ctrl+Z"` or a [`KeySequence`] they built. Structured values are validated
/// the same way parsed ones are.
pub trait IntoShortcut {
    /// Convert into a validated key sequence.
    fn into_shortcut(self) -> Result<KeySequence, ShortcutError>;
}

impl IntoShortcut for KeySequence {
    fn into_shortcut(self) -> Result<KeySequence, ShortcutError> {
        self.validate()?;
        Ok(self)
    }
}

impl IntoShortcut for &KeySequence {
    fn into_shortcut(self) -> Result<KeySequence, ShortcutError> {
        self.clone().into_shortcut()
    }
}

impl IntoShortcut for KeyCombination {
    fn into_shortcut(self) -> Result<KeySequence, ShortcutError> {
        KeySequence::from_combination(self).into_shortcut()
    }
}

impl IntoShortcut for &str {
    fn into_shortcut(self) -> Result<KeySequence, ShortcutError> {
        self.parse()
    }
}

impl IntoShortcut for &String {
    fn into_shortcut(self) -> Result<KeySequence, ShortcutError> {
        self.parse()
    }
}

impl IntoShortcut for String {
    fn into_shortcut(self) -> Result<KeySequence, ShortcutError> {
        self.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(text: &str) -> KeySequence {
        text.parse().unwrap()
    }

    #[test]
    fn test_parse_single() {
        let s = seq("Ctrl+Shift+F7");
        assert_eq!(s.count(), 1);
        let combo = s.combinations()[0];
        assert_eq!(combo.key, Key::F7);
        assert_eq!(combo.modifiers, KeyboardModifiers::CTRL_SHIFT);
    }

    #[test]
    fn test_parse_sequence_tolerates_spaces() {
        let s = seq("Ctrl+K, Ctrl+C");
        assert_eq!(s.count(), 2);
        assert_eq!(s.to_string(), "Ctrl+K,Ctrl+C");
    }

    #[test]
    fn test_canonical_text_round_trips() {
        for text in [
            "A",
            "Ctrl+Z",
            "Ctrl+Alt+Meta+Shift+F12",
            "Alt+Shift+Comma",
            "Meta+/",
            "Ctrl+F2,G,H",
            "C,S",
            "Shift+Up",
            "Shift+1",
            "Ctrl+Shift+A",
        ] {
            assert_eq!(seq(text).to_string(), text);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<KeySequence>(), Err(ShortcutError::Empty));
        assert_eq!("  ".parse::<KeySequence>(), Err(ShortcutError::Empty));
        assert!(matches!(
            "Ctrl+Z,".parse::<KeySequence>(),
            Err(ShortcutError::EmptyCombination(_))
        ));
        assert!(matches!(
            "Control+Z".parse::<KeySequence>(),
            Err(ShortcutError::UnknownModifier { .. })
        ));
        assert!(matches!(
            "Shift+Ctrl+Z".parse::<KeySequence>(),
            Err(ShortcutError::ModifierOrder(_))
        ));
        assert!(matches!(
            "Ctrl+Ctrl+Z".parse::<KeySequence>(),
            Err(ShortcutError::ModifierOrder(_))
        ));
        assert!(matches!(
            "Ctrl+z".parse::<KeySequence>(),
            Err(ShortcutError::UnknownKey { .. })
        ));
        assert!(matches!(
            "Ctrl+".parse::<KeySequence>(),
            Err(ShortcutError::MissingKey(_))
        ));
        assert!(matches!(
            "A,B,C,D,E".parse::<KeySequence>(),
            Err(ShortcutError::TooLong { count: 5, .. })
        ));
    }

    #[test]
    fn test_shift_on_bare_letter_is_rejected() {
        assert!(matches!(
            "Shift+A".parse::<KeySequence>(),
            Err(ShortcutError::RedundantShift(_))
        ));
        assert!(matches!(
            "G,Shift+H".parse::<KeySequence>(),
            Err(ShortcutError::RedundantShift(_))
        ));
        assert!("Ctrl+Shift+A".parse::<KeySequence>().is_ok());

        let built = KeySequence::single(Key::A, KeyboardModifiers::SHIFT);
        assert!(matches!(built.validate(), Err(ShortcutError::RedundantShift(_))));
        assert!(built.into_shortcut().is_err());
    }

    #[test]
    fn test_from_combinations() {
        assert_eq!(KeySequence::from_combinations(vec![]), Err(ShortcutError::Empty));
        let s = KeySequence::from_combinations(vec![
            KeyCombination::ctrl(Key::F2),
            KeyCombination::key_only(Key::G),
        ])
        .unwrap();
        assert_eq!(s, seq("Ctrl+F2,G"));
    }

    #[test]
    fn test_matches_partial() {
        let s = seq("Ctrl+K,Ctrl+C");
        let k = KeyCombination::ctrl(Key::K);
        let c = KeyCombination::ctrl(Key::C);
        assert_eq!(s.matches_partial(&[k]), SequenceMatch::PartialMatch);
        assert_eq!(s.matches_partial(&[k, c]), SequenceMatch::ExactMatch);
        assert_eq!(s.matches_partial(&[c]), SequenceMatch::NoMatch);
        assert_eq!(s.matches_partial(&[]), SequenceMatch::NoMatch);
        assert_eq!(s.matches_partial(&[k, c, c]), SequenceMatch::NoMatch);
    }

    #[test]
    fn test_ambiguity() {
        assert!(seq("Ctrl+F2,G,H").is_ambiguous_with(&seq("Ctrl+F2,G")));
        assert!(seq("Ctrl+F2,G").is_ambiguous_with(&seq("Ctrl+F2,G,H")));
        assert!(seq("Ctrl+F2").is_ambiguous_with(&seq("Ctrl+F2,G")));
        assert!(!seq("Ctrl+F2,G").is_ambiguous_with(&seq("Ctrl+F2,G")));
        assert!(!seq("Ctrl+F2,G").is_ambiguous_with(&seq("Ctrl+F2,H")));
    }

    #[test]
    fn test_display_standard_platform() {
        for text in ["Ctrl+Alt+Meta+Shift+F12", "Alt+X,Meta+Y", "C,S"] {
            let s = seq(text);
            let expected = s
                .combinations()
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            assert_eq!(s.display(Platform::Standard), expected);
        }
    }

    #[test]
    fn test_display_mac_platform() {
        assert_eq!(seq("Ctrl+Alt+Meta+Shift+F12").display(Platform::Mac), "Ctrl+Option+⌘+Shift+F12");
        assert_eq!(seq("Meta+Z,Alt+Comma").display(Platform::Mac), "⌘+Z, Option+Comma");
        assert_eq!(seq("Ctrl+/").display(Platform::Mac), "Ctrl+/");
    }

    #[test]
    fn test_serde_uses_canonical_text() {
        let s = seq("Ctrl+K, Ctrl+C");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"Ctrl+K,Ctrl+C\"");
        let back: KeySequence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
        assert!(serde_json::from_str::<KeySequence>("\"Shift+A\"").is_err());
    }
}
