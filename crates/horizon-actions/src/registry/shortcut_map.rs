//! Shortcut storage for one context.
//!
//! Sequences are indexed by their first combination so that a key press only
//! has to be compared against the few sequences that start with it. The map
//! enforces the two registration rules: a sequence has one owner, and no
//! registered sequence is a strict prefix of another.

use std::collections::HashMap;
use std::fmt;

use crate::error::ShortcutError;
use crate::shortcut::{KeyCombination, KeySequence, SequenceMatch};

/// What a shortcut activates: an action, or one choice of a choice group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct BindingTarget {
    pub action: String,
    pub choice: Option<String>,
}

impl BindingTarget {
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            choice: None,
        }
    }

    pub fn choice(action: impl Into<String>, choice: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            choice: Some(choice.into()),
        }
    }

    /// Parse the `action` / `action:choice` form used in preference maps.
    pub fn parse(text: &str) -> Self {
        match text.split_once(':') {
            Some((action, choice)) => Self::choice(action, choice),
            None => Self::action(text),
        }
    }
}

impl fmt::Display for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.choice {
            Some(choice) => write!(f, "{}:{}", self.action, choice),
            None => f.write_str(&self.action),
        }
    }
}

/// A registered shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Binding {
    pub target: BindingTarget,
    /// Primary shortcuts mirror the action's (or choice's) `shortcut` field;
    /// the rest are synonyms added with `add_shortcut`.
    pub primary: bool,
}

/// Result of looking up pressed combinations.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Lookup<'a> {
    Exact(&'a Binding),
    Prefix,
    Miss,
}

#[derive(Debug, Default)]
pub(crate) struct ShortcutMap {
    by_first: HashMap<KeyCombination, Vec<KeySequence>>,
    bindings: HashMap<KeySequence, Binding>,
    primaries: HashMap<BindingTarget, KeySequence>,
}

impl ShortcutMap {
    /// Check whether `sequence` could be registered.
    pub fn check(&self, sequence: &KeySequence) -> Result<(), ShortcutError> {
        let first = sequence.first().ok_or(ShortcutError::Empty)?;
        if let Some(binding) = self.bindings.get(sequence) {
            return Err(ShortcutError::InUse {
                shortcut: sequence.to_string(),
                owner: binding.target.to_string(),
            });
        }
        let conflict = self
            .by_first
            .get(first)
            .into_iter()
            .flatten()
            .find(|other| sequence.is_ambiguous_with(other));
        if let Some(other) = conflict {
            let owner = self
                .bindings
                .get(other)
                .map(|b| b.target.to_string())
                .unwrap_or_default();
            return Err(ShortcutError::AmbiguousPrefix {
                shortcut: sequence.to_string(),
                other: other.to_string(),
                owner,
            });
        }
        Ok(())
    }

    /// Register `sequence` for `target`.
    pub fn insert(
        &mut self,
        sequence: KeySequence,
        target: BindingTarget,
        primary: bool,
    ) -> Result<(), ShortcutError> {
        self.check(&sequence)?;
        let first = *sequence.first().ok_or(ShortcutError::Empty)?;
        if primary {
            self.primaries.insert(target.clone(), sequence.clone());
        }
        self.by_first.entry(first).or_default().push(sequence.clone());
        self.bindings.insert(sequence, Binding { target, primary });
        Ok(())
    }

    /// Unregister `sequence`, returning what it was bound to.
    pub fn remove(&mut self, sequence: &KeySequence) -> Option<Binding> {
        let binding = self.bindings.remove(sequence)?;
        if let Some(first) = sequence.first() {
            if let Some(list) = self.by_first.get_mut(first) {
                list.retain(|s| s != sequence);
                if list.is_empty() {
                    self.by_first.remove(first);
                }
            }
        }
        if binding.primary {
            self.primaries.remove(&binding.target);
        }
        Some(binding)
    }

    /// Unregister every shortcut of `action`, primary and synonym, including
    /// those of its choices.
    pub fn remove_action(&mut self, action: &str) -> Vec<KeySequence> {
        let owned: Vec<KeySequence> = self
            .bindings
            .iter()
            .filter(|(_, b)| b.target.action == action)
            .map(|(s, _)| s.clone())
            .collect();
        for sequence in &owned {
            self.remove(sequence);
        }
        owned
    }

    /// Unregister every shortcut bound to `target`.
    pub fn remove_target(&mut self, target: &BindingTarget) -> Vec<KeySequence> {
        let owned: Vec<KeySequence> = self
            .bindings
            .iter()
            .filter(|(_, b)| b.target == *target)
            .map(|(s, _)| s.clone())
            .collect();
        for sequence in &owned {
            self.remove(sequence);
        }
        owned
    }

    /// Distinct targets of `action` that have any binding.
    pub fn targets_of(&self, action: &str) -> Vec<BindingTarget> {
        let mut targets: Vec<BindingTarget> = Vec::new();
        for binding in self.bindings.values() {
            if binding.target.action == action && !targets.contains(&binding.target) {
                targets.push(binding.target.clone());
            }
        }
        targets
    }

    /// The primary shortcut currently registered for `target`.
    pub fn primary(&self, target: &BindingTarget) -> Option<&KeySequence> {
        self.primaries.get(target)
    }

    /// The binding registered for `sequence`.
    pub fn binding(&self, sequence: &KeySequence) -> Option<&Binding> {
        self.bindings.get(sequence)
    }

    /// Look up a run of pressed combinations.
    pub fn lookup(&self, pressed: &[KeyCombination]) -> Lookup<'_> {
        let Some(first) = pressed.first() else {
            return Lookup::Miss;
        };
        let mut prefix = false;
        for candidate in self.by_first.get(first).into_iter().flatten() {
            match candidate.matches_partial(pressed) {
                SequenceMatch::ExactMatch => {
                    if let Some(binding) = self.bindings.get(candidate) {
                        return Lookup::Exact(binding);
                    }
                }
                SequenceMatch::PartialMatch => prefix = true,
                SequenceMatch::NoMatch => {}
            }
        }
        if prefix { Lookup::Prefix } else { Lookup::Miss }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeySequence, &Binding)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn clear(&mut self) {
        self.by_first.clear();
        self.bindings.clear();
        self.primaries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;

    fn seq(text: &str) -> KeySequence {
        text.parse().unwrap()
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut map = ShortcutMap::default();
        map.insert(seq("Ctrl+Z"), BindingTarget::action("undo"), true).unwrap();
        let err = map
            .insert(seq("Ctrl+Z"), BindingTarget::action("revert"), true)
            .unwrap_err();
        assert_eq!(
            err,
            ShortcutError::InUse {
                shortcut: "Ctrl+Z".into(),
                owner: "undo".into()
            }
        );
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_prefix_rule_both_orders() {
        let mut map = ShortcutMap::default();
        map.insert(seq("Ctrl+F2,G,H"), BindingTarget::action("a"), true).unwrap();
        assert!(matches!(
            map.insert(seq("Ctrl+F2,G"), BindingTarget::action("b"), true),
            Err(ShortcutError::AmbiguousPrefix { .. })
        ));

        let mut map = ShortcutMap::default();
        map.insert(seq("Ctrl+F2,G"), BindingTarget::action("b"), true).unwrap();
        assert!(matches!(
            map.insert(seq("Ctrl+F2,G,H"), BindingTarget::action("a"), true),
            Err(ShortcutError::AmbiguousPrefix { .. })
        ));

        // Siblings that diverge are fine.
        map.insert(seq("Ctrl+F2,H"), BindingTarget::action("c"), true).unwrap();
    }

    #[test]
    fn test_lookup() {
        let mut map = ShortcutMap::default();
        map.insert(seq("C,S"), BindingTarget::action("create-shared"), true).unwrap();
        map.insert(seq("Ctrl+D"), BindingTarget::choice("view", "detail"), true).unwrap();

        let c = KeyCombination::key_only(Key::C);
        let s = KeyCombination::key_only(Key::S);
        let x = KeyCombination::key_only(Key::X);

        assert_eq!(map.lookup(&[c]), Lookup::Prefix);
        match map.lookup(&[c, s]) {
            Lookup::Exact(binding) => assert_eq!(binding.target, BindingTarget::action("create-shared")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(map.lookup(&[c, x]), Lookup::Miss);
        assert_eq!(map.lookup(&[]), Lookup::Miss);
        match map.lookup(&[KeyCombination::ctrl(Key::D)]) {
            Lookup::Exact(binding) => assert_eq!(binding.target.choice.as_deref(), Some("detail")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_remove_action_drops_synonyms_and_choices() {
        let mut map = ShortcutMap::default();
        map.insert(seq("Ctrl+D"), BindingTarget::choice("view", "detail"), true).unwrap();
        map.insert(seq("Ctrl+L"), BindingTarget::choice("view", "list"), true).unwrap();
        map.insert(seq("Alt+L"), BindingTarget::choice("view", "list"), false).unwrap();
        map.insert(seq("Ctrl+Z"), BindingTarget::action("undo"), true).unwrap();

        let removed = map.remove_action("view");
        assert_eq!(removed.len(), 3);
        assert_eq!(map.len(), 1);
        assert!(map.primary(&BindingTarget::choice("view", "list")).is_none());
        assert_eq!(map.lookup(&[KeyCombination::ctrl(Key::D)]), Lookup::Miss);
        assert!(map.check(&seq("Ctrl+D")).is_ok());
    }

    #[test]
    fn test_primary_tracking() {
        let mut map = ShortcutMap::default();
        let target = BindingTarget::action("redo");
        map.insert(seq("Ctrl+Y"), target.clone(), true).unwrap();
        map.insert(seq("Ctrl+Shift+Z"), target.clone(), false).unwrap();

        assert_eq!(map.primary(&target), Some(&seq("Ctrl+Y")));
        assert_eq!(map.targets_of("redo"), vec![target.clone()]);

        let synonym = map.remove(&seq("Ctrl+Shift+Z")).unwrap();
        assert!(!synonym.primary);
        assert_eq!(map.primary(&target), Some(&seq("Ctrl+Y")));

        map.remove(&seq("Ctrl+Y"));
        assert_eq!(map.primary(&target), None);
    }

    #[test]
    fn test_remove_target_takes_synonyms() {
        let mut map = ShortcutMap::default();
        let list = BindingTarget::choice("view", "list");
        let detail = BindingTarget::choice("view", "detail");
        map.insert(seq("Ctrl+L"), list.clone(), true).unwrap();
        map.insert(seq("Alt+L"), list.clone(), false).unwrap();
        map.insert(seq("Ctrl+D"), detail.clone(), true).unwrap();

        let mut removed = map.remove_target(&list);
        removed.sort_by_key(|s| s.to_string());
        assert_eq!(removed, vec![seq("Alt+L"), seq("Ctrl+L")]);
        assert!(map.primary(&list).is_none());
        assert!(map.binding(&seq("Alt+L")).is_none());
        assert_eq!(map.targets_of("view"), vec![detail]);
    }

    #[test]
    fn test_binding_target_text() {
        assert_eq!(BindingTarget::parse("view:list"), BindingTarget::choice("view", "list"));
        assert_eq!(BindingTarget::parse("undo"), BindingTarget::action("undo"));
        assert_eq!(BindingTarget::choice("view", "list").to_string(), "view:list");
    }
}
