//! Partial-sequence tracking.
//!
//! Each context remembers the combinations typed so far toward a multi-key
//! shortcut. Every recognized combination either completes a registered
//! sequence, extends a strict prefix of one, or abandons the attempt.

use crate::environment::ShortcutSupport;
use crate::shortcut::{KeyCombination, KeySequence};

use super::shortcut_map::{BindingTarget, Lookup, ShortcutMap};

/// Outcome of feeding one combination to a [`SequenceState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// A registered shortcut was completed.
    Resolved(BindingTarget),
    /// The keys so far are a strict prefix of a registered sequence.
    Pending(KeySequence),
    /// Nothing matched. Any partial sequence has been dropped.
    NoMatch,
}

#[derive(Debug, Default)]
pub(crate) struct SequenceState {
    partial: Vec<KeyCombination>,
}

impl SequenceState {
    /// Check whether a partial sequence is in progress.
    pub fn is_pending(&self) -> bool {
        !self.partial.is_empty()
    }

    /// Drop any partial sequence. Returns `true` if one was in progress.
    pub fn clear(&mut self) -> bool {
        let was_pending = self.is_pending();
        self.partial.clear();
        was_pending
    }

    /// Feed the next recognized combination.
    pub fn advance(
        &mut self,
        combination: KeyCombination,
        map: &ShortcutMap,
        support: ShortcutSupport,
    ) -> Resolution {
        match support {
            ShortcutSupport::Off => {
                self.clear();
                return Resolution::NoMatch;
            }
            ShortcutSupport::Single => {
                self.clear();
            }
            ShortcutSupport::Sequence => {}
        }

        let mut candidate = std::mem::take(&mut self.partial);
        candidate.push(combination);

        match map.lookup(&candidate) {
            Lookup::Exact(binding) => Resolution::Resolved(binding.target.clone()),
            Lookup::Prefix if support == ShortcutSupport::Sequence => {
                match KeySequence::from_combinations(candidate.clone()) {
                    Ok(progress) => {
                        self.partial = candidate;
                        Resolution::Pending(progress)
                    }
                    Err(_) => Resolution::NoMatch,
                }
            }
            Lookup::Prefix | Lookup::Miss => Resolution::NoMatch,
        }
    }
}
