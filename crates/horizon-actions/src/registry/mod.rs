//! The per-context action registry.
//!
//! An [`ActionContext`] owns a set of actions, the shortcuts bound to them, and
//! the observers that keep bound UI elements in sync. Contexts are normally
//! created by the [`ContextManager`](crate::ContextManager), which routes key
//! presses to them; they can also be used on their own.
//!
//! # Failure handling
//!
//! Registration problems (a duplicate name, an invalid or conflicting
//! shortcut) never abort registration of the rest: the offending action or
//! shortcut is dropped and a warning is logged. Calling an operation on a
//! missing action, or on an action of the wrong kind, logs an error and
//! returns a sentinel (`false` or `None`).
//!
//! # Re-entrancy
//!
//! No lock is held while observers, invoke behaviors, or get/set accessors
//! run. They may call back into the context.
//!
//! # Example
//!
//! ```
//! use horizon_actions::{Action, ActionContext, Environment, Platform, ScopeId};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let context = ActionContext::new("editor", ScopeId::new(1), Environment::new(Platform::Standard));
//! let saves = Arc::new(AtomicUsize::new(0));
//! let counter = saves.clone();
//!
//! assert!(context.add(
//!     Action::simple("save", move |_, _| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!         false
//!     })
//!     .with_shortcut("Ctrl+S"),
//! ));
//!
//! context.invoke("save", None, None);
//! assert_eq!(saves.load(Ordering::SeqCst), 1);
//! assert_eq!(context.shortcut_display("Ctrl+S").as_deref(), Some("Ctrl+S"));
//! ```

mod sequence;
mod shortcut_map;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use horizon_actions_core::logging::targets;
use horizon_actions_core::{ConnectionId, Signal};
use parking_lot::RwLock;
use serde::Serialize;

use crate::action::{self, Action, ActionKind, ActionValue};
use crate::environment::{Environment, ShortcutSupport};
use crate::error::{RegistrationError, ShortcutError};
use crate::event::{FocusedElement, KeyEvent, ScopeId};
use crate::interpreter::KeyEventInterpreter;
use crate::shortcut::{IntoShortcut, KeySequence};

use sequence::{Resolution, SequenceState};
use shortcut_map::{BindingTarget, ShortcutMap};

/// What happened to an action, as reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOperation {
    /// The action was added.
    Add,
    /// The action was removed.
    Remove,
    /// The action's state changed (label, enabled, hidden, value, shortcut).
    Update,
    /// A choice group's list of choices changed.
    UpdateChoices,
}

/// An observer notification: a snapshot of the action and what happened.
#[derive(Debug, Clone)]
pub struct ActionChange {
    pub action: Action,
    pub operation: ChangeOperation,
}

/// Progress of a multi-key shortcut, for showing "keys so far".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceProgress {
    /// These keys have been typed and more are expected.
    Pending(KeySequence),
    /// The partial sequence was completed or abandoned.
    Cleared,
}

/// One registered shortcut, as listed by [`ActionContext::list_shortcuts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortcutInfo {
    /// The shortcut.
    pub shortcut: KeySequence,
    /// Human-readable form for the current platform.
    pub display: String,
    /// The owning action.
    pub action: String,
    /// The selected choice, for choice-group shortcuts.
    pub choice: Option<String>,
    /// "Action Label" or "Action Label: Choice Label".
    pub label: String,
    /// Whether this is the action's (or choice's) primary shortcut.
    pub primary: bool,
}

/// Result of offering a key press to a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDispatch {
    /// The key is not a shortcut here.
    NotHandled,
    /// The key extended a partial sequence; more keys are expected.
    Pending(KeySequence),
    /// A shortcut completed and its action ran.
    Activated {
        action: String,
        choice: Option<String>,
        /// The action's behavior moved focus itself.
        focus_handled: bool,
    },
}

#[derive(Default)]
struct RegistryState {
    actions: HashMap<String, Action>,
    /// Action names in registration order.
    order: Vec<String>,
    shortcuts: ShortcutMap,
    sequence: SequenceState,
}

/// A registry of actions and shortcuts scoped to one part of the UI.
pub struct ActionContext {
    type_name: String,
    scope: ScopeId,
    env: Environment,
    interpreter: KeyEventInterpreter,
    state: RwLock<RegistryState>,
    observers: Signal<ActionChange>,
    sequence_progress: Signal<SequenceProgress>,
    /// Nesting depth of `disable_shortcuts` calls.
    disable_depth: AtomicUsize,
    attached: AtomicBool,
}

impl ActionContext {
    /// Create a context of the given type on the given scope.
    pub fn new(type_name: impl Into<String>, scope: ScopeId, env: Environment) -> Self {
        Self {
            type_name: type_name.into(),
            scope,
            interpreter: KeyEventInterpreter::new(env.platform()),
            env,
            state: RwLock::new(RegistryState::default()),
            observers: Signal::new(),
            sequence_progress: Signal::new(),
            disable_depth: AtomicUsize::new(0),
            attached: AtomicBool::new(true),
        }
    }

    /// The context type name, such as `"global"` or `"logViewer"`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The scope this context listens on.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The host environment.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Check whether the context still receives key presses. Contexts stop
    /// listening once removed from their manager.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Add an action. Returns `true` if the action and all of its shortcuts
    /// registered cleanly.
    ///
    /// A duplicate or invalid name rejects the action. An invalid or
    /// conflicting shortcut is dropped from the action, which is still added.
    pub fn add(&self, action: Action) -> bool {
        self.try_add(action).is_ok()
    }

    /// Add several actions. Returns `true` if every one registered cleanly.
    pub fn add_all(&self, actions: impl IntoIterator<Item = Action>) -> bool {
        actions
            .into_iter()
            .fold(true, |clean, action| self.add(action) && clean)
    }

    /// Add an action, returning every problem found. Each problem is also
    /// logged. Unless the name itself was rejected, the action is registered.
    pub fn try_add(&self, mut action: Action) -> Result<(), Vec<RegistrationError>> {
        let name = action.name().to_string();
        if !action::is_valid_name(&name) {
            let errors = vec![RegistrationError::InvalidName(name)];
            self.report(&errors);
            return Err(errors);
        }

        action.resolve_text(&self.env);
        let mut errors = Self::parse_errors(&mut action);

        let snapshot = {
            let mut state = self.state.write();
            if state.actions.contains_key(&name) {
                drop(state);
                let errors = vec![RegistrationError::DuplicateName(name)];
                self.report(&errors);
                return Err(errors);
            }
            errors.extend(Self::sync_shortcuts(&mut state.shortcuts, &mut action));
            state.order.push(name.clone());
            state.actions.insert(name, action.clone());
            action
        };

        self.report(&errors);
        tracing::debug!(target: targets::REGISTRY, context = %self.type_name, action = snapshot.name(), "action added");
        self.notify(snapshot, ChangeOperation::Add);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Remove an action and every shortcut it owns. Returns `false` if there
    /// was no such action.
    pub fn remove(&self, name: &str) -> bool {
        let (removed, cleared) = {
            let mut state = self.state.write();
            let removed = state.actions.remove(name);
            let mut cleared = false;
            if removed.is_some() {
                state.order.retain(|n| n != name);
                state.shortcuts.remove_action(name);
                cleared = state.sequence.clear();
            }
            (removed, cleared)
        };
        if cleared {
            self.sequence_progress.emit(SequenceProgress::Cleared);
        }
        match removed {
            Some(action) => {
                self.notify(action, ChangeOperation::Remove);
                true
            }
            None => false,
        }
    }

    /// Remove several actions by name.
    pub fn remove_all<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.remove(name.as_ref());
        }
    }

    /// Remove every action, notifying `Remove` for each.
    pub fn clear(&self) {
        let removed: Vec<Action> = {
            let mut state = self.state.write();
            let RegistryState {
                actions,
                order,
                shortcuts,
                sequence,
            } = &mut *state;
            shortcuts.clear();
            sequence.clear();
            order
                .drain(..)
                .filter_map(|name| actions.remove(&name))
                .collect()
        };
        for action in removed {
            self.notify(action, ChangeOperation::Remove);
        }
    }

    /// A snapshot of the named action.
    ///
    /// Changes to the returned value have no effect on the registry; use
    /// [`patch`](Self::patch) to change an action.
    pub fn lookup(&self, name: &str) -> Option<Action> {
        self.state.read().actions.get(name).cloned()
    }

    /// Read the named action without cloning it.
    pub fn with_action<R>(&self, name: &str, f: impl FnOnce(&Action) -> R) -> Option<R> {
        self.state.read().actions.get(name).map(f)
    }

    /// Check whether an action is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.state.read().actions.contains_key(name)
    }

    /// Names of all actions in registration order.
    pub fn action_names(&self) -> Vec<String> {
        self.state.read().order.clone()
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.state.read().actions.len()
    }

    /// Check whether the context has no actions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Change an action and publish the change in one step.
    ///
    /// The closure receives a copy of the action; when it returns, the copy
    /// replaces the registered action, shortcuts are revalidated, and
    /// observers receive `Update`. Returns `false` if the action is missing or
    /// a changed shortcut was rejected.
    pub fn patch(&self, name: &str, f: impl FnOnce(&mut Action)) -> bool {
        self.replace_with(name, f) && self.update(name)
    }

    /// Change an action without publishing the change.
    ///
    /// Callers must follow up with [`update`](Self::update) for bound UI and
    /// shortcuts to see the change.
    #[deprecated(note = "use `patch`, which revalidates shortcuts and notifies observers")]
    pub fn modify(&self, name: &str, f: impl FnOnce(&mut Action)) -> bool {
        self.replace_with(name, f)
    }

    /// Publish changes to an action: resolve new translation keys, re-register
    /// shortcuts that differ from what is bound, and notify `Update`.
    ///
    /// Returns `false` if the action is missing or a shortcut was rejected.
    pub fn update(&self, name: &str) -> bool {
        let result = {
            let mut state = self.state.write();
            let RegistryState {
                actions, shortcuts, ..
            } = &mut *state;
            actions.get_mut(name).map(|action| {
                action.resolve_text(&self.env);
                let mut errors = Self::parse_errors(action);
                errors.extend(Self::sync_shortcuts(shortcuts, action));
                (action.clone(), errors)
            })
        };
        let Some((snapshot, errors)) = result else {
            self.usage_error(RegistrationError::UnknownAction(name.to_string()), "update");
            return false;
        };

        self.report(&errors);
        self.notify(snapshot, ChangeOperation::Update);
        errors.is_empty()
    }

    /// Publish a structural change to a choice group's choices.
    ///
    /// Returns `false` if the action is missing or is not a choice group.
    pub fn update_choices(&self, name: &str) -> bool {
        let result = {
            let mut state = self.state.write();
            let RegistryState {
                actions, shortcuts, ..
            } = &mut *state;
            match actions.get_mut(name) {
                Some(action) if action.is_choice_group() => {
                    action.resolve_text(&self.env);
                    let mut errors = Self::parse_errors(action);
                    errors.extend(Self::sync_shortcuts(shortcuts, action));
                    Ok((action.clone(), errors))
                }
                Some(_) => Err(false),
                None => Err(true),
            }
        };
        let (snapshot, errors) = match result {
            Ok(found) => found,
            Err(missing) => {
                if missing {
                    self.usage_error(RegistrationError::UnknownAction(name.to_string()), "update_choices");
                } else {
                    tracing::error!(target: targets::REGISTRY, context = %self.type_name, action = name, "update_choices: action has no choices");
                }
                return false;
            }
        };

        self.report(&errors);
        self.notify(snapshot, ChangeOperation::UpdateChoices);
        true
    }

    /// Enable an action.
    pub fn enable(&self, name: &str) -> bool {
        self.change_flag(name, "enable", |a| {
            let changed = a.is_disabled();
            a.set_disabled(false);
            changed
        })
    }

    /// Disable an action.
    pub fn disable(&self, name: &str) -> bool {
        self.change_flag(name, "disable", |a| {
            let changed = !a.is_disabled();
            a.set_disabled(true);
            changed
        })
    }

    /// Hide an action.
    pub fn hide(&self, name: &str) -> bool {
        self.change_flag(name, "hide", |a| {
            let changed = !a.is_hidden();
            a.set_hidden(true);
            changed
        })
    }

    /// Show an action.
    pub fn show(&self, name: &str) -> bool {
        self.change_flag(name, "show", |a| {
            let changed = a.is_hidden();
            a.set_hidden(false);
            changed
        })
    }

    // -------------------------------------------------------------------------
    // Behavior
    // -------------------------------------------------------------------------

    /// Invoke a simple action.
    ///
    /// Returns the behavior's result (`true` if it moved focus itself), or
    /// `true` after following a link. Disabled or hidden actions do nothing
    /// and return `false`.
    pub fn invoke(&self, name: &str, event: Option<&KeyEvent>, focus: Option<&FocusedElement>) -> bool {
        let behavior = {
            let state = self.state.read();
            let Some(action) = state.actions.get(name) else {
                drop(state);
                self.usage_error(RegistrationError::UnknownAction(name.to_string()), "invoke");
                return false;
            };
            if !action.is_available() {
                return false;
            }
            match action.kind() {
                ActionKind::Simple { invoke, href } => (invoke.clone(), href.clone()),
                _ => {
                    drop(state);
                    self.wrong_kind(name, "invoke", "a simple action");
                    return false;
                }
            }
        };

        match behavior {
            (Some(invoke), _) => invoke(event, focus),
            (None, Some(href)) => {
                self.env.navigate(&href);
                true
            }
            (None, None) => {
                tracing::error!(target: targets::REGISTRY, context = %self.type_name, action = name, "invoke: action has neither behavior nor href");
                false
            }
        }
    }

    /// Flip a toggle action and publish the change.
    ///
    /// Disabled or hidden toggles are left alone. Returns `false` if the
    /// action is missing, is not a toggle, or is unavailable.
    pub fn toggle(&self, name: &str) -> bool {
        let accessors = {
            let state = self.state.read();
            let Some(action) = state.actions.get(name) else {
                drop(state);
                self.usage_error(RegistrationError::UnknownAction(name.to_string()), "toggle");
                return false;
            };
            match action.kind() {
                ActionKind::Toggle { get, set, .. } => {
                    if !action.is_available() {
                        return false;
                    }
                    (get.clone(), set.clone())
                }
                _ => {
                    drop(state);
                    self.wrong_kind(name, "toggle", "a toggle");
                    return false;
                }
            }
        };

        let (get, set) = accessors;
        set(!get());
        self.update(name);
        true
    }

    /// Read the value of a toggle or choice-group action.
    pub fn get(&self, name: &str) -> Option<ActionValue> {
        let kind = self.kind_of(name, "get")?;
        match kind {
            ActionKind::Toggle { get, .. } => Some(ActionValue::Bool(get())),
            ActionKind::ChoiceGroup { get, .. } => Some(ActionValue::Choice(get())),
            ActionKind::Simple { .. } => {
                self.wrong_kind(name, "get", "a toggle or choice group");
                None
            }
        }
    }

    /// Write the value of a toggle or choice-group action and publish the
    /// change. Toggles take the value as a boolean; choice groups take it
    /// as-is.
    pub fn set(&self, name: &str, value: impl Into<ActionValue>) -> bool {
        let Some(kind) = self.kind_of(name, "set") else {
            return false;
        };
        let value = value.into();
        match kind {
            ActionKind::Toggle { set, .. } => set(value.as_bool()),
            ActionKind::ChoiceGroup { set, .. } => set(value.as_choice().as_str()),
            ActionKind::Simple { .. } => {
                self.wrong_kind(name, "set", "a toggle or choice group");
                return false;
            }
        }
        self.update(name);
        true
    }

    /// Activate an action the way a click on a bound control does: invoke a
    /// simple action, flip a toggle, or select `choice` of a choice group.
    ///
    /// Panics in the action's behavior are caught and logged. Returns `true`
    /// if the behavior moved focus itself.
    pub fn activate(
        &self,
        name: &str,
        choice: Option<&str>,
        event: Option<&KeyEvent>,
        focus: Option<&FocusedElement>,
    ) -> bool {
        let target = BindingTarget {
            action: name.to_string(),
            choice: choice.map(str::to_string),
        };
        if !self.is_activatable(&target) {
            return false;
        }
        self.perform_guarded(&target, event, focus)
    }

    // -------------------------------------------------------------------------
    // Shortcuts
    // -------------------------------------------------------------------------

    /// Bind an additional (synonym) shortcut to an action or one of its
    /// choices.
    pub fn add_shortcut(&self, shortcut: impl IntoShortcut, action: &str, choice: Option<&str>) -> bool {
        let sequence = match shortcut.into_shortcut() {
            Ok(sequence) => sequence,
            Err(err) => {
                self.report(&[RegistrationError::InvalidShortcut {
                    owner: action.to_string(),
                    source: err,
                }]);
                return false;
            }
        };

        let result = {
            let mut state = self.state.write();
            let RegistryState {
                actions, shortcuts, ..
            } = &mut *state;
            match actions.get(action) {
                None => Err(RegistrationError::UnknownAction(action.to_string())),
                Some(found) => {
                    let target = match choice {
                        Some(value) if found.find_choice(value).is_none() => {
                            Err(RegistrationError::UnknownChoice {
                                action: action.to_string(),
                                choice: value.to_string(),
                            })
                        }
                        Some(value) => Ok(BindingTarget::choice(action, value)),
                        None if found.is_choice_group() => {
                            Err(RegistrationError::ShortcutOnChoiceGroup(action.to_string()))
                        }
                        None => Ok(BindingTarget::action(action)),
                    };
                    target.and_then(|target| {
                        let owner = target.to_string();
                        shortcuts
                            .insert(sequence, target, false)
                            .map_err(|source| RegistrationError::InvalidShortcut { owner, source })
                    })
                }
            }
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                self.report(&[err]);
                false
            }
        }
    }

    /// Remove a synonym shortcut. Primary shortcuts are refused; clear them
    /// by changing the action's shortcut with [`patch`](Self::patch).
    pub fn remove_shortcut(&self, shortcut: impl IntoShortcut) -> bool {
        let Ok(sequence) = shortcut.into_shortcut() else {
            return false;
        };
        let mut state = self.state.write();
        match state.shortcuts.binding(&sequence) {
            None => false,
            Some(binding) if binding.primary => {
                let owner = binding.target.to_string();
                drop(state);
                tracing::warn!(target: targets::SHORTCUT, context = %self.type_name, shortcut = %sequence, owner, "cannot remove a primary shortcut");
                false
            }
            Some(_) => {
                state.shortcuts.remove(&sequence);
                let cleared = state.sequence.clear();
                drop(state);
                if cleared {
                    self.sequence_progress.emit(SequenceProgress::Cleared);
                }
                true
            }
        }
    }

    /// Every registered shortcut, sorted by label and then shortcut.
    pub fn list_shortcuts(&self) -> Vec<ShortcutInfo> {
        let platform = self.env.platform();
        let state = self.state.read();
        let mut list: Vec<ShortcutInfo> = state
            .shortcuts
            .iter()
            .filter_map(|(sequence, binding)| {
                let action = state.actions.get(&binding.target.action)?;
                let label = match &binding.target.choice {
                    Some(value) => {
                        let choice_label = action
                            .find_choice(value)
                            .and_then(|c| c.label())
                            .filter(|l| !l.is_empty())
                            .unwrap_or(value.as_str());
                        format!("{}: {}", action.display_label(), choice_label)
                    }
                    None => action.display_label().to_string(),
                };
                Some(ShortcutInfo {
                    shortcut: sequence.clone(),
                    display: sequence.display(platform),
                    action: binding.target.action.clone(),
                    choice: binding.target.choice.clone(),
                    label,
                    primary: binding.primary,
                })
            })
            .collect();
        list.sort_by(|a, b| {
            a.label
                .cmp(&b.label)
                .then_with(|| a.shortcut.to_string().cmp(&b.shortcut.to_string()))
        });
        list
    }

    /// Render a shortcut for people on this context's platform. Returns
    /// `None` if the shortcut is not valid.
    pub fn shortcut_display(&self, shortcut: impl IntoShortcut) -> Option<String> {
        shortcut
            .into_shortcut()
            .ok()
            .map(|sequence| sequence.display(self.env.platform()))
    }

    /// Check a shortcut's syntax and, optionally, whether it is free.
    pub fn is_valid_shortcut(&self, shortcut: impl IntoShortcut, check_if_used: bool) -> bool {
        self.check_shortcut(shortcut, check_if_used).is_ok()
    }

    /// Validate a shortcut, returning the parsed value or the reason it is
    /// unusable. With `check_if_used`, a shortcut that is taken or that is
    /// ambiguous with a registered one is rejected too.
    pub fn check_shortcut(
        &self,
        shortcut: impl IntoShortcut,
        check_if_used: bool,
    ) -> Result<KeySequence, ShortcutError> {
        let sequence = shortcut.into_shortcut()?;
        if check_if_used {
            self.state.read().shortcuts.check(&sequence)?;
        }
        Ok(sequence)
    }

    /// Suspend shortcut recognition. Calls nest; each must be balanced by
    /// [`enable_shortcuts`](Self::enable_shortcuts).
    pub fn disable_shortcuts(&self) {
        self.disable_depth.fetch_add(1, Ordering::SeqCst);
        self.cancel_sequence();
    }

    /// Undo one [`disable_shortcuts`](Self::disable_shortcuts).
    pub fn enable_shortcuts(&self) {
        let result = self
            .disable_depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| depth.checked_sub(1));
        if result.is_err() {
            tracing::warn!(target: targets::REGISTRY, context = %self.type_name, "enable_shortcuts called without a matching disable_shortcuts");
        }
    }

    /// Check whether shortcuts are currently recognized.
    pub fn shortcuts_enabled(&self) -> bool {
        self.disable_depth.load(Ordering::SeqCst) == 0
    }

    /// Primary shortcuts of every action and choice, keyed `action` or
    /// `action:choice`, in canonical text form.
    pub fn export_shortcuts(&self) -> BTreeMap<String, String> {
        let state = self.state.read();
        let mut exported = BTreeMap::new();
        for action in state.order.iter().filter_map(|name| state.actions.get(name)) {
            if let Some(shortcut) = action.shortcut() {
                exported.insert(action.name().to_string(), shortcut.to_string());
            }
            for choice in action.choices() {
                if let Some(shortcut) = choice.shortcut() {
                    let key = BindingTarget::choice(action.name(), choice.value()).to_string();
                    exported.insert(key, shortcut.to_string());
                }
            }
        }
        exported
    }

    /// Reassign primary shortcuts from a map in the form produced by
    /// [`export_shortcuts`](Self::export_shortcuts). An empty value clears
    /// the shortcut.
    ///
    /// Every listed shortcut is released before any is assigned, so two
    /// actions can trade shortcuts. Returns `false` if any entry failed.
    pub fn apply_shortcut_overrides(&self, overrides: &BTreeMap<String, String>) -> bool {
        let mut clean = true;
        let mut assignments = Vec::with_capacity(overrides.len());
        for (key, text) in overrides {
            let target = BindingTarget::parse(key);
            let shortcut = if text.trim().is_empty() {
                None
            } else {
                match text.parse::<KeySequence>() {
                    Ok(sequence) => Some(sequence),
                    Err(source) => {
                        self.report(&[RegistrationError::InvalidShortcut {
                            owner: target.to_string(),
                            source,
                        }]);
                        clean = false;
                        continue;
                    }
                }
            };
            let known = {
                let state = self.state.read();
                match (state.actions.get(&target.action), &target.choice) {
                    (None, _) => Err(RegistrationError::UnknownAction(target.action.clone())),
                    (Some(action), Some(value)) if action.find_choice(value).is_none() => {
                        Err(RegistrationError::UnknownChoice {
                            action: target.action.clone(),
                            choice: value.clone(),
                        })
                    }
                    _ => Ok(()),
                }
            };
            if let Err(err) = known {
                self.report(&[err]);
                clean = false;
                continue;
            }
            assignments.push((target, shortcut));
        }

        {
            let mut state = self.state.write();
            let RegistryState {
                actions, shortcuts, ..
            } = &mut *state;
            for (target, _) in &assignments {
                if let Some(current) = shortcuts.primary(target).cloned() {
                    shortcuts.remove(&current);
                }
                if let Some(action) = actions.get_mut(&target.action) {
                    Self::clear_field(action, target);
                }
            }
        }

        for (target, shortcut) in assignments {
            let applied = self.patch(&target.action, |action| match &target.choice {
                Some(value) => {
                    if let Some(choice) = action.choice_mut(value) {
                        choice.set_shortcut(shortcut);
                    }
                }
                None => action.set_shortcut(shortcut),
            });
            clean &= applied;
        }
        clean
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    /// Register an observer for `Add`, `Remove`, `Update`, and
    /// `UpdateChoices`. Observers run in registration order; a panicking
    /// observer is logged and does not stop the others.
    pub fn observe<F>(&self, observer: F) -> ConnectionId
    where
        F: Fn(&ActionChange) + Send + Sync + 'static,
    {
        self.observers.connect(observer)
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unobserve(&self, id: ConnectionId) -> bool {
        self.observers.disconnect(id)
    }

    /// Signal reporting multi-key shortcut progress.
    pub fn sequence_progress(&self) -> &Signal<SequenceProgress> {
        &self.sequence_progress
    }

    // -------------------------------------------------------------------------
    // Key handling
    // -------------------------------------------------------------------------

    /// Offer a key press to this context.
    ///
    /// Recognized shortcuts run their action and suppress the key's default
    /// handling, as do keys that extend a partial sequence.
    #[tracing::instrument(skip_all, target = "horizon_actions::dispatch", level = "trace", fields(context = %self.type_name))]
    pub fn handle_key_event(&self, event: &mut KeyEvent) -> KeyDispatch {
        let support = self.env.shortcut_support();
        if !self.is_attached() || support == ShortcutSupport::Off || !self.shortcuts_enabled() {
            self.cancel_sequence();
            return KeyDispatch::NotHandled;
        }
        if event.is_modifier_key() {
            return KeyDispatch::NotHandled;
        }
        let Some(combination) = self.interpreter.interpret(event, support) else {
            self.cancel_sequence();
            return KeyDispatch::NotHandled;
        };

        let (was_pending, resolution) = {
            let mut state = self.state.write();
            let RegistryState {
                shortcuts, sequence, ..
            } = &mut *state;
            let was_pending = sequence.is_pending();
            (was_pending, sequence.advance(combination, shortcuts, support))
        };
        tracing::trace!(target: targets::DISPATCH, %combination, ?resolution, "key resolved");

        match resolution {
            Resolution::Pending(progress) => {
                event.prevent_default();
                self.sequence_progress
                    .emit(SequenceProgress::Pending(progress.clone()));
                KeyDispatch::Pending(progress)
            }
            Resolution::NoMatch => {
                if was_pending {
                    self.sequence_progress.emit(SequenceProgress::Cleared);
                }
                KeyDispatch::NotHandled
            }
            Resolution::Resolved(target) => {
                if was_pending {
                    self.sequence_progress.emit(SequenceProgress::Cleared);
                }
                if !self.is_activatable(&target) {
                    return KeyDispatch::NotHandled;
                }
                event.prevent_default();
                let event: &KeyEvent = event;
                let focus_handled = self.perform_guarded(&target, Some(event), Some(&event.target));
                KeyDispatch::Activated {
                    action: target.action,
                    choice: target.choice,
                    focus_handled,
                }
            }
        }
    }

    /// Drop any partial sequence. Returns `true` if one was in progress.
    pub fn cancel_sequence(&self) -> bool {
        let cleared = self.state.write().sequence.clear();
        if cleared {
            self.sequence_progress.emit(SequenceProgress::Cleared);
        }
        cleared
    }

    /// Stop listening and discard all state without notifying observers.
    pub(crate) fn teardown(&self) {
        self.attached.store(false, Ordering::SeqCst);
        {
            let mut state = self.state.write();
            *state = RegistryState::default();
        }
        self.observers.disconnect_all();
        self.sequence_progress.disconnect_all();
        tracing::debug!(target: targets::REGISTRY, context = %self.type_name, scope = self.scope.raw(), "context torn down");
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Make the registered primaries of `action` match its shortcut fields.
    ///
    /// Shortcuts that cannot be registered are cleared from the action.
    fn sync_shortcuts(shortcuts: &mut ShortcutMap, action: &mut Action) -> Vec<RegistrationError> {
        let name = action.name().to_string();
        let mut errors = Vec::new();

        if action.is_choice_group() && action.shortcut().is_some() {
            errors.push(RegistrationError::ShortcutOnChoiceGroup(name.clone()));
            action.set_shortcut(None);
        }

        if let Some(choices) = action.choices_mut() {
            let mut seen = HashSet::new();
            choices.retain(|choice| {
                if seen.insert(choice.value().to_string()) {
                    return true;
                }
                errors.push(RegistrationError::DuplicateChoice {
                    action: name.clone(),
                    choice: choice.value().to_string(),
                });
                false
            });
        }

        let mut desired = vec![(BindingTarget::action(&name), action.shortcut().cloned())];
        desired.extend(action.choices().iter().map(|choice| {
            (
                BindingTarget::choice(&name, choice.value()),
                choice.shortcut().cloned(),
            )
        }));

        // Every binding, synonyms included, of choices that no longer exist.
        for target in shortcuts.targets_of(&name) {
            if !desired.iter().any(|(t, _)| *t == target) {
                shortcuts.remove_target(&target);
            }
        }

        for (target, wanted) in desired {
            let current = shortcuts.primary(&target).cloned();
            if current == wanted {
                continue;
            }
            if let Some(old) = current {
                shortcuts.remove(&old);
            }
            let Some(sequence) = wanted else {
                continue;
            };
            // Promote a synonym of the same target instead of rejecting it.
            if shortcuts
                .binding(&sequence)
                .is_some_and(|b| b.target == target && !b.primary)
            {
                shortcuts.remove(&sequence);
            }
            if let Err(source) = shortcuts.insert(sequence, target.clone(), true) {
                Self::clear_field(action, &target);
                errors.push(RegistrationError::InvalidShortcut {
                    owner: target.to_string(),
                    source,
                });
            }
        }
        errors
    }

    fn clear_field(action: &mut Action, target: &BindingTarget) {
        match &target.choice {
            Some(value) => {
                if let Some(choice) = action.choice_mut(value) {
                    choice.set_shortcut(None);
                }
            }
            None => action.set_shortcut(None),
        }
    }

    fn parse_errors(action: &mut Action) -> Vec<RegistrationError> {
        let name = action.name().to_string();
        action
            .take_shortcut_errors()
            .into_iter()
            .map(|(choice, source)| RegistrationError::InvalidShortcut {
                owner: match choice {
                    Some(value) => BindingTarget::choice(&name, value).to_string(),
                    None => name.clone(),
                },
                source,
            })
            .collect()
    }

    fn replace_with(&self, name: &str, f: impl FnOnce(&mut Action)) -> bool {
        let Some(mut action) = self.lookup(name) else {
            self.usage_error(RegistrationError::UnknownAction(name.to_string()), "patch");
            return false;
        };
        f(&mut action);
        match self.state.write().actions.get_mut(name) {
            Some(slot) => {
                *slot = action;
                true
            }
            None => false,
        }
    }

    fn change_flag(&self, name: &str, operation: &str, apply: impl FnOnce(&mut Action) -> bool) -> bool {
        let snapshot = {
            let mut state = self.state.write();
            match state.actions.get_mut(name) {
                Some(action) => apply(action).then(|| action.clone()),
                None => {
                    drop(state);
                    self.usage_error(RegistrationError::UnknownAction(name.to_string()), operation);
                    return false;
                }
            }
        };
        match snapshot {
            Some(action) => {
                self.notify(action, ChangeOperation::Update);
                true
            }
            None => false,
        }
    }

    fn kind_of(&self, name: &str, operation: &str) -> Option<ActionKind> {
        let kind = self.with_action(name, |a| a.kind().clone());
        if kind.is_none() {
            self.usage_error(RegistrationError::UnknownAction(name.to_string()), operation);
        }
        kind
    }

    fn is_activatable(&self, target: &BindingTarget) -> bool {
        let available = self
            .with_action(&target.action, |action| {
                action.is_available()
                    && match &target.choice {
                        Some(value) => action.find_choice(value).is_some_and(|c| !c.is_disabled()),
                        None => true,
                    }
            })
            .unwrap_or(false);
        if !available {
            tracing::debug!(target: targets::DISPATCH, context = %self.type_name, target = %target, "shortcut target is unavailable");
        }
        available
    }

    /// Run the behavior for `target` inside a panic boundary.
    fn perform_guarded(
        &self,
        target: &BindingTarget,
        event: Option<&KeyEvent>,
        focus: Option<&FocusedElement>,
    ) -> bool {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &target.choice {
            Some(value) => {
                self.set(&target.action, value.as_str());
                false
            }
            None => {
                if self.with_action(&target.action, Action::is_toggle).unwrap_or(false) {
                    self.toggle(&target.action);
                    false
                } else {
                    self.invoke(&target.action, event, focus)
                }
            }
        }));
        outcome.unwrap_or_else(|_| {
            tracing::error!(target: targets::DISPATCH, context = %self.type_name, action = %target, "action behavior panicked");
            false
        })
    }

    fn notify(&self, action: Action, operation: ChangeOperation) {
        tracing::trace!(target: targets::REGISTRY, context = %self.type_name, action = action.name(), ?operation, "notifying observers");
        self.observers.emit(ActionChange { action, operation });
    }

    fn report(&self, errors: &[RegistrationError]) {
        for err in errors {
            tracing::warn!(target: targets::REGISTRY, context = %self.type_name, "{err}");
        }
    }

    fn usage_error(&self, err: RegistrationError, operation: &str) {
        tracing::error!(target: targets::REGISTRY, context = %self.type_name, operation, "{err}");
    }

    fn wrong_kind(&self, name: &str, operation: &str, expected: &str) {
        tracing::error!(target: targets::REGISTRY, context = %self.type_name, action = name, operation, "action is not {expected}");
    }
}

impl std::fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("type_name", &self.type_name)
            .field("scope", &self.scope)
            .field("actions", &self.len())
            .field("shortcuts", &self.state.read().shortcuts.len())
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(ActionContext: Send, Sync);
