//! The context manager.
//!
//! A [`ContextManager`] owns every [`ActionContext`] in the application and
//! routes key presses to them. One context, of type `"global"` on
//! [`ScopeId::ROOT`], always exists; the rest are created and removed as the
//! UI regions they serve come and go.
//!
//! Key presses travel from the innermost scope enclosing the focused element
//! outward, ending at the global context. The first context that recognizes
//! the key handles it.

use std::sync::Arc;

use horizon_actions_core::logging::targets;
use parking_lot::{Mutex, RwLock};

use crate::config::ActionsConfig;
use crate::environment::{Environment, ShortcutSupport};
use crate::error::{ActionsError, ActionsResult};
use crate::event::{KeyEvent, ScopeId};
use crate::registry::{ActionContext, KeyDispatch};

/// Type name of the context that is always present.
pub const GLOBAL_CONTEXT_TYPE: &str = "global";

/// Owns the set of live action contexts.
pub struct ContextManager {
    env: Environment,
    global: Arc<ActionContext>,
    /// Non-global contexts, in creation order.
    contexts: RwLock<Vec<Arc<ActionContext>>>,
}

impl ContextManager {
    /// Create a manager and its global context.
    pub fn new(env: Environment) -> Self {
        let global = Arc::new(ActionContext::new(GLOBAL_CONTEXT_TYPE, ScopeId::ROOT, env.clone()));
        tracing::debug!(target: targets::MANAGER, platform = ?env.platform(), "context manager created");
        Self {
            env,
            global,
            contexts: RwLock::new(Vec::new()),
        }
    }

    /// The environment shared by every context.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// The global context.
    pub fn global_context(&self) -> Arc<ActionContext> {
        self.global.clone()
    }

    /// Create a context of `type_name` on `scope`.
    ///
    /// An existing context for the same type and scope is torn down first, so
    /// the returned context always starts empty. Asking for the global
    /// context returns it unchanged.
    pub fn create_context(&self, type_name: &str, scope: ScopeId) -> Arc<ActionContext> {
        if Self::is_global(type_name, scope) {
            tracing::warn!(target: targets::MANAGER, "the global context cannot be re-created");
            return self.global.clone();
        }

        let context = Arc::new(ActionContext::new(type_name, scope, self.env.clone()));
        let replaced = {
            let mut contexts = self.contexts.write();
            let position = contexts
                .iter()
                .position(|c| c.type_name() == type_name && c.scope() == scope);
            match position {
                Some(index) => Some(std::mem::replace(&mut contexts[index], context.clone())),
                None => {
                    contexts.push(context.clone());
                    None
                }
            }
        };
        if let Some(old) = replaced {
            old.teardown();
        }
        tracing::debug!(target: targets::MANAGER, type_name, scope = scope.raw(), "context created");
        context
    }

    /// Remove the context of `type_name` on `scope`. Returns `false` if there
    /// is none, or if asked to remove the global context.
    pub fn remove_context(&self, type_name: &str, scope: ScopeId) -> bool {
        if Self::is_global(type_name, scope) {
            tracing::warn!(target: targets::MANAGER, "the global context cannot be removed");
            return false;
        }

        let removed = {
            let mut contexts = self.contexts.write();
            contexts
                .iter()
                .position(|c| c.type_name() == type_name && c.scope() == scope)
                .map(|index| contexts.remove(index))
        };
        match removed {
            Some(context) => {
                context.teardown();
                tracing::debug!(target: targets::MANAGER, type_name, scope = scope.raw(), "context removed");
                true
            }
            None => false,
        }
    }

    /// Find the context on `scope`, optionally restricted to one type.
    pub fn find_context(&self, type_name: Option<&str>, scope: ScopeId) -> Option<Arc<ActionContext>> {
        if scope.is_root() && type_name.is_none_or(|t| t == GLOBAL_CONTEXT_TYPE) {
            return Some(self.global.clone());
        }
        self.contexts
            .read()
            .iter()
            .find(|c| c.scope() == scope && type_name.is_none_or(|t| c.type_name() == t))
            .cloned()
    }

    /// Distinct context type names, global first, then in creation order.
    pub fn get_context_types(&self) -> Vec<String> {
        let mut types = vec![GLOBAL_CONTEXT_TYPE.to_string()];
        for context in self.contexts.read().iter() {
            if !types.iter().any(|t| t == context.type_name()) {
                types.push(context.type_name().to_string());
            }
        }
        types
    }

    /// Every live context of `type_name`.
    pub fn get_contexts_for_type(&self, type_name: &str) -> Vec<Arc<ActionContext>> {
        let mut found: Vec<Arc<ActionContext>> = self
            .contexts
            .read()
            .iter()
            .filter(|c| c.type_name() == type_name)
            .cloned()
            .collect();
        if type_name == GLOBAL_CONTEXT_TYPE {
            found.insert(0, self.global.clone());
        }
        found
    }

    /// Route a key press to the contexts enclosing the focused element.
    ///
    /// Contexts are tried innermost first and the global context last. The
    /// first one to recognize the key (as a shortcut or the start of one)
    /// wins; every other context on the chain drops its partial sequence.
    #[tracing::instrument(skip_all, target = "horizon_actions::manager", level = "trace", fields(key_code = event.key_code))]
    pub fn handle_key_event(&self, event: &mut KeyEvent) -> KeyDispatch {
        let chain = self.scope_chain(&event.target.scopes);
        let mut result = KeyDispatch::NotHandled;
        let mut winner = None;

        for (index, context) in chain.iter().enumerate() {
            result = context.handle_key_event(event);
            if result != KeyDispatch::NotHandled {
                winner = Some(index);
                break;
            }
        }
        if !event.is_modifier_key() {
            for (index, context) in chain.iter().enumerate() {
                if Some(index) != winner {
                    context.cancel_sequence();
                }
            }
        }
        result
    }

    /// The current shortcut recognition mode.
    pub fn shortcut_support(&self) -> ShortcutSupport {
        self.env.shortcut_support()
    }

    /// Change the shortcut recognition mode for every context.
    pub fn set_shortcut_support(&self, support: ShortcutSupport) {
        if self.env.set_shortcut_support(support) {
            tracing::debug!(target: targets::MANAGER, ?support, "shortcut support changed");
            if support != ShortcutSupport::Sequence {
                for context in self.all_contexts() {
                    context.cancel_sequence();
                }
            }
        }
    }

    /// Apply a configuration: the recognition mode, then the shortcut
    /// overrides on the global context. Returns `false` if any override was
    /// rejected.
    pub fn apply_config(&self, config: &ActionsConfig) -> bool {
        self.set_shortcut_support(config.shortcut_support);
        if config.shortcuts.is_empty() {
            return true;
        }
        self.global.apply_shortcut_overrides(&config.shortcuts)
    }

    fn is_global(type_name: &str, scope: ScopeId) -> bool {
        type_name == GLOBAL_CONTEXT_TYPE && scope.is_root()
    }

    /// Contexts for `scopes` (innermost first) followed by the global context.
    fn scope_chain(&self, scopes: &[ScopeId]) -> Vec<Arc<ActionContext>> {
        let contexts = self.contexts.read();
        let mut chain: Vec<Arc<ActionContext>> = scopes
            .iter()
            .filter(|scope| !scope.is_root())
            .flat_map(|scope| contexts.iter().filter(move |c| c.scope() == *scope))
            .cloned()
            .collect();
        chain.push(self.global.clone());
        chain
    }

    fn all_contexts(&self) -> Vec<Arc<ActionContext>> {
        let mut all = vec![self.global.clone()];
        all.extend(self.contexts.read().iter().cloned());
        all
    }
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("env", &self.env)
            .field("contexts", &(self.contexts.read().len() + 1))
            .finish()
    }
}

static_assertions::assert_impl_all!(ContextManager: Send, Sync);

// =============================================================================
// Process-wide manager
// =============================================================================

static GLOBAL_MANAGER: Mutex<Option<Arc<ContextManager>>> = Mutex::new(None);

/// Create the process-wide context manager.
///
/// Call once from the application's startup code. A second call fails with
/// [`ActionsError::AlreadyInitialized`].
pub fn init_global(env: Environment) -> ActionsResult<Arc<ContextManager>> {
    let mut guard = GLOBAL_MANAGER.lock();
    if guard.is_some() {
        return Err(ActionsError::AlreadyInitialized);
    }
    let manager = Arc::new(ContextManager::new(env));
    *guard = Some(manager.clone());
    Ok(manager)
}

/// The process-wide context manager.
///
/// Returns [`ActionsError::NotInitialized`] before [`init_global`].
pub fn global() -> ActionsResult<Arc<ContextManager>> {
    GLOBAL_MANAGER
        .lock()
        .clone()
        .ok_or(ActionsError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::action::Action;
    use crate::environment::Platform;
    use crate::event::{ElementKind, FocusedElement, KeyboardModifiers};
    use crate::key::Key;

    fn manager() -> ContextManager {
        ContextManager::new(Environment::new(Platform::Standard))
    }

    fn counting(name: &str, counter: &Arc<AtomicUsize>) -> Action {
        let counter = counter.clone();
        Action::simple(name, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        })
    }

    fn key_in(key: Key, modifiers: KeyboardModifiers, scopes: &[ScopeId]) -> KeyEvent {
        KeyEvent::for_key(key, modifiers)
            .with_target(FocusedElement::new(ElementKind::Other).with_scopes(scopes.iter().copied()))
    }

    #[test]
    fn test_global_context_exists() {
        let manager = manager();
        let global = manager.global_context();
        assert_eq!(global.type_name(), "global");
        assert!(global.scope().is_root());
        assert_eq!(manager.get_context_types(), vec!["global".to_string()]);
    }

    #[test]
    fn test_global_context_is_permanent() {
        let manager = manager();
        let global = manager.global_context();
        global.add(Action::link("a", "/"));

        assert!(!manager.remove_context("global", ScopeId::ROOT));
        let again = manager.create_context("global", ScopeId::ROOT);
        assert!(Arc::ptr_eq(&global, &again));
        assert!(again.contains("a"));
    }

    #[test]
    fn test_recreate_context_starts_empty() {
        let manager = manager();
        let scope = ScopeId::new(7);
        let first = manager.create_context("logger", scope);
        first.add(Action::link("a", "/"));

        let second = manager.create_context("logger", scope);
        assert!(second.is_empty());
        assert!(!first.is_attached());
        assert_eq!(manager.get_contexts_for_type("logger").len(), 1);
    }

    #[test]
    fn test_find_and_remove() {
        let manager = manager();
        let (a, b) = (ScopeId::new(1), ScopeId::new(2));
        manager.create_context("grid", a);
        manager.create_context("grid", b);
        manager.create_context("tree", b);

        assert_eq!(manager.get_context_types(), vec!["global", "grid", "tree"]);
        assert_eq!(manager.get_contexts_for_type("grid").len(), 2);
        assert_eq!(
            manager.find_context(Some("tree"), b).map(|c| c.type_name().to_string()),
            Some("tree".to_string())
        );
        assert!(manager.find_context(None, a).is_some());
        assert!(manager.find_context(Some("tree"), a).is_none());
        assert!(manager.find_context(None, ScopeId::ROOT).is_some());

        assert!(manager.remove_context("grid", a));
        assert!(!manager.remove_context("grid", a));
        assert!(manager.find_context(Some("grid"), a).is_none());
    }

    #[test]
    fn test_innermost_context_wins() {
        let manager = manager();
        let (outer_scope, inner_scope) = (ScopeId::new(1), ScopeId::new(2));
        let (global_count, outer_count, inner_count) = (
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
        );
        manager
            .global_context()
            .add(counting("g", &global_count).with_shortcut("Ctrl+E"));
        manager
            .create_context("outer", outer_scope)
            .add(counting("o", &outer_count).with_shortcut("Ctrl+E"));
        manager
            .create_context("inner", inner_scope)
            .add(counting("i", &inner_count).with_shortcut("Ctrl+E"));

        let mut event = key_in(Key::E, KeyboardModifiers::CTRL, &[inner_scope, outer_scope]);
        assert!(matches!(
            manager.handle_key_event(&mut event),
            KeyDispatch::Activated { ref action, .. } if action == "i"
        ));

        // Focus outside the inner region falls through to the outer one.
        let mut event = key_in(Key::E, KeyboardModifiers::CTRL, &[outer_scope]);
        manager.handle_key_event(&mut event);

        // And with no enclosing regions, to the global context.
        let mut event = key_in(Key::E, KeyboardModifiers::CTRL, &[]);
        manager.handle_key_event(&mut event);

        assert_eq!(inner_count.load(Ordering::SeqCst), 1);
        assert_eq!(outer_count.load(Ordering::SeqCst), 1);
        assert_eq!(global_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unhandled_key_falls_through_to_global() {
        let manager = manager();
        let scope = ScopeId::new(3);
        let count = Arc::new(AtomicUsize::new(0));
        manager.create_context("panel", scope);
        manager
            .global_context()
            .add(counting("help", &count).with_shortcut("F1"));

        let mut event = key_in(Key::F1, KeyboardModifiers::NONE, &[scope]);
        manager.handle_key_event(&mut event);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(event.is_default_prevented());
    }

    #[test]
    fn test_support_off_disables_everything() {
        let manager = manager();
        let count = Arc::new(AtomicUsize::new(0));
        manager
            .global_context()
            .add(counting("a", &count).with_shortcut("Ctrl+A"));

        manager.set_shortcut_support(ShortcutSupport::Off);
        assert_eq!(manager.shortcut_support(), ShortcutSupport::Off);
        let mut event = key_in(Key::A, KeyboardModifiers::CTRL, &[]);
        assert_eq!(manager.handle_key_event(&mut event), KeyDispatch::NotHandled);

        manager.set_shortcut_support(ShortcutSupport::Sequence);
        let mut event = key_in(Key::A, KeyboardModifiers::CTRL, &[]);
        manager.handle_key_event(&mut event);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_apply_config() {
        let manager = manager();
        let count = Arc::new(AtomicUsize::new(0));
        manager
            .global_context()
            .add(counting("undo", &count).with_shortcut("Ctrl+Z"));

        let config = ActionsConfig::from_toml_str(
            "shortcut_support = \"single\"\n[shortcuts]\nundo = \"Ctrl+Alt+Z\"\n",
        )
        .unwrap();
        assert!(manager.apply_config(&config));
        assert_eq!(manager.shortcut_support(), ShortcutSupport::Single);

        let mut event = key_in(Key::Z, KeyboardModifiers::CTRL_ALT, &[]);
        manager.handle_key_event(&mut event);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
