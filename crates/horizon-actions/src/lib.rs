//! Horizon Actions: named commands and keyboard shortcuts.
//!
//! This crate keeps a registry of user commands ("actions") and the keyboard
//! shortcuts bound to them, and turns raw key presses into action invocations:
//!
//! - **Actions**: simple commands, boolean toggles, and choice groups, built
//!   with [`Action`] and registered in an [`ActionContext`]
//! - **Shortcuts**: structured [`KeySequence`] values of up to four
//!   [`KeyCombination`]s, parsed from and displayed as `Ctrl+K, Ctrl+C` text
//! - **Key interpretation**: [`KeyEventInterpreter`] decides whether a key
//!   press is a shortcut at all, leaving typing in text fields alone
//! - **Contexts**: [`ContextManager`] owns one context per UI region and routes
//!   each key press from the innermost region outward to the global context
//! - **Observation**: contexts report every add, remove, and update so bound
//!   buttons and menus stay in sync
//!
//! # Example
//!
//! ```
//! use horizon_actions::{
//!     Action, ContextManager, Environment, KeyDispatch, KeyEvent, Key, KeyboardModifiers, Platform,
//! };
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! let manager = ContextManager::new(Environment::new(Platform::Standard));
//! let wrap = Arc::new(AtomicBool::new(false));
//! let (get, set) = (wrap.clone(), wrap.clone());
//!
//! manager.global_context().add(
//!     Action::toggle(
//!         "word-wrap",
//!         move || get.load(Ordering::SeqCst),
//!         move |on| set.store(on, Ordering::SeqCst),
//!     )
//!     .with_label("Word Wrap")
//!     .with_shortcut("Alt+Z"),
//! );
//!
//! let mut event = KeyEvent::for_key(Key::Z, KeyboardModifiers::ALT);
//! let dispatch = manager.handle_key_event(&mut event);
//!
//! assert!(matches!(dispatch, KeyDispatch::Activated { .. }));
//! assert!(event.is_default_prevented());
//! assert!(wrap.load(Ordering::SeqCst));
//! ```

pub mod action;
pub mod config;
pub mod environment;
pub mod error;
pub mod event;
pub mod interpreter;
pub mod key;
pub mod manager;
pub mod registry;
pub mod shortcut;

pub use action::{Action, ActionKind, ActionValue, Choice, DisplayText};
pub use config::ActionsConfig;
pub use environment::{Environment, IdentityTranslator, LogNavigator, Navigator, Platform, ShortcutSupport, Translator};
pub use error::{ActionsError, ActionsResult, ConfigError, RegistrationError, ShortcutError};
pub use event::{ElementKind, FocusedElement, InputType, KeyEvent, KeyboardModifiers, ScopeId};
pub use interpreter::KeyEventInterpreter;
pub use key::Key;
pub use manager::{ContextManager, GLOBAL_CONTEXT_TYPE, global, init_global};
pub use registry::{ActionChange, ActionContext, ChangeOperation, KeyDispatch, SequenceProgress, ShortcutInfo};
pub use shortcut::{IntoShortcut, KeyCombination, KeySequence, MAX_KEY_SEQUENCE_LENGTH, SequenceMatch};

pub use horizon_actions_core::{ConnectionId, Signal};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        Action, ActionChange, ActionContext, ChangeOperation, Choice, ContextManager, Environment, Key,
        KeyDispatch, KeyEvent, KeySequence, KeyboardModifiers, Platform, ScopeId, ShortcutSupport,
    };
}
