//! Error types for Horizon Actions.
//!
//! Most registry operations follow a log-and-continue contract: they return a
//! `bool` or `Option` sentinel and log one of these errors. The typed values
//! are still available to callers that want them, through
//! [`ActionContext::try_add`](crate::ActionContext::try_add) and
//! [`ActionContext::check_shortcut`](crate::ActionContext::check_shortcut).

use std::io;

use thiserror::Error;

/// A shortcut failed to parse, validate, or register.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortcutError {
    #[error("shortcut is empty")]
    Empty,

    #[error("empty key combination in \"{0}\"")]
    EmptyCombination(String),

    #[error("unknown modifier \"{modifier}\" in \"{combination}\"")]
    UnknownModifier {
        modifier: String,
        combination: String,
    },

    #[error("modifiers must appear once each in the order Ctrl+Alt+Meta+Shift: \"{0}\"")]
    ModifierOrder(String),

    #[error("unknown key \"{key}\" in \"{combination}\"")]
    UnknownKey { key: String, combination: String },

    #[error("no key in \"{0}\"")]
    MissingKey(String),

    #[error("shortcut has {count} key combinations, at most {max} are allowed")]
    TooLong { count: usize, max: usize },

    #[error("\"{0}\": Shift is implied on a bare letter and cannot be bound separately")]
    RedundantShift(String),

    #[error("shortcut {shortcut} is already used by {owner}")]
    InUse { shortcut: String, owner: String },

    #[error("shortcut {shortcut} is ambiguous with {other} (used by {owner})")]
    AmbiguousPrefix {
        shortcut: String,
        other: String,
        owner: String,
    },
}

/// A problem found while registering or updating an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("action \"{0}\" is already registered")]
    DuplicateName(String),

    #[error("invalid action name \"{0}\": names must be non-empty and contain no spaces, commas, colons, or quotes")]
    InvalidName(String),

    #[error("choice-group action \"{0}\" cannot have a shortcut; put shortcuts on its choices")]
    ShortcutOnChoiceGroup(String),

    #[error("invalid shortcut for {owner}: {source}")]
    InvalidShortcut {
        owner: String,
        #[source]
        source: ShortcutError,
    },

    #[error("no action named \"{0}\"")]
    UnknownAction(String),

    #[error("action \"{action}\" has no choice \"{choice}\"")]
    UnknownChoice { action: String, choice: String },

    #[error("action \"{action}\" lists choice \"{choice}\" more than once")]
    DuplicateChoice { action: String, choice: String },
}

/// Configuration could not be read or written.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no configuration directory is available on this system")]
    NoConfigDir,
}

/// The umbrella error type for Horizon Actions.
#[derive(Debug, Error)]
pub enum ActionsError {
    #[error(transparent)]
    Shortcut(#[from] ShortcutError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("the global context manager has already been initialized")]
    AlreadyInitialized,

    #[error("the global context manager has not been initialized; call init_global() first")]
    NotInitialized,
}

/// A specialized Result type for Horizon Actions operations.
pub type ActionsResult<T> = std::result::Result<T, ActionsError>;
