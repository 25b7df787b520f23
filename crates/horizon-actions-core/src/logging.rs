//! Logging facilities for Horizon Actions.
//!
//! Horizon Actions uses the `tracing` crate for instrumentation. Nothing is
//! printed unless the host application installs a subscriber:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_actions=debug")
//!         .init();
//! }
//! ```
//!
//! Registration problems (duplicate names, conflicting shortcuts) are logged
//! at `warn`. Misuse of the registry API and panics caught inside action
//! behaviors or observers are logged at `error`.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/observer system target.
    pub const SIGNAL: &str = "horizon_actions_core::signal";
    /// Action registry target (add, remove, update, usage errors).
    pub const REGISTRY: &str = "horizon_actions::registry";
    /// Shortcut parsing and shortcut map target.
    pub const SHORTCUT: &str = "horizon_actions::shortcut";
    /// Key event interpretation target.
    pub const INTERPRETER: &str = "horizon_actions::interpreter";
    /// Key and click dispatch target.
    pub const DISPATCH: &str = "horizon_actions::dispatch";
    /// Context manager target.
    pub const MANAGER: &str = "horizon_actions::manager";
    /// Configuration loading target.
    pub const CONFIG: &str = "horizon_actions::config";
}
