//! Core primitives for Horizon Actions.
//!
//! This crate provides the building blocks shared by the action registry:
//!
//! - **Signal**: Synchronous observer lists with per-slot panic isolation
//! - **Property**: Change-detecting value cells
//! - **Logging**: `tracing` target names used across the workspace
//!
//! # Signal Example
//!
//! ```
//! use horizon_actions_core::Signal;
//!
//! let changed = Signal::<String>::new();
//! let id = changed.connect(|name| println!("{name} changed"));
//! changed.emit("undo".to_string());
//! changed.disconnect(id);
//! ```
//!
//! # Property Example
//!
//! ```
//! use horizon_actions_core::Property;
//!
//! let enabled = Property::new(true);
//! assert!(!enabled.set(true));
//! assert!(enabled.set(false));
//! assert!(!enabled.get());
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use property::Property;
pub use signal::{ConnectionId, Signal};
