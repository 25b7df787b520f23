//! Change-detecting properties.
//!
//! A [`Property<T>`] wraps a value behind a lock and reports whether a write
//! actually changed it, so callers only emit notifications for real changes.
//!
//! ```
//! use horizon_actions_core::{Property, Signal};
//!
//! struct Toggle {
//!     checked: Property<bool>,
//!     toggled: Signal<bool>,
//! }
//!
//! impl Toggle {
//!     fn set_checked(&self, checked: bool) {
//!         if self.checked.set(checked) {
//!             self.toggled.emit(checked);
//!         }
//!     }
//! }
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A value cell that tracks changes.
///
/// `Property<T>` is `Send + Sync` whenever `T` is, and can be shared behind an
/// `Arc` so that several owners observe the same setting.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if it changed.
    pub fn set(&self, value: T) -> bool {
        self.replace(value).is_some()
    }

    /// Set the value, returning the previous value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current != value {
            Some(std::mem::replace(&mut *current, value))
        } else {
            None
        }
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_change() {
        let prop = Property::new(1);
        assert!(!prop.set(1));
        assert!(prop.set(2));
        assert_eq!(prop.get(), 2);
    }

    #[test]
    fn test_replace_returns_old_value() {
        let prop = Property::new(String::from("single"));
        assert_eq!(prop.replace("sequence".into()), Some("single".into()));
        assert_eq!(prop.replace("sequence".into()), None);
    }

    #[test]
    fn test_with_borrows() {
        let prop = Property::new(vec![1, 2, 3]);
        assert_eq!(prop.with(|v| v.len()), 3);
    }

    #[test]
    fn test_default() {
        let prop: Property<bool> = Property::default();
        assert!(!prop.get());
    }
}
