//! Tests for the process-wide context manager slot.
//!
//! Kept in their own test binary so no other test initializes the slot first.

use horizon_actions::{ActionsError, Environment, Platform, global, init_global};
use std::sync::Arc;

#[test]
fn test_global_manager_lifecycle() {
    assert!(matches!(global(), Err(ActionsError::NotInitialized)));

    let manager = init_global(Environment::new(Platform::Standard)).unwrap();
    let again = global().unwrap();
    assert!(Arc::ptr_eq(&manager, &again));

    assert!(matches!(
        init_global(Environment::new(Platform::Mac)),
        Err(ActionsError::AlreadyInitialized)
    ));
    assert_eq!(global().unwrap().environment().platform(), Platform::Standard);
}
