//! Property tests for the resource lock manager.
//!
//! Random lock/unlock sequences from several owners are replayed against a
//! plain map model; every result and the final ownership table must agree.

use modus_common::resource::{ResourceClass, ResourceError, ResourceKey};
use modus_core::ResourceManager;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

const OWNERS: [&str; 3] = ["led", "button", "display"];

#[derive(Debug, Clone)]
enum Op {
    Lock(usize, u8, u16),
    Unlock(usize, u8, u16),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..OWNERS.len(), 0u8..3, 0u16..4).prop_map(|(o, c, id)| Op::Lock(o, c, id)),
        (0..OWNERS.len(), 0u8..3, 0u16..4).prop_map(|(o, c, id)| Op::Unlock(o, c, id)),
    ]
}

fn class(code: u8) -> ResourceClass {
    ResourceClass::from_code(code).unwrap_or(ResourceClass::Gpio)
}

proptest! {
    #[test]
    fn manager_matches_model(ops in prop::collection::vec(op(), 1..64)) {
        let mgr = ResourceManager::new();
        let mut model: HashMap<ResourceKey, &str> = HashMap::new();

        for op in ops {
            match op {
                Op::Lock(o, c, id) => {
                    let key = ResourceKey::new(class(c), id);
                    let result = mgr.lock(key.class, id, OWNERS[o]);
                    match model.get(&key) {
                        Some(current) => {
                            let is_conflict = matches!(
                                result,
                                Err(ResourceError::Conflict { ref current_owner, .. })
                                    if current_owner.as_str() == *current
                            );
                            prop_assert!(is_conflict);
                        }
                        None => {
                            prop_assert!(result.is_ok());
                            model.insert(key, OWNERS[o]);
                        }
                    }
                }
                Op::Unlock(o, c, id) => {
                    let key = ResourceKey::new(class(c), id);
                    let result = mgr.unlock(key.class, id, OWNERS[o]);
                    match model.get(&key).copied() {
                        None => prop_assert_eq!(result, Err(ResourceError::NotLocked { key })),
                        Some(current) if current == OWNERS[o] => {
                            prop_assert!(result.is_ok());
                            model.remove(&key);
                        }
                        Some(_) => {
                            let is_violation =
                                matches!(result, Err(ResourceError::OwnershipViolation { .. }));
                            prop_assert!(is_violation);
                        }
                    }
                }
            }
        }

        prop_assert_eq!(mgr.len(), model.len());
        for (key, owner) in &model {
            let actual = mgr.owner(key.class, key.id);
            prop_assert_eq!(actual.as_deref(), Some(*owner));
        }
    }
}

#[test]
fn concurrent_claims_have_one_winner() {
    let mgr = Arc::new(ResourceManager::new());
    let winners: usize = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let mgr = Arc::clone(&mgr);
                s.spawn(move || mgr.lock(ResourceClass::Gpio, 13, &format!("m{i}")).is_ok())
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count()
    });
    assert_eq!(winners, 1);
    assert!(mgr.is_locked(ResourceClass::Gpio, 13));
}

#[test]
fn lock_conflict_release_sequence() {
    let mgr = ResourceManager::new();
    mgr.lock(ResourceClass::Gpio, 13, "led").unwrap();
    let err = mgr.lock(ResourceClass::Gpio, 13, "button").unwrap_err();
    assert!(err.to_string().contains("led"));
    mgr.unlock(ResourceClass::Gpio, 13, "led").unwrap();
    mgr.lock(ResourceClass::Gpio, 13, "button").unwrap();
}
