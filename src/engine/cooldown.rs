//! Time-gated action eligibility over the store's cooldown map.
//!
//! Checking never mutates state; callers record use only after the gated
//! action actually succeeded, so a refused action never burns its gate.

use crate::engine::errors::EngineError;
use crate::engine::store::PlayerStore;

/// Seconds until `action` is eligible again, 0 when ready now. A player or
/// action never seen before has last-used 0 and is always eligible.
pub fn remaining(
    store: &PlayerStore,
    id: &str,
    action: &str,
    duration_seconds: i64,
    now: i64,
) -> i64 {
    let last_used = store.last_used(id, action);
    (last_used + duration_seconds - now).max(0)
}

/// Error-typed form of [`remaining`] for gated operations.
pub fn ensure_ready(
    store: &PlayerStore,
    id: &str,
    action: &str,
    duration_seconds: i64,
    now: i64,
) -> Result<(), EngineError> {
    let left = remaining(store, id, action, duration_seconds, now);
    if left > 0 {
        return Err(EngineError::CooldownActive {
            action: action.to_string(),
            remaining_seconds: left,
        });
    }
    Ok(())
}

/// Mark `action` used at `now` (epoch seconds).
pub fn record_use(
    store: &mut PlayerStore,
    id: &str,
    action: &str,
    now: i64,
) -> Result<(), EngineError> {
    store.record_use(id, action, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::StatCaps;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> PlayerStore {
        PlayerStore::open(
            dir.path().join("rpg_state.json"),
            StatCaps {
                max_hp: 100,
                max_energy: 100,
            },
        )
        .expect("store")
    }

    #[test]
    fn never_used_is_immediately_eligible() {
        let dir = TempDir::new().expect("tempdir");
        let s = store(&dir);
        assert_eq!(remaining(&s, "alice", "search", 7200, 1_700_000_000), 0);
        assert!(ensure_ready(&s, "alice", "search", 7200, 1_700_000_000).is_ok());
    }

    #[test]
    fn fresh_use_counts_down_exactly() {
        let dir = TempDir::new().expect("tempdir");
        let mut s = store(&dir);
        let t = 1_700_000_000;
        record_use(&mut s, "alice", "search", t).expect("record");
        // One second later, a 2-hour gate has 7199 seconds left.
        assert_eq!(remaining(&s, "alice", "search", 7200, t + 1), 7199);
        assert_eq!(remaining(&s, "alice", "search", 7200, t + 7200), 0);
    }

    #[test]
    fn ensure_ready_reports_remaining_seconds() {
        let dir = TempDir::new().expect("tempdir");
        let mut s = store(&dir);
        let t = 1_700_000_000;
        record_use(&mut s, "bob", "exercise", t).expect("record");
        let err = ensure_ready(&s, "bob", "exercise", 86_400, t + 100).unwrap_err();
        match err {
            EngineError::CooldownActive {
                action,
                remaining_seconds,
            } => {
                assert_eq!(action, "exercise");
                assert_eq!(remaining_seconds, 86_300);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
