//! Engine-wide counters for the liveness surface and the `status` command.
//! Plain atomics so readers never contend with the store lock.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static ATTACKS_RESOLVED: AtomicU64 = AtomicU64::new(0);
static EXP_GRANTS: AtomicU64 = AtomicU64::new(0);
static EXERCISE_ROLLS: AtomicU64 = AtomicU64::new(0);
static SEARCH_ROLLS: AtomicU64 = AtomicU64::new(0);
static GACHA_ROLLS: AtomicU64 = AtomicU64::new(0);
static ITEMS_USED: AtomicU64 = AtomicU64::new(0);
static REGEN_HP_CYCLES: AtomicU64 = AtomicU64::new(0);
static REGEN_ENERGY_CYCLES: AtomicU64 = AtomicU64::new(0);
static PERSIST_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn inc_attacks_resolved() {
    ATTACKS_RESOLVED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_exp_grants() {
    EXP_GRANTS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_exercise_rolls() {
    EXERCISE_ROLLS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_search_rolls() {
    SEARCH_ROLLS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_gacha_rolls() {
    GACHA_ROLLS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_items_used() {
    ITEMS_USED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_regen_hp_cycles() {
    REGEN_HP_CYCLES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_regen_energy_cycles() {
    REGEN_ENERGY_CYCLES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_persist_failures() {
    PERSIST_FAILURES.fetch_add(1, Ordering::Relaxed);
}

/// Point-in-time view of all counters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub attacks_resolved: u64,
    pub exp_grants: u64,
    pub exercise_rolls: u64,
    pub search_rolls: u64,
    pub gacha_rolls: u64,
    pub items_used: u64,
    pub regen_hp_cycles: u64,
    pub regen_energy_cycles: u64,
    pub persist_failures: u64,
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        attacks_resolved: ATTACKS_RESOLVED.load(Ordering::Relaxed),
        exp_grants: EXP_GRANTS.load(Ordering::Relaxed),
        exercise_rolls: EXERCISE_ROLLS.load(Ordering::Relaxed),
        search_rolls: SEARCH_ROLLS.load(Ordering::Relaxed),
        gacha_rolls: GACHA_ROLLS.load(Ordering::Relaxed),
        items_used: ITEMS_USED.load(Ordering::Relaxed),
        regen_hp_cycles: REGEN_HP_CYCLES.load(Ordering::Relaxed),
        regen_energy_cycles: REGEN_ENERGY_CYCLES.load(Ordering::Relaxed),
        persist_failures: PERSIST_FAILURES.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let before = snapshot().attacks_resolved;
        inc_attacks_resolved();
        inc_attacks_resolved();
        assert!(snapshot().attacks_resolved >= before + 2);
    }
}
