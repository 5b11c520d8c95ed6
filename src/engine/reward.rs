//! EXP grants, the daily exercise roll, the search roll, and the gacha
//! draw. Level recomputation happens on every EXP-granting path; cooldowns
//! are consumed only after their action actually ran.

use rand::Rng;

use crate::engine::cooldown;
use crate::engine::errors::EngineError;
use crate::engine::store::PlayerStore;
use crate::engine::tables::sample_ranges;
use crate::engine::types::{ItemDefinition, StatField};
use crate::engine::Rules;

/// Action names as recorded in the cooldown map.
pub const ACTION_EXERCISE: &str = "exercise";
pub const ACTION_SEARCH: &str = "search";

/// Result of an EXP grant, including the level transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpGrant {
    pub amount_applied: i64,
    pub new_exp: i64,
    pub old_level: u32,
    pub new_level: u32,
    pub leveled_up: bool,
}

/// Result of a search roll. A failed search grants nothing but still
/// consumes the cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub success: bool,
    pub coins_granted: i64,
    pub balance_after: i64,
}

/// Result of a gacha draw.
#[derive(Debug, Clone, PartialEq)]
pub struct GachaPull {
    pub item: ItemDefinition,
    pub balance_after: i64,
}

/// Grant EXP to a player. Non-positive amounts are rejected; amounts above
/// the configured per-grant maximum are clamped to it. Level is recomputed
/// from the anchor table and written back when it changed.
pub fn grant_exp(
    store: &mut PlayerStore,
    rules: &Rules,
    id: &str,
    amount: i64,
) -> Result<ExpGrant, EngineError> {
    if amount <= 0 {
        return Err(EngineError::InvalidArgument(format!(
            "exp amount must be positive, got {amount}"
        )));
    }
    let amount = amount.min(rules.exp_grant_max);
    let record = store.get_or_create(id)?;
    let old_level = rules.levels.level_for(record.exp);
    let new_exp = record.exp + amount;
    store.update_stat(id, StatField::Exp, new_exp)?;
    let new_level = rules.levels.level_for(new_exp);
    if new_level != old_level {
        store.update_stat(id, StatField::Level, new_level as i64)?;
    }
    Ok(ExpGrant {
        amount_applied: amount,
        new_exp,
        old_level,
        new_level,
        leveled_up: new_level > old_level,
    })
}

/// Daily exercise: gated by a fixed cooldown, draws from the EXP reward
/// table (ranges only, no level bucketing). A roll landing in the miss
/// remainder grants 0 EXP; the cooldown is consumed either way.
pub fn roll_exercise<R: Rng + ?Sized>(
    store: &mut PlayerStore,
    rules: &Rules,
    rng: &mut R,
    id: &str,
    now: i64,
) -> Result<i64, EngineError> {
    cooldown::ensure_ready(store, id, ACTION_EXERCISE, rules.exercise_cooldown_seconds, now)?;
    let exp = sample_ranges(&rules.exercise_ranges, rng);
    if exp > 0 {
        grant_exp(store, rules, id, exp)?;
    }
    cooldown::record_use(store, id, ACTION_EXERCISE, now)?;
    Ok(exp)
}

/// Search for coins: gated by a fixed cooldown; succeeds with the
/// configured probability and grants a uniform coin amount from the
/// configured range. Failure grants 0 and still consumes the cooldown.
pub fn roll_search<R: Rng + ?Sized>(
    store: &mut PlayerStore,
    rules: &Rules,
    rng: &mut R,
    id: &str,
    now: i64,
) -> Result<SearchOutcome, EngineError> {
    cooldown::ensure_ready(store, id, ACTION_SEARCH, rules.search_cooldown_seconds, now)?;
    let success = rng.gen::<f64>() < rules.search_success_chance;
    let coins_granted = if success {
        rng.gen_range(rules.search_coin_min..=rules.search_coin_max)
    } else {
        0
    };
    let balance_after = if coins_granted > 0 {
        store.add_coins(id, coins_granted)?
    } else {
        store.get_or_create(id)?.coins
    };
    cooldown::record_use(store, id, ACTION_SEARCH, now)?;
    Ok(SearchOutcome {
        success,
        coins_granted,
        balance_after,
    })
}

/// Spend coins on a gacha draw: deducts the configured cost (refused
/// without mutation when the balance is short) and grants one item drawn
/// uniformly from the catalog.
pub fn roll_gacha<R: Rng + ?Sized>(
    store: &mut PlayerStore,
    rules: &Rules,
    rng: &mut R,
    id: &str,
) -> Result<GachaPull, EngineError> {
    if rules.catalog.is_empty() {
        return Err(EngineError::NotFound("item catalog is empty".to_string()));
    }
    let balance_after = store.remove_coins(id, rules.gacha_coin_cost)?;
    let item = rules.catalog[rng.gen_range(0..rules.catalog.len())].clone();
    store.add_item(id, &item.id, 1)?;
    Ok(GachaPull {
        item,
        balance_after,
    })
}
