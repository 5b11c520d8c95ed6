//! Attack resolution between two players (or a self-action).
//!
//! Defense is reactive: the block roll happens inside the incoming attack,
//! there is no standalone defense action. The attacker pays the energy cost
//! up front; a refused attack (insufficient energy) changes nothing.

use rand::Rng;

use crate::engine::errors::EngineError;
use crate::engine::store::PlayerStore;
use crate::engine::types::StatField;
use crate::engine::Rules;

/// Outcome of one resolved exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackReport {
    pub damage_rolled: i64,
    pub block_rolled: i64,
    pub damage_dealt: i64,
    pub attacker_energy_after: i64,
    pub defender_hp_after: i64,
}

/// Resolve an attack from `attacker` against `defender`.
///
/// Rolls damage against the attacker's level bucket and block against the
/// defender's; net damage is `max(0, damage - block)` and the defender's HP
/// clamps at 0. Both records are persisted. Self-attacks are allowed and
/// apply both sides to the same record in order (energy first, then HP).
pub fn resolve_attack<R: Rng + ?Sized>(
    store: &mut PlayerStore,
    rules: &Rules,
    rng: &mut R,
    attacker: &str,
    defender: &str,
) -> Result<AttackReport, EngineError> {
    let attacker_record = store.get_or_create(attacker)?;
    if attacker_record.energy < rules.attack_energy_cost {
        return Err(EngineError::InsufficientResource {
            resource: "energy",
            have: attacker_record.energy,
            need: rules.attack_energy_cost,
        });
    }
    let defender_record = store.get_or_create(defender)?;

    let damage_rolled = rules.attack_table.roll(attacker_record.level, rng);
    let block_rolled = rules.defense_table.roll(defender_record.level, rng);
    let damage_dealt = (damage_rolled - block_rolled).max(0);

    let updated_attacker = store.update_stat(
        attacker,
        StatField::Energy,
        attacker_record.energy - rules.attack_energy_cost,
    )?;

    // Re-read for the self-attack case, where the energy write above
    // already touched the defender's record.
    let defender_hp = store
        .get(defender)
        .map(|r| r.hp)
        .unwrap_or(defender_record.hp);
    let updated_defender =
        store.update_stat(defender, StatField::Hp, defender_hp - damage_dealt)?;

    Ok(AttackReport {
        damage_rolled,
        block_rolled,
        damage_dealt,
        attacker_energy_after: updated_attacker.energy,
        defender_hp_after: updated_defender.hp,
    })
}
