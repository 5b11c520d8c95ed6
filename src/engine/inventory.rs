//! Inventory operations: granting, discarding, and using items.

use std::collections::HashMap;

use crate::engine::errors::EngineError;
use crate::engine::store::PlayerStore;
use crate::engine::types::{PlayerRecord, StatField};
use crate::engine::Rules;

/// Effect of a consumed item: the deltas actually applied (post-clamp) and
/// the resulting record.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedEffect {
    pub item_id: String,
    pub applied: HashMap<String, i64>,
    pub player: PlayerRecord,
}

/// Grant `quantity` of an item. The item must exist in the catalog;
/// quantity must be at least 1. Returns the new owned quantity.
pub fn add_item(
    store: &mut PlayerStore,
    rules: &Rules,
    id: &str,
    item_id: &str,
    quantity: u32,
) -> Result<u32, EngineError> {
    if quantity == 0 {
        return Err(EngineError::InvalidArgument(
            "item quantity must be at least 1".to_string(),
        ));
    }
    if rules.item(item_id).is_none() {
        return Err(EngineError::NotFound(format!("item: {item_id}")));
    }
    store.add_item(id, item_id, quantity)
}

/// Discard `quantity` of an item. Returns false (and mutates nothing) when
/// the owned quantity is below the requested amount.
pub fn remove_item(
    store: &mut PlayerStore,
    id: &str,
    item_id: &str,
    quantity: u32,
) -> Result<bool, EngineError> {
    if quantity == 0 {
        return Err(EngineError::InvalidArgument(
            "item quantity must be at least 1".to_string(),
        ));
    }
    store.remove_item(id, item_id, quantity)
}

/// Consume one unit of an item and apply its declared stat effects
/// additively, clamped to the caps.
pub fn use_item(
    store: &mut PlayerStore,
    rules: &Rules,
    id: &str,
    item_id: &str,
) -> Result<AppliedEffect, EngineError> {
    let Some(item) = rules.item(item_id).cloned() else {
        return Err(EngineError::NotFound(format!("item: {item_id}")));
    };
    if !store.remove_item(id, item_id, 1)? {
        let owned = store
            .inventory(id)?
            .get(item_id)
            .copied()
            .unwrap_or(0);
        return Err(EngineError::InsufficientResource {
            resource: "item",
            have: owned as i64,
            need: 1,
        });
    }

    let mut applied = HashMap::new();
    for (stat, delta) in &item.effect {
        let field = StatField::parse(stat)?;
        let before = store
            .get(id)
            .map(|r| stat_value(r, field))
            .unwrap_or_default();
        let after = stat_value(&store.update_stat(id, field, before + delta)?, field);
        applied.insert(stat.clone(), after - before);
    }

    let player = store.get_or_create(id)?;
    Ok(AppliedEffect {
        item_id: item.id,
        applied,
        player,
    })
}

fn stat_value(record: &PlayerRecord, field: StatField) -> i64 {
    match field {
        StatField::Hp => record.hp,
        StatField::Energy => record.energy,
        StatField::Exp => record.exp,
        StatField::Level => record.level as i64,
        StatField::Coins => record.coins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::StatCaps;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (PlayerStore, Rules) {
        let store = PlayerStore::open(
            dir.path().join("rpg_state.json"),
            StatCaps {
                max_hp: 100,
                max_energy: 100,
            },
        )
        .expect("store");
        (store, Rules::default_rules())
    }

    #[test]
    fn add_item_rejects_unknown_and_zero_quantity() {
        let dir = TempDir::new().expect("tempdir");
        let (mut store, rules) = setup(&dir);
        let err = add_item(&mut store, &rules, "alice", "excalibur", 1).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
        let err = add_item(&mut store, &rules, "alice", "first_aid_kit", 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[test]
    fn use_item_requires_ownership() {
        let dir = TempDir::new().expect("tempdir");
        let (mut store, rules) = setup(&dir);
        store.get_or_create("bob").expect("create");
        let err = use_item(&mut store, &rules, "bob", "first_aid_kit").unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientResource { resource: "item", have: 0, need: 1 }
        ));
    }

    #[test]
    fn first_aid_kit_restores_hp_clamped_to_cap() {
        let dir = TempDir::new().expect("tempdir");
        let (mut store, rules) = setup(&dir);
        store
            .update_stat("carol", StatField::Hp, 50)
            .expect("set hp");
        add_item(&mut store, &rules, "carol", "first_aid_kit", 2).expect("grant");

        let effect = use_item(&mut store, &rules, "carol", "first_aid_kit").expect("use");
        assert_eq!(effect.applied["hp"], 30);
        assert_eq!(effect.player.hp, 80);

        // Second use clamps at the cap: only 20 of the 30 points land.
        let effect = use_item(&mut store, &rules, "carol", "first_aid_kit").expect("use");
        assert_eq!(effect.applied["hp"], 20);
        assert_eq!(effect.player.hp, 100);
        // Both kits consumed; the entry is gone.
        assert!(!store
            .inventory("carol")
            .expect("inv")
            .contains_key("first_aid_kit"));
    }

    #[test]
    fn energy_drink_restores_energy() {
        let dir = TempDir::new().expect("tempdir");
        let (mut store, rules) = setup(&dir);
        store
            .update_stat("dave", StatField::Energy, 10)
            .expect("set energy");
        add_item(&mut store, &rules, "dave", "energy_drink", 1).expect("grant");
        let effect = use_item(&mut store, &rules, "dave", "energy_drink").expect("use");
        assert_eq!(effect.applied["energy"], 40);
        assert_eq!(effect.player.energy, 50);
    }
}
