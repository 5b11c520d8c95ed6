//! Stat/economy engine: player state, cooldown-gated actions, probability
//! tables, and passive regeneration.
//!
//! The submodules hold the mechanics; [`StatEngine`] is the operation
//! surface a command dispatcher consumes. Every mutating operation locks
//! the one [`PlayerStore`] writer for its whole read-modify-persist span,
//! so operations issued in order by one caller apply in that order and
//! concurrent first-touches of the same player cannot create divergent
//! records.

pub mod combat;
pub mod cooldown;
pub mod errors;
pub mod inventory;
pub mod regen;
pub mod reward;
pub mod store;
pub mod tables;
pub mod types;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex as AsyncMutex;

pub use combat::AttackReport;
pub use errors::EngineError;
pub use inventory::AppliedEffect;
pub use reward::{ExpGrant, GachaPull, SearchOutcome, ACTION_EXERCISE, ACTION_SEARCH};
pub use store::PlayerStore;
pub use tables::{Bucket, LevelThreshold, LevelThresholds, OutcomeTable, WeightedRange};
pub use types::{ItemDefinition, PlayerRecord, StatCaps, StatField, StoreSnapshot};

use crate::config::{Config, TableBucketConfig};
use crate::metrics;
use crate::validation::normalize_player_id;

/// Immutable rule set derived from configuration at startup.
#[derive(Debug, Clone)]
pub struct Rules {
    pub caps: StatCaps,
    pub attack_energy_cost: i64,
    pub exp_grant_max: i64,
    pub exercise_cooldown_seconds: i64,
    pub search_cooldown_seconds: i64,
    pub search_success_chance: f64,
    pub search_coin_min: i64,
    pub search_coin_max: i64,
    pub gacha_coin_cost: i64,
    pub levels: LevelThresholds,
    pub attack_table: OutcomeTable,
    pub defense_table: OutcomeTable,
    pub exercise_ranges: Vec<WeightedRange>,
    /// Catalog in configuration order; gacha draws index into this.
    pub catalog: Vec<ItemDefinition>,
}

impl Rules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            caps: StatCaps {
                max_hp: config.game.max_hp,
                max_energy: config.game.max_energy,
            },
            attack_energy_cost: config.game.attack_energy_cost,
            exp_grant_max: config.game.exp_grant_max,
            exercise_cooldown_seconds: config.cooldowns.exercise_seconds,
            search_cooldown_seconds: config.cooldowns.search_seconds,
            search_success_chance: config.search.success_chance,
            search_coin_min: config.search.coin_min,
            search_coin_max: config.search.coin_max,
            gacha_coin_cost: config.gacha.coin_cost,
            levels: LevelThresholds::new(&config.levels),
            attack_table: build_table(&config.attack_table),
            defense_table: build_table(&config.defense_table),
            exercise_ranges: config.exercise_table.clone(),
            catalog: config.items.clone(),
        }
    }

    /// Rules from the built-in default configuration.
    pub fn default_rules() -> Self {
        Self::from_config(&Config::default())
    }

    /// Catalog lookup by item id.
    pub fn item(&self, id: &str) -> Option<&ItemDefinition> {
        self.catalog.iter().find(|i| i.id == id)
    }
}

fn build_table(buckets: &[TableBucketConfig]) -> OutcomeTable {
    let mut map = std::collections::BTreeMap::new();
    for bucket in buckets {
        let value = match bucket.fixed {
            Some(fixed) => Bucket::Fixed(fixed),
            None => Bucket::Weighted(bucket.ranges.clone()),
        };
        map.insert(bucket.level, value);
    }
    OutcomeTable::new(map)
}

/// The async operation surface over the single-writer store.
///
/// Cheap to clone; clones share the store, rules, and random source. The
/// RNG sits behind a std mutex that is only held inside non-async
/// sections, never across an await point.
#[derive(Clone)]
pub struct StatEngine {
    store: Arc<AsyncMutex<PlayerStore>>,
    rules: Arc<Rules>,
    rng: Arc<Mutex<StdRng>>,
}

impl StatEngine {
    pub fn new(store: PlayerStore, rules: Rules) -> Self {
        Self::with_rng(store, rules, StdRng::from_entropy())
    }

    /// Engine with a caller-seeded random source, for deterministic replay.
    pub fn with_rng(store: PlayerStore, rules: Rules, rng: StdRng) -> Self {
        Self {
            store: Arc::new(AsyncMutex::new(store)),
            rules: Arc::new(rules),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Existing record or a freshly created default one.
    pub async fn get_or_create(&self, player_id: &str) -> Result<PlayerRecord, EngineError> {
        let id = normalize_player_id(player_id)?;
        let mut store = self.store.lock().await;
        store.get_or_create(&id)
    }

    /// Set one stat by name, clamped to its legal range.
    pub async fn update_stat(
        &self,
        player_id: &str,
        stat_name: &str,
        value: i64,
    ) -> Result<PlayerRecord, EngineError> {
        let id = normalize_player_id(player_id)?;
        let field = StatField::parse(stat_name)?;
        let mut store = self.store.lock().await;
        store.update_stat(&id, field, value)
    }

    /// Snapshot view of every player, for batch scans.
    pub async fn all_players(&self) -> HashMap<String, PlayerRecord> {
        self.store.lock().await.all_players()
    }

    pub async fn player_count(&self) -> usize {
        self.store.lock().await.player_count()
    }

    /// Seconds until `action` is eligible again for this player, 0 when
    /// ready. Never mutates state.
    pub async fn remaining_cooldown(
        &self,
        player_id: &str,
        action: &str,
        duration_seconds: i64,
        now: i64,
    ) -> Result<i64, EngineError> {
        let id = normalize_player_id(player_id)?;
        let store = self.store.lock().await;
        Ok(cooldown::remaining(&store, &id, action, duration_seconds, now))
    }

    /// Mark `action` used at `now`. Callers invoke this only after an
    /// externally-gated action succeeded.
    pub async fn record_use(
        &self,
        player_id: &str,
        action: &str,
        now: i64,
    ) -> Result<(), EngineError> {
        let id = normalize_player_id(player_id)?;
        let mut store = self.store.lock().await;
        store.record_use(&id, action, now)
    }

    /// Resolve an attack; see [`combat::resolve_attack`].
    pub async fn resolve_attack(
        &self,
        attacker: &str,
        defender: &str,
    ) -> Result<AttackReport, EngineError> {
        let attacker = normalize_player_id(attacker)?;
        let defender = normalize_player_id(defender)?;
        let mut store = self.store.lock().await;
        let report = {
            let mut rng = self.rng.lock().expect("rng lock");
            combat::resolve_attack(&mut store, &self.rules, &mut *rng, &attacker, &defender)?
        };
        metrics::inc_attacks_resolved();
        Ok(report)
    }

    /// Grant EXP and recompute level; see [`reward::grant_exp`].
    pub async fn grant_exp(&self, player_id: &str, amount: i64) -> Result<ExpGrant, EngineError> {
        let id = normalize_player_id(player_id)?;
        let mut store = self.store.lock().await;
        let grant = reward::grant_exp(&mut store, &self.rules, &id, amount)?;
        metrics::inc_exp_grants();
        Ok(grant)
    }

    /// Daily exercise roll; see [`reward::roll_exercise`].
    pub async fn roll_exercise(&self, player_id: &str, now: i64) -> Result<i64, EngineError> {
        let id = normalize_player_id(player_id)?;
        let mut store = self.store.lock().await;
        let exp = {
            let mut rng = self.rng.lock().expect("rng lock");
            reward::roll_exercise(&mut store, &self.rules, &mut *rng, &id, now)?
        };
        metrics::inc_exercise_rolls();
        Ok(exp)
    }

    /// Coin search roll; see [`reward::roll_search`].
    pub async fn roll_search(
        &self,
        player_id: &str,
        now: i64,
    ) -> Result<SearchOutcome, EngineError> {
        let id = normalize_player_id(player_id)?;
        let mut store = self.store.lock().await;
        let outcome = {
            let mut rng = self.rng.lock().expect("rng lock");
            reward::roll_search(&mut store, &self.rules, &mut *rng, &id, now)?
        };
        metrics::inc_search_rolls();
        Ok(outcome)
    }

    /// Gacha item draw; see [`reward::roll_gacha`].
    pub async fn roll_gacha(&self, player_id: &str) -> Result<GachaPull, EngineError> {
        let id = normalize_player_id(player_id)?;
        let mut store = self.store.lock().await;
        let pull = {
            let mut rng = self.rng.lock().expect("rng lock");
            reward::roll_gacha(&mut store, &self.rules, &mut *rng, &id)?
        };
        metrics::inc_gacha_rolls();
        Ok(pull)
    }

    /// Grant items into a player's inventory.
    pub async fn add_item(
        &self,
        player_id: &str,
        item_id: &str,
        quantity: u32,
    ) -> Result<u32, EngineError> {
        let id = normalize_player_id(player_id)?;
        let mut store = self.store.lock().await;
        inventory::add_item(&mut store, &self.rules, &id, item_id, quantity)
    }

    /// Discard items; false when the owned quantity is short.
    pub async fn remove_item(
        &self,
        player_id: &str,
        item_id: &str,
        quantity: u32,
    ) -> Result<bool, EngineError> {
        let id = normalize_player_id(player_id)?;
        let mut store = self.store.lock().await;
        inventory::remove_item(&mut store, &id, item_id, quantity)
    }

    /// Consume one item and apply its effects.
    pub async fn use_item(
        &self,
        player_id: &str,
        item_id: &str,
    ) -> Result<AppliedEffect, EngineError> {
        let id = normalize_player_id(player_id)?;
        let mut store = self.store.lock().await;
        let effect = inventory::use_item(&mut store, &self.rules, &id, item_id)?;
        metrics::inc_items_used();
        Ok(effect)
    }

    /// The player's inventory snapshot.
    pub async fn inventory(
        &self,
        player_id: &str,
    ) -> Result<HashMap<String, u32>, EngineError> {
        let id = normalize_player_id(player_id)?;
        let mut store = self.store.lock().await;
        store.inventory(&id)
    }

    /// Fully restore a player's HP and energy (dispatcher-privileged).
    pub async fn restore(&self, player_id: &str) -> Result<PlayerRecord, EngineError> {
        let id = normalize_player_id(player_id)?;
        let caps = self.rules.caps;
        let mut store = self.store.lock().await;
        store.update_stat(&id, StatField::Hp, caps.max_hp)?;
        store.update_stat(&id, StatField::Energy, caps.max_energy)
    }

    /// One regeneration pass over every player below cap for `field`.
    /// Per-player failures are isolated: the pass continues and reports
    /// how many records it raised.
    pub async fn regen_cycle(&self, field: StatField, rate: i64) -> usize {
        let caps = self.rules.caps;
        let cap = match field {
            StatField::Hp => caps.max_hp,
            StatField::Energy => caps.max_energy,
            _ => return 0,
        };
        let mut store = self.store.lock().await;
        let players = store.all_players();
        let mut raised = 0;
        for (id, record) in players {
            let current = match field {
                StatField::Hp => record.hp,
                StatField::Energy => record.energy,
                _ => unreachable!(),
            };
            if current >= cap {
                continue;
            }
            let next = (current + rate).min(cap);
            match store.update_stat(&id, field, next) {
                Ok(_) => raised += 1,
                Err(e) => {
                    log::warn!("regen: failed to update {} for {}: {}", field.name(), id, e);
                }
            }
        }
        raised
    }

    /// Force a snapshot write (shutdown path).
    pub async fn persist(&self) -> Result<(), EngineError> {
        self.store.lock().await.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine(dir: &TempDir) -> StatEngine {
        let rules = Rules::default_rules();
        let store = PlayerStore::open(dir.path().join("rpg_state.json"), rules.caps)
            .expect("store");
        StatEngine::with_rng(store, rules, StdRng::seed_from_u64(1234))
    }

    #[tokio::test]
    async fn ids_are_normalized_across_operations() {
        let dir = TempDir::new().expect("tempdir");
        let engine = engine(&dir);
        engine.get_or_create("  Alice ").await.expect("create");
        // Same player under a differently-cased spelling.
        let record = engine
            .update_stat("ALICE", "hp", 55)
            .await
            .expect("update");
        assert_eq!(record.hp, 55);
        assert_eq!(engine.player_count().await, 1);
    }

    #[tokio::test]
    async fn invalid_id_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let engine = engine(&dir);
        let err = engine.get_or_create("").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_stat_name_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let engine = engine(&dir);
        let err = engine.update_stat("bob", "mana", 10).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn restore_fills_both_stats() {
        let dir = TempDir::new().expect("tempdir");
        let engine = engine(&dir);
        engine.update_stat("carol", "hp", 3).await.expect("hp");
        engine.update_stat("carol", "energy", 0).await.expect("energy");
        let record = engine.restore("carol").await.expect("restore");
        assert_eq!(record.hp, 100);
        assert_eq!(record.energy, 100);
    }

    #[tokio::test]
    async fn regen_cycle_respects_caps() {
        let dir = TempDir::new().expect("tempdir");
        let engine = engine(&dir);
        engine.update_stat("low", "hp", 50).await.expect("hp");
        engine.update_stat("edge", "hp", 99).await.expect("hp");
        engine.get_or_create("full").await.expect("create");
        let raised = engine.regen_cycle(StatField::Hp, 2).await;
        assert_eq!(raised, 2);
        let players = engine.all_players().await;
        assert_eq!(players["low"].hp, 52);
        assert_eq!(players["edge"].hp, 100, "clamped, not overshot");
        assert_eq!(players["full"].hp, 100);
    }

    #[tokio::test]
    async fn same_caller_operations_apply_in_order() {
        let dir = TempDir::new().expect("tempdir");
        let engine = engine(&dir);
        engine.get_or_create("tank").await.expect("create");
        // An attack then a restore on the same target must land in that
        // order: the final state is the restored one.
        engine.resolve_attack("striker", "tank").await.expect("attack");
        let record = engine.restore("tank").await.expect("restore");
        assert_eq!(record.hp, 100);
    }
}
