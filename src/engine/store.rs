//! Canonical player-state store and snapshot persistence.
//!
//! `PlayerStore` is the single writer for all three per-player maps
//! (players, inventories, cooldowns). Persistence is one JSON blob written
//! with write-new-then-rename so a concurrent reader never observes a torn
//! file; reads take a shared fs2 lock, writes an exclusive one. A snapshot
//! that fails to load falls back to a fresh empty state and is persisted
//! immediately, so startup never dies on a corrupt file.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{error, info, warn};

use crate::engine::errors::EngineError;
use crate::engine::types::{
    CooldownMap, Inventory, PlayerRecord, StatCaps, StatField, StoreSnapshot,
};
use crate::metrics;

pub struct PlayerStore {
    path: PathBuf,
    caps: StatCaps,
    data: StoreSnapshot,
}

impl PlayerStore {
    /// Open the store backed by the snapshot file at `path`, creating the
    /// parent directory as needed. A missing or unreadable snapshot yields
    /// an empty store which is persisted right away.
    pub fn open(path: impl Into<PathBuf>, caps: StatCaps) -> Result<Self, EngineError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = match load_snapshot(&path) {
            Ok(Some(snapshot)) => {
                info!("Loaded snapshot with {} players", snapshot.players.len());
                snapshot
            }
            Ok(None) => {
                info!("No existing snapshot at {:?}; starting fresh", path);
                StoreSnapshot::default()
            }
            Err(e) => {
                warn!("Snapshot at {:?} unreadable ({}); starting fresh", path, e);
                StoreSnapshot::default()
            }
        };
        let store = Self { path, caps, data };
        store.persist()?;
        Ok(store)
    }

    pub fn caps(&self) -> StatCaps {
        self.caps
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Existing record for `id`, or the default one (full HP/energy,
    /// level 1) created atomically with its empty inventory and cooldown
    /// map. Creation is persisted before returning.
    pub fn get_or_create(&mut self, id: &str) -> Result<PlayerRecord, EngineError> {
        if !self.data.players.contains_key(id) {
            self.data.players.insert(
                id.to_string(),
                PlayerRecord::new(self.caps.max_hp, self.caps.max_energy),
            );
            self.data.inventories.insert(id.to_string(), Inventory::new());
            self.data.cooldowns.insert(id.to_string(), CooldownMap::new());
            self.persist()?;
        }
        Ok(self.data.players[id].clone())
    }

    /// Read-only lookup without the create side effect.
    pub fn get(&self, id: &str) -> Option<&PlayerRecord> {
        self.data.players.get(id)
    }

    /// Set one stat field, clamping to its legal range, then persist.
    pub fn update_stat(
        &mut self,
        id: &str,
        field: StatField,
        value: i64,
    ) -> Result<PlayerRecord, EngineError> {
        self.get_or_create(id)?;
        let caps = self.caps;
        let record = self
            .data
            .players
            .get_mut(id)
            .expect("record exists after get_or_create");
        match field {
            StatField::Hp => record.hp = value.clamp(0, caps.max_hp),
            StatField::Energy => record.energy = value.clamp(0, caps.max_energy),
            StatField::Exp => record.exp = value.max(0),
            StatField::Level => record.level = (value.clamp(1, 100)) as u32,
            StatField::Coins => record.coins = value.max(0),
        }
        let updated = record.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Snapshot view of all players for batch scans (regen cycles, status).
    pub fn all_players(&self) -> std::collections::HashMap<String, PlayerRecord> {
        self.data.players.clone()
    }

    pub fn player_count(&self) -> usize {
        self.data.players.len()
    }

    /// Add coins and persist; returns the new balance.
    pub fn add_coins(&mut self, id: &str, amount: i64) -> Result<i64, EngineError> {
        self.get_or_create(id)?;
        let record = self.data.players.get_mut(id).expect("record exists");
        record.coins = record.coins.saturating_add(amount).max(0);
        let balance = record.coins;
        self.persist()?;
        Ok(balance)
    }

    /// Remove coins if the balance covers `amount`; refuses without
    /// mutation otherwise. Returns the new balance.
    pub fn remove_coins(&mut self, id: &str, amount: i64) -> Result<i64, EngineError> {
        self.get_or_create(id)?;
        let record = self.data.players.get_mut(id).expect("record exists");
        if record.coins < amount {
            return Err(EngineError::InsufficientResource {
                resource: "coins",
                have: record.coins,
                need: amount,
            });
        }
        record.coins -= amount;
        let balance = record.coins;
        self.persist()?;
        Ok(balance)
    }

    /// The player's inventory, creating the player first if needed.
    pub fn inventory(&mut self, id: &str) -> Result<Inventory, EngineError> {
        self.get_or_create(id)?;
        Ok(self.data.inventories.get(id).cloned().unwrap_or_default())
    }

    /// Increment an item quantity, creating the entry if absent. Returns
    /// the new quantity.
    pub fn add_item(&mut self, id: &str, item_id: &str, quantity: u32) -> Result<u32, EngineError> {
        self.get_or_create(id)?;
        let inventory = self.data.inventories.entry(id.to_string()).or_default();
        let entry = inventory.entry(item_id.to_string()).or_insert(0);
        *entry = entry.saturating_add(quantity);
        let total = *entry;
        self.persist()?;
        Ok(total)
    }

    /// Decrement an item quantity. Returns false (no mutation) when the
    /// owned quantity is below `quantity`; entries reaching zero are
    /// deleted, never stored as zero.
    pub fn remove_item(
        &mut self,
        id: &str,
        item_id: &str,
        quantity: u32,
    ) -> Result<bool, EngineError> {
        self.get_or_create(id)?;
        let inventory = self.data.inventories.entry(id.to_string()).or_default();
        let Some(owned) = inventory.get_mut(item_id) else {
            return Ok(false);
        };
        if *owned < quantity {
            return Ok(false);
        }
        *owned -= quantity;
        if *owned == 0 {
            inventory.remove(item_id);
        }
        self.persist()?;
        Ok(true)
    }

    /// Last-used timestamp for an action, 0 when never used. Checking
    /// eligibility never mutates state.
    pub fn last_used(&self, id: &str, action: &str) -> i64 {
        self.data
            .cooldowns
            .get(id)
            .and_then(|m| m.get(action))
            .copied()
            .unwrap_or(0)
    }

    /// Record an action as used at `now` (epoch seconds) and persist.
    pub fn record_use(&mut self, id: &str, action: &str, now: i64) -> Result<(), EngineError> {
        self.get_or_create(id)?;
        self.data
            .cooldowns
            .entry(id.to_string())
            .or_default()
            .insert(action.to_string(), now);
        self.persist()
    }

    /// Durably write the full in-memory state, replacing the prior
    /// snapshot. The new file is written and fsynced under a temporary
    /// name and renamed into place, so a concurrent reader sees either the
    /// old snapshot or the new one, never a partial file.
    pub fn persist(&self) -> Result<(), EngineError> {
        match write_snapshot(&self.path, &self.data) {
            Ok(()) => Ok(()),
            Err(e) => {
                metrics::inc_persist_failures();
                error!("Failed to persist snapshot to {:?}: {}", self.path, e);
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn raw_snapshot(&self) -> &StoreSnapshot {
        &self.data
    }
}

fn load_snapshot(path: &Path) -> Result<Option<StoreSnapshot>, EngineError> {
    if !path.exists() {
        return Ok(None);
    }
    let mut file = fs::OpenOptions::new().read(true).open(path)?;
    let _ = file.lock_shared();
    let mut contents = String::new();
    let read = file.read_to_string(&mut contents);
    let _ = file.unlock();
    read?;
    let snapshot = serde_json::from_str(&contents)?;
    Ok(Some(snapshot))
}

fn write_snapshot(path: &Path, data: &StoreSnapshot) -> Result<(), EngineError> {
    let serialized = serde_json::to_string_pretty(data)?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        let _ = file.lock_exclusive();
        file.write_all(serialized.as_bytes())?;
        file.sync_all()?;
        let _ = file.unlock();
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
