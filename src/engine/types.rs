//! Core data model: player records, inventories, cooldowns, and the item
//! catalog. The three top-level maps in [`StoreSnapshot`] are the on-disk
//! schema; every entry round-trips exactly, including empty inventories and
//! empty cooldown maps.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::errors::EngineError;

/// Per-player game stats. Created lazily on first reference and never
/// deleted; mutated exclusively through [`PlayerStore`](super::PlayerStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub hp: i64,
    pub energy: i64,
    pub exp: i64,
    pub level: u32,
    #[serde(default)]
    pub coins: i64,
}

impl PlayerRecord {
    /// Default record for a freshly created player: full stats, level 1.
    pub fn new(max_hp: i64, max_energy: i64) -> Self {
        Self {
            hp: max_hp,
            energy: max_energy,
            exp: 0,
            level: 1,
            coins: 0,
        }
    }
}

/// Item quantities per item id. Entries with quantity <= 0 are removed,
/// never stored.
pub type Inventory = HashMap<String, u32>;

/// Last-used epoch-second timestamps per action name. Absence means
/// "never used" and is treated as timestamp 0.
pub type CooldownMap = HashMap<String, i64>;

/// Upper bounds for the clamped stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCaps {
    pub max_hp: i64,
    pub max_energy: i64,
}

/// The stats addressable through `update_stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Hp,
    Energy,
    Exp,
    Level,
    Coins,
}

impl StatField {
    pub fn name(&self) -> &'static str {
        match self {
            StatField::Hp => "hp",
            StatField::Energy => "energy",
            StatField::Exp => "exp",
            StatField::Level => "level",
            StatField::Coins => "coins",
        }
    }

    /// Parse a stat name as received from the command layer.
    pub fn parse(name: &str) -> Result<Self, EngineError> {
        match name {
            "hp" => Ok(StatField::Hp),
            "energy" => Ok(StatField::Energy),
            "exp" => Ok(StatField::Exp),
            "level" => Ok(StatField::Level),
            "coins" => Ok(StatField::Coins),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown stat name: {other}"
            ))),
        }
    }
}

/// Static catalog entry for an item. Loaded from config at startup, never
/// persisted with player state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default = "default_rarity")]
    pub rarity: String,
    /// Additive stat deltas applied on use, clamped to caps.
    /// Keys are stat names ("hp", "energy").
    #[serde(default)]
    pub effect: HashMap<String, i64>,
}

fn default_rarity() -> String {
    "common".to_string()
}

/// The full persisted state: players, inventories, and cooldowns keyed by
/// player id. This struct is what `persist()` serializes as a single blob.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub players: HashMap<String, PlayerRecord>,
    pub inventories: HashMap<String, Inventory>,
    pub cooldowns: HashMap<String, CooldownMap>,
}
