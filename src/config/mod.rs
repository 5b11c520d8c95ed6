//! # Configuration Management Module
//!
//! All tunable game rules live here: stat caps, regeneration rates, action
//! costs, cooldown durations, probability tables, level thresholds, and the
//! item catalog. The engine treats a loaded [`Config`] as immutable input.
//!
//! ## Configuration Structure
//!
//! - [`GameConfig`] - stat caps, action energy costs, EXP grant cap
//! - [`RegenConfig`] - passive regeneration rates and intervals
//! - [`CooldownConfig`] - gated-action cooldown durations
//! - [`SearchConfig`] - search roll probability and coin range
//! - [`GachaConfig`] - gacha draw cost
//! - [`StorageConfig`] - snapshot location
//! - [`LoggingConfig`] - log level and optional file sink
//! - [`KeepaliveConfig`] - liveness HTTP surface and self-probe
//! - `levels` / `attack_table` / `defense_table` / `exercise_table` /
//!   `items` - the rule tables themselves
//!
//! ## Configuration File Format
//!
//! TOML, created by `statbot init`:
//!
//! ```toml
//! [game]
//! max_hp = 100
//! max_energy = 100
//! attack_energy_cost = 10
//! exp_grant_max = 10000
//!
//! [[attack_table]]
//! level = 1
//! ranges = [
//!     { lo = 0, hi = 5, weight = 0.20 },
//!     { lo = 6, hi = 10, weight = 0.18 },
//! ]
//!
//! [[attack_table]]
//! level = 100
//! fixed = 30
//! ```
//!
//! Table weights may sum to less than 1.0; the remainder is the miss
//! probability and `validate()` only rejects sums above 1.0.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

use crate::engine::tables::{LevelThreshold, WeightedRange};
use crate::engine::types::ItemDefinition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub max_hp: i64,
    pub max_energy: i64,
    pub attack_energy_cost: i64,
    /// Per-grant EXP maximum; larger grants are clamped, not rejected.
    pub exp_grant_max: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenConfig {
    /// HP points restored per cycle.
    pub hp_rate: i64,
    /// Seconds between HP cycles.
    pub hp_interval_seconds: u64,
    /// Energy points restored per cycle.
    pub energy_rate: i64,
    /// Seconds between energy cycles.
    pub energy_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    pub exercise_seconds: i64,
    pub search_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Chance in [0,1] that a search finds coins.
    pub success_chance: f64,
    pub coin_min: i64,
    pub coin_max: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GachaConfig {
    pub coin_cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl StorageConfig {
    /// Full path of the snapshot blob.
    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("rpg_state.json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    pub enabled: bool,
    /// Bind address for the liveness HTTP listener.
    pub bind: String,
    /// Seconds between self-probe pings (feature `probe`); 0 disables.
    #[serde(default)]
    pub probe_interval_seconds: u64,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:8080".to_string(),
            probe_interval_seconds: 300,
        }
    }
}

/// One level anchor of an outcome table: either a fixed terminal value or
/// weighted ranges. Exactly one of `fixed`/`ranges` should be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableBucketConfig {
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<WeightedRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub game: GameConfig,
    pub regen: RegenConfig,
    pub cooldowns: CooldownConfig,
    pub search: SearchConfig,
    pub gacha: GachaConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub keepalive: KeepaliveConfig,
    pub levels: Vec<LevelThreshold>,
    pub attack_table: Vec<TableBucketConfig>,
    pub defense_table: Vec<TableBucketConfig>,
    /// EXP reward ranges for the exercise roll (no level bucketing).
    pub exercise_table: Vec<WeightedRange>,
    pub items: Vec<ItemDefinition>,
}

impl Config {
    /// Load configuration from a file.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject configurations the engine cannot run with. Under-1.0 weight
    /// sums are legal (the remainder is the miss outcome); sums above 1.0
    /// are not.
    pub fn validate(&self) -> Result<()> {
        if self.game.max_hp <= 0 || self.game.max_energy <= 0 {
            return Err(anyhow!("stat caps must be positive"));
        }
        if self.game.attack_energy_cost < 0 || self.game.exp_grant_max <= 0 {
            return Err(anyhow!("attack cost must be >= 0 and exp grant cap positive"));
        }
        if self.regen.hp_interval_seconds == 0 || self.regen.energy_interval_seconds == 0 {
            return Err(anyhow!("regen intervals must be positive"));
        }
        if !(0.0..=1.0).contains(&self.search.success_chance) {
            return Err(anyhow!("search success_chance must be within [0, 1]"));
        }
        if self.search.coin_min > self.search.coin_max || self.search.coin_min < 0 {
            return Err(anyhow!("search coin range is invalid"));
        }
        if self.levels.is_empty() {
            return Err(anyhow!("at least one level threshold is required"));
        }
        if !self.levels.iter().any(|t| t.min_exp == 0) {
            return Err(anyhow!("a level threshold with min_exp = 0 is required"));
        }
        for (name, table) in [
            ("attack_table", &self.attack_table),
            ("defense_table", &self.defense_table),
        ] {
            if table.is_empty() {
                return Err(anyhow!("{name} must not be empty"));
            }
            for bucket in table {
                if bucket.fixed.is_some() == !bucket.ranges.is_empty() {
                    return Err(anyhow!(
                        "{name} level {} must set exactly one of fixed/ranges",
                        bucket.level
                    ));
                }
                validate_ranges(name, &bucket.ranges)?;
            }
        }
        validate_ranges("exercise_table", &self.exercise_table)?;
        for item in &self.items {
            if item.id.is_empty() {
                return Err(anyhow!("item ids must not be empty"));
            }
            if self.items.iter().filter(|i| i.id == item.id).count() > 1 {
                return Err(anyhow!("duplicate item id: {}", item.id));
            }
            for stat in item.effect.keys() {
                crate::engine::types::StatField::parse(stat).map_err(|_| {
                    anyhow!("item {} affects unknown stat: {}", item.id, stat)
                })?;
            }
        }
        Ok(())
    }
}

fn validate_ranges(name: &str, ranges: &[WeightedRange]) -> Result<()> {
    let mut total = 0.0;
    for range in ranges {
        if range.lo > range.hi {
            return Err(anyhow!("{name}: range {}..{} is inverted", range.lo, range.hi));
        }
        if !(0.0..=1.0).contains(&range.weight) {
            return Err(anyhow!("{name}: weight {} out of [0, 1]", range.weight));
        }
        total += range.weight;
    }
    if total > 1.0 + f64::EPSILON {
        return Err(anyhow!("{name}: weights sum to {total}, above 1.0"));
    }
    Ok(())
}

fn ranges(entries: &[(i64, i64, f64)]) -> Vec<WeightedRange> {
    entries.iter()
        .map(|&(lo, hi, weight)| WeightedRange { lo, hi, weight })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            game: GameConfig {
                max_hp: 100,
                max_energy: 100,
                attack_energy_cost: 10,
                exp_grant_max: 10_000,
            },
            regen: RegenConfig {
                hp_rate: 2,
                hp_interval_seconds: 5 * 60,
                energy_rate: 2,
                energy_interval_seconds: 3 * 60,
            },
            cooldowns: CooldownConfig {
                exercise_seconds: 24 * 60 * 60,
                search_seconds: 2 * 60 * 60,
            },
            search: SearchConfig {
                success_chance: 0.80,
                coin_min: 5,
                coin_max: 10,
            },
            gacha: GachaConfig { coin_cost: 10 },
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("statbot.log".to_string()),
            },
            keepalive: KeepaliveConfig::default(),
            levels: vec![
                LevelThreshold { level: 1, min_exp: 0 },
                LevelThreshold { level: 5, min_exp: 500 },
                LevelThreshold { level: 10, min_exp: 1000 },
                LevelThreshold { level: 15, min_exp: 1500 },
                LevelThreshold { level: 100, min_exp: 10_000 },
            ],
            attack_table: vec![
                TableBucketConfig {
                    level: 1,
                    fixed: None,
                    ranges: ranges(&[
                        (0, 5, 0.20),
                        (6, 10, 0.18),
                        (11, 15, 0.15),
                        (16, 20, 0.10),
                    ]),
                },
                TableBucketConfig {
                    level: 5,
                    fixed: None,
                    ranges: ranges(&[
                        (0, 5, 0.17),
                        (6, 10, 0.20),
                        (11, 15, 0.15),
                        (16, 20, 0.10),
                    ]),
                },
                TableBucketConfig {
                    level: 10,
                    fixed: None,
                    ranges: ranges(&[
                        (0, 5, 0.05),
                        (6, 10, 0.10),
                        (11, 15, 0.17),
                        (16, 20, 0.19),
                    ]),
                },
                TableBucketConfig {
                    level: 15,
                    fixed: None,
                    ranges: ranges(&[
                        (0, 5, 0.05),
                        (6, 10, 0.10),
                        (11, 15, 0.18),
                        (16, 20, 0.20),
                    ]),
                },
                TableBucketConfig {
                    level: 100,
                    fixed: Some(30),
                    ranges: Vec::new(),
                },
            ],
            defense_table: vec![
                TableBucketConfig {
                    level: 1,
                    fixed: None,
                    ranges: ranges(&[(0, 5, 0.20), (6, 10, 0.15), (11, 15, 0.10)]),
                },
                TableBucketConfig {
                    level: 5,
                    fixed: None,
                    ranges: ranges(&[(0, 5, 0.15), (6, 10, 0.20), (11, 15, 0.10)]),
                },
                TableBucketConfig {
                    level: 10,
                    fixed: None,
                    ranges: ranges(&[(0, 5, 0.10), (6, 10, 0.15), (11, 15, 0.20)]),
                },
                TableBucketConfig {
                    level: 15,
                    fixed: None,
                    ranges: ranges(&[(0, 5, 0.10), (6, 10, 0.15), (11, 15, 0.20)]),
                },
                TableBucketConfig {
                    level: 100,
                    fixed: Some(80),
                    ranges: Vec::new(),
                },
            ],
            exercise_table: ranges(&[(1, 10, 0.30), (11, 20, 0.29), (21, 30, 0.15)]),
            items: vec![
                ItemDefinition {
                    id: "energy_drink".to_string(),
                    name: "Energy Drink".to_string(),
                    description: "Restores 40 Energy points".to_string(),
                    rarity: "common".to_string(),
                    effect: [("energy".to_string(), 40)].into_iter().collect(),
                },
                ItemDefinition {
                    id: "first_aid_kit".to_string(),
                    name: "First Aid Kit".to_string(),
                    description: "Restores 30 HP points".to_string(),
                    rarity: "common".to_string(),
                    effect: [("hp".to_string(), 30)].into_iter().collect(),
                },
            ],
        }
    }
}
