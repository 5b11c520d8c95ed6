//! # Statbot - RPG Stat & Economy Engine for Chat Bots
//!
//! Statbot tracks per-player HP, energy, experience, level, coins, and
//! inventory for a chat-bot RPG, applies randomized combat and reward
//! mechanics driven by level-bucketed probability tables, enforces
//! per-action cooldowns, and persists everything across restarts as a
//! single JSON snapshot.
//!
//! ## Features
//!
//! - **Cooldown-Gated Actions**: Attack, exercise, search, and gacha rolls
//!   behind per-action time gates; checking never consumes a gate.
//! - **Probability Tables**: Level-anchored weighted-range outcome tables
//!   with deliberate sub-1.0 weight sums (the remainder is a miss).
//! - **Passive Regeneration**: Independent HP and energy cycles restore
//!   stats toward their caps on configurable intervals.
//! - **Durable Snapshots**: Write-new-then-rename persistence with file
//!   locking; corrupt snapshots self-heal to a fresh state at startup.
//! - **Typed Failures**: Every operation returns a structured result the
//!   command layer can map to user-facing messages.
//! - **Liveness Endpoints**: A lock-free HTTP surface for uptime monitors,
//!   with an optional self-probe loop.
//! - **Async Design**: Built with Tokio; one serialized store writer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use statbot::config::Config;
//! use statbot::engine::{PlayerStore, Rules, StatEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let rules = Rules::from_config(&config);
//!     let store = PlayerStore::open(config.storage.snapshot_path(), rules.caps)?;
//!     let engine = StatEngine::new(store, rules);
//!
//!     let report = engine.resolve_attack("alice", "bob").await?;
//!     println!("dealt {} damage", report.damage_dealt);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - Player store, combat, rewards, inventory, regeneration
//! - [`config`] - Configuration management and the default rule set
//! - [`keepalive`] - Liveness HTTP surface and self-probe loop
//! - [`metrics`] - Engine counters for monitoring
//! - [`validation`] - Player-id normalization
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Command Layer  │ ← external dispatcher (not this crate)
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   StatEngine    │ ← serialized operation surface
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   PlayerStore   │ ← single writer + JSON snapshot
//! └─────────────────┘
//! ```
//!
//! The regeneration cycles and the keepalive listener run as independent
//! tokio tasks; only the regeneration cycles touch the store.

pub mod config;
pub mod engine;
pub mod keepalive;
pub mod metrics;
pub mod validation;
