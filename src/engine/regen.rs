//! Passive regeneration: two independently-timed background cycles that
//! nudge every player's HP and energy back toward the caps.
//!
//! Each cycle runs on its own tokio interval. Missed ticks are not caught
//! up: time the process did not observe is time not credited.

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::config::RegenConfig;
use crate::engine::types::StatField;
use crate::engine::StatEngine;
use crate::metrics;

/// Spawn the HP and energy regeneration cycles. The returned handles live
/// until process shutdown; there is no mid-cycle cancellation.
pub fn spawn(engine: StatEngine, config: RegenConfig) -> Vec<JoinHandle<()>> {
    log::info!(
        "Starting regeneration cycles: hp +{}/{}s, energy +{}/{}s",
        config.hp_rate,
        config.hp_interval_seconds,
        config.energy_rate,
        config.energy_interval_seconds
    );
    vec![
        spawn_cycle(
            engine.clone(),
            StatField::Hp,
            config.hp_rate,
            config.hp_interval_seconds,
        ),
        spawn_cycle(
            engine,
            StatField::Energy,
            config.energy_rate,
            config.energy_interval_seconds,
        ),
    ]
}

fn spawn_cycle(
    engine: StatEngine,
    field: StatField,
    rate: i64,
    interval_seconds: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(interval_seconds);
        // First tick fires one full period after startup, not immediately.
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let raised = engine.regen_cycle(field, rate).await;
            match field {
                StatField::Hp => metrics::inc_regen_hp_cycles(),
                StatField::Energy => metrics::inc_regen_energy_cycles(),
                _ => {}
            }
            log::debug!(
                "{} regeneration cycle completed, {} players raised",
                field.name(),
                raised
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::PlayerStore;
    use crate::engine::Rules;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;
    use tokio::time::{advance, pause};

    fn engine(dir: &TempDir) -> StatEngine {
        let rules = Rules::default_rules();
        let store =
            PlayerStore::open(dir.path().join("rpg_state.json"), rules.caps).expect("store");
        StatEngine::with_rng(store, rules, StdRng::seed_from_u64(0))
    }

    #[tokio::test]
    async fn cycles_fire_on_their_own_periods() {
        pause();
        let dir = TempDir::new().expect("tempdir");
        let engine = engine(&dir);
        engine.update_stat("alice", "hp", 10).await.expect("hp");
        engine
            .update_stat("alice", "energy", 10)
            .await
            .expect("energy");

        let handles = spawn(
            engine.clone(),
            RegenConfig {
                hp_rate: 2,
                hp_interval_seconds: 300,
                energy_rate: 2,
                energy_interval_seconds: 180,
            },
        );

        // Nothing regenerates before the first period elapses.
        advance(Duration::from_secs(179)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        let players = engine.all_players().await;
        assert_eq!(players["alice"].hp, 10);
        assert_eq!(players["alice"].energy, 10);

        // At 180s the energy cycle has fired once; HP has not.
        advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        let players = engine.all_players().await;
        assert_eq!(players["alice"].energy, 12);
        assert_eq!(players["alice"].hp, 10);

        // At 301s the HP cycle has fired once.
        advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        let players = engine.all_players().await;
        assert_eq!(players["alice"].hp, 12);

        for handle in handles {
            handle.abort();
        }
    }
}
