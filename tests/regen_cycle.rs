/// Integration tests for the passive regeneration cycles
use tempfile::TempDir;

use statbot::config::RegenConfig;
use statbot::engine::{regen, PlayerStore, Rules, StatEngine, StatField};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::{advance, pause, Duration};

fn engine_at(dir: &TempDir, seed: u64) -> StatEngine {
    let rules = Rules::default_rules();
    let store = PlayerStore::open(dir.path().join("rpg_state.json"), rules.caps).expect("store");
    StatEngine::with_rng(store, rules, StdRng::seed_from_u64(seed))
}

#[tokio::test]
async fn cycle_skips_full_players_and_clamps_the_rest() {
    let dir = TempDir::new().expect("tempdir");
    let engine = engine_at(&dir, 1);

    engine.get_or_create("full").await.expect("create");
    engine.update_stat("edge", "hp", 99).await.expect("hp");
    engine.update_stat("low", "hp", 40).await.expect("hp");

    let raised = engine.regen_cycle(StatField::Hp, 2).await;
    assert_eq!(raised, 2, "only players below cap are touched");

    let players = engine.all_players().await;
    assert_eq!(players["full"].hp, 100);
    assert_eq!(players["edge"].hp, 100, "99 + 2 clamps to exactly the cap");
    assert_eq!(players["low"].hp, 42);
}

#[tokio::test]
async fn hp_and_energy_cycles_are_independent() {
    pause();
    let dir = TempDir::new().expect("tempdir");
    let engine = engine_at(&dir, 2);
    engine.update_stat("alice", "hp", 0).await.expect("hp");
    engine.update_stat("alice", "energy", 0).await.expect("energy");

    let handles = regen::spawn(
        engine.clone(),
        RegenConfig {
            hp_rate: 5,
            hp_interval_seconds: 100,
            energy_rate: 3,
            energy_interval_seconds: 40,
        },
    );

    // 130 simulated seconds in small steps so every scheduled tick fires
    // on time: energy at 40, 80, 120; hp at 100.
    for _ in 0..13 {
        advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }

    let players = engine.all_players().await;
    assert_eq!(players["alice"].energy, 9);
    assert_eq!(players["alice"].hp, 5);

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn regenerated_state_is_persisted() {
    let dir = TempDir::new().expect("tempdir");
    {
        let engine = engine_at(&dir, 3);
        engine.update_stat("bob", "energy", 10).await.expect("energy");
        engine.regen_cycle(StatField::Energy, 2).await;
    }
    let engine = engine_at(&dir, 4);
    assert_eq!(engine.all_players().await["bob"].energy, 12);
}
