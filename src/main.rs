//! Binary entrypoint for the statbot CLI.
//!
//! Commands:
//! - `start` - run the engine service (regeneration cycles + keepalive)
//! - `init` - create a starter `config.toml` with the default rule set
//! - `status` - print a snapshot summary and metric counters
//!
//! See the library crate docs for module-level details: `statbot::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use statbot::config::Config;
use statbot::engine::{PlayerStore, Rules, StatEngine};
use statbot::{keepalive, metrics};

#[derive(Parser)]
#[command(name = "statbot")]
#[command(about = "A stateful RPG stat and economy engine for chat bots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the engine service
    Start,
    /// Initialize a new configuration file
    Init,
    /// Show engine status and statistics
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to configure logging (except for Init which writes it)
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            info!("Starting statbot v{}", env!("CARGO_PKG_VERSION"));

            let rules = Rules::from_config(&config);
            let store = PlayerStore::open(config.storage.snapshot_path(), rules.caps)?;
            info!(
                "Snapshot at {:?} loaded with {} players",
                store.path(),
                store.player_count()
            );
            let engine = StatEngine::new(store, rules);

            let _regen = statbot::engine::regen::spawn(engine.clone(), config.regen.clone());

            if config.keepalive.enabled {
                match keepalive::spawn_listener(config.keepalive.clone()).await {
                    Ok((addr, _handle)) => {
                        info!("Liveness endpoints available at http://{}/", addr);
                        #[cfg(feature = "probe")]
                        keepalive::spawn_probe(config.keepalive.clone());
                    }
                    Err(e) => {
                        // The engine can still run without the liveness
                        // surface; uptime monitors will notice.
                        warn!("Keepalive listener failed to start: {}", e);
                    }
                }
            }

            info!("Engine running; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            info!("Shutting down; persisting snapshot");
            if let Err(e) = engine.persist().await {
                warn!("Final persist failed: {}", e);
            }
        }
        Commands::Init => {
            info!("Initializing new statbot configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Status => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let rules = Rules::from_config(&config);
            let store = PlayerStore::open(config.storage.snapshot_path(), rules.caps)?;
            let snapshot = metrics::snapshot();
            println!("statbot v{}", env!("CARGO_PKG_VERSION"));
            println!("snapshot: {:?}", store.path());
            println!("players:  {}", store.player_count());
            println!("items:    {} catalog entries", rules.catalog.len());
            println!(
                "metrics:  {} attacks, {} exp grants, {} persist failures",
                snapshot.attacks_resolved, snapshot.exp_grants, snapshot.persist_failures
            );
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // Base level from CLI verbosity overrides config
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level.parse().unwrap_or(log::LevelFilter::Info))
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    if let Some(file) = config.as_ref().and_then(|c| c.logging.file.clone()) {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                // Only mirror to the console when attached to a terminal.
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        } else {
            builder.format(|fmt, record| {
                writeln!(
                    fmt,
                    "{} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.args()
                )
            });
        }
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
