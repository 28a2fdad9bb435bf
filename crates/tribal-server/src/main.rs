//! Server binary for the Tribal admission controller.
//!
//! Wires the configuration, the persisted game and the admission gateway
//! into the host hooks, then serves host events from stdin until `quit`,
//! end of input, or ctrl-c.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tribal-config.yaml` (defaults if missing)
//! 2. Initialize structured logging (tracing)
//! 3. Load the saved game, or create a fresh world
//! 4. Save once so the world exists on disk
//! 5. Serve console events with a periodic save timer
//! 6. Save on shutdown

mod console;
mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tribal_core::config::{LogFormat, LoggingConfig};
use tribal_core::{
    AdmissionGateway, GameState, GameStore, Hooks, JsonFileStore, SharedGame, TribalConfig,
};

use crate::console::HostEvent;
use crate::error::ServerError;

/// Config file looked up in the working directory.
const CONFIG_FILE: &str = "tribal-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = Path::new(CONFIG_FILE);
    let config = load_config(config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        config_file = %config_path.display(),
        found = config_path.exists(),
        world_name = config.world.name,
        tribes = config.world.tribes.len(),
        birth_places = ?config.admission.birth_places,
        "tribal-server starting"
    );

    // 3. Load or create the game.
    let file_store = JsonFileStore::new(config.game_file_path());
    let game = GameState::load_or_create(&file_store, &config.starting_world())
        .map_err(ServerError::from)?;
    info!(game_id = %game.game_id(), path = %file_store.path().display(), "Game ready");
    let store: Arc<dyn GameStore> = Arc::new(file_store);

    let hooks = Hooks::new(
        Arc::new(SharedGame::new(game)),
        Arc::new(AdmissionGateway::from_config(&config)),
        store,
    );

    // 4. Persist the initial state.
    hooks.on_startup();

    // 5. Serve until quit.
    let interval = Duration::from_secs(config.persistence.save_interval_secs.max(1));
    serve(
        &hooks,
        interval,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        tokio::signal::ctrl_c(),
    )
    .await?;

    // 6. Final save.
    let saved = hooks.on_shutdown();
    info!(saved = saved, "tribal-server stopped");
    Ok(())
}

/// Load configuration, falling back to defaults when the file is missing.
/// Environment overrides apply either way.
fn load_config(path: &Path) -> Result<TribalConfig, ServerError> {
    if path.exists() {
        Ok(TribalConfig::from_file(path)?)
    } else {
        let mut config = TribalConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Read console events from `input` and run periodic saves until quit,
/// end of input, or `shutdown` completes. Replies go to `output`.
async fn serve<R, W>(
    hooks: &Hooks,
    interval: Duration,
    input: R,
    mut output: W,
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; startup already saved.
    ticker.tick().await;
    tokio::pin!(shutdown);

    info!(save_interval_secs = interval.as_secs(), "Serving console events");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Console input closed");
                    break;
                };
                let reply = match console::parse(&line) {
                    Ok(None) => None,
                    Ok(Some(HostEvent::Quit)) => {
                        info!("Quit requested");
                        break;
                    }
                    Ok(Some(event)) => console::dispatch(hooks, event),
                    Err(e) => {
                        warn!(line = %line, error = %e, "Unparseable console line");
                        Some(e.to_string())
                    }
                };
                if let Some(reply) = reply {
                    output.write_all(reply.as_bytes()).await?;
                    output.write_all(b"\n").await?;
                    output.flush().await?;
                }
            }
            _ = ticker.tick() => {
                let hooks = hooks.clone();
                let saved = tokio::task::spawn_blocking(move || hooks.on_periodic_save()).await;
                if let Err(e) = saved {
                    warn!(error = %e, "Periodic save task failed");
                }
            }
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    warn!(error = %e, "Shutdown signal failed, stopping anyway");
                }
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
