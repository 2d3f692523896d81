//! Demo engine for the Corral coordination core.
//!
//! Builds a seeded demo world, registers the example jobs, and drives the
//! dispatcher from a timed tick loop until `max_ticks` is reached or the
//! process receives Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `corral-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the `demo` section of the same file
//! 4. Build the simulation (world, jobs, area, agents)
//! 5. Run the tick loop
//! 6. Log the totals

mod demo;
mod error;
mod jobs;
mod sim;

use std::path::Path;
use std::time::Duration;

use corral_core::CorralConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::demo::DemoConfig;
use crate::error::EngineError;
use crate::sim::Simulation;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "corral-config.yaml";

/// Ticks between progress log lines.
const SUMMARY_EVERY: u64 = 200;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the world refuses an
/// operation during setup or the loop.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so report afterwards.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("corral-engine starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        name = %config.simulation.name,
        seed = config.simulation.seed,
        tick_interval_ms = config.simulation.tick_interval_ms,
        max_ticks = config.simulation.max_ticks,
        blocks_per_tick = config.scanner.blocks_per_tick,
        claim_timeout_ticks = config.claims.claim_timeout_ticks,
        "Configuration loaded"
    );

    // 3. Demo layout.
    let demo_config = load_demo_config()?;

    // 4. Build the simulation.
    let mut sim = Simulation::new(&config, &demo_config)?;

    // 5. Run.
    run(&mut sim, &config).await?;

    // 6. Totals.
    let totals = sim.totals();
    info!(
        ticks = totals.ticks,
        collected = totals.collected,
        deposited = totals.deposited,
        dropped = totals.dropped,
        stored = sim.stored_items(),
        carried = sim.carried_items(),
        "corral-engine shutdown complete"
    );
    Ok(())
}

/// Tick until `max_ticks` (if non-zero) or Ctrl-C.
async fn run(sim: &mut Simulation, config: &CorralConfig) -> Result<(), EngineError> {
    let max_ticks = config.simulation.max_ticks;
    let mut interval =
        tokio::time::interval(Duration::from_millis(config.simulation.tick_interval_ms.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(area = %sim.area(), max_ticks, "Entering tick loop");
    loop {
        if max_ticks > 0 && sim.totals().ticks >= max_ticks {
            info!(max_ticks, "Tick limit reached");
            return Ok(());
        }

        tokio::select! {
            _ = interval.tick() => {}
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                info!("Interrupted");
                return Ok(());
            }
        }

        let summary = sim.step()?;
        if summary.tick.checked_rem(SUMMARY_EVERY) == Some(0) {
            let outcomes = serde_json::to_string(&summary.outcomes).unwrap_or_default();
            info!(
                tick = summary.tick,
                scanned = summary.positions_scanned,
                steps = summary.steps,
                %outcomes,
                stored = sim.stored_items(),
                dropped = sim.dropped_items(),
                "Tick summary"
            );
        }
    }
}

/// Load the main configuration from `corral-config.yaml`.
///
/// Returns whether the file existed alongside the config.
fn load_config() -> Result<(CorralConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((CorralConfig::from_file(config_path)?, true))
    } else {
        Ok((CorralConfig::default(), false))
    }
}

/// Load the demo layout from the `demo` section of `corral-config.yaml`.
///
/// If the file does not exist or lacks the `demo` key, defaults are used.
fn load_demo_config() -> Result<DemoConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if !config_path.exists() {
        return Ok(DemoConfig::default());
    }
    let contents = std::fs::read_to_string(config_path).map_err(|e| EngineError::Demo {
        message: format!("failed to read config file: {e}"),
    })?;

    // Parse the full YAML and extract just the "demo" section.
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Demo {
        message: format!("failed to parse config YAML: {e}"),
    })?;

    match raw.get("demo") {
        Some(value) => serde_yml::from_value(value.clone()).map_err(|e| EngineError::Demo {
            message: format!("failed to parse demo config: {e}"),
        }),
        None => Ok(DemoConfig::default()),
    }
}
