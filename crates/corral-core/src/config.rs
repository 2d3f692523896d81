//! Configuration loading and typed config structures for the Corral engine.
//!
//! The canonical configuration lives in `corral-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, a loader that reads and validates the file, and the immutable
//! [`CoordinationSettings`] snapshot the coordination engine actually runs
//! on. The engine never reads the config again after the snapshot is taken.

use std::collections::BTreeMap;
use std::path::Path;

use corral_types::{AgentId, AreaId, BlockPos, JobType};
use corral_world::World;
use serde::{Deserialize, Serialize};

use crate::area::Area;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed correctly but is outside its allowed range.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `corral-config.yaml`. Every field has a
/// default, so an empty document yields a working configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorralConfig {
    /// Run-level settings (name, seed, timing).
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Deferred scanner budget.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Claim timeout and post-release cooldown.
    #[serde(default)]
    pub claims: ClaimsConfig,

    /// Default search volume for newly registered areas.
    #[serde(default)]
    pub area: AreaConfig,

    /// Depositing behaviour.
    #[serde(default)]
    pub deposit: DepositConfig,

    /// Per-job overrides. Jobs without an entry use [`JobConfig::default`].
    #[serde(default)]
    pub jobs: BTreeMap<JobType, JobConfig>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CorralConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scanner.blocks_per_tick == 0 {
            return Err(invalid("scanner.blocks_per_tick", "must be at least 1"));
        }
        if self.claims.claim_timeout_ticks == 0 {
            return Err(invalid("claims.claim_timeout_ticks", "must be at least 1"));
        }
        check_radius("deposit.interaction_radius", self.deposit.interaction_radius)?;
        for (job, cfg) in &self.jobs {
            check_radius(
                &format!("jobs.{job}.interaction_radius"),
                cfg.interaction_radius,
            )?;
            if let Some(radius) = cfg.deposit_radius {
                check_radius(&format!("jobs.{job}.deposit_radius"), radius)?;
            }
            if cfg.workers.iter().any(|tag| tag.trim().is_empty()) {
                return Err(invalid(&format!("jobs.{job}.workers"), "tags must not be blank"));
            }
        }
        Ok(())
    }

    /// Settings for one job, falling back to defaults.
    pub fn job(&self, job: JobType) -> &JobConfig {
        self.jobs.get(&job).unwrap_or(&DEFAULT_JOB)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
}

fn check_radius(field: &str, radius: f64) -> Result<(), ConfigError> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite, non-negative number"))
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Human-readable run name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Random seed for the demo world.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks. 0 means run until interrupted.
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

/// Deferred scanner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Positions evaluated per area per tick.
    #[serde(default = "default_blocks_per_tick")]
    pub blocks_per_tick: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            blocks_per_tick: default_blocks_per_tick(),
        }
    }
}

/// Claim protocol timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsConfig {
    /// A claim older than this many ticks is force-released.
    #[serde(default = "default_claim_timeout_ticks")]
    pub claim_timeout_ticks: u64,

    /// A released position cannot be re-claimed for this many ticks.
    #[serde(default = "default_expired_target_timeout_ticks")]
    pub expired_target_timeout_ticks: u64,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            claim_timeout_ticks: default_claim_timeout_ticks(),
            expired_target_timeout_ticks: default_expired_target_timeout_ticks(),
        }
    }
}

/// Default search volume around an area origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Horizontal half-extent in blocks.
    #[serde(default = "default_search_radius")]
    pub search_radius: u32,

    /// Vertical half-extent in blocks.
    #[serde(default = "default_search_height")]
    pub search_height: u32,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            search_radius: default_search_radius(),
            search_height: default_search_height(),
        }
    }
}

/// Depositing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepositConfig {
    /// How close an agent must get to a destination before inserting.
    #[serde(default = "default_deposit_radius")]
    pub interaction_radius: f64,
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            interaction_radius: default_deposit_radius(),
        }
    }
}

/// Per-job configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Whether agents run this job at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How close an agent must get to a target before interacting.
    #[serde(default = "default_job_radius")]
    pub interaction_radius: f64,

    /// Minimum ticks between idle generations per agent.
    #[serde(default = "default_generation_cooldown_ticks")]
    pub generation_cooldown_ticks: u64,

    /// Deposit reach for this job's payloads. Falls back to
    /// `deposit.interaction_radius`.
    #[serde(default)]
    pub deposit_radius: Option<f64>,

    /// Agent tags allowed to run this job. An agent qualifies if it has any
    /// of them; an empty list admits every agent.
    #[serde(default)]
    pub workers: Vec<String>,
}

/// Settings of a job without an entry under `jobs`.
static DEFAULT_JOB: JobConfig = default_job();

impl Default for JobConfig {
    fn default() -> Self {
        default_job()
    }
}

impl JobConfig {
    /// Whether `agent` may run this job in `world`.
    pub fn admits<W: World + ?Sized>(&self, world: &W, agent: AgentId) -> bool {
        self.workers.is_empty() || self.workers.iter().any(|tag| world.agent_has_tag(agent, tag))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Coordination snapshot
// ---------------------------------------------------------------------------

/// Immutable view of the configuration used by the coordination engine.
///
/// Taken once from a [`CorralConfig`]; swap it wholesale between ticks
/// with `Dispatcher::reconfigure` to apply a reload.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinationSettings {
    /// Positions evaluated per area per tick.
    pub blocks_per_tick: u32,
    /// Claim force-release timeout in ticks.
    pub claim_timeout_ticks: u64,
    /// Post-release cooldown in ticks.
    pub expired_target_timeout_ticks: u64,
    /// Default horizontal half-extent of new areas.
    pub search_radius: u32,
    /// Default vertical half-extent of new areas.
    pub search_height: u32,
    /// Deposit interaction radius.
    pub deposit_radius: f64,
    /// Per-job settings; missing jobs use [`JobConfig::default`].
    pub jobs: BTreeMap<JobType, JobConfig>,
}

impl CoordinationSettings {
    /// Settings for one job, falling back to defaults.
    pub fn job(&self, job: JobType) -> &JobConfig {
        self.jobs.get(&job).unwrap_or(&DEFAULT_JOB)
    }

    /// How close an agent must get to a destination to deposit `job`'s
    /// payload.
    pub fn deposit_radius_for(&self, job: JobType) -> f64 {
        self.job(job).deposit_radius.unwrap_or(self.deposit_radius)
    }

    /// An area anchored at `origin` using the default search volume.
    pub const fn area_at(&self, origin: BlockPos) -> Area {
        Area::new(AreaId(origin), self.search_radius, self.search_height)
    }
}

impl Default for CoordinationSettings {
    fn default() -> Self {
        Self::from(&CorralConfig::default())
    }
}

impl From<&CorralConfig> for CoordinationSettings {
    fn from(config: &CorralConfig) -> Self {
        Self {
            blocks_per_tick: config.scanner.blocks_per_tick,
            claim_timeout_ticks: config.claims.claim_timeout_ticks,
            expired_target_timeout_ticks: config.claims.expired_target_timeout_ticks,
            search_radius: config.area.search_radius,
            search_height: config.area.search_height,
            deposit_radius: config.deposit.interaction_radius,
            jobs: config.jobs.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_name() -> String {
    "Corral".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_blocks_per_tick() -> u32 {
    15
}

const fn default_claim_timeout_ticks() -> u64 {
    140
}

const fn default_expired_target_timeout_ticks() -> u64 {
    300
}

const fn default_search_radius() -> u32 {
    8
}

const fn default_search_height() -> u32 {
    5
}

const fn default_deposit_radius() -> f64 {
    2.0
}

const fn default_true() -> bool {
    true
}

const fn default_job_radius() -> f64 {
    1.0
}

const fn default_generation_cooldown_ticks() -> u64 {
    2400
}

const fn default_job() -> JobConfig {
    JobConfig {
        enabled: true,
        interaction_radius: default_job_radius(),
        generation_cooldown_ticks: default_generation_cooldown_ticks(),
        deposit_radius: None,
        workers: Vec::new(),
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}
