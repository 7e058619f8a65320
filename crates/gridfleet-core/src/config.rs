//! Configuration loading and typed config structures for gridfleet runs.
//!
//! A run is described by `gridfleet.yaml` at the project root (or any file
//! named by `GRIDFLEET_CONFIG`). Every field has a default, so a partial or
//! even empty document is valid. [`EngineConfig`] is the plain parameter
//! struct the engine itself consumes; [`ScenarioConfig`] only feeds the
//! setup glue that builds the grid and the initial task set.

use std::path::Path;

use gridfleet_types::{
    AllocationPolicy, CollisionMode, RegionScheme, ReplanMode, ScenarioKind,
};
use serde::Deserialize;

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

    /// A value parsed but makes no sense.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// The offending field or environment variable.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level run configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Which scenario to build and how.
    #[serde(default)]
    pub scenario: ScenarioConfig,

    /// Engine parameters. When absent the scenario preset's own engine
    /// parameters are used; when present they replace them wholesale.
    #[serde(default)]
    pub engine: Option<EngineConfig>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `GRIDFLEET_SEED` overrides `scenario.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is rejected.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Environment overrides are not applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is rejected.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `GRIDFLEET_SEED` is set but is
    /// not an unsigned integer.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("GRIDFLEET_SEED") {
            let seed = val.trim().parse::<u64>().map_err(|err| ConfigError::Invalid {
                field: "GRIDFLEET_SEED",
                reason: format!("{err}"),
            })?;
            self.scenario.seed = Some(seed);
        }
        Ok(())
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scenario.validate()?;
        self.engine.as_ref().map_or(Ok(()), EngineConfig::validate)
    }
}

/// Scenario selection and overrides of the preset's own values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    /// Which of the ten presets to run.
    #[serde(default)]
    pub kind: ScenarioKind,

    /// Seed for map and task generation; absent means the preset's seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Fleet size override.
    #[serde(default)]
    pub agents: Option<u32>,

    /// Grid height override.
    #[serde(default)]
    pub height: Option<u32>,

    /// Grid width override.
    #[serde(default)]
    pub width: Option<u32>,

    /// Fraction of cells turned into walls, in `[0, 1)`.
    #[serde(default)]
    pub obstacle_density: Option<f64>,

    /// Initial task count override.
    #[serde(default)]
    pub task_count: Option<u32>,
}

impl ScenarioConfig {
    /// Reject overrides no preset could honour.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents == Some(0) {
            return Err(ConfigError::Invalid {
                field: "scenario.agents",
                reason: "a fleet needs at least one agent".to_owned(),
            });
        }
        if self.height == Some(0) || self.width == Some(0) {
            return Err(ConfigError::Invalid {
                field: "scenario.height/width",
                reason: "grid dimensions must be positive".to_owned(),
            });
        }
        if let Some(density) = self
            .obstacle_density
            .filter(|density| !(0.0..1.0).contains(density))
        {
            return Err(ConfigError::Invalid {
                field: "scenario.obstacle_density",
                reason: format!("{density} is outside [0, 1)"),
            });
        }
        Ok(())
    }
}

/// Parameters the engine is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// How idle agents pick tasks.
    #[serde(default)]
    pub allocation: AllocationPolicy,

    /// Partition used by the regioned policy.
    #[serde(default)]
    pub region_scheme: RegionScheme,

    /// When agents recompute their routes.
    #[serde(default)]
    pub replan_mode: ReplanMode,

    /// Whether agents avoid each other during the run.
    #[serde(default)]
    pub collision_mode: CollisionMode,

    /// Step budget; the run stops once this many ticks have executed.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Ticks an agent ignores a task after failing to find a route to it.
    #[serde(default = "default_unreachable_retry_ticks")]
    pub unreachable_retry_ticks: u64,

    /// Cap on per-agent trail length; absent means unbounded.
    #[serde(default)]
    pub history_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allocation: AllocationPolicy::default(),
            region_scheme: RegionScheme::default(),
            replan_mode: ReplanMode::default(),
            collision_mode: CollisionMode::default(),
            max_ticks: default_max_ticks(),
            unreachable_retry_ticks: default_unreachable_retry_ticks(),
            history_limit: None,
        }
    }
}

impl EngineConfig {
    /// Reject nonsensical values.
    ///
    /// A zero step budget and a zero retry cooldown are both allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `history_limit` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == Some(0) {
            return Err(ConfigError::Invalid {
                field: "engine.history_limit",
                reason: "must be at least 1; omit it for an unbounded trail".to_owned(),
            });
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is
    /// not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_max_ticks() -> u64 {
    500
}

const fn default_unreachable_retry_ticks() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.scenario.seed, None);
        assert_eq!(config.engine, None);
        let engine = EngineConfig::default();
        assert_eq!(engine.max_ticks, 500);
        assert_eq!(engine.unreachable_retry_ticks, 10);
        assert_eq!(engine.history_limit, None);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
scenario:
  kind: rescue
  seed: 7
  agents: 5
  height: 20
  width: 24
  obstacle_density: 0.2
  task_count: 9

engine:
  allocation: claim_with_conflict_resolution
  region_scheme: parity
  replan_mode: on_every_tick_toward_pool
  collision_mode: inline
  max_ticks: 300
  unreachable_retry_ticks: 4
  history_limit: 32

logging:
  level: "debug"
  json: true
"#;

        let config = SimulationConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.scenario.kind, ScenarioKind::Rescue);
        assert_eq!(config.scenario.seed, Some(7));
        assert_eq!(config.scenario.agents, Some(5));
        assert_eq!(config.scenario.task_count, Some(9));
        let engine = config.engine.unwrap_or_default();
        assert_eq!(engine.allocation, AllocationPolicy::ClaimWithConflictResolution);
        assert_eq!(engine.region_scheme, RegionScheme::Parity);
        assert_eq!(engine.replan_mode, ReplanMode::OnEveryTickTowardPoolAsGoalSet);
        assert_eq!(engine.collision_mode, CollisionMode::Inline);
        assert_eq!(engine.max_ticks, 300);
        assert_eq!(engine.unreachable_retry_ticks, 4);
        assert_eq!(engine.history_limit, Some(32));
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SimulationConfig::parse("engine:\n  max_ticks: 12\n");
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        let engine = config.engine.unwrap_or_default();
        assert_eq!(engine.max_ticks, 12);
        // Everything else uses defaults
        assert_eq!(engine.allocation, AllocationPolicy::GreedyNearest);
        assert_eq!(config.scenario.kind, ScenarioKind::Cleaning);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(SimulationConfig::parse("").is_ok());
    }

    #[test]
    fn zero_history_limit_is_rejected() {
        let result = SimulationConfig::parse("engine:\n  history_limit: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { field: "engine.history_limit", .. })));
    }

    #[test]
    fn bad_density_is_rejected() {
        let result = SimulationConfig::parse("scenario:\n  obstacle_density: 1.5\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn unknown_policy_is_a_yaml_error() {
        let result = SimulationConfig::parse("engine:\n  allocation: telepathy\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("gridfleet.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
