//! Configuration loading and typed config structures.
//!
//! The configuration lives in `tribal-config.yaml` next to the server
//! binary. Every field has a default, so an empty or missing file yields a
//! working two-tribe world that rejects overflow entrants.
//!
//! Environment variables override the YAML values for deployment:
//! - `TRIBAL_DATA_DIR` overrides `persistence.data_dir`
//! - `TRIBAL_LOG` overrides `logging.level`

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tribal_world::starting_world::{DEFAULT_SLOTS_PER_CATEGORY, DEFAULT_TRIBE_NAMES};
use tribal_world::{
    BirthPlacePolicy, CategoryDraw, DEFAULT_CATEGORY_SALT, DEFAULT_MAX_POPULATION, NoBirthPlaces,
    PopulationCap, StartingWorld,
};

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
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TribalConfig {
    /// World name and starting tribes.
    #[serde(default)]
    pub world: WorldConfig,

    /// Admission policy knobs.
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Where and how often the game is saved.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Log level and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TribalConfig {
    /// Load configuration from a YAML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("TRIBAL_DATA_DIR") {
            self.persistence.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("TRIBAL_LOG") {
            self.logging.level = level;
        }
    }

    /// Genesis parameters for a fresh world.
    pub fn starting_world(&self) -> StartingWorld {
        StartingWorld {
            tribe_names: self.world.tribes.clone(),
            slots_per_category: self.world.slots_per_category,
        }
    }

    /// Fallback category draw with the configured salt.
    pub const fn category_draw(&self) -> CategoryDraw {
        CategoryDraw::new(self.admission.category_salt)
    }

    /// Overflow policy selected by `admission.birth_places`.
    pub fn birth_place_policy(&self) -> Box<dyn BirthPlacePolicy> {
        match self.admission.birth_places {
            BirthPlaceMode::None => Box::new(NoBirthPlaces),
            BirthPlaceMode::PopulationCap => {
                Box::new(PopulationCap::new(self.admission.max_population))
            }
        }
    }

    /// Full path of the persisted game file.
    pub fn game_file_path(&self) -> PathBuf {
        self.persistence.data_dir.join(&self.persistence.file_name)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Server name used in welcome messages.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Starting tribe names, in fill order.
    #[serde(default = "default_tribes")]
    pub tribes: Vec<String>,

    /// Slots per category in every starting tribe.
    #[serde(default = "default_slots_per_category")]
    pub slots_per_category: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            tribes: default_tribes(),
            slots_per_category: default_slots_per_category(),
        }
    }
}

/// How overflow entrants are handled after every tribe fills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirthPlaceMode {
    /// Reject everyone.
    #[default]
    None,
    /// Admit without a tribe while the population is under `max_population`.
    PopulationCap,
}

/// Admission policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdmissionConfig {
    /// Salt for the deterministic category draw.
    #[serde(default = "default_category_salt")]
    pub category_salt: u64,

    /// Overflow policy.
    #[serde(default)]
    pub birth_places: BirthPlaceMode,

    /// Population ceiling for [`BirthPlaceMode::PopulationCap`].
    #[serde(default = "default_max_population")]
    pub max_population: u32,

    /// Where rejected players are sent to queue.
    #[serde(default = "default_queue_url")]
    pub queue_url: String,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            category_salt: default_category_salt(),
            birth_places: BirthPlaceMode::default(),
            max_population: default_max_population(),
            queue_url: default_queue_url(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding the game file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Well-known file name of the persisted game.
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Seconds between periodic saves.
    #[serde(default = "default_save_interval_secs")]
    pub save_interval_secs: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_name: default_file_name(),
            save_interval_secs: default_save_interval_secs(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Rust Tribal".to_owned()
}

fn default_tribes() -> Vec<String> {
    DEFAULT_TRIBE_NAMES.iter().map(|&n| n.to_owned()).collect()
}

const fn default_slots_per_category() -> u32 {
    DEFAULT_SLOTS_PER_CATEGORY
}

const fn default_category_salt() -> u64 {
    DEFAULT_CATEGORY_SALT
}

const fn default_max_population() -> u32 {
    DEFAULT_MAX_POPULATION
}

fn default_queue_url() -> String {
    "RustTribal.com".to_owned()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_file_name() -> String {
    "tribal_game_data.json".to_owned()
}

const fn default_save_interval_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use tribal_types::PersonId;
    use tribal_world::WorldState;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TribalConfig::default();
        assert_eq!(config.world.name, "Rust Tribal");
        assert_eq!(config.world.tribes, vec!["Alpha", "Bravo"]);
        assert_eq!(config.world.slots_per_category, 2);
        assert_eq!(config.admission.category_salt, 0x10EC);
        assert_eq!(config.admission.birth_places, BirthPlaceMode::None);
        assert_eq!(config.persistence.save_interval_secs, 300);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "Test Isle"
  tribes: [Wolves, Ravens, Bears]
  slots_per_category: 3

admission:
  category_salt: 99
  birth_places: population_cap
  max_population: 12
  queue_url: "example.org/queue"

persistence:
  data_dir: "/var/lib/tribal"
  file_name: "world.json"
  save_interval_secs: 60

logging:
  level: "debug"
  format: json
"#;
        let config = TribalConfig::parse(yaml).unwrap();
        assert_eq!(config.world.name, "Test Isle");
        assert_eq!(config.world.tribes.len(), 3);
        assert_eq!(config.starting_world().slots_per_category, 3);
        assert_eq!(config.category_draw().salt(), 99);
        assert_eq!(config.admission.birth_places, BirthPlaceMode::PopulationCap);
        assert_eq!(config.admission.queue_url, "example.org/queue");
        assert_eq!(
            config.game_file_path(),
            PathBuf::from("/var/lib/tribal/world.json")
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = TribalConfig::parse("world:\n  name: Solo\n").unwrap();
        assert_eq!(config.world.name, "Solo");
        assert_eq!(config.world.tribes, vec!["Alpha", "Bravo"]);
        assert_eq!(config.admission.max_population, 50);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(TribalConfig::parse("").is_ok());
    }

    #[test]
    fn parse_rejects_unknown_birth_place_mode() {
        assert!(TribalConfig::parse("admission:\n  birth_places: lottery\n").is_err());
    }

    #[test]
    fn overrides_replace_data_dir_and_level() {
        let mut env = BTreeMap::new();
        env.insert("TRIBAL_DATA_DIR", "/tmp/tribal");
        env.insert("TRIBAL_LOG", "trace");

        let mut config = TribalConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| (*v).to_owned()));
        assert_eq!(config.persistence.data_dir, PathBuf::from("/tmp/tribal"));
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn birth_place_policy_follows_mode() {
        let mut config = TribalConfig::default();
        let world = WorldState::new(Vec::new());
        assert!(
            !config
                .birth_place_policy()
                .is_birth_place_available(&world, PersonId(1))
        );

        config.admission.birth_places = BirthPlaceMode::PopulationCap;
        config.admission.max_population = 1;
        assert!(
            config
                .birth_place_policy()
                .is_birth_place_available(&world, PersonId(1))
        );
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("tribal-config.yaml");
        if path.exists() {
            let config = TribalConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
