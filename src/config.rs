use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::extract::SeedHints;
use crate::note::NoteSource;
use crate::search::{EngineConfig, Kind, Node, Normalizer};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub seeds: SeedsConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    pub report: ReportConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Relation lookup API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

fn default_api_key_env() -> String {
    "CENTRALA_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> usize {
    2
}

/// Search target and bounds
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub target: String,
    pub target_kind: Kind,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Never sent to the oracle (typically the target itself).
    #[serde(default)]
    pub exclude_from_query: Vec<String>,
    /// Only accept the target when seen in a place not mentioned in the seeds.
    #[serde(default)]
    pub require_new_location: bool,
    #[serde(default)]
    pub oracle_timeout_secs: Option<u64>,
}

fn default_max_steps() -> usize {
    500
}

/// Initial entities and extraction hints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedsConfig {
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub places: Vec<String>,
    #[serde(default)]
    pub known_people: Vec<String>,
    #[serde(default)]
    pub known_places: Vec<String>,
    pub note_url: Option<String>,
    pub note_path: Option<PathBuf>,
}

/// Extra spelling variants, `variant = "CANONICAL"`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizeConfig {
    #[serde(default)]
    pub variants: BTreeMap<String, String>,
}

/// Report sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub url: String,
    pub task: String,
}

/// Where snapshots go
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
        }
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in FRONTIER_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("FRONTIER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::from_path(&config_path)
    }

    /// Load and validate a specific config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: {}", self.api.base_url))?;

        if self.search.target.trim().is_empty() {
            anyhow::bail!("search.target must not be empty");
        }

        if self.search.max_steps == 0 {
            anyhow::bail!("search.max_steps must be greater than 0");
        }

        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than 0");
        }

        if self.seeds.note_url.is_some() && self.seeds.note_path.is_some() {
            anyhow::bail!("set at most one of seeds.note_url and seeds.note_path");
        }

        if self.report.task.trim().is_empty() {
            anyhow::bail!("report.task must not be empty");
        }

        self.normalizer()?;

        Ok(())
    }

    /// API key from the environment variable named in `api.api_key_env`.
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api.api_key_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                self.api.api_key_env
            )
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Default variants plus those from `[normalize.variants]`.
    pub fn normalizer(&self) -> Result<Normalizer> {
        Normalizer::default()
            .extended(
                self.normalize
                    .variants
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            )
            .map_err(|e| anyhow::anyhow!("normalize.variants: {}", e))
    }

    pub fn target(&self, normalizer: &Normalizer) -> Result<Node> {
        normalizer
            .node(&self.search.target)
            .with_context(|| format!("search.target '{}' normalizes to nothing", self.search.target))
    }

    pub fn engine_config(&self, normalizer: &Normalizer) -> EngineConfig {
        let exclude_from_query: BTreeSet<Node> = self
            .search
            .exclude_from_query
            .iter()
            .filter_map(|raw| normalizer.node(raw))
            .collect();
        EngineConfig {
            max_steps: self.search.max_steps,
            oracle_timeout: self.search.oracle_timeout_secs.map(Duration::from_secs),
            exclude_from_query,
        }
    }

    pub fn seed_hints(&self, normalizer: &Normalizer) -> SeedHints {
        SeedHints::new(normalizer, &self.seeds.known_people, &self.seeds.known_places)
    }

    /// Explicit seeds in scheduling order: people first, then places.
    pub fn explicit_seeds(&self) -> Vec<(Kind, String)> {
        self.seeds
            .people
            .iter()
            .map(|p| (Kind::Person, p.clone()))
            .chain(self.seeds.places.iter().map(|p| (Kind::Place, p.clone())))
            .collect()
    }

    pub fn note_source(&self) -> Option<NoteSource> {
        match (&self.seeds.note_url, &self.seeds.note_path) {
            (Some(url), _) => Some(NoteSource::Url(url.clone())),
            (None, Some(path)) => Some(NoteSource::Path(path.clone())),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const TEST_CONFIG: &str = r#"
[api]
base_url = "https://c3ntrala.ag3nts.org"
api_key_env = "FRONTIER_TEST_API_KEY"

[search]
target = "Barbara"
target_kind = "PERSON"
max_steps = 50
exclude_from_query = ["barbara"]
require_new_location = true
oracle_timeout_secs = 15

[seeds]
people = ["Rafał"]
places = ["Lublin"]
known_people = ["Barbara", "Aleksander"]
known_places = ["Kraków", "Warszawa"]
note_path = "barbara.txt"

[normalize]
variants = { Basia = "Barbara" }

[report]
url = "https://c3ntrala.ag3nts.org/report"
task = "loop"
"#;

    fn write_config(temp_dir: &TempDir, content: &str) -> PathBuf {
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_config_load_success() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, TEST_CONFIG);

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.search.target_kind, Kind::Person);
        assert_eq!(config.search.max_steps, 50);
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.output.results_dir, PathBuf::from("results"));
        assert_eq!(
            config.note_source(),
            Some(NoteSource::Path(PathBuf::from("barbara.txt")))
        );
    }

    #[test]
    fn test_derived_search_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_path(&write_config(&temp_dir, TEST_CONFIG)).unwrap();
        let normalizer = config.normalizer().unwrap();

        assert_eq!(config.target(&normalizer).unwrap().as_str(), "BARBARA");
        assert_eq!(normalizer.normalize("basia"), "BARBARA");

        let engine = config.engine_config(&normalizer);
        assert!(engine.exclude_from_query.contains(&normalizer.node("BARBARA").unwrap()));
        assert_eq!(engine.oracle_timeout, Some(Duration::from_secs(15)));

        let hints = config.seed_hints(&normalizer);
        assert!(hints.places.contains(&normalizer.node("KRAKOW").unwrap()));

        let seeds = config.explicit_seeds();
        assert_eq!(seeds[0], (Kind::Person, "Rafał".to_string()));
        assert_eq!(seeds[1], (Kind::Place, "Lublin".to_string()));
    }

    #[test]
    fn test_config_rejects_zero_max_steps() {
        let temp_dir = TempDir::new().unwrap();
        let content = TEST_CONFIG.replace("max_steps = 50", "max_steps = 0");
        let err = Config::from_path(&write_config(&temp_dir, &content)).unwrap_err();
        assert!(err.to_string().contains("max_steps"));
    }

    #[test]
    fn test_config_rejects_variant_cycle() {
        let temp_dir = TempDir::new().unwrap();
        let content = TEST_CONFIG.replace(
            "variants = { Basia = \"Barbara\" }",
            "variants = { Ala = \"Alicja\", Alicja = \"Ala\" }",
        );
        let err = Config::from_path(&write_config(&temp_dir, &content)).unwrap_err();
        assert!(err.to_string().contains("cycle"), "unexpected error: {}", err);
    }

    #[test]
    fn test_config_variant_overrides_default_canonical() {
        let temp_dir = TempDir::new().unwrap();
        let content = TEST_CONFIG.replace(
            "variants = { Basia = \"Barbara\" }",
            "variants = { Rafal = \"Rafael\" }",
        );
        let config = Config::from_path(&write_config(&temp_dir, &content)).unwrap();
        let normalizer = config.normalizer().unwrap();
        assert_eq!(normalizer.normalize("Rafał"), "RAFAEL");
        assert_eq!(normalizer.normalize("RAFAEL"), "RAFAEL");
    }

    #[test]
    fn test_config_rejects_unknown_kind() {
        let temp_dir = TempDir::new().unwrap();
        let content = TEST_CONFIG.replace("target_kind = \"PERSON\"", "target_kind = \"ANIMAL\"");
        assert!(Config::from_path(&write_config(&temp_dir, &content)).is_err());
    }

    #[test]
    fn test_config_missing_api_key() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_path(&write_config(&temp_dir, TEST_CONFIG)).unwrap();

        std::env::remove_var("FRONTIER_TEST_API_KEY");
        let err = config.api_key().unwrap_err();
        assert!(err.to_string().contains("FRONTIER_TEST_API_KEY"));

        std::env::set_var("FRONTIER_TEST_API_KEY", "test-key");
        assert_eq!(config.api_key().unwrap(), "test-key");
        std::env::remove_var("FRONTIER_TEST_API_KEY");
    }

    #[test]
    fn test_config_load_uses_env_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, TEST_CONFIG);
        let original = std::env::var("FRONTIER_CONFIG").ok();

        std::env::set_var("FRONTIER_CONFIG", &path);
        let config = Config::load();
        assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());

        std::env::set_var("FRONTIER_CONFIG", "nonexistent.toml");
        assert!(Config::load().is_err());

        std::env::remove_var("FRONTIER_CONFIG");
        if let Some(v) = original {
            std::env::set_var("FRONTIER_CONFIG", v);
        }
    }
}
