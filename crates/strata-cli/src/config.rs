//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strata_llm::chat::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use strata_pipeline::PipelineConfig;

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "strata.toml";

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chunking, context and retry settings
    pub pipeline: PipelineConfig,

    /// Extraction model settings
    pub llm: LlmSettings,

    /// Graph store settings
    pub store: StoreSettings,

    /// Database container settings
    pub lifecycle: LifecycleSettings,
}

/// Extraction model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API
    pub api_base_url: String,

    /// Model name
    pub model: String,

    /// Sampling temperature; the service default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

/// Graph store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local SQLite file
    Sqlite,
    /// Neo4j over Bolt
    Neo4j,
}

/// Graph store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Which backend to write to
    pub backend: Backend,

    /// SQLite database file
    pub sqlite_path: PathBuf,

    /// Neo4j Bolt URI
    pub neo4j_uri: String,

    /// Neo4j user
    pub neo4j_user: String,

    /// Environment variable holding the Neo4j password
    pub neo4j_password_env: String,
}

/// Database container settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleSettings {
    /// Compose file that defines the database service
    pub compose_file: PathBuf,

    /// Name of the database container
    pub container_name: String,

    /// Health probes before giving up on `db start`
    pub health_attempts: u32,

    /// Seconds between health probes
    pub health_interval_secs: u64,
}

impl Config {
    /// Default per-user config file path.
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("strata").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `strata.toml` in the working
    /// directory is used, then the per-user file, then built-in defaults.
    /// Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => [Some(PathBuf::from(LOCAL_CONFIG_FILE)), Self::user_path()]
                .into_iter()
                .flatten()
                .find(|p| p.exists()),
        };

        let mut config = match path {
            Some(path) => {
                let contents = fs::read_to_string(&path).map_err(|e| {
                    CliError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&contents)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.pipeline.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Apply `NEO4J_URI`, `NEO4J_USER` and `NEO4J_CONTAINER_NAME` overrides.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.store.neo4j_uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.store.neo4j_user = user;
        }
        if let Some(name) = lookup("NEO4J_CONTAINER_NAME") {
            self.lifecycle.container_name = name;
        }
    }
}

/// Load `.env` from the working directory or a parent.
///
/// A missing file is fine; a file that cannot be parsed is a config error.
pub fn load_dotenv() -> Result<()> {
    dotenv_outcome(dotenvy::dotenv().map(|_| ()))
}

fn dotenv_outcome(result: std::result::Result<(), dotenvy::Error>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(CliError::Config(format!("invalid .env file: {}", e))),
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            sqlite_path: PathBuf::from("strata.db"),
            neo4j_uri: "bolt://localhost:7687".to_string(),
            neo4j_user: "neo4j".to_string(),
            neo4j_password_env: "NEO4J_PASSWORD".to_string(),
        }
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            compose_file: PathBuf::from("docker-compose.yml"),
            container_name: "neo4j".to_string(),
            health_attempts: 12,
            health_interval_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store.backend, Backend::Sqlite);
        assert_eq!(config.llm.model, "deepseek-chat");
        assert_eq!(config.lifecycle.health_attempts, 12);
        assert_eq!(config.pipeline.chunk_size, 1000);
    }

    #[test]
    fn test_sections_from_toml() {
        let config = Config::from_toml(
            r#"
            [pipeline]
            chunk_size = 400

            [llm]
            model = "deepseek-reasoner"
            temperature = 0.2

            [store]
            backend = "neo4j"
            neo4j_uri = "bolt://graph:7687"
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.chunk_size, 400);
        assert_eq!(config.pipeline.context_max_size, 15);
        assert_eq!(config.llm.model, "deepseek-reasoner");
        assert_eq!(config.llm.temperature, Some(0.2));
        assert_eq!(config.llm.api_key_env, "DEEPSEEK_API_KEY");
        assert_eq!(config.store.backend, Backend::Neo4j);
        assert_eq!(config.store.neo4j_uri, "bolt://graph:7687");
    }

    #[test]
    fn test_invalid_pipeline_section_rejected() {
        let result = Config::from_toml("[pipeline]\nextraction_max_attempts = 0\n");
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = Config::from_toml("[store]\nbackend = \"postgres\"\n");
        assert!(matches!(result, Err(CliError::Toml(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "NEO4J_URI" => Some("bolt://elsewhere:7687".to_string()),
            "NEO4J_CONTAINER_NAME" => Some("kg-neo4j".to_string()),
            _ => None,
        });

        assert_eq!(config.store.neo4j_uri, "bolt://elsewhere:7687");
        assert_eq!(config.store.neo4j_user, "neo4j");
        assert_eq!(config.lifecycle.container_name, "kg-neo4j");
    }

    #[test]
    fn test_explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[store]\nsqlite_path = \"/tmp/graph.db\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.store.sqlite_path, PathBuf::from("/tmp/graph.db"));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let result = Config::load(Some(Path::new("/no/such/strata.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let result = dotenv_outcome(dotenvy::from_path(dir.path().join(".env")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_malformed_dotenv_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "STRATA_BROKEN_ENTRY VALUE\n").unwrap();

        let result = dotenv_outcome(dotenvy::from_path(&path));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.starts_with("invalid .env file")));
    }

    #[test]
    fn test_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}
