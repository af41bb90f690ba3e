use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::import::ResultOrdering;

pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_POLL_MIN_INTERVAL_MS: u64 = 200;
pub const DEFAULT_POLL_MAX_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ImporterConfig {
    pub paths: PathsSection,
    #[serde(default)]
    pub batch: BatchSection,
    #[serde(default)]
    pub poll: PollSection,
    pub api: ApiSection,
}

impl ImporterConfig {
    pub fn resolve_path<P: AsRef<Path>>(&self, candidate: P) -> PathBuf {
        let path = candidate.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.paths.base_dir).join(path)
        }
    }

    pub fn input_path(&self) -> PathBuf {
        self.resolve_path(&self.paths.input)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.resolve_path(&self.paths.checkpoint)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.size == 0 {
            return Err(ConfigError::Invalid {
                field: "batch.size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.poll.min_interval_ms >= self.poll.max_interval_ms {
            return Err(ConfigError::Invalid {
                field: "poll.min_interval_ms",
                reason: format!(
                    "must be lower than poll.max_interval_ms ({} >= {})",
                    self.poll.min_interval_ms, self.poll.max_interval_ms
                ),
            });
        }
        if self.poll.item_deadline_seconds == Some(0) {
            return Err(ConfigError::Invalid {
                field: "poll.item_deadline_seconds",
                reason: "omit the key to disable the deadline".to_string(),
            });
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "api.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    pub base_dir: String,
    pub input: String,
    pub checkpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSection {
    #[serde(default = "default_batch_size")]
    pub size: usize,
    #[serde(default)]
    pub ordering: ResultOrdering,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            size: DEFAULT_BATCH_SIZE,
            ordering: ResultOrdering::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollSection {
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,
    #[serde(default = "default_max_interval")]
    pub max_interval_ms: u64,
    /// Per-item ceiling on polling time. Absent means poll until terminal.
    #[serde(default)]
    pub item_deadline_seconds: Option<u64>,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_POLL_MIN_INTERVAL_MS,
            max_interval_ms: DEFAULT_POLL_MAX_INTERVAL_MS,
            item_deadline_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    pub base_url: String,
    pub api_key_env: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_min_interval() -> u64 {
    DEFAULT_POLL_MIN_INTERVAL_MS
}

fn default_max_interval() -> u64 {
    DEFAULT_POLL_MAX_INTERVAL_MS
}

fn default_request_timeout() -> u64 {
    30
}

pub fn load_importer_config<P: AsRef<Path>>(path: P) -> Result<ImporterConfig> {
    let config: ImporterConfig = load_toml(path)?;
    config.validate()?;
    Ok(config)
}

fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ImporterConfig {
        toml::from_str(raw).expect("config should parse")
    }

    #[test]
    fn load_fixture_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../configs/importer.toml");
        let config = load_importer_config(path).expect("fixture should parse");
        assert_eq!(config.batch.size, 20);
        assert_eq!(config.batch.ordering, ResultOrdering::Input);
        assert_eq!(config.poll.min_interval_ms, 200);
        assert_eq!(config.poll.max_interval_ms, 500);
        assert!(config.poll.item_deadline_seconds.is_none());
        assert_eq!(config.api.api_key_env, "LIVEPEER_STUDIO_API_KEY");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = parse(
            r#"
            [paths]
            base_dir = "/srv/import"
            input = "output.json"
            checkpoint = "/var/lib/results.json"

            [api]
            base_url = "https://livepeer.studio/api"
            api_key_env = "KEY"
            "#,
        );
        assert_eq!(config.batch.size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.api.request_timeout_seconds, 30);
        assert_eq!(
            config.input_path(),
            PathBuf::from("/srv/import/output.json")
        );
        assert_eq!(
            config.checkpoint_path(),
            PathBuf::from("/var/lib/results.json")
        );
        config.validate().unwrap();
    }

    #[test]
    fn validation_rejects_zero_batch_and_inverted_jitter() {
        let mut config = parse(
            r#"
            [paths]
            base_dir = "."
            input = "in.json"
            checkpoint = "out.json"

            [batch]
            size = 0

            [api]
            base_url = "http://localhost"
            api_key_env = "KEY"
            "#,
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "batch.size",
                ..
            })
        ));

        config.batch.size = 5;
        config.poll.min_interval_ms = 500;
        config.poll.max_interval_ms = 200;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "poll.min_interval_ms",
                ..
            })
        ));
    }
}
