//! Engine configuration, read from `CLANK_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Service identity and filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// `dev` enables debug logging and detailed error bodies.
    pub environment: String,
    pub name: String,
    pub release: String,
    /// Upper bound for draining in-flight requests on shutdown.
    pub graceful_timeout: Duration,
    /// Model files (ranker weights, tokenizers).
    pub resources_path: PathBuf,
    /// Few-shot prompt artifacts, one JSON file per signature.
    pub artifacts_path: PathBuf,
}

impl ServiceConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "dev"
    }
}

/// HTTP listener address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Language-model backend selection and provider credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LmConfig {
    /// Backend key, e.g. `openai/gpt-4o`.
    pub backend: String,
    pub max_tokens: usize,
    pub temperature: f64,
    /// Total HTTP attempts per model call.
    pub attempts: usize,
    pub timeout: Duration,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub groq_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub anyscale_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub fireworks_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub server: ServerConfig,
    pub lm: LmConfig,
}

impl Config {
    /// Create configuration from the process environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset, so `CLANK_ENGINE_PORT=` falls back
    /// to the default instead of failing to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            service: ServiceConfig {
                environment: get("CLANK_ENVIRONMENT").unwrap_or_else(|| "dev".into()),
                name: "engine".into(),
                release: get("CLANK_RELEASE").unwrap_or_else(|| "wip".into()),
                graceful_timeout: Duration::from_secs(30),
                resources_path: get("CLANK_ENGINE_RESOURCES_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("resources")),
                artifacts_path: get("CLANK_ENGINE_ARTIFACTS_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("artifacts")),
            },
            server: ServerConfig {
                host: get("CLANK_ENGINE_HOST").unwrap_or_else(|| "localhost".into()),
                port: parse_or("CLANK_ENGINE_PORT", get("CLANK_ENGINE_PORT"), 2222)?,
            },
            lm: LmConfig {
                backend: get("CLANK_ENGINE_LM_BACKEND").unwrap_or_default(),
                max_tokens: 1024,
                temperature: 0.7,
                attempts: 3,
                timeout: Duration::from_secs(59),
                openai_api_key: get("CLANK_OPENAI_API_KEY"),
                groq_api_key: get("CLANK_GROQ_API_KEY"),
                anyscale_api_key: get("CLANK_ANYSCALE_API_KEY"),
                fireworks_api_key: get("CLANK_FIREWORKS_API_KEY"),
                anthropic_api_key: get("CLANK_ANTHROPIC_API_KEY"),
            },
        })
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} is not a valid value: {:?}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.service.environment, "dev");
        assert!(config.service.is_development());
        assert_eq!(config.server.port, 2222);
        assert_eq!(config.bind_address(), "localhost:2222");
        assert_eq!(config.lm.max_tokens, 1024);
        assert_eq!(config.lm.attempts, 3);
        assert!(config.lm.openai_api_key.is_none());
        assert_eq!(config.service.graceful_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CLANK_ENVIRONMENT", "prod"),
            ("CLANK_ENGINE_HOST", "0.0.0.0"),
            ("CLANK_ENGINE_PORT", "8080"),
            ("CLANK_ENGINE_LM_BACKEND", "groq/llama3-8b"),
            ("CLANK_GROQ_API_KEY", "gsk-test"),
        ]))
        .unwrap();
        assert!(!config.service.is_development());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.lm.backend, "groq/llama3-8b");
        assert_eq!(config.lm.groq_api_key.as_deref(), Some("gsk-test"));
    }

    #[test]
    fn test_empty_values_fall_back() {
        let config =
            Config::from_lookup(lookup(&[("CLANK_ENGINE_PORT", ""), ("CLANK_OPENAI_API_KEY", " ")]))
                .unwrap();
        assert_eq!(config.server.port, 2222);
        assert!(config.lm.openai_api_key.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[("CLANK_ENGINE_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_api_keys_not_serialized() {
        let config =
            Config::from_lookup(lookup(&[("CLANK_OPENAI_API_KEY", "sk-secret")])).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
