use crate::error::{GtmError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never lands in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    /// Where the event log and entity store live. Defaults to `~/.gtm`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load from an explicit path, or from `~/.gtm/config.yaml` when absent.
    /// A missing default config file yields the defaults; a missing explicit
    /// path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(GtmError::ConfigNotFound(p.display().to_string()));
                }
                let data = std::fs::read_to_string(p)?;
                Ok(serde_yaml::from_str(&data)?)
            }
            None => {
                let p = default_config_path()?;
                if !p.exists() {
                    return Ok(Self::default());
                }
                let data = std::fs::read_to_string(&p)?;
                Ok(serde_yaml::from_str(&data)?)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_yaml::to_string(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Environment variables win over file values: `GTM_MODEL`,
    /// `GTM_BASE_URL` and `GTM_DATA_DIR` override their config keys.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("GTM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(base_url) = std::env::var("GTM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Ok(data_dir) = std::env::var("GTM_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(data_dir));
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(gtm_home()?),
        }
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

pub fn gtm_home() -> Result<PathBuf> {
    home::home_dir()
        .map(|h| h.join(".gtm"))
        .ok_or(GtmError::HomeNotFound)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(gtm_home()?.join("config.yaml"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.llm.model, "gpt-4o-mini");
        assert_eq!(parsed.llm.base_url, "https://api.openai.com/v1");
        assert!(parsed.data_dir.is_none());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let yaml = "llm:\n  model: gpt-4o\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.llm.model, "gpt-4o");
        assert_eq!(cfg.llm.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn empty_data_dir_not_serialized() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(!yaml.contains("data_dir"));
    }

    #[test]
    fn save_then_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let mut cfg = Config::default();
        cfg.llm.model = "gpt-4o".to_string();
        cfg.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.llm.model, "gpt-4o");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.yaml");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(GtmError::ConfigNotFound(_))
        ));
    }
}
