//! Shared plumbing: config resolution and adapter construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use gtm_core::config::Config;
use gtm_core::llm::OpenAiLlm;
use gtm_core::mock::{MockChannel, MockLlm};
use gtm_core::ports::{LlmPort, Notification, NotificationPort};
use gtm_core::repo::RedbDb;
use gtm_core::store::RedbEventStore;
use llm_client::ChatClient;

pub struct Env {
    pub config: Config,
    pub data_dir: PathBuf,
}

/// Resolve config and data dir. Precedence for the data dir is the
/// `--data-dir` flag, then `GTM_DATA_DIR`, then the config file, then
/// `~/.gtm`.
pub fn load_env(config_path: Option<&Path>, data_dir: Option<&Path>) -> anyhow::Result<Env> {
    let mut config = Config::load(config_path).context("failed to load config")?;
    config.apply_env_overrides();
    let data_dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => config.data_dir().context("failed to resolve data dir")?,
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;
    Ok(Env { config, data_dir })
}

pub fn open_store(env: &Env) -> anyhow::Result<Arc<RedbEventStore>> {
    let path = env.data_dir.join("events.redb");
    let store = RedbEventStore::open(&path)
        .with_context(|| format!("failed to open event log at {}", path.display()))?;
    Ok(Arc::new(store))
}

pub fn open_db(env: &Env) -> anyhow::Result<Arc<RedbDb>> {
    let path = env.data_dir.join("entities.redb");
    let db = RedbDb::open(&path)
        .with_context(|| format!("failed to open entity store at {}", path.display()))?;
    Ok(Arc::new(db))
}

/// Real model adapter, or the canned one when `--mock` is set.
pub fn build_llm(env: &Env, mock: bool) -> anyhow::Result<Arc<dyn LlmPort>> {
    if mock {
        return Ok(Arc::new(MockLlm::new()));
    }
    let api_key = env.config.llm.api_key().with_context(|| {
        format!(
            "no API key: set {} or pass --mock",
            env.config.llm.api_key_env
        )
    })?;
    let client = ChatClient::new(&env.config.llm.base_url, api_key, &env.config.llm.model)
        .with_temperature(env.config.llm.temperature);
    Ok(Arc::new(OpenAiLlm::new(client)))
}

/// Channel adapter. Only the simulator ships; real channel integrations
/// plug in behind the same port.
pub fn build_channel(_env: &Env) -> Arc<MockChannel> {
    Arc::new(MockChannel::new())
}

/// Prints pipeline notifications to stdout.
pub struct ConsoleNotifier;

impl NotificationPort for ConsoleNotifier {
    fn send(&self, notification: &Notification) -> gtm_core::Result<()> {
        println!("\n== {} ==\n{}", notification.subject, notification.body);
        Ok(())
    }
}
