use crate::resolver::Resolver;
use crate::source::bulk::DEFAULT_BULK_BASE_URL;
use crate::source::vedabase::{DEFAULT_AUTHORITATIVE_BASE_URL, DEFAULT_BROWSER_USER_AGENT};
use crate::source::{RetryPolicy, VedabaseClient, VedicScripturesClient};
use crate::storage::SqliteStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DATABASE_ENV_VAR: &str = "VEDABASE_DB_PATH";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ATTEMPTS: u32 = 2;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VedabaseConfig {
    pub database: Option<String>,
    pub bulk_base_url: Option<String>,
    pub authoritative_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub bulk_attempts: Option<u32>,
    pub authoritative_attempts: Option<u32>,
    pub enrich: Option<bool>,
    pub user_agent: Option<String>,
}

impl VedabaseConfig {
    /// Every field filled in with its default; what `init` writes.
    pub fn with_defaults() -> Self {
        Self {
            database: None,
            bulk_base_url: Some(DEFAULT_BULK_BASE_URL.to_string()),
            authoritative_base_url: Some(DEFAULT_AUTHORITATIVE_BASE_URL.to_string()),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            bulk_attempts: Some(DEFAULT_ATTEMPTS),
            authoritative_attempts: Some(DEFAULT_ATTEMPTS),
            enrich: Some(true),
            user_agent: Some(DEFAULT_BROWSER_USER_AGENT.to_string()),
        }
    }

    pub fn bulk_base_url(&self) -> &str {
        self.bulk_base_url.as_deref().unwrap_or(DEFAULT_BULK_BASE_URL)
    }

    pub fn authoritative_base_url(&self) -> &str {
        self.authoritative_base_url
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORITATIVE_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn bulk_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.bulk_attempts.unwrap_or(DEFAULT_ATTEMPTS), RETRY_BACKOFF)
    }

    pub fn authoritative_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.authoritative_attempts.unwrap_or(DEFAULT_ATTEMPTS), RETRY_BACKOFF)
    }

    pub fn enrich(&self) -> bool {
        self.enrich.unwrap_or(true)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_BROWSER_USER_AGENT)
    }

    /// Open the cache at `db_path` and wire up both providers.
    pub fn build_resolver(&self, db_path: &Path) -> anyhow::Result<Resolver> {
        ensure_db_dir(db_path)?;
        let store = SqliteStore::open(db_path)?;
        let bulk = VedicScripturesClient::new(self.bulk_base_url(), self.timeout(), self.bulk_retry())?;
        let authoritative = VedabaseClient::new(
            self.authoritative_base_url(),
            self.user_agent(),
            self.timeout(),
            self.authoritative_retry(),
        )?;

        tracing::debug!(
            database = %db_path.display(),
            bulk = self.bulk_base_url(),
            authoritative = self.authoritative_base_url(),
            enrich = self.enrich(),
            "Resolver configured"
        );

        Ok(Resolver::new(Arc::new(store), Arc::new(bulk), Arc::new(authoritative))
            .with_enrichment(self.enrich()))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("vedabase.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".vedabase_mcp").join("cache.db")
}

/// Database path: CLI flag, then `VEDABASE_DB_PATH`, then the config file,
/// then `~/.vedabase_mcp/cache.db`, then `.vedabase/cache.db`.
pub fn resolve_database_path(cli: Option<&Path>, config: Option<&VedabaseConfig>) -> PathBuf {
    let env = std::env::var(DATABASE_ENV_VAR).ok();
    resolve_database_path_from(cli, env.as_deref(), config, dirs::home_dir().as_deref())
}

pub fn resolve_database_path_from(
    cli: Option<&Path>,
    env: Option<&str>,
    config: Option<&VedabaseConfig>,
    home: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Some(path) = env.map(str::trim).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(path) = config.and_then(|c| c.database.as_deref()) {
        return PathBuf::from(path);
    }
    match home {
        Some(home) => default_database_path_in(home),
        None => PathBuf::from(".vedabase").join("cache.db"),
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<VedabaseConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: VedabaseConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &VedabaseConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
