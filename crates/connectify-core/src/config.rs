//! Configuration management for Connectify.
//!
//! Loads configuration from ${CONNECTIFY_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `backend_url`.
pub const BACKEND_URL_ENV: &str = "CONNECTIFY_BACKEND_URL";

/// Environment variable consulted when `anon_key` is not configured.
pub const ANON_KEY_ENV: &str = "CONNECTIFY_ANON_KEY";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Recursively merges items from source table into target table.
///
/// Scalars from `source` win; nested tables are merged key by key so
/// comments that only exist in `target` survive.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for Connectify configuration and data files.
    //!
    //! CONNECTIFY_HOME resolution order:
    //! 1. CONNECTIFY_HOME environment variable (if set)
    //! 2. ~/.config/connectify (default)
    //! 3. ./.connectify when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the Connectify home directory.
    pub fn connectify_home() -> PathBuf {
        if let Ok(home) = std::env::var("CONNECTIFY_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".connectify"),
            |h| h.join(".config").join("connectify"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        connectify_home().join("config.toml")
    }

    /// Returns the path to the cached session file.
    pub fn session_path() -> PathBuf {
        connectify_home().join("session.json")
    }

    /// Returns the directory that receives log files.
    pub fn logs_dir() -> PathBuf {
        connectify_home().join("logs")
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth provider name passed to the authorize endpoint.
    pub oauth_provider: String,
    /// Fixed port for the local OAuth callback (random when unset).
    pub callback_port: Option<u16>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            oauth_provider: Config::DEFAULT_OAUTH_PROVIDER.to_string(),
            callback_port: None,
        }
    }
}

/// Object storage settings for post media.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: String,
    pub folder: String,
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: Config::DEFAULT_BUCKET.to_string(),
            folder: Config::DEFAULT_FOLDER.to_string(),
            max_upload_bytes: Config::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Feed query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Join author profiles onto listed posts.
    pub join_profiles: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            join_profiles: true,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend project URL
    pub backend_url: Option<String>,

    /// Public API key of the backend project
    pub anon_key: Option<String>,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub feed: FeedConfig,
}

impl Config {
    const DEFAULT_OAUTH_PROVIDER: &str = "google";
    const DEFAULT_BUCKET: &str = "post-media";
    const DEFAULT_FOLDER: &str = "uploads";
    const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the backend URL with precedence: env > config.
    ///
    /// # Errors
    /// Returns an error if no URL is configured or the URL is malformed.
    pub fn effective_backend_url(&self) -> Result<String> {
        resolve_url(self.backend_url.as_deref(), BACKEND_URL_ENV)
    }

    /// Resolves the anon key with precedence: config > env.
    ///
    /// # Errors
    /// Returns an error if neither the config nor the environment provides a key.
    pub fn effective_anon_key(&self) -> Result<String> {
        resolve_key(self.anon_key.as_deref(), ANON_KEY_ENV)
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Uses the embedded template for structure/comments and merges
    /// generated values from `Config::default()` into it.
    ///
    /// # Errors
    /// Returns an error if serialization or template parsing fails.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let generated_toml = toml::to_string(&Config::default())
            .context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;
        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

fn resolve_url(config_url: Option<&str>, env_var: &str) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    if let Some(config_url) = config_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    anyhow::bail!(
        "No backend URL configured. Set {env_var} or backend_url in {}.",
        paths::config_path().display()
    )
}

fn resolve_key(config_key: Option<&str>, env_var: &str) -> Result<String> {
    if let Some(key) = config_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .with_context(|| format!("No anon key available. Set {env_var} or anon_key in config."))
}

fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url).with_context(|| format!("Invalid backend URL: {url}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Backend URL must use http or https: {url}");
    }
    Ok(())
}
