use gateway::{DEFAULT_CHAT_URL, DEFAULT_PORT, DEFAULT_SIDESHIFT_URL, GatewayConfig};
use proto::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Proxy gateway settings and upstream credentials.
    #[serde(default)]
    pub gateway: GatewaySection,

    /// Defaults for `polypuff run`.
    #[serde(default)]
    pub client: ClientSection,
}

/// `[gateway]` table.
///
/// Credentials are normally supplied through the environment:
/// - `THIRDWEB_SECRET_KEY` / `THIRDWEB_CLIENT_ID`
/// - `SIDESHIFT_SECRET`, `SIDESHIFT_AFFILIATE_ID` (or `SIDESHIFT_AFFILIATE`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySection {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins (comma-separated). Empty = allow all.
    #[serde(default)]
    pub cors_origins: String,
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
    #[serde(default = "default_sideshift_url")]
    pub sideshift_url: String,
    #[serde(default)]
    pub thirdweb_secret_key: Option<String>,
    #[serde(default)]
    pub thirdweb_client_id: Option<String>,
    #[serde(default)]
    pub sideshift_secret: Option<String>,
    #[serde(default)]
    pub sideshift_affiliate_id: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_chat_url() -> String {
    DEFAULT_CHAT_URL.to_string()
}

fn default_sideshift_url() -> String {
    DEFAULT_SIDESHIFT_URL.to_string()
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_origins: String::new(),
            chat_url: default_chat_url(),
            sideshift_url: default_sideshift_url(),
            thirdweb_secret_key: None,
            thirdweb_client_id: None,
            sideshift_secret: None,
            sideshift_affiliate_id: None,
        }
    }
}

/// `[client]` table: wallet context and endpoint used by `polypuff run`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientSection {
    /// Chat endpoint. Defaults to the local gateway.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Connected wallet address.
    #[serde(default)]
    pub from: Option<String>,
    /// Active chain id.
    #[serde(default)]
    pub chain_id: Option<u64>,
}

/// Reads `key`; empty values count as unset.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Loads configuration from explicit path, fallback locations, and env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            let cwd = std::env::current_dir().ok()?.join("polypuff.toml");
            if cwd.exists() {
                return Some(cwd);
            }
            let home = std::env::var("HOME").ok()?;
            let home_config = PathBuf::from(home).join(".polypuff").join("config.toml");
            if home_config.exists() {
                return Some(home_config);
            }
            None
        });
        debug!(path = ?config_path, "Config file resolved");

        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))?
        } else {
            Config::default()
        };
        config.apply_env();

        debug!(
            port = config.gateway.port,
            chat_url = %config.gateway.chat_url,
            sideshift_url = %config.gateway.sideshift_url,
            "Config loaded"
        );
        Ok(config)
    }

    fn apply_env(&mut self) {
        let gw = &mut self.gateway;
        if let Some(key) = env_value("THIRDWEB_SECRET_KEY") {
            gw.thirdweb_secret_key = Some(key);
        }
        if let Some(id) = env_value("THIRDWEB_CLIENT_ID") {
            gw.thirdweb_client_id = Some(id);
        }
        if let Some(secret) = env_value("SIDESHIFT_SECRET") {
            gw.sideshift_secret = Some(secret);
        }
        if let Some(affiliate) =
            env_value("SIDESHIFT_AFFILIATE_ID").or_else(|| env_value("SIDESHIFT_AFFILIATE"))
        {
            gw.sideshift_affiliate_id = Some(affiliate);
        }
        if let Some(url) = env_value("POLYPUFF_CHAT_URL") {
            gw.chat_url = url;
        }
        if let Some(url) = env_value("POLYPUFF_SIDESHIFT_URL") {
            gw.sideshift_url = url;
        }
        if let Some(port) = env_value("POLYPUFF_PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => gw.port = p,
                Err(_) => warn!(value = %port, port = gw.port, "Ignoring invalid POLYPUFF_PORT"),
            }
        }
    }

    /// Explicit settings handed to the gateway server.
    pub fn gateway_config(&self) -> GatewayConfig {
        let gw = &self.gateway;
        GatewayConfig {
            port: gw.port,
            cors_origins: gw.cors_origins.clone(),
            chat_url: gw.chat_url.clone(),
            sideshift_url: gw.sideshift_url.clone(),
            thirdweb_secret_key: gw.thirdweb_secret_key.clone(),
            thirdweb_client_id: gw.thirdweb_client_id.clone(),
            sideshift_secret: gw.sideshift_secret.clone(),
            sideshift_affiliate_id: gw.sideshift_affiliate_id.clone(),
        }
    }

    /// Chat endpoint for `run`: explicit config, else the local gateway.
    pub fn chat_endpoint(&self) -> String {
        self.client
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| format!("http://127.0.0.1:{}/api/chat", self.gateway.port))
    }
}
