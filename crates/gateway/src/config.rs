//! Explicit gateway configuration, injected at construction time.

use proto::ConfigError;

/// Default upstream for the AI chat backend.
pub const DEFAULT_CHAT_URL: &str = "https://api.thirdweb.com/ai/chat";
/// Default SideShift REST base URL.
pub const DEFAULT_SIDESHIFT_URL: &str = "https://sideshift.ai/api/v2";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Credential used to authenticate chat requests upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCredential {
    /// Server-side secret key, sent as `x-secret-key`.
    SecretKey(String),
    /// Public client id, sent as `x-client-id`.
    ClientId(String),
}

impl ChatCredential {
    /// Header name and value for this credential.
    pub fn header(&self) -> (&'static str, &str) {
        match self {
            ChatCredential::SecretKey(key) => ("x-secret-key", key),
            ChatCredential::ClientId(id) => ("x-client-id", id),
        }
    }
}

/// Proxy gateway settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen port.
    pub port: u16,
    /// Allowed CORS origins (comma-separated). Empty or `*` = allow all.
    pub cors_origins: String,
    /// Upstream chat endpoint.
    pub chat_url: String,
    /// SideShift API base URL.
    pub sideshift_url: String,
    pub thirdweb_secret_key: Option<String>,
    pub thirdweb_client_id: Option<String>,
    pub sideshift_secret: Option<String>,
    pub sideshift_affiliate_id: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_origins: String::new(),
            chat_url: DEFAULT_CHAT_URL.to_string(),
            sideshift_url: DEFAULT_SIDESHIFT_URL.to_string(),
            thirdweb_secret_key: None,
            thirdweb_client_id: None,
            sideshift_secret: None,
            sideshift_affiliate_id: None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl GatewayConfig {
    /// Chat credential: secret key wins over client id.
    pub fn chat_credential(&self) -> Result<ChatCredential, ConfigError> {
        if let Some(key) = non_empty(&self.thirdweb_secret_key) {
            return Ok(ChatCredential::SecretKey(key.to_string()));
        }
        if let Some(id) = non_empty(&self.thirdweb_client_id) {
            return Ok(ChatCredential::ClientId(id.to_string()));
        }
        Err(ConfigError::MissingCredential(
            "Missing thirdweb credentials. Please set THIRDWEB_CLIENT_ID or THIRDWEB_SECRET_KEY environment variable."
                .to_string(),
        ))
    }

    /// SideShift secret, if configured.
    pub fn sideshift_secret(&self) -> Option<&str> {
        non_empty(&self.sideshift_secret)
    }

    /// SideShift affiliate id, if configured.
    pub fn sideshift_affiliate_id(&self) -> Option<&str> {
        non_empty(&self.sideshift_affiliate_id)
    }

    /// Startup check. Returns one warning per missing credential.
    ///
    /// Missing credentials are not fatal: routes that need them fail per request.
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        for (field, url) in [
            ("gateway.chat_url", &self.chat_url),
            ("gateway.sideshift_url", &self.sideshift_url),
        ] {
            if reqwest::Url::parse(url).is_err() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("'{url}' is not an absolute URL"),
                });
            }
        }

        let mut warnings = Vec::new();
        if let Err(e) = self.chat_credential() {
            warnings.push(e.to_string());
        }
        if self.sideshift_secret().is_none() {
            warnings.push(
                "SIDESHIFT_SECRET is not set; quote, shift and status routes will fail".to_string(),
            );
        }
        Ok(warnings)
    }
}
