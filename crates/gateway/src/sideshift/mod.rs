//! SideShift REST client and proxy routes.
//!
//! Responses are buffered in full. Upstream failures keep their status and
//! payload so routes can return them as `{error, details}`.

pub mod routes;

use proto::{ConfigError, TransportError, UpstreamError};
use reqwest::{Method, RequestBuilder, Url, header::CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::ApiError;

const SECRET_HEADER: &str = "x-sideshift-secret";

/// Failure talking to SideShift
#[derive(Debug, Error)]
pub enum SideshiftError {
    /// Secret required but not configured.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// SideShift answered with a non-2xx status.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// Request never completed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SideshiftError {
    /// Maps to a route error; transport failures use the route's `fallback` message.
    pub fn into_api(self, fallback: &str) -> ApiError {
        match self {
            SideshiftError::Config(e) => ApiError::Config(e),
            SideshiftError::Upstream(e) => ApiError::Upstream(e),
            SideshiftError::Transport(_) => ApiError::Internal(fallback.to_string()),
        }
    }
}

/// Buffered SideShift API client
#[derive(Debug, Clone)]
pub struct SideshiftClient {
    http: reqwest::Client,
    base_url: String,
    secret: Option<String>,
    affiliate_id: Option<String>,
}

impl SideshiftClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        secret: Option<String>,
        affiliate_id: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            secret,
            affiliate_id,
        }
    }

    /// Affiliate id injected into quote/shift bodies that lack one.
    pub fn affiliate_id(&self) -> Option<&str> {
        self.affiliate_id.as_deref()
    }

    /// Builds `<base>/<segments...>?<query>`; segments are percent-encoded.
    pub fn url(&self, segments: &[&str], query: &[(&str, Option<&str>)]) -> Result<Url, SideshiftError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TransportError::Connection(format!("invalid SideShift base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::Connection("SideShift base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        let present: Vec<_> = query
            .iter()
            .filter_map(|(k, v)| v.map(|v| (*k, v)))
            .collect();
        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        requires_secret: bool,
    ) -> Result<RequestBuilder, SideshiftError> {
        let mut builder = self.http.request(method, url);
        match self.secret.as_deref() {
            Some(secret) => builder = builder.header(SECRET_HEADER, secret),
            None if requires_secret => {
                return Err(ConfigError::MissingCredential(
                    "Missing SideShift secret. Set the SIDESHIFT_SECRET environment variable."
                        .to_string(),
                )
                .into());
            }
            None => {}
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, SideshiftError> {
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        debug!(status = %status.as_u16(), is_json, "SideShift response received");

        let payload = if is_json {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        } else {
            Value::String(text)
        };

        if !status.is_success() {
            return Err(UpstreamError {
                status: status.as_u16(),
                message: upstream_message(&payload),
                payload,
            }
            .into());
        }
        Ok(payload)
    }

    /// `GET <path>` with optional query parameters.
    pub async fn get(
        &self,
        segments: &[&str],
        query: &[(&str, Option<&str>)],
        requires_secret: bool,
    ) -> Result<Value, SideshiftError> {
        let url = self.url(segments, query)?;
        let builder = self.request(Method::GET, url, requires_secret)?;
        self.send(builder).await
    }

    /// `POST <path>` with a JSON body.
    pub async fn post(
        &self,
        segments: &[&str],
        body: &Value,
        requires_secret: bool,
    ) -> Result<Value, SideshiftError> {
        let url = self.url(segments, &[])?;
        let builder = self.request(Method::POST, url, requires_secret)?.json(body);
        self.send(builder).await
    }

    pub async fn coins(&self) -> Result<Value, SideshiftError> {
        self.get(&["coins"], &[], false).await
    }

    pub async fn pairs(
        &self,
        deposit_coin: Option<&str>,
        settle_coin: Option<&str>,
    ) -> Result<Value, SideshiftError> {
        self.get(
            &["pairs"],
            &[("depositCoin", deposit_coin), ("settleCoin", settle_coin)],
            false,
        )
        .await
    }

    pub async fn create_quote(&self, payload: &Value) -> Result<Value, SideshiftError> {
        self.post(&["quotes"], payload, true).await
    }

    pub async fn create_fixed_shift(&self, payload: &Value) -> Result<Value, SideshiftError> {
        self.post(&["shifts", "fixed"], payload, true).await
    }

    pub async fn shift(&self, shift_id: &str) -> Result<Value, SideshiftError> {
        self.get(&["shifts", shift_id], &[], true).await
    }
}

/// Human-readable message from an upstream error payload.
///
/// Handles `{"message": ...}`, `{"error": {"message": ...}}`, and plain text.
fn upstream_message(payload: &Value) -> String {
    if let Value::String(text) = payload {
        return text.clone();
    }
    payload["message"]
        .as_str()
        .or_else(|| payload["error"]["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| payload.to_string())
}
