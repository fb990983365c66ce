use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Network/connection failure talking to an upstream.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A single malformed stream event.
    #[error("Stream parse error: {0}")]
    StreamParse(#[from] StreamParseError),

    /// Non-2xx response from a third-party API.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Malformed or missing request fields.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Conversation lifecycle misuse.
    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A credential needed by the requested operation is not configured.
    #[error("{0}")]
    MissingCredential(String),

    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network/connection-level failure before a response arrived.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The initial request completed with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body failed while it was being read.
    #[error("Body read error: {0}")]
    Body(String),
}

/// Errors raised while decoding a single stream event.
///
/// Always recovered locally: the offending event is skipped.
#[derive(Debug, Error)]
pub enum StreamParseError {
    /// `data` was not valid JSON.
    #[error("Invalid JSON in `{event}` event: {reason}")]
    InvalidJson { event: String, reason: String },

    /// `data` was JSON but did not match the event's schema.
    #[error("Invalid `{event}` payload: {reason}")]
    InvalidPayload { event: String, reason: String },

    /// Action event named a type outside the known set.
    #[error("Unknown action type: {0}")]
    UnknownActionType(String),
}

/// Upstream API error carrying the upstream status and payload.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct UpstreamError {
    /// HTTP status returned by the upstream.
    pub status: u16,
    /// Human-readable message extracted from the payload.
    pub message: String,
    /// Raw payload (JSON, or a JSON string for text bodies).
    pub payload: serde_json::Value,
}

/// Request validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Body was not JSON or not an object.
    #[error("Invalid JSON body.")]
    InvalidBody,

    /// Required string field missing or of the wrong type.
    #[error("Missing or invalid `{0}`.")]
    MissingOrInvalid(String),

    /// Neither quote amount was provided.
    #[error("Provide either `depositAmount` or `settleAmount`.")]
    MissingAmount,

    /// An amount was neither a string nor a number.
    #[error("Amounts must be provided as string or number values.")]
    InvalidAmount,

    /// Shift id path segment empty.
    #[error("Missing or invalid shift ID.")]
    MissingShiftId,
}

/// Conversation lifecycle errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    /// Prompt was empty after trimming.
    #[error("Prompt is empty")]
    EmptyPrompt,

    /// A turn is still streaming.
    #[error("A request is already in flight")]
    TurnInFlight,

    /// No assistant turn is currently streaming.
    #[error("No request in flight")]
    NoTurnInFlight,
}
