use serde::{Deserialize, Serialize};

/// Backend-issued identifier correlating the turns of one conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Returns the raw session identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Session identity scoped to one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Identifier issued by the backend's `init` event, if any.
    pub session_id: Option<SessionId>,
}

impl SessionState {
    /// Records a session id. Later values overwrite earlier ones.
    pub fn set(&mut self, session_id: impl Into<SessionId>) {
        self.session_id = Some(session_id.into());
    }

    /// Returns the raw session id string, if known.
    pub fn as_deref(&self) -> Option<&str> {
        self.session_id.as_ref().map(SessionId::as_str)
    }
}

/// Transient "backend is working" indicator. Never part of message history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThinkingState {
    pub active: bool,
    pub label: Option<String>,
}

impl ThinkingState {
    /// Shows the indicator with the given presence label.
    pub fn set(&mut self, label: impl Into<String>) {
        self.active = true;
        self.label = Some(label.into());
    }

    /// Hides the indicator and drops its label.
    pub fn clear(&mut self) {
        self.active = false;
        self.label = None;
    }
}
