//! Outbound chat request construction.

use proto::{Role, SessionState};
use serde::Serialize;

/// Wallet context supplied by the wallet-connection layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletContext {
    /// Connected wallet address, if any.
    pub address: Option<String>,
    /// Chain the wallet is currently on, if known.
    pub chain_id: Option<u64>,
}

impl WalletContext {
    pub fn new(address: Option<String>, chain_id: Option<u64>) -> Self {
        Self { address, chain_id }
    }
}

/// Single prompt entry in the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub role: Role,
    pub content: String,
}

/// Side context sent with every prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    /// Sent as `null` until the backend has issued a session.
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_ids: Option<Vec<u64>>,
}

/// Body of `POST /api/chat`.
///
/// Only the latest prompt is sent; history lives server-side under the session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequestBody {
    pub messages: Vec<OutboundMessage>,
    pub context: RequestContext,
}

impl ChatRequestBody {
    /// Builds the request body for one prompt. Pure: same inputs, same body.
    pub fn build(prompt: &str, session: &SessionState, wallet: &WalletContext) -> Self {
        Self {
            messages: vec![OutboundMessage {
                role: Role::User,
                content: prompt.to_string(),
            }],
            context: RequestContext {
                session_id: session.as_deref().map(str::to_string),
                from: wallet.address.clone(),
                chain_ids: wallet.chain_id.map(|id| vec![id]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn omits_wallet_fields_when_disconnected() {
        let body = ChatRequestBody::build("hi", &SessionState::default(), &WalletContext::default());
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            json,
            json!({
                "messages": [{"role": "user", "content": "hi"}],
                "context": {"session_id": null}
            })
        );
    }

    #[test]
    fn includes_session_address_and_chain() {
        let mut session = SessionState::default();
        session.set("s1");
        let wallet = WalletContext::new(Some("0xabc".to_string()), Some(137));

        let body = ChatRequestBody::build("balance?", &session, &wallet);
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["context"]["session_id"], "s1");
        assert_eq!(json["context"]["from"], "0xabc");
        assert_eq!(json["context"]["chain_ids"], json!([137]));
    }

    #[test]
    fn build_is_deterministic() {
        let wallet = WalletContext::new(None, Some(1));
        let a = ChatRequestBody::build("x", &SessionState::default(), &wallet);
        let b = ChatRequestBody::build("x", &SessionState::default(), &wallet);
        assert_eq!(a, b);
    }
}
