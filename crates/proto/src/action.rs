//! Wallet operations proposed by the chat backend.
//!
//! On the wire an action is `{type, data, request_id, session_id}` with a
//! `data` schema that depends on `type`. In memory the pairing is enforced by
//! [`ActionPayload`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StreamParseError;

/// Discriminant of an action as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    SignTransaction,
    SignSwap,
    MonitorTransaction,
}

impl ActionKind {
    /// Wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::SignTransaction => "sign_transaction",
            ActionKind::SignSwap => "sign_swap",
            ActionKind::MonitorTransaction => "monitor_transaction",
        }
    }
}

impl std::str::FromStr for ActionKind {
    type Err = StreamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sign_transaction" => Ok(ActionKind::SignTransaction),
            "sign_swap" => Ok(ActionKind::SignSwap),
            "monitor_transaction" => Ok(ActionKind::MonitorTransaction),
            other => Err(StreamParseError::UnknownActionType(other.to_string())),
        }
    }
}

/// Transaction the user is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAction {
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl TransactionAction {
    /// Native value in wei. Absent means zero; `0x` prefixed hex is accepted.
    pub fn value_wei(&self) -> Result<u128, std::num::ParseIntError> {
        match self.value.as_deref().map(str::trim) {
            None | Some("") => Ok(0),
            Some(raw) => match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
                Some(hex) => u128::from_str_radix(hex, 16),
                None => raw.parse::<u128>(),
            },
        }
    }
}

/// Cross-token swap intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapIntent {
    pub amount: String,
    pub origin_token_address: String,
    pub destination_token_address: String,
    pub destination_chain_id: u64,
}

/// Swap the user is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapAction {
    pub intent: SwapIntent,
    pub transaction: TransactionAction,
}

/// Transaction the backend wants the UI to track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorAction {
    pub transaction_id: String,
}

/// Type-checked action payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPayload {
    SignTransaction(TransactionAction),
    SignSwap(SwapAction),
    MonitorTransaction(MonitorAction),
}

impl ActionPayload {
    /// Wire discriminant of this payload.
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionPayload::SignTransaction(_) => ActionKind::SignTransaction,
            ActionPayload::SignSwap(_) => ActionKind::SignSwap,
            ActionPayload::MonitorTransaction(_) => ActionKind::MonitorTransaction,
        }
    }

    /// Transaction to hand to the wallet for signing, if this action needs one.
    pub fn signable_transaction(&self) -> Option<&TransactionAction> {
        match self {
            ActionPayload::SignTransaction(tx) => Some(tx),
            ActionPayload::SignSwap(swap) => Some(&swap.transaction),
            ActionPayload::MonitorTransaction(_) => None,
        }
    }
}

/// Backend-proposed wallet operation. Immutable once appended to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ActionWire", into = "ActionWire")]
pub struct Action {
    pub payload: ActionPayload,
    pub request_id: String,
    pub session_id: String,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        self.payload.kind()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActionWire {
    #[serde(rename = "type")]
    kind: String,
    data: Value,
    request_id: String,
    session_id: String,
}

fn payload_error(kind: ActionKind, err: serde_json::Error) -> StreamParseError {
    StreamParseError::InvalidPayload {
        event: format!("action:{}", kind.as_str()),
        reason: err.to_string(),
    }
}

impl TryFrom<ActionWire> for Action {
    type Error = StreamParseError;

    fn try_from(wire: ActionWire) -> Result<Self, Self::Error> {
        let kind: ActionKind = wire.kind.parse()?;
        let payload = match kind {
            ActionKind::SignTransaction => ActionPayload::SignTransaction(
                serde_json::from_value(wire.data).map_err(|e| payload_error(kind, e))?,
            ),
            ActionKind::SignSwap => ActionPayload::SignSwap(
                serde_json::from_value(wire.data).map_err(|e| payload_error(kind, e))?,
            ),
            ActionKind::MonitorTransaction => ActionPayload::MonitorTransaction(
                serde_json::from_value(wire.data).map_err(|e| payload_error(kind, e))?,
            ),
        };
        Ok(Action {
            payload,
            request_id: wire.request_id,
            session_id: wire.session_id,
        })
    }
}

impl From<Action> for ActionWire {
    fn from(action: Action) -> Self {
        let kind = action.kind().as_str().to_string();
        let data = match action.payload {
            ActionPayload::SignTransaction(tx) => serde_json::to_value(tx),
            ActionPayload::SignSwap(swap) => serde_json::to_value(swap),
            ActionPayload::MonitorTransaction(monitor) => serde_json::to_value(monitor),
        }
        .unwrap_or(Value::Null);
        ActionWire {
            kind,
            data,
            request_id: action.request_id,
            session_id: action.session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_sign_transaction_action() {
        let action: Action = serde_json::from_value(json!({
            "type": "sign_transaction",
            "data": {"to": "0xabc", "value": "1000", "chain_id": 137},
            "request_id": "r1",
            "session_id": "s1"
        }))
        .expect("valid action");

        assert_eq!(action.kind(), ActionKind::SignTransaction);
        let tx = action.payload.signable_transaction().expect("signable");
        assert_eq!(tx.to, "0xabc");
        assert_eq!(tx.value_wei().expect("value"), 1000);
        assert_eq!(action.request_id, "r1");
    }

    #[test]
    fn swap_exposes_inner_transaction() {
        let action: Action = serde_json::from_value(json!({
            "type": "sign_swap",
            "data": {
                "intent": {
                    "amount": "5",
                    "origin_token_address": "0x1",
                    "destination_token_address": "0x2",
                    "destination_chain_id": 1
                },
                "transaction": {"to": "0xrouter", "chain_id": 137, "data": "0xdead"}
            },
            "request_id": "r2",
            "session_id": "s1"
        }))
        .expect("valid swap");

        let tx = action.payload.signable_transaction().expect("signable");
        assert_eq!(tx.to, "0xrouter");
        assert_eq!(tx.value_wei().expect("value"), 0);
    }

    #[test]
    fn monitor_action_has_nothing_to_sign() {
        let action: Action = serde_json::from_value(json!({
            "type": "monitor_transaction",
            "data": {"transaction_id": "tx-9"},
            "request_id": "r3",
            "session_id": "s1"
        }))
        .expect("valid monitor");
        assert!(action.payload.signable_transaction().is_none());
    }

    #[test]
    fn rejects_unknown_type_and_mismatched_data() {
        let unknown = serde_json::from_value::<Action>(json!({
            "type": "bridge",
            "data": {},
            "request_id": "r",
            "session_id": "s"
        }));
        assert!(unknown.is_err());

        let mismatched = serde_json::from_value::<Action>(json!({
            "type": "monitor_transaction",
            "data": {"to": "0xabc"},
            "request_id": "r",
            "session_id": "s"
        }));
        assert!(mismatched.is_err());
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let action = Action {
            payload: ActionPayload::MonitorTransaction(MonitorAction {
                transaction_id: "tx-1".to_string(),
            }),
            request_id: "r".to_string(),
            session_id: "s".to_string(),
        };
        let json = serde_json::to_value(&action).expect("serialize");
        assert_eq!(json["type"], "monitor_transaction");
        assert_eq!(json["data"]["transaction_id"], "tx-1");
    }

    #[test]
    fn value_wei_accepts_hex() {
        let tx = TransactionAction {
            to: "0x0".to_string(),
            value: Some("0x10".to_string()),
            chain_id: 137,
            function: None,
            data: None,
        };
        assert_eq!(tx.value_wei().expect("hex value"), 16);
    }
}
