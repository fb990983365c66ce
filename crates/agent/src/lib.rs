//! Chat client: event stream transport, conversation reducer, and turn driver.

pub mod conversation;
pub mod quick_action;
pub mod reducer;
pub mod request;
pub mod sse;
pub mod transport;

pub use conversation::Conversation;
pub use quick_action::{QuickAction, TriggerGate, normalize_trigger_prompt};
pub use reducer::{
    BACKEND_ERROR_NOTICE, ChatState, TRANSPORT_ERROR_NOTICE, TurnOutcome, TurnReducer, reduce,
    replay,
};
pub use request::{ChatRequestBody, OutboundMessage, RequestContext, WalletContext};
pub use sse::SseDecoder;
pub use transport::{ChatTransport, HttpChatTransport, RawEventStream, decode_sse};
