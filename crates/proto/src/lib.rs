//! Shared protocol types for the chat stream, wallet actions, and proxy errors.
//!
//! This crate defines the conversation data model, the typed server-sent
//! event vocabulary of the chat backend, and strongly-typed error enums
//! shared across the workspace.

pub mod action;
pub mod error;
pub mod event;
pub mod message;
pub mod session;

/// Re-export of wallet action payload types.
pub use action::{
    Action, ActionKind, ActionPayload, MonitorAction, SwapAction, SwapIntent, TransactionAction,
};
/// Re-export of all protocol error types.
pub use error::*;
/// Re-export of raw and typed stream event types.
pub use event::{RawEvent, StreamEvent};
/// Re-export of conversation message types.
pub use message::{ImageRef, Message, MessageId, MessageIdGenerator, MessageStatus, Role};
/// Re-export of per-conversation session/thinking state.
pub use session::{SessionId, SessionState, ThinkingState};
