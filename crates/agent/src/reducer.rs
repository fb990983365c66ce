//! Conversation reducer: folds chat stream events into conversation state.
//!
//! [`reduce`] is the pure `(state, event) -> state` transition. [`TurnReducer`]
//! wraps it for one assistant turn: it decodes raw events, skips malformed
//! ones, and finalizes a turn whose stream closed without `done`/`error`.

use proto::{
    Message, MessageId, MessageStatus, RawEvent, SessionState, StreamEvent, ThinkingState,
    TransportError,
};
use tracing::{debug, trace, warn};

/// Notice used when an `error` event carries no message.
pub const BACKEND_ERROR_NOTICE: &str = "An error occurred";

/// Notice used when the stream fails or closes before the turn completed.
pub const TRANSPORT_ERROR_NOTICE: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

/// Everything the chat UI renders for one conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    /// Append-only, creation-ordered message list.
    pub messages: Vec<Message>,
    pub session: SessionState,
    pub thinking: ThinkingState,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a message by id.
    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Most recently created message.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Appends a message. Ids must be issued in increasing order.
    pub fn push(&mut self, message: Message) {
        debug_assert!(
            self.messages.last().is_none_or(|last| last.id < message.id),
            "message ids must increase in creation order"
        );
        self.messages.push(message);
    }

    /// Message `target` if it still accepts stream updates.
    fn open_message(&mut self, target: MessageId) -> Option<&mut Message> {
        match self.messages.iter_mut().find(|m| m.id == target) {
            Some(msg) if !msg.status.is_terminal() => Some(msg),
            Some(msg) => {
                debug!(message_id = %msg.id, status = ?msg.status, "Ignoring event for finished message");
                None
            }
            None => {
                warn!(message_id = %target, "Stream event targets unknown message");
                None
            }
        }
    }

    /// Applies one event to the assistant message `target`.
    pub fn apply(&mut self, target: MessageId, event: &StreamEvent) {
        if event.clears_thinking() {
            self.thinking.clear();
        }

        match event {
            StreamEvent::Init { session_id } => {
                if let Some(id) = session_id {
                    debug!(session_id = %id, "Session established");
                    self.session.set(id.as_str());
                }
            }
            StreamEvent::Presence { label } => {
                if let Some(label) = label {
                    self.thinking.set(label.as_str());
                }
            }
            StreamEvent::Delta { text } => {
                if let Some(text) = text.as_deref().filter(|t| !t.is_empty())
                    && let Some(msg) = self.open_message(target)
                {
                    msg.content.push_str(text);
                }
            }
            StreamEvent::Action(action) => {
                if let Some(msg) = self.open_message(target) {
                    msg.actions.push(action.clone());
                }
            }
            StreamEvent::Image(image) => {
                if let Some(msg) = self.open_message(target) {
                    msg.images.push(image.clone());
                }
            }
            StreamEvent::Context(context) => {
                trace!(%context, "Context event");
            }
            StreamEvent::Error { message } => {
                if let Some(msg) = self.open_message(target) {
                    msg.fail(message.as_deref().unwrap_or(BACKEND_ERROR_NOTICE));
                }
            }
            StreamEvent::Done => {
                if let Some(msg) = self.open_message(target) {
                    msg.finalize(MessageStatus::Sent);
                }
            }
            StreamEvent::Ignored { event } => {
                trace!(event = %event, "Ignoring unknown stream event");
            }
        }
    }
}

/// Pure transition: returns `state` with `event` applied to message `target`.
pub fn reduce(mut state: ChatState, target: MessageId, event: &StreamEvent) -> ChatState {
    state.apply(target, event);
    state
}

/// Summary of a finished turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOutcome {
    pub message_id: MessageId,
    pub status: MessageStatus,
    /// Events parsed and applied.
    pub applied: usize,
    /// Events dropped because their payload was malformed.
    pub skipped: usize,
}

/// Per-turn reducer bound to one assistant message
#[derive(Debug, Clone)]
pub struct TurnReducer {
    target: MessageId,
    applied: usize,
    skipped: usize,
    terminated: bool,
}

impl TurnReducer {
    pub fn new(target: MessageId) -> Self {
        Self {
            target,
            applied: 0,
            skipped: 0,
            terminated: false,
        }
    }

    /// Assistant message this turn writes to.
    pub fn target(&self) -> MessageId {
        self.target
    }

    /// Whether a `done`/`error` event or a transport failure ended the turn.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Decodes and applies one raw event.
    ///
    /// Returns the typed event when it was applied. Events without data,
    /// events with malformed payloads, and anything arriving after the turn
    /// terminated are skipped; none of these is an error.
    pub fn apply_raw(&mut self, state: &mut ChatState, raw: &RawEvent) -> Option<StreamEvent> {
        if self.terminated {
            debug!(message_id = %self.target, event = %raw.name(), "Dropping event after turn ended");
            return None;
        }
        if !raw.has_data() {
            trace!(event = %raw.name(), "Skipping stream event without data");
            return None;
        }
        match StreamEvent::parse(raw) {
            Ok(event) => {
                state.apply(self.target, &event);
                if event.is_terminal() {
                    self.terminated = true;
                }
                self.applied += 1;
                Some(event)
            }
            Err(e) => {
                warn!(event = %raw.name(), data = ?raw.data, error = %e, "Failed to parse event data");
                self.skipped += 1;
                None
            }
        }
    }

    /// Finalizes the turn after a transport failure.
    pub fn fail(&mut self, state: &mut ChatState, err: &TransportError) {
        warn!(message_id = %self.target, error = %err, "Chat stream failed");
        state.thinking.clear();
        if let Some(msg) = state.open_message(self.target) {
            msg.fail(TRANSPORT_ERROR_NOTICE);
        }
        self.terminated = true;
    }

    /// Ends the turn once the stream is exhausted.
    ///
    /// A stream that closed without `done`/`error` is a transport failure.
    pub fn finish(self, state: &mut ChatState) -> TurnOutcome {
        state.thinking.clear();
        if !self.terminated {
            warn!(message_id = %self.target, applied = self.applied, "Chat stream closed before completion");
            if let Some(msg) = state.open_message(self.target) {
                msg.fail(TRANSPORT_ERROR_NOTICE);
            }
        }
        let status = state
            .message(self.target)
            .map(|m| m.status)
            .unwrap_or(MessageStatus::Error);
        debug!(
            message_id = %self.target,
            status = ?status,
            applied = self.applied,
            skipped = self.skipped,
            "Turn finished"
        );
        TurnOutcome {
            message_id: self.target,
            status,
            applied: self.applied,
            skipped: self.skipped,
        }
    }
}

/// Rebuilds the final state of one turn from its raw event log.
pub fn replay(mut state: ChatState, target: MessageId, log: &[RawEvent]) -> ChatState {
    let mut turn = TurnReducer::new(target);
    for raw in log {
        turn.apply_raw(&mut state, raw);
    }
    turn.finish(&mut state);
    state
}
