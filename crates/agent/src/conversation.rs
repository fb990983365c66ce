//! One chat conversation: message list, session, and the in-flight turn.

use futures_util::StreamExt;
use proto::{
    ConversationError, Message, MessageId, MessageIdGenerator, RawEvent, StreamEvent,
    TransportError,
};
use tracing::{debug, info};

use crate::reducer::{ChatState, TurnOutcome, TurnReducer};
use crate::request::{ChatRequestBody, WalletContext};
use crate::transport::ChatTransport;

/// Conversation driver. At most one turn is in flight at a time.
#[derive(Debug, Default)]
pub struct Conversation {
    state: ChatState,
    ids: MessageIdGenerator,
    turn: Option<TurnReducer>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current conversation state.
    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    /// Whether an assistant turn is still streaming.
    pub fn is_loading(&self) -> bool {
        self.turn.is_some()
    }

    /// Starts a turn: records the user prompt and an empty assistant
    /// message, and returns the request body to send.
    pub fn begin_turn(
        &mut self,
        prompt: &str,
        wallet: &WalletContext,
    ) -> Result<ChatRequestBody, ConversationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ConversationError::EmptyPrompt);
        }
        if self.turn.is_some() {
            return Err(ConversationError::TurnInFlight);
        }

        let user_id = self.ids.next_id();
        self.state.push(Message::user(user_id, prompt));
        let assistant_id = self.ids.next_id();
        self.state.push(Message::assistant_pending(assistant_id));
        self.turn = Some(TurnReducer::new(assistant_id));

        debug!(user_id = %user_id, assistant_id = %assistant_id, "Turn started");
        Ok(ChatRequestBody::build(prompt, &self.state.session, wallet))
    }

    /// Applies one raw event to the in-flight turn.
    pub fn apply_event(&mut self, raw: &RawEvent) -> Result<Option<StreamEvent>, ConversationError> {
        let turn = self.turn.as_mut().ok_or(ConversationError::NoTurnInFlight)?;
        Ok(turn.apply_raw(&mut self.state, raw))
    }

    /// Marks the in-flight turn as failed by the transport.
    pub fn fail_turn(&mut self, err: &TransportError) -> Result<(), ConversationError> {
        let turn = self.turn.as_mut().ok_or(ConversationError::NoTurnInFlight)?;
        turn.fail(&mut self.state, err);
        Ok(())
    }

    /// Closes the in-flight turn once its stream has ended.
    pub fn finish_turn(&mut self) -> Result<TurnOutcome, ConversationError> {
        let turn = self.turn.take().ok_or(ConversationError::NoTurnInFlight)?;
        Ok(turn.finish(&mut self.state))
    }

    /// Runs one full turn over `transport`.
    ///
    /// `observer` sees every applied event together with the updated state.
    /// Transport failures never escape: they end up on the assistant message.
    pub async fn send<T, F>(
        &mut self,
        transport: &T,
        prompt: &str,
        wallet: &WalletContext,
        mut observer: F,
    ) -> Result<TurnOutcome, ConversationError>
    where
        T: ChatTransport + ?Sized,
        F: FnMut(&StreamEvent, &ChatState),
    {
        let body = self.begin_turn(prompt, wallet)?;

        match transport.open_stream(&body).await {
            Ok(mut events) => {
                while let Some(item) = events.next().await {
                    match item {
                        Ok(raw) => {
                            if let Some(event) = self.apply_event(&raw)? {
                                observer(&event, &self.state);
                            }
                        }
                        Err(e) => {
                            self.fail_turn(&e)?;
                            break;
                        }
                    }
                }
            }
            Err(e) => self.fail_turn(&e)?,
        }

        let outcome = self.finish_turn()?;
        info!(message_id = %outcome.message_id, status = ?outcome.status, "Chat turn complete");
        Ok(outcome)
    }

    /// Assistant message for `id`, if any.
    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.state.message(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::TRANSPORT_ERROR_NOTICE;
    use crate::transport::RawEventStream;
    use async_trait::async_trait;
    use futures_util::stream;
    use proto::{MessageStatus, Role};
    use std::sync::Mutex;

    /// Replays a fixed script and records request bodies.
    struct ScriptedTransport {
        script: Vec<Result<RawEvent, TransportError>>,
        reject: bool,
        seen: Mutex<Vec<ChatRequestBody>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<RawEvent, TransportError>>) -> Self {
            Self {
                script,
                reject: false,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn open_stream(
            &self,
            body: &ChatRequestBody,
        ) -> Result<RawEventStream, TransportError> {
            self.seen.lock().unwrap().push(body.clone());
            if self.reject {
                return Err(TransportError::Status {
                    status: 500,
                    body: "{}".to_string(),
                });
            }
            let items: Vec<_> = self
                .script
                .iter()
                .map(|item| match item {
                    Ok(raw) => Ok(raw.clone()),
                    Err(e) => Err(TransportError::Body(e.to_string())),
                })
                .collect();
            Ok(stream::iter(items).boxed())
        }
    }

    #[tokio::test]
    async fn send_runs_full_turn_and_reuses_session() {
        let transport = ScriptedTransport::new(vec![
            Ok(RawEvent::new("init", r#"{"session_id":"s1"}"#)),
            Ok(RawEvent::new("presence", r#"{"data":"thinking..."}"#)),
            Ok(RawEvent::new("delta", r#"{"v":"Hi"}"#)),
            Ok(RawEvent::new("done", "{}")),
        ]);
        let mut convo = Conversation::new();
        let mut seen_events = 0;

        let outcome = convo
            .send(&transport, "  hello  ", &WalletContext::default(), |_, _| {
                seen_events += 1
            })
            .await
            .expect("turn runs");

        assert_eq!(outcome.status, MessageStatus::Sent);
        assert_eq!(seen_events, 4);
        assert!(!convo.is_loading());
        assert_eq!(convo.messages().len(), 2);
        assert_eq!(convo.messages()[0].role, Role::User);
        assert_eq!(convo.messages()[0].content, "hello");
        assert_eq!(convo.messages()[1].content, "Hi");
        assert!(convo.messages()[0].id < convo.messages()[1].id);
        assert!(!convo.state().thinking.active);

        convo
            .send(&transport, "again", &WalletContext::default(), |_, _| {})
            .await
            .expect("second turn");
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].context.session_id, None);
        assert_eq!(seen[1].context.session_id.as_deref(), Some("s1"));
        assert_eq!(convo.messages().len(), 4);
    }

    #[tokio::test]
    async fn observer_never_sees_events_after_done() {
        let transport = ScriptedTransport::new(vec![
            Ok(RawEvent::new("delta", r#"{"v":"ok"}"#)),
            Ok(RawEvent::new("done", "{}")),
            Ok(RawEvent::new("delta", r#"{"v":" LATE"}"#)),
        ]);
        let mut convo = Conversation::new();
        let mut printed = String::new();

        let outcome = convo
            .send(&transport, "hello", &WalletContext::default(), |event, _| {
                if let StreamEvent::Delta { text: Some(text) } = event {
                    printed.push_str(text);
                }
            })
            .await
            .expect("turn runs");

        assert_eq!(printed, "ok");
        assert_eq!(outcome.applied, 2);
        let msg = convo.message(outcome.message_id).expect("assistant");
        assert_eq!(msg.content, printed);
    }

    #[tokio::test]
    async fn rejected_request_fails_assistant_message() {
        let mut transport = ScriptedTransport::new(Vec::new());
        transport.reject = true;
        let mut convo = Conversation::new();

        let outcome = convo
            .send(&transport, "hello", &WalletContext::default(), |_, _| {})
            .await
            .expect("failure is recorded, not returned");

        assert_eq!(outcome.status, MessageStatus::Error);
        let msg = convo.message(outcome.message_id).expect("assistant");
        assert!(msg.content.ends_with(TRANSPORT_ERROR_NOTICE));
    }

    #[tokio::test]
    async fn body_error_mid_stream_keeps_partial_content() {
        let transport = ScriptedTransport::new(vec![
            Ok(RawEvent::new("delta", r#"{"v":"par"}"#)),
            Err(TransportError::Body("reset".to_string())),
            Ok(RawEvent::new("done", "{}")),
        ]);
        let mut convo = Conversation::new();
        let outcome = convo
            .send(&transport, "hello", &WalletContext::default(), |_, _| {})
            .await
            .expect("turn runs");

        assert_eq!(outcome.status, MessageStatus::Error);
        let msg = convo.message(outcome.message_id).expect("assistant");
        assert!(msg.content.starts_with("par"));
    }

    #[test]
    fn begin_turn_rejects_empty_and_concurrent_prompts() {
        let mut convo = Conversation::new();
        assert_eq!(
            convo.begin_turn("   ", &WalletContext::default()),
            Err(ConversationError::EmptyPrompt)
        );

        convo
            .begin_turn("first", &WalletContext::default())
            .expect("first turn");
        assert!(convo.is_loading());
        assert_eq!(
            convo.begin_turn("second", &WalletContext::default()),
            Err(ConversationError::TurnInFlight)
        );
        assert_eq!(convo.messages().len(), 2);
    }

    #[test]
    fn events_without_turn_are_rejected() {
        let mut convo = Conversation::new();
        assert_eq!(
            convo.apply_event(&RawEvent::new("done", "{}")),
            Err(ConversationError::NoTurnInFlight)
        );
        assert!(matches!(
            convo.finish_turn(),
            Err(ConversationError::NoTurnInFlight)
        ));
    }

    #[test]
    fn begin_turn_passes_wallet_context() {
        let mut convo = Conversation::new();
        let wallet = WalletContext::new(Some("0xme".to_string()), Some(137));
        let body = convo.begin_turn("swap", &wallet).expect("turn");
        assert_eq!(body.context.from.as_deref(), Some("0xme"));
        assert_eq!(body.context.chain_ids, Some(vec![137]));
        assert_eq!(body.messages[0].content, "swap");
    }
}
