//! Conversation controller
//!
//! Owns the history and the bound input box, and drives the request/response
//! cycle for each question. Network calls run as spawned tasks that report
//! back through a [`Completion`] channel, so the host loop stays free to
//! process pointer and input events while a request is in flight.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::render;
use crate::transport::{ChatError, ChatReply, ChatTransport, IngestError};

use super::{ConversationHistory, ConversationMessage};

pub type RequestId = Uuid;

/// What to do with a submit while a request is still in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingPolicy {
    /// Refuse with a visible notice
    #[default]
    Reject,
    /// Hold the question and send it once the current answer arrives
    Queue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Pending(RequestId),
}

/// Reasons a submit never reaches the backend. Shown to the user as an
/// assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    #[error("Please enter a question.")]
    EmptyInput,

    #[error("Still waiting for a response to your previous question.")]
    StillPending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent(RequestId),
    Queued { position: usize },
    Rejected(SubmitRejection),
}

/// Result of a background network call
#[derive(Debug)]
pub enum Completion {
    Chat {
        request: RequestId,
        result: Result<ChatReply, ChatError>,
    },
    Ingest(Result<(), IngestError>),
}

pub struct ConversationController {
    history: ConversationHistory,
    input: String,
    state: SendState,
    policy: PendingPolicy,
    queue: VecDeque<String>,
    transport: Arc<dyn ChatTransport>,
    completions: UnboundedSender<Completion>,
}

impl ConversationController {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        completions: UnboundedSender<Completion>,
        policy: PendingPolicy,
    ) -> Self {
        Self {
            history: ConversationHistory::new(),
            input: String::new(),
            state: SendState::Idle,
            policy,
            queue: VecDeque::new(),
            transport,
            completions,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn state(&self) -> SendState {
        self.state
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Shift+Enter
    pub fn insert_newline(&mut self) {
        self.input.push('\n');
    }

    /// Markup for the message list
    pub fn transcript_html(&self) -> String {
        render::render_history(self.history.messages())
    }

    /// Send the current input as a question
    pub fn submit(&mut self) -> SubmitOutcome {
        let question = self.input.trim().to_string();

        if question.is_empty() {
            return self.reject(SubmitRejection::EmptyInput);
        }

        if let SendState::Pending(in_flight) = self.state {
            match self.policy {
                PendingPolicy::Reject => {
                    tracing::debug!(%in_flight, "Submit refused while a request is pending");
                    return self.reject(SubmitRejection::StillPending);
                }
                PendingPolicy::Queue => {
                    self.queue.push_back(question);
                    self.input.clear();
                    tracing::debug!(%in_flight, queued = self.queue.len(), "Question queued");
                    return SubmitOutcome::Queued {
                        position: self.queue.len(),
                    };
                }
            }
        }

        self.input.clear();
        SubmitOutcome::Sent(self.dispatch(question))
    }

    /// Apply the outcome of a chat request. Completions for anything other
    /// than the pending request are dropped. Returns whether it was applied.
    pub fn complete_chat(
        &mut self,
        request: RequestId,
        result: Result<ChatReply, ChatError>,
    ) -> bool {
        if self.state != SendState::Pending(request) {
            tracing::warn!(%request, state = ?self.state, "Discarding stale chat completion");
            return false;
        }
        self.state = SendState::Idle;

        let content = match result {
            Ok(reply) => reply.response,
            Err(e) => {
                tracing::error!(%request, error = ?e, "Chat request failed");
                e.to_string()
            }
        };
        self.history.push(ConversationMessage::assistant(content));

        if let Some(next) = self.queue.pop_front() {
            self.dispatch(next);
        }
        true
    }

    /// Kick off ingestion of the page URL in the background
    pub fn ingest_page(&self, url: &str) {
        let transport = Arc::clone(&self.transport);
        let completions = self.completions.clone();
        let url = url.to_string();

        tracing::info!(%url, "Submitting page for processing");
        tokio::spawn(async move {
            let result = transport.ingest_page(&url).await;
            if completions.send(Completion::Ingest(result)).is_err() {
                tracing::debug!("Widget gone before ingestion finished");
            }
        });
    }

    pub fn complete_ingest(&mut self, result: Result<(), IngestError>) {
        match result {
            Ok(()) => tracing::info!("Page ready for questions"),
            Err(e) => {
                tracing::warn!(detail = %e.detail, "Page ingestion failed");
                self.history.push(ConversationMessage::assistant(e.to_string()));
            }
        }
    }

    fn reject(&mut self, reason: SubmitRejection) -> SubmitOutcome {
        self.history
            .push(ConversationMessage::assistant(reason.to_string()));
        SubmitOutcome::Rejected(reason)
    }

    fn dispatch(&mut self, question: String) -> RequestId {
        self.history.push(ConversationMessage::user(question.clone()));

        let request = Uuid::new_v4();
        self.state = SendState::Pending(request);

        let transport = Arc::clone(&self.transport);
        let completions = self.completions.clone();
        let history = self.history.messages().to_vec();

        tracing::debug!(%request, history_len = history.len(), "Dispatching question");
        tokio::spawn(async move {
            let result = transport.send_chat(&question, &history).await;
            if completions.send(Completion::Chat { request, result }).is_err() {
                tracing::debug!(%request, "Widget gone before chat finished");
            }
        });

        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::transport::scripted::ScriptedTransport;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn setup(
        transport: ScriptedTransport,
        policy: PendingPolicy,
    ) -> (
        ConversationController,
        Arc<ScriptedTransport>,
        UnboundedReceiver<Completion>,
    ) {
        let transport = Arc::new(transport);
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = ConversationController::new(transport.clone(), tx, policy);
        (controller, transport, rx)
    }

    async fn settle_chat(
        controller: &mut ConversationController,
        rx: &mut UnboundedReceiver<Completion>,
    ) {
        match rx.recv().await.expect("completion") {
            Completion::Chat { request, result } => {
                assert!(controller.complete_chat(request, result));
            }
            other => panic!("unexpected completion: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_successful_submits_alternate() {
        let (mut controller, _, mut rx) = setup(ScriptedTransport::new(), PendingPolicy::Reject);

        for i in 0..4 {
            controller.set_input(format!("question {i}"));
            assert!(matches!(controller.submit(), SubmitOutcome::Sent(_)));
            settle_chat(&mut controller, &mut rx).await;
        }

        let messages = controller.history().messages();
        assert_eq!(messages.len(), 8);
        for (i, pair) in messages.chunks(2).enumerate() {
            assert_eq!(pair[0], ConversationMessage::user(format!("question {i}")));
            assert_eq!(
                pair[1],
                ConversationMessage::assistant(format!("answer: question {i}"))
            );
        }
        assert_eq!(controller.state(), SendState::Idle);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let (mut controller, transport, _rx) =
            setup(ScriptedTransport::new(), PendingPolicy::Reject);

        for text in ["", "   ", "\n\t"] {
            controller.set_input(text);
            assert_eq!(
                controller.submit(),
                SubmitOutcome::Rejected(SubmitRejection::EmptyInput)
            );
        }

        let messages = controller.history().messages();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.role == Role::Assistant));
        assert!(messages[0].content.contains("enter a question"));
        assert_eq!(controller.state(), SendState::Idle);
        assert!(transport.chats().is_empty());
    }

    #[tokio::test]
    async fn test_request_carries_history_and_clears_input() {
        let (mut controller, transport, mut rx) =
            setup(ScriptedTransport::new(), PendingPolicy::Reject);

        controller.set_input("  What does GET /users return?  ");
        controller.submit();
        assert_eq!(controller.input(), "");
        settle_chat(&mut controller, &mut rx).await;

        controller.set_input("And POST?");
        controller.submit();
        settle_chat(&mut controller, &mut rx).await;

        let chats = transport.chats();
        assert_eq!(chats[0].question, "What does GET /users return?");
        assert_eq!(
            chats[0].history,
            vec![ConversationMessage::user("What does GET /users return?")]
        );
        assert_eq!(chats[1].history.len(), 3);
        assert_eq!(chats[1].history[2], ConversationMessage::user("And POST?"));
    }

    #[tokio::test]
    async fn test_reject_policy_while_pending() {
        let (mut controller, transport, mut rx) =
            setup(ScriptedTransport::new(), PendingPolicy::Reject);

        controller.set_input("first");
        let SubmitOutcome::Sent(request) = controller.submit() else {
            panic!("first submit should be sent");
        };
        assert_eq!(controller.state(), SendState::Pending(request));

        controller.set_input("second");
        assert_eq!(
            controller.submit(),
            SubmitOutcome::Rejected(SubmitRejection::StillPending)
        );
        assert_eq!(controller.input(), "second");

        settle_chat(&mut controller, &mut rx).await;

        let contents: Vec<&str> = controller
            .history()
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec![
                "first",
                "Still waiting for a response to your previous question.",
                "answer: first",
            ]
        );
        assert_eq!(transport.chats().len(), 1);
    }

    #[tokio::test]
    async fn test_queue_policy_preserves_order() {
        let (mut controller, transport, mut rx) =
            setup(ScriptedTransport::new(), PendingPolicy::Queue);

        controller.set_input("first");
        controller.submit();
        controller.set_input("second");
        assert_eq!(controller.submit(), SubmitOutcome::Queued { position: 1 });
        assert_eq!(controller.input(), "");
        assert_eq!(controller.history().len(), 1);

        settle_chat(&mut controller, &mut rx).await;
        assert_eq!(controller.queued(), 0);
        assert!(matches!(controller.state(), SendState::Pending(_)));

        settle_chat(&mut controller, &mut rx).await;

        let messages = controller.history().messages();
        assert_eq!(
            messages,
            &[
                ConversationMessage::user("first"),
                ConversationMessage::assistant("answer: first"),
                ConversationMessage::user("second"),
                ConversationMessage::assistant("answer: second"),
            ]
        );
        assert_eq!(transport.chats()[1].history.len(), 3);
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let (mut controller, _, mut rx) = setup(ScriptedTransport::new(), PendingPolicy::Reject);

        let applied = controller.complete_chat(
            Uuid::new_v4(),
            Ok(ChatReply {
                response: "ghost".into(),
            }),
        );
        assert!(!applied);
        assert!(controller.history().is_empty());

        controller.set_input("real");
        controller.submit();
        let applied = controller.complete_chat(
            Uuid::new_v4(),
            Ok(ChatReply {
                response: "ghost".into(),
            }),
        );
        assert!(!applied);
        settle_chat(&mut controller, &mut rx).await;
        assert_eq!(controller.history().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failures_become_messages() {
        let transport = ScriptedTransport::new()
            .with_chat(Err(ChatError::ServerError("db down".into())))
            .with_chat(Err(ChatError::NonJsonResponse))
            .with_chat(Err(ChatError::NetworkFailure("connection refused".into())))
            .with_chat(Err(ChatError::EmptyResponse));
        let (mut controller, _, mut rx) = setup(transport, PendingPolicy::Reject);

        for i in 0..4 {
            controller.set_input(format!("q{i}"));
            controller.submit();
            settle_chat(&mut controller, &mut rx).await;
        }

        let replies: Vec<&str> = controller
            .history()
            .messages()
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
            .collect();
        assert!(replies[0].contains("db down"));
        assert!(replies[1].contains("non-JSON"));
        assert!(replies[2].contains("could not reach"));
        assert!(!replies[2].contains("connection refused"));
        assert!(replies[3].contains("empty response"));

        // Still usable afterwards
        controller.set_input("again");
        assert!(matches!(controller.submit(), SubmitOutcome::Sent(_)));
    }

    #[tokio::test]
    async fn test_ingest_outcomes() {
        let transport = ScriptedTransport::new()
            .with_ingest(Ok(()))
            .with_ingest(Err(IngestError::new("Unsupported content type: image/png")));
        let (mut controller, transport, mut rx) = setup(transport, PendingPolicy::Reject);

        for _ in 0..2 {
            controller.ingest_page("https://docs.example.com/api");
            match rx.recv().await.expect("completion") {
                Completion::Ingest(result) => controller.complete_ingest(result),
                other => panic!("unexpected completion: {other:?}"),
            }
        }

        assert_eq!(transport.ingested().len(), 2);
        assert_eq!(controller.history().len(), 1);
        let last = controller.history().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.content.contains("Unsupported content type"));
    }

    #[test]
    fn test_transcript_html() {
        let (mut controller, _, _rx) = setup(ScriptedTransport::new(), PendingPolicy::Reject);
        controller.submit();
        assert_eq!(
            controller.transcript_html(),
            r#"<div class="message assistant-message">Please enter a question.</div>"#
        );
    }
}
