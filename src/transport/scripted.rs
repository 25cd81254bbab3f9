//! In-memory transport for controller and widget tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::conversation::ConversationMessage;

use super::{ChatError, ChatReply, ChatTransport, IngestError};

/// A recorded `/chat` call
#[derive(Debug, Clone)]
pub(crate) struct RecordedChat {
    pub question: String,
    pub history: Vec<ConversationMessage>,
}

/// Replays queued outcomes in order; once the script runs dry every chat is
/// answered with `answer: <question>`.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    chat_script: Mutex<VecDeque<Result<ChatReply, ChatError>>>,
    ingest_script: Mutex<VecDeque<Result<(), IngestError>>>,
    chats: Mutex<Vec<RecordedChat>>,
    ingested: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(self, outcome: Result<ChatReply, ChatError>) -> Self {
        self.chat_script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_ingest(self, outcome: Result<(), IngestError>) -> Self {
        self.ingest_script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn chats(&self) -> Vec<RecordedChat> {
        self.chats.lock().unwrap().clone()
    }

    pub fn ingested(&self) -> Vec<String> {
        self.ingested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send_chat(
        &self,
        question: &str,
        history: &[ConversationMessage],
    ) -> Result<ChatReply, ChatError> {
        self.chats.lock().unwrap().push(RecordedChat {
            question: question.to_string(),
            history: history.to_vec(),
        });

        self.chat_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ChatReply {
                    response: format!("answer: {question}"),
                })
            })
    }

    async fn ingest_page(&self, url: &str) -> Result<(), IngestError> {
        self.ingested.lock().unwrap().push(url.to_string());
        self.ingest_script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
