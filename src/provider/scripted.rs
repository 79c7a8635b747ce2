//! In-process provider that replays canned replies.
//!
//! Used as the test double for the generation pipeline and for offline dry runs.
//! Replies may carry a delay (honours tokio's paused clock) or an upstream error.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient, TokenUsage};
use crate::error::ApiError;

/// One scripted outcome
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    outcome: Result<String, String>,
    delay: Option<Duration>,
}

impl ScriptedReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            outcome: Ok(content.into()),
            delay: None,
        }
    }

    /// Reply that fails with `UpstreamUnavailable`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(reason.into()),
            delay: None,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Responder = dyn Fn(&[ChatMessage], usize) -> ScriptedReply + Send + Sync;

pub struct ScriptedProvider {
    model: String,
    responder: Box<Responder>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    /// Replies are consumed in order; once exhausted every call fails upstream.
    pub fn sequence(model: impl Into<String>, replies: Vec<ScriptedReply>) -> Self {
        let queue = Mutex::new(VecDeque::from(replies));
        Self::from_fn(model, move |_, _| {
            queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| ScriptedReply::unavailable("scripted replies exhausted"))
        })
    }

    /// Same reply for every call.
    pub fn repeating(model: impl Into<String>, reply: ScriptedReply) -> Self {
        Self::from_fn(model, move |_, _| reply.clone())
    }

    /// Reply computed from the request messages and the zero-based call index.
    pub fn from_fn<F>(model: impl Into<String>, responder: F) -> Self
    where
        F: Fn(&[ChatMessage], usize) -> ScriptedReply + Send + Sync + 'static,
    {
        Self {
            model: model.into(),
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of `complete` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages of every call, in call order.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ModelProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = (self.responder)(&messages, index);
        self.requests.lock().push(messages);

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }

        match reply.outcome {
            Ok(content) => {
                let completion_tokens = (content.len() / 4) as u32;
                Ok(CompletionResponse {
                    content,
                    model: self.model.clone(),
                    usage: TokenUsage {
                        prompt_tokens: 100,
                        completion_tokens,
                        total_tokens: 100 + completion_tokens,
                    },
                    finish_reason: Some("stop".to_string()),
                })
            }
            Err(reason) => Err(ApiError::UpstreamUnavailable(reason)),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
