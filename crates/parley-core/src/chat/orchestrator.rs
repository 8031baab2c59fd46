//! One chat turn, end to end.
//!
//! ```text
//! Idle -> ContextRefreshed -> TurnAppended -> Trimmed -> RequestAssembled
//!      -> AwaitingCompletion -> Delivered | Failed
//! ```
//!
//! Any remote failure resets the user's conversation and summary and
//! answers with a plain-text notice, so the next turn starts clean.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parley_types::config::AssistantConfig;
use parley_types::inbound::Sender;
use parley_types::llm::{CompletionRequest, LlmError, MessageRole};
use parley_types::transcript::Transcript;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::clock::Clock;
use crate::context::prompt::user_turn;
use crate::context::store::ContextStore;
use crate::library::LibraryAggregator;
use crate::llm::box_provider::BoxLlmProvider;
use crate::sanitize::render_reply;
use crate::settings::Settings;
use crate::storage::kv_store::KvStore;
use crate::summary::worker::SummaryQueue;

/// Progress of a single turn, logged as it advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    ContextRefreshed,
    TurnAppended,
    Trimmed,
    RequestAssembled,
    AwaitingCompletion,
    Delivered,
    Failed,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnState::Idle => "idle",
            TurnState::ContextRefreshed => "context_refreshed",
            TurnState::TurnAppended => "turn_appended",
            TurnState::Trimmed => "trimmed",
            TurnState::RequestAssembled => "request_assembled",
            TurnState::AwaitingCompletion => "awaiting_completion",
            TurnState::Delivered => "delivered",
            TurnState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub state: TurnState,
}

impl TurnOutcome {
    pub fn delivered(&self) -> bool {
        self.state == TurnState::Delivered
    }
}

/// Text sent back when a completion fails.
pub fn failure_notice(error: &LlmError) -> String {
    format!("请求失败: {error}\n已自动重置对话，请重试")
}

pub struct ChatOrchestrator<S: KvStore> {
    contexts: Arc<ContextStore<S>>,
    provider: Arc<BoxLlmProvider>,
    settings: Arc<Settings<S>>,
    libraries: LibraryAggregator,
    queue: SummaryQueue,
    config: Arc<AssistantConfig>,
    clock: Arc<dyn Clock>,
}

impl<S: KvStore> ChatOrchestrator<S> {
    pub fn new(
        contexts: Arc<ContextStore<S>>,
        provider: Arc<BoxLlmProvider>,
        settings: Arc<Settings<S>>,
        queue: SummaryQueue,
        config: Arc<AssistantConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            contexts,
            provider,
            settings,
            libraries: LibraryAggregator::new(config.libraries.clone()),
            queue,
            config,
            clock,
        }
    }

    fn advance(user_id: &str, state: &mut TurnState, next: TurnState) {
        debug!(user_id, from = %state, to = %next, "chat turn");
        *state = next;
    }

    /// Outbound request: the transcript with library text appended to a
    /// copy of the system message. The transcript itself is untouched.
    pub fn assemble_request(&self, transcript: &Transcript, temperature: f64) -> CompletionRequest {
        let mut messages = transcript.messages().to_vec();
        let libraries = self.libraries.aggregate();
        if !libraries.is_empty() {
            if let Some(system) = messages.iter_mut().find(|m| m.role == MessageRole::System) {
                system.content = format!("{}\n\n{}", system.content, libraries);
            }
        }

        CompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.effective_reply_tokens(),
            temperature: Some(temperature),
        }
    }

    /// Run one chat turn for `sender` and return the text to deliver.
    pub async fn chat(&self, sender: &Sender, text: &str) -> TurnOutcome {
        let user_id = sender.user_id.as_str();
        let mut state = TurnState::Idle;

        let mut transcript = self.contexts.open(user_id).await;
        let summary = self.contexts.summaries().load(user_id).await;
        self.contexts
            .refresh_system_message(user_id, &mut transcript, &summary)
            .await;
        if !ContextStore::<S>::validate(&transcript) {
            transcript = self.contexts.reset(user_id).await;
        }
        Self::advance(user_id, &mut state, TurnState::ContextRefreshed);

        let turn = user_turn(&sender.nickname, user_id, self.clock.now(), text);
        ContextStore::<S>::append(&mut transcript, MessageRole::User, turn);
        Self::advance(user_id, &mut state, TurnState::TurnAppended);

        self.contexts
            .enforce_limit(user_id, &mut transcript, self.config.effective_max_rounds())
            .await;
        Self::advance(user_id, &mut state, TurnState::Trimmed);

        let temperature = self.settings.temperature().await;
        let request = self.assemble_request(&transcript, temperature);
        Self::advance(user_id, &mut state, TurnState::RequestAssembled);

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = temperature,
            user_id,
        );
        Self::advance(user_id, &mut state, TurnState::AwaitingCompletion);
        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        let result = self
            .provider
            .complete_with_timeout(&request, timeout)
            .instrument(span)
            .await
            .and_then(|response| {
                if response.content.trim().is_empty() {
                    Err(LlmError::EmptyResponse)
                } else {
                    Ok(response)
                }
            });

        match result {
            Ok(response) => {
                ContextStore::<S>::append(
                    &mut transcript,
                    MessageRole::Assistant,
                    response.content.clone(),
                );
                self.contexts.save(user_id, &transcript).await;
                self.queue.enqueue(user_id);

                let reply = render_reply(&response.content);
                Self::advance(user_id, &mut state, TurnState::Delivered);
                info!(
                    user_id,
                    rounds = transcript.rounds(),
                    len = reply.chars().count(),
                    "reply delivered"
                );
                TurnOutcome { reply, state }
            }
            Err(e) => {
                warn!(user_id, error = %e, "completion failed, resetting conversation");
                self.contexts.reset(user_id).await;
                Self::advance(user_id, &mut state, TurnState::Failed);
                TurnOutcome {
                    reply: failure_notice(&e),
                    state,
                }
            }
        }
    }
}
