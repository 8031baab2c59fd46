//! Per-user running summary: persistence, local seeding and LLM refresh.
//!
//! The summary lives under `<user_id>_summary` and is the only memory of
//! rounds trimmed out of the transcript. `SummaryManager` is the sole writer
//! of that key.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parley_types::config::{AssistantConfig, SUMMARY_TEMPERATURE};
use parley_types::llm::{CompletionRequest, LlmError, Message, MessageRole};
use parley_types::summary::{StoredSummary, Summary};
use parley_types::transcript::Transcript;
use regex::Regex;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::clock::{Clock, format_timestamp};
use crate::llm::box_provider::BoxLlmProvider;
use crate::storage::kv_store::KvStore;

/// Transcripts shorter than this are not worth summarizing.
pub const MIN_MESSAGES_FOR_SUMMARY: usize = 4;

/// How many trailing transcript messages a resummarization request carries.
const RESUMMARIZE_WINDOW: usize = 6;

const SEED_WINDOW: usize = 4;
const SEED_PREFIX: &str = "历史对话包含以下内容：";
const SEED_MIN_CHARS: usize = 10;
const SEED_MAX_CHARS: usize = 50;
const SEED_MAX_TOPICS: usize = 3;

/// Storage key of a user's summary.
pub fn summary_key(user_id: &str) -> String {
    format!("{user_id}_summary")
}

fn speaker_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"from .+?\[.+?\]: ").expect("valid regex"))
}

/// Build a summary from recent user turns without calling the model.
///
/// Looks at the last four messages, strips the speaker tag from user turns,
/// keeps those longer than ten characters and joins up to three of them.
/// Returns `None` when nothing qualifies.
pub fn seed_summary(transcript: &Transcript) -> Option<String> {
    let topics: Vec<String> = transcript
        .tail(SEED_WINDOW)
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| speaker_tag().replace(&m.content, "").into_owned())
        .filter(|text| text.chars().count() > SEED_MIN_CHARS)
        .map(|text| {
            if text.chars().count() > SEED_MAX_CHARS {
                let head: String = text.chars().take(SEED_MAX_CHARS).collect();
                format!("{head}...")
            } else {
                text
            }
        })
        .take(SEED_MAX_TOPICS)
        .collect();

    if topics.is_empty() {
        None
    } else {
        Some(format!("{SEED_PREFIX}{}", topics.join("；")))
    }
}

/// Owns load/save of the per-user summary and its LLM refresh.
pub struct SummaryManager<S: KvStore> {
    store: Arc<S>,
    provider: Arc<BoxLlmProvider>,
    config: Arc<AssistantConfig>,
    clock: Arc<dyn Clock>,
}

impl<S: KvStore> SummaryManager<S> {
    pub fn new(
        store: Arc<S>,
        provider: Arc<BoxLlmProvider>,
        config: Arc<AssistantConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            provider,
            config,
            clock,
        }
    }

    fn now(&self) -> String {
        format_timestamp(self.clock.now())
    }

    /// Load a user's summary. Missing, unreadable or unusable blobs all
    /// yield an empty summary.
    pub async fn load(&self, user_id: &str) -> Summary {
        let now = self.now();
        match self.store.get(&summary_key(user_id)).await {
            Ok(Some(raw)) => StoredSummary::decode(&raw).into_summary(&now),
            Ok(None) => Summary::empty(now),
            Err(e) => {
                warn!(user_id, error = %e, "failed to read summary, treating as empty");
                Summary::empty(now)
            }
        }
    }

    /// Overwrite a user's summary, stamped with the current time.
    pub async fn save(&self, user_id: &str, content: &str) -> Summary {
        let summary = Summary::new(content, self.now());
        if let Err(e) = self
            .store
            .set(&summary_key(user_id), &summary.encode())
            .await
        {
            warn!(user_id, error = %e, "failed to persist summary");
        } else {
            debug!(user_id, len = content.chars().count(), "summary saved");
        }
        summary
    }

    pub async fn clear(&self, user_id: &str) -> Summary {
        self.save(user_id, "").await
    }

    /// First-use initialization for a user.
    ///
    /// When the transcript already holds more than three messages but no
    /// summary exists, a seed summary is synthesized locally and saved.
    /// Returns the summary now in effect.
    pub async fn ensure_initialized(&self, user_id: &str, transcript: &Transcript) -> Summary {
        let summary = self.load(user_id).await;
        if summary.has_content() || transcript.len() <= 3 {
            return summary;
        }

        match seed_summary(transcript) {
            Some(seed) => {
                info!(user_id, "seeded summary from recent turns");
                self.save(user_id, &seed).await
            }
            None => summary,
        }
    }

    /// Request used to refresh the summary from the recent transcript.
    pub fn build_request(&self, previous: &Summary, transcript: &Transcript) -> CompletionRequest {
        let mut messages = Vec::with_capacity(RESUMMARIZE_WINDOW + 2);
        if previous.has_content() {
            messages.push(Message::system(format!(
                "之前的对话摘要：{}\n\n请基于这个摘要和最新的对话内容，更新对话摘要。",
                previous.content
            )));
        }
        messages.extend_from_slice(transcript.tail(RESUMMARIZE_WINDOW));
        messages.push(Message::user(self.config.summary_prompt.clone()));

        CompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.effective_summary_tokens(),
            temperature: Some(SUMMARY_TEMPERATURE),
        }
    }

    /// Ask the model for an updated summary and save it.
    ///
    /// Returns `Ok(None)` without calling the model when the transcript is
    /// too short to be worth summarizing.
    pub async fn resummarize(
        &self,
        user_id: &str,
        transcript: &Transcript,
    ) -> Result<Option<Summary>, LlmError> {
        if transcript.len() < MIN_MESSAGES_FOR_SUMMARY {
            debug!(user_id, len = transcript.len(), "transcript too short to summarize");
            return Ok(None);
        }

        let previous = self.load(user_id).await;
        let request = self.build_request(&previous, transcript);

        let span = info_span!(
            "gen_ai.summarize",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            user_id,
        );

        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        let response = self
            .provider
            .complete_with_timeout(&request, timeout)
            .instrument(span)
            .await?;

        let content = response.content.trim();
        info!(user_id, had_previous = previous.has_content(), "summary refreshed");
        Ok(Some(self.save(user_id, content).await))
    }
}
