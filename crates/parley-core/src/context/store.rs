//! Per-user transcript lifecycle: load, repair, migrate, trim and persist.
//!
//! `ContextStore` is the only component that reads and writes the
//! `<user_id>` key. Every path out of it leaves a valid transcript behind:
//! unreadable or malformed blobs are replaced by a fresh conversation rather
//! than surfaced as errors.

use std::sync::Arc;

use parley_types::config::AssistantConfig;
use parley_types::llm::{Message, MessageRole};
use parley_types::summary::Summary;
use parley_types::transcript::Transcript;
use tracing::{debug, info, warn};

use super::migration;
use super::prompt::{greeting_transcript, reset_transcript, system_content};
use crate::clock::Clock;
use crate::storage::kv_store::KvStore;
use crate::summary::manager::SummaryManager;

/// Owns read-modify-write of per-user transcripts.
pub struct ContextStore<S: KvStore> {
    store: Arc<S>,
    summaries: Arc<SummaryManager<S>>,
    config: Arc<AssistantConfig>,
    clock: Arc<dyn Clock>,
}

impl<S: KvStore> ContextStore<S> {
    pub fn new(
        store: Arc<S>,
        summaries: Arc<SummaryManager<S>>,
        config: Arc<AssistantConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            summaries,
            config,
            clock,
        }
    }

    pub fn summaries(&self) -> &SummaryManager<S> {
        &self.summaries
    }

    /// Structural validity: non-empty and every message has content.
    pub fn validate(transcript: &Transcript) -> bool {
        transcript.is_valid()
    }

    /// Push a message. Callers follow up with [`enforce_limit`](Self::enforce_limit).
    pub fn append(transcript: &mut Transcript, role: MessageRole, content: impl Into<String>) {
        transcript.push(Message {
            role,
            content: content.into(),
        });
    }

    /// Make the first message a system message carrying `content`.
    pub fn ensure_system_message(transcript: &mut Transcript, content: &str) {
        let messages = transcript.messages_mut();
        match messages.first_mut() {
            Some(first) if first.role == MessageRole::System => {
                first.content = content.to_string();
            }
            Some(_) => messages.insert(0, Message::system(content)),
            None => messages.push(Message::system(content)),
        }
    }

    /// Persist a transcript. Store failures are logged; the in-memory
    /// transcript stays authoritative for the current turn.
    pub async fn save(&self, user_id: &str, transcript: &Transcript) {
        if let Err(e) = self.store.set(user_id, &transcript.encode()).await {
            warn!(user_id, error = %e, "failed to persist transcript");
        }
    }

    /// Load a user's transcript, repairing or migrating it as needed.
    pub async fn load(&self, user_id: &str) -> Transcript {
        let raw = match self.store.get(user_id).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(user_id, error = %e, "failed to read transcript, starting fresh");
                None
            }
        };

        let decoded = raw.as_deref().map(Transcript::decode);
        match decoded {
            Some(Ok(transcript)) if transcript.is_valid() => {
                let transcript = if migration::is_legacy(&transcript) {
                    info!(user_id, "migrating legacy transcript");
                    let migrated = migration::migrate(
                        transcript,
                        &self.config.role_prompt,
                        user_id,
                        self.clock.now(),
                    );
                    self.save(user_id, &migrated).await;
                    migrated
                } else {
                    transcript
                };
                debug!(user_id, rounds = transcript.rounds(), "transcript loaded");
                transcript
            }
            other => {
                match other {
                    Some(Ok(_)) => info!(user_id, "stored transcript invalid, starting fresh"),
                    Some(Err(e)) => info!(user_id, error = %e, "stored transcript unreadable, starting fresh"),
                    None => info!(user_id, "new conversation"),
                }
                let fresh =
                    greeting_transcript(&self.config.role_prompt, user_id, self.clock.now());
                self.save(user_id, &fresh).await;
                fresh
            }
        }
    }

    /// Load a transcript and run first-use summary initialization.
    ///
    /// If a summary is in effect afterwards (existing or freshly seeded), the
    /// system message is refreshed to carry it.
    pub async fn open(&self, user_id: &str) -> Transcript {
        let mut transcript = self.load(user_id).await;
        let summary = self.summaries.ensure_initialized(user_id, &transcript).await;
        if summary.has_content() {
            self.refresh_system_message(user_id, &mut transcript, &summary)
                .await;
        }
        transcript
    }

    /// Rewrite the system message from the persona plus `summary`, and
    /// persist. An invalid transcript is reset instead.
    pub async fn refresh_system_message(
        &self,
        user_id: &str,
        transcript: &mut Transcript,
        summary: &Summary,
    ) {
        if !transcript.is_valid() {
            info!(user_id, "transcript invalid during refresh, resetting");
            *transcript = self.reset(user_id).await;
            return;
        }

        let content = system_content(&self.config.role_prompt, Some(&summary.content));
        Self::ensure_system_message(transcript, &content);
        self.save(user_id, transcript).await;
    }

    /// Reload a user's transcript and summary from the store and refresh
    /// the system message. Used after a background summary update so a
    /// newer transcript is never overwritten with a stale copy.
    pub async fn refresh_from_store(&self, user_id: &str) -> Transcript {
        let mut transcript = self.load(user_id).await;
        let summary = self.summaries.load(user_id).await;
        self.refresh_system_message(user_id, &mut transcript, &summary)
            .await;
        transcript
    }

    /// Trim to `1 + 2 * max_rounds` messages, keeping the system message.
    ///
    /// Returns whether anything was evicted; a trimmed transcript is
    /// persisted immediately.
    pub async fn enforce_limit(
        &self,
        user_id: &str,
        transcript: &mut Transcript,
        max_rounds: usize,
    ) -> bool {
        if !trim_to_rounds(transcript, max_rounds, &self.config.role_prompt) {
            return false;
        }
        info!(user_id, max_rounds, "transcript trimmed to round limit");
        self.save(user_id, transcript).await;
        true
    }

    /// Replace the transcript with the canned reset conversation and clear
    /// the summary.
    pub async fn reset(&self, user_id: &str) -> Transcript {
        let transcript = reset_transcript(&self.config.role_prompt, user_id, self.clock.now());
        self.summaries.clear(user_id).await;
        self.save(user_id, &transcript).await;
        info!(user_id, "conversation and summary reset");
        transcript
    }
}

/// Pure trimming rule behind [`ContextStore::enforce_limit`].
///
/// The retained system message is the first one found anywhere in the
/// transcript, or a fresh one from `role_prompt` when there is none.
pub fn trim_to_rounds(transcript: &mut Transcript, max_rounds: usize, role_prompt: &str) -> bool {
    let keep = max_rounds * 2;
    if transcript.len() <= keep + 1 {
        return false;
    }

    let system = transcript
        .messages()
        .iter()
        .find(|m| m.role == MessageRole::System)
        .cloned()
        .unwrap_or_else(|| Message::system(role_prompt));

    let mut trimmed = Vec::with_capacity(keep + 1);
    trimmed.push(system);
    trimmed.extend_from_slice(transcript.tail(keep));
    *transcript = Transcript::new(trimmed);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::storage::memory::MemoryKvStore;
    use crate::testing::{MockProvider, fixed_clock};

    fn contexts() -> (ContextStore<MemoryKvStore>, Arc<MemoryKvStore>) {
        let store = Arc::new(MemoryKvStore::new());
        let config = Arc::new(AssistantConfig {
            role_prompt: "persona".to_string(),
            ..Default::default()
        });
        let summaries = Arc::new(SummaryManager::new(
            store.clone(),
            Arc::new(BoxLlmProvider::new(MockProvider::default())),
            config.clone(),
            fixed_clock(),
        ));
        (
            ContextStore::new(store.clone(), summaries, config, fixed_clock()),
            store,
        )
    }

    fn long_transcript(messages: usize) -> Transcript {
        let mut t = Transcript::new(vec![Message::system("persona")]);
        for i in 1..messages {
            if i % 2 == 1 {
                t.push(Message::user(format!("u{i}")));
            } else {
                t.push(Message::assistant(format!("a{i}")));
            }
        }
        t
    }

    #[test]
    fn test_validate() {
        assert!(ContextStore::<MemoryKvStore>::validate(&long_transcript(3)));
        assert!(!ContextStore::<MemoryKvStore>::validate(&Transcript::default()));
    }

    #[test]
    fn test_trim_forty_to_thirty_three() {
        let mut t = long_transcript(40);
        assert!(trim_to_rounds(&mut t, 16, "persona"));
        assert_eq!(t.len(), 33);
        assert_eq!(t.messages()[0].role, MessageRole::System);
        assert_eq!(t.messages()[32].content, "u39");
    }

    #[test]
    fn test_trim_noop_under_limit() {
        let mut t = long_transcript(5);
        assert!(!trim_to_rounds(&mut t, 2, "persona"));
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn test_trim_length_formula() {
        for rounds in 0..10usize {
            for max_rounds in 1..5usize {
                let mut t = long_transcript(1 + rounds * 2);
                trim_to_rounds(&mut t, max_rounds, "persona");
                assert_eq!(t.len(), 1 + rounds.min(max_rounds) * 2);
                assert_eq!(t.messages()[0].role, MessageRole::System);
            }
        }
    }

    #[test]
    fn test_trim_synthesizes_missing_system_message() {
        let mut t = Transcript::new(
            (0..6)
                .map(|i| Message::user(format!("u{i}")))
                .collect(),
        );
        assert!(trim_to_rounds(&mut t, 2, "persona"));
        assert_eq!(t.len(), 5);
        assert_eq!(t.system_message().unwrap().content, "persona");
    }

    #[test]
    fn test_ensure_system_message_cases() {
        let mut empty = Transcript::default();
        ContextStore::<MemoryKvStore>::ensure_system_message(&mut empty, "s");
        assert_eq!(empty.len(), 1);

        let mut first = long_transcript(3);
        ContextStore::<MemoryKvStore>::ensure_system_message(&mut first, "s2");
        assert_eq!(first.len(), 3);
        assert_eq!(first.messages()[0].content, "s2");

        let mut headless = Transcript::new(vec![Message::user("u")]);
        ContextStore::<MemoryKvStore>::ensure_system_message(&mut headless, "s3");
        assert_eq!(headless.len(), 2);
        assert_eq!(headless.system_message().unwrap().content, "s3");
    }

    #[tokio::test]
    async fn test_load_fresh_user_gets_greeting() {
        let (contexts, store) = contexts();
        let t = contexts.load("42").await;

        assert_eq!(t.len(), 3);
        assert_eq!(
            t.messages()[1].content,
            "from 新用户（QQ:42）[2026-01-19 12:00:00|43200s]: 你好"
        );
        assert!(store.get("42").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_repairs_garbage() {
        let (contexts, store) = contexts();
        for raw in ["not json", "[]", r#"[{"role":"user","content":""}]"#, r#"{"a":1}"#] {
            store.set("42", raw).await.unwrap();
            let t = contexts.load("42").await;
            assert!(t.is_valid());
            assert_eq!(t.messages()[2].content, "准备好啦~");
        }
    }

    #[tokio::test]
    async fn test_load_replaces_history_with_foreign_role() {
        let (contexts, store) = contexts();
        let raw = r#"[{"role":"system","content":"persona"},{"role":"user","content":"hi"},{"role":"tool","content":"{}"}]"#;
        store.set("42", raw).await.unwrap();

        let t = contexts.load("42").await;
        assert_eq!(t.len(), 3);
        assert_eq!(t.messages()[2].content, "准备好啦~");
        let persisted = Transcript::decode(&store.get("42").await.unwrap().unwrap()).unwrap();
        assert_eq!(persisted, t);
    }

    #[tokio::test]
    async fn test_load_migrates_and_persists() {
        let (contexts, store) = contexts();
        let legacy = Transcript::new(vec![
            Message::system("persona"),
            Message::user("from Ann(QQ:1): hello"),
            Message::assistant("hi"),
        ]);
        store.set("QQ:1", &legacy.encode()).await.unwrap();

        let t = contexts.load("QQ:1").await;
        assert_eq!(
            t.messages()[1].content,
            "from Ann(QQ:1)[2026-01-19 12:00:00|43200s]: hello"
        );
        let persisted = Transcript::decode(&store.get("QQ:1").await.unwrap().unwrap()).unwrap();
        assert_eq!(persisted, t);
    }

    #[tokio::test]
    async fn test_enforce_limit_persists() {
        let (contexts, store) = contexts();
        let mut t = long_transcript(40);
        assert!(contexts.enforce_limit("u", &mut t, 16).await);
        let persisted = Transcript::decode(&store.get("u").await.unwrap().unwrap()).unwrap();
        assert_eq!(persisted.len(), 33);
    }

    #[tokio::test]
    async fn test_reset_clears_summary() {
        let (contexts, store) = contexts();
        contexts.summaries().save("42", "something").await;

        let t = contexts.reset("42").await;
        assert_eq!(t.messages()[2].content, "检测到问题，已自动重置对话~");
        assert!(!contexts.summaries().load("42").await.has_content());
        assert!(store.get("42_summary").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_open_applies_existing_summary() {
        let (contexts, _) = contexts();
        contexts.summaries().save("42", "likes tea").await;

        let t = contexts.open("42").await;
        assert_eq!(
            t.system_message().unwrap().content,
            "persona\n\n【先前对话摘要】\nlikes tea\n——————————\n"
        );
    }

    #[tokio::test]
    async fn test_refresh_resets_invalid_transcript() {
        let (contexts, _) = contexts();
        let mut t = Transcript::new(vec![Message::system("persona"), Message::user("")]);
        contexts
            .refresh_system_message("42", &mut t, &Summary::empty("now"))
            .await;
        assert_eq!(t.messages()[2].content, "检测到问题，已自动重置对话~");
    }
}
