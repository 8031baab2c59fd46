//! Inbound message routing.
//!
//! Commands are answered for any origin. Anything else must come from an
//! allowed origin and contain the trigger keyword to reach the model.

use std::sync::Arc;
use std::time::Duration;

use parley_types::config::AssistantConfig;
use parley_types::inbound::{InboundMessage, Origin};
use tracing::debug;

use crate::chat::orchestrator::ChatOrchestrator;
use crate::clock::Clock;
use crate::command::{Command, CommandHandler, Parsed};
use crate::context::store::ContextStore;
use crate::llm::box_provider::BoxLlmProvider;
use crate::settings::Settings;
use crate::storage::kv_store::KvStore;
use crate::summary::manager::SummaryManager;
use crate::summary::worker::SummaryWorker;

/// Whether the message's origin is on the configured allow-list.
///
/// An empty list allows everyone. Entries match by substring so that both
/// `"123"` and `"QQ-Group:123"` cover the same group.
pub fn is_allowed(config: &AssistantConfig, message: &InboundMessage) -> bool {
    let (list, id) = match &message.origin {
        Origin::Group { group_id } => (&config.allowed_groups, group_id.as_str()),
        Origin::Private => (&config.allowed_private, message.sender.user_id.as_str()),
    };
    list.is_empty() || list.iter().any(|entry| entry.contains(id))
}

pub fn contains_keyword(config: &AssistantConfig, text: &str) -> bool {
    text.contains(config.trigger_keyword.as_str())
}

/// Routes inbound messages to commands or the chat orchestrator.
pub struct Dispatcher<S: KvStore> {
    orchestrator: ChatOrchestrator<S>,
    commands: CommandHandler<S>,
    contexts: Arc<ContextStore<S>>,
    settings: Arc<Settings<S>>,
    config: Arc<AssistantConfig>,
}

impl<S: KvStore + 'static> Dispatcher<S> {
    /// Wire the full service graph over one store and provider, and start
    /// the background summary worker. The worker must be shut down by the
    /// caller.
    pub fn build(
        store: Arc<S>,
        provider: BoxLlmProvider,
        config: AssistantConfig,
        clock: Arc<dyn Clock>,
        summary_delay: Duration,
    ) -> (Self, SummaryWorker) {
        let config = Arc::new(config);
        let provider = Arc::new(provider);
        let summaries = Arc::new(SummaryManager::new(
            store.clone(),
            provider.clone(),
            config.clone(),
            clock.clone(),
        ));
        let contexts = Arc::new(ContextStore::new(
            store.clone(),
            summaries,
            config.clone(),
            clock.clone(),
        ));
        let settings = Arc::new(Settings::new(store, config.clone()));
        let (queue, worker) = SummaryWorker::spawn(contexts.clone(), summary_delay);

        let orchestrator = ChatOrchestrator::new(
            contexts.clone(),
            provider,
            settings.clone(),
            queue,
            config.clone(),
            clock,
        );
        let commands = CommandHandler::new(contexts.clone(), settings.clone(), config.clone());

        let dispatcher = Self {
            orchestrator,
            commands,
            contexts,
            settings,
            config,
        };
        (dispatcher, worker)
    }
}

impl<S: KvStore> Dispatcher<S> {
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn contexts(&self) -> &ContextStore<S> {
        &self.contexts
    }

    pub fn settings(&self) -> &Settings<S> {
        &self.settings
    }

    pub fn orchestrator(&self) -> &ChatOrchestrator<S> {
        &self.orchestrator
    }

    /// Run an already-parsed command for a user.
    pub async fn run_command(&self, user_id: &str, command: &Command) -> String {
        self.commands.execute(user_id, command).await
    }

    /// Handle one inbound message. `None` means stay silent.
    pub async fn handle(&self, message: &InboundMessage) -> Option<String> {
        match Command::parse(&message.text) {
            Parsed::Command(command) => {
                Some(self.commands.execute(&message.sender.user_id, &command).await)
            }
            Parsed::Unknown(name) => {
                debug!(name = %name, "ignoring unknown command");
                None
            }
            Parsed::NotCommand => {
                if !is_allowed(&self.config, message) {
                    debug!(user_id = %message.sender.user_id, "origin not allowed");
                    return None;
                }
                if !contains_keyword(&self.config, &message.text) {
                    return None;
                }
                let outcome = self.orchestrator.chat(&message.sender, &message.text).await;
                Some(outcome.reply)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::transcript::Transcript;

    use crate::storage::memory::MemoryKvStore;
    use crate::testing::{MockProvider, fixed_clock};

    fn dispatcher(
        mock: MockProvider,
        config: AssistantConfig,
    ) -> (Dispatcher<MemoryKvStore>, SummaryWorker, Arc<MemoryKvStore>) {
        let store = Arc::new(MemoryKvStore::new());
        let (dispatcher, worker) = Dispatcher::build(
            store.clone(),
            BoxLlmProvider::new(mock),
            config,
            fixed_clock(),
            Duration::ZERO,
        );
        (dispatcher, worker, store)
    }

    fn open_config() -> AssistantConfig {
        AssistantConfig {
            allowed_groups: Vec::new(),
            allowed_private: Vec::new(),
            ..Default::default()
        }
    }

    #[test]
    fn test_allow_list_substring_match() {
        let config = AssistantConfig {
            allowed_groups: vec!["QQ-Group:123".to_string()],
            allowed_private: vec!["QQ:42".to_string()],
            ..Default::default()
        };
        assert!(is_allowed(&config, &InboundMessage::group("123", "QQ:9", "A", "hi")));
        assert!(!is_allowed(&config, &InboundMessage::group("999", "QQ:9", "A", "hi")));
        assert!(is_allowed(&config, &InboundMessage::private("QQ:42", "B", "hi")));
        assert!(!is_allowed(&config, &InboundMessage::private("QQ:7", "C", "hi")));
    }

    #[test]
    fn test_empty_allow_lists_admit_everyone() {
        let config = open_config();
        assert!(is_allowed(&config, &InboundMessage::group("1", "QQ:9", "A", "hi")));
        assert!(is_allowed(&config, &InboundMessage::private("QQ:7", "C", "hi")));
    }

    #[tokio::test]
    async fn test_keyword_required_for_chat() {
        let mock = MockProvider::replying("hey");
        let (dispatcher, worker, store) = dispatcher(mock.clone(), open_config());

        let quiet = InboundMessage::private("QQ:1", "Ann", "just talking");
        assert_eq!(dispatcher.handle(&quiet).await, None);
        assert!(mock.requests().is_empty());
        assert!(store.is_empty());

        let asked = InboundMessage::private("QQ:1", "Ann", "小伊 在吗");
        assert_eq!(dispatcher.handle(&asked).await.as_deref(), Some("hey"));
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_commands_skip_keyword_check() {
        let (dispatcher, worker, store) = dispatcher(MockProvider::default(), open_config());
        let message = InboundMessage::private("QQ:1", "Ann", ".重置AI");
        assert_eq!(
            dispatcher.handle(&message).await.as_deref(),
            Some("已重置对话和摘要")
        );
        let t = Transcript::decode(&store.get("QQ:1").await.unwrap().unwrap()).unwrap();
        assert_eq!(t.len(), 3);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_command_is_silent() {
        let mock = MockProvider::default();
        let (dispatcher, worker, _) = dispatcher(mock.clone(), open_config());
        let message = InboundMessage::private("QQ:1", "Ann", ".roll 小伊");
        assert_eq!(dispatcher.handle(&message).await, None);
        assert!(mock.requests().is_empty());
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_disallowed_origin_still_gets_commands() {
        let mock = MockProvider::default();
        let (dispatcher, worker, _) = dispatcher(mock.clone(), AssistantConfig::default());

        let group_reset = InboundMessage::group("QQ-Group:999", "QQ:5", "Bob", ".重置AI");
        assert_eq!(
            dispatcher.handle(&group_reset).await.as_deref(),
            Some("已重置对话和摘要")
        );
        let private_rounds = InboundMessage::private("QQ:5", "Bob", ".上下文状态");
        assert!(dispatcher.handle(&private_rounds).await.is_some());

        let chat = InboundMessage::group("QQ-Group:999", "QQ:5", "Bob", "小伊 你好");
        assert_eq!(dispatcher.handle(&chat).await, None);
        assert!(mock.requests().is_empty());
        worker.shutdown().await;
    }
}
