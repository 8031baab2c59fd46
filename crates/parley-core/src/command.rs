//! Chat commands: parsing and execution.
//!
//! A message whose first character is `.` or `。` is a command. Each command
//! has a Chinese name (what users in chat type) and an English alias (what
//! the CLI shows). Replies are plain text.

use std::fmt;
use std::sync::Arc;

use parley_types::config::{AssistantConfig, parse_temperature_strict};
use tracing::{info, warn};

use crate::context::store::ContextStore;
use crate::library::LibraryAggregator;
use crate::settings::Settings;
use crate::storage::kv_store::KvStore;

const COMMAND_PREFIXES: [char; 2] = ['.', '。'];

const TEMPERATURE_GUIDE: &str = "推荐设置:\n0.0 - 代码生成/数学解题\n1.0 - 数据抽取/分析\n1.3 - 通用对话/翻译\n1.5 - 创意类写作/诗歌创作";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reset,
    Check,
    RefreshRole,
    Rounds,
    ShowSummary,
    Resummarize,
    ShowTemperature,
    SetTemperature(Option<String>),
    Libraries,
    Help,
}

/// How a piece of inbound text classifies.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    NotCommand,
    /// Command prefix with a name nobody here handles.
    Unknown(String),
    Command(Command),
}

impl Command {
    /// All commands in help order (argument-carrying ones with no argument).
    pub const ALL: [Command; 10] = [
        Command::Reset,
        Command::Check,
        Command::RefreshRole,
        Command::Rounds,
        Command::ShowSummary,
        Command::Resummarize,
        Command::ShowTemperature,
        Command::SetTemperature(None),
        Command::Libraries,
        Command::Help,
    ];

    /// Name typed in chat.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Reset => "重置AI",
            Command::Check => "检查对话",
            Command::RefreshRole => "更新角色",
            Command::Rounds => "上下文状态",
            Command::ShowSummary => "查看摘要",
            Command::Resummarize => "更新摘要",
            Command::ShowTemperature => "查看Temperature",
            Command::SetTemperature(_) => "设置Temperature",
            Command::Libraries => "资料库状态",
            Command::Help => "deepseekai",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Command::Reset => "reset",
            Command::Check => "check",
            Command::RefreshRole => "refresh-role",
            Command::Rounds => "rounds",
            Command::ShowSummary => "summary",
            Command::Resummarize => "resummarize",
            Command::ShowTemperature => "temperature",
            Command::SetTemperature(_) => "set-temperature",
            Command::Libraries => "libraries",
            Command::Help => "help",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Reset => "重置对话上下文和摘要",
            Command::Check => "检查当前对话状态",
            Command::RefreshRole => "更新系统角色设定",
            Command::Rounds => "查看保存的对话轮数",
            Command::ShowSummary => "查看当前的对话摘要",
            Command::Resummarize => "手动更新对话摘要",
            Command::ShowTemperature => "查看当前Temperature设置",
            Command::SetTemperature(_) => "设置Temperature值 (0.0-2.0)",
            Command::Libraries => "查看资料库配置状态",
            Command::Help => "查看帮助",
        }
    }

    /// Look a command up by chat name or alias (case-insensitive).
    pub fn from_name(name: &str, arg: Option<&str>) -> Option<Command> {
        let wanted = name.to_lowercase();
        Command::ALL
            .into_iter()
            .find(|c| c.name().to_lowercase() == wanted || c.alias() == wanted)
            .map(|c| match c {
                Command::SetTemperature(_) => Command::SetTemperature(arg.map(str::to_string)),
                other => other,
            })
    }

    /// Classify inbound text.
    pub fn parse(text: &str) -> Parsed {
        let trimmed = text.trim_start();
        let Some(body) = trimmed.strip_prefix(COMMAND_PREFIXES) else {
            return Parsed::NotCommand;
        };

        let mut words = body.split_whitespace();
        let Some(name) = words.next() else {
            return Parsed::Unknown(String::new());
        };
        match Command::from_name(name, words.next()) {
            Some(command) => Parsed::Command(command),
            None => Parsed::Unknown(name.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

/// Executes commands against one user's state.
pub struct CommandHandler<S: KvStore> {
    contexts: Arc<ContextStore<S>>,
    settings: Arc<Settings<S>>,
    libraries: LibraryAggregator,
    config: Arc<AssistantConfig>,
}

impl<S: KvStore> CommandHandler<S> {
    pub fn new(
        contexts: Arc<ContextStore<S>>,
        settings: Arc<Settings<S>>,
        config: Arc<AssistantConfig>,
    ) -> Self {
        Self {
            contexts,
            settings,
            libraries: LibraryAggregator::new(config.libraries.clone()),
            config,
        }
    }

    #[tracing::instrument(name = "command", skip(self, command), fields(command = %command))]
    pub async fn execute(&self, user_id: &str, command: &Command) -> String {
        info!(user_id, "executing command");
        match command {
            Command::Reset => {
                self.contexts.reset(user_id).await;
                "已重置对话和摘要".to_string()
            }
            Command::Check => self.check(user_id).await,
            Command::RefreshRole => {
                let mut transcript = self.contexts.open(user_id).await;
                let summary = self.contexts.summaries().load(user_id).await;
                self.contexts
                    .refresh_system_message(user_id, &mut transcript, &summary)
                    .await;
                "系统角色已更新为最新配置".to_string()
            }
            Command::Rounds => {
                let transcript = self.contexts.open(user_id).await;
                format!(
                    "当前保存: {}轮对话（最大{}轮）",
                    transcript.rounds(),
                    self.config.effective_max_rounds()
                )
            }
            Command::ShowSummary => {
                let summary = self.contexts.summaries().load(user_id).await;
                let body = if summary.has_content() {
                    format!(
                        "最后更新: {}\n对话摘要: {}",
                        summary.last_updated, summary.content
                    )
                } else {
                    "暂无对话摘要".to_string()
                };
                format!("对话摘要信息:\n{body}")
            }
            Command::Resummarize => self.resummarize(user_id).await,
            Command::ShowTemperature => {
                let temperature = self.settings.temperature().await;
                format!("当前Temperature: {temperature}\n{TEMPERATURE_GUIDE}")
            }
            Command::SetTemperature(value) => self.set_temperature(value.as_deref()).await,
            Command::Libraries => self.library_status(),
            Command::Help => self.help().await,
        }
    }

    async fn check(&self, user_id: &str) -> String {
        let transcript = self.contexts.open(user_id).await;
        if !ContextStore::<S>::validate(&transcript) {
            return "对话数据异常，建议使用【重置AI】".to_string();
        }
        let summary = self.contexts.summaries().load(user_id).await;
        let status = if summary.content.is_empty() {
            "未生成"
        } else {
            "已生成"
        };
        format!("当前对话状态正常\n摘要状态: {status}")
    }

    async fn resummarize(&self, user_id: &str) -> String {
        let transcript = self.contexts.open(user_id).await;
        match self
            .contexts
            .summaries()
            .resummarize(user_id, &transcript)
            .await
        {
            Ok(Some(_)) => {
                self.contexts.refresh_from_store(user_id).await;
                "对话摘要已更新".to_string()
            }
            Ok(None) => {
                info!(user_id, "not enough conversation to summarize");
                "摘要更新失败".to_string()
            }
            Err(e) => {
                warn!(user_id, error = %e, "manual resummarization failed");
                "摘要更新失败".to_string()
            }
        }
    }

    async fn set_temperature(&self, value: Option<&str>) -> String {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return "请提供Temperature值，例如: .设置Temperature 1.3".to_string();
        };
        let Some(temperature) = parse_temperature_strict(value) else {
            return "Temperature值必须在0.0到2.0之间".to_string();
        };
        match self.settings.set_temperature(value).await {
            Ok(()) => format!("Temperature已设置为: {temperature}\n{TEMPERATURE_GUIDE}"),
            Err(e) => {
                warn!(error = %e, "failed to persist temperature override");
                format!("Temperature设置失败: {e}")
            }
        }
    }

    fn library_status(&self) -> String {
        let mut out = String::from("资料库状态:\n\n");
        for stat in self.libraries.stats() {
            out.push_str(&format!(
                "【{}】\n配置项: {}\n内容长度: {}字符\n状态: {}\n\n",
                stat.label,
                stat.name,
                stat.content_length,
                configured(stat.has_content)
            ));
        }
        out.trim().to_string()
    }

    async fn help(&self) -> String {
        let mut out = String::from("Parley 指令：\n\n基础指令:\n");
        for (i, command) in Command::ALL.iter().take(9).enumerate() {
            out.push_str(&format!(
                "{}. {} ({}) - {}\n",
                i + 1,
                command.name(),
                command.alias(),
                command.description()
            ));
        }

        let stats = self.libraries.stats();
        out.push_str("\n当前状态:\n");
        out.push_str(&format!("Temperature: {}\n", self.settings.temperature().await));
        out.push_str(&format!("资料库数量: {}个\n", stats.len()));
        for stat in &stats {
            out.push_str(&format!(
                "{}: {}字符 [{}]\n",
                stat.label,
                stat.content_length,
                configured(stat.has_content)
            ));
        }
        out.push_str(&format!("触发词: {}\n", self.config.trigger_keyword));
        out.push_str(&format!("版本: {}", env!("CARGO_PKG_VERSION")));
        out
    }
}

fn configured(has_content: bool) -> &'static str {
    if has_content { "已配置" } else { "未配置" }
}
