//! Canned transcripts and message text formats.

use chrono::NaiveDateTime;
use parley_types::llm::Message;
use parley_types::transcript::Transcript;

use crate::clock::time_tag;

const SUMMARY_HEADER: &str = "【先前对话摘要】";
const SUMMARY_FOOTER: &str = "——————————";

/// System message content: the persona, followed by the summary block when
/// the summary has any non-blank text.
pub fn system_content(role_prompt: &str, summary: Option<&str>) -> String {
    match summary.map(str::trim).filter(|s| !s.is_empty()) {
        Some(summary) => {
            format!("{role_prompt}\n\n{SUMMARY_HEADER}\n{summary}\n{SUMMARY_FOOTER}\n")
        }
        None => role_prompt.to_string(),
    }
}

/// `from <nickname>（<user_id>）[<ts>|<secs>s]: <text>`
pub fn user_turn(nickname: &str, user_id: &str, at: NaiveDateTime, text: &str) -> String {
    format!("from {nickname}（{user_id}）{}: {text}", time_tag(at))
}

/// Turn text attributed to the system speaker, used for canned and
/// migrated messages.
pub fn system_speaker_turn(user_id: &str, at: NaiveDateTime, text: &str) -> String {
    format!("from 系统（QQ:{user_id}）{}: {text}", time_tag(at))
}

/// Fresh conversation for a user with no usable history.
pub fn greeting_transcript(role_prompt: &str, user_id: &str, at: NaiveDateTime) -> Transcript {
    Transcript::new(vec![
        Message::system(role_prompt),
        Message::user(format!(
            "from 新用户（QQ:{user_id}）{}: 你好",
            time_tag(at)
        )),
        Message::assistant("准备好啦~"),
    ])
}

/// Conversation written after a reset or a failed completion.
pub fn reset_transcript(role_prompt: &str, user_id: &str, at: NaiveDateTime) -> Transcript {
    Transcript::new(vec![
        Message::system(role_prompt),
        Message::user(system_speaker_turn(user_id, at, "对话已重置")),
        Message::assistant("检测到问题，已自动重置对话~"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::noon;

    #[test]
    fn test_system_content_without_summary() {
        assert_eq!(system_content("persona", None), "persona");
        assert_eq!(system_content("persona", Some("  ")), "persona");
    }

    #[test]
    fn test_system_content_with_summary() {
        assert_eq!(
            system_content("persona", Some(" likes cats \n")),
            "persona\n\n【先前对话摘要】\nlikes cats\n——————————\n"
        );
    }

    #[test]
    fn test_user_turn_format() {
        assert_eq!(
            user_turn("Ann", "QQ:1", noon(), "小伊 hi"),
            "from Ann（QQ:1）[2026-01-19 12:00:00|43200s]: 小伊 hi"
        );
    }

    #[test]
    fn test_greeting_transcript() {
        let t = greeting_transcript("persona", "42", noon());
        assert_eq!(t.len(), 3);
        assert!(t.is_valid());
        assert_eq!(
            t.messages()[1].content,
            "from 新用户（QQ:42）[2026-01-19 12:00:00|43200s]: 你好"
        );
        assert_eq!(t.messages()[2].content, "准备好啦~");
    }

    #[test]
    fn test_reset_transcript() {
        let t = reset_transcript("persona", "42", noon());
        assert_eq!(t.system_message().unwrap().content, "persona");
        assert_eq!(
            t.messages()[1].content,
            "from 系统（QQ:42）[2026-01-19 12:00:00|43200s]: 对话已重置"
        );
        assert_eq!(t.messages()[2].content, "检测到问题，已自动重置对话~");
    }
}
