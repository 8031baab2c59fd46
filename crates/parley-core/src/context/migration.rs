//! Upgrade of transcripts written before user turns carried a time tag.
//!
//! Old user turns look like `from Ann(QQ:1): text`; current ones look like
//! `from Ann（QQ:1）[2026-01-19 12:00:00|43200s]: text`. The detection
//! predicate below is kept byte-for-byte compatible with stored data, so a
//! migrated transcript is left alone on the next load.

use chrono::NaiveDateTime;
use parley_types::llm::{Message, MessageRole};
use parley_types::transcript::Transcript;

use super::prompt::system_speaker_turn;
use crate::clock::time_tag;

const LEGACY_SEPARATOR: &str = "): ";
const TAGGED_MARKER: &str = ")[";

/// A transcript is legacy if any user turn has the old `(...): ` speaker
/// separator without a time tag after the closing parenthesis.
pub fn is_legacy(transcript: &Transcript) -> bool {
    transcript.messages().iter().any(|m| {
        m.role == MessageRole::User
            && m.content.contains(LEGACY_SEPARATOR)
            && !m.content.contains(TAGGED_MARKER)
    })
}

/// Rewrite a legacy transcript into the current format.
///
/// System messages move to the front (one is created from `role_prompt` if
/// there were none). Untagged user turns are re-tagged with `at`; every
/// other message passes through unchanged. Applying this twice gives the
/// same result as applying it once.
pub fn migrate(
    transcript: Transcript,
    role_prompt: &str,
    user_id: &str,
    at: NaiveDateTime,
) -> Transcript {
    let (system, rest): (Vec<Message>, Vec<Message>) = transcript
        .into_messages()
        .into_iter()
        .partition(|m| m.role == MessageRole::System);

    let mut migrated = if system.is_empty() {
        vec![Message::system(role_prompt)]
    } else {
        system
    };

    migrated.extend(rest.into_iter().map(|m| {
        if m.role == MessageRole::User && !m.content.contains('[') {
            Message::user(retag(&m.content, user_id, at))
        } else {
            m
        }
    }));

    Transcript::new(migrated)
}

fn retag(content: &str, user_id: &str, at: NaiveDateTime) -> String {
    if content.starts_with("from ") && content.contains(LEGACY_SEPARATOR) {
        let parts: Vec<&str> = content.split(LEGACY_SEPARATOR).collect();
        if let [speaker, text] = parts.as_slice() {
            return format!("{speaker}){}: {text}", time_tag(at));
        }
    }
    system_speaker_turn(user_id, at, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::noon;

    fn legacy() -> Transcript {
        Transcript::new(vec![
            Message::system("persona"),
            Message::user("from Ann(QQ:1): hello"),
            Message::assistant("hi Ann"),
            Message::user("from Ann(QQ:1): a): b"),
            Message::assistant("ok"),
        ])
    }

    #[test]
    fn test_detects_untagged_user_turns() {
        assert!(is_legacy(&legacy()));
    }

    #[test]
    fn test_tagged_turns_not_legacy() {
        let t = Transcript::new(vec![
            Message::system("persona"),
            Message::user("from Ann(QQ:1)[2026-01-19 12:00:00|43200s]: hello"),
        ]);
        assert!(!is_legacy(&t));
    }

    #[test]
    fn test_assistant_turns_ignored_by_detection() {
        let t = Transcript::new(vec![
            Message::system("persona"),
            Message::assistant("from Ann(QQ:1): hello"),
        ]);
        assert!(!is_legacy(&t));
    }

    #[test]
    fn test_migrate_retags_user_turns() {
        let migrated = migrate(legacy(), "fallback", "QQ:1", noon());
        let m = migrated.messages();

        assert_eq!(m[0].content, "persona");
        assert_eq!(
            m[1].content,
            "from Ann(QQ:1)[2026-01-19 12:00:00|43200s]: hello"
        );
        assert_eq!(m[2].content, "hi Ann");
        // Two separators: not a clean split, so the system speaker takes it.
        assert_eq!(
            m[3].content,
            "from 系统（QQ:QQ:1）[2026-01-19 12:00:00|43200s]: from Ann(QQ:1): a): b"
        );
        assert!(!is_legacy(&Transcript::new(m[..3].to_vec())));
    }

    #[test]
    fn test_migrate_inserts_missing_system_message() {
        let t = Transcript::new(vec![
            Message::user("from Ann(QQ:1): hello"),
            Message::assistant("hi"),
        ]);
        let migrated = migrate(t, "persona", "QQ:1", noon());
        assert_eq!(migrated.len(), 3);
        assert_eq!(migrated.system_message().unwrap().content, "persona");
    }

    #[test]
    fn test_migrate_moves_system_messages_first() {
        let t = Transcript::new(vec![
            Message::user("from Ann(QQ:1): hello"),
            Message::system("persona"),
        ]);
        let migrated = migrate(t, "unused", "QQ:1", noon());
        assert_eq!(migrated.messages()[0].role, MessageRole::System);
        assert_eq!(migrated.messages()[0].content, "persona");
    }

    #[test]
    fn test_migration_is_idempotent() {
        let once = migrate(legacy(), "fallback", "QQ:1", noon());
        let later = noon() + chrono::Duration::hours(3);
        let twice = migrate(once.clone(), "fallback", "QQ:1", later);
        assert_eq!(once, twice);
    }
}
