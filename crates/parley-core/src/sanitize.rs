//! Plain-text rendering of model replies.
//!
//! Chat platforms show markdown literally, so replies are stripped of
//! presentation markup before delivery. Fenced code blocks are the one
//! thing kept intact. The stored transcript always keeps the raw reply.

use std::sync::OnceLock;

use regex::Regex;

const BLOCK_OPEN: char = '\u{E000}';
const BLOCK_CLOSE: char = '\u{E001}';

struct Patterns {
    fence: Regex,
    placeholder: Regex,
    /// Applied in order; each pair is (pattern, replacement).
    rules: Vec<(Regex, &'static str)>,
    blank_runs: Regex,
    speaker: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid regex");
        Patterns {
            fence: re(r"```([A-Za-z0-9_+-]*)([\s\S]*?)```"),
            placeholder: re("\u{E000}(\\d+)\u{E001}"),
            rules: vec![
                // inline code
                (re(r"`([^`]+)`"), "$1"),
                // images, then links
                (re(r"!\[.*?\]\(.*?\)"), ""),
                (re(r"\[(.*?)\]\(.*?\)"), "$1"),
                // bold, then italic
                (re(r"\*\*(.*?)\*\*|__(.*?)__"), "$1$2"),
                (re(r"\*(.*?)\*|_(.*?)_"), "$1$2"),
                // headings, quotes, list bullets
                (re(r"(?m)^#+\s+"), ""),
                (re(r"(?m)^>\s+"), ""),
                (re(r"(?m)^[*\-+]\s+"), ""),
                // table rows, horizontal rules
                (re(r"(?m)^\|.*?\|$"), ""),
                (re(r"(?m)^[-*_]{3,}$"), ""),
                // html tags
                (re(r"<[^>]+>"), ""),
            ],
            blank_runs: re(r"\n{3,}"),
            speaker: re(r"from .+?: "),
        }
    })
}

/// Strip markdown presentation markup, keeping fenced code blocks.
pub fn strip_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let p = patterns();

    let mut blocks: Vec<String> = Vec::new();
    let mut out = p
        .fence
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let lang = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str()).trim();
            blocks.push(format!("```{lang}\n{body}\n```"));
            format!("{BLOCK_OPEN}{}{BLOCK_CLOSE}", blocks.len() - 1)
        })
        .into_owned();

    for (pattern, replacement) in &p.rules {
        out = pattern.replace_all(&out, *replacement).into_owned();
    }
    out = p.blank_runs.replace_all(&out, "\n\n").into_owned();

    let out = p
        .placeholder
        .replace_all(&out, |caps: &regex::Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| blocks.get(i).cloned())
                .unwrap_or_default()
        });

    out.trim().to_string()
}

/// Remove residual `from <speaker>: ` prefixes the model copied from the
/// transcript format.
pub fn strip_speaker_prefixes(text: &str) -> String {
    patterns().speaker.replace_all(text, "").into_owned()
}

/// Full delivery pipeline for a raw reply.
pub fn render_reply(raw: &str) -> String {
    strip_speaker_prefixes(&strip_markdown(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emphasis_and_inline_code() {
        assert_eq!(strip_markdown("**bold** and __strong__"), "bold and strong");
        assert_eq!(strip_markdown("*it* and _em_"), "it and em");
        assert_eq!(strip_markdown("run `cargo` now"), "run cargo now");
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            strip_markdown("see [docs](https://x.y) ![pic](a.png)end"),
            "see docs end"
        );
    }

    #[test]
    fn test_line_markers() {
        let text = "# Title\n> quoted\n- item one\n+ item two\n---\nplain";
        assert_eq!(strip_markdown(text), "Title\nquoted\nitem one\nitem two\n\nplain");
    }

    #[test]
    fn test_tables_and_html() {
        let text = "before\n| a | b |\n<b>after</b>";
        assert_eq!(strip_markdown(text), "before\n\nafter");
    }

    #[test]
    fn test_blank_runs_collapse() {
        assert_eq!(strip_markdown("a\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_fenced_code_kept() {
        let text = "look:\n```json\n{\"a_b\": \"*x*\"}\n```\ndone **now**";
        assert_eq!(
            strip_markdown(text),
            "look:\n```json\n{\"a_b\": \"*x*\"}\n```\ndone now"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(strip_markdown(""), "");
        assert_eq!(strip_markdown("  \n "), "");
    }

    #[test]
    fn test_speaker_prefix_removed() {
        assert_eq!(
            strip_speaker_prefixes("from 小伊（QQ:0）[2026-01-19 12:00:00|43200s]: 你好呀"),
            "你好呀"
        );
        assert_eq!(render_reply("**hi** there"), "hi there");
    }
}
