//! Aggregation of the static reference libraries.
//!
//! Library text is global configuration; it is appended to a copy of the
//! system message on every outbound chat request and never stored in a
//! transcript.

use parley_types::library::{LibrarySlot, LibraryStat, LibraryTexts};

#[derive(Debug, Clone, Default)]
pub struct LibraryAggregator {
    texts: LibraryTexts,
}

impl LibraryAggregator {
    pub fn new(texts: LibraryTexts) -> Self {
        Self { texts }
    }

    fn content(&self, slot: LibrarySlot) -> &str {
        self.texts.get(slot).trim()
    }

    /// All non-empty slots as `【label】\ncontent` blocks separated by a
    /// blank line. Empty when nothing is configured.
    pub fn aggregate(&self) -> String {
        let mut out = String::new();
        for slot in LibrarySlot::ALL {
            let content = self.content(slot);
            if !content.is_empty() {
                out.push_str(&format!("【{}】\n{}\n\n", slot.label(), content));
            }
        }
        out.trim().to_string()
    }

    /// Per-slot status in injection order.
    pub fn stats(&self) -> Vec<LibraryStat> {
        LibrarySlot::ALL
            .iter()
            .map(|&slot| {
                let content = self.content(slot);
                LibraryStat {
                    name: slot.config_key(),
                    label: slot.label(),
                    content_length: content.chars().count(),
                    has_content: !content.is_empty(),
                }
            })
            .collect()
    }
}
