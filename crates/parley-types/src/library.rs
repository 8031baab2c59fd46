//! Static reference libraries injected into every request.
//!
//! There are exactly four slots, always read in the same order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four fixed library slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibrarySlot {
    Full,
    Sub1,
    Sub2,
    Sub3,
}

impl LibrarySlot {
    /// All slots in injection order.
    pub const ALL: [LibrarySlot; 4] = [
        LibrarySlot::Full,
        LibrarySlot::Sub1,
        LibrarySlot::Sub2,
        LibrarySlot::Sub3,
    ];

    /// Configuration key name, as shown in status output.
    pub fn config_key(&self) -> &'static str {
        match self {
            LibrarySlot::Full => "full_library",
            LibrarySlot::Sub1 => "sub1_library",
            LibrarySlot::Sub2 => "sub2_library",
            LibrarySlot::Sub3 => "sub3_library",
        }
    }

    /// Display label used in the injected block header.
    pub fn label(&self) -> &'static str {
        match self {
            LibrarySlot::Full => "完整资料库",
            LibrarySlot::Sub1 => "子资料库1",
            LibrarySlot::Sub2 => "子资料库2",
            LibrarySlot::Sub3 => "子资料库3",
        }
    }
}

impl fmt::Display for LibrarySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config_key())
    }
}

/// Configured library texts.
///
/// In `config.toml` these live under `[libraries]` as `full`, `sub1`,
/// `sub2`, `sub3`; the original flat key names are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryTexts {
    #[serde(default, alias = "full_library")]
    pub full: String,
    #[serde(default, alias = "sub1_library")]
    pub sub1: String,
    #[serde(default, alias = "sub2_library")]
    pub sub2: String,
    #[serde(default, alias = "sub3_library")]
    pub sub3: String,
}

impl LibraryTexts {
    pub fn get(&self, slot: LibrarySlot) -> &str {
        match slot {
            LibrarySlot::Full => &self.full,
            LibrarySlot::Sub1 => &self.sub1,
            LibrarySlot::Sub2 => &self.sub2,
            LibrarySlot::Sub3 => &self.sub3,
        }
    }
}

/// Status of one slot, for the library status and help commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryStat {
    pub name: &'static str,
    pub label: &'static str,
    /// Trimmed length in characters (not bytes).
    pub content_length: usize,
    pub has_content: bool,
}
