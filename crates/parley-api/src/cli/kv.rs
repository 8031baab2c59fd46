//! Key-value store CLI subcommands.
//!
//! Raw access to the blobs the assistant persists: one transcript per user
//! id, `<user_id>_summary` summaries, and `__settings_*` overrides.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use parley_core::storage::kv_store::KvStore;

/// Longest value preview shown by `kv list`, in characters.
const PREVIEW_CHARS: usize = 60;

/// Key-value store subcommands.
#[derive(Subcommand)]
pub enum KvCommand {
    /// Set a key to a raw string value.
    Set {
        /// Key name.
        key: String,

        /// Value, stored verbatim.
        value: String,
    },

    /// Get a value by key.
    Get {
        /// Key name.
        key: String,
    },

    /// Delete a key.
    Delete {
        /// Key name.
        key: String,
    },

    /// List all keys with a value preview.
    List,
}

/// Handle a KV subcommand.
pub async fn handle_kv_command<S: KvStore>(cmd: KvCommand, store: &S, json: bool) -> Result<()> {
    match cmd {
        KvCommand::Set { key, value } => kv_set(store, &key, &value, json).await,
        KvCommand::Get { key } => kv_get(store, &key, json).await,
        KvCommand::Delete { key } => kv_delete(store, &key, json).await,
        KvCommand::List => kv_list(store, json).await,
    }
}

async fn kv_set<S: KvStore>(store: &S, key: &str, value: &str, json: bool) -> Result<()> {
    store.set(key, value).await?;

    if json {
        let result = serde_json::json!({ "key": key, "value": value });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!("  {} Set '{}'", style("ok").green(), style(key).cyan());
        println!();
    }
    Ok(())
}

async fn kv_get<S: KvStore>(store: &S, key: &str, json: bool) -> Result<()> {
    let value = store.get(key).await?;

    if json {
        let result = serde_json::json!({ "key": key, "value": value });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match value {
        Some(val) => {
            // Stored blobs are usually JSON; pretty-print when they are.
            let shown = serde_json::from_str::<serde_json::Value>(&val)
                .ok()
                .and_then(|v| serde_json::to_string_pretty(&v).ok())
                .unwrap_or(val);
            println!();
            println!("  {} = {}", style(key).cyan().bold(), shown);
            println!();
        }
        None => {
            println!();
            println!("  {} Key '{}' not found", style("i").blue().bold(), style(key).cyan());
            println!();
        }
    }
    Ok(())
}

async fn kv_delete<S: KvStore>(store: &S, key: &str, json: bool) -> Result<()> {
    store.delete(key).await?;

    if json {
        let result = serde_json::json!({ "deleted": key });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!("  {} Deleted key '{}'", style("ok").green(), style(key).cyan());
        println!();
    }
    Ok(())
}

async fn kv_list<S: KvStore>(store: &S, json: bool) -> Result<()> {
    let keys = store.list_keys().await?;

    if json {
        let result = serde_json::json!({ "keys": keys, "count": keys.len() });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if keys.is_empty() {
        println!();
        println!("  {} The store is empty.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    println!();
    println!("  Keys ({} entries)", keys.len());
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Key").fg(Color::White),
        Cell::new("Value Preview").fg(Color::White),
    ]);

    for key in &keys {
        let preview = match store.get(key).await {
            Ok(Some(val)) => preview(&val),
            Ok(None) => String::new(),
            Err(_) => "(error)".to_string(),
        };
        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(&preview).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!();
    Ok(())
}

/// Single-line preview, truncated on a character boundary.
fn preview(value: &str) -> String {
    let flat = value.replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let head: String = flat.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{head}...")
    } else {
        flat
    }
}
