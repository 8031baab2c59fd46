//! System status dashboard command.

use std::sync::Arc;

use anyhow::Result;
use console::style;

use parley_core::library::LibraryAggregator;
use parley_core::settings::Settings;
use parley_core::storage::kv_store::KvStore;

use crate::state::AppState;

/// How the stored keys break down.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct KeyCounts {
    pub conversations: usize,
    pub summaries: usize,
    pub settings: usize,
}

pub fn count_keys(keys: &[String]) -> KeyCounts {
    let mut counts = KeyCounts::default();
    for key in keys {
        if key.starts_with("__settings_") {
            counts.settings += 1;
        } else if key.ends_with("_summary") {
            counts.summaries += 1;
        } else {
            counts.conversations += 1;
        }
    }
    counts
}

/// Display the status dashboard: version, configuration, storage counts,
/// and library status.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let keys = state.kv_store.list_keys().await?;
    let counts = count_keys(&keys);

    let config = Arc::new(state.config.clone());
    let temperature = Settings::new(state.kv_store.clone(), config.clone())
        .temperature()
        .await;
    let libraries = LibraryAggregator::new(config.libraries.clone()).stats();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "model": config.model,
            "api_url": config.api_url,
            "trigger_keyword": config.trigger_keyword,
            "max_rounds": config.effective_max_rounds(),
            "temperature": temperature,
            "conversations": counts.conversations,
            "summaries": counts.summaries,
            "libraries": libraries,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} Parley v{}", style("⚡").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Assistant ──").dim());
    println!("  Model:       {}", style(&config.model).bold());
    println!("  Endpoint:    {}", style(&config.api_url).dim());
    println!("  Keyword:     {}", style(&config.trigger_keyword).cyan());
    println!("  Max rounds:  {}", config.effective_max_rounds());
    println!("  Temperature: {temperature}");
    println!();

    println!("  {}", style("── Storage ──").dim());
    println!("  Conversations: {}", style(counts.conversations).bold());
    println!("  Summaries:     {}", counts.summaries);
    println!();

    println!("  {}", style("── Libraries ──").dim());
    for stat in &libraries {
        let mark = if stat.has_content {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {mark} {} ({} chars)", stat.label, stat.content_length);
    }
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_keys() {
        let keys: Vec<String> = ["QQ:1", "QQ:1_summary", "QQ:2", "__settings_temperature"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            count_keys(&keys),
            KeyCounts {
                conversations: 2,
                summaries: 1,
                settings: 1,
            }
        );
    }
}
