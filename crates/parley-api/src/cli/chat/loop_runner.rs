//! The chat REPL loop.
//!
//! Lines go straight to the orchestrator; the allow-list and trigger
//! keyword only gate platform traffic, not a local session.

use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use parley_core::command::{Command, Parsed};
use parley_types::inbound::Sender;

use super::banner::{print_help, print_welcome_banner};
use super::input::{ReplEvent, ReplInput};
use crate::state::ConcreteDispatcher;

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the interactive loop until the user quits.
pub async fn run_chat_loop(dispatcher: &ConcreteDispatcher, sender: Sender) -> Result<()> {
    print_welcome_banner(dispatcher.config(), &sender.user_id);

    let prompt = format!("  {} ", style(format!("{} >", sender.nickname)).green().bold());
    let (mut input, _writer) =
        ReplInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match input.next_event().await {
            ReplEvent::Quit => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            ReplEvent::Nothing => continue,
            ReplEvent::Help => {
                print_help();
                continue;
            }
            ReplEvent::Clear => {
                input.clear();
                continue;
            }
            ReplEvent::Line(text) => text,
        };

        match Command::parse(&text) {
            Parsed::Command(command) => {
                let reply = dispatcher.run_command(&sender.user_id, &command).await;
                println!("\n  {}\n", reply.replace('\n', "\n  "));
            }
            Parsed::Unknown(name) => {
                println!(
                    "\n  {} Unknown command '.{}'. Type /help for the list.\n",
                    style("!").yellow().bold(),
                    name
                );
            }
            Parsed::NotCommand => {
                let spinner = thinking_spinner();
                let outcome = dispatcher.orchestrator().chat(&sender, &text).await;
                spinner.finish_and_clear();

                let body = outcome.reply.replace('\n', "\n  ");
                if outcome.delivered() {
                    println!("\n  {body}\n");
                } else {
                    println!("\n  {}\n", style(body).red());
                }
            }
        }
    }

    Ok(())
}
