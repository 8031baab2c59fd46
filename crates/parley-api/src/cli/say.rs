//! One-shot message and command delivery.

use anyhow::{Result, bail};
use console::style;

use parley_core::command::Command;
use parley_types::inbound::InboundMessage;

use crate::state::ConcreteDispatcher;

/// Deliver one inbound message as a chat platform would and print the reply.
pub async fn say(
    dispatcher: &ConcreteDispatcher,
    message: InboundMessage,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let reply = dispatcher.handle(&message).await;

    if json {
        let result = serde_json::json!({
            "user_id": message.sender.user_id,
            "origin": message.origin,
            "reply": reply,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match reply {
        Some(text) => println!("{text}"),
        None if !quiet => {
            eprintln!(
                "  {} No reply (origin not allowed, no trigger keyword '{}', or unknown command)",
                style("i").blue().bold(),
                dispatcher.config().trigger_keyword,
            );
        }
        None => {}
    }
    Ok(())
}

/// Run a named command for a user.
pub async fn run_command(
    dispatcher: &ConcreteDispatcher,
    user_id: &str,
    name: &str,
    arg: Option<&str>,
    json: bool,
) -> Result<()> {
    let Some(command) = Command::from_name(name, arg) else {
        let known: Vec<&str> = Command::ALL.iter().map(|c| c.alias()).collect();
        bail!("unknown command '{name}' (known: {})", known.join(", "));
    };

    let reply = dispatcher.run_command(user_id, &command).await;

    if json {
        let result = serde_json::json!({
            "user_id": user_id,
            "command": command.alias(),
            "reply": reply,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{reply}");
    }
    Ok(())
}
