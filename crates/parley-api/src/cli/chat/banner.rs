//! Welcome banner and help text for the chat REPL.

use console::style;

use parley_core::command::Command;
use parley_types::config::AssistantConfig;

pub fn print_welcome_banner(config: &AssistantConfig, user_id: &str) {
    println!();
    println!("  {} {}", style("⚡").bold(), style("Parley").cyan().bold());
    println!();
    println!("  {}  {}", style("Model:").bold(), style(&config.model).dim());
    println!("  {}   {}", style("User:").bold(), style(user_id).dim());
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}

pub fn print_help() {
    println!();
    println!("  {}", style("REPL").bold());
    println!("    /help         show this help");
    println!("    /clear        clear the screen");
    println!("    /quit         leave the chat");
    println!();
    println!("  {}", style("Assistant commands").bold());
    for command in Command::ALL.iter() {
        println!(
            "    .{:<16} {}",
            command.alias(),
            style(command.description()).dim()
        );
    }
    println!();
}
