//! Interactive CLI chat.
//!
//! A REPL over one user's conversation: plain lines go to the model,
//! `.`-prefixed lines run assistant commands, `/`-prefixed lines control
//! the REPL itself. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod input;
pub mod loop_runner;
