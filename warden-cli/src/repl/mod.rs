//! Interactive REPL for warden

mod commands;
mod core;
mod presentation;

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::app::App;
use crate::error::CliError;
use commands::{handle_special_command, SpecialCommandResult};
use self::core::{input_prompt, print_welcome};

pub use commands::{format_policy, format_tool_list, CommandType, Verbosity};
pub use presentation::{format_event, PresentationHook};

/// Run an interactive REPL over one conversation
///
/// Each line is either a slash command or an utterance for the agent. Replies
/// print to stdout, tool activity to stderr. The policy watcher is stopped
/// when the loop ends.
///
/// # Errors
///
/// Returns `CliError::Readline` or `CliError::Io` if the terminal cannot be
/// used. Agent failures are reported inline and never end the loop.
pub async fn run_cli(mut app: App) -> Result<(), CliError> {
    let verbosity = Arc::new(Mutex::new(Verbosity::Normal));
    let hook = app
        .agent()
        .add_hook(PresentationHook::new(Arc::clone(&verbosity)));
    print_welcome(&app);

    let mut rl = DefaultEditor::new()?;
    let history_path = history_path();
    if history_path.exists() {
        rl.load_history(&history_path).ok();
    }

    loop {
        match rl.readline(input_prompt()) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                match handle_special_command(line, &mut app, &verbosity) {
                    Some(SpecialCommandResult::Exit) => break,
                    Some(SpecialCommandResult::Continue) => continue,
                    None => {}
                }

                let response = app.ask(line).await;
                println!("\n{}\n", response.text);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                tracing::error!(error = %err, "readline failed");
                break;
            }
        }
    }

    app.agent().remove_hook(hook);
    app.shutdown();

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    rl.save_history(&history_path)?;

    println!("\nGoodbye!\n");
    Ok(())
}

fn history_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("warden/history.txt"))
        .unwrap_or_else(|| ".warden/history.txt".into())
}
