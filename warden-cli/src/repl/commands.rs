use std::sync::Arc;

use parking_lot::Mutex;
use warden_core::policy::AllowedCapabilities;

use crate::app::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Parse a verbosity level from a string
    ///
    /// Returns Some(Verbosity) for valid inputs, None for invalid.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "quiet" => Some(Self::Quiet),
            "normal" => Some(Self::Normal),
            "verbose" => Some(Self::Verbose),
            _ => None,
        }
    }
}

/// Classify an input line as a special command type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandType<'a> {
    /// Slash command with name and arguments
    Slash {
        command: &'a str,
        args: Vec<&'a str>,
    },
    /// Regular input to send to agent
    Regular,
}

impl<'a> CommandType<'a> {
    /// Parse an input line into a command type
    pub fn parse(input: &'a str) -> Self {
        if input.starts_with('/') {
            let mut parts = input.split_whitespace();
            if let Some(command) = parts.next() {
                return Self::Slash {
                    command,
                    args: parts.collect(),
                };
            }
        }
        Self::Regular
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SpecialCommandResult {
    Exit,
    Continue,
}

/// Handle slash commands
///
/// Returns Some(result) if this was a special command,
/// None if it should be sent to the agent.
pub fn handle_special_command(
    input: &str,
    app: &mut App,
    verbosity: &Arc<Mutex<Verbosity>>,
) -> Option<SpecialCommandResult> {
    let CommandType::Slash { command, args } = CommandType::parse(input) else {
        return None;
    };

    match command {
        "/exit" | "/quit" => return Some(SpecialCommandResult::Exit),
        "/help" => print!("{}", help::full_text()),
        "/reload" => {
            if app.reload_policy() {
                println!("\nPolicy reloaded.\n");
            } else {
                println!("\nPolicy could not be loaded; all capabilities are denied until it is fixed.\n");
            }
        }
        "/policy" => print!("{}", format_policy(&app.allowed())),
        "/tools" => print!("{}", format_tool_list(&app.offered_tools())),
        "/clear" => {
            app.clear();
            println!("Conversation cleared.");
        }
        "/verbosity" => update_verbosity(verbosity, &args),
        _ => eprintln!(
            "Unknown command: {}. Type /help for available commands.",
            command
        ),
    }
    Some(SpecialCommandResult::Continue)
}

fn update_verbosity(verbosity: &Arc<Mutex<Verbosity>>, args: &[&str]) {
    match args.first() {
        None => println!("Verbosity: {:?}", *verbosity.lock()),
        Some(level) => match Verbosity::parse(level) {
            Some(level) => {
                *verbosity.lock() = level;
                println!("Verbosity set to {:?}", level);
            }
            None => eprintln!("Unknown verbosity '{}'. Use quiet, normal or verbose.", level),
        },
    }
}

/// Help text sections for the CLI
pub mod help {
    /// Header for the help display
    pub const HEADER: &str = "\nAvailable Commands:\n";

    pub const POLICY: &str = "\
Policy:
  /policy           Show the allowed tools, skills and MCP servers
  /tools            List the tools the current policy offers
  /reload           Re-read the policy file now
";

    pub const CONVERSATION: &str = "\
Conversation:
  /help             Show this help message
  /clear            Forget the conversation so far
  /verbosity [level]  Set tool output verbosity (quiet|normal|verbose)
  @<skill> <text>   Run a skill directly
";

    /// Exit commands section
    pub const EXIT: &str = "\
Exit:
  /exit, /quit      Exit
  Ctrl+D            Exit
";

    /// Get the complete help text
    pub fn full_text() -> String {
        format!("{}{}\n{}\n{}\n", HEADER, POLICY, CONVERSATION, EXIT)
    }
}

/// Format the allowed capability patterns for display
pub fn format_policy(allowed: &AllowedCapabilities) -> String {
    let mut output = String::from("\nAllowed capabilities:\n");
    for (label, patterns) in [
        ("Tools", &allowed.tools),
        ("Skills", &allowed.skills),
        ("MCP servers", &allowed.mcps),
    ] {
        if patterns.is_empty() {
            output.push_str(&format!("  {}: none\n", label));
        } else {
            output.push_str(&format!("  {}: {}\n", label, patterns.join(", ")));
        }
    }
    output.push('\n');
    output
}

/// Format a list of tools for display
pub fn format_tool_list(tools: &[(String, String)]) -> String {
    let mut output = String::from("\nAvailable Tools:\n\n");

    if tools.is_empty() {
        output.push_str("  No tools allowed by the current policy\n");
    } else {
        for (name, description) in tools {
            output.push_str(&format!("  {} - {}\n", name, description));
        }
    }

    output
}
