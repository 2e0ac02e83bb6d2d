//! Core REPL utilities

use crate::app::App;

/// The input prompt string
pub fn input_prompt() -> &'static str {
    "> "
}

/// Format the welcome banner header
pub fn format_welcome_header() -> String {
    format!("warden v{}", env!("CARGO_PKG_VERSION"))
}

/// Format the tip line shown at startup
pub fn format_tip() -> &'static str {
    "Type /help for commands, /policy to see what is allowed"
}

/// Print welcome message and policy summary
pub fn print_welcome(app: &App) {
    println!("\n{}", format_welcome_header());
    println!("Model: {}", app.agent().model_name());
    println!("Tools: {}", app.offered_tools().len());

    let skills = app.agent().skill_names();
    if !skills.is_empty() {
        println!("Skills: {}", skills.join(", "));
    }
    if app.is_watching() {
        println!("Watching the policy file for changes");
    }

    println!("{}", format_tip());
    println!();
}
