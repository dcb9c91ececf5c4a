//! Help command implementation for cloudcam.
//!
//! Dispatches `cloudcam help [command]` to general or command-specific help.

use anyhow::Result;

/// Run the help command (dispatcher)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("geo") | Some("g") => super::geo::display_help(),
        Some("help") | Some("h") => display_help_help(),
        Some(unknown) => {
            log_pipe!();
            log_warning!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("geo, g <location>       Resolve a place and print its coordinates");
    log_indented!("help, h [COMMAND]       Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'cloudcam help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'cloudcam --help' to see all options and general usage.");
    log_end!();
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Show detailed help for a command");
    log_block_start!("Usage: cloudcam help [COMMAND]");
    log_indented!("Without a command, lists the available commands");
    log_end!();
}
