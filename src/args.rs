//! Command-line argument parsing and processing.
//!
//! Turns the raw argument list into a [`CliAction`] for `main` to dispatch.
//! Unknown or malformed options never abort parsing; they select
//! [`CliAction::ShowHelpDueToError`] instead.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the camera pipeline
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        /// Overrides `location` from the config file
        location: Option<String>,
        /// Overrides `camera_index` from the config file
        camera: Option<u32>,
        /// Stop after this many ticks
        ticks: Option<u64>,
        /// Replay with a stepped clock starting at this local time
        start_time: Option<String>,
        log_file: Option<String>,
    },
    /// Resolve a place name and print its coordinates
    GeoCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        query: String,
        /// Write the resolved coordinates to the config file
        save: bool,
    },
    /// General or command-specific help via `cloudcam help [command]`
    HelpCommand { command: Option<String> },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or malformed arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first element is the program name and is skipped.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        // Version and help win over everything else, wherever they appear
        if args_vec.iter().any(|a| a == "--version" || a == "-V") {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if args_vec.iter().any(|a| a == "--help" || a == "-h") {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }

        let action = Self::parse_action(&args_vec).unwrap_or(CliAction::ShowHelpDueToError);
        ParsedArgs { action }
    }

    fn parse_action(args: &[String]) -> Option<CliAction> {
        let mut debug_enabled = false;
        let mut save = false;
        let mut config_dir = None;
        let mut location = None;
        let mut camera = None;
        let mut ticks = None;
        let mut start_time = None;
        let mut log_file = None;
        let mut positionals: Vec<&str> = Vec::new();

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--save" | "-s" => save = true,
                "--config" | "-c" => config_dir = Some(iter.next()?.clone()),
                "--location" | "-l" => location = Some(iter.next()?.clone()),
                "--camera" => camera = Some(iter.next()?.parse::<u32>().ok()?),
                "--ticks" => ticks = Some(iter.next()?.parse::<u64>().ok().filter(|&n| n > 0)?),
                "--start" => start_time = Some(iter.next()?.clone()),
                "--log" => log_file = Some(iter.next()?.clone()),
                other if other.starts_with('-') => return None,
                other => positionals.push(other),
            }
        }

        match positionals.split_first() {
            None => {
                if save {
                    return None;
                }
                Some(CliAction::Run {
                    debug_enabled,
                    config_dir,
                    location,
                    camera,
                    ticks,
                    start_time,
                    log_file,
                })
            }
            Some((&("help" | "h"), rest)) if rest.len() <= 1 => Some(CliAction::HelpCommand {
                command: rest.first().map(|c| c.to_string()),
            }),
            Some((&("geo" | "g"), rest)) => {
                // Run-only options make no sense for a lookup
                if camera.is_some() || ticks.is_some() || start_time.is_some() || log_file.is_some()
                {
                    return None;
                }
                let query = if rest.is_empty() {
                    location?
                } else if location.is_some() {
                    return None;
                } else {
                    rest.join(" ")
                };
                Some(CliAction::GeoCommand {
                    debug_enabled,
                    config_dir,
                    query,
                    save,
                })
            }
            _ => None,
        }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("cloudcam [OPTIONS]");
    log_indented!("cloudcam geo [--save] <location>");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>       Use custom configuration directory");
    log_indented!("-d, --debug              Enable detailed debug output");
    log_indented!("-l, --location <text>    Resolve this place instead of the configured one");
    log_indented!("    --camera <index>     Open this camera index");
    log_indented!("    --ticks <n>          Stop after n pipeline ticks");
    log_indented!("    --start <datetime>   Replay with a clock starting at \"YYYY-MM-DD HH:MM:SS\"");
    log_indented!("    --log <file>         Also write output to a log file");
    log_indented!("-h, --help               Print help information");
    log_indented!("-V, --version            Print version information");
    log_block_start!("Commands:");
    log_indented!("geo, g <location>        Resolve a place and print its coordinates");
    log_indented!("                         --save writes them to the config file");
    log_indented!("help, h [command]        Show detailed help for a command");
    log_end!();
}
