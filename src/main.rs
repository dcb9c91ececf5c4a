//! Main application entry point.
//!
//! Parses the command line, sets up process-wide services (file logging,
//! stepped clock, config directory) and dispatches to the pipeline or a
//! one-shot command. Every error ends up here and is printed with its full
//! context chain before exiting with a failure status.

use anyhow::{Context, Result};
use std::sync::Arc;

use cloudcam::args::{self, CliAction, ParsedArgs};
use cloudcam::common::constants::EXIT_FAILURE;
use cloudcam::logger::Log;
use cloudcam::time_source::{self, SteppedTimeSource};
use cloudcam::{Cloudcam, commands, config, log_end, log_error_exit, log_indented, log_pipe};

fn main() {
    let parsed = ParsedArgs::from_env();

    if let Err(e) = run(parsed.action) {
        log_pipe!();
        log_error_exit!("{e}");
        for cause in e.chain().skip(1) {
            log_indented!("Caused by: {cause}");
        }
        log_end!();
        std::process::exit(EXIT_FAILURE);
    }
}

fn run(action: CliAction) -> Result<()> {
    match action {
        CliAction::Run {
            debug_enabled,
            config_dir,
            location,
            camera,
            ticks,
            start_time,
            log_file,
        } => {
            config::set_config_dir(config_dir)?;

            // Keep the guard alive until the pipeline has shut down
            let _log_guard = match log_file {
                Some(path) => Some(Log::start_file_logging(path)?),
                None => None,
            };

            if let Some(start) = start_time {
                let start = time_source::parse_datetime(&start)
                    .map_err(anyhow::Error::msg)
                    .context("Invalid --start time")?;
                time_source::init_time_source(Arc::new(
                    SteppedTimeSource::new(start).with_real_pacing(),
                ));
                Log::set_timestamps(true);
            }

            let mut app = Cloudcam::new(debug_enabled);
            if let Some(location) = location {
                app = app.with_location(location);
            }
            if let Some(index) = camera {
                app = app.with_camera_index(index);
            }
            if let Some(ticks) = ticks {
                app = app.with_tick_budget(ticks);
            }
            app.run().map(|_| ())
        }
        CliAction::GeoCommand {
            debug_enabled,
            config_dir,
            query,
            save,
        } => {
            config::set_config_dir(config_dir)?;
            commands::geo::handle_geo_command(&query, save, debug_enabled)
        }
        CliAction::HelpCommand { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
    }
}
