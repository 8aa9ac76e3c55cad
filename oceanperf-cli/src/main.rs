//! oceanperf CLI - developer tooling for the adaptive quality controller.
//!
//! Inspects and edits the persisted controller state, probes the host and
//! replays synthetic frame rate traces through the tier logic.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use oceanperf::quality::Tier;

use commands::benchmark::BenchmarkArgs;
use commands::config::ConfigAction;
use commands::detect::{parse_display, DetectArgs};
use commands::overrides::{parse_tier, OverrideAction, Toggle};
use commands::simulate::{Pattern, SimulateArgs};
use commands::state::StateAction;
use error::CliError;
use runner::{CliRunner, LogArgs};

#[derive(Parser)]
#[command(name = "oceanperf")]
#[command(version = oceanperf::VERSION)]
#[command(about = "Adaptive rendering quality for animated ocean backgrounds", long_about = None)]
struct Cli {
    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log filter for this run (overrides the configured level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write a Chrome trace to this file (needs the `profiling` feature)
    #[arg(long, global = true)]
    chrome_trace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe this host and print its capability score
    Detect {
        /// Display size to score with, e.g. 1080x2400
        #[arg(long, value_parser = parse_display)]
        display: Option<(u32, u32)>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the quality profile catalog
    Profiles {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the controller status over the persisted state
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or reset the persisted controller state
    State {
        #[command(subcommand)]
        action: StateAction,
    },

    /// Pin or release the quality tier
    Override {
        #[command(subcommand)]
        action: OverrideAction,
    },

    /// Turn automatic quality adjustment on or off
    AutoAdjust {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Discard the stored detection and probe again
    Redetect,

    /// Replay a synthetic frame rate trace through the tier logic
    Simulate {
        /// Shape of the trace
        #[arg(long, value_enum, default_value = "crash")]
        pattern: Pattern,

        /// Simulated duration in seconds
        #[arg(long, default_value_t = 120)]
        seconds: u64,

        /// Starting tier
        #[arg(long, value_parser = parse_tier, default_value = "HIGH")]
        start: Tier,

        /// Frame rate the trace is scaled from
        #[arg(long, default_value_t = 60.0)]
        base_fps: f32,

        /// Relative noise per reading
        #[arg(long, default_value_t = 0.08)]
        jitter: f32,
    },

    /// Benchmark a synthetic frame source
    Benchmark {
        /// Measured duration in seconds (after a short warm-up)
        #[arg(long, default_value_t = 10)]
        seconds: u64,

        /// Frame rate the synthetic source produces
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Judge against this tier's target instead of the detected one
        #[arg(long, value_parser = parse_tier)]
        tier: Option<Tier>,

        /// Relative noise per reading
        #[arg(long, default_value_t = 0.05)]
        jitter: f32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// View the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let runner = CliRunner::new(LogArgs {
        verbose: cli.verbose,
        level: cli.log_level,
        chrome_trace: cli.chrome_trace,
    })?;

    match cli.command {
        Commands::Detect { display, json } => {
            runner.log_startup("detect");
            commands::detect::run(DetectArgs { display, json })
        }
        Commands::Profiles { json } => commands::profiles::run(json),
        Commands::Status { json } => {
            runner.log_startup("status");
            commands::overrides::run_status(&runner, json)
        }
        Commands::State { action } => commands::state::run(&runner, action),
        Commands::Override { action } => {
            runner.log_startup("override");
            commands::overrides::run_override(&runner, action)
        }
        Commands::AutoAdjust { state } => {
            runner.log_startup("auto-adjust");
            commands::overrides::run_auto_adjust(&runner, state)
        }
        Commands::Redetect => {
            runner.log_startup("redetect");
            commands::overrides::run_redetect(&runner)
        }
        Commands::Simulate {
            pattern,
            seconds,
            start,
            base_fps,
            jitter,
        } => {
            runner.log_startup("simulate");
            commands::simulate::run(
                &runner.config().performance,
                SimulateArgs {
                    pattern,
                    seconds,
                    start,
                    base_fps,
                    jitter,
                },
            )
        }
        Commands::Benchmark {
            seconds,
            fps,
            tier,
            jitter,
            json,
        } => {
            runner.log_startup("benchmark");
            commands::benchmark::run(
                &runner.config().performance,
                BenchmarkArgs {
                    seconds,
                    fps,
                    tier,
                    jitter,
                    json,
                },
            )
        }
        Commands::Config { action } => commands::config::run(runner.config(), action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate_defaults() {
        let cli = Cli::try_parse_from(["oceanperf", "simulate"]).unwrap();
        match cli.command {
            Commands::Simulate {
                pattern,
                seconds,
                start,
                ..
            } => {
                assert_eq!(pattern, Pattern::Crash);
                assert_eq!(seconds, 120);
                assert_eq!(start, Tier::High);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_parse_override_set() {
        let cli = Cli::try_parse_from(["oceanperf", "override", "set", "very_low"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Override {
                action: OverrideAction::Set {
                    tier: Tier::VeryLow
                }
            }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_tier() {
        assert!(Cli::try_parse_from(["oceanperf", "override", "set", "ultra"]).is_err());
    }

    #[test]
    fn test_parse_detect_display() {
        let cli = Cli::try_parse_from(["oceanperf", "detect", "--display", "1080x2400"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Detect {
                display: Some((1080, 2400)),
                json: false
            }
        ));
    }
}
