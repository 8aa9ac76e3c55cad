//! Commands that change the controller's persisted behavior: user override,
//! auto-adjust flag and forced redetection.

use clap::{Subcommand, ValueEnum};
use oceanperf::quality::Tier;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Override subcommands.
#[derive(Debug, Subcommand)]
pub enum OverrideAction {
    /// Pin the quality tier (VERY_LOW, LOW, MEDIUM, HIGH)
    Set {
        #[arg(value_parser = parse_tier)]
        tier: Tier,
    },
    /// Remove the pinned tier and redetect
    Clear,
}

/// On/off switch argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> Self {
        toggle == Toggle::On
    }
}

/// Parse a tier name for clap.
pub fn parse_tier(value: &str) -> Result<Tier, String> {
    value.parse::<Tier>().map_err(|e| e.to_string())
}

/// Run an override subcommand.
pub fn run_override(runner: &CliRunner, action: OverrideAction) -> Result<(), CliError> {
    let controller = runner.controller()?;
    match action {
        OverrideAction::Set { tier } => {
            controller.set_user_override(tier);
            println!("Quality pinned to {} ({})", tier, tier.description());
        }
        OverrideAction::Clear => {
            controller.clear_user_override();
            println!(
                "Override cleared, detected profile: {}",
                controller.current_config()
            );
        }
    }
    Ok(())
}

/// Run the auto-adjust command.
pub fn run_auto_adjust(runner: &CliRunner, toggle: Toggle) -> Result<(), CliError> {
    let controller = runner.controller()?;
    let enabled = bool::from(toggle);
    controller.set_auto_adjust_enabled(enabled);
    println!(
        "Automatic quality adjustment {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Run the redetect command.
pub fn run_redetect(runner: &CliRunner) -> Result<(), CliError> {
    let controller = runner.controller()?;
    controller.force_redetection();
    println!("{}", controller.device_specs_debug());
    println!();
    println!("Active profile: {}", controller.current_config());
    if let Some(tier) = controller.status().user_override {
        println!("Note: user override {} is still in effect", tier);
    }
    Ok(())
}

/// Run the status command.
pub fn run_status(runner: &CliRunner, json: bool) -> Result<(), CliError> {
    let controller = runner.controller()?;
    let status = controller.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Performance Status");
    println!("==================");
    println!();
    println!("{}", controller.tier_config_debug());
    println!();
    println!("Auto-adjust:   {}", status.auto_adjust_enabled);
    println!("Runtime:       {}s", status.total_runtime_seconds);
    println!(
        "History:       {:.1} fps avg over {} stored samples",
        status.average_fps, status.sample_count
    );
    Ok(())
}
