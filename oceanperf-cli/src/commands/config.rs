//! Configuration CLI commands.

use clap::Subcommand;
use oceanperf::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Show the configuration file path
    Path,
    /// Write the effective configuration to the config file
    Init,
}

/// Run a config subcommand.
pub fn run(config: &ConfigFile, action: ConfigAction) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            let ini = config.to_ini();
            for (section, properties) in ini.iter() {
                if let Some(section) = section {
                    println!("[{}]", section);
                }
                for (key, value) in properties.iter() {
                    println!("  {} = {}", key, value);
                }
                println!();
            }
        }
        ConfigAction::Path => {
            println!("{}", config_file_path()?.display());
        }
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                return Err(CliError::Config(format!(
                    "{} already exists",
                    path.display()
                )));
            }
            config.save()?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
