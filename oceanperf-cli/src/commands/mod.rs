//! CLI subcommands.

pub mod benchmark;
pub mod config;
pub mod detect;
pub mod overrides;
pub mod profiles;
pub mod simulate;
pub mod state;
