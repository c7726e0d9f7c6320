use clap::Parser;

use crate::config::Config;
use crate::models::{PushMode, PushOptions, RollbackMode};
use crate::session::SessionOptions;

/// Push a batch of configuration commands to inventory devices over SSH.
/// Flags override the environment-based configuration.
#[derive(Parser, Debug)]
#[command(name = "forge-push")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// YAML hosts file
    #[arg(long)]
    pub inventory: Option<String>,

    /// File with one configuration command per line
    #[arg(long)]
    pub commands: Option<String>,

    /// Directory for preview, rollback and config logs
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Maximum number of devices pushed at once
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Write previews instead of contacting devices
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the running-config snapshot before applying
    #[arg(long)]
    pub no_rollback: bool,

    /// Select this role instead of prompting
    #[arg(long)]
    pub role: Option<String>,

    /// Select this site instead of prompting
    #[arg(long)]
    pub site: Option<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl Cli {
    /// Layer flag values over the loaded configuration
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(path) = &self.inventory {
            cfg.inventory_path = path.clone();
        }
        if let Some(path) = &self.commands {
            cfg.commands_path = path.clone();
        }
        if let Some(dir) = &self.log_dir {
            cfg.log_dir = dir.clone();
        }
        if let Some(n) = self.concurrency {
            cfg.concurrency = n as usize;
        }
    }

    pub fn push_options(&self, cfg: &Config) -> PushOptions {
        PushOptions {
            mode: if self.dry_run { PushMode::DryRun } else { PushMode::Live },
            rollback: if self.no_rollback {
                RollbackMode::WithoutRollback
            } else {
                RollbackMode::WithRollback
            },
            concurrency: cfg.concurrency,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            role: self.role.clone(),
            site: self.site.clone(),
            assume_yes: self.yes,
        }
    }
}
