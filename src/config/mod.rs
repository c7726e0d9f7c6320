use std::env;

use crate::transport::SshSettings;

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub inventory_path: String,
    pub commands_path: String,
    pub log_dir: String,
    pub concurrency: usize,
    pub ssh_user: String,
    pub ssh_pass: String,
    pub ssh_port: u16,
    pub ssh_timeout: u64,
    pub snapshot_command: String,
    pub config_enter: String,
    pub config_exit: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup; missing or unparsable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            inventory_path: get("PUSH_INVENTORY", "inventory/hosts.yaml"),
            commands_path: get("PUSH_COMMANDS", "config_commands.txt"),
            log_dir: get("PUSH_LOG_DIR", "logs"),
            concurrency: get("PUSH_CONCURRENCY", "20")
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .unwrap_or(20),
            ssh_user: get("SSH_USER", ""),
            ssh_pass: get("SSH_PASS", ""),
            ssh_port: get("SSH_PORT", "22").parse().unwrap_or(22),
            ssh_timeout: get("SSH_TIMEOUT", "30").parse().unwrap_or(30),
            snapshot_command: get("SNAPSHOT_COMMAND", "show running-config"),
            config_enter: get("CONFIG_ENTER", "configure terminal"),
            config_exit: get("CONFIG_EXIT", "end"),
        }
    }

    pub fn ssh_settings(&self) -> SshSettings {
        SshSettings {
            default_user: self.ssh_user.clone(),
            default_pass: self.ssh_pass.clone(),
            port: self.ssh_port,
            timeout_secs: self.ssh_timeout,
            snapshot_command: self.snapshot_command.clone(),
            config_enter: self.config_enter.clone(),
            config_exit: self.config_exit.clone(),
        }
    }
}
