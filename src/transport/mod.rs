#[cfg(test)]
pub(crate) mod mock;
mod ssh;

pub use ssh::{SshSettings, SshTransport};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ConfigBatch, Device};

/// Errors raised while talking to a device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no SSH credentials available for {0}")]
    MissingCredentials(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("SSH authentication failed: {0}")]
    Auth(String),
    #[error("channel error: {0}")]
    Channel(String),
    #[error("device rejected command: {message}")]
    Rejected { message: String, output: String },
    #[error("task join error: {0}")]
    Join(String),
}

impl TransportError {
    /// Output the device produced before the failure, if any
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            TransportError::Rejected { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

/// Words a device prints after `%` when it refuses a command
const REJECTION_MARKERS: &[&str] = &["Invalid", "Incomplete", "Ambiguous", "Unknown"];

/// First output line that looks like a device refusing a command.
/// Only `%` lines count: echoed config text never starts with one.
pub fn find_rejection(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('%'))
        .find(|line| REJECTION_MARKERS.iter().any(|m| line.contains(m)))
        .map(str::to_string)
}

/// DeviceTransport is the seam between the push workflow and the network
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Read-only query returning the device's current configuration verbatim
    async fn fetch_config(&self, device: &Device) -> Result<String, TransportError>;

    /// Send the batch in order and return the cumulative device output
    async fn apply_config(&self, device: &Device, batch: &ConfigBatch) -> Result<String, TransportError>;
}
