use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::models::{ConfigBatch, Device};
use crate::utils::{is_valid_hostname, is_valid_ipv4};

/// One entry of the YAML hosts file, keyed by device name
#[derive(Debug, Deserialize)]
struct HostEntry {
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    data: BTreeMap<String, serde_yaml_ng::Value>,
}

/// Scalar YAML values become attribute strings; nested values are dropped
fn scalar_to_string(value: &serde_yaml_ng::Value) -> Option<String> {
    match value {
        serde_yaml_ng::Value::String(s) => Some(s.clone()),
        serde_yaml_ng::Value::Number(n) => Some(n.to_string()),
        serde_yaml_ng::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a hosts file. Devices come back ordered by name.
pub fn parse_hosts(content: &str) -> Result<Vec<Device>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: BTreeMap<String, Option<HostEntry>> =
        serde_yaml_ng::from_str(content).context("Invalid hosts file")?;

    let mut devices = Vec::with_capacity(entries.len());
    for (name, entry) in entries {
        if !is_valid_hostname(&name) {
            anyhow::bail!("Invalid device name in inventory: {:?}", name);
        }

        let entry = entry.unwrap_or(HostEntry {
            hostname: None,
            username: None,
            password: None,
            port: None,
            platform: None,
            data: BTreeMap::new(),
        });

        let address = entry
            .hostname
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| name.clone());
        if !is_valid_ipv4(&address) && !is_valid_hostname(&address) {
            anyhow::bail!("Invalid address for {}: {:?}", name, address);
        }

        let mut device = Device::new(name, address);
        for (key, value) in &entry.data {
            if let Some(value) = scalar_to_string(value) {
                device = device.with_attribute(key.clone(), value);
            }
        }
        device.username = entry.username;
        device.password = entry.password;
        device.port = entry.port;
        device.platform = entry.platform;
        devices.push(device);
    }

    Ok(devices)
}

/// Load the device inventory from a YAML hosts file
pub async fn load_hosts(path: impl AsRef<Path>) -> Result<Vec<Device>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read inventory {}", path.display()))?;
    let devices = parse_hosts(&content)
        .with_context(|| format!("Failed to load inventory {}", path.display()))?;
    tracing::debug!("Loaded {} devices from {}", devices.len(), path.display());
    Ok(devices)
}

/// Load the configuration batch, one command per non-empty line
pub async fn load_commands(path: impl AsRef<Path>) -> Result<ConfigBatch> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config commands {}", path.display()))?;
    let batch = ConfigBatch::parse(&content);
    if batch.is_empty() {
        anyhow::bail!("No configuration commands found in {}", path.display());
    }
    Ok(batch)
}
