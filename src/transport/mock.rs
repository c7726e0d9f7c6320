use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{DeviceTransport, TransportError};
use crate::logs::{LogCategory, LogWriter};
use crate::models::{ConfigBatch, Device};

/// A transport call as observed by the test double
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(String),
    Apply {
        device: String,
        lines: Vec<String>,
        /// Whether the device's rollback log was already on disk
        rollback_on_disk: bool,
    },
}

/// Scripted DeviceTransport that records every call
pub struct MockTransport {
    snapshot: String,
    applied: String,
    fail_fetch: HashSet<String>,
    fail_apply: HashSet<String>,
    reject_apply: HashMap<String, String>,
    rollback_probe: Option<(LogWriter, String)>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new(snapshot: &str, applied: &str) -> Self {
        Self {
            snapshot: snapshot.to_string(),
            applied: applied.to_string(),
            fail_fetch: HashSet::new(),
            fail_apply: HashSet::new(),
            reject_apply: HashMap::new(),
            rollback_probe: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_fetch(mut self, device: &str) -> Self {
        self.fail_fetch.insert(device.to_string());
        self
    }

    pub fn failing_apply(mut self, device: &str) -> Self {
        self.fail_apply.insert(device.to_string());
        self
    }

    pub fn rejecting_apply(mut self, device: &str, partial_output: &str) -> Self {
        self.reject_apply
            .insert(device.to_string(), partial_output.to_string());
        self
    }

    /// Check for the rollback file of `timestamp` whenever apply is called
    pub fn probing_rollback(mut self, logs: LogWriter, timestamp: &str) -> Self {
        self.rollback_probe = Some((logs, timestamp.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, device: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| match c {
                Call::Fetch(d) => d == device,
                Call::Apply { device: d, .. } => d == device,
            })
            .collect()
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    async fn fetch_config(&self, device: &Device) -> Result<String, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Fetch(device.name.clone()));
        tokio::task::yield_now().await;

        if self.fail_fetch.contains(&device.name) {
            return Err(TransportError::Connect(format!("{} unreachable", device.address)));
        }
        Ok(self.snapshot.clone())
    }

    async fn apply_config(&self, device: &Device, batch: &ConfigBatch) -> Result<String, TransportError> {
        let rollback_on_disk = self.rollback_probe.as_ref().is_some_and(|(logs, ts)| {
            let path = logs.path_for(&device.name, LogCategory::Rollback, ts);
            std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
        });
        self.calls.lock().unwrap().push(Call::Apply {
            device: device.name.clone(),
            lines: batch.lines().to_vec(),
            rollback_on_disk,
        });
        tokio::task::yield_now().await;

        if self.fail_apply.contains(&device.name) {
            return Err(TransportError::Connect(format!("{} connection reset", device.address)));
        }
        if let Some(partial) = self.reject_apply.get(&device.name) {
            return Err(TransportError::Rejected {
                message: "% Invalid input detected at '^' marker.".to_string(),
                output: partial.clone(),
            });
        }
        Ok(self.applied.clone())
    }
}
