use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::logs::{render_preview, LogCategory, LogWriter};
use crate::models::*;
use crate::transport::{find_rejection, DeviceTransport};

/// A snapshot is only usable for rollback if it holds configuration
fn check_snapshot(snapshot: &str) -> Result<()> {
    if snapshot.trim().is_empty() {
        anyhow::bail!("device returned an empty configuration");
    }
    if let Some(message) = find_rejection(snapshot) {
        anyhow::bail!("device refused the snapshot command: {}", message);
    }
    Ok(())
}

/// PushService runs the snapshot → apply → record workflow across a device set
pub struct PushService {
    transport: Arc<dyn DeviceTransport>,
    logs: LogWriter,
    options: PushOptions,
}

impl PushService {
    pub fn new(transport: Arc<dyn DeviceTransport>, logs: LogWriter, options: PushOptions) -> Self {
        Self {
            transport,
            logs,
            options,
        }
    }

    pub fn options(&self) -> PushOptions {
        self.options
    }

    pub fn logs(&self) -> &LogWriter {
        &self.logs
    }

    /// Push `batch` to every device with at most `concurrency` devices in
    /// flight. One device failing never stops the others. Results come
    /// back in device-set order.
    pub async fn run(&self, devices: &DeviceSet, batch: &ConfigBatch, timestamp: &str) -> Vec<PushResult> {
        let limit = self.options.concurrency.max(1);
        tracing::info!(
            "Pushing {} lines to {} devices ({}, concurrency={})",
            batch.len(),
            devices.len(),
            self.options.mode.as_str(),
            limit
        );

        let mut results: Vec<(usize, PushResult)> = stream::iter(devices.iter().enumerate())
            .map(|(i, device)| async move { (i, self.push_device(device, batch, timestamp).await) })
            .buffer_unordered(limit)
            .collect()
            .await;

        results.sort_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, r)| r).collect()
    }

    /// Run the workflow for a single device
    pub async fn push_device(&self, device: &Device, batch: &ConfigBatch, timestamp: &str) -> PushResult {
        let mut result = PushResult::new(&device.name, self.options.mode);

        let outcome = match self.options.mode {
            PushMode::DryRun => self.preview(device, batch, timestamp, &mut result).await,
            PushMode::Live => self.live(device, batch, timestamp, &mut result).await,
        };

        if let Err(e) = outcome {
            tracing::warn!("Push failed for {} ({}): {:#}", device.name, device.address, e);
            result.error = Some(format!("{:#}", e));
        }
        result
    }

    async fn preview(
        &self,
        device: &Device,
        batch: &ConfigBatch,
        timestamp: &str,
        result: &mut PushResult,
    ) -> Result<()> {
        let content = render_preview(&device.name, batch.lines());
        let path = self
            .logs
            .write(&device.name, LogCategory::Preview, timestamp, &content)
            .await
            .context("Failed to save config preview")?;

        tracing::info!("(DRY-RUN) Saved config preview to {}", path.display());
        result.log_files.push(path);
        Ok(())
    }

    async fn live(
        &self,
        device: &Device,
        batch: &ConfigBatch,
        timestamp: &str,
        result: &mut PushResult,
    ) -> Result<()> {
        if self.options.rollback == RollbackMode::WithRollback {
            // Nothing is applied unless the snapshot is on disk first
            let snapshot = self
                .transport
                .fetch_config(device)
                .await
                .context("Snapshot failed")?;
            check_snapshot(&snapshot).context("Snapshot failed")?;
            result.phase_reached = Phase::Snapshot;
            let snapshot = result.snapshot_content.insert(snapshot);

            let path = self
                .logs
                .write(&device.name, LogCategory::Rollback, timestamp, snapshot)
                .await
                .context("Failed to save rollback snapshot")?;
            tracing::info!("Saved rollback snapshot for {} to {}", device.name, path.display());
            result.log_files.push(path);
        }

        match self.transport.apply_config(device, batch).await {
            Ok(output) => {
                result.phase_reached = Phase::Applied;
                let output = result.applied_output.insert(output);

                let path = self
                    .logs
                    .write(&device.name, LogCategory::Config, timestamp, output)
                    .await
                    .context("Config applied but output could not be saved")?;
                tracing::info!("Applied {} lines to {}, output saved to {}", batch.len(), device.name, path.display());
                result.log_files.push(path);
                Ok(())
            }
            Err(e) => {
                if let Some(partial) = e.partial_output() {
                    result.applied_output = Some(partial.to_string());
                    match self
                        .logs
                        .write(&device.name, LogCategory::Config, timestamp, partial)
                        .await
                    {
                        Ok(path) => result.log_files.push(path),
                        Err(write_err) => {
                            tracing::warn!("Could not save partial output for {}: {:#}", device.name, write_err);
                        }
                    }
                }
                Err(anyhow::Error::new(e).context("Apply failed"))
            }
        }
    }
}
