use std::fmt;
use std::path::PathBuf;

use super::DeviceSet;

/// ConfigBatch is the ordered list of configuration lines pushed to every device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigBatch {
    lines: Vec<String>,
}

impl ConfigBatch {
    /// Parse one command per line, trimming whitespace and skipping blank lines
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ConfigBatch {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let lines = iter
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Self { lines }
    }
}

/// Whether devices are contacted at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    DryRun,
    Live,
}

impl PushMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushMode::DryRun => "dry-run",
            PushMode::Live => "live",
        }
    }
}

/// Whether a live push captures the running config before applying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackMode {
    WithRollback,
    WithoutRollback,
}

/// Last phase a device completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    None,
    Snapshot,
    Applied,
}

/// Options threaded into every per-device push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOptions {
    pub mode: PushMode,
    pub rollback: RollbackMode,
    pub concurrency: usize,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            mode: PushMode::Live,
            rollback: RollbackMode::WithRollback,
            concurrency: 20,
        }
    }
}

/// PushResult records the outcome of one device's push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResult {
    pub device_name: String,
    pub mode: PushMode,
    pub phase_reached: Phase,
    pub snapshot_content: Option<String>,
    pub applied_output: Option<String>,
    pub error: Option<String>,
    pub log_files: Vec<PathBuf>,
}

impl PushResult {
    pub fn new(device_name: &str, mode: PushMode) -> Self {
        Self {
            device_name: device_name.to_string(),
            mode,
            phase_reached: Phase::None,
            snapshot_content: None,
            applied_output: None,
            error: None,
            log_files: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// RunContext holds everything fixed for the duration of one run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub role: String,
    pub site: String,
    pub devices: DeviceSet,
    pub batch: ConfigBatch,
    pub timestamp: String,
}

impl RunContext {
    /// Timestamp format shared by every log file of a run
    pub const TIMESTAMP_FORMAT: &'static str = "%Y%m%d_%H%M%S";

    pub fn new(role: String, site: String, devices: DeviceSet, batch: ConfigBatch) -> Self {
        Self {
            role,
            site,
            devices,
            batch,
            timestamp: chrono::Local::now().format(Self::TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// RunSummary aggregates per-device outcomes for the end-of-run report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn from_results(results: &[PushResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            if result.is_success() {
                summary.succeeded.push(result.device_name.clone());
            } else {
                let error = result.error.clone().unwrap_or_default();
                summary.failed.push((result.device_name.clone(), error));
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} devices: {} succeeded, {} failed",
            self.total(),
            self.succeeded.len(),
            self.failed.len()
        )?;
        for (name, error) in &self.failed {
            write!(f, "\n  ✗ {}: {}", name, error)?;
        }
        Ok(())
    }
}
