use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::utils::safe_file_component;

/// Kind of artifact written for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Preview,
    Rollback,
    Config,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Preview => "preview",
            LogCategory::Rollback => "rollback",
            LogCategory::Config => "config",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LogWriter writes per-device push artifacts into a single directory
#[derive(Debug, Clone)]
pub struct LogWriter {
    log_dir: PathBuf,
}

impl LogWriter {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of a device's log file: `{dir}/{device}_{category}_{timestamp}.log`
    pub fn path_for(&self, device_name: &str, category: LogCategory, timestamp: &str) -> PathBuf {
        let filename = format!(
            "{}_{}_{}.log",
            safe_file_component(device_name),
            category,
            timestamp
        );
        self.log_dir.join(filename)
    }

    /// Create the log directory and any missing ancestors
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.log_dir)
            .await
            .with_context(|| format!("Failed to create log directory {}", self.log_dir.display()))
    }

    /// Write `content` verbatim, replacing any previous file at the same path.
    /// The file is synced before returning.
    pub async fn write(
        &self,
        device_name: &str,
        category: LogCategory,
        timestamp: &str,
        content: &str,
    ) -> Result<PathBuf> {
        self.ensure_dir().await?;

        let path = self.path_for(device_name, category, timestamp);
        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(content.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        file.sync_all()
            .await
            .with_context(|| format!("Failed to sync {}", path.display()))?;

        Ok(path)
    }
}

/// Render the dry-run preview for a device
pub fn render_preview(device_name: &str, lines: &[String]) -> String {
    let mut out = format!("# Would send to {}:\n", device_name);
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}
