use anyhow::Result;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use crate::inventory;
use crate::models::*;
use crate::prompt::Chooser;
use crate::push::PushService;
use crate::utils::truncate_lines;

/// Selections supplied up front instead of prompting
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub role: Option<String>,
    pub site: Option<String>,
    pub assume_yes: bool,
}

/// How a session ended
#[derive(Debug)]
pub enum Outcome {
    /// No device matched the selected role and site
    NoMatch,
    /// The operator declined to proceed
    Declined,
    Completed {
        timestamp: String,
        results: Vec<PushResult>,
        summary: RunSummary,
    },
}

impl Outcome {
    pub fn exit_status(&self) -> u8 {
        match self {
            Outcome::NoMatch => 1,
            Outcome::Declined | Outcome::Completed { .. } => 0,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

/// Run one interactive session against an already-loaded inventory and batch:
/// role/site selection, confirmation, the push itself and the final report
pub async fn run<R: BufRead, W: Write>(
    chooser: &mut Chooser<R, W>,
    devices: &[Device],
    batch: ConfigBatch,
    service: &PushService,
    opts: &SessionOptions,
) -> Result<Outcome> {
    let role = match &opts.role {
        Some(role) => role.clone(),
        None => {
            let roles = inventory::distinct_values(devices, attribute::ROLE);
            chooser.choose("Choose a role", &roles)?.to_string()
        }
    };

    let site = match &opts.site {
        Some(site) => site.clone(),
        None => {
            let sites = inventory::distinct_values(devices, attribute::SITE);
            chooser.choose("Choose a site", &sites)?.to_string()
        }
    };

    let matched = inventory::filter_role_site(devices, &role, &site);
    let out = chooser.output();
    if matched.is_empty() {
        writeln!(out, "No devices match the selected filters (role={}, site={}).", role, site)?;
        return Ok(Outcome::NoMatch);
    }

    writeln!(out)?;
    writeln!(out, "{} devices matched:", matched.len())?;
    for device in &matched {
        writeln!(out, "- {} ({})", device.name, device.address)?;
    }

    let options = service.options();
    if options.mode == PushMode::DryRun {
        writeln!(out, "(DRY-RUN) No changes will be sent.")?;
    } else if options.rollback == RollbackMode::WithoutRollback {
        writeln!(out, "Rollback snapshots are disabled for this run.")?;
    }

    if !opts.assume_yes && !chooser.confirm("Proceed with config push?")? {
        tracing::info!("Push declined by operator");
        return Ok(Outcome::Declined);
    }

    let ctx = RunContext::new(role, site, matched, batch);
    tracing::info!(
        "Starting push run {} (role={}, site={}, devices=[{}])",
        ctx.timestamp,
        ctx.role,
        ctx.site,
        ctx.devices.names().join(", ")
    );

    // A missing log directory is fatal for the whole run
    service.logs().ensure_dir().await?;
    let results = service.run(&ctx.devices, &ctx.batch, &ctx.timestamp).await;
    let summary = RunSummary::from_results(&results);

    let out = chooser.output();
    writeln!(out)?;
    for result in &results {
        match &result.error {
            None => writeln!(out, "  ✓ {}", result.device_name)?,
            Some(e) => writeln!(out, "  ✗ {}: {}", result.device_name, truncate_lines(e, 3))?,
        }
    }
    writeln!(out)?;
    writeln!(
        out,
        "Config push complete: {} succeeded, {} failed. Logs saved to {}/",
        summary.succeeded.len(),
        summary.failed.len(),
        service.logs().log_dir().display()
    )?;

    Ok(Outcome::Completed {
        timestamp: ctx.timestamp,
        results,
        summary,
    })
}
