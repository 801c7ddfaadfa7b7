//! Delivery of run reports.

pub mod email;
pub mod report;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

pub use email::EmailNotifier;
pub use report::Report;

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, report: &Report) -> Result<()>;
}

/// Writes the report to the log. Used when SMTP is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, report: &Report) -> Result<()> {
        info!(
            target: "notify",
            program = %report.program,
            rows = report.rows,
            subject = %report.subject,
            html = %report.html,
            "report"
        );
        Ok(())
    }
}

/// Email when the SMTP environment is complete, log otherwise.
pub fn from_env() -> Box<dyn Notifier> {
    match EmailNotifier::from_env() {
        Ok(email) => Box::new(email),
        Err(e) => {
            warn!(target: "notify", error = %e, "email disabled; reports go to the log");
            Box::new(LogNotifier)
        }
    }
}

/// Send `report` unless it lists nothing.
pub async fn deliver(notifier: &dyn Notifier, report: &Report) -> Result<bool> {
    if report.is_empty() {
        info!(target: "notify", program = %report.program, "no promotions; nothing to send");
        return Ok(false);
    }
    notifier.send(report).await?;
    info!(target: "notify", program = %report.program, via = notifier.name(), rows = report.rows, "report sent");
    Ok(true)
}
