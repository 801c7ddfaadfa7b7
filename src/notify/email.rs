use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{Notifier, Report};

/// SMTP delivery: one HTML message addressed to every recipient.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

fn env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("{key} missing"))
}

/// Comma-separated recipient list; blanks are ignored.
pub fn parse_recipients(raw: &str) -> Result<Vec<Mailbox>> {
    let to: Vec<Mailbox> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().with_context(|| format!("invalid recipient {s:?}")))
        .collect::<Result<_>>()?;
    if to.is_empty() {
        return Err(anyhow!("NOTIFY_EMAIL_TO has no recipients"));
    }
    Ok(to)
}

impl EmailNotifier {
    pub fn from_env() -> Result<Self> {
        let host = env("SMTP_HOST")?;
        let user = env("SMTP_USER")?;
        let pass = env("SMTP_PASS")?;
        let from_addr = env("NOTIFY_EMAIL_FROM")?;
        let to_addr = env("NOTIFY_EMAIL_TO")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        let from = from_addr.parse().context("invalid NOTIFY_EMAIL_FROM")?;
        let to = parse_recipients(&to_addr)?;

        Ok(Self { mailer, from, to })
    }

    fn build(&self, report: &Report) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(report.subject.clone())
            .header(header::ContentType::TEXT_HTML);
        for to in &self.to {
            builder = builder.to(to.clone());
        }
        builder.body(report.html.clone()).context("build email")
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, report: &Report) -> Result<()> {
        let msg = self.build(report)?;
        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }
}
