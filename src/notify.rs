use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::error;

use crate::config::EmailConfig;
use crate::platform::Inbox;

/// Port for the outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()>;
}

/// Email transport speaking SMTP with implicit TLS on port 465.
pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()> {
        let mut builder = Message::builder()
            .from(
                self.config
                    .username
                    .parse()
                    .context("Invalid sender address")?,
            )
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in recipients {
            builder = builder.to(recipient
                .parse()
                .with_context(|| format!("Invalid recipient address: {recipient}"))?);
        }
        let message = builder.body(body.to_string()).context("Failed to build email")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.server)
            .context("Invalid SMTP server address")?
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();

        transport
            .send(message)
            .await
            .context("Failed to send email")?;
        Ok(())
    }
}

/// Escalates operator alerts over both available channels.
///
/// The channels are independent: a failure in one is logged and must not
/// prevent the other from being attempted.
pub struct Notifier {
    inbox: Arc<dyn Inbox>,
    mailer: Arc<dyn Mailer>,
    operator_user: String,
    operator_email: String,
}

impl Notifier {
    pub fn new(
        inbox: Arc<dyn Inbox>,
        mailer: Arc<dyn Mailer>,
        operator_user: String,
        operator_email: String,
    ) -> Self {
        Self {
            inbox,
            mailer,
            operator_user,
            operator_email,
        }
    }

    /// Send `subject`/`body` to the operator via private message and email.
    pub async fn alert(&self, subject: &str, body: &str) {
        if let Err(err) = self
            .inbox
            .send_private_message(&self.operator_user, subject, body)
            .await
        {
            error!("Failed to send operator PM: {:#}", err);
        }

        if let Err(err) = self
            .mailer
            .send(subject, body, std::slice::from_ref(&self.operator_email))
            .await
        {
            error!("Failed to send operator email: {:#}", err);
        }
    }
}
