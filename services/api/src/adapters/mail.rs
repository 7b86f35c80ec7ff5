//! services/api/src/adapters/mail.rs
//!
//! `MailTransport` implementations: SMTP through `lettre`, and a fallback that
//! only logs when no SMTP server is configured.

use async_trait::async_trait;
use course_admin_core::ports::{MailMessage, MailTransport, PortError, PortResult};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, PortError> {
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| PortError::Validation(format!("Invalid SMTP_FROM address: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| PortError::Unexpected(format!("Invalid SMTP relay: {e}")))?
            .port(config.port);
        if let (Some(user), Some(pass)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

/// Builds the MIME message: multipart/alternative when there is an HTML body.
fn build_message(from: Mailbox, message: MailMessage) -> PortResult<Message> {
    let to = message
        .to
        .parse::<Mailbox>()
        .map_err(|e| PortError::Validation(format!("Invalid recipient {}: {e}", message.to)))?;
    let builder = Message::builder().from(from).to(to).subject(message.subject);
    let built = match message.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(message.text, html)),
        None => builder.header(ContentType::TEXT_PLAIN).body(message.text),
    };
    built.map_err(|e| PortError::Unexpected(format!("Failed to build email: {e}")))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: MailMessage) -> PortResult<()> {
        let to = message.to.clone();
        let email = build_message(self.from.clone(), message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| PortError::Unexpected(format!("SMTP transport error: {e}")))?;
        info!(to = %to, "Email sent");
        Ok(())
    }
}

/// Used when `SMTP_HOST` is unset. Messages are dropped after being logged.
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn send(&self, message: MailMessage) -> PortResult<()> {
        info!(to = %message.to, subject = %message.subject, "SMTP not configured; email not sent");
        Ok(())
    }
}
