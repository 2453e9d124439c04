use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::Config;
use crate::errors::AppError;
use crate::notify::{Notification, Notifier};

/// Sends notifications to a fixed recipient through an authenticated
/// STARTTLS relay.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn from_config(config: &Config) -> Result<Self> {
        let from: Mailbox = config
            .email_user
            .parse()
            .context("EMAIL_USER must be a valid email address")?;
        let to: Mailbox = config
            .recipient_email
            .parse()
            .context("RECIPIENT_EMAIL must be a valid email address")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("Invalid SMTP relay host '{}'", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.email_user.clone(),
                config.email_password.clone(),
            ))
            .timeout(Some(config.request_timeout()))
            .build();

        Ok(Self { transport, from, to })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, AppError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(notification.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                notification.plain.clone(),
                notification.html.clone(),
            ))
            .map_err(|e| AppError::Email(format!("Failed to build message: {e}")))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), AppError> {
        let message = self.build_message(notification)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(format!("SMTP relay rejected message: {e}")))?;

        info!(
            "Notification '{}' accepted by relay (code {})",
            notification.subject,
            response.code()
        );
        Ok(())
    }
}
