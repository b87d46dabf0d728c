/**
 * Outgoing Email
 *
 * The account flows only need to hand an HTML message to "something that
 * sends mail". `Mailer` is that seam:
 *
 * - `SmtpMailer` relays through an SMTP server with `lettre`
 * - `LogMailer` writes messages to the log, for development without SMTP
 *
 * Templates for the two messages the service sends live at the bottom.
 */

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::backend::auth::verification::CODE_TTL_SECS;

/// Errors from composing or sending mail
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// A message ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers outgoing email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// SMTP relay settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Sends mail through an SMTP relay (STARTTLS/TLS per `relay`)
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?.port(settings.port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: settings.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(email.to.parse()?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)?;

        self.transport.send(message).await?;
        tracing::info!("Email sent to {}", email.to);
        Ok(())
    }
}

/// Logs outgoing mail instead of sending it
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            "SMTP not configured; email to {} ({}):\n{}",
            email.to,
            email.subject,
            email.html
        );
        Ok(())
    }
}

/// Verification code email
pub fn verification_email(to: &str, code: i64) -> OutgoingEmail {
    let minutes = CODE_TTL_SECS / 60;
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2 style="text-align: center;">Verify Your Email</h2>
  <p>Dear User,</p>
  <p>Use the verification code below to complete your registration:</p>
  <p style="text-align: center; font-size: 24px; font-weight: bold; letter-spacing: 4px;">{code}</p>
  <p>This code is valid for {minutes} minutes. Do not share it with anyone.</p>
  <p>If you did not request this, you can ignore this email.</p>
</div>"#
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: "Verification Code".to_string(),
        html,
    }
}

/// Password reset link email
pub fn reset_password_email(to: &str, reset_url: &str) -> OutgoingEmail {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2 style="text-align: center;">Reset Your Password</h2>
  <p>Dear User,</p>
  <p>You requested to reset your password. Click the link below to choose a new one:</p>
  <p style="text-align: center;"><a href="{reset_url}">{reset_url}</a></p>
  <p>This link expires in 15 minutes.</p>
  <p>If you did not request this, you can ignore this email.</p>
</div>"#
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: "Password Reset Request".to_string(),
        html,
    }
}
