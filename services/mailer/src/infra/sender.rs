use anyhow::Context as _;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::domain::repository::EmailSender;
use crate::domain::types::Email;
use crate::error::MailerError;

/// Writes each email to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSender;

impl EmailSender for ConsoleSender {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "email"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    /// STARTTLS relay on `host:port`, authenticating when both credentials are set.
    pub fn new(
        host: &str,
        port: u16,
        username: Option<String>,
        password: Option<String>,
    ) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .context("create smtp relay")?
            .port(port);
        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.credentials(Credentials::new(username, password));
        }
        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailerError> {
    address
        .parse()
        .map_err(|_| MailerError::InvalidAddress(address.to_owned()))
}

pub fn build_message(email: &Email) -> Result<Message, MailerError> {
    let message = Message::builder()
        .from(mailbox(&email.from)?)
        .to(mailbox(&email.to)?)
        .subject(&email.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())
        .context("build email message")?;
    Ok(message)
}

impl EmailSender for SmtpSender {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        let message = build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;
        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

/// The configured transport, chosen at startup.
#[derive(Clone)]
pub enum Transport {
    Console(ConsoleSender),
    Smtp(SmtpSender),
}

impl EmailSender for Transport {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        match self {
            Self::Console(sender) => sender.send(email).await,
            Self::Smtp(sender) => sender.send(email).await,
        }
    }
}
