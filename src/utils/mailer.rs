//! Fire-and-forget outgoing mail.
//!
//! Handlers push onto a bounded queue and return immediately; a single background
//! worker drains it. Delivery failures and a full queue are logged, never returned.

use std::sync::Arc;

use futures::future::BoxFuture;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("failed to send email: {0}")]
    Send(String),
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    pub fn verification(frontend_url: &str, to: &str, token: &str) -> Self {
        let link = format!("{}/verify-email?token={}", frontend_url.trim_end_matches('/'), token);
        Self {
            to: to.to_string(),
            subject: "Verify your email address".to_string(),
            body: format!(
                "Hi,\n\nPlease verify your email address by opening the link below:\n\n{link}\n\n\
                 If you did not create an account, you can ignore this email.\n"
            ),
        }
    }
}

pub trait EmailTransport: Send + Sync + 'static {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, Result<(), EmailError>>;
}

/// Used when no SMTP host is configured.
pub struct LogTransport;

impl EmailTransport for LogTransport {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, Result<(), EmailError>> {
        Box::pin(async move {
            info!(to = %email.to, subject = %email.subject, body = %email.body, "Email (log transport)");
            Ok(())
        })
    }
}

pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

/// Port 465 speaks TLS from the first byte; every other port upgrades with STARTTLS.
fn implicit_tls(port: u16) -> bool {
    port == 465
}

impl SmtpTransport {
    pub fn new(host: &str, config: &EmailConfig) -> Result<Self, EmailError> {
        let builder = if implicit_tls(config.smtp_port) {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        };
        let transport = builder
            .map_err(|e| EmailError::Send(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();
        let from = config
            .from_email
            .parse()
            .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?;

        Ok(Self { transport, from })
    }
}

impl EmailTransport for SmtpTransport {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, Result<(), EmailError>> {
        Box::pin(async move {
            let message = Message::builder()
                .from(self.from.clone())
                .to(email
                    .to
                    .parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
                .subject(email.subject.clone())
                .header(ContentType::TEXT_PLAIN)
                .body(email.body.clone())
                .map_err(|e| EmailError::Build(e.to_string()))?;

            self.transport
                .send(message)
                .await
                .map_err(|e| EmailError::Send(e.to_string()))?;
            Ok(())
        })
    }
}

pub fn transport_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailTransport>, EmailError> {
    match &config.smtp_host {
        Some(host) => Ok(Arc::new(SmtpTransport::new(host, config)?)),
        None => {
            warn!("SMTP_HOST not set, outgoing email will only be logged");
            Ok(Arc::new(LogTransport))
        }
    }
}

#[derive(Clone)]
pub struct EmailQueue {
    sender: mpsc::Sender<OutgoingEmail>,
}

impl EmailQueue {
    /// Spawns the delivery worker on the current runtime.
    pub fn start(transport: Arc<dyn EmailTransport>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        actix_web::rt::spawn(run_worker(transport, receiver));
        Self { sender }
    }

    /// Never blocks and never fails the caller.
    pub fn enqueue(&self, email: OutgoingEmail) {
        match self.sender.try_send(email) {
            Ok(()) => debug!("Email queued"),
            Err(TrySendError::Full(email)) => {
                warn!(to = %email.to, "Email queue full, dropping message")
            }
            Err(TrySendError::Closed(email)) => {
                error!(to = %email.to, "Email worker stopped, dropping message")
            }
        }
    }
}

async fn run_worker(transport: Arc<dyn EmailTransport>, mut receiver: mpsc::Receiver<OutgoingEmail>) {
    while let Some(email) = receiver.recv().await {
        match transport.send(&email).await {
            Ok(()) => debug!(to = %email.to, "Email delivered"),
            Err(e) => error!(error = %e, to = %email.to, "Failed to deliver email"),
        }
    }
    debug!("Email worker shutting down");
}
