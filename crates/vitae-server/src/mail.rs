//! Outgoing mail.
//!
//! Handlers talk to a `Mailer` trait object. `LogMailer` logs every
//! message and keeps it in an in-memory outbox.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use vitae_core::{MailSettings, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Trait for mail transports.
pub trait Mailer: Send + Sync {
    fn send(&self, mail: OutgoingMail) -> Result<()>;

    /// Sender address used when a message does not name one.
    fn default_sender(&self) -> &str;
}

/// Mailer that records messages instead of delivering them.
pub struct LogMailer {
    settings: MailSettings,
    outbox: Mutex<Vec<OutgoingMail>>,
}

impl LogMailer {
    pub fn new(settings: MailSettings) -> Self {
        info!(
            "Mail outbox active (server {}:{}, sender {})",
            settings.server, settings.port, settings.default_sender
        );
        Self {
            settings,
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Every message sent so far, oldest first.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.outbox.lock().clone()
    }
}

impl Mailer for LogMailer {
    fn send(&self, mail: OutgoingMail) -> Result<()> {
        info!("Mail to {}: {}", mail.to, mail.subject);
        self.outbox.lock().push(mail);
        Ok(())
    }

    fn default_sender(&self) -> &str {
        &self.settings.default_sender
    }
}

/// Build the account activation message.
pub fn activation_mail(to: &str, from: &str, confirm_url: &str) -> OutgoingMail {
    OutgoingMail {
        from: from.to_string(),
        to: to.to_string(),
        subject: "Please confirm your email".to_string(),
        html: format!(
            "<p>Welcome! Thanks for signing up. Please follow this link to activate your account:</p>\n\
             <p><a href=\"{url}\">{url}</a></p>\n\
             <br>\n\
             <p>Cheers!</p>",
            url = confirm_url
        ),
    }
}
