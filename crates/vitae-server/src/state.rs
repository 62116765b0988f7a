//! Shared application state.

use std::sync::Arc;

use tracing::info;

use vitae_auth::{SessionManager, TokenSigner};
use vitae_core::{AppConfig, Result};
use vitae_store::SqliteStore;

use crate::mail::{activation_mail, Mailer};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: AppConfig,
    pub store: SqliteStore,
    pub sessions: SessionManager,
    pub tokens: TokenSigner,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: AppConfig, store: SqliteStore, mailer: Arc<dyn Mailer>) -> Self {
        let sessions = SessionManager::new(config.session_ttl);
        let tokens = TokenSigner::new(&config.token_key(), config.confirm_token_max_age);
        Self {
            config,
            store,
            sessions,
            tokens,
            mailer,
        }
    }

    /// Absolute link for a confirmation token.
    pub fn confirm_url(&self, token: &str) -> String {
        format!(
            "{}/api/confirm/{}",
            self.config.base_url.trim_end_matches('/'),
            token
        )
    }

    /// Issue a fresh confirmation token for `email` and mail the link.
    pub fn send_confirmation(&self, email: &str) -> Result<()> {
        let token = self.tokens.generate_confirmation_token(email)?;
        let mail = activation_mail(email, self.mailer.default_sender(), &self.confirm_url(&token));
        self.mailer.send(mail)?;
        info!("Confirmation mail sent to {}", email);
        Ok(())
    }
}
