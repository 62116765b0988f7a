//! Vitae Core: configuration and shared error types.

pub mod config;
pub mod error;

pub use config::{AdminAccount, AppConfig, ConfigProfile, MailSettings, MAX_LIFETIME_SECS};
pub use error::{Error, Result};
