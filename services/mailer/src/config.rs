use serde::Deserialize;

use shop_core::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackend {
    /// Log each email instead of sending it.
    Console,
    Smtp,
}

/// Mailer worker configuration, read from the environment.
#[derive(Debug, Deserialize)]
pub struct MailerConfig {
    pub database_url: String,
    #[serde(default = "default_backend")]
    pub email_backend: EmailBackend,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// `DEFAULT_FROM_EMAIL`: sender address on every outgoing email.
    #[serde(default = "default_from_email")]
    pub default_from_email: String,
    #[serde(default = "default_poll_interval_ms")]
    pub mailer_poll_interval_ms: u64,
    #[serde(default = "default_batch_size")]
    pub mailer_batch_size: u64,
    #[serde(default = "default_max_attempts")]
    pub mailer_max_attempts: i32,
}

impl Config for MailerConfig {}

fn default_backend() -> EmailBackend {
    EmailBackend::Console
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_email() -> String {
    "webmaster@localhost".to_owned()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_batch_size() -> u64 {
    10
}

fn default_max_attempts() -> i32 {
    5
}
