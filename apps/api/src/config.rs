use anyhow::{Context, Result};
use regex::Regex;

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
///
/// Admin email rules are parsed here, once, so no request path ever
/// re-reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub directory_api_url: String,
    pub directory_api_key: String,
    /// Emails granted admin unconditionally, trimmed and lowercased.
    pub admin_emails: Vec<String>,
    /// Optional pattern granting admin to any matching email.
    pub admin_email_pattern: Option<Regex>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let admin_emails =
            parse_admin_emails(&std::env::var("ADMIN_EMAILS").unwrap_or_default());

        let admin_email_pattern = match std::env::var("ADMIN_EMAIL_PATTERN") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                Regex::new(raw.trim()).context("ADMIN_EMAIL_PATTERN is not a valid regex")?,
            ),
            _ => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            directory_api_url: require_env("DIRECTORY_API_URL")?,
            directory_api_key: require_env("DIRECTORY_API_KEY")?,
            admin_emails,
            admin_email_pattern,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Splits a comma-separated admin email list. Entries are trimmed and
/// lowercased; empty entries are dropped.
pub fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
