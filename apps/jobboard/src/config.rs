use std::path::PathBuf;

use anyhow::{ensure, Context, Result};

/// Application configuration loaded from environment variables.
/// Every setting has a default, so an empty environment boots a local instance.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub public_dir: PathBuf,
    /// Base URL used when building verification links.
    pub public_url: String,
    /// The account that receives the administrator role.
    pub admin_email: String,
    pub mail_from: String,
    pub mail_relay_url: Option<String>,
    pub mail_relay_token: Option<String>,
    pub bcrypt_cost: u32,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        Ok(Config {
            port,
            rust_log: env_or("RUST_LOG", "info"),
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            public_dir: PathBuf::from(env_or("PUBLIC_DIR", "public")),
            public_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            admin_email: env_or("ADMIN_EMAIL", "admin@example.com"),
            mail_from: env_or("MAIL_FROM", "noreply@example.com"),
            mail_relay_url: optional_env("MAIL_RELAY_URL"),
            mail_relay_token: optional_env("MAIL_RELAY_TOKEN"),
            bcrypt_cost: parse_bcrypt_cost(&env_or("BCRYPT_COST", "10"))?,
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
        })
    }

    /// Link delivered in the verification email.
    pub fn verification_url(&self, token: &str) -> String {
        format!(
            "{}/verify?token={token}",
            self.public_url.trim_end_matches('/')
        )
    }
}

/// bcrypt accepts work factors from 4 to 31.
fn parse_bcrypt_cost(raw: &str) -> Result<u32> {
    let cost = raw
        .trim()
        .parse::<u32>()
        .context("BCRYPT_COST must be an integer between 4 and 31")?;
    ensure!(
        (4..=31).contains(&cost),
        "BCRYPT_COST must be between 4 and 31, got {cost}"
    );
    Ok(cost)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
impl Config {
    /// Local defaults with the cheapest bcrypt cost.
    pub fn for_tests() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            data_dir: PathBuf::from("data"),
            upload_dir: PathBuf::from("uploads"),
            public_dir: PathBuf::from("public"),
            public_url: "http://localhost:8080".to_string(),
            admin_email: "admin@example.com".to_string(),
            mail_from: "noreply@example.com".to_string(),
            mail_relay_url: None,
            mail_relay_token: None,
            bcrypt_cost: 4,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_url() {
        let config = Config {
            public_url: "https://jobs.example.com".to_string(),
            ..Config::for_tests()
        };
        assert_eq!(
            config.verification_url("abc123"),
            "https://jobs.example.com/verify?token=abc123"
        );
    }

    #[test]
    fn test_bcrypt_cost_range() {
        assert_eq!(parse_bcrypt_cost("10").unwrap(), 10);
        assert_eq!(parse_bcrypt_cost("4").unwrap(), 4);
        assert_eq!(parse_bcrypt_cost("31").unwrap(), 31);
        for raw in ["3", "40", "0", "ten", ""] {
            assert!(parse_bcrypt_cost(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn test_verification_url_trailing_slash() {
        let config = Config {
            public_url: "http://localhost:8080/".to_string(),
            ..Config::for_tests()
        };
        assert_eq!(
            config.verification_url("t"),
            "http://localhost:8080/verify?token=t"
        );
    }
}
