use std::time::Duration;

use log::*;
use mss_common::Secret;

pub const DEFAULT_SHIPROCKET_BASE_URL: &str = "https://apiv2.shiprocket.in";
pub const DEFAULT_SHIPROCKET_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ShiprocketConfig {
    pub base_url: String,
    pub email: String,
    pub password: Secret<String>,
    /// A pre-issued bearer token. When set, the email/password login is skipped.
    pub api_token: Option<Secret<String>>,
    pub timeout: Duration,
}

impl Default for ShiprocketConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SHIPROCKET_BASE_URL.to_string(),
            email: String::default(),
            password: Secret::default(),
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_SHIPROCKET_TIMEOUT_SECS),
        }
    }
}

impl ShiprocketConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("SHIPROCKET_BASE_URL").unwrap_or_else(|_| {
            debug!("SHIPROCKET_BASE_URL not set, using {DEFAULT_SHIPROCKET_BASE_URL}");
            DEFAULT_SHIPROCKET_BASE_URL.to_string()
        });
        let email = std::env::var("SHIPROCKET_EMAIL").unwrap_or_else(|_| {
            warn!("SHIPROCKET_EMAIL not set, using (probably useless) default");
            "ops@example.com".to_string()
        });
        let password = Secret::new(std::env::var("SHIPROCKET_PASSWORD").unwrap_or_else(|_| {
            warn!("SHIPROCKET_PASSWORD not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let api_token = std::env::var("SHIPROCKET_API_TOKEN").ok().map(Secret::new);
        let timeout = std::env::var("SHIPROCKET_TIMEOUT_SECS")
            .map(|s| {
                s.parse::<u64>().unwrap_or_else(|e| {
                    warn!("Invalid SHIPROCKET_TIMEOUT_SECS ({e}), using {DEFAULT_SHIPROCKET_TIMEOUT_SECS}s");
                    DEFAULT_SHIPROCKET_TIMEOUT_SECS
                })
            })
            .unwrap_or(DEFAULT_SHIPROCKET_TIMEOUT_SECS);
        Self { base_url, email, password, api_token, timeout: Duration::from_secs(timeout) }
    }
}
