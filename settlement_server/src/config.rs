use std::env;

use log::*;
use mss_common::{parse_boolean_flag, Secret};
use shiprocket_tools::ShiprocketConfig;

const DEFAULT_MSS_HOST: &str = "127.0.0.1";
const DEFAULT_MSS_PORT: u16 = 8470;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// Payment gateway signing secrets and signature policy.
    pub gateway: GatewayConfig,
    /// Shipping carrier account configuration.
    pub shiprocket: ShiprocketConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MSS_HOST.to_string(),
            port: DEFAULT_MSS_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            gateway: GatewayConfig::default(),
            shiprocket: ShiprocketConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MSS_HOST").ok().unwrap_or_else(|| DEFAULT_MSS_HOST.into());
        let port = env::var("MSS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MSS_PORT. {e} Using the default, {DEFAULT_MSS_PORT}, instead."
                    );
                    DEFAULT_MSS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MSS_PORT);
        let database_url = env::var("MSS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MSS_DATABASE_URL is not set. Please set it to the URL for the settlement database.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("MSS_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("MSS_USE_FORWARDED").ok(), false);
        let gateway = GatewayConfig::from_env_or_default();
        let shiprocket = ShiprocketConfig::new_from_env_or_default();
        Self { host, port, database_url, use_x_forwarded_for, use_forwarded, gateway, shiprocket }
    }
}

//-------------------------------------------  GatewayConfig  ---------------------------------------------------------

/// The payment gateway's signing material. The webhook and the checkout callback are signed with
/// different secrets, so both are carried.
#[derive(Clone, Debug, Default)]
pub struct GatewayConfig {
    /// Secret for webhook signatures. The gateway signs the raw request body and sends the hex
    /// digest in the `x-gateway-signature` header.
    pub webhook_secret: Secret<String>,
    /// Secret for checkout callback signatures, computed over
    /// `"{gateway_order_id}|{gateway_payment_id}"`.
    pub api_secret: Secret<String>,
    /// When false, webhook signature checks are skipped entirely. Local development only.
    pub hmac_checks: bool,
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let webhook_secret = env::var("MSS_GATEWAY_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ MSS_GATEWAY_WEBHOOK_SECRET is not set. Please set it to the webhook signing secret configured on \
                 the gateway dashboard."
            );
            String::default()
        });
        let api_secret = env::var("MSS_GATEWAY_API_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ MSS_GATEWAY_API_SECRET is not set. Please set it to the gateway API key secret.");
            String::default()
        });
        let hmac_checks = parse_boolean_flag(env::var("MSS_GATEWAY_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!(
                "🚨️ Gateway HMAC checks are disabled. Unsigned webhook calls will be accepted. Do not run production \
                 like this."
            );
        }
        Self { webhook_secret: Secret::new(webhook_secret), api_secret: Secret::new(api_secret), hmac_checks }
    }
}

//-------------------------------------------  ServerOptions  ---------------------------------------------------------

/// A subset of the server configuration that handlers need at request time. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
