use std::env;
use std::time::Duration;

use portalseal_core::constants::{DEFAULT_HANDSHAKE_TTL_SECS, DEFAULT_KID};

const MIN_HANDSHAKE_TTL_SECS: u64 = 1;
const MAX_HANDSHAKE_TTL_SECS: u64 = 3600;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the Axum HTTP listener.
    pub http_port: u16,
    /// Encrypt generic responses when no route forces it.
    pub encryption_enabled: bool,
    /// Key-version tag advertised on new handshakes.
    pub kid: String,
    /// Lifetime of a negotiated handshake.
    pub handshake_ttl: Duration,
    /// Interval of the background expiry sweep.
    pub sweep_interval: Duration,
    /// Negotiations allowed per client IP within `handshake_rate_window`.
    /// Zero disables the limiter.
    pub handshake_rate_limit: u32,
    pub handshake_rate_window: Duration,
    pub portal: PortalSettings,
}

/// Settings surfaced to the admin settings endpoint.
#[derive(Debug, Clone, Default)]
pub struct PortalSettings {
    pub portal_title: String,
    pub local_login_enabled: bool,
    pub bootstrap_local_only: bool,
    pub azure_client_secret_configured: bool,
    pub db_password_configured: bool,
    pub uptime_kuma_api_key_configured: bool,
    pub aps_api_token_configured: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `HTTP_PORT` (default 8080)
    /// - `AUTH_ENCRYPTION_ENABLED` (default false; 1/true/yes/on)
    /// - `AUTH_PAYLOAD_ENC_KID` (default `v1`)
    /// - `HANDSHAKE_TTL_SECS` (default 600, clamped to 1..=3600), `HANDSHAKE_SWEEP_SECS` (default 60)
    /// - `HANDSHAKE_RATE_LIMIT` (default 300), `HANDSHAKE_RATE_WINDOW_SECS` (default 300)
    /// - `PORTAL_TITLE`, `LOCAL_LOGIN_ENABLED` (default true), `BOOTSTRAP_LOCAL_ONLY`
    /// - `AZURE_CLIENT_SECRET`, `DB_PASSWORD`, `UPTIME_KUMA_API_KEY`, `APS_API_TOKEN`
    ///   (only their presence is recorded)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |name: &str, default: u64| {
            lookup(name)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        let flag = |name: &str, default: bool| lookup(name).map(|s| parse_flag(&s)).unwrap_or(default);
        let present = |name: &str| lookup(name).is_some_and(|s| !s.trim().is_empty());

        let http_port = lookup("HTTP_PORT")
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(8080);

        let kid = lookup("AUTH_PAYLOAD_ENC_KID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_KID.to_string());

        let handshake_rate_limit = lookup("HANDSHAKE_RATE_LIMIT")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(300);

        Self {
            http_port,
            encryption_enabled: flag("AUTH_ENCRYPTION_ENABLED", false),
            kid,
            handshake_ttl: Duration::from_secs(
                number("HANDSHAKE_TTL_SECS", DEFAULT_HANDSHAKE_TTL_SECS)
                    .clamp(MIN_HANDSHAKE_TTL_SECS, MAX_HANDSHAKE_TTL_SECS),
            ),
            sweep_interval: Duration::from_secs(number("HANDSHAKE_SWEEP_SECS", 60).max(1)),
            handshake_rate_limit,
            handshake_rate_window: Duration::from_secs(number("HANDSHAKE_RATE_WINDOW_SECS", 300).max(1)),
            portal: PortalSettings {
                portal_title: lookup("PORTAL_TITLE").unwrap_or_else(|| "IT Services Portal".to_string()),
                local_login_enabled: flag("LOCAL_LOGIN_ENABLED", true),
                bootstrap_local_only: flag("BOOTSTRAP_LOCAL_ONLY", false),
                azure_client_secret_configured: present("AZURE_CLIENT_SECRET"),
                db_password_configured: present("DB_PASSWORD"),
                uptime_kuma_api_key_configured: present("UPTIME_KUMA_API_KEY"),
                aps_api_token_configured: present("APS_API_TOKEN"),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
