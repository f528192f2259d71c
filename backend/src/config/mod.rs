//! Central module for application-wide configuration settings.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `HACKPORTAL_*` environment variables (`__` separates sections, e.g.
//! `HACKPORTAL_GATE__OPEN_AT`). The result is validated once at load and then
//! shared read-only; nothing in the request path looks configuration up from
//! the environment.

use std::net::SocketAddr;
use std::time::UNIX_EPOCH;

use adapters::Role;
use chrono::{DateTime, Utc};
use config::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub gate: GateConfig,

    /// Whether new applications are accepted.
    #[serde(default)]
    pub cycle: ApplicationCycle,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub merch: MerchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            gate: GateConfig::default(),
            cycle: ApplicationCycle::Open,
            storage: StorageConfig::default(),
            identity: IdentityConfig::default(),
            merch: MerchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,

    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            enable_cors: true,
        }
    }
}

/// Timing rules applied to every request before routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Instant at which the gated paths open to everyone.
    #[serde(default = "epoch")]
    pub open_at: DateTime<Utc>,

    /// Path prefixes that are closed until `open_at`.
    #[serde(default = "default_gated_prefixes")]
    pub gated_prefixes: Vec<String>,

    /// Role allowed through the gate early, inside `privileged_prefix` only.
    #[serde(default = "default_privileged_role")]
    pub privileged_role: Role,

    #[serde(default = "default_privileged_prefix")]
    pub privileged_prefix: String,

    /// Where closed requests are sent.
    #[serde(default = "default_closed_redirect")]
    pub closed_redirect: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            open_at: epoch(),
            gated_prefixes: default_gated_prefixes(),
            privileged_role: default_privileged_role(),
            privileged_prefix: default_privileged_prefix(),
            closed_redirect: default_closed_redirect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationCycle {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    Postgres {
        url: String,

        #[serde(default = "default_pool_size")]
        max_connections: u32,

        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum IdentityConfig {
    /// Tokens signed by the identity provider's secp256k1 key.
    SignedToken {
        issuer_public_key: String,

        #[serde(default = "default_cookie_name")]
        cookie_name: String,
    },

    /// `x-user-id`/`x-user-role` headers set by an authenticating proxy.
    #[default]
    TrustedHeader,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchConfig {
    #[serde(default = "epoch")]
    pub unlock_at: DateTime<Utc>,

    #[serde(default)]
    pub prompt: String,

    /// Empty disables the puzzle.
    #[serde(default)]
    pub answer: String,

    #[serde(default)]
    pub reward_url: String,
}

impl Default for MerchConfig {
    fn default() -> Self {
        Self {
            unlock_at: epoch(),
            prompt: String::new(),
            answer: String::new(),
            reward_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from(UNIX_EPOCH)
}

fn default_gated_prefixes() -> Vec<String> {
    ["/dashboard", "/apply", "/status", "/api/applications", "/api/teams"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_privileged_role() -> Role {
    Role::Admin
}

fn default_privileged_prefix() -> String {
    "/dashboard/admin".to_string()
}

fn default_closed_redirect() -> String {
    "/applications-closed".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Returns true when `prefix` is a usable path prefix: rooted, no trailing
/// slash, no query or fragment.
fn is_valid_prefix(prefix: &str) -> bool {
    prefix.starts_with('/')
        && prefix.len() > 1
        && !prefix.ends_with('/')
        && !prefix.contains(['?', '#'])
}

fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment,
    /// then validate it.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("HACKPORTAL")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("gate.gated_prefixes")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that would make gating decisions ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gate = &self.gate;

        if !gate.closed_redirect.starts_with('/') {
            return Err(ConfigError::Message(format!(
                "gate.closed_redirect must be a rooted path, got '{}'",
                gate.closed_redirect
            )));
        }

        if gate.gated_prefixes.is_empty() {
            return Err(ConfigError::Message(
                "gate.gated_prefixes must not be empty".to_string(),
            ));
        }

        if let Some(bad) = gate.gated_prefixes.iter().find(|p| !is_valid_prefix(p)) {
            return Err(ConfigError::Message(format!(
                "gate.gated_prefixes entry '{bad}' must start with '/' and not end with '/'"
            )));
        }

        if !is_valid_prefix(&gate.privileged_prefix) {
            return Err(ConfigError::Message(format!(
                "gate.privileged_prefix '{}' must start with '/' and not end with '/'",
                gate.privileged_prefix
            )));
        }

        if !gate
            .gated_prefixes
            .iter()
            .any(|p| is_under(&gate.privileged_prefix, p))
        {
            return Err(ConfigError::Message(format!(
                "gate.privileged_prefix '{}' is not inside any gated prefix",
                gate.privileged_prefix
            )));
        }

        let closed_path = gate
            .closed_redirect
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        if gate.gated_prefixes.iter().any(|p| is_under(closed_path, p)) {
            return Err(ConfigError::Message(format!(
                "gate.closed_redirect '{}' is itself gated",
                gate.closed_redirect
            )));
        }

        if let IdentityConfig::SignedToken {
            issuer_public_key,
            cookie_name,
        } = &self.identity
        {
            if issuer_public_key.trim().is_empty() {
                return Err(ConfigError::Message(
                    "identity.issuer_public_key is required for signed_token".to_string(),
                ));
            }
            if cookie_name.is_empty() {
                return Err(ConfigError::Message(
                    "identity.cookie_name must not be empty".to_string(),
                ));
            }
        }

        if !self.merch.answer.trim().is_empty() && self.merch.reward_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "merch.reward_url is required when merch.answer is set".to_string(),
            ));
        }

        Ok(())
    }
}
