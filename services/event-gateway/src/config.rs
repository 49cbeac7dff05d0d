use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::net::SocketAddr;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
pub const DEFAULT_SWOOGO_API_BASE: &str = "https://api.swoogo.com";
pub const DEFAULT_EVENT_ID: &str = "219985";

/// OAuth2 client-credentials pair for the event provider.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub api_base: String,
}

impl fmt::Debug for StripeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeSettings")
            .field("secret_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SwoogoSettings {
    pub credentials: ClientCredentials,
    pub api_base: String,
    /// Used by event-scoped reads when the caller supplies no `event_id`.
    pub default_event_id: String,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub stripe: StripeSettings,
    pub swoogo: SwoogoSettings,
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    /// `None` allows any origin.
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl GatewayConfig {
    /// Explicit construction with default endpoints and bind address.
    pub fn new(stripe_secret_key: impl Into<String>, credentials: ClientCredentials) -> Self {
        Self {
            stripe: StripeSettings {
                secret_key: stripe_secret_key.into(),
                api_base: DEFAULT_STRIPE_API_BASE.to_string(),
            },
            swoogo: SwoogoSettings {
                credentials,
                api_base: DEFAULT_SWOOGO_API_BASE.to_string(),
                default_event_id: DEFAULT_EVENT_ID.to_string(),
            },
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "public".to_string(),
            cors_allowed_origins: None,
        }
    }

    pub fn with_stripe_api_base(mut self, base: impl Into<String>) -> Self {
        self.stripe.api_base = trim_base(base.into());
        self
    }

    pub fn with_swoogo_api_base(mut self, base: impl Into<String>) -> Self {
        self.swoogo.api_base = trim_base(base.into());
        self
    }

    pub fn with_default_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.swoogo.default_event_id = event_id.into();
        self
    }

    pub fn from_env() -> Result<Self> {
        let stripe_secret_key = required("STRIPE_SECRET_KEY")?;
        let client_id = required("CLIENT_ID")?;
        let client_secret = required("CLIENT_SECRET")?;

        let mut config = Self::new(stripe_secret_key, ClientCredentials::new(client_id, client_secret));
        if let Some(base) = optional("STRIPE_API_BASE") {
            config = config.with_stripe_api_base(base);
        }
        if let Some(base) = optional("SWOOGO_API_BASE") {
            config = config.with_swoogo_api_base(base);
        }
        if let Some(event_id) = optional("DEFAULT_EVENT_ID") {
            config = config.with_default_event_id(event_id);
        }
        if let Some(host) = optional("HOST") {
            config.host = host;
        }
        if let Some(port) = optional("PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{port}'"))?;
        }
        if let Some(dir) = optional("STATIC_DIR") {
            config.static_dir = dir;
        }
        config.cors_allowed_origins = optional("CORS_ALLOWED_ORIGINS").map(|value| parse_origins(&value));

        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: std::net::IpAddr = self
            .host
            .parse()
            .with_context(|| format!("HOST must be an IP address, got '{}'", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| normalize_optional(&value))
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(normalize_optional)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_provider_defaults() {
        let config = GatewayConfig::new("sk_test", ClientCredentials::new("id", "secret"));
        assert_eq!(config.stripe.api_base, DEFAULT_STRIPE_API_BASE);
        assert_eq!(config.swoogo.api_base, DEFAULT_SWOOGO_API_BASE);
        assert_eq!(config.swoogo.default_event_id, "219985");
        assert_eq!(config.port, 3000);
        assert!(config.cors_allowed_origins.is_none());
    }

    #[test]
    fn api_bases_drop_trailing_slash() {
        let config = GatewayConfig::new("sk_test", ClientCredentials::new("id", "secret"))
            .with_swoogo_api_base("http://127.0.0.1:9000/")
            .with_stripe_api_base("http://127.0.0.1:9001//");
        assert_eq!(config.swoogo.api_base, "http://127.0.0.1:9000");
        assert_eq!(config.stripe.api_base, "http://127.0.0.1:9001");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = GatewayConfig::new("sk_live_abc", ClientCredentials::new("id", "very-secret"));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk_live_abc"));
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn parse_origins_skips_blanks() {
        let origins = parse_origins("http://localhost:3000, ,http://localhost:5173;");
        assert_eq!(origins, vec!["http://localhost:3000", "http://localhost:5173"]);
    }

    #[test]
    fn bind_addr_rejects_hostnames() {
        let mut config = GatewayConfig::new("sk", ClientCredentials::new("id", "secret"));
        config.host = "localhost".to_string();
        assert!(config.bind_addr().is_err());
        config.host = "127.0.0.1".to_string();
        assert_eq!(config.bind_addr().unwrap().port(), 3000);
    }
}
