use crate::services::signing::MerchantKey;
use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testnet,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testnet => "testnet",
            Environment::Production => "production",
        }
    }
}

/// Which payment-network deployment the adapter talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DroppEnvironment {
    Sandbox,
    Prod,
}

impl DroppEnvironment {
    pub fn default_api_url(&self) -> &'static str {
        match self {
            DroppEnvironment::Sandbox => "https://api.sandbox.dropp.cc",
            DroppEnvironment::Prod => "https://api.dropp.cc",
        }
    }
}

impl FromStr for DroppEnvironment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "SANDBOX" | "DEV" | "TEST" => Ok(DroppEnvironment::Sandbox),
            "PROD" | "PRODUCTION" => Ok(DroppEnvironment::Prod),
            _ => bail!("Unknown DROPP_ENVIRONMENT: {}", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Payment network
    pub dropp_environment: DroppEnvironment,
    pub dropp_api_url: String,
    pub merchant_id: String,
    pub merchant_signing_key: MerchantKey,

    // External record store and chain mirror
    pub record_store_url: String,
    pub mirror_node_url: String,

    // Callback URL handed to the network when the caller does not supply one
    pub public_base_url: Option<String>,

    pub http_timeout: Duration,

    // Status polling
    pub status_poll_retries: u32,
    pub status_poll_max_retries: u32,
    pub status_poll_interval: Duration,

    pub verify_on_callback: bool,

    // Redis
    pub redis_url: String,

    // Rate Limiting
    pub rate_limit_max_requests: u64,
    pub rate_limit_window: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment()?;
        let dropp_environment: DroppEnvironment = std::env::var("DROPP_ENVIRONMENT")
            .unwrap_or_else(|_| "SANDBOX".to_string())
            .parse()?;

        let config = Self {
            environment,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_var("PORT", "8080")?,

            dropp_api_url: std::env::var("DROPP_API_URL")
                .unwrap_or_else(|_| dropp_environment.default_api_url().to_string()),
            dropp_environment,
            merchant_id: std::env::var("DROPP_MERCHANT_ID")
                .context("DROPP_MERCHANT_ID required")?,
            merchant_signing_key: std::env::var("DROPP_MERCHANT_SIGNING_KEY")
                .context("DROPP_MERCHANT_SIGNING_KEY required")?
                .parse()
                .context("Invalid DROPP_MERCHANT_SIGNING_KEY")?,

            record_store_url: std::env::var("DJANGO_BASE_URL")
                .context("DJANGO_BASE_URL required")?,
            mirror_node_url: std::env::var("HEDERA_MIRROR_NODE_URL")
                .unwrap_or_else(|_| "https://testnet.mirrornode.hedera.com/api/v1".to_string()),

            public_base_url: std::env::var("PUBLIC_BASE_URL").ok(),

            http_timeout: Duration::from_secs(Self::parse_var("HTTP_TIMEOUT_SECS", "10")?),

            status_poll_retries: Self::parse_var("STATUS_POLL_RETRIES", "3")?,
            status_poll_max_retries: Self::parse_var("STATUS_POLL_MAX_RETRIES", "10")?,
            status_poll_interval: Duration::from_millis(Self::parse_var(
                "STATUS_POLL_INTERVAL_MS",
                "1000",
            )?),

            verify_on_callback: Self::parse_var("VERIFY_ON_CALLBACK", "false")?,

            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),

            rate_limit_max_requests: Self::parse_var("RATE_LIMIT_MAX_REQUESTS", "100")?,
            rate_limit_window: Duration::from_secs(Self::parse_var(
                "RATE_LIMIT_WINDOW_SECS",
                "900",
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment() -> Result<Environment> {
        let env = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testnet" | "test" => Ok(Environment::Testnet),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn parse_var<T>(var: &str, default: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        std::env::var(var)
            .unwrap_or_else(|_| default.to_string())
            .parse()
            .with_context(|| format!("Invalid {}", var))
    }

    fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("DROPP_API_URL", self.dropp_api_url.as_str()),
            ("DJANGO_BASE_URL", self.record_store_url.as_str()),
            ("HEDERA_MIRROR_NODE_URL", self.mirror_node_url.as_str()),
        ] {
            if !url.starts_with("http") {
                bail!("{} must be HTTP(S) URL", name);
            }
        }

        if let Some(base) = &self.public_base_url {
            if !base.starts_with("http") {
                bail!("PUBLIC_BASE_URL must be HTTP(S) URL");
            }
        }

        if self.merchant_id.trim().is_empty() {
            bail!("DROPP_MERCHANT_ID must not be empty");
        }

        if self.status_poll_retries == 0 || self.status_poll_max_retries == 0 {
            bail!("Status poll retry counts must be at least 1");
        }

        if self.rate_limit_max_requests == 0 || self.rate_limit_window.is_zero() {
            bail!("Rate limit must allow at least one request per window");
        }

        tracing::info!(
            "Configuration validated for {:?} environment (payment network: {:?})",
            self.environment,
            self.dropp_environment
        );

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Callback URL handed to the payment network when a checkout does not name one.
    pub fn default_callback_url(&self) -> String {
        let base = self
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port));
        format!("{}/api/payments/post-callback", base.trim_end_matches('/'))
    }

    /// Clamp a caller-supplied retry count into `1..=status_poll_max_retries`.
    pub fn poll_retries(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.status_poll_retries)
            .clamp(1, self.status_poll_max_retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dropp_environment_names() {
        assert_eq!("sandbox".parse::<DroppEnvironment>().unwrap(), DroppEnvironment::Sandbox);
        assert_eq!("PROD".parse::<DroppEnvironment>().unwrap(), DroppEnvironment::Prod);
        assert!("mainnet".parse::<DroppEnvironment>().is_err());
    }

    fn config() -> Config {
        Config {
            environment: Environment::Development,
            host: "127.0.0.1".into(),
            port: 8080,
            dropp_environment: DroppEnvironment::Sandbox,
            dropp_api_url: DroppEnvironment::Sandbox.default_api_url().into(),
            merchant_id: "0.0.100".into(),
            merchant_signing_key: "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60"
                .parse()
                .unwrap(),
            record_store_url: "http://localhost:8000".into(),
            mirror_node_url: "https://testnet.mirrornode.hedera.com/api/v1".into(),
            public_base_url: None,
            http_timeout: Duration::from_secs(10),
            status_poll_retries: 3,
            status_poll_max_retries: 10,
            status_poll_interval: Duration::from_millis(1000),
            verify_on_callback: false,
            redis_url: "redis://localhost:6379".into(),
            rate_limit_max_requests: 100,
            rate_limit_window: Duration::from_secs(900),
        }
    }

    #[test]
    fn poll_retries_default_and_clamp() {
        let config = config();
        assert_eq!(config.poll_retries(None), 3);
        assert_eq!(config.poll_retries(Some(0)), 1);
        assert_eq!(config.poll_retries(Some(50)), 10);
    }

    #[test]
    fn callback_url_prefers_public_base() {
        let mut config = config();
        assert_eq!(
            config.default_callback_url(),
            "http://127.0.0.1:8080/api/payments/post-callback"
        );

        config.public_base_url = Some("https://pay.example.com/".into());
        assert_eq!(
            config.default_callback_url(),
            "https://pay.example.com/api/payments/post-callback"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        let mut config = config();
        config.record_store_url = "ftp://records".into();
        assert!(config.validate().is_err());
    }
}
