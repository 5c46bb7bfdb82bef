// Environment-variable configuration. Required variables missing at startup
// are fatal; the validation pass reports softer problems as warnings before
// the service starts taking traffic.

use std::env;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::UserAddress;

pub const DEFAULT_API_HOST: &str = "0.0.0.0";
pub const DEFAULT_API_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVariable(&'static str),

    #[error("environment variable {name} is invalid: {reason}")]
    InvalidVariable { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub api_host: String,
    pub api_port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in: String,
    pub sepolia_rpc_url: String,
    pub private_key: String,
    pub etherscan_api_key: String,
    pub fair_ordering_contract: Option<String>,
    pub commit_reveal_contract: Option<String>,
    pub threshold_decryption_contract: Option<String>,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVariable(name)),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl CoordinatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_port = match optional("API_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidVariable {
                name: "API_PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_API_PORT,
        };

        Ok(Self {
            api_host: optional("API_HOST").unwrap_or_else(|| DEFAULT_API_HOST.into()),
            api_port,
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expires_in: required("JWT_EXPIRES_IN")?,
            sepolia_rpc_url: required("SEPOLIA_RPC_URL")?,
            private_key: required("PRIVATE_KEY")?,
            etherscan_api_key: required("ETHERSCAN_API_KEY")?,
            fair_ordering_contract: optional("FAIR_ORDERING_CONTRACT_ADDRESS"),
            commit_reveal_contract: optional("COMMIT_REVEAL_CONTRACT_ADDRESS"),
            threshold_decryption_contract: optional("THRESHOLD_DECRYPTION_CONTRACT_ADDRESS"),
        })
    }

    /// Sanity pass over an already-loaded configuration.
    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        if self.jwt_secret.len() < 32 {
            validation.add_warning(format!(
                "JWT_SECRET is short ({} chars) - recommend at least 32 characters",
                self.jwt_secret.len()
            ));
        }
        let lowered = self.jwt_secret.to_lowercase();
        if lowered == "secret" || lowered == "password" || lowered == "changeme" {
            validation.add_error("JWT_SECRET is a common/weak value - MUST change it".into());
        }

        if !self.sepolia_rpc_url.starts_with("http://")
            && !self.sepolia_rpc_url.starts_with("https://")
            && !self.sepolia_rpc_url.starts_with("ws")
        {
            validation.add_error(format!(
                "SEPOLIA_RPC_URL has an unsupported scheme: '{}'",
                self.sepolia_rpc_url
            ));
        }

        let stripped = self.private_key.trim_start_matches("0x");
        if stripped.len() != 64 || hex::decode(stripped).is_err() {
            validation.add_error("PRIVATE_KEY must be 32 bytes of hex".into());
        }

        for (name, value) in [
            ("FAIR_ORDERING_CONTRACT_ADDRESS", &self.fair_ordering_contract),
            ("COMMIT_REVEAL_CONTRACT_ADDRESS", &self.commit_reveal_contract),
            (
                "THRESHOLD_DECRYPTION_CONTRACT_ADDRESS",
                &self.threshold_decryption_contract,
            ),
        ] {
            match value {
                Some(address) => {
                    if address.parse::<UserAddress>().is_err() {
                        validation
                            .add_error(format!("{} is not a valid contract address", name));
                    }
                }
                None => {
                    validation.add_warning(format!(
                        "{} not set - the matching ordering method cannot be mirrored on-chain",
                        name
                    ));
                }
            }
        }

        validation
    }
}

/// Outcome of the startup configuration checks.
pub struct ConfigValidation {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    fn new() -> Self {
        Self {
            valid: true,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn add_error(&mut self, message: String) {
        self.errors.push(message);
        self.valid = false;
    }

    pub fn log_summary(&self) {
        for warning in &self.warnings {
            warn!("configuration: {}", warning);
        }
        for err in &self.errors {
            error!("configuration: {}", err);
        }
        if self.valid && self.warnings.is_empty() {
            info!("configuration validation passed");
        }
    }
}
