use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::Level;
use url::Url;

#[derive(Parser, Debug)]
pub struct Env {
    /// Path to the TOML configuration file
    #[clap(long)]
    pub config: PathBuf,
}

/// Settings deserialized from the configuration TOML. Everything except
/// the contract id falls back to network defaults.
#[derive(Debug, Deserialize)]
struct Config {
    contract_id: String,
    network: Option<Network>,
    soroban_rpc_url: Option<Url>,
    horizon_url: Option<Url>,
    network_passphrase: Option<String>,
    log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Public,
}

impl Network {
    fn default_soroban_rpc_url(self) -> &'static str {
        match self {
            Self::Testnet => "https://soroban-testnet.stellar.org",
            Self::Public => "https://mainnet.sorobanrpc.com",
        }
    }

    fn default_horizon_url(self) -> &'static str {
        match self {
            Self::Testnet => "https://horizon-testnet.stellar.org",
            Self::Public => "https://horizon.stellar.org",
        }
    }

    fn default_passphrase(self) -> &'static str {
        match self {
            Self::Testnet => "Test SDF Network ; September 2015",
            Self::Public => "Public Global Stellar Network ; September 2015",
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("'{0}' is not a valid contract id")]
    InvalidContractId(String),
    #[error("'{0}' is not a valid URL")]
    InvalidUrl(String),
}

/// Runtime context assembled from the config file and network defaults.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub contract_id: String,
    pub soroban_rpc_url: Url,
    pub horizon_url: Url,
    pub network_passphrase: String,
    pub log_level: LogLevel,
}

impl Env {
    pub fn into_ctx(self) -> Result<Ctx, ConfigError> {
        let raw = std::fs::read_to_string(&self.config)?;
        let config: Config = toml::from_str(&raw)?;
        config.into_ctx()
    }
}

impl Config {
    fn into_ctx(self) -> Result<Ctx, ConfigError> {
        let network = self.network.unwrap_or_default();

        match stellar_strkey::Strkey::from_string(&self.contract_id) {
            Ok(stellar_strkey::Strkey::Contract(_)) => {}
            _ => return Err(ConfigError::InvalidContractId(self.contract_id)),
        }

        let soroban_rpc_url = match self.soroban_rpc_url {
            Some(url) => url,
            None => parse_default_url(network.default_soroban_rpc_url())?,
        };
        let horizon_url = match self.horizon_url {
            Some(url) => url,
            None => parse_default_url(network.default_horizon_url())?,
        };

        Ok(Ctx {
            contract_id: self.contract_id,
            soroban_rpc_url,
            horizon_url,
            network_passphrase: self
                .network_passphrase
                .unwrap_or_else(|| network.default_passphrase().to_string()),
            log_level: self.log_level.unwrap_or_default(),
        })
    }
}

fn parse_default_url(url: &str) -> Result<Url, ConfigError> {
    url.parse()
        .map_err(|_| ConfigError::InvalidUrl(url.to_string()))
}
