//! Command-line host configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! chain_id = 84532
//! testnet = true
//! owner_private_key = "$OWNER_PRIVATE_KEY"
//! bundler_url = "https://api.pimlico.io/v2/{chain_id}/rpc?apikey=${PIMLICO_API_KEY}"
//! permit_amount = 10000000
//! receipt_poll_interval_ms = 2000
//! receipt_poll_attempts = 60
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `gaspass.toml`)
//! - Any variable referenced by `$VAR` in the config file
//!
//! Command-line flags override file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::U256;
use alloy_signer_local::PrivateKeySigner;
use gaspass::chain::ChainId;
use gaspass::config::{AccountConfig, DEFAULT_CHAIN_ID};
use gaspass_evm::bundler::ReceiptPolling;
use gaspass_evm::permit::DEFAULT_PERMIT_AMOUNT;
use gaspass_evm::submitter::SubmitterSettings;
use serde::Deserialize;
use url::Url;

/// Configuration could not be loaded or is incomplete.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A required value is missing from both file and flags.
    #[error("missing `{0}`: set it in the config file or pass it as a flag")]
    Missing(&'static str),
    /// The owner key does not parse.
    #[error("invalid owner private key: {0}")]
    InvalidKey(#[from] alloy_signer_local::LocalSignerError),
    /// An endpoint URL does not parse.
    #[error("invalid `{field}`: {source}")]
    InvalidUrl {
        /// Offending field.
        field: &'static str,
        /// Parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Top-level host configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// Chain the smart account operates on (default: `1`).
    #[serde(default = "default_chain_id")]
    pub chain_id: ChainId,

    /// Whether `chain_id` is looked up in the testnet tables.
    #[serde(default)]
    pub testnet: bool,

    /// Owner key (hex, with or without `0x` prefix).
    #[serde(default)]
    pub owner_private_key: Option<String>,

    /// Bundler endpoint; `{chain_id}` is replaced with the active chain.
    #[serde(default)]
    pub bundler_url: Option<String>,

    /// Chain RPC endpoint overriding the built-in table.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// USDC base units each permit authorizes (default: 10 USDC).
    #[serde(default = "default_permit_amount")]
    pub permit_amount: u64,

    /// Delay between receipt polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// Receipt polls before giving up.
    #[serde(default = "default_poll_attempts")]
    pub receipt_poll_attempts: u32,
}

const fn default_chain_id() -> ChainId {
    DEFAULT_CHAIN_ID
}

fn default_permit_amount() -> u64 {
    DEFAULT_PERMIT_AMOUNT.to::<u64>()
}

const fn default_poll_interval_ms() -> u64 {
    2_000
}

const fn default_poll_attempts() -> u32 {
    60
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            testnet: false,
            owner_private_key: None,
            bundler_url: None,
            rpc_url: None,
            permit_amount: default_permit_amount(),
            receipt_poll_interval_ms: default_poll_interval_ms(),
            receipt_poll_attempts: default_poll_attempts(),
        }
    }
}

impl HostConfig {
    /// Loads configuration from a file path. A missing file yields the
    /// defaults; string values are expanded from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            String::new()
        };
        Self::parse(&content)
    }

    /// Parses TOML after environment expansion.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on invalid TOML.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(&expand_env_vars(content))?)
    }

    /// The account configuration to start from. No account is bound until
    /// the smart account address is known.
    #[must_use]
    pub fn account_config(&self) -> AccountConfig {
        AccountConfig::default()
            .with_chain_id(self.chain_id)
            .with_testnet(self.testnet)
    }

    /// Parses the owner key.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] or [`ConfigError::InvalidKey`].
    pub fn owner_signer(&self) -> Result<PrivateKeySigner, ConfigError> {
        let key = self
            .owner_private_key
            .as_deref()
            .ok_or(ConfigError::Missing("owner_private_key"))?;
        Ok(key.trim().parse()?)
    }

    /// The bundler URL template.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] when unset.
    pub fn bundler_url(&self) -> Result<&str, ConfigError> {
        self.bundler_url
            .as_deref()
            .ok_or(ConfigError::Missing("bundler_url"))
    }

    /// The RPC override, if any.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidUrl`] when set but malformed.
    pub fn rpc_url(&self) -> Result<Option<Url>, ConfigError> {
        self.rpc_url
            .as_deref()
            .map(|url| {
                url.parse().map_err(|source| ConfigError::InvalidUrl {
                    field: "rpc_url",
                    source,
                })
            })
            .transpose()
    }

    /// Submission settings.
    #[must_use]
    pub fn submitter_settings(&self) -> SubmitterSettings {
        SubmitterSettings {
            permit_amount: U256::from(self.permit_amount),
            polling: ReceiptPolling {
                interval: Duration::from_millis(self.receipt_poll_interval_ms),
                attempts: self.receipt_poll_attempts,
            },
        }
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();
        let mut var_name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        match std::env::var(&var_name) {
            Ok(val) if !var_name.is_empty() => result.push_str(&val),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = HostConfig::parse("").unwrap();
        assert_eq!(config.chain_id, 1);
        assert!(!config.testnet);
        assert_eq!(config.permit_amount, 10_000_000);
        assert_eq!(config.submitter_settings().polling, ReceiptPolling::default());
        assert!(matches!(config.owner_signer(), Err(ConfigError::Missing("owner_private_key"))));
        assert!(matches!(config.bundler_url(), Err(ConfigError::Missing("bundler_url"))));
    }

    #[test]
    fn test_expands_path_variable() {
        // PATH is set in every test environment.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env_vars("a=$PATH;"), format!("a={path};"));
        assert_eq!(expand_env_vars("${PATH}/x"), format!("{path}/x"));
    }

    #[test]
    fn test_unresolved_variables_left_as_is() {
        assert_eq!(
            expand_env_vars("${GASPASS_SURELY_UNSET_VAR}"),
            "${GASPASS_SURELY_UNSET_VAR}"
        );
        assert_eq!(expand_env_vars("cost: $5"), "cost: $5");
        assert_eq!(expand_env_vars("trailing $"), "trailing $");
    }

    #[test]
    fn test_bundler_template_kept_verbatim() {
        let config = HostConfig::parse(
            r#"
            chain_id = 84532
            testnet = true
            bundler_url = "https://bundler.example/{chain_id}/rpc"
            rpc_url = "https://sepolia.base.org"
            owner_private_key = "0x0000000000000000000000000000000000000000000000000000000000000001"
            "#,
        )
        .unwrap();
        assert_eq!(config.bundler_url().unwrap(), "https://bundler.example/{chain_id}/rpc");
        assert!(config.rpc_url().unwrap().is_some());
        assert!(config.owner_signer().is_ok());

        let account = config.account_config();
        assert_eq!(account.chain_id, 84532);
        assert!(account.is_testnet);
        assert!(!account.is_configured());
    }
}
