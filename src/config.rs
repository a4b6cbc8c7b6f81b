//! Configuration management for the Arc agent tools
//!
//! Settings come from built-in defaults, an optional TOML file named by
//! `ARC_AGENT_CONFIG` (with `${VAR}` substitution), and finally the
//! environment. Secrets are only ever read from the environment.

use crate::error::{AgentError, AgentResult};
use crate::wallet::{parse_address, KeyMaterial};

use ethers::types::{Address, Bytes, U256};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Public Arc testnet endpoint used when `ARC_RPC` is not set
pub const DEFAULT_RPC_URL: &str = "https://rpc.testnet.arc.network";

/// Fixed gas limit for every transaction the sender builds
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

pub const CONFIG_PATH_ENV: &str = "ARC_AGENT_CONFIG";
pub const RPC_URL_ENV: &str = "ARC_RPC";
pub const PRIVATE_KEY_ENV: &str = "AGENT_PRIVATE_KEY";
pub const DESTINATION_ENV: &str = "ESCROW_ADDRESS";

lazy_static! {
    static ref ENV_PLACEHOLDER: Regex =
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid");
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub rpc: RpcConfig,
    pub sender: SenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpcConfig {
    pub url: String,
    /// Delay between `eth_getTransactionReceipt` polls
    pub poll_interval_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RPC_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SenderConfig {
    pub gas_limit: u64,
    /// Decimal amount in the smallest native unit
    pub value: String,
    /// Hex-encoded call data, empty for a plain transfer
    pub data: String,
    /// Upper bound on the receipt wait. `None` waits forever.
    pub receipt_timeout_secs: Option<u64>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            value: "0".to_string(),
            data: String::new(),
            receipt_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Load settings from the process environment
    pub fn load() -> AgentResult<Self> {
        Self::load_with(|name| env::var(name).ok())
    }

    /// Load settings resolving every variable through `lookup`
    pub fn load_with<F>(lookup: F) -> AgentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match non_empty(lookup(CONFIG_PATH_ENV)) {
            Some(path) => Self::from_file(Path::new(&path), &lookup)?,
            None => Settings::default(),
        };

        if let Some(url) = non_empty(lookup(RPC_URL_ENV)) {
            settings.rpc.url = url;
        }

        settings.validate()?;
        Ok(settings)
    }

    fn from_file<F>(path: &Path, lookup: &F) -> AgentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let substituted = substitute_env_vars(&raw, lookup);

        toml::from_str(&substituted).map_err(|e| {
            AgentError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Validate configuration
    fn validate(&self) -> AgentResult<()> {
        if self.rpc.url.trim().is_empty() {
            return Err(AgentError::Config("RPC URL must not be empty".to_string()));
        }
        if self.rpc.poll_interval_ms == 0 {
            return Err(AgentError::Config(
                "rpc.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.sender.gas_limit == 0 {
            return Err(AgentError::Config(
                "sender.gas_limit must be greater than zero".to_string(),
            ));
        }
        if self.sender.receipt_timeout_secs == Some(0) {
            return Err(AgentError::Config(
                "sender.receipt_timeout_secs must be greater than zero".to_string(),
            ));
        }

        self.value()?;
        self.call_data()?;
        Ok(())
    }

    /// Amount transferred with the transaction
    pub fn value(&self) -> AgentResult<U256> {
        U256::from_dec_str(self.sender.value.trim()).map_err(|e| {
            AgentError::Config(format!("Invalid sender.value {:?}: {}", self.sender.value, e))
        })
    }

    /// Call data attached to the transaction
    pub fn call_data(&self) -> AgentResult<Bytes> {
        let data = self.sender.data.trim();
        let data = data.strip_prefix("0x").unwrap_or(data);
        hex::decode(data).map(Bytes::from).map_err(|e| {
            AgentError::Config(format!("Invalid sender.data {:?}: {}", self.sender.data, e))
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.rpc.poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Option<Duration> {
        self.sender.receipt_timeout_secs.map(Duration::from_secs)
    }
}

/// Sender-only configuration read straight from the environment
#[derive(Debug)]
pub struct SenderCredentials {
    pub key: KeyMaterial,
    pub destination: Address,
}

impl SenderCredentials {
    pub fn from_env() -> AgentResult<Self> {
        Self::load_with(|name| env::var(name).ok())
    }

    pub fn load_with<F>(lookup: F) -> AgentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = signing_key_with(&lookup)?;

        let destination = non_empty(lookup(DESTINATION_ENV))
            .ok_or_else(|| AgentError::Config(format!("{} is not set", DESTINATION_ENV)))?;
        let destination = parse_address(&destination)?;

        Ok(Self { key, destination })
    }
}

/// Signing key alone, for the preflight report which needs no destination
pub fn signing_key_from_env() -> AgentResult<KeyMaterial> {
    signing_key_with(&|name: &str| env::var(name).ok())
}

pub fn signing_key_with<F>(lookup: &F) -> AgentResult<KeyMaterial>
where
    F: Fn(&str) -> Option<String>,
{
    let key = non_empty(lookup(PRIVATE_KEY_ENV))
        .ok_or_else(|| AgentError::Config(format!("{} is not set", PRIVATE_KEY_ENV)))?;
    KeyMaterial::from_hex(&key)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars<F>(input: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_PLACEHOLDER
        .replace_all(input, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const KEY_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let settings = Settings::load_with(lookup(&[])).unwrap();
        assert_eq!(settings.rpc.url, DEFAULT_RPC_URL);
        assert_eq!(settings.sender.gas_limit, 200_000);
        assert_eq!(settings.value().unwrap(), U256::zero());
        assert!(settings.call_data().unwrap().is_empty());
        assert!(settings.receipt_timeout().is_none());
    }

    #[test]
    fn test_rpc_url_from_environment() {
        let settings =
            Settings::load_with(lookup(&[(RPC_URL_ENV, "http://localhost:8545")])).unwrap();
        assert_eq!(settings.rpc.url, "http://localhost:8545");

        let settings = Settings::load_with(lookup(&[(RPC_URL_ENV, "  ")])).unwrap();
        assert_eq!(settings.rpc.url, DEFAULT_RPC_URL);
    }

    #[test]
    fn test_config_file_with_substitution() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[rpc]
url = "https://${{RPC_HOST}}/rpc"
poll_interval_ms = 250

[sender]
gas_limit = 90000
value = "1000"
data = "0xa9059cbb"
receipt_timeout_secs = 30
"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let settings = Settings::load_with(lookup(&[
            (CONFIG_PATH_ENV, path.as_str()),
            ("RPC_HOST", "node.example"),
        ]))
        .unwrap();

        assert_eq!(settings.rpc.url, "https://node.example/rpc");
        assert_eq!(settings.poll_interval(), Duration::from_millis(250));
        assert_eq!(settings.sender.gas_limit, 90_000);
        assert_eq!(settings.value().unwrap(), U256::from(1000));
        assert_eq!(
            settings.call_data().unwrap(),
            Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb])
        );
        assert_eq!(settings.receipt_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rpc]\nurl = \"https://from-file\"").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let settings = Settings::load_with(lookup(&[
            (CONFIG_PATH_ENV, path.as_str()),
            (RPC_URL_ENV, "https://from-env"),
        ]))
        .unwrap();

        assert_eq!(settings.rpc.url, "https://from-env");
    }

    #[test]
    fn test_missing_config_file_is_fatal() {
        let err = Settings::load_with(lookup(&[(CONFIG_PATH_ENV, "/nonexistent/arc.toml")]))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sender]\ngas_limit = 0").unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert!(Settings::load_with(lookup(&[(CONFIG_PATH_ENV, path.as_str())])).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sender]\ndata = \"0xzz\"").unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert!(Settings::load_with(lookup(&[(CONFIG_PATH_ENV, path.as_str())])).is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        let vars = lookup(&[("TEST_VAR", "test_value")]);
        let input = "url = \"https://api.example.com/${TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input, &vars);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");

        let result = substitute_env_vars("x = \"${UNSET_VAR}\"", &vars);
        assert_eq!(result, "x = \"\"");
    }

    #[test]
    fn test_credentials_require_private_key() {
        let err = SenderCredentials::load_with(lookup(&[(
            DESTINATION_ENV,
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
        )]))
        .unwrap_err();
        assert!(matches!(err, AgentError::Config(ref m) if m.contains(PRIVATE_KEY_ENV)));
    }

    #[test]
    fn test_credentials_require_valid_destination() {
        let err = SenderCredentials::load_with(lookup(&[(PRIVATE_KEY_ENV, KEY)])).unwrap_err();
        assert!(matches!(err, AgentError::Config(ref m) if m.contains(DESTINATION_ENV)));

        let err = SenderCredentials::load_with(lookup(&[
            (PRIVATE_KEY_ENV, KEY),
            (DESTINATION_ENV, "0x1234"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AgentError::InvalidAddress { .. }));
    }

    #[test]
    fn test_credentials_loaded() {
        let creds = SenderCredentials::load_with(lookup(&[
            (PRIVATE_KEY_ENV, KEY),
            (DESTINATION_ENV, "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"),
        ]))
        .unwrap();

        assert_eq!(creds.key.address(), KEY_ADDRESS.parse::<Address>().unwrap());
        assert_eq!(
            crate::wallet::checksum(&creds.destination),
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
        );
    }

    #[test]
    fn test_signing_key_does_not_need_destination() {
        let key = signing_key_with(&lookup(&[(PRIVATE_KEY_ENV, KEY)])).unwrap();
        assert_eq!(key.address(), KEY_ADDRESS.parse::<Address>().unwrap());

        let err = signing_key_with(&lookup(&[(PRIVATE_KEY_ENV, " ")])).unwrap_err();
        assert!(matches!(err, AgentError::Config(ref m) if m.contains(PRIVATE_KEY_ENV)));
    }
}
