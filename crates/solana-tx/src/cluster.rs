//! Per-cluster parameters.
//!
//! The system program id and the packet ceiling are carried here instead of
//! being baked into the builders, so one process can target several
//! clusters at once. Endpoints are not used by this crate; they travel with
//! the config for the RPC layer that sends the finished bytes.

use serde::{Deserialize, Serialize};

use crate::error::{TxError, TxResult};
use crate::pubkey::Pubkey;

/// Largest wire transaction the network accepts, in bytes.
pub const PACKET_DATA_SIZE: usize = 1232;

/// The System Program id: 32 zero bytes, `11111111111111111111111111111111`.
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

/// Smallest ceiling that still fits a one-signature transaction with an
/// empty message: `1 + 64 + (3 + 1 + 32 + 32 + 1)`.
pub const MIN_PACKET_SIZE: usize = 134;

/// Definition of a cluster the transactions are built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub name: String,
    pub http_endpoint: String,
    pub ws_endpoint: String,
    #[serde(default = "default_system_program_id")]
    pub system_program_id: Pubkey,
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,
}

fn default_system_program_id() -> Pubkey {
    SYSTEM_PROGRAM_ID
}

fn default_max_packet_size() -> usize {
    PACKET_DATA_SIZE
}

impl ClusterConfig {
    fn preset(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            http_endpoint: format!("https://{host}"),
            ws_endpoint: format!("wss://{host}"),
            system_program_id: SYSTEM_PROGRAM_ID,
            max_packet_size: PACKET_DATA_SIZE,
        }
    }

    pub fn mainnet_beta() -> Self {
        Self::preset("mainnet-beta", "api.mainnet-beta.solana.com")
    }

    pub fn testnet() -> Self {
        Self::preset("testnet", "api.testnet.solana.com")
    }

    pub fn devnet() -> Self {
        Self::preset("devnet", "api.devnet.solana.com")
    }

    /// Look up a preset by its name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "mainnet-beta" | "mainnet" => Some(Self::mainnet_beta()),
            "testnet" => Some(Self::testnet()),
            "devnet" => Some(Self::devnet()),
            _ => None,
        }
    }

    /// Parse and validate a JSON cluster definition.
    ///
    /// `system_program_id` and `max_packet_size` may be omitted.
    pub fn from_json(json: &str) -> TxResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TxError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TxResult<()> {
        if self.name.is_empty() {
            return Err(TxError::InvalidConfig("cluster name is empty".into()));
        }
        if self.max_packet_size < MIN_PACKET_SIZE {
            return Err(TxError::InvalidConfig(format!(
                "max_packet_size {} is below the minimum of {MIN_PACKET_SIZE}",
                self.max_packet_size
            )));
        }
        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self::mainnet_beta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_mainnet_beta() {
        let config = ClusterConfig::default();
        assert_eq!(config.name, "mainnet-beta");
        assert_eq!(config.http_endpoint, "https://api.mainnet-beta.solana.com");
        assert_eq!(config.ws_endpoint, "wss://api.mainnet-beta.solana.com");
        assert_eq!(config.max_packet_size, 1232);
        assert_eq!(
            config.system_program_id.to_string(),
            "11111111111111111111111111111111"
        );
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(
            ClusterConfig::by_name("devnet").unwrap().http_endpoint,
            "https://api.devnet.solana.com"
        );
        assert_eq!(
            ClusterConfig::by_name("testnet").unwrap().ws_endpoint,
            "wss://api.testnet.solana.com"
        );
        assert!(ClusterConfig::by_name("localnet").is_none());
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = ClusterConfig::from_json(
            r#"{"name":"local","http_endpoint":"http://127.0.0.1:8899","ws_endpoint":"ws://127.0.0.1:8900"}"#,
        )
        .unwrap();
        assert_eq!(config.max_packet_size, PACKET_DATA_SIZE);
        assert_eq!(config.system_program_id, SYSTEM_PROGRAM_ID);
    }

    #[test]
    fn from_json_overrides() {
        let config = ClusterConfig::from_json(
            r#"{
                "name": "custom",
                "http_endpoint": "http://localhost:8899",
                "ws_endpoint": "ws://localhost:8900",
                "system_program_id": "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr",
                "max_packet_size": 600
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_packet_size, 600);
        assert_eq!(
            config.system_program_id.to_string(),
            "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr"
        );
    }

    #[test]
    fn from_json_rejects_tiny_packet_size() {
        let err = ClusterConfig::from_json(
            r#"{"name":"x","http_endpoint":"","ws_endpoint":"","max_packet_size":64}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TxError::InvalidConfig(_)));
    }

    #[test]
    fn from_json_rejects_bad_program_id() {
        let err = ClusterConfig::from_json(
            r#"{"name":"x","http_endpoint":"","ws_endpoint":"","system_program_id":"abc"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TxError::InvalidConfig(_)));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(ClusterConfig::from_json("not json").is_err());
    }
}
