//! Indexer configuration.

use serde::{Deserialize, Serialize};

use densindex_core::AssetClass;

/// Configuration for an indexer instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Chain-sync WebSocket endpoint, e.g. "ws://localhost:1337"
    pub node_url: String,
    /// Registry database path (plain file path or sqlite URL)
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// The protocol NFT identifying the registry instance to track
    /// (`"<currency hex>.<token hex>"` text form)
    pub protocol_nft: AssetClass,
    /// How many recent points seed intersection finding after (re)connect
    #[serde(default = "default_recent_points")]
    pub recent_points: u32,
    /// Initial reconnect backoff in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// Maximum reconnect backoff in milliseconds
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_db_path() -> String {
    "./dens.db".into()
}
fn default_recent_points() -> u32 {
    10
}
fn default_backoff_ms() -> u64 {
    500
}
fn default_backoff_max_ms() -> u64 {
    60_000
}

impl IndexerConfig {
    /// A config with defaults for everything but the endpoint and NFT.
    pub fn new(node_url: impl Into<String>, protocol_nft: AssetClass) -> Self {
        Self {
            node_url: node_url.into(),
            db_path: default_db_path(),
            protocol_nft,
            recent_points: default_recent_points(),
            backoff_ms: default_backoff_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in() {
        let json = format!(
            "{{\"node_url\": \"ws://localhost:1337\", \"protocol_nft\": \"{}.{}\"}}",
            hex::encode([1u8; 28]),
            hex::encode(b"dens")
        );
        let config: IndexerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.recent_points, 10);
        assert_eq!(config.backoff_ms, 500);
        assert_eq!(config.db_path, "./dens.db");
        assert_eq!(config.protocol_nft.token_name, b"dens");
    }
}
