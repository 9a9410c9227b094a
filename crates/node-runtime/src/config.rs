//! Node configuration.

use md_01_peer_network::NetworkConfig;
use rand::RngCore;
use shared_types::Height;

/// Top-level node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Number of active forging delegates per round. Required.
    pub active_delegates: usize,
    /// Initial finalized height when no persisted value exists.
    pub finalized_height: Height,
    /// Peer network configuration.
    pub network: NetworkConfig,
}

impl NodeConfig {
    /// Build configuration from `MERIDIAN_*` environment variables.
    ///
    /// `MERIDIAN_ACTIVE_DELEGATES` is required; the placement secret is
    /// read from `MERIDIAN_NETWORK_SECRET` (64 hex chars) or generated
    /// fresh when absent.
    pub fn from_env() -> anyhow::Result<Self> {
        let active_delegates: usize = std::env::var("MERIDIAN_ACTIVE_DELEGATES")
            .map_err(|_| anyhow::anyhow!("MERIDIAN_ACTIVE_DELEGATES is required"))?
            .parse()
            .map_err(|_| anyhow::anyhow!("MERIDIAN_ACTIVE_DELEGATES must be a positive integer"))?;
        if active_delegates == 0 {
            anyhow::bail!("MERIDIAN_ACTIVE_DELEGATES must be positive");
        }

        let finalized_height: Height = std::env::var("MERIDIAN_FINALIZED_HEIGHT")
            .ok()
            .map(|raw| raw.parse())
            .transpose()
            .map_err(|_| anyhow::anyhow!("MERIDIAN_FINALIZED_HEIGHT must be an integer"))?
            .unwrap_or(0);

        let mut network = NetworkConfig {
            secret: read_or_generate_secret()?,
            ..Default::default()
        };
        if let Ok(nonce) = std::env::var("MERIDIAN_NODE_NONCE") {
            network.node_nonce = nonce;
        }

        Ok(Self {
            active_delegates,
            finalized_height,
            network,
        })
    }
}

fn read_or_generate_secret() -> anyhow::Result<[u8; 32]> {
    match std::env::var("MERIDIAN_NETWORK_SECRET") {
        Ok(hex) => parse_secret(&hex),
        Err(_) => {
            let mut secret = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut secret);
            Ok(secret)
        }
    }
}

fn parse_secret(hex: &str) -> anyhow::Result<[u8; 32]> {
    if hex.len() != 64 {
        anyhow::bail!("MERIDIAN_NETWORK_SECRET must be 64 hex characters");
    }
    let mut secret = [0u8; 32];
    for (index, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let byte = std::str::from_utf8(chunk)
            .ok()
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .ok_or_else(|| anyhow::anyhow!("MERIDIAN_NETWORK_SECRET is not valid hex"))?;
        secret[index] = byte;
    }
    Ok(secret)
}
