// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Static registry of the networks the sync engine knows how to reach.

use crate::errors::{SyncError, SyncResult};
use ahash::AHashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChainEntry {
    chain_id: i64,
    name: &'static str,
    index_service_base_url: &'static str,
    explorer_base_url: &'static str,
    native_token_symbol: &'static str,
    native_token_decimals: u32,
}

const CHAINS: &[ChainEntry] = &[
    ChainEntry {
        chain_id: 1,
        name: "Ethereum",
        index_service_base_url: "https://safe-transaction-mainnet.safe.global",
        explorer_base_url: "https://etherscan.io",
        native_token_symbol: "ETH",
        native_token_decimals: 18,
    },
    ChainEntry {
        chain_id: 10,
        name: "Optimism",
        index_service_base_url: "https://safe-transaction-optimism.safe.global",
        explorer_base_url: "https://optimistic.etherscan.io",
        native_token_symbol: "ETH",
        native_token_decimals: 18,
    },
    ChainEntry {
        chain_id: 56,
        name: "BNB Smart Chain",
        index_service_base_url: "https://safe-transaction-bsc.safe.global",
        explorer_base_url: "https://bscscan.com",
        native_token_symbol: "BNB",
        native_token_decimals: 18,
    },
    ChainEntry {
        chain_id: 100,
        name: "Gnosis",
        index_service_base_url: "https://safe-transaction-gnosis-chain.safe.global",
        explorer_base_url: "https://gnosisscan.io",
        native_token_symbol: "xDAI",
        native_token_decimals: 18,
    },
    ChainEntry {
        chain_id: 137,
        name: "Polygon",
        index_service_base_url: "https://safe-transaction-polygon.safe.global",
        explorer_base_url: "https://polygonscan.com",
        native_token_symbol: "POL",
        native_token_decimals: 18,
    },
    ChainEntry {
        chain_id: 8453,
        name: "Base",
        index_service_base_url: "https://safe-transaction-base.safe.global",
        explorer_base_url: "https://basescan.org",
        native_token_symbol: "ETH",
        native_token_decimals: 18,
    },
    ChainEntry {
        chain_id: 42161,
        name: "Arbitrum One",
        index_service_base_url: "https://safe-transaction-arbitrum.safe.global",
        explorer_base_url: "https://arbiscan.io",
        native_token_symbol: "ETH",
        native_token_decimals: 18,
    },
    ChainEntry {
        chain_id: 43114,
        name: "Avalanche C-Chain",
        index_service_base_url: "https://safe-transaction-avalanche.safe.global",
        explorer_base_url: "https://snowtrace.io",
        native_token_symbol: "AVAX",
        native_token_decimals: 18,
    },
    ChainEntry {
        chain_id: 11155111,
        name: "Sepolia",
        index_service_base_url: "https://safe-transaction-sepolia.safe.global",
        explorer_base_url: "https://sepolia.etherscan.io",
        native_token_symbol: "ETH",
        native_token_decimals: 18,
    },
];

/// Everything a component needs to talk about one chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainInfo {
    pub chain_id: i64,
    pub chain_name: String,
    pub index_service_base_url: String,
    pub explorer_base_url: String,
    pub native_token_symbol: String,
    pub native_token_decimals: u32,
}

impl From<&ChainEntry> for ChainInfo {
    fn from(entry: &ChainEntry) -> Self {
        Self {
            chain_id: entry.chain_id,
            chain_name: entry.name.to_string(),
            index_service_base_url: entry.index_service_base_url.to_string(),
            explorer_base_url: entry.explorer_base_url.to_string(),
            native_token_symbol: entry.native_token_symbol.to_string(),
            native_token_decimals: entry.native_token_decimals,
        }
    }
}

/// Lookup over the built-in chain table. Base URL overrides only replace the transaction
/// service endpoint of chains already in the table.
#[derive(Clone, Debug, Default)]
pub struct ChainRegistry {
    index_service_overrides: AHashMap<i64, String>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: AHashMap<i64, String>) -> Self {
        let index_service_overrides = overrides
            .into_iter()
            .map(|(chain_id, url)| (chain_id, url.trim_end_matches('/').to_string()))
            .collect();
        Self {
            index_service_overrides,
        }
    }

    pub fn resolve(&self, chain_id: i64) -> SyncResult<ChainInfo> {
        let entry = CHAINS
            .iter()
            .find(|c| c.chain_id == chain_id)
            .ok_or(SyncError::UnsupportedChain(chain_id))?;
        let mut info = ChainInfo::from(entry);
        if let Some(url) = self.index_service_overrides.get(&chain_id) {
            info.index_service_base_url = url.clone();
        }
        Ok(info)
    }

    pub fn explorer_tx_url(&self, chain_id: i64, tx_hash: &str) -> SyncResult<String> {
        let info = self.resolve(chain_id)?;
        Ok(format!("{}/tx/{}", info.explorer_base_url, tx_hash))
    }

    pub fn explorer_address_url(&self, chain_id: i64, address: &str) -> SyncResult<String> {
        let info = self.resolve(chain_id)?;
        Ok(format!("{}/address/{}", info.explorer_base_url, address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_chains() {
        let registry = ChainRegistry::new();
        let mainnet = registry.resolve(1).unwrap();
        assert_eq!(mainnet.chain_name, "Ethereum");
        assert_eq!(mainnet.native_token_symbol, "ETH");
        assert_eq!(mainnet.native_token_decimals, 18);
        assert_eq!(
            mainnet.index_service_base_url,
            "https://safe-transaction-mainnet.safe.global"
        );

        let gnosis = registry.resolve(100).unwrap();
        assert_eq!(gnosis.native_token_symbol, "xDAI");
    }

    #[test]
    fn unknown_chain_is_unsupported() {
        let registry = ChainRegistry::new();
        match registry.resolve(999_999) {
            Err(SyncError::UnsupportedChain(id)) => assert_eq!(id, 999_999),
            other => panic!("expected UnsupportedChain, got {:?}", other),
        }
        assert!(matches!(
            registry.explorer_tx_url(999_999, "0xabc"),
            Err(SyncError::UnsupportedChain(_))
        ));
    }

    #[test]
    fn builds_explorer_links() {
        let registry = ChainRegistry::new();
        assert_eq!(
            registry.explorer_tx_url(137, "0xdeadbeef").unwrap(),
            "https://polygonscan.com/tx/0xdeadbeef"
        );
        assert_eq!(
            registry.explorer_address_url(42161, "0xAbC").unwrap(),
            "https://arbiscan.io/address/0xAbC"
        );
    }

    #[test]
    fn overrides_replace_only_the_service_url() {
        let mut overrides = AHashMap::new();
        overrides.insert(1, "http://localhost:8000/".to_string());
        overrides.insert(424242, "http://localhost:9000".to_string());
        let registry = ChainRegistry::with_overrides(overrides);

        let mainnet = registry.resolve(1).unwrap();
        assert_eq!(mainnet.index_service_base_url, "http://localhost:8000");
        assert_eq!(mainnet.explorer_base_url, "https://etherscan.io");
        assert!(registry.resolve(424242).is_err());
    }
}
