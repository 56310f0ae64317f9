// This is required because a diesel macro makes clippy sad
#![allow(clippy::extra_unused_lifetimes)]

use crate::{schema::multisig_wallets, utils::util::standardize_address};
use chrono::NaiveDateTime;
use field_count::FieldCount;
use serde::{Deserialize, Serialize};

/// A multisig wallet under management. Registration happens outside the sync engine, which
/// only ever rewrites the on-chain fields and `last_synced_at`.
#[derive(
    Clone, Debug, Deserialize, FieldCount, Identifiable, PartialEq, Queryable, Selectable, Serialize,
)]
#[diesel(primary_key(id))]
#[diesel(table_name = multisig_wallets)]
pub struct MultisigWallet {
    pub id: i64,
    pub address: String,
    pub chain_id: i64,
    pub label: String,
    pub threshold: i32,
    pub nonce: i64,
    pub owner_addresses: Vec<String>,
    pub is_active: bool,
    pub last_synced_at: Option<NaiveDateTime>,
}

impl MultisigWallet {
    pub fn has_address(&self, address: &str) -> bool {
        standardize_address(&self.address) == standardize_address(address)
    }
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = multisig_wallets)]
pub struct NewMultisigWallet {
    pub address: String,
    pub chain_id: i64,
    pub label: String,
    pub threshold: i32,
    pub nonce: i64,
    pub owner_addresses: Vec<String>,
    pub is_active: bool,
}

impl NewMultisigWallet {
    pub fn new(address: &str, chain_id: i64, label: &str) -> Self {
        Self {
            address: address.to_string(),
            chain_id,
            label: label.to_string(),
            threshold: 1,
            nonce: 0,
            owner_addresses: vec![],
            is_active: true,
        }
    }
}

/// Snapshot of the on-chain fields written wholesale by a signer sync.
#[derive(AsChangeset, Clone, Debug, PartialEq)]
#[diesel(table_name = multisig_wallets)]
pub struct WalletChainState {
    pub threshold: i32,
    pub nonce: i64,
    pub owner_addresses: Vec<String>,
    pub last_synced_at: NaiveDateTime,
}
