// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

pub mod memory;
pub mod postgres;

use crate::{
    errors::SyncResult,
    models::{
        multisig_signer_models::multisig_signer::{MultisigSigner, NewMultisigSigner},
        multisig_transaction_models::multisig_transaction::MultisigTransaction,
        multisig_wallet_models::multisig_wallet::{MultisigWallet, WalletChainState},
    },
};
use async_trait::async_trait;
use chrono::NaiveDateTime;

pub use memory::InMemorySyncStore;
pub use postgres::PostgresSyncStore;

/// Persistence the sync engine relies on. Every write is keyed by a unique key and must be
/// visible to the next read.
#[async_trait]
pub trait SyncStore: Send + Sync {
    async fn active_wallets(&self) -> SyncResult<Vec<MultisigWallet>>;

    async fn signers_for_wallet(&self, wallet_id: i64) -> SyncResult<Vec<MultisigSigner>>;

    async fn insert_signers(&self, signers: Vec<NewMultisigSigner>) -> SyncResult<()>;

    async fn delete_signers(&self, wallet_id: i64, signer_ids: Vec<i64>) -> SyncResult<()>;

    /// Overwrites threshold, nonce, owners and `last_synced_at` in one write.
    async fn update_wallet_chain_state(
        &self,
        wallet_id: i64,
        state: WalletChainState,
    ) -> SyncResult<()>;

    async fn mark_wallet_synced(&self, wallet_id: i64, synced_at: NaiveDateTime)
        -> SyncResult<()>;

    /// Inserts unseen `(wallet_id, safe_tx_hash)` keys and fully overwrites existing ones.
    /// Returns the number of records written.
    async fn upsert_transactions(&self, transactions: Vec<MultisigTransaction>)
        -> SyncResult<usize>;

    async fn transactions_for_wallet(&self, wallet_id: i64)
        -> SyncResult<Vec<MultisigTransaction>>;
}
