// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Process-local [`SyncStore`] with the same uniqueness rules as the Postgres schema. Used by
//! tests and local dry runs.

use super::SyncStore;
use crate::{
    errors::{SyncError, SyncResult},
    models::{
        multisig_signer_models::multisig_signer::{MultisigSigner, NewMultisigSigner},
        multisig_transaction_models::multisig_transaction::MultisigTransaction,
        multisig_wallet_models::multisig_wallet::{
            MultisigWallet, NewMultisigWallet, WalletChainState,
        },
    },
    utils::util::standardize_address,
};
use ahash::AHashSet;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    wallets: BTreeMap<i64, MultisigWallet>,
    signers: BTreeMap<i64, MultisigSigner>,
    transactions: BTreeMap<(i64, String), MultisigTransaction>,
    next_wallet_id: i64,
    next_signer_id: i64,
    failing_wallets: AHashSet<i64>,
}

impl MemoryState {
    fn check_writable(&self, wallet_id: i64) -> SyncResult<()> {
        if self.failing_wallets.contains(&wallet_id) {
            return Err(SyncError::PersistenceFailure(format!(
                "writes for wallet {} are failing",
                wallet_id
            )));
        }
        Ok(())
    }

    fn wallet_mut(&mut self, wallet_id: i64) -> SyncResult<&mut MultisigWallet> {
        self.wallets.get_mut(&wallet_id).ok_or_else(|| {
            SyncError::PersistenceFailure(format!("wallet {} does not exist", wallet_id))
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemorySyncStore {
    state: Mutex<MemoryState>,
}

impl InMemorySyncStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wallet. `(address, chain_id)` is unique, compared case-insensitively.
    pub async fn add_wallet(&self, wallet: NewMultisigWallet) -> SyncResult<MultisigWallet> {
        let mut state = self.state.lock().await;
        let duplicate = state.wallets.values().any(|w| {
            w.chain_id == wallet.chain_id
                && standardize_address(&w.address) == standardize_address(&wallet.address)
        });
        if duplicate {
            return Err(SyncError::PersistenceFailure(format!(
                "wallet {} on chain {} already exists",
                wallet.address, wallet.chain_id
            )));
        }
        state.next_wallet_id += 1;
        let stored = MultisigWallet {
            id: state.next_wallet_id,
            address: wallet.address,
            chain_id: wallet.chain_id,
            label: wallet.label,
            threshold: wallet.threshold,
            nonce: wallet.nonce,
            owner_addresses: wallet.owner_addresses,
            is_active: wallet.is_active,
            last_synced_at: None,
        };
        state.wallets.insert(stored.id, stored.clone());
        Ok(stored)
    }

    pub async fn wallet(&self, wallet_id: i64) -> Option<MultisigWallet> {
        self.state.lock().await.wallets.get(&wallet_id).cloned()
    }

    pub async fn set_wallet_active(&self, wallet_id: i64, is_active: bool) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        state.wallet_mut(wallet_id)?.is_active = is_active;
        Ok(())
    }

    /// Administrative identity link of an existing signer row.
    pub async fn link_signer(
        &self,
        wallet_id: i64,
        signer_address: &str,
        user_id: &str,
    ) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        let address = standardize_address(signer_address);
        let signer = state
            .signers
            .values_mut()
            .find(|s| s.wallet_id == wallet_id && standardize_address(&s.signer_address) == address)
            .ok_or_else(|| {
                SyncError::PersistenceFailure(format!(
                    "signer {} of wallet {} does not exist",
                    signer_address, wallet_id
                ))
            })?;
        signer.linked_user_id = Some(user_id.to_string());
        Ok(())
    }

    /// Makes every subsequent write for `wallet_id` fail with `PersistenceFailure`.
    pub async fn fail_writes_for_wallet(&self, wallet_id: i64) {
        self.state.lock().await.failing_wallets.insert(wallet_id);
    }
}

#[async_trait]
impl SyncStore for InMemorySyncStore {
    async fn active_wallets(&self) -> SyncResult<Vec<MultisigWallet>> {
        let state = self.state.lock().await;
        Ok(state
            .wallets
            .values()
            .filter(|w| w.is_active)
            .cloned()
            .collect())
    }

    async fn signers_for_wallet(&self, wallet_id: i64) -> SyncResult<Vec<MultisigSigner>> {
        let state = self.state.lock().await;
        Ok(state
            .signers
            .values()
            .filter(|s| s.wallet_id == wallet_id)
            .cloned()
            .collect())
    }

    async fn insert_signers(&self, signers: Vec<NewMultisigSigner>) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        for signer in signers {
            state.check_writable(signer.wallet_id)?;
            let address = standardize_address(&signer.signer_address);
            let exists = state.signers.values().any(|s| {
                s.wallet_id == signer.wallet_id && standardize_address(&s.signer_address) == address
            });
            if exists {
                continue;
            }
            state.next_signer_id += 1;
            let id = state.next_signer_id;
            state.signers.insert(id, MultisigSigner {
                id,
                wallet_id: signer.wallet_id,
                signer_address: signer.signer_address,
                linked_user_id: None,
                created_at: signer.created_at,
            });
        }
        Ok(())
    }

    async fn delete_signers(&self, wallet_id: i64, signer_ids: Vec<i64>) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        state.check_writable(wallet_id)?;
        state
            .signers
            .retain(|id, s| !(s.wallet_id == wallet_id && signer_ids.contains(id)));
        Ok(())
    }

    async fn update_wallet_chain_state(
        &self,
        wallet_id: i64,
        chain_state: WalletChainState,
    ) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        state.check_writable(wallet_id)?;
        let wallet = state.wallet_mut(wallet_id)?;
        wallet.threshold = chain_state.threshold;
        wallet.nonce = chain_state.nonce;
        wallet.owner_addresses = chain_state.owner_addresses;
        wallet.last_synced_at = Some(chain_state.last_synced_at);
        Ok(())
    }

    async fn mark_wallet_synced(&self, wallet_id: i64, synced_at: NaiveDateTime) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        state.check_writable(wallet_id)?;
        state.wallet_mut(wallet_id)?.last_synced_at = Some(synced_at);
        Ok(())
    }

    async fn upsert_transactions(
        &self,
        transactions: Vec<MultisigTransaction>,
    ) -> SyncResult<usize> {
        let mut state = self.state.lock().await;
        for tx in &transactions {
            state.check_writable(tx.wallet_id)?;
        }
        let written = transactions.len();
        for tx in transactions {
            state
                .transactions
                .insert((tx.wallet_id, tx.safe_tx_hash.clone()), tx);
        }
        Ok(written)
    }

    async fn transactions_for_wallet(&self, wallet_id: i64) -> SyncResult<Vec<MultisigTransaction>> {
        let state = self.state.lock().await;
        let mut transactions: Vec<MultisigTransaction> = state
            .transactions
            .values()
            .filter(|t| t.wallet_id == wallet_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| a.safe_tx_hash.cmp(&b.safe_tx_hash))
        });
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn wallet_address_is_unique_per_chain() {
        let store = InMemorySyncStore::new();
        store
            .add_wallet(NewMultisigWallet::new("0xAbC", 1, "Ops"))
            .await
            .unwrap();
        assert!(store
            .add_wallet(NewMultisigWallet::new("0xabc", 1, "Ops again"))
            .await
            .is_err());
        assert!(store
            .add_wallet(NewMultisigWallet::new("0xabc", 137, "Ops on Polygon"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn signer_rows_are_unique_per_wallet() {
        let store = InMemorySyncStore::new();
        let wallet = store
            .add_wallet(NewMultisigWallet::new("0xAbC", 1, "Ops"))
            .await
            .unwrap();
        let now = Utc::now().naive_utc();
        let new_signer = |address: &str| NewMultisigSigner {
            wallet_id: wallet.id,
            signer_address: address.to_string(),
            created_at: now,
        };
        store
            .insert_signers(vec![new_signer("0xAA"), new_signer("0xaa"), new_signer("0xBB")])
            .await
            .unwrap();
        assert_eq!(store.signers_for_wallet(wallet.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn inactive_wallets_are_not_listed() {
        let store = InMemorySyncStore::new();
        let wallet = store
            .add_wallet(NewMultisigWallet::new("0xAbC", 1, "Ops"))
            .await
            .unwrap();
        store.set_wallet_active(wallet.id, false).await.unwrap();
        assert!(store.active_wallets().await.unwrap().is_empty());
    }
}
