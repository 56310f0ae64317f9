// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use super::ProcessorName;
use crate::{
    errors::{SyncError, SyncResult},
    models::{
        multisig_signer_models::multisig_signer::{MultisigSigner, NewMultisigSigner},
        multisig_wallet_models::multisig_wallet::{MultisigWallet, WalletChainState},
    },
    store::SyncStore,
    transaction_service::TransactionServiceClient,
    utils::{chains::ChainRegistry, util::standardize_address},
};
use ahash::AHashSet;
use chrono::{NaiveDateTime, Utc};
use std::{fmt::Debug, sync::Arc};
use tracing::info;

/// What a signer sync changed. `chain_state` is what was written to the wallet row.
#[derive(Clone, Debug, PartialEq)]
pub struct SignerSyncOutcome {
    pub added: usize,
    pub removed: usize,
    pub chain_state: WalletChainState,
}

impl SignerSyncOutcome {
    /// Mirrors the wallet row update onto an in-memory copy.
    pub fn apply_to(&self, wallet: &mut MultisigWallet) {
        wallet.threshold = self.chain_state.threshold;
        wallet.nonce = self.chain_state.nonce;
        wallet.owner_addresses = self.chain_state.owner_addresses.clone();
        wallet.last_synced_at = Some(self.chain_state.last_synced_at);
    }
}

/// Reconciles a wallet's owner set and threshold with the transaction service.
pub struct SignerReconciler {
    store: Arc<dyn SyncStore>,
    client: Arc<dyn TransactionServiceClient>,
    chains: Arc<ChainRegistry>,
}

impl Debug for SignerReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SignerReconciler {{ chains: {:?} }}", self.chains)
    }
}

/// Owners missing from `stored` become new rows; stored rows whose address is no longer an
/// owner are returned for deletion. Matching is case-insensitive and matched rows are left
/// alone so their identity links survive.
pub fn diff_signers(
    wallet_id: i64,
    stored: &[MultisigSigner],
    owners: &[String],
    created_at: NaiveDateTime,
) -> (Vec<NewMultisigSigner>, Vec<i64>) {
    let owner_keys: AHashSet<String> = owners.iter().map(|o| standardize_address(o)).collect();
    let stored_keys: AHashSet<String> = stored
        .iter()
        .map(|s| standardize_address(&s.signer_address))
        .collect();

    let mut seen = AHashSet::new();
    let to_insert = owners
        .iter()
        .filter(|o| {
            let key = standardize_address(o);
            !stored_keys.contains(&key) && seen.insert(key)
        })
        .map(|o| NewMultisigSigner {
            wallet_id,
            signer_address: o.clone(),
            created_at,
        })
        .collect();

    let to_delete = stored
        .iter()
        .filter(|s| !owner_keys.contains(&standardize_address(&s.signer_address)))
        .map(|s| s.id)
        .collect();

    (to_insert, to_delete)
}

impl SignerReconciler {
    pub fn new(
        store: Arc<dyn SyncStore>,
        client: Arc<dyn TransactionServiceClient>,
        chains: Arc<ChainRegistry>,
    ) -> Self {
        Self {
            store,
            client,
            chains,
        }
    }

    pub fn name(&self) -> &'static str {
        ProcessorName::SignerReconciler.into()
    }

    pub async fn reconcile_signers(&self, wallet: &MultisigWallet) -> SyncResult<SignerSyncOutcome> {
        let chain = self.chains.resolve(wallet.chain_id)?;
        let info = self.client.get_safe_info(&chain, &wallet.address).await?;

        let threshold = i32::try_from(info.threshold).map_err(|_| {
            SyncError::IndexServiceUnavailable(format!(
                "threshold {} of {} is out of range",
                info.threshold, wallet.address
            ))
        })?;
        let nonce = i64::try_from(info.nonce).map_err(|_| {
            SyncError::IndexServiceUnavailable(format!(
                "nonce {} of {} is out of range",
                info.nonce, wallet.address
            ))
        })?;

        let now = Utc::now().naive_utc();
        let stored = self.store.signers_for_wallet(wallet.id).await?;
        let (to_insert, to_delete) = diff_signers(wallet.id, &stored, &info.owners, now);
        let added = to_insert.len();
        let removed = to_delete.len();

        self.store.insert_signers(to_insert).await?;
        self.store.delete_signers(wallet.id, to_delete).await?;

        let chain_state = WalletChainState {
            threshold,
            nonce,
            owner_addresses: info.owners,
            last_synced_at: now,
        };
        self.store
            .update_wallet_chain_state(wallet.id, chain_state.clone())
            .await?;

        info!(
            processor_name = self.name(),
            wallet_id = wallet.id,
            wallet_address = wallet.address.as_str(),
            chain_id = wallet.chain_id,
            threshold = threshold,
            nonce = nonce,
            added = added,
            removed = removed,
            "[Signers] Reconciled wallet owners",
        );

        Ok(SignerSyncOutcome {
            added,
            removed,
            chain_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn stored(id: i64, address: &str, user: Option<&str>) -> MultisigSigner {
        MultisigSigner {
            id,
            wallet_id: 1,
            signer_address: address.to_string(),
            linked_user_id: user.map(str::to_string),
            created_at: at(),
        }
    }

    #[test]
    fn diff_adds_new_and_removes_stale_owners() {
        let stored = vec![
            stored(1, "0xaaaa", Some("alice")),
            stored(2, "0xbbbb", None),
        ];
        let owners = vec!["0xAAAA".to_string(), "0xCCCC".to_string()];
        let (to_insert, to_delete) = diff_signers(1, &stored, &owners, at());

        assert_eq!(to_insert.len(), 1);
        assert_eq!(to_insert[0].signer_address, "0xCCCC");
        assert_eq!(to_delete, vec![2]);
    }

    #[test]
    fn diff_removes_linked_owner_that_left() {
        let stored = vec![
            stored(1, "0xaaaa", Some("alice")),
            stored(2, "0xbbbb", Some("bob")),
        ];
        let (to_insert, to_delete) = diff_signers(1, &stored, &["0xBBBB".to_string()], at());
        assert!(to_insert.is_empty());
        assert_eq!(to_delete, vec![1]);
    }

    #[test]
    fn diff_is_empty_for_unchanged_owner_set() {
        let stored = vec![stored(1, "0xAAAA", Some("alice"))];
        let (to_insert, to_delete) = diff_signers(1, &stored, &["0xaaaa".to_string()], at());
        assert!(to_insert.is_empty());
        assert!(to_delete.is_empty());
    }

    #[test]
    fn diff_ignores_duplicate_owners() {
        let owners = vec!["0xDDDD".to_string(), "0xdddd".to_string()];
        let (to_insert, _) = diff_signers(1, &[], &owners, at());
        assert_eq!(to_insert.len(), 1);
    }
}
