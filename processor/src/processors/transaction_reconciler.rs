// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use super::{ProcessorName, SyncOptions};
use crate::{
    errors::{SyncError, SyncResult},
    models::{
        multisig_signer_models::multisig_signer::SignerDirectory,
        multisig_transaction_models::multisig_transaction::MultisigTransaction,
        multisig_wallet_models::multisig_wallet::MultisigWallet,
    },
    store::SyncStore,
    transaction_service::{types::SafeMultisigTransaction, TransactionServiceClient},
    utils::{
        chains::{ChainInfo, ChainRegistry},
        counters::{MALFORMED_RECORD_COUNT, TRANSACTIONS_UPSERTED_COUNT},
    },
};
use ahash::AHashSet;
use chrono::Utc;
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, info, warn};

/// Pulls a wallet's multisig transactions from the transaction service and upserts the
/// classified, attributed records.
pub struct TransactionReconciler {
    store: Arc<dyn SyncStore>,
    client: Arc<dyn TransactionServiceClient>,
    chains: Arc<ChainRegistry>,
    page_size: u32,
    max_pages: u32,
}

impl Debug for TransactionReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TransactionReconciler {{ page_size: {}, max_pages: {} }}",
            self.page_size, self.max_pages
        )
    }
}

impl TransactionReconciler {
    pub fn new(
        store: Arc<dyn SyncStore>,
        client: Arc<dyn TransactionServiceClient>,
        chains: Arc<ChainRegistry>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            client,
            chains,
            page_size: options.page_size.max(1),
            max_pages: options.max_pages.max(1),
        }
    }

    pub fn name(&self) -> &'static str {
        ProcessorName::TransactionReconciler.into()
    }

    /// Returns the number of records written. Records that fail to parse are logged and
    /// skipped, the rest of the batch is still written.
    pub async fn reconcile_transactions(&self, wallet: &MultisigWallet) -> SyncResult<usize> {
        let chain = self.chains.resolve(wallet.chain_id)?;
        let raw_records = self.fetch_all_pages(&chain, wallet).await?;
        let fetched = raw_records.len();

        let signers = self.store.signers_for_wallet(wallet.id).await?;
        let directory = SignerDirectory::from_signers(&signers);

        let chain_label = wallet.chain_id.to_string();
        let mut seen = AHashSet::new();
        let mut records = Vec::with_capacity(fetched);
        for raw in raw_records {
            match build_record(wallet, &chain, raw, &directory) {
                // Pages can shift while we paginate, keep the first copy of each hash.
                Ok(record) => {
                    if seen.insert(record.safe_tx_hash.clone()) {
                        records.push(record);
                    }
                },
                Err(e) if e.is_wallet_fatal() => return Err(e),
                Err(e) => {
                    MALFORMED_RECORD_COUNT
                        .with_label_values(&[chain_label.as_str()])
                        .inc();
                    warn!(
                        processor_name = self.name(),
                        wallet_id = wallet.id,
                        wallet_address = wallet.address.as_str(),
                        chain_id = wallet.chain_id,
                        error = ?e,
                        "[Transactions] Skipping transaction record",
                    );
                },
            }
        }
        let skipped = fetched - records.len();

        let written = self.store.upsert_transactions(records).await?;
        self.store
            .mark_wallet_synced(wallet.id, Utc::now().naive_utc())
            .await?;

        TRANSACTIONS_UPSERTED_COUNT
            .with_label_values(&[chain_label.as_str()])
            .inc_by(written as u64);
        info!(
            processor_name = self.name(),
            wallet_id = wallet.id,
            wallet_address = wallet.address.as_str(),
            chain_id = wallet.chain_id,
            fetched = fetched,
            skipped = skipped,
            written = written,
            "[Transactions] Reconciled wallet transactions",
        );
        Ok(written)
    }

    async fn fetch_all_pages(
        &self,
        chain: &ChainInfo,
        wallet: &MultisigWallet,
    ) -> SyncResult<Vec<Value>> {
        let mut results = vec![];
        let mut offset: u32 = 0;
        for page_number in 1..=self.max_pages {
            let page = self
                .client
                .get_multisig_transactions(chain, &wallet.address, self.page_size, offset)
                .await?;
            let received = page.results.len();
            results.extend(page.results);
            debug!(
                wallet_id = wallet.id,
                page_number = page_number,
                received = received,
                "[Transactions] Fetched page",
            );

            if page.next.is_none() || received == 0 {
                return Ok(results);
            }
            offset = offset.saturating_add(received as u32);
        }
        warn!(
            processor_name = self.name(),
            wallet_id = wallet.id,
            wallet_address = wallet.address.as_str(),
            max_pages = self.max_pages,
            "[Transactions] Page limit reached, older transactions were not fetched",
        );
        Ok(results)
    }
}

fn build_record(
    wallet: &MultisigWallet,
    chain: &ChainInfo,
    raw: Value,
    directory: &SignerDirectory,
) -> SyncResult<MultisigTransaction> {
    let mut tx = SafeMultisigTransaction::narrow(raw)?;
    if !wallet.has_address(&tx.safe) {
        return Err(SyncError::MalformedRecord(format!(
            "transaction {} belongs to {}, not {}",
            tx.safe_tx_hash, tx.safe, wallet.address
        )));
    }
    if tx.confirmations_required.is_none() {
        tx.confirmations_required = u32::try_from(wallet.threshold).ok();
    }
    MultisigTransaction::from_service_transaction(wallet, chain, &tx, directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::chains::ChainRegistry;
    use serde_json::json;

    fn wallet() -> MultisigWallet {
        MultisigWallet {
            id: 7,
            address: "0xSafe".to_string(),
            chain_id: 1,
            label: "Treasury".to_string(),
            threshold: 2,
            nonce: 0,
            owner_addresses: vec![],
            is_active: true,
            last_synced_at: None,
        }
    }

    fn raw(safe: &str, confirmations_required: Value) -> Value {
        json!({
            "safe": safe,
            "to": "0xRecipient",
            "value": "1000000000000000000",
            "data": null,
            "operation": 0,
            "nonce": 3,
            "executionDate": null,
            "submissionDate": "2024-03-01T12:00:00Z",
            "transactionHash": null,
            "safeTxHash": "0xhash",
            "proposer": "0xOwner",
            "executor": null,
            "isExecuted": false,
            "isSuccessful": null,
            "dataDecoded": null,
            "confirmationsRequired": confirmations_required,
            "confirmations": []
        })
    }

    #[test]
    fn missing_confirmations_required_falls_back_to_threshold() {
        let chain = ChainRegistry::new().resolve(1).unwrap();
        let record = build_record(
            &wallet(),
            &chain,
            raw("0xsafe", Value::Null),
            &SignerDirectory::default(),
        )
        .unwrap();
        assert_eq!(record.confirmations_required, 2);
        assert_eq!(record.status, "awaiting_confirmations");
    }

    #[test]
    fn record_of_another_safe_is_rejected() {
        let chain = ChainRegistry::new().resolve(1).unwrap();
        let err = build_record(
            &wallet(),
            &chain,
            raw("0xOther", json!(1)),
            &SignerDirectory::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::MalformedRecord(_)));
    }
}
