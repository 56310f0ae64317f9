// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use super::{ProcessorName, SignerReconciler, SyncOptions, TransactionReconciler};
use crate::{
    errors::SyncResult,
    models::multisig_wallet_models::multisig_wallet::MultisigWallet,
    store::SyncStore,
    transaction_service::TransactionServiceClient,
    utils::{
        chains::ChainRegistry,
        counters::{LAST_BATCH_WALLETS, WALLET_SYNC_COUNT},
    },
};
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc, time::Instant};
use tracing::{error, info};

/// Result of one pass over every active wallet. A wallet counts as synced only when at
/// least one transaction record was written for it.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SyncSummary {
    pub synced_count: usize,
    pub error_count: usize,
}

enum WalletOutcome {
    Written,
    Unchanged,
    Failed,
}

impl WalletOutcome {
    fn label(&self) -> &'static str {
        match self {
            WalletOutcome::Written => "written",
            WalletOutcome::Unchanged => "unchanged",
            WalletOutcome::Failed => "failed",
        }
    }
}

/// Runs signer then transaction reconciliation for every active wallet. A failing wallet is
/// logged and counted, it never aborts the rest of the batch.
pub struct BatchSyncOrchestrator {
    store: Arc<dyn SyncStore>,
    signer_reconciler: SignerReconciler,
    transaction_reconciler: TransactionReconciler,
    max_concurrent_wallets: usize,
}

impl Debug for BatchSyncOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BatchSyncOrchestrator {{ max_concurrent_wallets: {}, transaction_reconciler: {:?} }}",
            self.max_concurrent_wallets, self.transaction_reconciler
        )
    }
}

impl BatchSyncOrchestrator {
    pub fn new(
        store: Arc<dyn SyncStore>,
        client: Arc<dyn TransactionServiceClient>,
        chains: Arc<ChainRegistry>,
        options: SyncOptions,
    ) -> Self {
        Self {
            signer_reconciler: SignerReconciler::new(store.clone(), client.clone(), chains.clone()),
            transaction_reconciler: TransactionReconciler::new(
                store.clone(),
                client,
                chains,
                options,
            ),
            store,
            max_concurrent_wallets: options.max_concurrent_wallets.max(1),
        }
    }

    pub fn name(&self) -> &'static str {
        ProcessorName::BatchSync.into()
    }

    /// Only a failure to list the active wallets is returned as an error.
    pub async fn sync_all(&self) -> SyncResult<SyncSummary> {
        let start = Instant::now();
        let wallets = self.store.active_wallets().await?;
        let wallet_count = wallets.len();
        info!(
            processor_name = self.name(),
            wallet_count = wallet_count,
            max_concurrent_wallets = self.max_concurrent_wallets,
            "[Sync] Starting batch sync",
        );

        let outcomes: Vec<WalletOutcome> = stream::iter(wallets)
            .map(|wallet| self.sync_wallet_isolated(wallet))
            .buffer_unordered(self.max_concurrent_wallets)
            .collect()
            .await;

        let mut summary = SyncSummary::default();
        for outcome in &outcomes {
            match outcome {
                WalletOutcome::Written => summary.synced_count += 1,
                WalletOutcome::Unchanged => {},
                WalletOutcome::Failed => summary.error_count += 1,
            }
            WALLET_SYNC_COUNT
                .with_label_values(&[self.name(), outcome.label()])
                .inc();
        }

        LAST_BATCH_WALLETS
            .with_label_values(&["total"])
            .set(wallet_count as i64);
        LAST_BATCH_WALLETS
            .with_label_values(&["synced"])
            .set(summary.synced_count as i64);
        LAST_BATCH_WALLETS
            .with_label_values(&["failed"])
            .set(summary.error_count as i64);
        info!(
            processor_name = self.name(),
            wallet_count = wallet_count,
            synced_count = summary.synced_count,
            error_count = summary.error_count,
            duration_in_secs = start.elapsed().as_secs_f64(),
            "[Sync] Finished batch sync",
        );
        Ok(summary)
    }

    async fn sync_wallet_isolated(&self, wallet: MultisigWallet) -> WalletOutcome {
        match self.sync_wallet(&wallet).await {
            Ok(0) => WalletOutcome::Unchanged,
            Ok(_) => WalletOutcome::Written,
            Err(e) => {
                error!(
                    processor_name = self.name(),
                    wallet_id = wallet.id,
                    wallet_label = wallet.label.as_str(),
                    wallet_address = wallet.address.as_str(),
                    chain_id = wallet.chain_id,
                    error_kind = e.kind(),
                    error = ?e,
                    "[Sync] Wallet sync failed",
                );
                WalletOutcome::Failed
            },
        }
    }

    /// Signers first, so the transaction pass attributes against the fresh owner set and
    /// threshold.
    pub async fn sync_wallet(&self, wallet: &MultisigWallet) -> SyncResult<usize> {
        let outcome = self.signer_reconciler.reconcile_signers(wallet).await?;
        let mut refreshed = wallet.clone();
        outcome.apply_to(&mut refreshed);
        self.transaction_reconciler
            .reconcile_transactions(&refreshed)
            .await
    }
}
