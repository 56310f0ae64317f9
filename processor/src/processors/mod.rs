// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

pub mod balance_reader;
pub mod batch_sync;
pub mod signer_reconciler;
pub mod transaction_reconciler;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

pub use balance_reader::{BalanceReader, FormattedBalance};
pub use batch_sync::{BatchSyncOrchestrator, SyncSummary};
pub use signer_reconciler::{SignerReconciler, SignerSyncOutcome};
pub use transaction_reconciler::TransactionReconciler;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const DEFAULT_MAX_CONCURRENT_WALLETS: usize = 2;

/// Tunables shared by the reconcilers and the orchestrator.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SyncOptions {
    pub page_size: u32,
    pub max_pages: u32,
    pub max_concurrent_wallets: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            max_concurrent_wallets: DEFAULT_MAX_CONCURRENT_WALLETS,
        }
    }
}

/// Names used in logs and metric labels.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumString, IntoStaticStr, PartialEq, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum ProcessorName {
    SignerReconciler,
    TransactionReconciler,
    BatchSync,
    BalanceReader,
}
