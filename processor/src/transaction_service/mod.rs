// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

pub mod http_client;
pub mod types;

use crate::{errors::SyncResult, utils::chains::ChainInfo};
use async_trait::async_trait;
use types::{SafeBalance, SafeInfo, TransactionPage};

pub use http_client::HttpTransactionServiceClient;

/// Read-only view of the external transaction service. Reconcilers receive an implementation
/// explicitly, the chain's base URL comes from the [`ChainInfo`] passed on each call.
#[async_trait]
pub trait TransactionServiceClient: Send + Sync {
    async fn get_safe_info(&self, chain: &ChainInfo, safe_address: &str) -> SyncResult<SafeInfo>;

    /// One page of multisig transactions, most recently submitted first.
    async fn get_multisig_transactions(
        &self,
        chain: &ChainInfo,
        safe_address: &str,
        limit: u32,
        offset: u32,
    ) -> SyncResult<TransactionPage>;

    async fn get_balances(
        &self,
        chain: &ChainInfo,
        safe_address: &str,
    ) -> SyncResult<Vec<SafeBalance>>;
}
