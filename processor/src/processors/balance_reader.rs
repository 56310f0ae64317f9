// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use super::ProcessorName;
use crate::{
    errors::{SyncError, SyncResult},
    models::multisig_wallet_models::multisig_wallet::MultisigWallet,
    transaction_service::{types::SafeBalance, TransactionServiceClient},
    utils::{
        chains::{ChainInfo, ChainRegistry},
        util::format_token_value,
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// A balance ready for display. `token_address` is `None` for the chain's native currency.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FormattedBalance {
    pub token_address: Option<String>,
    pub symbol: String,
    pub decimals: u32,
    pub raw_balance: String,
    pub formatted_balance: String,
}

impl FormattedBalance {
    pub fn from_service_balance(chain: &ChainInfo, balance: &SafeBalance) -> SyncResult<Self> {
        let (symbol, decimals) = match (&balance.token_address, &balance.token) {
            (None, _) => (
                chain.native_token_symbol.clone(),
                chain.native_token_decimals,
            ),
            (Some(_), Some(token)) => (token.symbol.clone(), token.decimals),
            (Some(address), None) => {
                return Err(SyncError::MalformedRecord(format!(
                    "balance of token {} has no token metadata",
                    address
                )))
            },
        };
        Ok(Self {
            token_address: balance.token_address.clone(),
            formatted_balance: format_token_value(&balance.balance, decimals)?,
            symbol,
            decimals,
            raw_balance: balance.balance.clone(),
        })
    }
}

/// Read-only balance lookup. Nothing read here is persisted.
pub struct BalanceReader {
    client: Arc<dyn TransactionServiceClient>,
    chains: Arc<ChainRegistry>,
}

impl BalanceReader {
    pub fn new(client: Arc<dyn TransactionServiceClient>, chains: Arc<ChainRegistry>) -> Self {
        Self { client, chains }
    }

    pub async fn read_balances(&self, wallet: &MultisigWallet) -> SyncResult<Vec<FormattedBalance>> {
        let chain = self.chains.resolve(wallet.chain_id)?;
        let balances = self.client.get_balances(&chain, &wallet.address).await?;

        let mut formatted = Vec::with_capacity(balances.len());
        for balance in &balances {
            match FormattedBalance::from_service_balance(&chain, balance) {
                Ok(b) => formatted.push(b),
                Err(e) => warn!(
                    processor_name = <&'static str>::from(ProcessorName::BalanceReader),
                    wallet_id = wallet.id,
                    token_address = ?balance.token_address,
                    error = ?e,
                    "[Balances] Skipping balance entry",
                ),
            }
        }
        Ok(formatted)
    }
}
