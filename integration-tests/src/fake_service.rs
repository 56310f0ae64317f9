// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! In-process stand-in for the Safe transaction service.

use ahash::{AHashMap, AHashSet};
use async_trait::async_trait;
use processor::{
    errors::{SyncError, SyncResult},
    transaction_service::{
        types::{SafeBalance, SafeInfo, TransactionPage},
        TransactionServiceClient,
    },
    utils::{chains::ChainInfo, util::standardize_address},
};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

#[derive(Default)]
struct FakeState {
    safes: AHashMap<String, SafeInfo>,
    transactions: AHashMap<String, Vec<Value>>,
    balances: AHashMap<String, Vec<SafeBalance>>,
    unavailable: AHashSet<String>,
}

/// Serves canned safes, transactions and balances keyed by lowercased safe address.
/// Transactions are served in insertion order, callers add the most recent first.
#[derive(Default)]
pub struct FakeTransactionService {
    state: Mutex<FakeState>,
    calls: AtomicUsize,
    transaction_page_calls: AtomicUsize,
}

impl FakeTransactionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_safe(&self, address: &str, owners: &[&str], threshold: u32, nonce: u64) {
        self.state.lock().unwrap().safes.insert(
            standardize_address(address),
            SafeInfo {
                address: address.to_string(),
                nonce,
                threshold,
                owners: owners.iter().map(|o| o.to_string()).collect(),
            },
        );
    }

    pub fn push_transaction(&self, address: &str, raw: Value) {
        self.state
            .lock()
            .unwrap()
            .transactions
            .entry(standardize_address(address))
            .or_default()
            .push(raw);
    }

    pub fn set_balances(&self, address: &str, balances: Vec<SafeBalance>) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(standardize_address(address), balances);
    }

    /// Every request about `address` fails with `IndexServiceUnavailable`.
    pub fn make_unavailable(&self, address: &str) {
        self.state
            .lock()
            .unwrap()
            .unavailable
            .insert(standardize_address(address));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn transaction_page_calls(&self) -> usize {
        self.transaction_page_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self, address: &str) -> SyncResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = standardize_address(address);
        if self.state.lock().unwrap().unavailable.contains(&key) {
            return Err(SyncError::IndexServiceUnavailable(format!(
                "fake service refused {}",
                address
            )));
        }
        Ok(key)
    }
}

#[async_trait]
impl TransactionServiceClient for FakeTransactionService {
    async fn get_safe_info(&self, _chain: &ChainInfo, safe_address: &str) -> SyncResult<SafeInfo> {
        let key = self.check_available(safe_address)?;
        self.state
            .lock()
            .unwrap()
            .safes
            .get(&key)
            .cloned()
            .ok_or_else(|| {
                SyncError::IndexServiceUnavailable(format!("404 for safe {}", safe_address))
            })
    }

    async fn get_multisig_transactions(
        &self,
        _chain: &ChainInfo,
        safe_address: &str,
        limit: u32,
        offset: u32,
    ) -> SyncResult<TransactionPage> {
        let key = self.check_available(safe_address)?;
        self.transaction_page_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        let all = state.transactions.get(&key).cloned().unwrap_or_default();
        let start = (offset as usize).min(all.len());
        let end = (start + limit as usize).min(all.len());
        let next = (end < all.len()).then(|| format!("?limit={}&offset={}", limit, end));
        Ok(TransactionPage {
            count: Some(all.len() as u64),
            next,
            previous: None,
            results: all[start..end].to_vec(),
        })
    }

    async fn get_balances(
        &self,
        _chain: &ChainInfo,
        safe_address: &str,
    ) -> SyncResult<Vec<SafeBalance>> {
        let key = self.check_available(safe_address)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .balances
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}

/// A raw multisig transaction record as the service returns it, pending with no
/// confirmations. Tests adjust fields through the returned JSON.
pub fn raw_transaction(safe: &str, safe_tx_hash: &str, nonce: u64, submitted_at: &str) -> Value {
    json!({
        "safe": safe,
        "to": "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
        "value": "1000000000000000000",
        "data": null,
        "operation": 0,
        "nonce": nonce,
        "executionDate": null,
        "submissionDate": submitted_at,
        "transactionHash": null,
        "safeTxHash": safe_tx_hash,
        "proposer": null,
        "executor": null,
        "isExecuted": false,
        "isSuccessful": null,
        "dataDecoded": null,
        "confirmationsRequired": 2,
        "confirmations": []
    })
}

pub fn confirmation(owner: &str, submitted_at: &str) -> Value {
    json!({
        "owner": owner,
        "submissionDate": submitted_at,
        "signature": "0x00",
        "signatureType": "EOA"
    })
}
