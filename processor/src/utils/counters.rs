// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};

/// Wallet sync outcomes, labelled by processor name and outcome.
pub static WALLET_SYNC_COUNT: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "multisig_sync_wallet_sync_count",
        "Wallet sync attempts by outcome",
        &["processor_name", "outcome"]
    )
    .expect("metric registration")
});

/// Transaction records written to the store.
pub static TRANSACTIONS_UPSERTED_COUNT: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "multisig_sync_transactions_upserted_count",
        "Transaction records upserted",
        &["chain_id"]
    )
    .expect("metric registration")
});

/// Raw records that could not be narrowed or formatted and were skipped.
pub static MALFORMED_RECORD_COUNT: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "multisig_sync_malformed_record_count",
        "Raw transaction records skipped",
        &["chain_id"]
    )
    .expect("metric registration")
});

pub static TRANSACTION_SERVICE_LATENCY_IN_SECS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "multisig_sync_transaction_service_latency_in_secs",
        "Latency of requests to the transaction service",
        &["endpoint", "status"]
    )
    .expect("metric registration")
});

/// Wallets seen by the last batch run.
pub static LAST_BATCH_WALLETS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "multisig_sync_last_batch_wallets",
        "Wallet counts of the most recent batch run",
        &["kind"]
    )
    .expect("metric registration")
});
