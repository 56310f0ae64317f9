// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use super::{
    types::{SafeBalance, SafeInfo, TransactionPage},
    TransactionServiceClient,
};
use crate::{
    errors::{SyncError, SyncResult},
    utils::{chains::ChainInfo, counters::TRANSACTION_SERVICE_LATENCY_IN_SECS},
};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// reqwest-backed client. A single instance holds one connection pool for every chain.
#[derive(Debug, Clone)]
pub struct HttpTransactionServiceClient {
    client: reqwest::Client,
}

impl HttpTransactionServiceClient {
    pub fn new(request_timeout: Duration) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .timeout(request_timeout)
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| {
                SyncError::IndexServiceUnavailable(format!("failed to build http client: {}", e))
            })?;
        Ok(Self { client })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: String,
        query: &[(&str, String)],
    ) -> SyncResult<T> {
        tracing::debug!(url = url.as_str(), "[Transaction Service] request");
        let start = Instant::now();
        let result = self.send(&url, query).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        TRANSACTION_SERVICE_LATENCY_IN_SECS
            .with_label_values(&[endpoint, status])
            .observe(start.elapsed().as_secs_f64());
        result
    }

    async fn send<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> SyncResult<T> {
        let res = self.client.get(url).query(query).send().await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(SyncError::IndexServiceUnavailable(format!(
                "{} returned {}: {}",
                url, status, text
            )));
        }

        let body = res.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| {
            SyncError::IndexServiceUnavailable(format!("malformed response from {}: {}", url, e))
        })
    }
}

pub fn safe_info_url(base_url: &str, safe_address: &str) -> String {
    format!("{}/api/v1/safes/{}/", base_url.trim_end_matches('/'), safe_address)
}

pub fn multisig_transactions_url(base_url: &str, safe_address: &str) -> String {
    format!(
        "{}/api/v1/safes/{}/multisig-transactions/",
        base_url.trim_end_matches('/'),
        safe_address
    )
}

pub fn balances_url(base_url: &str, safe_address: &str) -> String {
    format!(
        "{}/api/v1/safes/{}/balances/",
        base_url.trim_end_matches('/'),
        safe_address
    )
}

#[async_trait]
impl TransactionServiceClient for HttpTransactionServiceClient {
    async fn get_safe_info(&self, chain: &ChainInfo, safe_address: &str) -> SyncResult<SafeInfo> {
        self.get_json(
            "safe_info",
            safe_info_url(&chain.index_service_base_url, safe_address),
            &[],
        )
        .await
    }

    async fn get_multisig_transactions(
        &self,
        chain: &ChainInfo,
        safe_address: &str,
        limit: u32,
        offset: u32,
    ) -> SyncResult<TransactionPage> {
        self.get_json(
            "multisig_transactions",
            multisig_transactions_url(&chain.index_service_base_url, safe_address),
            &[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("ordering", "-submissionDate".to_string()),
            ],
        )
        .await
    }

    async fn get_balances(
        &self,
        chain: &ChainInfo,
        safe_address: &str,
    ) -> SyncResult<Vec<SafeBalance>> {
        self.get_json(
            "balances",
            balances_url(&chain.index_service_base_url, safe_address),
            &[
                ("trusted", "true".to_string()),
                ("exclude_spam", "true".to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFE: &str = "0x5AFE3855358E112B5647B952709E6165E1c1eEEe";

    #[test]
    fn builds_service_urls() {
        assert_eq!(
            safe_info_url("https://safe-transaction-mainnet.safe.global", SAFE),
            format!("https://safe-transaction-mainnet.safe.global/api/v1/safes/{}/", SAFE)
        );
        assert_eq!(
            multisig_transactions_url("http://localhost:8000/", SAFE),
            format!("http://localhost:8000/api/v1/safes/{}/multisig-transactions/", SAFE)
        );
        assert_eq!(
            balances_url("http://localhost:8000", SAFE),
            format!("http://localhost:8000/api/v1/safes/{}/balances/", SAFE)
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let client = HttpTransactionServiceClient::new(Duration::from_millis(200)).unwrap();
        let chain = ChainInfo {
            chain_id: 1,
            chain_name: "Local".to_string(),
            // Port 9 (discard) is closed on test machines.
            index_service_base_url: "http://127.0.0.1:9".to_string(),
            explorer_base_url: "http://127.0.0.1:9".to_string(),
            native_token_symbol: "ETH".to_string(),
            native_token_decimals: 18,
        };
        let result = client.get_safe_info(&chain, SAFE).await;
        assert!(matches!(result, Err(SyncError::IndexServiceUnavailable(_))));
    }
}
