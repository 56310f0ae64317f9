// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    processors::{
        SyncOptions, DEFAULT_MAX_CONCURRENT_WALLETS, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
    },
    transaction_service::http_client::DEFAULT_REQUEST_TIMEOUT_SECS,
    utils::database::DEFAULT_MAX_POOL_SIZE,
    worker::Worker,
};
use ahash::AHashMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use server_framework::RunnableConfig;
use std::time::Duration;

pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MultisigSyncProcessorConfig {
    pub postgres_connection_string: String,
    #[serde(default = "MultisigSyncProcessorConfig::default_db_pool_size")]
    pub db_pool_size: u32,
    #[serde(default = "MultisigSyncProcessorConfig::default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    /// Run a single batch and exit.
    #[serde(default)]
    pub run_once: bool,
    #[serde(default = "MultisigSyncProcessorConfig::default_max_concurrent_wallets")]
    pub max_concurrent_wallets: usize,
    #[serde(default = "MultisigSyncProcessorConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "MultisigSyncProcessorConfig::default_page_size")]
    pub page_size: u32,
    #[serde(default = "MultisigSyncProcessorConfig::default_max_pages")]
    pub max_pages: u32,
    /// Chain id to transaction service base URL, replacing the built-in endpoint.
    #[serde(default)]
    pub chain_overrides: AHashMap<i64, String>,
}

impl MultisigSyncProcessorConfig {
    pub const fn default_db_pool_size() -> u32 {
        DEFAULT_MAX_POOL_SIZE
    }

    pub const fn default_sync_interval_secs() -> u64 {
        DEFAULT_SYNC_INTERVAL_SECS
    }

    pub const fn default_max_concurrent_wallets() -> usize {
        DEFAULT_MAX_CONCURRENT_WALLETS
    }

    pub const fn default_request_timeout_secs() -> u64 {
        DEFAULT_REQUEST_TIMEOUT_SECS
    }

    pub const fn default_page_size() -> u32 {
        DEFAULT_PAGE_SIZE
    }

    pub const fn default_max_pages() -> u32 {
        DEFAULT_MAX_PAGES
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            page_size: self.page_size,
            max_pages: self.max_pages,
            max_concurrent_wallets: self.max_concurrent_wallets,
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[async_trait::async_trait]
impl RunnableConfig for MultisigSyncProcessorConfig {
    async fn run(&self) -> Result<()> {
        let worker = Worker::new(self.clone())
            .await
            .context("Failed to build worker")?;
        worker.run().await
    }

    fn get_server_name(&self) -> String {
        "multisig_sync".to_string()
    }
}
