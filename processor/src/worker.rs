// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    config::MultisigSyncProcessorConfig,
    processors::{BatchSyncOrchestrator, SyncSummary},
    store::{PostgresSyncStore, SyncStore},
    transaction_service::{HttpTransactionServiceClient, TransactionServiceClient},
    utils::{
        chains::ChainRegistry,
        database::{new_db_pool, run_pending_migrations, ArcDbPool},
    },
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

pub struct Worker {
    pub db_pool: ArcDbPool,
    pub config: MultisigSyncProcessorConfig,
    pub orchestrator: BatchSyncOrchestrator,
}

impl Worker {
    pub async fn new(config: MultisigSyncProcessorConfig) -> Result<Self> {
        info!(
            db_pool_size = config.db_pool_size,
            sync_interval_secs = config.sync_interval_secs,
            max_concurrent_wallets = config.max_concurrent_wallets,
            run_once = config.run_once,
            "[Worker] Creating worker",
        );

        run_pending_migrations(&config.postgres_connection_string)
            .await
            .context("Failed to run migrations")?;

        let db_pool = new_db_pool(
            &config.postgres_connection_string,
            Some(config.db_pool_size),
        )
        .await
        .context("Failed to create connection pool")?;
        info!("[Worker] Created connection pool");

        let store: Arc<dyn SyncStore> = Arc::new(PostgresSyncStore::new(db_pool.clone()));
        let client: Arc<dyn TransactionServiceClient> = Arc::new(
            HttpTransactionServiceClient::new(config.request_timeout())
                .context("Failed to build transaction service client")?,
        );
        let chains = Arc::new(ChainRegistry::with_overrides(config.chain_overrides.clone()));
        let orchestrator =
            BatchSyncOrchestrator::new(store, client, chains, config.sync_options());

        Ok(Self {
            db_pool,
            config,
            orchestrator,
        })
    }

    /// With `run_once` a single batch runs and its result is returned. Otherwise batches run
    /// every `sync_interval_secs` until the process stops; a slow batch delays the next tick.
    pub async fn run(&self) -> Result<()> {
        if self.config.run_once {
            let summary = self.orchestrator.sync_all().await?;
            log_summary(&summary);
            return Ok(());
        }

        let mut ticker = time::interval(self.config.sync_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.orchestrator.sync_all().await {
                Ok(summary) => log_summary(&summary),
                Err(e) => error!(
                    error_kind = e.kind(),
                    error = ?e,
                    "[Worker] Batch sync could not start",
                ),
            }
        }
    }
}

fn log_summary(summary: &SyncSummary) {
    info!(
        synced_count = summary.synced_count,
        error_count = summary.error_count,
        "[Worker] Batch sync complete",
    );
}
