// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use super::SyncStore;
use crate::{
    errors::SyncResult,
    models::{
        multisig_signer_models::multisig_signer::{MultisigSigner, NewMultisigSigner},
        multisig_transaction_models::multisig_transaction::MultisigTransaction,
        multisig_wallet_models::multisig_wallet::{MultisigWallet, WalletChainState},
    },
    schema,
    utils::database::{execute_with_better_error, get_chunk_size, ArcDbPool},
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::{
    pg::{upsert::excluded, Pg},
    query_builder::{QueryFragment, QueryId},
    ExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::RunQueryDsl;
use field_count::FieldCount;
use std::fmt::Debug;

pub struct PostgresSyncStore {
    connection_pool: ArcDbPool,
}

impl PostgresSyncStore {
    pub fn new(connection_pool: ArcDbPool) -> Self {
        Self { connection_pool }
    }
}

impl Debug for PostgresSyncStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = &self.connection_pool.state();
        write!(
            f,
            "PostgresSyncStore {{ connections: {:?}  idle_connections: {:?} }}",
            state.connections, state.idle_connections
        )
    }
}

fn insert_signers_query(
    items_to_insert: Vec<NewMultisigSigner>,
) -> impl QueryFragment<Pg> + QueryId + Send {
    // (wallet_id, lower(signer_address)) is unique, rows that already exist stay untouched.
    diesel::insert_into(schema::multisig_signers::table)
        .values(items_to_insert)
        .on_conflict_do_nothing()
}

fn upsert_transactions_query(
    items_to_insert: Vec<MultisigTransaction>,
) -> impl QueryFragment<Pg> + QueryId + Send {
    use schema::multisig_transactions::dsl::*;

    diesel::insert_into(schema::multisig_transactions::table)
        .values(items_to_insert)
        .on_conflict((wallet_id, safe_tx_hash))
        .do_update()
        .set((
            tx_hash.eq(excluded(tx_hash)),
            chain_id.eq(excluded(chain_id)),
            safe_address.eq(excluded(safe_address)),
            to_address.eq(excluded(to_address)),
            value.eq(excluded(value)),
            data.eq(excluded(data)),
            data_decoded.eq(excluded(data_decoded)),
            operation.eq(excluded(operation)),
            nonce.eq(excluded(nonce)),
            tx_type.eq(excluded(tx_type)),
            status.eq(excluded(status)),
            confirmations_required.eq(excluded(confirmations_required)),
            confirmations_count.eq(excluded(confirmations_count)),
            confirmations.eq(excluded(confirmations)),
            proposer_address.eq(excluded(proposer_address)),
            proposer_user_id.eq(excluded(proposer_user_id)),
            executor_address.eq(excluded(executor_address)),
            executor_user_id.eq(excluded(executor_user_id)),
            token_symbol.eq(excluded(token_symbol)),
            token_decimals.eq(excluded(token_decimals)),
            formatted_value.eq(excluded(formatted_value)),
            submitted_at.eq(excluded(submitted_at)),
            executed_at.eq(excluded(executed_at)),
        ))
}

#[async_trait]
impl SyncStore for PostgresSyncStore {
    async fn active_wallets(&self) -> SyncResult<Vec<MultisigWallet>> {
        use schema::multisig_wallets::dsl::*;

        let mut conn = self.connection_pool.get().await?;
        let wallets = multisig_wallets
            .filter(is_active.eq(true))
            .order(id.asc())
            .select(MultisigWallet::as_select())
            .load::<MultisigWallet>(&mut *conn)
            .await?;
        Ok(wallets)
    }

    async fn signers_for_wallet(&self, filter_wallet_id: i64) -> SyncResult<Vec<MultisigSigner>> {
        use schema::multisig_signers::dsl::*;

        let mut conn = self.connection_pool.get().await?;
        let signers = multisig_signers
            .filter(wallet_id.eq(filter_wallet_id))
            .order(id.asc())
            .select(MultisigSigner::as_select())
            .load::<MultisigSigner>(&mut *conn)
            .await?;
        Ok(signers)
    }

    async fn insert_signers(&self, signers: Vec<NewMultisigSigner>) -> SyncResult<()> {
        if signers.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection_pool.get().await?;
        for chunk in signers.chunks(get_chunk_size(NewMultisigSigner::field_count())) {
            execute_with_better_error(&mut conn, insert_signers_query(chunk.to_vec())).await?;
        }
        Ok(())
    }

    async fn delete_signers(&self, filter_wallet_id: i64, signer_ids: Vec<i64>) -> SyncResult<()> {
        use schema::multisig_signers::dsl::*;

        if signer_ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection_pool.get().await?;
        execute_with_better_error(
            &mut conn,
            diesel::delete(
                multisig_signers
                    .filter(wallet_id.eq(filter_wallet_id))
                    .filter(id.eq_any(signer_ids)),
            ),
        )
        .await?;
        Ok(())
    }

    async fn update_wallet_chain_state(
        &self,
        filter_wallet_id: i64,
        state: WalletChainState,
    ) -> SyncResult<()> {
        use schema::multisig_wallets::dsl::*;

        let mut conn = self.connection_pool.get().await?;
        execute_with_better_error(
            &mut conn,
            diesel::update(multisig_wallets.filter(id.eq(filter_wallet_id))).set(state),
        )
        .await?;
        Ok(())
    }

    async fn mark_wallet_synced(
        &self,
        filter_wallet_id: i64,
        synced_at: NaiveDateTime,
    ) -> SyncResult<()> {
        use schema::multisig_wallets::dsl::*;

        let mut conn = self.connection_pool.get().await?;
        execute_with_better_error(
            &mut conn,
            diesel::update(multisig_wallets.filter(id.eq(filter_wallet_id)))
                .set(last_synced_at.eq(Some(synced_at))),
        )
        .await?;
        Ok(())
    }

    async fn upsert_transactions(
        &self,
        transactions: Vec<MultisigTransaction>,
    ) -> SyncResult<usize> {
        if transactions.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection_pool.get().await?;
        let mut written = 0;
        for chunk in transactions.chunks(get_chunk_size(MultisigTransaction::field_count())) {
            written +=
                execute_with_better_error(&mut conn, upsert_transactions_query(chunk.to_vec()))
                    .await?;
        }
        Ok(written)
    }

    async fn transactions_for_wallet(
        &self,
        filter_wallet_id: i64,
    ) -> SyncResult<Vec<MultisigTransaction>> {
        use schema::multisig_transactions::dsl::*;

        let mut conn = self.connection_pool.get().await?;
        let transactions = multisig_transactions
            .filter(wallet_id.eq(filter_wallet_id))
            .order(submitted_at.desc())
            .select(MultisigTransaction::as_select())
            .load::<MultisigTransaction>(&mut *conn)
            .await?;
        Ok(transactions)
    }
}
