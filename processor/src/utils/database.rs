// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Database-related functions
#![allow(clippy::extra_unused_lifetimes)]

use diesel::{
    pg::Pg,
    query_builder::{QueryFragment, QueryId},
    ConnectionError, ConnectionResult, QueryResult,
};
use diesel_async::{
    pooled_connection::{
        bb8::{Pool, PooledConnection},
        AsyncDieselConnectionManager, ManagerConfig, PoolError,
    },
    AsyncPgConnection, RunQueryDsl,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use futures_util::{future::BoxFuture, FutureExt};
use std::sync::Arc;

pub type MyDbConnection = AsyncPgConnection;
pub type PgPool = Pool<MyDbConnection>;
pub type ArcDbPool = Arc<PgPool>;
pub type PgPoolConnection<'a> = PooledConnection<'a, MyDbConnection>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub const DEFAULT_MAX_POOL_SIZE: u32 = 10;
// Postgres caps bind parameters at u16::MAX per statement.
pub const MAX_DIESEL_PARAM_SIZE: usize = u16::MAX as usize;

/// Number of rows per insert statement so a chunk never exceeds the bind parameter limit.
pub fn get_chunk_size(field_count: usize) -> usize {
    (MAX_DIESEL_PARAM_SIZE / field_count.max(1)).max(1)
}

fn establish_connection(database_url: &str) -> BoxFuture<ConnectionResult<AsyncPgConnection>> {
    use native_tls::{Certificate, TlsConnector};
    use postgres_native_tls::MakeTlsConnector;

    let database_url = database_url.to_string();
    (async move {
        let (url, cert_path) = parse_and_clean_db_url(&database_url)?;
        let connector = match cert_path {
            Some(cert_path) => {
                let cert = std::fs::read(&cert_path).map_err(|e| {
                    ConnectionError::BadConnection(format!(
                        "could not read certificate {}: {}",
                        cert_path, e
                    ))
                })?;
                let cert = Certificate::from_pem(&cert)
                    .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
                TlsConnector::builder()
                    .add_root_certificate(cert)
                    .build()
                    .map_err(|e| ConnectionError::BadConnection(e.to_string()))?
            },
            None => TlsConnector::new().map_err(|e| ConnectionError::BadConnection(e.to_string()))?,
        };
        let connector = MakeTlsConnector::new(connector);
        let (client, connection) = tokio_postgres::connect(&url, connector)
            .await
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = ?e, "[Database] Postgres connection error");
            }
        });
        AsyncPgConnection::try_from(client).await
    })
    .boxed()
}

/// Splits `sslrootcert` out of the query string since tokio-postgres does not understand it.
fn parse_and_clean_db_url(url: &str) -> ConnectionResult<(String, Option<String>)> {
    let mut db_url = url::Url::parse(url)
        .map_err(|e| ConnectionError::InvalidConnectionUrl(e.to_string()))?;

    let mut cert_path = None;
    let mut kept_pairs = vec![];
    for (k, v) in db_url.query_pairs() {
        if k == "sslrootcert" {
            cert_path = Some(v.to_string());
        } else {
            kept_pairs.push(format!("{}={}", k, v));
        }
    }
    if kept_pairs.is_empty() {
        db_url.set_query(None);
    } else {
        db_url.set_query(Some(&kept_pairs.join("&")));
    }

    Ok((db_url.to_string(), cert_path))
}

fn requires_tls(database_url: &str) -> bool {
    database_url.contains("sslmode=require") || database_url.contains("sslrootcert=")
}

pub async fn new_db_pool(
    database_url: &str,
    max_pool_size: Option<u32>,
) -> Result<ArcDbPool, PoolError> {
    let manager = if requires_tls(database_url) {
        let mut config = ManagerConfig::<MyDbConnection>::default();
        config.custom_setup = Box::new(|conn| Box::pin(establish_connection(conn)));
        AsyncDieselConnectionManager::<MyDbConnection>::new_with_config(database_url, config)
    } else {
        AsyncDieselConnectionManager::<MyDbConnection>::new(database_url)
    };
    let pool = Pool::builder()
        .max_size(max_pool_size.unwrap_or(DEFAULT_MAX_POOL_SIZE))
        .build(manager)
        .await?;
    Ok(Arc::new(pool))
}

/// Runs a write query, logging the rendered SQL when it fails.
pub async fn execute_with_better_error<U>(conn: &mut MyDbConnection, query: U) -> QueryResult<usize>
where
    U: QueryFragment<Pg> + QueryId + Send,
{
    let debug_string = diesel::debug_query::<Pg, _>(&query).to_string();
    tracing::debug!("Executing query: {:?}", debug_string);
    let res = query.execute(conn).await;
    if let Err(ref e) = res {
        tracing::error!("Error running query: {:?}\n{:?}", e, debug_string);
    }
    res
}

/// Applies the embedded schema migrations over a blocking connection wrapper.
pub async fn run_pending_migrations(database_url: &str) -> anyhow::Result<()> {
    use diesel::Connection;
    use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;

    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&database_url)?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("[Database] Migrations failed: {}", e))?;
        tracing::info!(
            applied_migrations = applied.len(),
            "[Database] Finished running migrations"
        );
        Ok(())
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sslrootcert_from_url() {
        let (url, cert) = parse_and_clean_db_url(
            "postgres://user:pw@localhost:5432/sync?sslmode=require&sslrootcert=/etc/ca.pem",
        )
        .unwrap();
        assert_eq!(url, "postgres://user:pw@localhost:5432/sync?sslmode=require");
        assert_eq!(cert.as_deref(), Some("/etc/ca.pem"));
    }

    #[test]
    fn plain_url_is_untouched() {
        let (url, cert) = parse_and_clean_db_url("postgres://localhost/sync").unwrap();
        assert_eq!(url, "postgres://localhost/sync");
        assert!(cert.is_none());
        assert!(!requires_tls("postgres://localhost/sync"));
    }

    #[test]
    fn chunk_size_respects_param_limit() {
        assert_eq!(get_chunk_size(25), 2621);
        assert_eq!(get_chunk_size(0), MAX_DIESEL_PARAM_SIZE);
    }
}
