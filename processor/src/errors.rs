// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Failure taxonomy of the sync engine.
///
/// `UnsupportedChain`, `IndexServiceUnavailable` and `PersistenceFailure` abort the sync of a
/// single wallet and are counted by the batch orchestrator. `MalformedRecord` only ever skips
/// one transaction record.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("chain id {0} is not supported")]
    UnsupportedChain(i64),
    #[error("transaction service unavailable: {0}")]
    IndexServiceUnavailable(String),
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

impl SyncError {
    pub fn is_wallet_fatal(&self) -> bool {
        !matches!(self, SyncError::MalformedRecord(_))
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::UnsupportedChain(_) => "unsupported_chain",
            SyncError::IndexServiceUnavailable(_) => "index_service_unavailable",
            SyncError::MalformedRecord(_) => "malformed_record",
            SyncError::PersistenceFailure(_) => "persistence_failure",
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SyncError::IndexServiceUnavailable(format!("request timed out: {}", e))
        } else if e.is_decode() {
            SyncError::IndexServiceUnavailable(format!("malformed response: {}", e))
        } else {
            SyncError::IndexServiceUnavailable(e.to_string())
        }
    }
}

impl From<diesel::result::Error> for SyncError {
    fn from(e: diesel::result::Error) -> Self {
        SyncError::PersistenceFailure(e.to_string())
    }
}

impl<E: std::error::Error + 'static> From<bb8::RunError<E>> for SyncError {
    fn from(e: bb8::RunError<E>) -> Self {
        SyncError::PersistenceFailure(format!("unable to get a db connection: {}", e))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
