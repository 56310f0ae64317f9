// This is required because a diesel macro makes clippy sad
#![allow(clippy::extra_unused_lifetimes)]

use super::transaction_classifier::{classify, TransactionStatus, TransactionType};
use crate::{
    errors::{SyncError, SyncResult},
    models::{
        multisig_signer_models::multisig_signer::SignerDirectory,
        multisig_wallet_models::multisig_wallet::MultisigWallet,
    },
    schema::multisig_transactions,
    transaction_service::types::SafeMultisigTransaction,
    utils::{chains::ChainInfo, util::format_token_value},
};
use chrono::NaiveDateTime;
use field_count::FieldCount;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// One owner signature on a multisig transaction.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransactionConfirmation {
    pub signer_address: String,
    pub signature: Option<String>,
    pub signature_type: Option<String>,
    pub submitted_at: NaiveDateTime,
    pub attributed_user_id: Option<String>,
}

/// Reconciled view of a multisig transaction. `tx_type` and `status` are derived from the
/// raw service record on every write and never set independently.
#[derive(
    Clone,
    Debug,
    Deserialize,
    FieldCount,
    Identifiable,
    Insertable,
    PartialEq,
    Queryable,
    Selectable,
    Serialize,
)]
#[diesel(primary_key(wallet_id, safe_tx_hash))]
#[diesel(table_name = multisig_transactions)]
pub struct MultisigTransaction {
    pub wallet_id: i64,
    pub safe_tx_hash: String,
    pub tx_hash: Option<String>,
    pub chain_id: i64,
    pub safe_address: String,
    pub to_address: String,
    pub value: String,
    pub data: Option<String>,
    pub data_decoded: Option<Value>,
    pub operation: i32,
    pub nonce: i64,
    pub tx_type: String,
    pub status: String,
    pub confirmations_required: i32,
    pub confirmations_count: i32,
    pub confirmations: Value,
    pub proposer_address: Option<String>,
    pub proposer_user_id: Option<String>,
    pub executor_address: Option<String>,
    pub executor_user_id: Option<String>,
    pub token_symbol: Option<String>,
    pub token_decimals: Option<i32>,
    pub formatted_value: Option<String>,
    pub submitted_at: NaiveDateTime,
    pub executed_at: Option<NaiveDateTime>,
}

fn malformed(raw: &SafeMultisigTransaction, what: &str) -> SyncError {
    SyncError::MalformedRecord(format!("transaction {}: {}", raw.safe_tx_hash, what))
}

impl MultisigTransaction {
    /// Builds the stored record for `raw`. Confirmations, proposer and executor are
    /// attributed through `directory`; native-currency transfers also get token metadata and
    /// a formatted amount.
    pub fn from_service_transaction(
        wallet: &MultisigWallet,
        chain: &ChainInfo,
        raw: &SafeMultisigTransaction,
        directory: &SignerDirectory,
    ) -> SyncResult<Self> {
        let classification = classify(raw);

        let confirmations = raw
            .confirmations
            .iter()
            .map(|c| TransactionConfirmation {
                signer_address: c.owner.clone(),
                signature: c.signature.clone(),
                signature_type: c.signature_type.clone(),
                submitted_at: c.submission_date.naive_utc(),
                attributed_user_id: directory.user_for(&c.owner),
            })
            .collect::<Vec<_>>();
        let confirmations_count = i32::try_from(confirmations.len())
            .map_err(|_| malformed(raw, "too many confirmations"))?;
        let confirmations_required = i32::try_from(raw.confirmations_required.unwrap_or(0))
            .map_err(|_| malformed(raw, "confirmationsRequired out of range"))?;
        let nonce = i64::try_from(raw.nonce).map_err(|_| malformed(raw, "nonce out of range"))?;

        let (token_symbol, token_decimals, formatted_value) =
            if classification.tx_type == TransactionType::Transfer {
                let decimals = i32::try_from(chain.native_token_decimals)
                    .map_err(|_| malformed(raw, "token decimals out of range"))?;
                (
                    Some(chain.native_token_symbol.clone()),
                    Some(decimals),
                    Some(format_token_value(&raw.value, chain.native_token_decimals)?),
                )
            } else {
                (None, None, None)
            };

        let data_decoded = raw
            .data_decoded
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| malformed(raw, &e.to_string()))?;
        let confirmations =
            serde_json::to_value(&confirmations).map_err(|e| malformed(raw, &e.to_string()))?;

        Ok(Self {
            wallet_id: wallet.id,
            safe_tx_hash: raw.safe_tx_hash.clone(),
            tx_hash: raw.transaction_hash.clone(),
            chain_id: wallet.chain_id,
            safe_address: raw.safe.clone(),
            to_address: raw.to.clone(),
            value: raw.value.clone(),
            data: raw.data.clone(),
            data_decoded,
            operation: raw.operation,
            nonce,
            tx_type: classification.tx_type.to_string(),
            status: classification.status.to_string(),
            confirmations_required,
            confirmations_count,
            confirmations,
            proposer_address: raw.proposer.clone(),
            proposer_user_id: directory.user_for_opt(raw.proposer.as_deref()),
            executor_address: raw.executor.clone(),
            executor_user_id: directory.user_for_opt(raw.executor.as_deref()),
            token_symbol,
            token_decimals,
            formatted_value,
            submitted_at: raw.submission_date.naive_utc(),
            executed_at: raw.execution_date.map(|d| d.naive_utc()),
        })
    }

    pub fn transaction_type(&self) -> SyncResult<TransactionType> {
        TransactionType::from_str(&self.tx_type).map_err(|e| {
            SyncError::MalformedRecord(format!("stored tx_type {:?}: {}", self.tx_type, e))
        })
    }

    pub fn transaction_status(&self) -> SyncResult<TransactionStatus> {
        TransactionStatus::from_str(&self.status).map_err(|e| {
            SyncError::MalformedRecord(format!("stored status {:?}: {}", self.status, e))
        })
    }

    pub fn parsed_confirmations(&self) -> SyncResult<Vec<TransactionConfirmation>> {
        serde_json::from_value(self.confirmations.clone()).map_err(|e| {
            SyncError::MalformedRecord(format!(
                "stored confirmations of {}: {}",
                self.safe_tx_hash, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::multisig_signer_models::multisig_signer::MultisigSigner,
        transaction_service::types::{DataDecoded, SafeConfirmation},
        utils::chains::ChainRegistry,
    };
    use chrono::{TimeZone, Utc};

    const OWNER_A: &str = "0xA11CE00000000000000000000000000000000001";
    const OWNER_B: &str = "0xB0B0000000000000000000000000000000000002";

    fn wallet() -> MultisigWallet {
        MultisigWallet {
            id: 7,
            address: "0x5AFE3855358E112B5647B952709E6165E1c1eEEe".to_string(),
            chain_id: 1,
            label: "Treasury".to_string(),
            threshold: 2,
            nonce: 3,
            owner_addresses: vec![OWNER_A.to_string(), OWNER_B.to_string()],
            is_active: true,
            last_synced_at: None,
        }
    }

    fn directory() -> SignerDirectory {
        let created_at = NaiveDateTime::from_timestamp_opt(1_700_000_000, 0).unwrap();
        SignerDirectory::from_signers(&[
            MultisigSigner {
                id: 1,
                wallet_id: 7,
                signer_address: OWNER_A.to_lowercase(),
                linked_user_id: Some("alice".to_string()),
                created_at,
            },
            MultisigSigner {
                id: 2,
                wallet_id: 7,
                signer_address: OWNER_B.to_string(),
                linked_user_id: None,
                created_at,
            },
        ])
    }

    fn raw() -> SafeMultisigTransaction {
        SafeMultisigTransaction {
            safe: "0x5AFE3855358E112B5647B952709E6165E1c1eEEe".to_string(),
            to: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string(),
            value: "2500000000000000000".to_string(),
            data: None,
            operation: 0,
            nonce: 3,
            execution_date: None,
            submission_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            transaction_hash: None,
            safe_tx_hash: "0xfeed".to_string(),
            proposer: Some(OWNER_A.to_string()),
            executor: None,
            is_executed: false,
            is_successful: None,
            data_decoded: None,
            confirmations_required: Some(2),
            confirmations: vec![
                SafeConfirmation {
                    owner: OWNER_A.to_string(),
                    submission_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
                    signature: Some("0xsig-a".to_string()),
                    signature_type: Some("EOA".to_string()),
                },
                SafeConfirmation {
                    owner: OWNER_B.to_string(),
                    submission_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap(),
                    signature: Some("0xsig-b".to_string()),
                    signature_type: Some("EOA".to_string()),
                },
            ],
        }
    }

    #[test]
    fn builds_native_transfer_record() {
        let chain = ChainRegistry::new().resolve(1).unwrap();
        let record =
            MultisigTransaction::from_service_transaction(&wallet(), &chain, &raw(), &directory())
                .unwrap();

        assert_eq!(record.wallet_id, 7);
        assert_eq!(record.tx_type, "transfer");
        assert_eq!(record.status, "awaiting_execution");
        assert_eq!(record.confirmations_count, 2);
        assert_eq!(record.token_symbol.as_deref(), Some("ETH"));
        assert_eq!(record.token_decimals, Some(18));
        assert_eq!(record.formatted_value.as_deref(), Some("2.5"));
        assert_eq!(record.proposer_user_id.as_deref(), Some("alice"));
        assert!(record.executor_user_id.is_none());

        let confirmations = record.parsed_confirmations().unwrap();
        assert_eq!(confirmations.len(), record.confirmations_count as usize);
        assert_eq!(confirmations[0].attributed_user_id.as_deref(), Some("alice"));
        assert!(confirmations[1].attributed_user_id.is_none());
        assert_eq!(
            record.transaction_status().unwrap(),
            TransactionStatus::AwaitingExecution
        );
    }

    #[test]
    fn contract_calls_carry_no_token_metadata() {
        let chain = ChainRegistry::new().resolve(1).unwrap();
        let mut raw = raw();
        raw.data = Some("0x694e80c3".to_string());
        raw.data_decoded = Some(DataDecoded {
            method: "changeThreshold".to_string(),
            parameters: vec![],
        });
        raw.is_executed = true;
        raw.is_successful = Some(true);
        raw.executor = Some(OWNER_B.to_string());

        let record =
            MultisigTransaction::from_service_transaction(&wallet(), &chain, &raw, &directory())
                .unwrap();
        assert_eq!(
            record.transaction_type().unwrap(),
            TransactionType::SettingsChange
        );
        assert_eq!(record.status, "executed");
        assert!(record.token_symbol.is_none());
        assert!(record.token_decimals.is_none());
        assert!(record.formatted_value.is_none());
        assert_eq!(record.executor_address.as_deref(), Some(OWNER_B));
        assert!(record.executor_user_id.is_none());
        assert_eq!(
            record.data_decoded.as_ref().unwrap()["method"],
            "changeThreshold"
        );
    }

    #[test]
    fn unparsable_transfer_value_is_malformed() {
        let chain = ChainRegistry::new().resolve(1).unwrap();
        let mut raw = raw();
        raw.value = "-12".to_string();
        assert!(matches!(
            MultisigTransaction::from_service_transaction(&wallet(), &chain, &raw, &directory()),
            Err(SyncError::MalformedRecord(_))
        ));
    }

    #[test]
    fn rebuilding_is_identical() {
        let chain = ChainRegistry::new().resolve(1).unwrap();
        let first =
            MultisigTransaction::from_service_transaction(&wallet(), &chain, &raw(), &directory())
                .unwrap();
        let second =
            MultisigTransaction::from_service_transaction(&wallet(), &chain, &raw(), &directory())
                .unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
