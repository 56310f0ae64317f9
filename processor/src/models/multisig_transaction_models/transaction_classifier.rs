use crate::transaction_service::types::SafeMultisigTransaction;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Payload the service reports for a plain value transfer.
pub const EMPTY_PAYLOAD: &str = "0x";

const SETTINGS_METHODS: [&str; 4] = [
    "changeThreshold",
    "addOwnerWithThreshold",
    "removeOwner",
    "swapOwner",
];
const REJECTION_METHOD: &str = "rejectTransaction";

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Hash, IntoStaticStr, PartialEq, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionType {
    Transfer,
    SettingsChange,
    Rejection,
    ContractInteraction,
}

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Hash, IntoStaticStr, PartialEq, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionStatus {
    AwaitingConfirmations,
    AwaitingExecution,
    Executed,
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TransactionClassification {
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
}

pub fn is_empty_payload(data: Option<&str>) -> bool {
    match data {
        None => true,
        Some(d) => {
            let d = d.trim();
            d.is_empty() || d.eq_ignore_ascii_case(EMPTY_PAYLOAD)
        },
    }
}

pub fn classify_type(raw: &SafeMultisigTransaction) -> TransactionType {
    if is_empty_payload(raw.data.as_deref()) {
        return TransactionType::Transfer;
    }
    match raw.method_name() {
        Some(method) if SETTINGS_METHODS.contains(&method) => TransactionType::SettingsChange,
        Some(REJECTION_METHOD) => TransactionType::Rejection,
        _ => TransactionType::ContractInteraction,
    }
}

/// A missing `confirmationsRequired` counts as zero here; callers that know the wallet
/// threshold fill it in before classifying.
pub fn classify_status(raw: &SafeMultisigTransaction) -> TransactionStatus {
    if raw.is_executed {
        // The receipt may not be indexed yet when isSuccessful is null; treat as failed.
        return match raw.is_successful {
            Some(true) => TransactionStatus::Executed,
            _ => TransactionStatus::Failed,
        };
    }
    if raw.confirmations_count() >= raw.confirmations_required.unwrap_or(0) {
        TransactionStatus::AwaitingExecution
    } else {
        TransactionStatus::AwaitingConfirmations
    }
}

pub fn classify(raw: &SafeMultisigTransaction) -> TransactionClassification {
    TransactionClassification {
        tx_type: classify_type(raw),
        status: classify_status(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction_service::types::{DataDecoded, SafeConfirmation};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn raw_transaction() -> SafeMultisigTransaction {
        SafeMultisigTransaction {
            safe: "0x5AFE3855358E112B5647B952709E6165E1c1eEEe".to_string(),
            to: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string(),
            value: "0".to_string(),
            data: None,
            operation: 0,
            nonce: 1,
            execution_date: None,
            submission_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            transaction_hash: None,
            safe_tx_hash: "0xaaa".to_string(),
            proposer: None,
            executor: None,
            is_executed: false,
            is_successful: None,
            data_decoded: None,
            confirmations_required: Some(2),
            confirmations: vec![],
        }
    }

    fn confirmation(owner: &str) -> SafeConfirmation {
        SafeConfirmation {
            owner: owner.to_string(),
            submission_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            signature: Some("0xsig".to_string()),
            signature_type: Some("EOA".to_string()),
        }
    }

    fn with_method(method: &str) -> SafeMultisigTransaction {
        let mut raw = raw_transaction();
        raw.data = Some("0x694e80c3".to_string());
        raw.data_decoded = Some(DataDecoded {
            method: method.to_string(),
            parameters: vec![],
        });
        raw
    }

    #[test]
    fn empty_payloads_are_transfers() {
        let mut raw = raw_transaction();
        assert_eq!(classify_type(&raw), TransactionType::Transfer);
        raw.data = Some("0x".to_string());
        assert_eq!(classify_type(&raw), TransactionType::Transfer);
        raw.data = Some(String::new());
        assert_eq!(classify_type(&raw), TransactionType::Transfer);
    }

    #[test]
    fn classifies_decoded_methods() {
        for method in SETTINGS_METHODS {
            assert_eq!(
                classify_type(&with_method(method)),
                TransactionType::SettingsChange
            );
        }
        assert_eq!(
            classify_type(&with_method("rejectTransaction")),
            TransactionType::Rejection
        );
        assert_eq!(
            classify_type(&with_method("transfer")),
            TransactionType::ContractInteraction
        );

        let mut undecoded = raw_transaction();
        undecoded.data = Some("0xa9059cbb".to_string());
        assert_eq!(
            classify_type(&undecoded),
            TransactionType::ContractInteraction
        );
    }

    #[test]
    fn executed_status_follows_success_flag() {
        let mut raw = raw_transaction();
        raw.is_executed = true;
        raw.is_successful = Some(true);
        assert_eq!(classify_status(&raw), TransactionStatus::Executed);
        raw.is_successful = Some(false);
        assert_eq!(classify_status(&raw), TransactionStatus::Failed);
        raw.is_successful = None;
        assert_eq!(classify_status(&raw), TransactionStatus::Failed);
    }

    #[test]
    fn pending_status_follows_confirmation_count() {
        let mut raw = raw_transaction();
        raw.confirmations = vec![confirmation("0x01")];
        assert_eq!(
            classify_status(&raw),
            TransactionStatus::AwaitingConfirmations
        );
        raw.confirmations.push(confirmation("0x02"));
        assert_eq!(classify_status(&raw), TransactionStatus::AwaitingExecution);
        raw.confirmations.push(confirmation("0x03"));
        assert_eq!(classify_status(&raw), TransactionStatus::AwaitingExecution);
    }

    #[test]
    fn zero_required_is_immediately_executable() {
        let mut raw = raw_transaction();
        raw.confirmations_required = Some(0);
        assert_eq!(classify_status(&raw), TransactionStatus::AwaitingExecution);
    }

    #[test]
    fn classification_is_deterministic() {
        let raw = with_method("swapOwner");
        assert_eq!(classify(&raw), classify(&raw.clone()));
    }

    #[test]
    fn enums_round_trip_through_their_stored_names() {
        assert_eq!(TransactionType::SettingsChange.to_string(), "settings_change");
        assert_eq!(
            TransactionStatus::from_str("awaiting_execution").unwrap(),
            TransactionStatus::AwaitingExecution
        );
        let name: &'static str = TransactionStatus::AwaitingConfirmations.into();
        assert_eq!(name, "awaiting_confirmations");
    }
}
