// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Response shapes of the Safe transaction service. Every field the service may omit or
//! send as `null` is optional here; narrowing happens per record so one bad entry never
//! poisons a whole page.

use crate::{
    errors::{SyncError, SyncResult},
    utils::util::{
        deserialize_null_as_default, deserialize_string_or_number,
        deserialize_u64_from_string_or_number,
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /api/v1/safes/{address}/`
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeInfo {
    pub address: String,
    #[serde(deserialize_with = "deserialize_u64_from_string_or_number")]
    pub nonce: u64,
    pub threshold: u32,
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub owners: Vec<String>,
}

/// One page of `GET /api/v1/safes/{address}/multisig-transactions/`. Results are kept as raw
/// JSON until [`SafeMultisigTransaction::narrow`] is applied to each of them.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub results: Vec<Value>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeMultisigTransaction {
    pub safe: String,
    pub to: String,
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub value: String,
    pub data: Option<String>,
    pub operation: i32,
    #[serde(deserialize_with = "deserialize_u64_from_string_or_number")]
    pub nonce: u64,
    pub execution_date: Option<DateTime<Utc>>,
    pub submission_date: DateTime<Utc>,
    pub transaction_hash: Option<String>,
    pub safe_tx_hash: String,
    pub proposer: Option<String>,
    pub executor: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub is_executed: bool,
    pub is_successful: Option<bool>,
    pub data_decoded: Option<DataDecoded>,
    pub confirmations_required: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub confirmations: Vec<SafeConfirmation>,
}

impl SafeMultisigTransaction {
    pub fn narrow(raw: Value) -> SyncResult<Self> {
        let safe_tx_hash = raw
            .get("safeTxHash")
            .and_then(Value::as_str)
            .unwrap_or("<missing safeTxHash>")
            .to_string();
        serde_json::from_value(raw)
            .map_err(|e| SyncError::MalformedRecord(format!("transaction {}: {}", safe_tx_hash, e)))
    }

    pub fn method_name(&self) -> Option<&str> {
        self.data_decoded.as_ref().map(|d| d.method.as_str())
    }

    pub fn confirmations_count(&self) -> u32 {
        self.confirmations.len() as u32
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDecoded {
    pub method: String,
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub parameters: Vec<DecodedParameter>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeConfirmation {
    pub owner: String,
    pub submission_date: DateTime<Utc>,
    pub signature: Option<String>,
    pub signature_type: Option<String>,
}

/// `GET /api/v1/safes/{address}/balances/`. A `null` token address is the chain's native
/// currency.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeBalance {
    pub token_address: Option<String>,
    pub token: Option<TokenMetadata>,
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub balance: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub logo_uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_transaction() -> Value {
        json!({
            "safe": "0x5AFE3855358E112B5647B952709E6165E1c1eEEe",
            "to": "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            "value": "1500000000000000000",
            "data": null,
            "operation": 0,
            "nonce": 12,
            "executionDate": "2024-03-01T10:15:00Z",
            "submissionDate": "2024-03-01T09:00:00.123456Z",
            "transactionHash": "0x01",
            "safeTxHash": "0xaaa",
            "proposer": "0x1111111111111111111111111111111111111111",
            "executor": "0x2222222222222222222222222222222222222222",
            "isExecuted": true,
            "isSuccessful": true,
            "dataDecoded": null,
            "confirmationsRequired": 2,
            "confirmations": [
                {
                    "owner": "0x1111111111111111111111111111111111111111",
                    "submissionDate": "2024-03-01T09:00:00Z",
                    "signature": "0xsig1",
                    "signatureType": "EOA"
                }
            ],
            "trusted": true,
            "signatures": "0xsig1"
        })
    }

    #[test]
    fn narrows_a_full_record() {
        let tx = SafeMultisigTransaction::narrow(sample_transaction()).unwrap();
        assert_eq!(tx.safe_tx_hash, "0xaaa");
        assert_eq!(tx.nonce, 12);
        assert_eq!(tx.value, "1500000000000000000");
        assert!(tx.is_executed);
        assert_eq!(tx.is_successful, Some(true));
        assert_eq!(tx.confirmations_count(), 1);
        assert_eq!(tx.confirmations_required, Some(2));
        assert!(tx.method_name().is_none());
    }

    #[test]
    fn tolerates_nulls_for_optional_collections() {
        let mut raw = sample_transaction();
        raw["confirmations"] = Value::Null;
        raw["isExecuted"] = Value::Null;
        raw["confirmationsRequired"] = Value::Null;
        raw["nonce"] = json!("13");
        let tx = SafeMultisigTransaction::narrow(raw).unwrap();
        assert!(tx.confirmations.is_empty());
        assert!(!tx.is_executed);
        assert!(tx.confirmations_required.is_none());
        assert_eq!(tx.nonce, 13);
    }

    #[test]
    fn missing_required_fields_are_malformed() {
        let mut raw = sample_transaction();
        raw.as_object_mut().unwrap().remove("submissionDate");
        match SafeMultisigTransaction::narrow(raw) {
            Err(SyncError::MalformedRecord(msg)) => assert!(msg.contains("0xaaa")),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn oversized_numeric_value_is_malformed() {
        let raw: Value = serde_json::from_str(
            &sample_transaction()
                .to_string()
                .replace(r#""1500000000000000000""#, "123456789012345678901234"),
        )
        .unwrap();
        assert!(raw["value"].is_f64());
        assert!(matches!(
            SafeMultisigTransaction::narrow(raw),
            Err(SyncError::MalformedRecord(_))
        ));

        let mut raw = sample_transaction();
        raw["value"] = json!("123456789012345678901234");
        let tx = SafeMultisigTransaction::narrow(raw).unwrap();
        assert_eq!(tx.value, "123456789012345678901234");
    }

    #[test]
    fn decodes_method_and_parameters() {
        let mut raw = sample_transaction();
        raw["data"] = json!("0x694e80c30000000000000000000000000000000000000000000000000000000000000002");
        raw["dataDecoded"] = json!({
            "method": "changeThreshold",
            "parameters": [{"name": "_threshold", "type": "uint256", "value": "2"}]
        });
        let tx = SafeMultisigTransaction::narrow(raw).unwrap();
        assert_eq!(tx.method_name(), Some("changeThreshold"));
        let decoded = tx.data_decoded.unwrap();
        assert_eq!(decoded.parameters[0].param_type, "uint256");
    }

    #[test]
    fn parses_safe_info_and_balances() {
        let info: SafeInfo = serde_json::from_value(json!({
            "address": "0x5AFE3855358E112B5647B952709E6165E1c1eEEe",
            "nonce": "4",
            "threshold": 2,
            "owners": ["0x1111111111111111111111111111111111111111"],
            "masterCopy": "0x3E5c63644E683549055b9Be8653de26E0B4CD36E",
            "version": "1.3.0"
        }))
        .unwrap();
        assert_eq!(info.nonce, 4);
        assert_eq!(info.owners.len(), 1);

        let balances: Vec<SafeBalance> = serde_json::from_value(json!([
            {"tokenAddress": null, "token": null, "balance": "1000000000000000000"},
            {
                "tokenAddress": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                "token": {"name": "USD Coin", "symbol": "USDC", "decimals": 6, "logoUri": null},
                "balance": "2500000"
            }
        ]))
        .unwrap();
        assert!(balances[0].token_address.is_none());
        assert_eq!(balances[1].token.as_ref().unwrap().symbol, "USDC");
    }
}
