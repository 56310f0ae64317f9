// This is required because a diesel macro makes clippy sad
#![allow(clippy::extra_unused_lifetimes)]

use crate::{schema::multisig_signers, utils::util::standardize_address};
use ahash::AHashMap;
use chrono::NaiveDateTime;
use field_count::FieldCount;
use serde::{Deserialize, Serialize};

/// Links an owner address of a wallet to an optional platform user.
#[derive(Clone, Debug, Deserialize, Identifiable, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(primary_key(id))]
#[diesel(table_name = multisig_signers)]
pub struct MultisigSigner {
    pub id: i64,
    pub wallet_id: i64,
    pub signer_address: String,
    pub linked_user_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// New owners are always inserted unlinked.
#[derive(Clone, Debug, Deserialize, FieldCount, Insertable, Serialize)]
#[diesel(table_name = multisig_signers)]
pub struct NewMultisigSigner {
    pub wallet_id: i64,
    pub signer_address: String,
    pub created_at: NaiveDateTime,
}

/// Case-insensitive address -> user id table built from a wallet's signer rows.
#[derive(Clone, Debug, Default)]
pub struct SignerDirectory {
    users_by_address: AHashMap<String, String>,
}

impl SignerDirectory {
    pub fn from_signers(signers: &[MultisigSigner]) -> Self {
        let users_by_address = signers
            .iter()
            .filter_map(|s| {
                s.linked_user_id
                    .as_ref()
                    .map(|user| (standardize_address(&s.signer_address), user.clone()))
            })
            .collect();
        Self { users_by_address }
    }

    pub fn user_for(&self, address: &str) -> Option<String> {
        self.users_by_address
            .get(&standardize_address(address))
            .cloned()
    }

    pub fn user_for_opt(&self, address: Option<&str>) -> Option<String> {
        address.and_then(|a| self.user_for(a))
    }
}
