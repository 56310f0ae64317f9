// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

pub mod multisig_signer_models;
pub mod multisig_transaction_models;
pub mod multisig_wallet_models;
