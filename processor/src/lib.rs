// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

// Need to use this for because src/schema.rs uses the macros and is autogenerated
#[macro_use]
extern crate diesel;

pub mod config;
pub mod errors;
pub mod models;
pub mod processors;
pub mod schema;
pub mod store;
pub mod transaction_service;
pub mod utils;
pub mod worker;

pub use config::MultisigSyncProcessorConfig;
pub use errors::{SyncError, SyncResult};
