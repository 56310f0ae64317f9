// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

pub mod chains;
pub mod counters;
pub mod database;
pub mod util;
