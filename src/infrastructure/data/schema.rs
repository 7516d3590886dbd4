// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, B256};
use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::domain::types::OperationUid;

/// Audit row for one broadcast transaction. Rows are never deleted.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRecord {
    pub id: i64,
    pub uid: String,
    pub chain_id: i64,
    pub method: String,
    pub func: String,
    pub meta: String,
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: Option<String>,
    pub nonce: i64,
    pub gas_limit: i64,
    pub gas_price_wei: String,
    pub gas_used: Option<i64>,
    pub block_number: Option<i64>,
    pub status: Option<bool>,
    pub created_at: NaiveDateTime,
}

impl TransactionRecord {
    pub fn meta_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.meta).unwrap_or(serde_json::Value::Null)
    }
}

/// Insert payload built by the executor right after broadcast.
#[derive(Debug, Clone)]
pub struct NewTransactionRecord {
    pub uid: OperationUid,
    pub chain_id: u64,
    pub method: String,
    pub func: String,
    pub meta: serde_json::Value,
    pub tx_hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price_wei: u128,
}

/// Receipt fields appended once the confirmation step resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationUpdate {
    pub block_number: u64,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub status: bool,
}
