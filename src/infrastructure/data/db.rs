// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::str::FromStr;

use alloy::primitives::B256;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::domain::error::AppError;
use crate::domain::types::OperationUid;
use crate::infrastructure::data::schema::{
    ConfirmationUpdate, NewTransactionRecord, TransactionRecord,
};

/// Persistence sink for broadcast transactions.
#[async_trait]
pub trait TransactionSink: Send + Sync {
    /// Inserts exactly one record for a freshly broadcast transaction.
    async fn save_transaction(
        &self,
        record: NewTransactionRecord,
    ) -> Result<TransactionRecord, AppError>;

    /// Appends receipt data to an existing record. The only mutation allowed.
    async fn record_confirmation(
        &self,
        uid: &OperationUid,
        hash: B256,
        update: ConfirmationUpdate,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Initialization(format!("DB Connect failed: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Initialization(format!("DB Connect failed: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Initialization(format!("DB Migration failed: {}", e)))?;

        tracing::debug!(target: "db", url = %database_url, "Database ready");
        Ok(Self { pool })
    }

    pub async fn transactions_for_uid(
        &self,
        uid: &OperationUid,
    ) -> Result<Vec<TransactionRecord>, AppError> {
        sqlx::query_as::<_, TransactionRecord>(
            "SELECT * FROM transactions WHERE uid = ? ORDER BY id ASC",
        )
        .bind(uid.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Initialization(format!("Query failed: {}", e)))
    }

    pub async fn get_recent_txs(&self, limit: i64) -> Result<Vec<TransactionRecord>, AppError> {
        sqlx::query_as::<_, TransactionRecord>(
            "SELECT * FROM transactions ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Initialization(format!("Query failed: {}", e)))
    }

    pub async fn count_transactions(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM transactions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Initialization(format!("Query failed: {}", e)))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn to_i64(value: u64, field: &str) -> Result<i64, String> {
    i64::try_from(value).map_err(|_| format!("{field} {value} exceeds INTEGER range"))
}

#[async_trait]
impl TransactionSink for Database {
    async fn save_transaction(
        &self,
        record: NewTransactionRecord,
    ) -> Result<TransactionRecord, AppError> {
        let persistence = |reason: String| AppError::Persistence {
            uid: record.uid.clone(),
            hash: record.tx_hash,
            reason,
        };

        let chain_id = to_i64(record.chain_id, "chain_id").map_err(persistence)?;
        let nonce = to_i64(record.nonce, "nonce").map_err(persistence)?;
        let gas_limit = to_i64(record.gas_limit, "gas_limit").map_err(persistence)?;
        let meta = serde_json::to_string(&record.meta).map_err(|e| persistence(e.to_string()))?;

        let row = sqlx::query_as::<_, TransactionRecord>(
            r#"
            INSERT INTO transactions (
                uid, chain_id, method, func, meta, tx_hash, from_address, to_address,
                nonce, gas_limit, gas_price_wei
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record.uid.as_str())
        .bind(chain_id)
        .bind(&record.method)
        .bind(&record.func)
        .bind(meta)
        .bind(format!("{:#x}", record.tx_hash))
        .bind(format!("{:#x}", record.from))
        .bind(record.to.map(|a| format!("{a:#x}")))
        .bind(nonce)
        .bind(gas_limit)
        .bind(record.gas_price_wei.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| persistence(e.to_string()))?;

        tracing::debug!(
            target: "db",
            uid = %record.uid,
            hash = %row.tx_hash,
            id = row.id,
            "Transaction recorded"
        );
        Ok(row)
    }

    async fn record_confirmation(
        &self,
        uid: &OperationUid,
        hash: B256,
        update: ConfirmationUpdate,
    ) -> Result<(), AppError> {
        let persistence = |reason: String| AppError::Persistence {
            uid: uid.clone(),
            hash,
            reason,
        };
        let block = to_i64(update.block_number, "block_number").map_err(persistence)?;
        let gas_used = to_i64(update.gas_used, "gas_used").map_err(persistence)?;

        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET block_number = ?, gas_used = ?, gas_price_wei = ?, status = ?
            WHERE tx_hash = ?
            "#,
        )
        .bind(block)
        .bind(gas_used)
        .bind(update.effective_gas_price.to_string())
        .bind(update.status)
        .bind(format!("{hash:#x}"))
        .execute(&self.pool)
        .await
        .map_err(|e| persistence(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(persistence("no record for hash".to_string()));
        }
        Ok(())
    }
}
