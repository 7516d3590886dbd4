// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::eips::BlockId;
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, B256, Bytes};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use crate::domain::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// The receipt fields this crate reads, detached from the RPC response type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub hash: B256,
    pub block_number: Option<u64>,
    pub status: bool,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub logs: Vec<LogEntry>,
}

/// Chain RPC surface consumed by routing and execution.
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain_id(&self) -> u64;

    async fn block_number(&self) -> Result<u64, AppError>;

    /// `eth_call` pinned at `block`.
    async fn call(&self, tx: TransactionRequest, block: u64) -> Result<Bytes, AppError>;

    /// `eth_estimateGas` against the pending state.
    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, AppError>;

    async fn gas_price(&self) -> Result<u128, AppError>;

    /// Pending transaction count, so back-to-back sends get consecutive nonces.
    async fn pending_nonce(&self, account: Address) -> Result<u64, AppError>;

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, AppError>;

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError>;
}

fn rpc_err(method: &'static str, err: impl std::fmt::Display) -> AppError {
    AppError::Rpc {
        method,
        message: err.to_string(),
    }
}

/// `ChainClient` over an alloy provider with a wallet filler attached.
#[derive(Clone)]
pub struct AlloyChainClient {
    provider: DynProvider,
    chain_id: u64,
}

impl AlloyChainClient {
    pub fn new(provider: DynProvider, chain_id: u64) -> Self {
        Self { provider, chain_id }
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn block_number(&self) -> Result<u64, AppError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| rpc_err("eth_blockNumber", e))
    }

    async fn call(&self, tx: TransactionRequest, block: u64) -> Result<Bytes, AppError> {
        self.provider
            .call(tx)
            .block(BlockId::number(block))
            .await
            .map_err(|e| rpc_err("eth_call", e))
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, AppError> {
        self.provider
            .estimate_gas(tx)
            .block(BlockId::pending())
            .await
            .map_err(|e| rpc_err("eth_estimateGas", e))
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| rpc_err("eth_gasPrice", e))
    }

    async fn pending_nonce(&self, account: Address) -> Result<u64, AppError> {
        self.provider
            .get_transaction_count(account)
            .pending()
            .await
            .map_err(|e| rpc_err("eth_getTransactionCount", e))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, AppError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| rpc_err("eth_sendRawTransaction", e))?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| rpc_err("eth_getTransactionReceipt", e))?;

        Ok(receipt.map(|rcpt| ReceiptSummary {
            hash,
            block_number: rcpt.block_number,
            status: rcpt.status(),
            gas_used: rcpt.gas_used,
            effective_gas_price: rcpt.effective_gas_price,
            logs: rcpt
                .inner
                .logs()
                .iter()
                .map(|log| LogEntry {
                    address: log.inner.address,
                    topics: log.inner.data.topics().to_vec(),
                    data: log.inner.data.data.clone(),
                })
                .collect(),
        }))
    }
}
