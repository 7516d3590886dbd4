// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use harvest_router::domain::error::AppError;
use harvest_router::domain::types::{OperationUid, Platform, Pool};
use harvest_router::infrastructure::data::contracts::{IMulticall3, IUniswapV2Router02};
use harvest_router::infrastructure::data::db::TransactionSink;
use harvest_router::infrastructure::data::pool_registry::StaticPoolSource;
use harvest_router::infrastructure::data::schema::{
    ConfirmationUpdate, NewTransactionRecord, TransactionRecord,
};
use harvest_router::infrastructure::data::token_manager::TokenManager;
use harvest_router::infrastructure::network::chain::{ChainClient, LogEntry, ReceiptSummary};
use harvest_router::infrastructure::network::multicall::MulticallReader;
use harvest_router::services::routing::discovery::PairDiscovery;
use harvest_router::services::routing::platforms::PlatformTable;
use harvest_router::services::context::ChainDeps;
use harvest_router::services::execution::confirmation::{
    ConfirmationSettings, ConfirmationWatcher,
};
use harvest_router::services::execution::executor::TransactionExecutor;
use harvest_router::services::routing::router::TradeRouter;
use tokio_util::sync::CancellationToken;

pub const CHAIN: u64 = 56;
pub const MULTICALL: Address = Address::repeat_byte(0xca);
pub const PANCAKE: Address = Address::repeat_byte(0xa1);
pub const APESWAP: Address = Address::repeat_byte(0xa2);
pub const BISWAP: Address = Address::repeat_byte(0xa3);

pub const BTC: Address = Address::repeat_byte(0x01);
pub const FIL: Address = Address::repeat_byte(0x02);
pub const WBNB: Address = Address::repeat_byte(0x03);
pub const BUSD: Address = Address::repeat_byte(0x04);
pub const WBTC8: Address = Address::repeat_byte(0x05);

pub const GAS_ESTIMATE: u64 = 120_000;
pub const PENDING_NONCE: u64 = 42;
pub const GAS_PRICE: u128 = 3_000_000_000;

pub fn e18(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

#[derive(Default)]
struct MockState {
    block: u64,
    advance_on_block_poll: bool,
    block_polls: usize,
    last_block_seen: u64,
    /// (router, from, to) -> (numerator, denominator) in base units.
    rates: HashMap<(Address, Address, Address), (U256, U256)>,
    failing_routers: HashSet<Address>,
    call_blocks: Vec<u64>,
    call_error: Option<String>,
    estimate_error: Option<String>,
    send_error: Option<String>,
    estimates: usize,
    sent: Vec<TransactionRequest>,
    receipts: HashMap<B256, ReceiptSummary>,
    receipt_polls: usize,
    mine_sent: bool,
    sent_status: bool,
    sent_logs: Vec<LogEntry>,
}

/// In-memory chain: UniswapV2 routers with fixed rates behind Multicall3,
/// plus a transaction pool that mines sends at the current block.
#[derive(Clone)]
pub struct MockChain {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new(100)
    }
}

impl MockChain {
    pub fn new(block: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                block,
                last_block_seen: block,
                mine_sent: true,
                sent_status: true,
                ..MockState::default()
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// `amount_out = amount_in * num / den` for `from -> to` on `router`; the
    /// reverse direction uses the inverse rate.
    pub fn set_rate(&self, router: Address, from: Address, to: Address, num: U256, den: U256) {
        self.with(|s| {
            s.rates.insert((router, from, to), (num, den));
            s.rates.insert((router, to, from), (den, num));
        });
    }

    pub fn fail_router(&self, router: Address) {
        self.with(|s| {
            s.failing_routers.insert(router);
        });
    }

    pub fn fail_multicall(&self, message: &str) {
        self.with(|s| s.call_error = Some(message.to_string()));
    }

    pub fn fail_estimate(&self, message: &str) {
        self.with(|s| s.estimate_error = Some(message.to_string()));
    }

    pub fn fail_send(&self, message: &str) {
        self.with(|s| s.send_error = Some(message.to_string()));
    }

    pub fn advance_on_block_poll(&self, on: bool) {
        self.with(|s| s.advance_on_block_poll = on);
    }

    pub fn set_block(&self, block: u64) {
        self.with(|s| s.block = block);
    }

    /// Sent transactions stay pending forever when `false`.
    pub fn mine_sent(&self, on: bool) {
        self.with(|s| s.mine_sent = on);
    }

    pub fn sent_receipt(&self, status: bool, logs: Vec<LogEntry>) {
        self.with(|s| {
            s.sent_status = status;
            s.sent_logs = logs;
        });
    }

    pub fn insert_receipt(&self, receipt: ReceiptSummary) {
        self.with(|s| {
            s.receipts.insert(receipt.hash, receipt);
        });
    }

    pub fn call_blocks(&self) -> Vec<u64> {
        self.with(|s| s.call_blocks.clone())
    }

    pub fn estimates(&self) -> usize {
        self.with(|s| s.estimates)
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.with(|s| s.sent.clone())
    }

    pub fn block_polls(&self) -> usize {
        self.with(|s| s.block_polls)
    }

    pub fn receipt_polls(&self) -> usize {
        self.with(|s| s.receipt_polls)
    }

    pub fn last_block_seen(&self) -> u64 {
        self.with(|s| s.last_block_seen)
    }

    fn quote(
        s: &MockState,
        router: Address,
        path: &[Address],
        amount: U256,
        reverse: bool,
    ) -> Option<Vec<U256>> {
        if s.failing_routers.contains(&router) || path.len() < 2 {
            return None;
        }
        let mut amounts = vec![U256::ZERO; path.len()];
        if reverse {
            amounts[path.len() - 1] = amount;
            for i in (0..path.len() - 1).rev() {
                let (num, den) = s.rates.get(&(router, path[i], path[i + 1]))?;
                let out = amounts[i + 1] * *den;
                amounts[i] = (out + *num - U256::from(1u64)) / *num;
            }
        } else {
            amounts[0] = amount;
            for i in 0..path.len() - 1 {
                let (num, den) = s.rates.get(&(router, path[i], path[i + 1]))?;
                amounts[i + 1] = amounts[i] * *num / *den;
            }
        }
        Some(amounts)
    }

    fn answer(s: &MockState, call: &IMulticall3::Call3) -> IMulticall3::Call3Result {
        let data: &[u8] = &call.callData;
        let amounts = if data.starts_with(&IUniswapV2Router02::getAmountsOutCall::SELECTOR) {
            IUniswapV2Router02::getAmountsOutCall::abi_decode(data)
                .ok()
                .and_then(|c| Self::quote(s, call.target, &c.path, c.amountIn, false))
        } else if data.starts_with(&IUniswapV2Router02::getAmountsInCall::SELECTOR) {
            IUniswapV2Router02::getAmountsInCall::abi_decode(data)
                .ok()
                .and_then(|c| Self::quote(s, call.target, &c.path, c.amountOut, true))
        } else {
            None
        };
        match amounts {
            Some(amounts) => IMulticall3::Call3Result {
                success: true,
                returnData: Bytes::from((amounts,).abi_encode_params()),
            },
            None => IMulticall3::Call3Result {
                success: false,
                returnData: Bytes::new(),
            },
        }
    }
}

fn rpc(method: &'static str, message: &str) -> AppError {
    AppError::Rpc {
        method,
        message: message.to_string(),
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn chain_id(&self) -> u64 {
        CHAIN
    }

    async fn block_number(&self) -> Result<u64, AppError> {
        Ok(self.with(|s| {
            s.block_polls += 1;
            let current = s.block;
            s.last_block_seen = current;
            if s.advance_on_block_poll {
                s.block += 1;
            }
            current
        }))
    }

    async fn call(&self, tx: TransactionRequest, block: u64) -> Result<Bytes, AppError> {
        self.with(|s| -> Result<Bytes, AppError> {
            s.call_blocks.push(block);
            if let Some(msg) = &s.call_error {
                return Err(rpc("eth_call", msg));
            }
            let input = tx.input.input().cloned().unwrap_or_default();
            let batch = IMulticall3::aggregate3Call::abi_decode(&input)
                .map_err(|e| rpc("eth_call", &e.to_string()))?;
            let state: &MockState = s;
            let results: Vec<IMulticall3::Call3Result> =
                batch.calls.iter().map(|c| Self::answer(state, c)).collect();
            Ok(Bytes::from((results,).abi_encode_params()))
        })
    }

    async fn estimate_gas(&self, _tx: TransactionRequest) -> Result<u64, AppError> {
        self.with(|s| {
            s.estimates += 1;
            match &s.estimate_error {
                Some(msg) => Err(rpc("eth_estimateGas", msg)),
                None => Ok(GAS_ESTIMATE),
            }
        })
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        Ok(GAS_PRICE)
    }

    async fn pending_nonce(&self, _account: Address) -> Result<u64, AppError> {
        Ok(self.with(|s| PENDING_NONCE + s.sent.len() as u64))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, AppError> {
        self.with(|s| -> Result<B256, AppError> {
            if let Some(msg) = &s.send_error {
                return Err(rpc("eth_sendRawTransaction", msg));
            }
            s.sent.push(tx);
            let hash = B256::from(U256::from(0xf00d_0000u64 + s.sent.len() as u64));
            if s.mine_sent {
                let receipt = ReceiptSummary {
                    hash,
                    block_number: Some(s.block),
                    status: s.sent_status,
                    gas_used: GAS_ESTIMATE - 10_000,
                    effective_gas_price: GAS_PRICE,
                    logs: s.sent_logs.clone(),
                };
                s.receipts.insert(hash, receipt);
            }
            Ok(hash)
        })
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError> {
        Ok(self.with(|s| {
            s.receipt_polls += 1;
            s.receipts
                .get(&hash)
                .filter(|r| r.block_number.is_some_and(|b| b <= s.block))
                .cloned()
        }))
    }
}

/// Sink that keeps records in memory; usable under paused time.
#[derive(Default, Clone)]
pub struct MemorySink {
    rows: Arc<Mutex<Vec<TransactionRecord>>>,
}

impl MemorySink {
    pub fn rows(&self) -> Vec<TransactionRecord> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl TransactionSink for MemorySink {
    async fn save_transaction(
        &self,
        record: NewTransactionRecord,
    ) -> Result<TransactionRecord, AppError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let row = TransactionRecord {
            id: rows.len() as i64 + 1,
            uid: record.uid.to_string(),
            chain_id: record.chain_id as i64,
            method: record.method,
            func: record.func,
            meta: record.meta.to_string(),
            tx_hash: format!("{:#x}", record.tx_hash),
            from_address: format!("{:#x}", record.from),
            to_address: record.to.map(|a| format!("{a:#x}")),
            nonce: record.nonce as i64,
            gas_limit: record.gas_limit as i64,
            gas_price_wei: record.gas_price_wei.to_string(),
            gas_used: None,
            block_number: None,
            status: None,
            created_at: chrono::Utc::now().naive_utc(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn record_confirmation(
        &self,
        uid: &OperationUid,
        hash: B256,
        update: ConfirmationUpdate,
    ) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let key = format!("{hash:#x}");
        let Some(row) = rows.iter_mut().find(|r| r.tx_hash == key) else {
            return Err(AppError::Persistence {
                uid: uid.clone(),
                hash,
                reason: "no record".into(),
            });
        };
        row.block_number = Some(update.block_number as i64);
        row.gas_used = Some(update.gas_used as i64);
        row.gas_price_wei = update.effective_gas_price.to_string();
        row.status = Some(update.status);
        Ok(())
    }
}

pub fn tokens() -> TokenManager {
    let mut tm = TokenManager::default();
    tm.insert(CHAIN, "BTC", BTC, 18);
    tm.insert(CHAIN, "FIL", FIL, 18);
    tm.insert(CHAIN, "WBNB", WBNB, 18);
    tm.insert(CHAIN, "BUSD", BUSD, 18);
    tm.insert(CHAIN, "WBTC8", WBTC8, 8);
    tm
}

pub fn pool(platform: Platform, a: Address, b: Address, at: u8) -> (u64, Pool) {
    (
        CHAIN,
        Pool {
            platform,
            token0: a,
            token1: b,
            address: Address::repeat_byte(at),
            pool_id: None,
        },
    )
}

pub fn routers() -> HashMap<Platform, Address> {
    HashMap::from([
        (Platform::Pancake, PANCAKE),
        (Platform::Apeswap, APESWAP),
        (Platform::Biswap, BISWAP),
    ])
}

pub fn router_with(chain: &MockChain, pools: Vec<(u64, Pool)>) -> TradeRouter {
    let client: Arc<dyn ChainClient> = Arc::new(chain.clone());
    TradeRouter::new(
        Arc::new(tokens()),
        PairDiscovery::new(Arc::new(StaticPoolSource::new(pools))),
        PlatformTable::from_routers(&routers()),
        MulticallReader::new(client.clone(), MULTICALL),
        client,
    )
}

pub fn confirmation(blocks: u64, timeout_secs: u64) -> ConfirmationSettings {
    ConfirmationSettings {
        timeout: Duration::from_secs(timeout_secs),
        blocks,
        poll: Duration::from_secs(3),
    }
}

pub fn executor_with(
    chain: &MockChain,
    sink: Arc<dyn TransactionSink>,
    settings: ConfirmationSettings,
    cancel: CancellationToken,
) -> TransactionExecutor {
    let client: Arc<dyn ChainClient> = Arc::new(chain.clone());
    let watcher = ConfirmationWatcher::new(client.clone(), settings, cancel);
    TransactionExecutor::new(CHAIN, client, sink, watcher, 50_000)
}

pub fn deps_with(
    chain: &MockChain,
    sink: Arc<dyn TransactionSink>,
    pools: Vec<(u64, Pool)>,
) -> ChainDeps {
    ChainDeps {
        client: Arc::new(chain.clone()),
        tokens: Arc::new(tokens()),
        pools: Arc::new(StaticPoolSource::new(pools)),
        sink,
        routers: routers(),
        multicall: MULTICALL,
        confirmation: confirmation(3, 180),
        gas_limit_buffer: 50_000,
    }
}
