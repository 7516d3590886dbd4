// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

mod common;

use std::sync::Arc;

use alloy::primitives::{Address, B256, Bytes};
use alloy::rpc::types::TransactionRequest;
use alloy_sol_types::{SolCall, SolEvent};
use common::*;
use harvest_router::domain::error::AppError;
use harvest_router::domain::types::{OperationUid, PreparedCall};
use harvest_router::infrastructure::data::contracts::{IStrategyMulticall, ILendingFailure};
use harvest_router::infrastructure::data::db::Database;
use harvest_router::infrastructure::network::chain::{LogEntry, ReceiptSummary};
use harvest_router::services::execution::confirmation::ReceiptErrorClassifier;
use harvest_router::services::execution::executor::{SendOutcome, SendRequest};
use harvest_router::services::execution::multicall::{MulticallBatcher, MulticallRequest};
use tokio_util::sync::CancellationToken;

const FROM: Address = Address::repeat_byte(0xee);
const STRATEGY: Address = Address::repeat_byte(0x5a);

fn request(uid: &str, prod_mode: bool, wait_confirmation: bool) -> SendRequest {
    SendRequest {
        transaction: TransactionRequest::default()
            .to(STRATEGY)
            .input(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]).into()),
        method: "harvest".to_string(),
        func: "harvest".to_string(),
        meta: serde_json::json!({"pid": 7}),
        uid: OperationUid::new(uid),
        from: FROM,
        prod_mode,
        wait_confirmation,
        classifier: None,
    }
}

async fn memory_db() -> Database {
    Database::new("sqlite::memory:").await.expect("db")
}

#[tokio::test]
async fn gas_estimation_failure_persists_nothing() {
    let chain = MockChain::default();
    chain.fail_estimate("execution reverted: not harvestable");
    let db = memory_db().await;
    let exec = executor_with(
        &chain,
        Arc::new(db.clone()),
        confirmation(3, 180),
        CancellationToken::new(),
    );

    let err = exec
        .send_transaction(request("gas-fail", true, false))
        .await
        .expect_err("estimation");

    match &err {
        AppError::GasEstimation { method, func, source, .. } => {
            assert_eq!(method, "harvest");
            assert_eq!(func, "harvest");
            assert!(source.to_string().contains("not harvestable"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(chain.sent().is_empty());
    assert_eq!(db.count_transactions().await.expect("count"), 0);
}

#[tokio::test]
async fn successful_send_persists_exactly_one_matching_record() {
    let chain = MockChain::default();
    let db = memory_db().await;
    let exec = executor_with(
        &chain,
        Arc::new(db.clone()),
        confirmation(3, 180),
        CancellationToken::new(),
    );

    let outcome = exec
        .send_transaction(request("sent-once", true, false))
        .await
        .expect("send");
    let SendOutcome::Submitted { hash, record_id } = outcome else {
        panic!("expected a submitted outcome, got {outcome:?}");
    };

    let rows = db
        .transactions_for_uid(&OperationUid::new("sent-once"))
        .await
        .expect("rows");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, record_id);
    assert_eq!(row.tx_hash, format!("{hash:#x}"));
    assert_eq!(row.gas_limit as u64, GAS_ESTIMATE + 50_000);
    assert_eq!(row.nonce as u64, PENDING_NONCE);
    assert_eq!(row.to_address.as_deref(), Some(format!("{STRATEGY:#x}").as_str()));
    assert_eq!(row.meta_json()["pid"], 7);
    assert_eq!(row.status, None);

    let sent = chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].gas, Some(GAS_ESTIMATE + 50_000));
    assert_eq!(sent[0].nonce, Some(PENDING_NONCE));
    assert_eq!(sent[0].from, Some(FROM));
}

#[tokio::test]
async fn dry_run_touches_neither_chain_nor_database() {
    let chain = MockChain::default();
    let db = memory_db().await;
    let exec = executor_with(
        &chain,
        Arc::new(db.clone()),
        confirmation(3, 180),
        CancellationToken::new(),
    );

    let outcome = exec
        .send_transaction(request("dry", false, true))
        .await
        .expect("dry run");

    assert_eq!(outcome, SendOutcome::DryRun);
    assert_eq!(outcome.hash(), None);
    assert_eq!(chain.estimates(), 0);
    assert!(chain.sent().is_empty());
    assert_eq!(db.count_transactions().await.expect("count"), 0);
}

#[tokio::test]
async fn send_failure_is_reported_and_not_persisted() {
    let chain = MockChain::default();
    chain.fail_send("nonce too low");
    let db = memory_db().await;
    let exec = executor_with(
        &chain,
        Arc::new(db.clone()),
        confirmation(3, 180),
        CancellationToken::new(),
    );

    let err = exec
        .send_transaction(request("send-fail", true, false))
        .await
        .expect_err("send");

    assert!(matches!(err, AppError::Send { .. }));
    assert!(err.is_retry_safe());
    assert_eq!(chain.estimates(), 1);
    assert_eq!(db.count_transactions().await.expect("count"), 0);
}

#[tokio::test(start_paused = true)]
async fn confirmed_send_appends_receipt_to_record() {
    let chain = MockChain::new(100);
    chain.advance_on_block_poll(true);
    let sink = MemorySink::default();
    let exec = executor_with(
        &chain,
        Arc::new(sink.clone()),
        confirmation(3, 180),
        CancellationToken::new(),
    );

    let outcome = exec
        .send_transaction(request("confirmed", true, true))
        .await
        .expect("confirmed");

    let SendOutcome::Confirmed { hash, receipt, .. } = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };
    assert_eq!(receipt.hash, hash);
    assert_eq!(receipt.block_number, Some(100));
    assert!(chain.last_block_seen() >= 103);

    let rows = sink.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, Some(true));
    assert_eq!(rows[0].block_number, Some(100));
    assert_eq!(rows[0].gas_used, Some((GAS_ESTIMATE - 10_000) as i64));
}

#[tokio::test(start_paused = true)]
async fn reverted_receipt_is_recorded_then_reported() {
    let chain = MockChain::new(100);
    chain.advance_on_block_poll(true);
    chain.sent_receipt(false, Vec::new());
    let sink = MemorySink::default();
    let exec = executor_with(
        &chain,
        Arc::new(sink.clone()),
        confirmation(3, 180),
        CancellationToken::new(),
    );

    let err = exec
        .send_transaction(request("reverted", true, true))
        .await
        .expect_err("reverted");

    assert!(matches!(err, AppError::Reverted { .. }));
    assert!(!err.is_retry_safe());
    assert_eq!(err.tx_hash().map(|h| format!("{h:#x}")), Some(sink.rows()[0].tx_hash.clone()));
    assert_eq!(sink.rows()[0].status, Some(false));
}

#[tokio::test(start_paused = true)]
async fn failure_event_marks_success_receipt_as_logged_error() {
    let chain = MockChain::new(100);
    chain.advance_on_block_poll(true);
    chain.sent_receipt(
        true,
        vec![LogEntry {
            address: STRATEGY,
            topics: vec![ILendingFailure::Failure::SIGNATURE_HASH],
            data: Bytes::new(),
        }],
    );
    let sink = MemorySink::default();
    let exec = executor_with(
        &chain,
        Arc::new(sink.clone()),
        confirmation(3, 180),
        CancellationToken::new(),
    );

    let err = exec
        .send_transaction(request("logged", true, true))
        .await
        .expect_err("logged error");
    assert!(matches!(err, AppError::LoggedError { .. }));

    let mut lenient = request("logged-lenient", true, true);
    let ignore: Arc<dyn ReceiptErrorClassifier> = Arc::new(|_: &ReceiptSummary| false);
    lenient.classifier = Some(ignore);
    let outcome = exec.send_transaction(lenient).await.expect("override");
    assert!(matches!(outcome, SendOutcome::Confirmed { .. }));
    assert_eq!(sink.rows().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn unmined_transaction_times_out_with_record_kept() {
    let chain = MockChain::new(100);
    chain.advance_on_block_poll(true);
    chain.mine_sent(false);
    let sink = MemorySink::default();
    let exec = executor_with(
        &chain,
        Arc::new(sink.clone()),
        confirmation(3, 30),
        CancellationToken::new(),
    );

    let err = exec
        .send_transaction(request("stuck", true, true))
        .await
        .expect_err("timeout");

    assert!(matches!(err, AppError::ConfirmationTimeout { timeout_ms: 30_000, .. }));
    let rows = sink.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, None);
}

fn strategy_call(func: &str, calldata: Vec<u8>) -> PreparedCall {
    PreparedCall {
        target: STRATEGY,
        calldata: Bytes::from(calldata),
        func: func.to_string(),
        meta: serde_json::json!({"func": func}),
    }
}

fn multicall_request(uid: &str, calls: Vec<PreparedCall>) -> MulticallRequest {
    MulticallRequest {
        calls,
        contract: STRATEGY,
        method: "compound".to_string(),
        uid: OperationUid::new(uid),
        from: FROM,
        prod_mode: true,
        wait_confirmation: false,
        classifier: None,
    }
}

#[tokio::test]
async fn empty_multicall_makes_no_chain_calls() {
    let chain = MockChain::default();
    let sink = MemorySink::default();
    let batcher = MulticallBatcher::new(Arc::new(executor_with(
        &chain,
        Arc::new(sink.clone()),
        confirmation(3, 180),
        CancellationToken::new(),
    )));

    let outcome = batcher
        .send_multicall(multicall_request("empty", Vec::new()))
        .await
        .expect("empty batch");

    assert!(outcome.is_none());
    assert_eq!(chain.estimates(), 0);
    assert!(chain.sent().is_empty());
    assert!(sink.rows().is_empty());
}

#[tokio::test]
async fn multicall_sends_one_transaction_with_aggregated_meta() {
    let chain = MockChain::default();
    let sink = MemorySink::default();
    let batcher = MulticallBatcher::new(Arc::new(executor_with(
        &chain,
        Arc::new(sink.clone()),
        confirmation(3, 180),
        CancellationToken::new(),
    )));

    let outcome = batcher
        .send_multicall(multicall_request(
            "batch",
            vec![
                strategy_call("harvest", vec![1, 1, 1, 1]),
                strategy_call("deposit", vec![2, 2, 2, 2, 2]),
            ],
        ))
        .await
        .expect("batch")
        .expect("outcome");
    assert!(matches!(outcome, SendOutcome::Submitted { .. }));

    let sent = chain.sent();
    assert_eq!(sent.len(), 1);
    let input = sent[0].input.input().cloned().unwrap_or_default();
    let decoded = IStrategyMulticall::multicallCall::abi_decode(&input).expect("multicall input");
    assert_eq!(
        decoded.data,
        vec![Bytes::from(vec![1u8, 1, 1, 1]), Bytes::from(vec![2u8, 2, 2, 2, 2])]
    );

    let rows = sink.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].func, "multicall");
    assert_eq!(rows[0].method, "compound");
    let meta = rows[0].meta_json();
    assert_eq!(meta["multicall"].as_array().map(Vec::len), Some(2));
    assert_eq!(meta["multicall"][1]["func"], "deposit");
    assert_eq!(meta["funcs"], serde_json::json!(["harvest", "deposit"]));
}

#[tokio::test]
async fn multicall_rejects_calls_for_other_contracts() {
    let chain = MockChain::default();
    let sink = MemorySink::default();
    let batcher = MulticallBatcher::new(Arc::new(executor_with(
        &chain,
        Arc::new(sink.clone()),
        confirmation(3, 180),
        CancellationToken::new(),
    )));
    let mut stray = strategy_call("harvest", vec![9]);
    stray.target = Address::repeat_byte(0x77);

    let err = batcher
        .send_multicall(multicall_request("stray", vec![strategy_call("deposit", vec![1]), stray]))
        .await
        .expect_err("stray target");

    assert!(matches!(err, AppError::Multicall { .. }));
    assert!(chain.sent().is_empty());
    assert_eq!(chain.estimates(), 0);
}

#[test]
fn hash_accessor_reads_submitted_and_confirmed() {
    let hash = B256::repeat_byte(3);
    assert_eq!(
        SendOutcome::Submitted { hash, record_id: 1 }.hash(),
        Some(hash)
    );
}
