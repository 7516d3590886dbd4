// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use alloy_sol_types::SolCall;

use crate::domain::error::AppError;
use crate::domain::types::{OperationUid, PreparedCall};
use crate::infrastructure::data::contracts::IStrategyMulticall;
use crate::services::execution::confirmation::ReceiptErrorClassifier;
use crate::services::execution::executor::{SendOutcome, SendRequest, TransactionExecutor};

pub struct MulticallRequest {
    pub calls: Vec<PreparedCall>,
    /// Contract whose `multicall(bytes[])` replays every payload on itself.
    pub contract: Address,
    pub method: String,
    pub uid: OperationUid,
    pub from: Address,
    pub prod_mode: bool,
    pub wait_confirmation: bool,
    pub classifier: Option<Arc<dyn ReceiptErrorClassifier>>,
}

/// Wraps independent calls on one contract into a single `multicall` transaction.
#[derive(Clone)]
pub struct MulticallBatcher {
    executor: Arc<TransactionExecutor>,
}

impl MulticallBatcher {
    pub fn new(executor: Arc<TransactionExecutor>) -> Self {
        Self { executor }
    }

    /// `Ok(None)` when there was nothing to send.
    pub async fn send_multicall(
        &self,
        req: MulticallRequest,
    ) -> Result<Option<SendOutcome>, AppError> {
        if req.calls.is_empty() {
            tracing::info!(
                target: "multicall",
                uid = %req.uid,
                method = %req.method,
                "No calls to batch; skipping"
            );
            return Ok(None);
        }

        if let Some(stray) = req.calls.iter().find(|c| c.target != req.contract) {
            return Err(AppError::Multicall {
                uid: req.uid.clone(),
                reason: format!(
                    "{} targets {:#x}, batch contract is {:#x}",
                    stray.func, stray.target, req.contract
                ),
            });
        }

        let payloads: Vec<Bytes> = req.calls.iter().map(|c| c.calldata.clone()).collect();
        let funcs: Vec<&str> = req.calls.iter().map(|c| c.func.as_str()).collect();
        let meta = serde_json::json!({
            "multicall": req.calls.iter().map(|c| c.meta.clone()).collect::<Vec<_>>(),
            "funcs": funcs,
        });

        let encoded = IStrategyMulticall::multicallCall { data: payloads }.abi_encode();
        let transaction = TransactionRequest::default()
            .to(req.contract)
            .input(Bytes::from(encoded).into());

        tracing::debug!(
            target: "multicall",
            uid = %req.uid,
            method = %req.method,
            calls = req.calls.len(),
            contract = %format!("{:#x}", req.contract),
            "Batching calls"
        );

        let outcome = self
            .executor
            .send_transaction(SendRequest {
                transaction,
                method: req.method,
                func: "multicall".to_string(),
                meta,
                uid: req.uid,
                from: req.from,
                prod_mode: req.prod_mode,
                wait_confirmation: req.wait_confirmation,
                classifier: req.classifier,
            })
            .await?;
        Ok(Some(outcome))
    }
}
