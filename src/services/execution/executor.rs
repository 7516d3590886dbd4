// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{Address, B256, Bytes};
use alloy::rpc::types::TransactionRequest;

use crate::domain::error::AppError;
use crate::domain::types::OperationUid;
use crate::infrastructure::data::db::TransactionSink;
use crate::infrastructure::data::schema::{ConfirmationUpdate, NewTransactionRecord};
use crate::infrastructure::network::chain::{ChainClient, ReceiptSummary};
use crate::services::execution::confirmation::{
    ConfirmationWatcher, FailureEventClassifier, ReceiptErrorClassifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Built,
    GasEstimated,
    Sent,
    Persisted,
    Confirming,
    Done,
    Failed,
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionState::Built => "BUILT",
            ExecutionState::GasEstimated => "GAS_ESTIMATED",
            ExecutionState::Sent => "SENT",
            ExecutionState::Persisted => "PERSISTED",
            ExecutionState::Confirming => "CONFIRMING",
            ExecutionState::Done => "DONE",
            ExecutionState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

pub struct SendRequest {
    pub transaction: TransactionRequest,
    /// Logical operation, e.g. `harvest` or `swap`.
    pub method: String,
    /// Contract function invoked by the transaction.
    pub func: String,
    pub meta: serde_json::Value,
    pub uid: OperationUid,
    pub from: Address,
    /// `false` runs the pipeline as a dry-run: nothing is sent or persisted.
    pub prod_mode: bool,
    pub wait_confirmation: bool,
    /// Overrides the executor's default receipt classifier.
    pub classifier: Option<Arc<dyn ReceiptErrorClassifier>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    DryRun,
    Submitted {
        hash: B256,
        record_id: i64,
    },
    Confirmed {
        hash: B256,
        record_id: i64,
        receipt: ReceiptSummary,
    },
}

impl SendOutcome {
    pub fn hash(&self) -> Option<B256> {
        match self {
            SendOutcome::DryRun => None,
            SendOutcome::Submitted { hash, .. } | SendOutcome::Confirmed { hash, .. } => {
                Some(*hash)
            }
        }
    }
}

/// Estimates, signs, sends, persists and optionally confirms one transaction.
///
/// Nonces come from the account's pending transaction count and are not
/// locked. Callers must serialize sends per account.
pub struct TransactionExecutor {
    chain_id: u64,
    client: Arc<dyn ChainClient>,
    sink: Arc<dyn TransactionSink>,
    watcher: ConfirmationWatcher,
    gas_limit_buffer: u64,
    default_classifier: Arc<dyn ReceiptErrorClassifier>,
}

fn transition(uid: &OperationUid, state: &mut ExecutionState, next: ExecutionState) {
    tracing::debug!(target: "executor", uid = %uid, from = %state, to = %next, "State transition");
    *state = next;
}

fn calldata(tx: &TransactionRequest) -> Bytes {
    tx.input.input().cloned().unwrap_or_default()
}

fn target(tx: &TransactionRequest) -> Option<Address> {
    tx.to.as_ref().and_then(|kind| kind.to().copied())
}

impl TransactionExecutor {
    pub fn new(
        chain_id: u64,
        client: Arc<dyn ChainClient>,
        sink: Arc<dyn TransactionSink>,
        watcher: ConfirmationWatcher,
        gas_limit_buffer: u64,
    ) -> Self {
        Self {
            chain_id,
            client,
            sink,
            watcher,
            gas_limit_buffer,
            default_classifier: Arc::new(FailureEventClassifier),
        }
    }

    pub fn with_default_classifier(mut self, classifier: Arc<dyn ReceiptErrorClassifier>) -> Self {
        self.default_classifier = classifier;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub async fn send_transaction(&self, req: SendRequest) -> Result<SendOutcome, AppError> {
        let mut state = ExecutionState::Built;
        let uid = req.uid.clone();
        let to = target(&req.transaction);
        let input = calldata(&req.transaction);

        if !req.prod_mode {
            tracing::info!(
                target: "executor",
                uid = %uid,
                method = %req.method,
                func = %req.func,
                from = %format!("{:#x}", req.from),
                to = ?to,
                calldata = %input,
                meta = %req.meta,
                "Dry-run: transaction not sent"
            );
            return Ok(SendOutcome::DryRun);
        }

        let tx = req.transaction.clone().from(req.from);

        let estimated = match self.client.estimate_gas(tx.clone()).await {
            Ok(gas) => gas,
            Err(e) => {
                transition(&uid, &mut state, ExecutionState::Failed);
                tracing::warn!(
                    target: "executor",
                    uid = %uid,
                    method = %req.method,
                    func = %req.func,
                    to = ?to,
                    error = %e,
                    "Gas estimation failed"
                );
                return Err(AppError::GasEstimation {
                    uid,
                    method: req.method,
                    func: req.func,
                    source: Box::new(e),
                });
            }
        };

        let prepared = async {
            let nonce = self.client.pending_nonce(req.from).await?;
            let gas_price = self.client.gas_price().await?;
            Ok::<_, AppError>((nonce, gas_price))
        }
        .await;
        let (nonce, gas_price) = match prepared {
            Ok(v) => v,
            Err(e) => {
                transition(&uid, &mut state, ExecutionState::Failed);
                return Err(AppError::Send {
                    uid,
                    method: req.method,
                    func: req.func,
                    source: Box::new(e),
                });
            }
        };
        let gas_limit = estimated.saturating_add(self.gas_limit_buffer);
        let tx = tx.gas_limit(gas_limit).nonce(nonce).gas_price(gas_price);
        transition(&uid, &mut state, ExecutionState::GasEstimated);

        let hash = match self.client.send_transaction(tx).await {
            Ok(hash) => hash,
            Err(e) => {
                transition(&uid, &mut state, ExecutionState::Failed);
                tracing::error!(
                    target: "executor",
                    uid = %uid,
                    chain_id = self.chain_id,
                    method = %req.method,
                    func = %req.func,
                    to = ?to,
                    from = %format!("{:#x}", req.from),
                    nonce,
                    gas_limit,
                    gas_price,
                    calldata = %input,
                    meta = %req.meta,
                    error = %e,
                    "Send failed"
                );
                return Err(AppError::Send {
                    uid,
                    method: req.method,
                    func: req.func,
                    source: Box::new(e),
                });
            }
        };
        transition(&uid, &mut state, ExecutionState::Sent);
        tracing::info!(
            target: "executor",
            uid = %uid,
            hash = %format!("{hash:#x}"),
            method = %req.method,
            func = %req.func,
            nonce,
            gas_limit,
            "Transaction sent"
        );

        let record = match self
            .sink
            .save_transaction(NewTransactionRecord {
                uid: uid.clone(),
                chain_id: self.chain_id,
                method: req.method.clone(),
                func: req.func.clone(),
                meta: req.meta.clone(),
                tx_hash: hash,
                from: req.from,
                to,
                nonce,
                gas_limit,
                gas_price_wei: gas_price,
            })
            .await
        {
            Ok(record) => record,
            Err(e) => {
                transition(&uid, &mut state, ExecutionState::Failed);
                tracing::error!(target: "executor", uid = %uid, hash = %format!("{hash:#x}"), error = %e, "Failed to persist sent transaction");
                return Err(e);
            }
        };
        transition(&uid, &mut state, ExecutionState::Persisted);

        if !req.wait_confirmation {
            transition(&uid, &mut state, ExecutionState::Done);
            return Ok(SendOutcome::Submitted {
                hash,
                record_id: record.id,
            });
        }

        transition(&uid, &mut state, ExecutionState::Confirming);
        let receipt = match self.watcher.wait_for_depth(hash, &uid).await {
            Ok(receipt) => receipt,
            Err(e) => {
                transition(&uid, &mut state, ExecutionState::Failed);
                return Err(e);
            }
        };

        self.sink
            .record_confirmation(
                &uid,
                hash,
                ConfirmationUpdate {
                    block_number: receipt.block_number.unwrap_or_default(),
                    gas_used: receipt.gas_used,
                    effective_gas_price: receipt.effective_gas_price,
                    status: receipt.status,
                },
            )
            .await
            .inspect_err(|_| transition(&uid, &mut state, ExecutionState::Failed))?;

        let classifier = req
            .classifier
            .as_deref()
            .unwrap_or(self.default_classifier.as_ref());
        if let Err(e) = ConfirmationWatcher::classify(&receipt, &uid, classifier) {
            transition(&uid, &mut state, ExecutionState::Failed);
            tracing::warn!(target: "executor", uid = %uid, error = %e, "Transaction failed on chain");
            return Err(e);
        }

        transition(&uid, &mut state, ExecutionState::Done);
        tracing::info!(
            target: "executor",
            uid = %uid,
            hash = %format!("{hash:#x}"),
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(SendOutcome::Confirmed {
            hash,
            record_id: record.id,
            receipt,
        })
    }
}
