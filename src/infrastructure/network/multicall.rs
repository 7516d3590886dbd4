// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use alloy_sol_types::SolCall;

use crate::domain::error::AppError;
use crate::domain::types::OperationUid;
use crate::infrastructure::data::contracts::IMulticall3;
use crate::infrastructure::network::chain::ChainClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCall {
    pub target: Address,
    pub call_data: Bytes,
}

/// Read-only batching through Multicall3 `aggregate3`. Every sub-call is
/// executed inside one `eth_call`, so all results share one block state.
#[derive(Clone)]
pub struct MulticallReader {
    client: Arc<dyn ChainClient>,
    address: Address,
}

impl MulticallReader {
    pub fn new(client: Arc<dyn ChainClient>, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns one entry per input call; `None` marks a sub-call that reverted.
    pub async fn aggregate(
        &self,
        calls: &[BatchCall],
        block: u64,
        uid: &OperationUid,
    ) -> Result<Vec<Option<Bytes>>, AppError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let encoded = IMulticall3::aggregate3Call {
            calls: calls
                .iter()
                .map(|c| IMulticall3::Call3 {
                    target: c.target,
                    allowFailure: true,
                    callData: c.call_data.clone(),
                })
                .collect(),
        }
        .abi_encode();

        let tx = TransactionRequest::default()
            .to(self.address)
            .input(Bytes::from(encoded).into());

        let raw = self
            .client
            .call(tx, block)
            .await
            .map_err(|e| AppError::Multicall {
                uid: uid.clone(),
                reason: format!("aggregate3 at block {block}: {e}"),
            })?;

        let results = IMulticall3::aggregate3Call::abi_decode_returns(&raw).map_err(|e| {
            AppError::Multicall {
                uid: uid.clone(),
                reason: format!("aggregate3 decode: {e}"),
            }
        })?;

        if results.len() != calls.len() {
            return Err(AppError::Multicall {
                uid: uid.clone(),
                reason: format!(
                    "aggregate3 returned {} results for {} calls",
                    results.len(),
                    calls.len()
                ),
            });
        }

        tracing::trace!(
            target: "multicall",
            uid = %uid,
            block,
            calls = calls.len(),
            failed = results.iter().filter(|r| !r.success).count(),
            "aggregate3 read"
        );

        Ok(results
            .into_iter()
            .map(|r| r.success.then_some(r.returnData))
            .collect())
    }
}
