// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::B256;
use alloy_sol_types::SolEvent;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::error::AppError;
use crate::domain::types::OperationUid;
use crate::infrastructure::data::contracts::ILendingFailure;
use crate::infrastructure::network::chain::{ChainClient, ReceiptSummary};

/// Per-chain confirmation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationSettings {
    pub timeout: Duration,
    pub blocks: u64,
    pub poll: Duration,
}

/// Detects soft failures in receipts whose status is success.
pub trait ReceiptErrorClassifier: Send + Sync {
    fn has_errors(&self, receipt: &ReceiptSummary) -> bool;
}

impl<F> ReceiptErrorClassifier for F
where
    F: Fn(&ReceiptSummary) -> bool + Send + Sync,
{
    fn has_errors(&self, receipt: &ReceiptSummary) -> bool {
        self(receipt)
    }
}

/// Flags receipts carrying a `Failure(uint256,uint256,uint256)` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureEventClassifier;

impl ReceiptErrorClassifier for FailureEventClassifier {
    fn has_errors(&self, receipt: &ReceiptSummary) -> bool {
        receipt
            .logs
            .iter()
            .any(|log| log.topics.first() == Some(&ILendingFailure::Failure::SIGNATURE_HASH))
    }
}

#[derive(Clone)]
pub struct ConfirmationWatcher {
    client: Arc<dyn ChainClient>,
    settings: ConfirmationSettings,
    cancel: CancellationToken,
}

impl ConfirmationWatcher {
    pub fn new(
        client: Arc<dyn ChainClient>,
        settings: ConfirmationSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            settings,
            cancel,
        }
    }

    pub fn settings(&self) -> ConfirmationSettings {
        self.settings
    }

    /// Waits for the receipt and the configured depth, then classifies it.
    pub async fn wait(
        &self,
        hash: B256,
        uid: &OperationUid,
        classifier: &dyn ReceiptErrorClassifier,
    ) -> Result<ReceiptSummary, AppError> {
        let receipt = self.wait_for_depth(hash, uid).await?;
        Self::classify(&receipt, uid, classifier)?;
        Ok(receipt)
    }

    /// Resolves once `current_block >= receipt_block + blocks`. The poll
    /// loop, its interval and the deadline all live inside one `select!`,
    /// so every exit path drops them together.
    pub async fn wait_for_depth(
        &self,
        hash: B256,
        uid: &OperationUid,
    ) -> Result<ReceiptSummary, AppError> {
        let deadline = tokio::time::sleep(self.settings.timeout);
        tokio::pin!(deadline);

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::warn!(target: "confirmation", uid = %uid, hash = %format!("{hash:#x}"), "Confirmation wait cancelled");
                Err(AppError::Cancelled { uid: uid.clone(), hash })
            }
            _ = &mut deadline => {
                tracing::warn!(
                    target: "confirmation",
                    uid = %uid,
                    hash = %format!("{hash:#x}"),
                    timeout_ms = self.settings.timeout.as_millis() as u64,
                    "Confirmation timed out"
                );
                Err(AppError::ConfirmationTimeout {
                    uid: uid.clone(),
                    hash,
                    timeout_ms: self.settings.timeout.as_millis() as u64,
                })
            }
            receipt = self.poll_until_deep(hash, uid) => Ok(receipt),
        }
    }

    async fn poll_until_deep(&self, hash: B256, uid: &OperationUid) -> ReceiptSummary {
        let mut ticker = tokio::time::interval(self.settings.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let receipt = match self.client.transaction_receipt(hash).await {
                Ok(Some(receipt)) => receipt,
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(target: "confirmation", uid = %uid, error = %e, "Receipt poll failed");
                    continue;
                }
            };
            let Some(mined_at) = receipt.block_number else {
                continue;
            };
            let current = match self.client.block_number().await {
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(target: "confirmation", uid = %uid, error = %e, "Block poll failed");
                    continue;
                }
            };

            if current >= mined_at.saturating_add(self.settings.blocks) {
                tracing::debug!(
                    target: "confirmation",
                    uid = %uid,
                    block = mined_at,
                    current,
                    "Confirmation depth reached"
                );
                return receipt;
            }
            tracing::trace!(
                target: "confirmation",
                uid = %uid,
                depth = current.saturating_sub(mined_at),
                required = self.settings.blocks,
                "Waiting for depth"
            );
        }
    }

    pub fn classify(
        receipt: &ReceiptSummary,
        uid: &OperationUid,
        classifier: &dyn ReceiptErrorClassifier,
    ) -> Result<(), AppError> {
        if !receipt.status {
            return Err(AppError::Reverted {
                uid: uid.clone(),
                hash: receipt.hash,
            });
        }
        if classifier.has_errors(receipt) {
            return Err(AppError::LoggedError {
                uid: uid.clone(),
                hash: receipt.hash,
            });
        }
        Ok(())
    }
}
