// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{B256, U256};
use thiserror::Error;

use crate::domain::types::OperationUid;

/// Coarse error family, used by schedulers to pick a retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Routing,
    Execution,
    Infra,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Address {0} is invalid or not checksummed")]
    InvalidAddress(String),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("RPC {method} failed: {message}")]
    Rpc { method: &'static str, message: String },

    #[error("[{uid}] invalid token {symbol} on chain {chain_id}")]
    InvalidToken {
        uid: OperationUid,
        symbol: String,
        chain_id: u64,
    },

    #[error("[{uid}] platform {platform} is not configured on chain {chain_id}")]
    UnsupportedPlatform {
        uid: OperationUid,
        platform: String,
        chain_id: u64,
    },

    #[error("[{uid}] no profitable path {token_in} -> {token_out} for amount {amount}")]
    NoProfitablePath {
        uid: OperationUid,
        token_in: String,
        token_out: String,
        amount: U256,
    },

    #[error("[{uid}] quotes cannot be compared: {reason}")]
    IncomparableQuotes { uid: OperationUid, reason: String },

    #[error("[{uid}] gas estimation failed for {method}.{func}: {source}")]
    GasEstimation {
        uid: OperationUid,
        method: String,
        func: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("[{uid}] send failed for {method}.{func}: {source}")]
    Send {
        uid: OperationUid,
        method: String,
        func: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("[{uid}] transaction reverted: {hash:#x}")]
    Reverted { uid: OperationUid, hash: B256 },

    #[error("[{uid}] transaction {hash:#x} succeeded but logged an error event")]
    LoggedError { uid: OperationUid, hash: B256 },

    #[error("[{uid}] confirmation timeout after {timeout_ms}ms for {hash:#x}")]
    ConfirmationTimeout {
        uid: OperationUid,
        hash: B256,
        timeout_ms: u64,
    },

    #[error("[{uid}] confirmation wait cancelled for {hash:#x}")]
    Cancelled { uid: OperationUid, hash: B256 },

    #[error("[{uid}] multicall failed: {reason}")]
    Multicall { uid: OperationUid, reason: String },

    #[error("[{uid}] failed to persist {hash:#x}: {reason}")]
    Persistence {
        uid: OperationUid,
        hash: B256,
        reason: String,
    },

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) | AppError::InvalidAddress(_) => ErrorKind::Config,
            AppError::Validation { .. }
            | AppError::InvalidToken { .. }
            | AppError::UnsupportedPlatform { .. }
            | AppError::NoProfitablePath { .. }
            | AppError::IncomparableQuotes { .. } => ErrorKind::Routing,
            AppError::GasEstimation { .. }
            | AppError::Send { .. }
            | AppError::Reverted { .. }
            | AppError::LoggedError { .. }
            | AppError::ConfirmationTimeout { .. }
            | AppError::Cancelled { .. } => ErrorKind::Execution,
            AppError::Initialization(_)
            | AppError::Connection(_)
            | AppError::Rpc { .. }
            | AppError::Multicall { .. }
            | AppError::Persistence { .. }
            | AppError::Unknown(_) => ErrorKind::Infra,
        }
    }

    /// Whether a caller may resubmit the same operation without inspecting chain state.
    ///
    /// A timed-out transaction may still land, so callers retrying after
    /// `ConfirmationTimeout` must re-read the pending nonce first.
    pub fn is_retry_safe(&self) -> bool {
        match self {
            AppError::Connection(_) | AppError::Rpc { .. } => true,
            AppError::ConfirmationTimeout { .. } | AppError::Cancelled { .. } => true,
            AppError::Send { source, .. } => source.is_retry_safe(),
            AppError::Multicall { .. } => true,
            _ => false,
        }
    }

    pub fn uid(&self) -> Option<&OperationUid> {
        match self {
            AppError::InvalidToken { uid, .. }
            | AppError::UnsupportedPlatform { uid, .. }
            | AppError::NoProfitablePath { uid, .. }
            | AppError::IncomparableQuotes { uid, .. }
            | AppError::GasEstimation { uid, .. }
            | AppError::Send { uid, .. }
            | AppError::Reverted { uid, .. }
            | AppError::LoggedError { uid, .. }
            | AppError::ConfirmationTimeout { uid, .. }
            | AppError::Cancelled { uid, .. }
            | AppError::Multicall { uid, .. }
            | AppError::Persistence { uid, .. } => Some(uid),
            _ => None,
        }
    }

    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            AppError::Reverted { hash, .. }
            | AppError::LoggedError { hash, .. }
            | AppError::ConfirmationTimeout { hash, .. }
            | AppError::Cancelled { hash, .. }
            | AppError::Persistence { hash, .. } => Some(*hash),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
