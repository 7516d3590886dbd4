// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::error::AppError;
use crate::domain::types::{Platform, Pool};

/// Source of AMM pairs. Called once per routing request; implementations must
/// return the current registry state, not a snapshot held by the caller.
#[async_trait]
pub trait PoolSource: Send + Sync {
    async fn list_pools(&self, chain_id: u64, platform: Platform) -> Result<Vec<Pool>, AppError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolEntry {
    platform: Platform,
    chain_id: u64,
    token0: Address,
    token1: Address,
    address: Address,
    #[serde(default)]
    pool_id: Option<u64>,
}

fn parse_entries(raw: &str) -> Result<Vec<PoolEntry>, serde_json::Error> {
    serde_json::from_str(raw)
}

fn select(entries: Vec<PoolEntry>, chain_id: u64, platform: Platform) -> Vec<Pool> {
    entries
        .into_iter()
        .filter(|e| e.chain_id == chain_id && e.platform == platform)
        .filter(|e| e.token0 != e.token1)
        .map(|e| Pool {
            platform: e.platform,
            token0: e.token0,
            token1: e.token1,
            address: e.address,
            pool_id: e.pool_id,
        })
        .collect()
}

/// Pool list kept in a JSON file; re-read on every request so edits to the
/// registry are picked up without a restart.
#[derive(Debug, Clone)]
pub struct FilePoolSource {
    path: String,
}

impl FilePoolSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PoolSource for FilePoolSource {
    async fn list_pools(&self, chain_id: u64, platform: Platform) -> Result<Vec<Pool>, AppError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| AppError::Config(format!("Failed to read pools {}: {e}", self.path)))?;
        let entries = parse_entries(&raw)
            .map_err(|e| AppError::Config(format!("Invalid pools JSON {}: {e}", self.path)))?;
        Ok(select(entries, chain_id, platform))
    }
}

/// In-memory pool registry.
#[derive(Debug, Clone, Default)]
pub struct StaticPoolSource {
    pools: Vec<(u64, Pool)>,
}

impl StaticPoolSource {
    pub fn new(pools: Vec<(u64, Pool)>) -> Self {
        Self { pools }
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let entries =
            parse_entries(raw).map_err(|e| AppError::Config(format!("Invalid pools JSON: {e}")))?;
        let pools = entries
            .into_iter()
            .map(|e| {
                (
                    e.chain_id,
                    Pool {
                        platform: e.platform,
                        token0: e.token0,
                        token1: e.token1,
                        address: e.address,
                        pool_id: e.pool_id,
                    },
                )
            })
            .collect();
        Ok(Self { pools })
    }
}

#[async_trait]
impl PoolSource for StaticPoolSource {
    async fn list_pools(&self, chain_id: u64, platform: Platform) -> Result<Vec<Pool>, AppError> {
        Ok(self
            .pools
            .iter()
            .filter(|(chain, p)| *chain == chain_id && p.platform == platform)
            .map(|(_, p)| p.clone())
            .collect())
    }
}
