// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::collections::HashSet;
use std::sync::Arc;

use alloy::primitives::Address;

use crate::domain::error::AppError;
use crate::domain::types::{Platform, Pool, TradePath};
use crate::infrastructure::data::pool_registry::PoolSource;

/// Enumerates pools connecting two tokens. Every call reads the pool source
/// afresh; nothing is cached between requests.
#[derive(Clone)]
pub struct PairDiscovery {
    source: Arc<dyn PoolSource>,
}

fn direct_in(pools: &[Pool], token_a: Address, token_b: Address) -> Option<Pool> {
    pools.iter().find(|p| p.connects(token_a, token_b)).cloned()
}

fn intermediates_in(pools: &[Pool], token_a: Address, token_b: Address) -> Vec<(Pool, Pool)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for first in pools.iter().filter(|p| p.contains(token_a)) {
        let Some(mid) = first.other(token_a) else {
            continue;
        };
        if mid == token_b || mid == token_a || !seen.insert(mid) {
            continue;
        }
        if let Some(second) = pools.iter().find(|p| p.connects(mid, token_b)) {
            out.push((first.clone(), second.clone()));
        }
    }
    out
}

impl PairDiscovery {
    pub fn new(source: Arc<dyn PoolSource>) -> Self {
        Self { source }
    }

    /// The pool trading `token_a` against `token_b` on `platform`, if any.
    pub async fn find_direct_pool(
        &self,
        token_a: Address,
        token_b: Address,
        platform: Platform,
        chain_id: u64,
    ) -> Result<Option<Pool>, AppError> {
        let pools = self.source.list_pools(chain_id, platform).await?;
        Ok(direct_in(&pools, token_a, token_b))
    }

    /// Pool pairs `(token_a/mid, mid/token_b)` for every intermediate token
    /// `mid`. Both pools of a pair sit on the same platform. With no platform
    /// given, every platform in priority order is searched. Never fails for
    /// lack of candidates; an empty vector is a valid answer.
    pub async fn find_common_intermediate_pools(
        &self,
        token_a: Address,
        token_b: Address,
        platform: Option<Platform>,
        chain_id: u64,
    ) -> Result<Vec<(Pool, Pool)>, AppError> {
        let platforms = match platform {
            Some(p) => vec![p],
            None => Platform::PRIORITY.to_vec(),
        };
        let mut out = Vec::new();
        for platform in platforms {
            let pools = self.source.list_pools(chain_id, platform).await?;
            out.extend(intermediates_in(&pools, token_a, token_b));
        }
        Ok(out)
    }

    /// Candidate paths on one platform: the direct hop first, then each
    /// intermediate route in registry order. Reads the pool list once so
    /// both kinds come from the same snapshot.
    pub async fn candidate_paths(
        &self,
        token_in: Address,
        token_out: Address,
        platform: Platform,
        chain_id: u64,
    ) -> Result<Vec<TradePath>, AppError> {
        let pools = self.source.list_pools(chain_id, platform).await?;
        let mut paths = Vec::new();

        if let Some(pool) = direct_in(&pools, token_in, token_out)
            && let Some(path) = TradePath::direct(&pool, token_in, token_out)
        {
            paths.push(path);
        }
        for (first, second) in intermediates_in(&pools, token_in, token_out) {
            if let Some(path) = TradePath::via(&first, &second, token_in, token_out) {
                paths.push(path);
            }
        }

        tracing::debug!(
            target: "discovery",
            %platform,
            chain_id,
            pools = pools.len(),
            candidates = paths.len(),
            "Candidate paths built"
        );
        Ok(paths)
    }
}
