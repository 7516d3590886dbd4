// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::cmp::Ordering;
use std::sync::Arc;

use alloy::primitives::U256;
use futures::future::try_join_all;

use crate::domain::error::AppError;
use crate::domain::types::{OperationUid, Platform, QuoteResult, Token, TradePath};
use crate::infrastructure::data::token_manager::TokenRegistry;
use crate::infrastructure::network::chain::ChainClient;
use crate::infrastructure::network::multicall::{BatchCall, MulticallReader};
use crate::services::routing::discovery::PairDiscovery;
use crate::services::routing::platforms::{PlatformTable, QuoteError};

/// Input of a routing request. `amount` is in base units of `token_in`
/// (forward) or `token_out` (reverse).
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub token_in: String,
    pub token_out: String,
    pub amount: U256,
    pub platform: Option<Platform>,
    pub reverse: bool,
    pub chain_id: u64,
    /// Caller only displays the price. Selection is unchanged.
    pub just_price: bool,
    pub uid: OperationUid,
}

#[derive(Debug, Clone)]
struct Priced {
    path: TradePath,
    amount_in: U256,
    amount_out: U256,
}

/// Forward maximizes output, reverse minimizes input. Ties go to the shorter
/// path, then to the higher-priority platform.
fn compare(a: &Priced, b: &Priced, reverse: bool) -> Ordering {
    let by_amount = if reverse {
        b.amount_in.cmp(&a.amount_in)
    } else {
        a.amount_out.cmp(&b.amount_out)
    };
    by_amount
        .then_with(|| b.path.len().cmp(&a.path.len()))
        .then_with(|| b.path.platform().priority().cmp(&a.path.platform().priority()))
}

/// Picks the best candidate; on a full tie the earlier candidate stays.
fn select_best(priced: Vec<Priced>, reverse: bool) -> Option<Priced> {
    let mut best: Option<Priced> = None;
    for candidate in priced {
        let better = match &best {
            Some(current) => compare(&candidate, current, reverse) == Ordering::Greater,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

pub struct TradeRouter {
    tokens: Arc<dyn TokenRegistry>,
    discovery: PairDiscovery,
    platforms: PlatformTable,
    reader: MulticallReader,
    client: Arc<dyn ChainClient>,
}

impl TradeRouter {
    pub fn new(
        tokens: Arc<dyn TokenRegistry>,
        discovery: PairDiscovery,
        platforms: PlatformTable,
        reader: MulticallReader,
        client: Arc<dyn ChainClient>,
    ) -> Self {
        Self {
            tokens,
            discovery,
            platforms,
            reader,
            client,
        }
    }

    pub fn platforms(&self) -> &PlatformTable {
        &self.platforms
    }

    pub fn resolve_token(
        &self,
        symbol: &str,
        chain_id: u64,
        uid: &OperationUid,
    ) -> Result<Token, AppError> {
        self.tokens
            .resolve(symbol, chain_id)
            .ok_or_else(|| AppError::InvalidToken {
                uid: uid.clone(),
                symbol: symbol.to_string(),
                chain_id,
            })
    }

    fn no_path(&self, req: &RouteRequest) -> AppError {
        AppError::NoProfitablePath {
            uid: req.uid.clone(),
            token_in: req.token_in.clone(),
            token_out: req.token_out.clone(),
            amount: req.amount,
        }
    }

    /// Finds and prices the best path for `req`. All candidates are quoted in
    /// a single batched read pinned to one block.
    pub async fn get_profit_trade(&self, req: &RouteRequest) -> Result<QuoteResult, AppError> {
        let token_in = self.resolve_token(&req.token_in, req.chain_id, &req.uid)?;
        let token_out = self.resolve_token(&req.token_out, req.chain_id, &req.uid)?;

        if req.amount.is_zero() {
            return Err(AppError::Validation {
                field: "amount".into(),
                message: format!("[{}] amount must be positive", req.uid),
            });
        }
        if token_in.address == token_out.address {
            return Err(self.no_path(req));
        }

        let platforms = match req.platform {
            Some(p) if self.platforms.get(p).is_none() => {
                return Err(AppError::UnsupportedPlatform {
                    uid: req.uid.clone(),
                    platform: p.to_string(),
                    chain_id: req.chain_id,
                });
            }
            Some(p) => vec![p],
            None => self.platforms.platforms(),
        };

        let per_platform = try_join_all(platforms.iter().map(|platform| {
            self.discovery.candidate_paths(
                token_in.address,
                token_out.address,
                *platform,
                req.chain_id,
            )
        }))
        .await?;
        let candidates: Vec<TradePath> = per_platform.into_iter().flatten().collect();
        if candidates.is_empty() {
            tracing::warn!(
                target: "router",
                uid = %req.uid,
                token_in = %token_in.symbol,
                token_out = %token_out.symbol,
                "No candidate paths"
            );
            return Err(self.no_path(req));
        }

        let mut calls = Vec::with_capacity(candidates.len());
        for path in &candidates {
            let Some(adapter) = self.platforms.get(path.platform()) else {
                return Err(AppError::UnsupportedPlatform {
                    uid: req.uid.clone(),
                    platform: path.platform().to_string(),
                    chain_id: req.chain_id,
                });
            };
            calls.push(BatchCall {
                target: adapter.router(),
                call_data: adapter.encode_quote(path, req.amount, req.reverse),
            });
        }

        let block = self.client.block_number().await?;
        let results = self.reader.aggregate(&calls, block, &req.uid).await?;

        let mut priced = Vec::with_capacity(candidates.len());
        for (path, result) in candidates.into_iter().zip(results) {
            let Some(data) = result else {
                tracing::debug!(
                    target: "router",
                    uid = %req.uid,
                    platform = %path.platform(),
                    hops = path.len(),
                    "Quote call reverted"
                );
                continue;
            };
            let Some(adapter) = self.platforms.get(path.platform()) else {
                continue;
            };
            match adapter.decode_quote(&path, &data) {
                Ok((amount_in, amount_out)) if amount_in.is_zero() || amount_out.is_zero() => {
                    tracing::debug!(
                        target: "router",
                        uid = %req.uid,
                        platform = %path.platform(),
                        "Zero quote discarded"
                    );
                }
                Ok((amount_in, amount_out)) => priced.push(Priced {
                    path,
                    amount_in,
                    amount_out,
                }),
                Err(QuoteError::Undecodable(reason)) => {
                    tracing::debug!(
                        target: "router",
                        uid = %req.uid,
                        platform = %path.platform(),
                        %reason,
                        "Quote return undecodable"
                    );
                }
                Err(QuoteError::Incomparable(reason)) => {
                    return Err(AppError::IncomparableQuotes {
                        uid: req.uid.clone(),
                        reason,
                    });
                }
            }
        }

        let quoted = priced.len();
        let Some(best) = select_best(priced, req.reverse) else {
            tracing::warn!(
                target: "router",
                uid = %req.uid,
                block,
                "Every quote failed"
            );
            return Err(self.no_path(req));
        };

        tracing::info!(
            target: "router",
            uid = %req.uid,
            platform = %best.path.platform(),
            hops = best.path.len(),
            amount_in = %token_in.format_units(best.amount_in),
            amount_out = %token_out.format_units(best.amount_out),
            block,
            quoted,
            reverse = req.reverse,
            just_price = req.just_price,
            "Best path selected"
        );

        Ok(QuoteResult {
            path: best.path,
            amount_in: best.amount_in,
            amount_out: best.amount_out,
            block_number: block,
        })
    }
}
