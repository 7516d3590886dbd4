// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::AppError;

/// Correlation id threading one logical operation through quotes, sends and records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationUid(String);

impl OperationUid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supported AMM platforms, declared in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Pancake,
    Apeswap,
    Biswap,
}

impl Platform {
    pub const PRIORITY: [Platform; 3] = [Platform::Pancake, Platform::Apeswap, Platform::Biswap];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Pancake => "pancake",
            Platform::Apeswap => "apeswap",
            Platform::Biswap => "biswap",
        }
    }

    /// Position in the fixed priority order; lower wins ties.
    pub fn priority(&self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|p| p == self)
            .unwrap_or(usize::MAX)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pancake" | "pancakeswap" => Ok(Platform::Pancake),
            "apeswap" | "ape" => Ok(Platform::Apeswap),
            "biswap" => Ok(Platform::Biswap),
            other => Err(AppError::Config(format!("Unknown platform '{other}'"))),
        }
    }
}

/// Resolved token. Immutable once produced by the token registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    pub chain_id: u64,
}

impl Token {
    /// Converts a human amount (e.g. "11.5") to base units using this token's decimals.
    pub fn to_base_units(&self, human: &str) -> Result<U256, AppError> {
        let parsed = parse_units(human.trim(), self.decimals).map_err(|e| AppError::Validation {
            field: "amount".into(),
            message: format!("{human} is not a valid {} amount: {e}", self.symbol),
        })?;
        if parsed.is_negative() {
            return Err(AppError::Validation {
                field: "amount".into(),
                message: format!("{human} is negative"),
            });
        }
        Ok(parsed.get_absolute())
    }

    pub fn format_units(&self, amount: U256) -> String {
        format_units(amount, self.decimals).unwrap_or_else(|_| amount.to_string())
    }
}

/// Snapshot of one AMM pair, valid only for the routing request that fetched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pool {
    pub platform: Platform,
    pub token0: Address,
    pub token1: Address,
    pub address: Address,
    /// Farm pool index, when the pair is staked in a farm.
    pub pool_id: Option<u64>,
}

impl Pool {
    pub fn contains(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }

    pub fn connects(&self, a: Address, b: Address) -> bool {
        (self.token0 == a && self.token1 == b) || (self.token0 == b && self.token1 == a)
    }

    /// The token on the other side of `token`, if `token` is in this pool.
    pub fn other(&self, token: Address) -> Option<Address> {
        if self.token0 == token {
            Some(self.token1)
        } else if self.token1 == token {
            Some(self.token0)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub platform: Platform,
    pub pool: Address,
    pub token_in: Address,
    pub token_out: Address,
}

/// Ordered hops from the requested input token to the requested output token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradePath {
    hops: Vec<Hop>,
}

impl TradePath {
    pub const MAX_HOPS: usize = 2;

    /// Builds a path if it has 1..=MAX_HOPS hops, token continuity holds and
    /// every hop sits on the same platform (one router executes the swap).
    pub fn try_new(hops: Vec<Hop>) -> Option<Self> {
        if hops.is_empty() || hops.len() > Self::MAX_HOPS {
            return None;
        }
        for window in hops.windows(2) {
            if let [a, b] = window
                && (a.token_out != b.token_in || a.platform != b.platform)
            {
                return None;
            }
        }
        Some(Self { hops })
    }

    pub fn direct(pool: &Pool, token_in: Address, token_out: Address) -> Option<Self> {
        if !pool.connects(token_in, token_out) {
            return None;
        }
        Self::try_new(vec![Hop {
            platform: pool.platform,
            pool: pool.address,
            token_in,
            token_out,
        }])
    }

    pub fn via(first: &Pool, second: &Pool, token_in: Address, token_out: Address) -> Option<Self> {
        let mid = first.other(token_in)?;
        if second.other(mid)? != token_out {
            return None;
        }
        Self::try_new(vec![
            Hop {
                platform: first.platform,
                pool: first.address,
                token_in,
                token_out: mid,
            },
            Hop {
                platform: second.platform,
                pool: second.address,
                token_in: mid,
                token_out,
            },
        ])
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn platform(&self) -> Platform {
        self.hops[0].platform
    }

    pub fn token_in(&self) -> Address {
        self.hops[0].token_in
    }

    pub fn token_out(&self) -> Address {
        self.hops[self.hops.len() - 1].token_out
    }

    /// Token sequence in router `address[] path` form.
    pub fn tokens(&self) -> Vec<Address> {
        let mut out = Vec::with_capacity(self.hops.len() + 1);
        out.push(self.token_in());
        out.extend(self.hops.iter().map(|h| h.token_out));
        out
    }
}

/// A priced path. Both amounts are base units read at `block_number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteResult {
    pub path: TradePath,
    pub amount_in: U256,
    pub amount_out: U256,
    pub block_number: u64,
}

/// One encoded contract call plus the context persisted alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    pub target: Address,
    pub calldata: Bytes,
    /// Solidity function name, e.g. `swapExactTokensForTokens`.
    pub func: String,
    pub meta: serde_json::Value,
}
