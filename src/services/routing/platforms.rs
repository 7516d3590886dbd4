// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;

use crate::domain::types::{Platform, PreparedCall, QuoteResult, TradePath};
use crate::infrastructure::data::contracts::IUniswapV2Router02;

const BPS_DENOMINATOR: u64 = 10_000;

/// Why a quote return could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// Return data did not decode; the candidate is dropped.
    Undecodable(String),
    /// Return data decoded but cannot be lined up with the requested path.
    Incomparable(String),
}

/// Exact-in (forward) or exact-out (reverse) swap parameters.
#[derive(Debug, Clone, Copy)]
pub struct SwapTerms {
    pub reverse: bool,
    pub slippage_bps: u64,
    pub recipient: Address,
    pub deadline: u64,
}

/// Per-platform quoting and swap-call construction.
pub trait SwapPlatform: Send + Sync {
    fn platform(&self) -> Platform;

    fn router(&self) -> Address;

    /// Quote calldata for `path`. Forward: `amount` is the input;
    /// reverse: `amount` is the desired output.
    fn encode_quote(&self, path: &TradePath, amount: U256, reverse: bool) -> Bytes;

    /// Decodes quote return data into `(amount_in, amount_out)`.
    fn decode_quote(&self, path: &TradePath, data: &[u8]) -> Result<(U256, U256), QuoteError>;

    fn build_swap_call(&self, quote: &QuoteResult, terms: SwapTerms) -> PreparedCall;
}

/// UniswapV2-style router (Pancake, Apeswap and Biswap all expose this ABI).
#[derive(Debug, Clone)]
pub struct UniV2Platform {
    platform: Platform,
    router: Address,
}

impl UniV2Platform {
    pub fn new(platform: Platform, router: Address) -> Self {
        Self { platform, router }
    }
}

pub fn min_out(amount_out: U256, slippage_bps: u64) -> U256 {
    let bps = slippage_bps.min(BPS_DENOMINATOR);
    amount_out * U256::from(BPS_DENOMINATOR - bps) / U256::from(BPS_DENOMINATOR)
}

pub fn max_in(amount_in: U256, slippage_bps: u64) -> U256 {
    amount_in * U256::from(BPS_DENOMINATOR + slippage_bps) / U256::from(BPS_DENOMINATOR)
}

impl SwapPlatform for UniV2Platform {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn router(&self) -> Address {
        self.router
    }

    fn encode_quote(&self, path: &TradePath, amount: U256, reverse: bool) -> Bytes {
        let tokens = path.tokens();
        let encoded = if reverse {
            IUniswapV2Router02::getAmountsInCall {
                amountOut: amount,
                path: tokens,
            }
            .abi_encode()
        } else {
            IUniswapV2Router02::getAmountsOutCall {
                amountIn: amount,
                path: tokens,
            }
            .abi_encode()
        };
        Bytes::from(encoded)
    }

    fn decode_quote(&self, path: &TradePath, data: &[u8]) -> Result<(U256, U256), QuoteError> {
        // getAmountsOut and getAmountsIn share the `uint256[]` return shape.
        let amounts = IUniswapV2Router02::getAmountsOutCall::abi_decode_returns(data)
            .map_err(|e| QuoteError::Undecodable(e.to_string()))?;
        let expected = path.len() + 1;
        if amounts.len() != expected {
            return Err(QuoteError::Incomparable(format!(
                "{} router returned {} amounts for a {}-token path",
                self.platform,
                amounts.len(),
                expected
            )));
        }
        Ok((amounts[0], amounts[amounts.len() - 1]))
    }

    fn build_swap_call(&self, quote: &QuoteResult, terms: SwapTerms) -> PreparedCall {
        let tokens = quote.path.tokens();
        let deadline = U256::from(terms.deadline);
        let (calldata, func, bound) = if terms.reverse {
            let amount_in_max = max_in(quote.amount_in, terms.slippage_bps);
            let call = IUniswapV2Router02::swapTokensForExactTokensCall {
                amountOut: quote.amount_out,
                amountInMax: amount_in_max,
                path: tokens.clone(),
                to: terms.recipient,
                deadline,
            };
            (call.abi_encode(), "swapTokensForExactTokens", amount_in_max)
        } else {
            let amount_out_min = min_out(quote.amount_out, terms.slippage_bps);
            let call = IUniswapV2Router02::swapExactTokensForTokensCall {
                amountIn: quote.amount_in,
                amountOutMin: amount_out_min,
                path: tokens.clone(),
                to: terms.recipient,
                deadline,
            };
            (call.abi_encode(), "swapExactTokensForTokens", amount_out_min)
        };

        PreparedCall {
            target: self.router,
            calldata: Bytes::from(calldata),
            func: func.to_string(),
            meta: serde_json::json!({
                "platform": self.platform,
                "path": tokens.iter().map(|t| format!("{t:#x}")).collect::<Vec<_>>(),
                "pools": quote.path.hops().iter().map(|h| format!("{:#x}", h.pool)).collect::<Vec<_>>(),
                "amountIn": quote.amount_in.to_string(),
                "amountOut": quote.amount_out.to_string(),
                "bound": bound.to_string(),
                "reverse": terms.reverse,
                "deadline": terms.deadline,
                "quoteBlock": quote.block_number,
            }),
        }
    }
}

/// Platform adapters for one chain, keyed by platform.
#[derive(Clone, Default)]
pub struct PlatformTable {
    adapters: HashMap<Platform, Arc<dyn SwapPlatform>>,
}

impl PlatformTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// One UniswapV2 adapter per configured router.
    pub fn from_routers(routers: &HashMap<Platform, Address>) -> Self {
        let mut table = Self::new();
        for (platform, router) in routers {
            table.register(Arc::new(UniV2Platform::new(*platform, *router)));
        }
        table
    }

    pub fn register(&mut self, adapter: Arc<dyn SwapPlatform>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    pub fn get(&self, platform: Platform) -> Option<&Arc<dyn SwapPlatform>> {
        self.adapters.get(&platform)
    }

    /// Configured platforms in tie-break priority order.
    pub fn platforms(&self) -> Vec<Platform> {
        Platform::PRIORITY
            .iter()
            .copied()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
