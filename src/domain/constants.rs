// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};
use std::collections::HashMap;

use crate::domain::types::Platform;

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_BSC: u64 = 56;

/// Multicall3 is deployed at the same address on every supported chain.
pub const MULTICALL3: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

// =============================================================================
// EXECUTION CONSTANTS
// =============================================================================

/// Added on top of `eth_estimateGas` before sending.
pub const GAS_LIMIT_BUFFER: u64 = 50_000;

/// Receipt polling interval.
pub const RECEIPT_POLL_MS: u64 = 3_000;

pub const DEFAULT_CONFIRMATION_TIMEOUT_MS: u64 = 180_000;
pub const DEFAULT_CONFIRMATION_BLOCKS: u64 = 3;

pub const DEFAULT_SLIPPAGE_BPS: u64 = 50;
pub const DEFAULT_SWAP_DEADLINE_SECS: u64 = 1_200;

// =============================================================================
// ROUTERS (BSC mainnet)
// =============================================================================

pub const PANCAKE_ROUTER_BSC: Address = address!("10ED43C718714eb63d5aA57B78B54704E256024E");
pub const APESWAP_ROUTER_BSC: Address = address!("cF0feBd3f17CEf5b47b0cD257aCf6025c5BFf3b7");
pub const BISWAP_ROUTER_BSC: Address = address!("3a6d8cA21D1CF76F653A67577FA0D27453350dD8");

pub fn default_routers_for_chain(chain_id: u64) -> HashMap<Platform, Address> {
    let mut out = HashMap::new();
    if chain_id == CHAIN_BSC {
        out.insert(Platform::Pancake, PANCAKE_ROUTER_BSC);
        out.insert(Platform::Apeswap, APESWAP_ROUTER_BSC);
        out.insert(Platform::Biswap, BISWAP_ROUTER_BSC);
    }
    out
}
