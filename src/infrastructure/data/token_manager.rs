// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::collections::HashMap;
use std::fs;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::domain::error::AppError;
use crate::domain::types::Token;

/// Read-only token lookup consumed by the router.
pub trait TokenRegistry: Send + Sync {
    /// Resolves a symbol (case-insensitive) or a hex address on `chain_id`.
    fn resolve(&self, symbol: &str, chain_id: u64) -> Option<Token>;
}

#[derive(Debug, Clone)]
struct TokenInfo {
    symbol: String,
    decimals: u8,
}

#[derive(Debug, Clone, Default)]
pub struct TokenManager {
    tokens_by_chain: HashMap<u64, HashMap<Address, TokenInfo>>,
    symbols_by_chain: HashMap<u64, HashMap<String, Address>>,
}

#[derive(Deserialize)]
struct TokenEntry {
    symbol: String,
    decimals: u8,
    #[serde(default)]
    addresses: HashMap<String, String>,
}

impl TokenManager {
    pub fn load_from_file(path: &str) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read tokenlist {path}: {e}")))?;
        Self::from_json(&raw)
            .map_err(|e| AppError::Config(format!("Invalid tokenlist JSON {path}: {e}")))
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<TokenEntry> = serde_json::from_str(raw)?;
        let mut manager = Self::default();

        for entry in entries {
            for (chain_str, addr_str) in entry.addresses {
                let (Ok(chain_id), Ok(addr)) =
                    (chain_str.parse::<u64>(), addr_str.parse::<Address>())
                else {
                    tracing::warn!(
                        target: "token_manager",
                        symbol = %entry.symbol,
                        chain = %chain_str,
                        address = %addr_str,
                        "Skipping malformed tokenlist address"
                    );
                    continue;
                };
                manager.insert(chain_id, &entry.symbol, addr, entry.decimals);
            }
        }

        Ok(manager)
    }

    pub fn insert(&mut self, chain_id: u64, symbol: &str, address: Address, decimals: u8) {
        self.tokens_by_chain.entry(chain_id).or_default().insert(
            address,
            TokenInfo {
                symbol: symbol.to_string(),
                decimals,
            },
        );
        self.symbols_by_chain
            .entry(chain_id)
            .or_default()
            .insert(symbol.to_ascii_uppercase(), address);
    }

    pub fn by_address(&self, chain_id: u64, address: Address) -> Option<Token> {
        self.tokens_by_chain
            .get(&chain_id)
            .and_then(|m| m.get(&address))
            .map(|info| Token {
                symbol: info.symbol.clone(),
                address,
                decimals: info.decimals,
                chain_id,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.tokens_by_chain.is_empty()
    }
}

impl TokenRegistry for TokenManager {
    fn resolve(&self, symbol: &str, chain_id: u64) -> Option<Token> {
        let trimmed = symbol.trim();
        if let Ok(address) = trimmed.parse::<Address>() {
            return self.by_address(chain_id, address);
        }
        let address = self
            .symbols_by_chain
            .get(&chain_id)?
            .get(&trimmed.to_ascii_uppercase())
            .copied()?;
        self.by_address(chain_id, address)
    }
}
