// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::data_path::resolve_required_data_path;
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::domain::types::Platform;
use crate::services::execution::confirmation::ConfirmationSettings;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,
    #[serde(default = "default_chain", deserialize_with = "deserialize_chain_list")]
    pub chains: Vec<u64>,
    pub database_url: Option<String>,
    pub data_dir: Option<String>,

    // Identity
    pub wallet_key: Option<String>,
    pub wallet_address: Option<Address>,

    // Endpoints and registries
    pub http_providers: Option<HashMap<String, String>>,
    pub tokenlist_path: Option<String>,
    pub pools_path: Option<String>,
    /// chain id -> platform -> router address
    pub routers_by_chain: Option<HashMap<String, HashMap<String, String>>>,
    /// chain id -> Multicall3 address
    pub multicall_by_chain: Option<HashMap<String, String>>,

    // Execution
    #[serde(default = "default_false")]
    pub transaction_prod_mode: bool,
    #[serde(default = "default_true")]
    pub wait_confirmation: bool,
    #[serde(default = "default_confirmation_timeout_ms")]
    pub tx_confirmation_timeout_ms: u64,
    #[serde(default = "default_confirmation_blocks")]
    pub tx_confirmation_blocks: u64,
    pub tx_confirmation_timeout_ms_by_chain: Option<HashMap<String, u64>>,
    pub tx_confirmation_blocks_by_chain: Option<HashMap<String, u64>>,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_gas_limit_buffer")]
    pub gas_limit_buffer: u64,

    // Swaps
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,
    #[serde(default = "default_swap_deadline_secs")]
    pub swap_deadline_secs: u64,
}

// Defaults
fn default_debug() -> bool {
    false
}
fn default_chain() -> Vec<u64> {
    vec![constants::CHAIN_BSC]
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_confirmation_timeout_ms() -> u64 {
    constants::DEFAULT_CONFIRMATION_TIMEOUT_MS
}
fn default_confirmation_blocks() -> u64 {
    constants::DEFAULT_CONFIRMATION_BLOCKS
}
fn default_receipt_poll_ms() -> u64 {
    constants::RECEIPT_POLL_MS
}
fn default_gas_limit_buffer() -> u64 {
    constants::GAS_LIMIT_BUFFER
}
fn default_slippage_bps() -> u64 {
    constants::DEFAULT_SLIPPAGE_BPS
}
fn default_swap_deadline_secs() -> u64 {
    constants::DEFAULT_SWAP_DEADLINE_SECS
}

fn deserialize_chain_list<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{Error, SeqAccess, Visitor};
    use std::fmt;

    struct ChainVisitor;

    impl<'de> Visitor<'de> for ChainVisitor {
        type Value = Vec<u64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a sequence of chain ids or a string with comma-separated ids")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            parse_chain_list(v).map_err(E::custom)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(vec![v])
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            u64::try_from(v)
                .map(|id| vec![id])
                .map_err(|_| E::custom(format!("Invalid chain id '{v}'")))
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(elem) = seq.next_element::<u64>()? {
                out.push(elem);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(ChainVisitor)
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default());

        let mut settings: GlobalSettings = builder.build()?.try_deserialize()?;

        if let Ok(chains_str) = std::env::var("CHAINS") {
            settings.chains = parse_chain_list(&chains_str)?;
        }
        if settings.chains.is_empty() {
            return Err(AppError::Config("No chains configured".to_string()));
        }
        if settings.transaction_prod_mode && settings.wallet_key_value().is_none() {
            return Err(AppError::Config(
                "WALLET_KEY is required when transaction_prod_mode is enabled".to_string(),
            ));
        }

        tracing::debug!(
            target: "config",
            chains = ?settings.chains,
            prod_mode = settings.transaction_prod_mode,
            "Settings loaded"
        );
        Ok(settings)
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    fn data_dir_value(&self) -> Option<String> {
        std::env::var("DATA_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.data_dir
                    .as_ref()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
    }

    fn resolve_path_setting(
        &self,
        env_key: &str,
        configured: Option<&str>,
        default_path: &str,
    ) -> Result<String, AppError> {
        let raw = std::env::var(env_key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                configured
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
            })
            .unwrap_or_else(|| default_path.to_string());
        let data_dir = self.data_dir_value();
        let resolved = resolve_required_data_path(&raw, data_dir.as_deref())?;
        Ok(resolved.to_string_lossy().to_string())
    }

    pub fn tokenlist_path(&self) -> Result<String, AppError> {
        self.resolve_path_setting(
            "TOKENLIST_PATH",
            self.tokenlist_path.as_deref(),
            "data/tokenlist.json",
        )
    }

    pub fn pools_path(&self) -> Result<String, AppError> {
        self.resolve_path_setting("POOLS_PATH", self.pools_path.as_deref(), "data/pools.json")
    }

    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .ok()
            .or_else(|| self.database_url.clone())
            .unwrap_or_else(|| "sqlite://harvest_router.db".to_string())
    }

    /// RPC URL for `chain_id`: `http_providers` map, then `http_provider_<id>`,
    /// then the generic `http_provider` env var.
    pub fn get_http_provider(&self, chain_id: u64) -> Result<String, AppError> {
        if let Some(urls) = &self.http_providers
            && let Some(url) = urls.get(&chain_id.to_string())
        {
            return Ok(url.clone());
        }

        let candidates = [
            format!("http_provider_{}", chain_id),
            "http_provider".to_string(),
        ];
        for key in candidates {
            if let Ok(v) = std::env::var(&key) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Ok(trimmed.to_string());
                }
            }
        }

        Err(AppError::Config(format!(
            "No RPC URL found for chain {}",
            chain_id
        )))
    }

    fn wallet_key_value(&self) -> Option<&str> {
        self.wallet_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Parses `wallet_key` and checks it derives `wallet_address` when one is set.
    pub fn signer(&self) -> Result<PrivateKeySigner, AppError> {
        let key = self
            .wallet_key_value()
            .ok_or_else(|| AppError::Config("WALLET_KEY is missing".to_string()))?;
        let signer = PrivateKeySigner::from_str(key)
            .map_err(|e| AppError::Config(format!("Invalid WALLET_KEY: {e}")))?;
        if let Some(expected) = self.wallet_address
            && expected != signer.address()
        {
            return Err(AppError::Config(format!(
                "WALLET_KEY derives {:#x}, but wallet_address is {:#x}",
                signer.address(),
                expected
            )));
        }
        Ok(signer)
    }

    /// Account used as `from`. Falls back to the key's address.
    pub fn wallet_address_value(&self) -> Result<Address, AppError> {
        if let Some(addr) = self.wallet_address {
            return Ok(addr);
        }
        Ok(self.signer()?.address())
    }

    pub fn receipt_poll_ms_value(&self) -> u64 {
        self.receipt_poll_ms.max(100)
    }

    pub fn confirmation_timeout_ms_for_chain(&self, chain_id: u64) -> u64 {
        self.tx_confirmation_timeout_ms_by_chain
            .as_ref()
            .and_then(|m| m.get(&chain_id.to_string()).copied())
            .unwrap_or(self.tx_confirmation_timeout_ms)
            .max(self.receipt_poll_ms_value())
    }

    pub fn confirmation_blocks_for_chain(&self, chain_id: u64) -> u64 {
        self.tx_confirmation_blocks_by_chain
            .as_ref()
            .and_then(|m| m.get(&chain_id.to_string()).copied())
            .unwrap_or(self.tx_confirmation_blocks)
    }

    pub fn confirmation_for_chain(&self, chain_id: u64) -> ConfirmationSettings {
        ConfirmationSettings {
            timeout: Duration::from_millis(self.confirmation_timeout_ms_for_chain(chain_id)),
            blocks: self.confirmation_blocks_for_chain(chain_id),
            poll: Duration::from_millis(self.receipt_poll_ms_value()),
        }
    }

    /// Built-in routers for the chain, overlaid with `routers_by_chain`.
    pub fn routers_for_chain(&self, chain_id: u64) -> Result<HashMap<Platform, Address>, AppError> {
        let mut out = constants::default_routers_for_chain(chain_id);

        if let Some(map) = self
            .routers_by_chain
            .as_ref()
            .and_then(|m| m.get(&chain_id.to_string()))
        {
            for (name, raw) in map {
                let platform = Platform::from_str(name)?;
                let addr = Address::from_str(raw.trim()).map_err(|_| {
                    AppError::InvalidAddress(format!("routers_by_chain:{chain_id}:{name} -> {raw}"))
                })?;
                out.insert(platform, addr);
            }
        }

        Ok(out)
    }

    pub fn multicall_for_chain(&self, chain_id: u64) -> Result<Address, AppError> {
        match self
            .multicall_by_chain
            .as_ref()
            .and_then(|m| m.get(&chain_id.to_string()))
        {
            Some(raw) => Address::from_str(raw.trim()).map_err(|_| {
                AppError::InvalidAddress(format!("multicall_by_chain:{chain_id} -> {raw}"))
            }),
            None => Ok(constants::MULTICALL3),
        }
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

fn parse_chain_list(raw: &str) -> Result<Vec<u64>, AppError> {
    let cleaned = raw.trim_matches(|c| c == '`' || c == '"' || c == '\'');
    let mut out = Vec::new();
    for part in cleaned.split(|c: char| c == ',' || c.is_whitespace()) {
        let p = part.trim();
        if p.is_empty() {
            continue;
        }
        let id: u64 = p
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid chain id '{}'", p)))?;
        out.push(id);
    }
    if out.is_empty() {
        return Err(AppError::Config("CHAINS env is empty".into()));
    }
    Ok(out)
}
