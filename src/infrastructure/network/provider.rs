// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::network::EthereumWallet;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use url::Url;

use crate::domain::error::AppError;

pub struct ConnectionFactory;

impl ConnectionFactory {
    fn parse(rpc_url: &str) -> Result<Url, AppError> {
        Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))
    }

    /// Read-only HTTP provider, enough for quoting.
    pub fn http(rpc_url: &str) -> Result<DynProvider, AppError> {
        let url = Self::parse(rpc_url)?;
        Ok(ProviderBuilder::new().connect_http(url).erased())
    }

    /// HTTP provider that signs outgoing transactions with `signer`.
    pub fn http_with_signer(
        rpc_url: &str,
        signer: PrivateKeySigner,
    ) -> Result<DynProvider, AppError> {
        let url = Self::parse(rpc_url)?;
        Ok(ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased())
    }

    /// Fails when the endpoint serves a different chain than configured.
    pub async fn verify_chain_id(provider: &DynProvider, expected: u64) -> Result<(), AppError> {
        let actual = provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::Connection(format!("eth_chainId failed: {}", e)))?;
        if actual != expected {
            return Err(AppError::Config(format!(
                "RPC endpoint serves chain {actual}, expected {expected}"
            )));
        }
        Ok(())
    }
}
