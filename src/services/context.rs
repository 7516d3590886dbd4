// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::Address;
use tokio_util::sync::CancellationToken;

use crate::app::config::GlobalSettings;
use crate::domain::error::AppError;
use crate::domain::types::Platform;
use crate::infrastructure::data::db::TransactionSink;
use crate::infrastructure::data::pool_registry::{FilePoolSource, PoolSource};
use crate::infrastructure::data::token_manager::TokenRegistry;
use crate::infrastructure::network::chain::{AlloyChainClient, ChainClient};
use crate::infrastructure::network::multicall::MulticallReader;
use crate::infrastructure::network::provider::ConnectionFactory;
use crate::services::execution::confirmation::{ConfirmationSettings, ConfirmationWatcher};
use crate::services::execution::executor::TransactionExecutor;
use crate::services::execution::multicall::MulticallBatcher;
use crate::services::routing::discovery::PairDiscovery;
use crate::services::routing::platforms::PlatformTable;
use crate::services::routing::router::TradeRouter;

/// Collaborators a chain context is assembled from.
pub struct ChainDeps {
    pub client: Arc<dyn ChainClient>,
    pub tokens: Arc<dyn TokenRegistry>,
    pub pools: Arc<dyn PoolSource>,
    pub sink: Arc<dyn TransactionSink>,
    pub routers: HashMap<Platform, Address>,
    pub multicall: Address,
    pub confirmation: ConfirmationSettings,
    pub gas_limit_buffer: u64,
}

/// Router, executor and batcher for one chain. Dropping or shutting down the
/// context cancels every confirmation wait started through it.
pub struct ChainContext {
    chain_id: u64,
    client: Arc<dyn ChainClient>,
    router: Arc<TradeRouter>,
    executor: Arc<TransactionExecutor>,
    batcher: MulticallBatcher,
    shutdown: CancellationToken,
}

impl ChainContext {
    pub fn new(chain_id: u64, deps: ChainDeps, shutdown: CancellationToken) -> Self {
        let platforms = PlatformTable::from_routers(&deps.routers);
        let reader = MulticallReader::new(deps.client.clone(), deps.multicall);
        let router = Arc::new(TradeRouter::new(
            deps.tokens,
            PairDiscovery::new(deps.pools),
            platforms,
            reader,
            deps.client.clone(),
        ));
        let watcher =
            ConfirmationWatcher::new(deps.client.clone(), deps.confirmation, shutdown.clone());
        let executor = Arc::new(TransactionExecutor::new(
            chain_id,
            deps.client.clone(),
            deps.sink,
            watcher,
            deps.gas_limit_buffer,
        ));
        let batcher = MulticallBatcher::new(executor.clone());

        Self {
            chain_id,
            client: deps.client,
            router,
            executor,
            batcher,
            shutdown,
        }
    }

    /// Connects to the chain's RPC endpoint and wires every service from settings.
    pub async fn from_settings(
        settings: &GlobalSettings,
        chain_id: u64,
        tokens: Arc<dyn TokenRegistry>,
        sink: Arc<dyn TransactionSink>,
        shutdown: CancellationToken,
    ) -> Result<Self, AppError> {
        let url = settings.get_http_provider(chain_id)?;
        let provider = if settings.wallet_key.is_some() {
            ConnectionFactory::http_with_signer(&url, settings.signer()?)?
        } else {
            ConnectionFactory::http(&url)?
        };
        ConnectionFactory::verify_chain_id(&provider, chain_id).await?;

        let routers = settings.routers_for_chain(chain_id)?;
        if routers.is_empty() {
            tracing::warn!(target: "config", chain_id, "No routers configured; routing will find no paths");
        }

        let deps = ChainDeps {
            client: Arc::new(AlloyChainClient::new(provider, chain_id)),
            tokens,
            pools: Arc::new(FilePoolSource::new(settings.pools_path()?)),
            sink,
            routers,
            multicall: settings.multicall_for_chain(chain_id)?,
            confirmation: settings.confirmation_for_chain(chain_id),
            gas_limit_buffer: settings.gas_limit_buffer,
        };
        tracing::info!(
            target: "config",
            chain_id,
            rpc = %url,
            confirmation_blocks = deps.confirmation.blocks,
            confirmation_timeout_ms = deps.confirmation.timeout.as_millis() as u64,
            "Chain context ready"
        );
        Ok(Self::new(chain_id, deps, shutdown))
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    pub fn router(&self) -> &Arc<TradeRouter> {
        &self.router
    }

    pub fn executor(&self) -> &Arc<TransactionExecutor> {
        &self.executor
    }

    pub fn batcher(&self) -> &MulticallBatcher {
        &self.batcher
    }

    pub fn shutdown(&self) {
        tracing::info!(target: "config", chain_id = self.chain_id, "Chain context shutting down");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for ChainContext {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Owned set of chain contexts. Shutting the registry down cancels every
/// context created under it.
pub struct ChainRegistry {
    contexts: HashMap<u64, ChainContext>,
    root: CancellationToken,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self {
            contexts: HashMap::new(),
            root: CancellationToken::new(),
        }
    }

    /// Token for a new context; cancelled with the registry.
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Handle that shuts down every context when cancelled (e.g. on Ctrl-C).
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.root.clone()
    }

    pub fn insert(&mut self, context: ChainContext) {
        if let Some(previous) = self.contexts.insert(context.chain_id(), context) {
            previous.shutdown();
        }
    }

    pub fn get(&self, chain_id: u64) -> Result<&ChainContext, AppError> {
        self.contexts
            .get(&chain_id)
            .ok_or_else(|| AppError::Config(format!("Chain {chain_id} is not configured")))
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.contexts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn shutdown(&mut self) {
        self.root.cancel();
        self.contexts.clear();
    }
}
