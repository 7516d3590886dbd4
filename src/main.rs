// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use clap::{Args, Parser, Subcommand};
use harvest_router::app::config::GlobalSettings;
use harvest_router::app::logging::setup_logging;
use harvest_router::domain::error::AppError;
use harvest_router::domain::types::{OperationUid, Platform, QuoteResult};
use harvest_router::infrastructure::data::db::Database;
use harvest_router::infrastructure::data::token_manager::TokenManager;
use harvest_router::services::context::{ChainContext, ChainRegistry};
use harvest_router::services::execution::executor::{SendOutcome, SendRequest};
use harvest_router::services::routing::platforms::SwapTerms;
use harvest_router::services::routing::router::RouteRequest;

#[derive(Parser, Debug)]
#[command(author, version, about = "harvest router: AMM path finding and transaction execution")]
struct Cli {
    /// Path to config file (default: config.toml when present)
    #[arg(long)]
    config: Option<String>,

    /// Chain id (default: first configured chain)
    #[arg(long)]
    chain: Option<u64>,

    /// Emit JSON logs
    #[arg(long, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price the best path between two tokens
    Quote(TradeArgs),
    /// Route, build and send a swap through the winning platform's router
    Swap {
        #[command(flatten)]
        trade: TradeArgs,
        /// Broadcast for real (overrides transaction_prod_mode = false)
        #[arg(long, default_value_t = false)]
        prod: bool,
        /// Return after persistence without waiting for confirmation
        #[arg(long, default_value_t = false)]
        no_wait: bool,
        #[arg(long)]
        slippage_bps: Option<u64>,
    },
    /// Show persisted transactions
    History {
        #[arg(long)]
        uid: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Args, Debug)]
struct TradeArgs {
    /// Input token symbol or address
    #[arg(long)]
    from: String,
    /// Output token symbol or address
    #[arg(long)]
    to: String,
    /// Human amount: input amount, or desired output with --reverse
    #[arg(long)]
    amount: String,
    /// Restrict routing to one platform (pancake, apeswap, biswap)
    #[arg(long)]
    platform: Option<Platform>,
    /// Exact-output mode: minimize the input for a fixed output
    #[arg(long, default_value_t = false)]
    reverse: bool,
    /// Correlation id (default: random)
    #[arg(long)]
    uid: Option<String>,
}

fn describe_path(quote: &QuoteResult, tokens: &TokenManager, chain_id: u64) -> String {
    quote
        .path
        .tokens()
        .into_iter()
        .map(|addr| {
            tokens
                .by_address(chain_id, addr)
                .map(|t| t.symbol)
                .unwrap_or_else(|| format!("{addr:#x}"))
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}

async fn route(
    ctx: &ChainContext,
    args: &TradeArgs,
    uid: &OperationUid,
    just_price: bool,
) -> Result<QuoteResult, AppError> {
    let router = ctx.router();
    let amount_token = if args.reverse { &args.to } else { &args.from };
    let amount: U256 = router
        .resolve_token(amount_token, ctx.chain_id(), uid)?
        .to_base_units(&args.amount)?;

    router
        .get_profit_trade(&RouteRequest {
            token_in: args.from.clone(),
            token_out: args.to.clone(),
            amount,
            platform: args.platform,
            reverse: args.reverse,
            chain_id: ctx.chain_id(),
            just_price,
            uid: uid.clone(),
        })
        .await
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(settings.log_level(), settings.log_json || cli.log_json);

    let chain_id = match cli.chain {
        Some(id) => id,
        None => settings
            .chains
            .first()
            .copied()
            .ok_or_else(|| AppError::Config("No chains configured".into()))?,
    };

    let db = Database::new(&settings.database_url()).await?;

    if let Command::History { uid, limit } = &cli.command {
        let rows = match uid {
            Some(uid) => db.transactions_for_uid(&OperationUid::new(uid.clone())).await?,
            None => db.get_recent_txs(*limit).await?,
        };
        for row in rows {
            println!(
                "{} [{}] {}.{} {} status={:?} block={:?} gas_used={:?}",
                row.created_at,
                row.uid,
                row.method,
                row.func,
                row.tx_hash,
                row.status,
                row.block_number,
                row.gas_used
            );
        }
        return Ok(());
    }

    let tokens = Arc::new(TokenManager::load_from_file(&settings.tokenlist_path()?)?);
    if tokens.is_empty() {
        tracing::warn!(target: "config", "Token list is empty");
    }

    let mut registry = ChainRegistry::new();
    let shutdown = registry.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received; cancelling in-flight work");
            shutdown.cancel();
        }
    });

    let ctx = ChainContext::from_settings(
        &settings,
        chain_id,
        tokens.clone(),
        Arc::new(db.clone()),
        registry.child_token(),
    )
    .await?;
    registry.insert(ctx);
    let ctx = registry.get(chain_id)?;

    let result = match &cli.command {
        Command::Quote(args) => {
            let uid = args
                .uid
                .clone()
                .map(OperationUid::new)
                .unwrap_or_else(OperationUid::generate);
            let quote = route(ctx, args, &uid, true).await?;
            let token_in = ctx.router().resolve_token(&args.from, chain_id, &uid)?;
            let token_out = ctx.router().resolve_token(&args.to, chain_id, &uid)?;
            println!(
                "[{uid}] {} via {} at block {}: {} {} -> {} {}",
                describe_path(&quote, &tokens, chain_id),
                quote.path.platform(),
                quote.block_number,
                token_in.format_units(quote.amount_in),
                token_in.symbol,
                token_out.format_units(quote.amount_out),
                token_out.symbol
            );
            Ok(())
        }
        Command::Swap {
            trade,
            prod,
            no_wait,
            slippage_bps,
        } => {
            let uid = trade
                .uid
                .clone()
                .map(OperationUid::new)
                .unwrap_or_else(OperationUid::generate);
            let prod_mode = *prod || settings.transaction_prod_mode;
            if prod_mode && settings.wallet_key.is_none() {
                return Err(AppError::Config(
                    "WALLET_KEY is required to broadcast".to_string(),
                ));
            }
            let from: Address = settings.wallet_address_value()?;

            let quote = route(ctx, trade, &uid, false).await?;
            let adapter = ctx
                .router()
                .platforms()
                .get(quote.path.platform())
                .cloned()
                .ok_or_else(|| AppError::UnsupportedPlatform {
                    uid: uid.clone(),
                    platform: quote.path.platform().to_string(),
                    chain_id,
                })?;

            let deadline = chrono::Utc::now().timestamp().max(0) as u64 + settings.swap_deadline_secs;
            let call = adapter.build_swap_call(
                &quote,
                SwapTerms {
                    reverse: trade.reverse,
                    slippage_bps: slippage_bps.unwrap_or(settings.slippage_bps),
                    recipient: from,
                    deadline,
                },
            );

            let outcome = ctx
                .executor()
                .send_transaction(SendRequest {
                    transaction: TransactionRequest::default()
                        .to(call.target)
                        .input(call.calldata.clone().into()),
                    method: "swap".to_string(),
                    func: call.func.clone(),
                    meta: call.meta.clone(),
                    uid: uid.clone(),
                    from,
                    prod_mode,
                    wait_confirmation: settings.wait_confirmation && !*no_wait,
                    classifier: None,
                })
                .await?;

            match outcome {
                SendOutcome::DryRun => println!("[{uid}] dry-run: {} not sent", call.func),
                SendOutcome::Submitted { hash, .. } => println!("[{uid}] sent {hash:#x}"),
                SendOutcome::Confirmed { hash, receipt, .. } => println!(
                    "[{uid}] confirmed {hash:#x} in block {:?} (gas used {})",
                    receipt.block_number, receipt.gas_used
                ),
            }
            Ok(())
        }
        Command::History { .. } => Ok(()),
    };

    registry.shutdown();
    db.close().await;
    result
}
