mod cli;
mod commands;
mod synthetic;

use clap::Parser;
use cli::{Cli, Command};
use ferrotrade_consumers::{
    install_signal_handlers, InMemoryJobRegistry, InMemoryOrderStore, LoggingJobDispatcher, OrderEvent, OrderEventConsumer, SweepJobEventConsumer,
};
use ferrotrade_core::{Side, Symbol};
use ferrotrade_dal::queue::BoundedDropOldestQueue;
use ferrotrade_router::{RouterContext, RouterRequest};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(cfg!(debug_assertions))
        .json()
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Route { symbol, strategy, days } => {
            let now = chrono::Utc::now();
            let request = RouterRequest {
                symbol: Symbol::new(&symbol),
                start: now - chrono::Duration::days(days),
                end: Some(now),
                strategy,
                params: serde_json::json!({}),
                min_notional: Decimal::from(100),
                max_notional: Decimal::from(20_000),
                side: Side::Buy,
            };
            let context = RouterContext {
                offline_mode: true,
                ..RouterContext::default()
            };
            let state = commands::run_route(request, context);
            println!("{}", serde_json::to_string_pretty(&state.order_intent)?);
            if let Some(reason) = state.fallback_reason {
                tracing::warn!(%reason, "router halted before enqueuing an order");
            }
        }
        Command::Backtest { symbol, strategy, days } => {
            let (_curve, metrics) = commands::run_backtest(&symbol, strategy, days);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "total_return": metrics.total_return,
                    "cagr": metrics.cagr,
                    "max_drawdown": metrics.max_drawdown,
                    "sharpe": metrics.sharpe,
                    "sortino": metrics.sortino,
                }))?
            );
        }
        Command::Sweep { symbol, out_dir, max_workers } => {
            let results = commands::run_sweep(&symbol, std::path::Path::new(&out_dir), max_workers)?;
            let summary: Vec<_> = results
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "job_id": r.job_id,
                        "params": r.params,
                        "total_return": r.metrics.total_return,
                        "sharpe": r.metrics.sharpe,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::ConsumeOrders => {
            let queue = Arc::new(BoundedDropOldestQueue::new(1024));
            let shutdown = install_signal_handlers();
            let producer = spawn_stdin_producer(queue.clone());
            let mut consumer = OrderEventConsumer::new(InMemoryOrderStore::new());
            consumer.run(queue, shutdown).await;
            producer.abort();
        }
        Command::ConsumeSweepJobs => {
            let mut consumer = SweepJobEventConsumer::new(LoggingJobDispatcher, InMemoryJobRegistry::new());
            let mut shutdown = install_signal_handlers();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            break;
                        }
                    }
                    line = lines.next_line() => {
                        match line {
                            Ok(Some(payload)) => consumer.handle_payload(chrono::Utc::now(), &payload),
                            Ok(None) => break,
                            Err(error) => {
                                tracing::warn!(%error, "failed reading sweep-job payload from stdin");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Reads newline-delimited order-intent JSON from stdin and pushes it onto `queue`, pushing
/// [`OrderEvent::EndOfStream`] once stdin closes (spec.md §4.10).
fn spawn_stdin_producer(queue: Arc<BoundedDropOldestQueue<OrderEvent>>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut offset = 0u64;
        loop {
            match lines.next_line().await {
                Ok(Some(payload)) => {
                    offset += 1;
                    queue.push(OrderEvent::Message { partition: "stdin".to_string(), offset, payload });
                }
                Ok(None) => {
                    queue.push(OrderEvent::EndOfStream);
                    break;
                }
                Err(error) => {
                    tracing::warn!(%error, "failed reading order payload from stdin");
                    queue.push(OrderEvent::EndOfStream);
                    break;
                }
            }
        }
    })
}
