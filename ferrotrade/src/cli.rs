use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "ferrotrade", about = "Signal generation, backtesting, and order routing for long-only equity strategies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Route one symbol through the orchestration graph and print the resulting order intent.
    Route {
        #[arg(long, default_value = "AAPL")]
        symbol: String,
        #[arg(long, default_value = "breakout")]
        strategy: String,
        #[arg(long, default_value_t = 90)]
        days: i64,
    },
    /// Backtest one strategy against synthetic daily bars and print performance metrics.
    Backtest {
        #[arg(long, default_value = "AAPL")]
        symbol: String,
        #[arg(long, value_enum, default_value_t = StrategyChoice::Breakout)]
        strategy: StrategyChoice,
        #[arg(long, default_value_t = 252)]
        days: i64,
    },
    /// Sweep the breakout lookback parameter across a small grid.
    Sweep {
        #[arg(long, default_value = "AAPL")]
        symbol: String,
        #[arg(long, default_value = "./sweep-out")]
        out_dir: String,
        #[arg(long)]
        max_workers: Option<usize>,
    },
    /// Consume newline-delimited order-intent JSON from stdin until SIGINT/SIGTERM.
    ConsumeOrders,
    /// Consume newline-delimited sweep-job JSON from stdin until SIGINT/SIGTERM.
    ConsumeSweepJobs,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StrategyChoice {
    Breakout,
    Momentum,
    MeanReversion,
}
