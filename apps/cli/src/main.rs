//! fundinfo CLI - exchange rates and fund quotes from the command line.
//!
//! ```bash
//! fundinfo rate ETH USD
//! fundinfo rate WBTC DAI --at 1704067200
//! fundinfo series ETH USD
//! fundinfo funds funds.json --quote USD --sort returns.lastMonth
//! ```

mod config;
mod format;
mod json_source;
mod main_lib;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use fundinfo_core::funds::{sort_quoted_funds, FundFetcher, FundSource, ReturnWindow, SortKey};
use fundinfo_core::quotes::{FundQuoteService, QuotedFund};

use config::Config;
use format::{format_number, format_percentage};
use json_source::JsonFileSource;
use main_lib::{build_resolver, init_tracing};

#[derive(Parser)]
#[command(name = "fundinfo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Exchange rates and fund quotes across crypto assets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price of one unit of DENOM in QUOTE
    Rate {
        #[arg(value_name = "DENOM")]
        denom: String,

        #[arg(value_name = "QUOTE")]
        quote: String,

        /// Unix timestamp in seconds for a historical rate
        #[arg(long)]
        at: Option<i64>,
    },

    /// Daily closes of DENOM in QUOTE
    Series {
        #[arg(value_name = "DENOM")]
        denom: String,

        #[arg(value_name = "QUOTE")]
        quote: String,
    },

    /// Quote funds listed in JSON files
    Funds {
        /// JSON files, each an array of fund records
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Quote symbol to price funds in
        #[arg(short, long, default_value = "USD")]
        quote: String,

        /// name, platform, aum, sharePrice, inception or returns.<window>
        #[arg(short, long, default_value = "aum")]
        sort: String,

        #[arg(long)]
        ascending: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    init_tracing(&config.log_format);
    let resolver = build_resolver(&config);

    match cli.command {
        Commands::Rate { denom, quote, at } => {
            let at = at
                .map(|secs| {
                    DateTime::<Utc>::from_timestamp(secs, 0)
                        .with_context(|| format!("timestamp {} is out of range", secs))
                })
                .transpose()?;
            let rate = resolver.fetch_rate(&denom, &quote, at).await?;
            println!("1 {} = {} {}", denom, format_number(Some(rate.value())), quote);
        }
        Commands::Series { denom, quote } => {
            let points = resolver.fetch_time_series(&denom, &quote).await?;
            for point in points {
                println!("{}  {}", point.date, format_number(Some(point.rate.value())));
            }
        }
        Commands::Funds {
            files,
            quote,
            sort,
            ascending,
            json,
        } => {
            let key: SortKey = sort.parse()?;
            let sources: Vec<Arc<dyn FundSource>> = files
                .into_iter()
                .map(|path| Arc::new(JsonFileSource::new(path)) as Arc<dyn FundSource>)
                .collect();
            let funds = FundFetcher::new(sources).collect_funds(Utc::now()).await;
            tracing::info!("Quoting {} funds in {}", funds.len(), quote);

            let service = FundQuoteService::new(Arc::clone(&resolver));
            let mut quoted = service.quote_funds(&funds, &quote).await?;
            sort_quoted_funds(&mut quoted, key, ascending);

            if json {
                println!("{}", serde_json::to_string_pretty(&quoted)?);
            } else {
                print_table(&quoted);
            }
        }
    }
    Ok(())
}

fn print_table(funds: &[QuotedFund]) {
    println!(
        "{:<28} {:<12} {:>16} {:>14} {:>10} {:>10} {:>10}",
        "NAME", "PLATFORM", "AUM", "SHARE PRICE", "1D", "1M", "1Y"
    );
    for fund in funds {
        let ret = |window: ReturnWindow| format_percentage(fund.returns.get(&window).copied());
        println!(
            "{:<28} {:<12} {:>16} {:>14} {:>10} {:>10} {:>10}",
            truncate(&fund.name, 28),
            truncate(&fund.platform_name, 12),
            format_number(fund.aum),
            format_number(fund.share_price),
            ret(ReturnWindow::LastDay),
            ret(ReturnWindow::LastMonth),
            ret(ReturnWindow::LastYear),
        );
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width - 1).collect();
        out.push('~');
        out
    }
}
