//! Algorand indexer export CLI.
//!
//! Batch retrieval from an Algorand indexer: a windowed, paginated
//! transaction export with summary statistics, a wallet balance sweep,
//! and a single-address payment history.
//!
//! # Usage
//!
//! ```bash
//! # Export all transactions in the configured time range
//! algoscan-export transactions --config config.toml --out-dir data
//!
//! # Fetch balances for every address in a list
//! algoscan-export balances --addresses data/wallet_addresses.txt
//!
//! # Payment history of one address from START_TIME onward
//! algoscan-export history --address <ADDRESS>
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use clap::{Parser, Subcommand};

use algoscan::IndexerClient;
use algoscan_export::config::Config;
use algoscan_export::retry::RetryPolicy;
use algoscan_export::{fetcher, normalize, parquet, summary};

/// Algorand indexer batch exporter.
#[derive(Debug, Parser)]
#[command(name = "algoscan-export", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Export all transactions in the configured time range and write
    /// summary and table files.
    Transactions {
        /// Output directory for the summary CSV and Parquet table.
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },

    /// Fetch current balances for a list of wallet addresses.
    Balances {
        /// Text file with one address per line.
        #[arg(long, default_value = "data/wallet_addresses.txt")]
        addresses: PathBuf,
    },

    /// Fetch the payment history of a single address from `START_TIME`.
    History {
        /// The address to query; defaults to the first line of the
        /// address file.
        #[arg(long)]
        address: Option<String>,

        /// Text file consulted when `--address` is not given.
        #[arg(long, default_value = "data/wallet_addresses.txt")]
        addresses: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let client = connect(&config).await?;
    let retry = RetryPolicy::new(config.max_attempts);

    match cli.command {
        Command::Transactions { out_dir } => {
            cmd_transactions(&config, &client, &retry, &out_dir).await
        }
        Command::Balances { addresses } => {
            cmd_balances(&config, &client, &retry, &addresses).await
        }
        Command::History { address, addresses } => {
            cmd_history(&config, &client, &retry, address, &addresses).await
        }
    }
}

/// Build the gateway client and verify the indexer is reachable.
///
/// A failed health check is fatal immediately, without retry — per-call
/// retry only covers transient errors once the service is known to be
/// up.
async fn connect(config: &Config) -> Result<IndexerClient> {
    let client = IndexerClient::new(&config.url, &config.token, config.x_api_key.as_deref())?;
    client
        .health()
        .await
        .context("indexer health check failed")?;
    tracing::info!(url = %config.url, "indexer connected");
    Ok(client)
}

/// Execute the `transactions` subcommand.
async fn cmd_transactions(
    config: &Config,
    client: &IndexerClient,
    retry: &RetryPolicy,
    out_dir: &Path,
) -> Result<()> {
    let range = config.range()?;
    let windows = range.partition(Duration::seconds(i64::from(config.window_secs)))?;
    tracing::info!(%range, windows = windows.len(), "starting windowed scan");

    let limit = config.page_limit;
    let records = fetcher::scan_windows(&windows, retry, async |window, token| {
        client
            .search_transactions(window.start(), window.end(), token.as_deref(), limit)
            .await
    })
    .await?;
    tracing::info!(records = records.len(), "scan complete");

    let table = normalize::normalize(records);
    tracing::info!(
        rows = table.len(),
        columns = table.columns().len(),
        "records normalized"
    );

    parquet::export_table(&table, out_dir)?;

    let summary = summary::summarize(&table, &config.start_time, &config.end_time);
    for (key, value) in summary.entries() {
        tracing::info!("{key}: {value}");
    }
    summary.write_csv(out_dir)?;

    Ok(())
}

/// Execute the `balances` subcommand.
async fn cmd_balances(
    config: &Config,
    client: &IndexerClient,
    retry: &RetryPolicy,
    addresses_path: &Path,
) -> Result<()> {
    let addresses = read_addresses(addresses_path)?;
    tracing::info!(
        addresses = addresses.len(),
        policy = ?config.on_error,
        "fetching wallet balances"
    );

    let report = fetcher::fetch_balances(&addresses, retry, config.on_error, async |address| {
        client.account_info(address).await
    })
    .await?;

    print_balances(&report.rows);
    if !report.skipped.is_empty() {
        tracing::warn!(
            skipped = report.skipped.len(),
            addresses = ?report.skipped,
            "some addresses were skipped after exhausted retries"
        );
    }
    Ok(())
}

/// Execute the `history` subcommand.
async fn cmd_history(
    config: &Config,
    client: &IndexerClient,
    retry: &RetryPolicy,
    address: Option<String>,
    addresses_path: &Path,
) -> Result<()> {
    let address = match address {
        Some(a) => a,
        None => read_addresses(addresses_path)?
            .into_iter()
            .next()
            .with_context(|| format!("no addresses in {}", addresses_path.display()))?,
    };
    let start = config.range()?.start();
    tracing::info!(address = %address, start = %config.start_time, "retrieving transaction history");

    let limit = config.page_limit;
    let rows = fetcher::fetch_history(&address, retry, async |token| {
        client
            .search_transactions_by_address(&address, start, token.as_deref(), limit)
            .await
    })
    .await?;

    tracing::info!(transactions = rows.len(), "history retrieved");
    print_history(&rows);
    Ok(())
}

/// Read a wallet address list: one address per line, order preserved,
/// duplicates kept, no validation.
fn read_addresses(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading address list {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Print the balance table.
#[allow(clippy::print_stdout)]
fn print_balances(rows: &[fetcher::BalanceRow]) {
    println!("{:<58} {:>20}", "Account", "Balance (Algo)");
    println!("{}", "-".repeat(79));
    for row in rows {
        println!("{:<58} {:>20}", row.account, row.balance.to_string());
    }
}

/// Print the payment history table.
#[allow(clippy::print_stdout)]
fn print_history(rows: &[fetcher::HistoryRow]) {
    println!(
        "{:<54} {:<58} {:>16} {}",
        "Tx Id", "Sender", "Amount (Algo)", "Receiver"
    );
    println!("{}", "-".repeat(148));
    for row in rows {
        println!(
            "{:<54} {:<58} {:>16} {}",
            row.tx_id,
            row.sender,
            row.amount.map_or_else(|| "-".to_owned(), |a| a.to_string()),
            row.receiver.as_deref().unwrap_or("-"),
        );
    }
}
