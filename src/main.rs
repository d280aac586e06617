//! QR Payment Engine CLI
//!
//! Command-line demo around the token lifecycle: open accounts, issue
//! signed payment tokens, and settle scanned payloads.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- open --account wallet_a --balance 1000.00
//! cargo run -- issue --from wallet_b --to wallet_a --amount 45.00
//! cargo run -- settle '<payload>' --account wallet_a --credential 1234
//! cargo run -- show --account wallet_a
//! ```
//!
//! Issued payloads go to stdout so they can be piped straight into
//! `settle`; logs go to stderr, filtered by `RUST_LOG`.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (failed settlement, unknown account, storage error, etc.)

use std::process;

use qr_pay_engine::cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();
    if let Err(e) = cli::run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
