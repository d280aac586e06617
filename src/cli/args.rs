use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::types::ValidityConfig;

/// Issue and settle signed QR payment tokens
#[derive(Parser, Debug)]
#[command(name = "qr-pay-engine")]
#[command(about = "Issue and settle signed QR payment tokens", long_about = None)]
pub struct CliArgs {
    /// Directory holding account snapshots
    #[arg(
        long = "store",
        value_name = "DIR",
        default_value = "accounts",
        help = "Directory where account state is persisted"
    )]
    pub store_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open an account (or top up an existing one)
    Open {
        /// Account id to open
        #[arg(long, value_name = "ID")]
        account: String,

        /// Opening balance
        #[arg(long, value_name = "AMOUNT", default_value = "0")]
        balance: Decimal,
    },

    /// Issue a signed payment token and print its payload
    Issue {
        /// Paying account id
        #[arg(long, value_name = "ID")]
        from: String,

        /// Receiving account id
        #[arg(long, value_name = "ID")]
        to: String,

        /// Proposed amount
        #[arg(long, value_name = "AMOUNT")]
        amount: Decimal,

        /// Free-text note attached to the transaction
        #[arg(long, value_name = "TEXT")]
        description: Option<String>,

        /// Validity window preset
        #[arg(long, value_enum, default_value = "instant")]
        validity: ValidityPreset,

        /// Override the validity window in seconds
        #[arg(long = "validity-secs", value_name = "SECS")]
        validity_secs: Option<u64>,

        /// Hex-encoded 32-byte signing seed (ephemeral key when omitted)
        #[arg(long = "key-seed", value_name = "HEX")]
        key_seed: Option<String>,
    },

    /// Scan a payload and settle it against a local account
    Settle {
        /// The scanned payload text
        #[arg(value_name = "PAYLOAD")]
        payload: String,

        /// Local account to debit
        #[arg(long, value_name = "ID")]
        account: String,

        /// The account's enrolled credential
        #[arg(long, value_name = "SECRET")]
        credential: String,

        /// Credential typed at confirmation (defaults to the enrolled one)
        #[arg(long, value_name = "SECRET")]
        attempt: Option<String>,

        /// Settle this amount instead of the token's proposed amount
        #[arg(long, value_name = "AMOUNT")]
        amount: Option<Decimal>,
    },

    /// Print an account's balance and entry log
    Show {
        /// Account id to inspect
        #[arg(long, value_name = "ID")]
        account: String,
    },
}

/// Validity window presets
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ValidityPreset {
    /// Short-lived token for in-person payment (10 s)
    Instant,
    /// Longer-lived shareable payment request (300 s)
    Request,
}

impl ValidityPreset {
    /// Resolve the preset (and optional override) into a config
    pub fn to_config(self, override_secs: Option<u64>) -> ValidityConfig {
        match override_secs {
            Some(secs) => ValidityConfig::new(secs),
            None => match self {
                ValidityPreset::Instant => ValidityConfig::INSTANT_PAY,
                ValidityPreset::Request => ValidityConfig::PAYMENT_REQUEST,
            },
        }
    }
}
