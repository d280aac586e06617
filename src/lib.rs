//! QR Payment Engine Library
//! # Overview
//!
//! This library implements signed, time-bounded QR payment tokens: a
//! payer issues a token carrying a signed transaction, a payee scans it
//! and drives a settlement attempt to exactly one terminal outcome.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Transaction, Account, QrToken, errors)
//! - [`crypto`] - Ed25519 keypairs and transaction signing/verification
//! - [`codec`] - Versioned payload schema, encode/decode
//! - [`core`] - Business logic components:
//!   - [`core::issuer`] - Payer-side token construction and signing
//!   - [`core::lifecycle`] - Time-bounded token validity
//!   - [`core::ledger`] - Balances and the append-only audit log
//!   - [`core::credential`] - Transaction-level credential checks
//!   - [`core::settlement`] - Scan-side settlement state machine
//! - [`storage`] - Account persistence (JSON file store)
//! - [`cli`] - CLI argument parsing and the subcommand runner
//!
//! # Token Lifecycle
//!
//! A token is issued with a validity window (10 s instant-pay or 300 s
//! payment-request by default), stays `Active` until its deadline, and
//! is `Expired` afterwards - derived purely from timestamps, so stale
//! tokens fail fast even when no timer ever fired.
//!
//! # Settlement
//!
//! The scan-side flow moves `Scanning` → `Reviewing` → `Confirming` →
//! `Succeeded`/`Failed`. Signature verification failures and expiry are
//! fatal to the attempt; decode problems keep the flow scanning; the
//! ledger's idempotency guard ensures a settled transaction id is never
//! debited twice.

// Module declarations
pub mod cli;
pub mod codec;
pub mod core;
pub mod crypto;
pub mod storage;
pub mod types;

pub use codec::QrPayload;
pub use core::{CredentialStore, Ledger, SettlementFlow, TokenIssuer, TokenLifecycle};
pub use crypto::{sign_transaction, verify_transaction, Keypair};
pub use storage::{AccountStore, JsonFileStore};
pub use types::{
    Account, AccountId, PaymentError, QrToken, Transaction, TransactionId, TransactionStatus,
    ValidityConfig,
};
