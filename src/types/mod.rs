//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account state and ledger entries
//! - `transaction`: Transaction record, status, and identifiers
//! - `token`: QR token envelope and validity configuration
//! - `error`: Error types for the payment engine

pub mod account;
pub mod error;
pub mod token;
pub mod transaction;

pub use account::{Account, EntryDirection, LedgerEntry};
pub use error::{DecodeError, PaymentError};
pub use token::{QrToken, ValidityConfig};
pub use transaction::{
    AccountId, FailureReason, Transaction, TransactionId, TransactionStatus,
};
