//! Error types for the QR payment engine
//!
//! This module defines all error types that can occur while issuing,
//! decoding, verifying, and settling payment tokens.
//!
//! # Error Categories
//!
//! - **Validation errors**: bad amount or recipient - user-correctable,
//!   reported inline, the settlement flow stays where it is.
//! - **Decode errors**: malformed or incompatible payloads - recoverable,
//!   the flow remains in `Scanning` and waits for the next scan.
//! - **Integrity / expiry errors**: signature mismatch or a stale token -
//!   always fatal to the attempt, never downgraded to a retry.
//! - **Business-rule failures**: insufficient balance, duplicate
//!   settlement - the ledger rejects the operation and stays unchanged.
//! - **Storage errors**: I/O or serialization failures in the account
//!   store.
//!
//! No error class is retried automatically; every retry is a brand-new
//! attempt with a brand-new transaction id.

use rust_decimal::Decimal;
use thiserror::Error;

use super::transaction::{AccountId, TransactionId};

/// Errors produced while decoding a scanned payload
///
/// Decoding is all-or-nothing: a failed decode never yields a partially
/// populated token. Both variants are recoverable - the settlement flow
/// stays in `Scanning` and the payee can simply scan again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload is not well-formed (not valid JSON at all)
    #[error("malformed payload: {message}")]
    MalformedPayload {
        /// Description of the parse failure
        message: String,
    },

    /// The payload is well-formed but required fields are absent,
    /// wrong-typed, or the schema tag is unknown
    #[error("payload schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of the schema violation
        message: String,
    },
}

/// Main error type for the QR payment engine
///
/// Each variant carries enough context to diagnose the failure and to
/// decide whether the attempt can continue (validation, decode) or is
/// terminally dead (integrity, expiry).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    /// The amount is zero or negative
    ///
    /// User-correctable; the settlement flow stays in `Reviewing`.
    #[error("invalid amount {amount}: must be strictly positive")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// The recipient identifier is empty
    #[error("invalid recipient '{recipient}'")]
    InvalidRecipient {
        /// The rejected recipient string
        recipient: String,
    },

    /// A signature was attached to an already signed transaction
    ///
    /// Signatures are written exactly once; a resend needs a new
    /// transaction.
    #[error("transaction {tx} is already signed")]
    AlreadySigned {
        /// Transaction id
        tx: TransactionId,
    },

    /// A token embedded an unsigned transaction where a signed one is
    /// required
    #[error("transaction {tx} carries no signature")]
    MissingSignature {
        /// Transaction id
        tx: TransactionId,
    },

    /// The scanned payload could not be decoded
    ///
    /// Recoverable - the flow stays in `Scanning`.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The payload decoded into a legacy schema that cannot be settled
    ///
    /// Recoverable - the flow stays in `Scanning`; only signed token
    /// payloads drive a settlement.
    #[error("payload schema '{schema}' is not settleable")]
    UnsupportedSchema {
        /// The schema tag that was decoded
        schema: String,
    },

    /// Signature verification failed
    ///
    /// Indicates tampering or replay. Always fatal to the attempt and
    /// must never be silently downgraded to a retry.
    #[error("signature verification failed for transaction {tx}")]
    Tampered {
        /// Transaction id of the rejected token
        tx: TransactionId,
    },

    /// The token's validity window elapsed
    ///
    /// Indicates stale data rather than tampering; fatal to the attempt.
    #[error("token for transaction {tx} has expired")]
    Expired {
        /// Transaction id of the stale token
        tx: TransactionId,
    },

    /// The requested debit exceeds the account balance
    ///
    /// A business-rule failure, not a system fault; the balance is left
    /// unchanged and the user may reduce the amount or top up.
    #[error(
        "insufficient balance for account {account}: balance {balance}, requested {requested}"
    )]
    InsufficientBalance {
        /// Account id
        account: AccountId,
        /// Current balance
        balance: Decimal,
        /// Requested debit amount
        requested: Decimal,
    },

    /// A completion was attempted for a transaction id that already
    /// settled
    ///
    /// The at-most-once guard: a duplicate scan of the same token is
    /// rejected here instead of double-debiting.
    #[error("transaction {tx} already settled against account {account}")]
    DuplicateSettlement {
        /// Transaction id
        tx: TransactionId,
        /// Account id
        account: AccountId,
    },

    /// The submitted credential did not match the stored one
    #[error("credential check failed for account {account}")]
    BadCredential {
        /// Account id the credential was checked against
        account: AccountId,
    },

    /// No account exists for the given identifier
    #[error("account {account} not found")]
    AccountNotFound {
        /// Account id
        account: AccountId,
    },

    /// An operation was invoked in a state that does not accept it
    ///
    /// For example submitting a credential while still `Scanning`.
    #[error("operation '{operation}' is not valid in state '{state}'")]
    InvalidState {
        /// The attempted operation
        operation: String,
        /// The state the flow was in
        state: String,
    },

    /// Arithmetic overflow would occur
    ///
    /// The operation is rejected and the account left unchanged.
    #[error("arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account id
        account: AccountId,
    },

    /// Arithmetic underflow would occur
    ///
    /// The operation is rejected and the account left unchanged.
    #[error("arithmetic underflow in {operation} for account {account}")]
    ArithmeticUnderflow {
        /// Operation that would underflow
        operation: String,
        /// Account id
        account: AccountId,
    },

    /// Supplied key material could not be parsed
    ///
    /// Deliberately vague about the exact defect; key bytes are never
    /// echoed back in error messages.
    #[error("invalid key material")]
    InvalidKey,

    /// I/O or serialization failure in the account store
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure
        message: String,
    },
}

impl From<std::io::Error> for PaymentError {
    fn from(error: std::io::Error) -> Self {
        PaymentError::Storage {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(error: serde_json::Error) -> Self {
        PaymentError::Storage {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl PaymentError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        PaymentError::InvalidAmount { amount }
    }

    /// Create an InvalidRecipient error
    pub fn invalid_recipient(recipient: &str) -> Self {
        PaymentError::InvalidRecipient {
            recipient: recipient.to_string(),
        }
    }

    /// Create an AlreadySigned error
    pub fn already_signed(tx: TransactionId) -> Self {
        PaymentError::AlreadySigned { tx }
    }

    /// Create a MissingSignature error
    pub fn missing_signature(tx: TransactionId) -> Self {
        PaymentError::MissingSignature { tx }
    }

    /// Create a Tampered error
    pub fn tampered(tx: TransactionId) -> Self {
        PaymentError::Tampered { tx }
    }

    /// Create an Expired error
    pub fn expired(tx: TransactionId) -> Self {
        PaymentError::Expired { tx }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(
        account: &str,
        balance: Decimal,
        requested: Decimal,
    ) -> Self {
        PaymentError::InsufficientBalance {
            account: account.to_string(),
            balance,
            requested,
        }
    }

    /// Create a DuplicateSettlement error
    pub fn duplicate_settlement(tx: TransactionId, account: &str) -> Self {
        PaymentError::DuplicateSettlement {
            tx,
            account: account.to_string(),
        }
    }

    /// Create a BadCredential error
    pub fn bad_credential(account: &str) -> Self {
        PaymentError::BadCredential {
            account: account.to_string(),
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: &str) -> Self {
        PaymentError::AccountNotFound {
            account: account.to_string(),
        }
    }

    /// Create an InvalidState error
    pub fn invalid_state(operation: &str, state: &str) -> Self {
        PaymentError::InvalidState {
            operation: operation.to_string(),
            state: state.to_string(),
        }
    }

    /// Create an UnsupportedSchema error
    pub fn unsupported_schema(schema: &str) -> Self {
        PaymentError::UnsupportedSchema {
            schema: schema.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: &str) -> Self {
        PaymentError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    /// Create an ArithmeticUnderflow error
    pub fn arithmetic_underflow(operation: &str, account: &str) -> Self {
        PaymentError::ArithmeticUnderflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        PaymentError::Storage {
            message: message.into(),
        }
    }
}
