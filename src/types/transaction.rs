//! Transaction-related types for the QR payment engine
//!
//! This module defines the core `Transaction` record that is signed,
//! embedded in a QR token, transported to the payee, and finally settled
//! against the local ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::error::PaymentError;

/// Opaque account identifier
///
/// Accounts are identified by caller-supplied strings (wallet addresses,
/// merchant handles, ...). The engine never interprets their contents.
pub type AccountId = String;

/// Unique transaction identifier
///
/// Generated once at construction (UUID v4) and never reused. A resend of
/// a failed or expired payment is a brand-new transaction with a new id.
pub type TransactionId = Uuid;

/// Lifecycle status of a transaction
///
/// A transaction starts `Pending` when the payer issues a token for it.
/// It leaves `Pending` exactly once: to `Completed` on successful
/// settlement, to `Failed` when settlement is rejected, or to `Expired`
/// when the token's validity window elapses first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Issued but not yet settled; the only state a token is valid in
    Pending,

    /// Settled successfully; the confirmed amount has been debited
    Completed,

    /// Settlement was rejected (bad credential, tamper, cancellation, ...)
    Failed,

    /// The validity window elapsed before settlement completed
    Expired,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Why a settlement attempt ended in a terminal failure
///
/// Recorded on the failed ledger entry and logged, so that tamper and
/// replay indicators (`Tampered`, `Expired`) remain distinguishable from
/// ordinary user mistakes in later audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The token's validity window elapsed before settlement completed
    Expired,

    /// The submitted credential did not match the stored one
    BadCredential,

    /// The confirmed amount exceeded the account balance
    InsufficientBalance,

    /// The confirmed amount was zero or negative
    InvalidAmount,

    /// Signature verification failed; the payload was altered in transit
    Tampered,

    /// The user aborted the attempt before it completed
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::BadCredential => write!(f, "bad credential"),
            Self::InsufficientBalance => write!(f, "insufficient balance"),
            Self::InvalidAmount => write!(f, "invalid amount"),
            Self::Tampered => write!(f, "tampered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A payment transaction, immutable once signed
///
/// The monetary amount is a `rust_decimal::Decimal`, never a binary
/// float, so minor-currency-unit precision survives any number of
/// debits and credits exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, generated at creation and never reused
    pub id: TransactionId,

    /// Positive payment amount in currency minor-unit precision
    pub amount: Decimal,

    /// Account identifier of the paying side
    pub sender: AccountId,

    /// Account identifier of the receiving side
    pub recipient: AccountId,

    /// Optional free-text note attached by the payer
    pub description: Option<String>,

    /// Creation instant (UTC)
    pub timestamp: DateTime<Utc>,

    /// Current lifecycle status; excluded from the signature input
    pub status: TransactionStatus,

    /// Hex-encoded signature over the canonical fields
    ///
    /// Set exactly once, immediately after construction. A transaction
    /// is "signed" iff this field is populated.
    pub signature: Option<String>,
}

impl Transaction {
    /// Create a new pending, unsigned transaction
    ///
    /// Generates a fresh UUID and stamps the current UTC time.
    ///
    /// # Arguments
    ///
    /// * `sender` - Account identifier of the paying side
    /// * `recipient` - Account identifier of the receiving side
    /// * `amount` - Payment amount; must be strictly positive
    /// * `description` - Optional free-text note
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` if `amount <= 0` and
    /// `PaymentError::InvalidRecipient` if the recipient is empty.
    pub fn new(
        sender: impl Into<AccountId>,
        recipient: impl Into<AccountId>,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<Self, PaymentError> {
        let recipient = recipient.into();
        if amount <= Decimal::ZERO {
            return Err(PaymentError::invalid_amount(amount));
        }
        if recipient.is_empty() {
            return Err(PaymentError::invalid_recipient(&recipient));
        }

        Ok(Transaction {
            id: Uuid::new_v4(),
            amount,
            sender: sender.into(),
            recipient,
            description,
            timestamp: Utc::now(),
            status: TransactionStatus::Pending,
            signature: None,
        })
    }

    /// Whether this transaction carries a signature
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Attach a signature to an unsigned transaction
    ///
    /// A signature is written exactly once; re-signing an already signed
    /// transaction is rejected. Resending a payment requires a brand-new
    /// transaction with a brand-new id.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::AlreadySigned` if a signature is present.
    pub fn attach_signature(&mut self, signature: String) -> Result<(), PaymentError> {
        if self.signature.is_some() {
            return Err(PaymentError::already_signed(self.id));
        }
        self.signature = Some(signature);
        Ok(())
    }

    /// Canonical, stable serialization of the signable fields
    ///
    /// Covers `{id, amount, sender, recipient, timestamp, description}`
    /// and deliberately excludes `status` and any prior `signature`, so
    /// bookkeeping transitions never invalidate a signature.
    ///
    /// Every field is length-prefixed, so field boundaries never depend
    /// on field content: sender, recipient, and description are opaque
    /// caller-controlled strings, and the encoding stays injective no
    /// matter what bytes they contain. A one-byte presence marker keeps
    /// a missing description distinct from an empty one. The encoding is
    /// total and deterministic.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        fn push_field(bytes: &mut Vec<u8>, field: &str) {
            bytes.extend_from_slice(&(field.len() as u64).to_be_bytes());
            bytes.extend_from_slice(field.as_bytes());
        }

        let mut bytes = Vec::new();
        push_field(&mut bytes, &self.id.to_string());
        push_field(&mut bytes, &self.amount.to_string());
        push_field(&mut bytes, &self.sender);
        push_field(&mut bytes, &self.recipient);
        push_field(&mut bytes, &self.timestamp.to_rfc3339());
        match &self.description {
            Some(text) => {
                bytes.push(1);
                push_field(&mut bytes, text);
            }
            None => bytes.push(0),
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Transaction {
        Transaction::new(
            "wallet_alice",
            "wallet_bob",
            Decimal::new(50000, 2), // 500.00
            Some("lunch".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_new_transaction_is_pending_and_unsigned() {
        let tx = sample();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(!tx.is_signed());
        assert_eq!(tx.amount, Decimal::new(50000, 2));
    }

    #[rstest]
    #[case::zero(Decimal::ZERO)]
    #[case::negative(Decimal::new(-100, 2))]
    fn test_new_rejects_non_positive_amount(#[case] amount: Decimal) {
        let result = Transaction::new("a", "b", amount, None);
        assert!(matches!(
            result.unwrap_err(),
            PaymentError::InvalidAmount { .. }
        ));
    }

    #[test]
    fn test_new_rejects_empty_recipient() {
        let result = Transaction::new("a", "", Decimal::ONE, None);
        assert!(matches!(
            result.unwrap_err(),
            PaymentError::InvalidRecipient { .. }
        ));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = sample();
        let b = sample();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_attach_signature_once() {
        let mut tx = sample();
        tx.attach_signature("aabb".to_string()).unwrap();
        assert!(tx.is_signed());

        let result = tx.attach_signature("ccdd".to_string());
        assert!(matches!(
            result.unwrap_err(),
            PaymentError::AlreadySigned { .. }
        ));
        assert_eq!(tx.signature.as_deref(), Some("aabb"));
    }

    #[test]
    fn test_canonical_bytes_excludes_status_and_signature() {
        let mut tx = sample();
        let before = tx.canonical_bytes();

        tx.status = TransactionStatus::Completed;
        tx.signature = Some("aabb".to_string());

        assert_eq!(tx.canonical_bytes(), before);
    }

    #[test]
    fn test_canonical_bytes_changes_with_amount() {
        let mut tx = sample();
        let before = tx.canonical_bytes();

        tx.amount = Decimal::new(50001, 2);

        assert_ne!(tx.canonical_bytes(), before);
    }

    #[test]
    fn test_canonical_bytes_are_injective_across_field_boundaries() {
        // Embedded separators must not let content shift between
        // fields: "alice\nbob" / "carol" and "alice" / "bob\ncarol"
        // are different transactions and must encode differently.
        let mut a = Transaction::new("alice\nbob", "carol", Decimal::ONE, None).unwrap();
        let mut b = a.clone();
        b.sender = "alice".to_string();
        b.recipient = "bob\ncarol".to_string();

        assert_ne!(a.canonical_bytes(), b.canonical_bytes());

        // Same shift between recipient and description.
        a.recipient = "carol".to_string();
        a.description = Some("note".to_string());
        b = a.clone();
        b.recipient = "carol\nnote".to_string();
        b.description = Some(String::new());
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn test_canonical_bytes_distinguishes_missing_and_empty_description() {
        let mut tx = sample();
        tx.description = None;
        let none = tx.canonical_bytes();

        tx.description = Some(String::new());
        let empty = tx.canonical_bytes();

        assert_ne!(none, empty);
    }

    #[test]
    fn test_serde_round_trip_preserves_amount_precision() {
        let tx = sample();
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.amount.to_string(), "500.00");
    }
}
