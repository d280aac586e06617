//! Account-related types for the QR payment engine
//!
//! This module defines the Account structure with its balance and
//! append-only transaction log, plus the LedgerEntry rows that make up
//! that log.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::{
    AccountId, FailureReason, Transaction, TransactionId, TransactionStatus,
};

/// Direction of a ledger entry relative to its owning account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    /// The amount left the account
    Debit,

    /// The amount entered the account
    Credit,
}

/// One row of an account's append-only transaction log
///
/// Created when a transaction is recorded pending at issuance and again
/// when it transitions out of `pending`. Never mutated after creation;
/// corrections are new entries, not edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Id of the transaction this entry documents
    pub tx_id: TransactionId,

    /// Direction of the movement relative to the owning account
    pub direction: EntryDirection,

    /// Amount the entry documents
    pub amount: Decimal,

    /// Status the transaction held when the entry was written
    pub status: TransactionStatus,

    /// Failure reason for failed/expired outcomes
    ///
    /// Kept on the entry so audits can separate tamper and replay
    /// indicators from ordinary user mistakes.
    pub reason: Option<FailureReason>,

    /// Counterparty account id
    pub counterparty: AccountId,

    /// Instant the entry was appended
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Build an entry documenting `transaction` at the given status
    ///
    /// The counterparty is derived from the transaction: for a debit the
    /// funds flow to the recipient, for a credit they come from the
    /// sender.
    pub fn for_transaction(
        transaction: &Transaction,
        direction: EntryDirection,
        amount: Decimal,
        status: TransactionStatus,
        reason: Option<FailureReason>,
    ) -> Self {
        let counterparty = match direction {
            EntryDirection::Debit => transaction.recipient.clone(),
            EntryDirection::Credit => transaction.sender.clone(),
        };
        LedgerEntry {
            tx_id: transaction.id,
            direction,
            amount,
            status,
            reason,
            counterparty,
            recorded_at: Utc::now(),
        }
    }
}

/// A local account: non-negative balance plus its owned entry log
///
/// Only the ledger's debit/credit operations mutate `balance`; every
/// other reader works on a cloned snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Opaque account identifier
    pub id: AccountId,

    /// Current balance; the ledger never lets this go negative
    pub balance: Decimal,

    /// Ordered, append-only sequence of ledger entries owned by this
    /// account
    pub entries: Vec<LedgerEntry>,
}

impl Account {
    /// Create a new account with a zero balance and an empty log
    pub fn new(id: impl Into<AccountId>) -> Self {
        Account {
            id: id.into(),
            balance: Decimal::ZERO,
            entries: Vec::new(),
        }
    }

    /// Create a new account with an opening balance
    pub fn with_balance(id: impl Into<AccountId>, balance: Decimal) -> Self {
        Account {
            id: id.into(),
            balance,
            entries: Vec::new(),
        }
    }

    /// Whether an entry for `tx_id` has already been written as
    /// completed
    ///
    /// The at-most-once settlement guard keys off this check.
    pub fn has_completed(&self, tx_id: TransactionId) -> bool {
        self.entries
            .iter()
            .any(|e| e.tx_id == tx_id && e.status == TransactionStatus::Completed)
    }
}
