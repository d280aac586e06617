//! Account ledger
//!
//! Process-wide balances plus the append-only transaction log, with
//! debit/credit invariant checks. Accounts live in a `DashMap`, so every
//! check-then-mutate sequence for one account runs under that account's
//! entry lock: no interleaved reader ever observes a partially applied
//! debit, and two settlements racing on the same account serialize even
//! though the credential check in between is asynchronous. Accounts are
//! independent serialization domains; no cross-account locking exists.

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::types::{
    Account, AccountId, EntryDirection, FailureReason, LedgerEntry, PaymentError, Transaction,
    TransactionStatus,
};

/// Shared ledger of local accounts
///
/// Only the operations here mutate balances; every read hands out a
/// cloned snapshot.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Accounts keyed by id; the entry lock is the per-account
    /// serialization domain
    accounts: DashMap<AccountId, Account>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Ledger {
            accounts: DashMap::new(),
        }
    }

    /// Open an account with an opening balance, or return the existing
    /// one
    ///
    /// # Returns
    ///
    /// A snapshot of the account after the call.
    pub fn open_account(&self, id: &str, opening_balance: Decimal) -> Account {
        self.accounts
            .entry(id.to_string())
            .or_insert_with(|| Account::with_balance(id, opening_balance))
            .clone()
    }

    /// Insert a fully formed account, replacing any existing state
    ///
    /// Bridge for the persistence layer: a stored account loaded at
    /// startup enters the ledger through here.
    pub fn insert_account(&self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    /// Current balance of an account
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::AccountNotFound` if no such account exists.
    pub fn balance_of(&self, id: &str) -> Result<Decimal, PaymentError> {
        self.accounts
            .get(id)
            .map(|account| account.balance)
            .ok_or_else(|| PaymentError::account_not_found(id))
    }

    /// Read-only snapshot of an account, if it exists
    pub fn account_snapshot(&self, id: &str) -> Option<Account> {
        self.accounts.get(id).map(|account| account.clone())
    }

    /// Snapshot of every account, in no particular order
    pub fn snapshot_all(&self) -> Vec<Account> {
        self.accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// The account's entry log, oldest first
    pub fn history(&self, id: &str) -> Vec<LedgerEntry> {
        self.accounts
            .get(id)
            .map(|account| account.entries.clone())
            .unwrap_or_default()
    }

    /// Record a freshly issued, still-pending transaction
    ///
    /// Appended on the payer side at issuance, before any settlement
    /// outcome is known, so history views can show outstanding requests.
    /// Creates the account if it does not exist yet.
    pub fn record_pending(&self, id: &str, transaction: &Transaction) {
        let mut account = self
            .accounts
            .entry(id.to_string())
            .or_insert_with(|| Account::new(id));
        account.entries.push(LedgerEntry::for_transaction(
            transaction,
            EntryDirection::Debit,
            transaction.amount,
            TransactionStatus::Pending,
            None,
        ));
        debug!(account = id, tx = %transaction.id, "recorded pending transaction");
    }

    /// Record the terminal failure of a settlement attempt
    ///
    /// Appends exactly one failed entry carrying the reason; never
    /// touches the balance.
    pub fn record_failure(&self, id: &str, transaction: &Transaction, reason: FailureReason) {
        let mut account = self
            .accounts
            .entry(id.to_string())
            .or_insert_with(|| Account::new(id));
        account.entries.push(LedgerEntry::for_transaction(
            transaction,
            EntryDirection::Debit,
            transaction.amount,
            TransactionStatus::Failed,
            Some(reason),
        ));
    }

    /// Debit the confirmed amount for a settled transaction
    ///
    /// The whole check-then-mutate sequence runs under the account's
    /// entry lock. Settlement is idempotent per transaction id: a second
    /// completion for an id that already settled is rejected instead of
    /// double-debiting.
    ///
    /// # Arguments
    ///
    /// * `id` - Account to debit
    /// * `transaction` - The settled transaction (for the log entry)
    /// * `amount` - Confirmed amount; may differ from the token amount
    ///   in the open-ended payment model
    ///
    /// # Returns
    ///
    /// A snapshot of the account after the debit.
    ///
    /// # Errors
    ///
    /// * `PaymentError::AccountNotFound` - no such account; a debit
    ///   never creates one
    /// * `PaymentError::DuplicateSettlement` - `transaction.id` already
    ///   has a completed entry
    /// * `PaymentError::InsufficientBalance` - `amount > balance`; the
    ///   balance is left unchanged
    /// * `PaymentError::ArithmeticUnderflow` - the subtraction would
    ///   underflow
    pub fn debit(
        &self,
        id: &str,
        transaction: &Transaction,
        amount: Decimal,
    ) -> Result<Account, PaymentError> {
        let mut account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| PaymentError::account_not_found(id))?;

        if account.has_completed(transaction.id) {
            return Err(PaymentError::duplicate_settlement(transaction.id, id));
        }

        if amount > account.balance {
            return Err(PaymentError::insufficient_balance(
                id,
                account.balance,
                amount,
            ));
        }

        let new_balance = account
            .balance
            .checked_sub(amount)
            .ok_or_else(|| PaymentError::arithmetic_underflow("debit", id))?;

        account.balance = new_balance;
        account.entries.push(LedgerEntry::for_transaction(
            transaction,
            EntryDirection::Debit,
            amount,
            TransactionStatus::Completed,
            None,
        ));

        info!(account = id, tx = %transaction.id, %amount, balance = %new_balance, "debit settled");
        Ok(account.clone())
    }

    /// Credit an amount to an account
    ///
    /// Always succeeds for a positive amount; same atomicity guarantee
    /// as [`debit`](Self::debit). Creates the account if needed.
    ///
    /// # Errors
    ///
    /// * `PaymentError::InvalidAmount` - `amount <= 0`
    /// * `PaymentError::ArithmeticOverflow` - the addition would
    ///   overflow
    pub fn credit(
        &self,
        id: &str,
        transaction: &Transaction,
        amount: Decimal,
    ) -> Result<Account, PaymentError> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::invalid_amount(amount));
        }

        let mut account = self
            .accounts
            .entry(id.to_string())
            .or_insert_with(|| Account::new(id));

        let new_balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| PaymentError::arithmetic_overflow("credit", id))?;

        account.balance = new_balance;
        account.entries.push(LedgerEntry::for_transaction(
            transaction,
            EntryDirection::Credit,
            amount,
            TransactionStatus::Completed,
            None,
        ));

        info!(account = id, tx = %transaction.id, %amount, balance = %new_balance, "credit applied");
        Ok(account.clone())
    }
}
