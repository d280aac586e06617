//! Scan-side settlement flow
//!
//! The payee-side state machine that takes a raw scanned payload and
//! drives it to a terminal outcome:
//!
//! ```text
//! Scanning -> Reviewing -> Confirming -> { Succeeded | Failed }
//! ```
//!
//! Decode problems are recoverable and keep the flow in `Scanning`; a
//! failed signature check is fatal and never downgraded to a retry. The
//! credential check is the only true suspension point: it is raced
//! against the token deadline, and a credential result arriving after
//! expiry is discarded, never applied retroactively. Terminal states
//! are final - a fresh attempt means a brand-new flow and, if the payer
//! retries, a brand-new transaction id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use super::credential::CredentialStore;
use super::ledger::Ledger;
use super::lifecycle::TokenLifecycle;
use crate::codec;
use crate::crypto::verify_transaction;
use crate::types::{
    AccountId, FailureReason, PaymentError, QrToken, TransactionId, TransactionStatus,
};

/// Proof of a completed settlement
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementReceipt {
    /// Id of the settled transaction
    pub tx_id: TransactionId,

    /// Amount actually debited (the confirmed amount)
    pub amount: Decimal,

    /// Account the funds went to
    pub counterparty: AccountId,

    /// Balance of the local account after the debit
    pub new_balance: Decimal,

    /// Settlement instant
    pub settled_at: DateTime<Utc>,
}

/// State of one settlement attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    /// Waiting for a decodable payload
    Scanning,

    /// Token accepted; the payee reviews/edits the amount
    Reviewing {
        /// The verified token under review
        token: QrToken,
    },

    /// Amount confirmed; awaiting the credential challenge
    Confirming {
        /// The verified token being settled
        token: QrToken,
        /// The confirmed amount to debit
        amount: Decimal,
    },

    /// Terminal: exactly one debit was applied
    Succeeded {
        /// Settlement proof
        receipt: SettlementReceipt,
    },

    /// Terminal: no debit was applied
    Failed {
        /// Why the attempt died
        reason: FailureReason,
    },
}

impl FlowState {
    /// Short state name for errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scanning => "Scanning",
            Self::Reviewing { .. } => "Reviewing",
            Self::Confirming { .. } => "Confirming",
            Self::Succeeded { .. } => "Succeeded",
            Self::Failed { .. } => "Failed",
        }
    }

    /// Whether this state accepts no further operations
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

/// The scan-side settlement state machine
///
/// Owns one attempt from scan to terminal outcome. The local account to
/// debit is injected at construction rather than read from ambient
/// state, and all balance mutations go through the shared [`Ledger`],
/// whose per-account entry lock serializes concurrent attempts.
pub struct SettlementFlow {
    ledger: Arc<Ledger>,
    credentials: Arc<CredentialStore>,
    account: AccountId,
    state: FlowState,
}

impl SettlementFlow {
    /// Start a fresh attempt in `Scanning`
    ///
    /// # Arguments
    ///
    /// * `ledger` - Shared ledger holding the local account
    /// * `credentials` - Credential store for the confirmation challenge
    /// * `account` - Id of the local account settlement will debit
    pub fn new(
        ledger: Arc<Ledger>,
        credentials: Arc<CredentialStore>,
        account: impl Into<AccountId>,
    ) -> Self {
        SettlementFlow {
            ledger,
            credentials,
            account: account.into(),
            state: FlowState::Scanning,
        }
    }

    /// Current state
    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Whether the attempt has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The token amount proposed by the payer, if reviewable
    ///
    /// Pre-fill source for the fixed-request payment model; the payee
    /// may confirm it as-is or enter a different amount.
    pub fn token_amount(&self) -> Option<Decimal> {
        match &self.state {
            FlowState::Reviewing { token } | FlowState::Confirming { token, .. } => {
                Some(token.transaction.amount)
            }
            _ => None,
        }
    }

    /// Feed a raw scanned payload into the flow
    ///
    /// Decode failures and unsigned legacy schemas are recoverable: the
    /// flow stays in `Scanning` and the caller may scan again. A signed
    /// token is verified and checked for freshness before the flow moves
    /// to `Reviewing`.
    ///
    /// # Errors
    ///
    /// * `PaymentError::Decode` / `UnsupportedSchema` - recoverable,
    ///   state unchanged
    /// * `PaymentError::Tampered` - verification failed; flow is now
    ///   `Failed(Tampered)`
    /// * `PaymentError::Expired` - stale or non-pending token; flow is
    ///   now `Failed(Expired)`
    /// * `PaymentError::InvalidState` - the flow already left `Scanning`
    pub fn scan(&mut self, raw: &str) -> Result<&FlowState, PaymentError> {
        if !matches!(self.state, FlowState::Scanning) {
            return Err(PaymentError::invalid_state("scan", self.state.name()));
        }

        let payload = codec::decode(raw)?;
        let token = payload.into_token()?;

        let tx = &token.transaction;
        let signature = tx.signature.as_deref().unwrap_or("");
        if !verify_transaction(tx, signature, &token.public_key) {
            warn!(
                tx = %tx.id,
                "signature verification failed: tampered or replayed payload"
            );
            let err = PaymentError::tampered(tx.id);
            self.fail_with(token, FailureReason::Tampered);
            return Err(err);
        }

        if tx.status != TransactionStatus::Pending {
            warn!(tx = %tx.id, status = %tx.status, "token is no longer pending");
            let err = PaymentError::expired(tx.id);
            self.fail_with(token, FailureReason::Expired);
            return Err(err);
        }

        if !TokenLifecycle::for_token(&token).is_valid() {
            warn!(tx = %tx.id, "token expired before review");
            let err = PaymentError::expired(tx.id);
            self.fail_with(token, FailureReason::Expired);
            return Err(err);
        }

        self.state = FlowState::Reviewing { token };
        Ok(&self.state)
    }

    /// Confirm the amount to settle
    ///
    /// # Errors
    ///
    /// * `PaymentError::InvalidAmount` - `amount <= 0`; flow stays in
    ///   `Reviewing`
    /// * `PaymentError::InsufficientBalance` - exceeds the account
    ///   balance; flow stays in `Reviewing`
    /// * `PaymentError::Expired` - the token expired while reviewing;
    ///   flow is now `Failed(Expired)`
    /// * `PaymentError::AccountNotFound` - the injected account does not
    ///   exist in the ledger
    /// * `PaymentError::InvalidState` - the flow is not in `Reviewing`
    pub fn confirm_amount(&mut self, amount: Decimal) -> Result<&FlowState, PaymentError> {
        let token = match &self.state {
            FlowState::Reviewing { token } => token.clone(),
            other => {
                return Err(PaymentError::invalid_state("confirm_amount", other.name()))
            }
        };

        if !TokenLifecycle::for_token(&token).is_valid() {
            warn!(tx = %token.transaction.id, "token expired while reviewing");
            let err = PaymentError::expired(token.transaction.id);
            self.fail_with(token, FailureReason::Expired);
            return Err(err);
        }

        if amount <= Decimal::ZERO {
            return Err(PaymentError::invalid_amount(amount));
        }

        let balance = self.ledger.balance_of(&self.account)?;
        if amount > balance {
            return Err(PaymentError::insufficient_balance(
                &self.account,
                balance,
                amount,
            ));
        }

        self.state = FlowState::Confirming { token, amount };
        Ok(&self.state)
    }

    /// Confirm the amount the token itself proposes
    ///
    /// Convenience for the fixed-request model; equivalent to
    /// [`confirm_amount`](Self::confirm_amount) with the token amount.
    pub fn confirm_token_amount(&mut self) -> Result<&FlowState, PaymentError> {
        let amount = self
            .token_amount()
            .ok_or_else(|| PaymentError::invalid_state("confirm_amount", self.state.name()))?;
        self.confirm_amount(amount)
    }

    /// Submit the transaction-level credential and settle
    ///
    /// The check is asynchronous and raced against the token deadline:
    /// if expiry is observed first the attempt fails with
    /// `Failed(Expired)` and the credential result, should it arrive
    /// later, is discarded. Exactly one of success, failure, or
    /// cancellation is ever applied per attempt.
    ///
    /// # Errors
    ///
    /// * `PaymentError::Expired` - deadline passed mid-check; flow is
    ///   now `Failed(Expired)`
    /// * `PaymentError::BadCredential` - mismatch; flow is now
    ///   `Failed(BadCredential)`
    /// * `PaymentError::InsufficientBalance` - balance changed since
    ///   review; flow is now `Failed(InsufficientBalance)`
    /// * `PaymentError::DuplicateSettlement` - this transaction id has
    ///   already settled (replay); flow is now `Failed(Tampered)`
    /// * `PaymentError::InvalidState` - the flow is not in `Confirming`
    pub async fn submit_credential(
        &mut self,
        secret: &str,
    ) -> Result<&FlowState, PaymentError> {
        let (token, amount) = match &self.state {
            FlowState::Confirming { token, amount } => (token.clone(), *amount),
            other => {
                return Err(PaymentError::invalid_state(
                    "submit_credential",
                    other.name(),
                ))
            }
        };

        let lifecycle = TokenLifecycle::for_token(&token);

        // The deadline arm is polled first so that a token that is both
        // expired and verified fails closed.
        let matched = tokio::select! {
            biased;
            _ = lifecycle.expired() => None,
            ok = self.credentials.verify(&self.account, secret) => Some(ok),
        };

        let Some(matched) = matched else {
            warn!(
                tx = %token.transaction.id,
                "token expired during credential check; late result discarded"
            );
            let err = PaymentError::expired(token.transaction.id);
            self.fail_with(token, FailureReason::Expired);
            return Err(err);
        };

        if !matched {
            let err = PaymentError::bad_credential(&self.account);
            self.fail_with(token, FailureReason::BadCredential);
            return Err(err);
        }

        match self.ledger.debit(&self.account, &token.transaction, amount) {
            Ok(account) => {
                let receipt = SettlementReceipt {
                    tx_id: token.transaction.id,
                    amount,
                    counterparty: token.transaction.recipient.clone(),
                    new_balance: account.balance,
                    settled_at: Utc::now(),
                };
                info!(
                    tx = %receipt.tx_id,
                    %amount,
                    balance = %receipt.new_balance,
                    "settlement succeeded"
                );
                self.state = FlowState::Succeeded { receipt };
                Ok(&self.state)
            }
            Err(err @ PaymentError::InsufficientBalance { .. }) => {
                self.fail_with(token, FailureReason::InsufficientBalance);
                Err(err)
            }
            Err(err @ PaymentError::DuplicateSettlement { .. }) => {
                // An already-settled id resurfacing is a replay, which
                // audits group with integrity failures.
                warn!(tx = %token.transaction.id, "replayed token: id already settled");
                self.fail_with(token, FailureReason::Tampered);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Abort the attempt
    ///
    /// Valid from any non-terminal state; records a failed entry when a
    /// token had already been accepted.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidState` if the flow already reached
    /// a terminal state.
    pub fn cancel(&mut self) -> Result<&FlowState, PaymentError> {
        match std::mem::replace(&mut self.state, FlowState::Scanning) {
            terminal @ (FlowState::Succeeded { .. } | FlowState::Failed { .. }) => {
                let name = terminal.name();
                self.state = terminal;
                Err(PaymentError::invalid_state("cancel", name))
            }
            FlowState::Scanning => {
                self.state = FlowState::Failed {
                    reason: FailureReason::Cancelled,
                };
                Ok(&self.state)
            }
            FlowState::Reviewing { token } | FlowState::Confirming { token, .. } => {
                self.fail_with(token, FailureReason::Cancelled);
                Ok(&self.state)
            }
        }
    }

    /// Move to `Failed`, updating the local transaction copy and the
    /// audit log
    fn fail_with(&mut self, mut token: QrToken, reason: FailureReason) {
        match reason {
            FailureReason::Expired => TokenLifecycle::mark_expired(&mut token.transaction),
            _ => {
                if token.transaction.status == TransactionStatus::Pending {
                    token.transaction.status = TransactionStatus::Failed;
                }
            }
        }
        self.ledger
            .record_failure(&self.account, &token.transaction, reason);
        self.state = FlowState::Failed { reason };
    }
}
