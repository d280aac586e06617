//! Token lifecycle management
//!
//! A token is `Active` from issuance until its deadline and `Expired`
//! afterwards, terminally. The state is derived purely from timestamps:
//! no running timer is required for correctness, so a client that slept
//! through the deadline still reports `Expired` on its next query. The
//! async [`TokenLifecycle::expired`] wait exists only as a convenience
//! for racing a deadline against other work; it never carries state of
//! its own.

use chrono::{DateTime, Duration, Utc};

use crate::types::{QrToken, Transaction, TransactionStatus, ValidityConfig};

/// Lifecycle state of a token
///
/// `Active → Expired` fires exactly once; `Expired` is terminal and no
/// token re-enters `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// The validity window is still open
    Active,

    /// The deadline has passed; any in-flight settlement must fail fast
    Expired,
}

/// Passive, re-derivable countdown over a token's validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifecycle {
    issued_at: DateTime<Utc>,
    validity: Duration,
}

impl TokenLifecycle {
    /// Build a lifecycle from an issuance instant and window length
    ///
    /// The window length arrives from decoded payloads and is clamped to
    /// [`ValidityConfig::MAX_SECS`]; absurd wire values never reach
    /// chrono's panicking duration arithmetic.
    pub fn new(issued_at: DateTime<Utc>, validity_secs: u64) -> Self {
        let secs = validity_secs.min(ValidityConfig::MAX_SECS);
        TokenLifecycle {
            issued_at,
            validity: Duration::seconds(secs as i64),
        }
    }

    /// Build the lifecycle governing a token
    pub fn for_token(token: &QrToken) -> Self {
        Self::new(token.issued_at, token.validity_secs)
    }

    /// The instant the window closes
    pub fn deadline(&self) -> DateTime<Utc> {
        self.issued_at + self.validity
    }

    /// State at an explicit instant; the timestamp comparison is the
    /// single source of truth
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if now < self.deadline() {
            TokenState::Active
        } else {
            TokenState::Expired
        }
    }

    /// Current state against the wall clock
    pub fn state(&self) -> TokenState {
        self.state_at(Utc::now())
    }

    /// Whether the token is still inside its validity window
    ///
    /// Time-only check; callers that need the full token validity rule
    /// also require the embedded transaction to still be pending.
    pub fn is_valid(&self) -> bool {
        self.state() == TokenState::Active
    }

    /// `is_valid` at an explicit instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == TokenState::Active
    }

    /// Whole seconds left in the window at an explicit instant
    ///
    /// Monotonically non-increasing while `Active`; zero once expired.
    pub fn remaining_seconds_at(&self, now: DateTime<Utc>) -> u64 {
        let remaining = self.deadline() - now;
        remaining.num_seconds().max(0) as u64
    }

    /// Whole seconds left in the window against the wall clock
    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds_at(Utc::now())
    }

    /// Resolve when the deadline has passed
    ///
    /// Completes immediately if the window is already closed. Intended
    /// for racing against an asynchronous credential check; dropping the
    /// future has no effect on the lifecycle, which stays derivable from
    /// the timestamps alone.
    pub async fn expired(&self) {
        let now = Utc::now();
        if self.state_at(now) == TokenState::Expired {
            return;
        }
        let wait = (self.deadline() - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
    }

    /// Move a transaction out of `pending` because its token expired
    ///
    /// Only pending transactions transition; a transaction that already
    /// reached a terminal status keeps it.
    pub fn mark_expired(transaction: &mut Transaction) {
        if transaction.status == TransactionStatus::Pending {
            transaction.status = TransactionStatus::Expired;
        }
    }
}
