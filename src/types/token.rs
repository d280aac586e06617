//! QR token types for the QR payment engine
//!
//! A `QrToken` is the signing envelope placed into a scannable payload:
//! the signed transaction, the public key to verify it against, and the
//! validity window that time-bounds the whole artifact.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::PaymentError;
use super::transaction::Transaction;

/// Validity window configuration for issued tokens
///
/// The window is a configuration value, never a hardcoded literal at the
/// issuance site. Two presets match the observed payment models: a short
/// instant-pay window for codes displayed on screen, and a longer one
/// for durable payment requests shared out-of-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityConfig {
    /// Number of seconds the token stays valid after issuance
    pub seconds: u64,
}

impl ValidityConfig {
    /// Instant-pay window: the code is expected to be scanned while
    /// displayed
    pub const INSTANT_PAY: ValidityConfig = ValidityConfig { seconds: 10 };

    /// Durable payment request window
    pub const PAYMENT_REQUEST: ValidityConfig = ValidityConfig { seconds: 300 };

    /// Upper bound on any validity window (one year)
    ///
    /// `validity_secs` arrives over the wire and is not covered by the
    /// transaction signature, so every consumer treats values above this
    /// bound as invalid input rather than as a far-future deadline.
    pub const MAX_SECS: u64 = 31_536_000;

    /// Custom validity window, clamped to [`MAX_SECS`](Self::MAX_SECS)
    pub const fn new(seconds: u64) -> Self {
        let seconds = if seconds > Self::MAX_SECS {
            Self::MAX_SECS
        } else {
            seconds
        };
        ValidityConfig { seconds }
    }
}

impl Default for ValidityConfig {
    fn default() -> Self {
        Self::INSTANT_PAY
    }
}

/// A signed, time-bounded payment token
///
/// Valid iff `now < issued_at + validity_secs` and the embedded
/// transaction is still pending. The token exclusively owns its
/// transaction until a peer decodes the payload, at which point the peer
/// holds an independent copy - tamper evidence comes from signature
/// verification, not from trust in the transport channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrToken {
    /// The signed transaction this token transports
    pub transaction: Transaction,

    /// Hex-encoded public key to verify `transaction.signature` against
    pub public_key: String,

    /// Issuance instant (UTC)
    pub issued_at: DateTime<Utc>,

    /// Validity window in seconds, fixed at issuance
    pub validity_secs: u64,
}

impl QrToken {
    /// Wrap a signed transaction into a token issued now
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::MissingSignature` if the transaction has
    /// not been signed yet; an unsigned transaction must never reach a
    /// scannable payload.
    pub fn issue(
        transaction: Transaction,
        public_key: impl Into<String>,
        validity: ValidityConfig,
    ) -> Result<Self, PaymentError> {
        if !transaction.is_signed() {
            return Err(PaymentError::missing_signature(transaction.id));
        }
        Ok(QrToken {
            transaction,
            public_key: public_key.into(),
            issued_at: Utc::now(),
            validity_secs: validity.seconds,
        })
    }

    /// Override the issuance instant
    ///
    /// Exists so tests and replays can construct tokens whose deadline
    /// is already in the past without sleeping through a real window.
    pub fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = issued_at;
        self
    }

    /// The instant this token stops being valid
    ///
    /// Total for any wire value: windows beyond
    /// [`ValidityConfig::MAX_SECS`] are clamped to the bound instead of
    /// overflowing date arithmetic.
    pub fn deadline(&self) -> DateTime<Utc> {
        let secs = self.validity_secs.min(ValidityConfig::MAX_SECS);
        self.issued_at + Duration::seconds(secs as i64)
    }
}
