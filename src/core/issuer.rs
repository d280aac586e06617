//! Payer-side token issuance
//!
//! Builds the canonical transaction, signs it, records it pending in the
//! payer's ledger, and encodes the transport payload in one step - the
//! payer-side counterpart of the scan-side settlement flow. Display,
//! clipboard, and QR rendering collaborators receive the returned
//! payload string as opaque bytes.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use super::ledger::Ledger;
use super::lifecycle::TokenLifecycle;
use crate::codec;
use crate::crypto::{sign_in_place, Keypair};
use crate::types::{AccountId, PaymentError, QrToken, Transaction, ValidityConfig};

/// Parameters for one token issuance
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// Payer account id; also the account the pending entry lands on
    pub sender: AccountId,

    /// Receiving account id
    pub recipient: AccountId,

    /// Requested amount; must be strictly positive
    pub amount: Decimal,

    /// Optional free-text note carried in the transaction
    pub description: Option<String>,

    /// Validity window for the issued token
    pub validity: ValidityConfig,
}

/// Everything a caller needs after issuance
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The signed token
    pub token: QrToken,

    /// Encoded transport payload for the scannable artifact
    pub payload: String,

    /// Countdown handle for display collaborators
    pub lifecycle: TokenLifecycle,
}

/// Issues signed, time-bounded payment tokens for one payer identity
pub struct TokenIssuer {
    ledger: Arc<Ledger>,
    keypair: Keypair,
}

impl TokenIssuer {
    /// Create an issuer backed by the given ledger and signing identity
    pub fn new(ledger: Arc<Ledger>, keypair: Keypair) -> Self {
        TokenIssuer { ledger, keypair }
    }

    /// Construct, sign, record, and encode a payment token
    ///
    /// The transaction gets a fresh id and timestamp, is signed
    /// immediately after construction, and is recorded pending in the
    /// payer's ledger before the payload leaves this function.
    ///
    /// # Errors
    ///
    /// * `PaymentError::InvalidAmount` - the amount is not strictly
    ///   positive
    /// * `PaymentError::InvalidRecipient` - the recipient id is empty
    pub fn issue(&self, request: IssueRequest) -> Result<IssuedToken, PaymentError> {
        let mut transaction = Transaction::new(
            request.sender.clone(),
            request.recipient,
            request.amount,
            request.description,
        )?;
        sign_in_place(&mut transaction, &self.keypair)?;

        let token = QrToken::issue(
            transaction,
            self.keypair.public_key_hex(),
            request.validity,
        )?;
        self.ledger.record_pending(&request.sender, &token.transaction);

        let payload = codec::encode(&token);
        let lifecycle = TokenLifecycle::for_token(&token);

        info!(
            tx = %token.transaction.id,
            sender = %token.transaction.sender,
            recipient = %token.transaction.recipient,
            amount = %token.transaction.amount,
            validity_secs = token.validity_secs,
            "token issued"
        );

        Ok(IssuedToken {
            token,
            payload,
            lifecycle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::verify_transaction;
    use crate::types::TransactionStatus;

    fn issuer() -> (Arc<Ledger>, TokenIssuer) {
        let ledger = Arc::new(Ledger::new());
        let issuer = TokenIssuer::new(Arc::clone(&ledger), Keypair::generate());
        (ledger, issuer)
    }

    fn request(amount: Decimal) -> IssueRequest {
        IssueRequest {
            sender: "wallet_alice".to_string(),
            recipient: "wallet_bob".to_string(),
            amount,
            description: Some("groceries".to_string()),
            validity: ValidityConfig::INSTANT_PAY,
        }
    }

    #[test]
    fn test_issue_produces_verifiable_signed_token() {
        let (_, issuer) = issuer();
        let issued = issuer.issue(request(Decimal::new(50000, 2))).unwrap();

        let tx = &issued.token.transaction;
        assert!(tx.is_signed());
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(verify_transaction(
            tx,
            tx.signature.as_deref().unwrap(),
            &issued.token.public_key
        ));
    }

    #[test]
    fn test_issue_records_pending_entry() {
        let (ledger, issuer) = issuer();
        let issued = issuer.issue(request(Decimal::new(50000, 2))).unwrap();

        let history = ledger.history("wallet_alice");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].tx_id, issued.token.transaction.id);
        assert_eq!(history[0].status, TransactionStatus::Pending);
    }

    #[test]
    fn test_issue_payload_round_trips() {
        let (_, issuer) = issuer();
        let issued = issuer.issue(request(Decimal::new(50000, 2))).unwrap();

        let payload = codec::decode(&issued.payload).unwrap();
        assert_eq!(payload.into_token().unwrap(), issued.token);
    }

    #[test]
    fn test_issue_rejects_bad_amount_without_recording() {
        let (ledger, issuer) = issuer();
        let result = issuer.issue(request(Decimal::ZERO));

        assert!(matches!(
            result.unwrap_err(),
            PaymentError::InvalidAmount { .. }
        ));
        assert!(ledger.history("wallet_alice").is_empty());
    }

    #[test]
    fn test_two_issues_use_distinct_ids() {
        let (_, issuer) = issuer();
        let a = issuer.issue(request(Decimal::ONE)).unwrap();
        let b = issuer.issue(request(Decimal::ONE)).unwrap();
        assert_ne!(a.token.transaction.id, b.token.transaction.id);
    }
}
