//! End-to-end integration tests
//!
//! These tests validate the complete payment pipeline through the public
//! API only. Each scenario:
//! 1. Issues a signed token on the payer side
//! 2. Carries it as the encoded payload string (the QR content)
//! 3. Drives the scan-side settlement flow to a terminal state
//! 4. Asserts the resulting balances and audit entries
//!
//! Scenarios cover:
//! - The happy path (scan, confirm, credential, debit)
//! - Expired tokens failing fast with balances untouched
//! - Insufficient balance keeping the flow recoverable
//! - Tampered payloads failing terminally
//! - Replay of an already-settled payload debiting exactly once
//! - Settled state surviving a save/reload cycle

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use qr_pay_engine::codec;
    use qr_pay_engine::core::{CredentialConfig, CredentialStore, IssueRequest, TokenIssuer};
    use qr_pay_engine::storage::{load_ledger, save_ledger, JsonFileStore};
    use qr_pay_engine::types::{FailureReason, TransactionStatus, ValidityConfig};
    use qr_pay_engine::{Keypair, Ledger, PaymentError, SettlementFlow};
    use rust_decimal::Decimal;

    /// Two-device world: the payer issues tokens, the payee scans and
    /// settles them against its own local account.
    struct World {
        payer_ledger: Arc<Ledger>,
        payee_ledger: Arc<Ledger>,
        credentials: Arc<CredentialStore>,
        issuer: TokenIssuer,
    }

    const PAYER: &str = "wallet_payer";
    const PAYEE: &str = "wallet_payee";
    const PIN: &str = "2468";

    fn world(payee_balance: Decimal) -> World {
        let payer_ledger = Arc::new(Ledger::new());
        payer_ledger.open_account(PAYER, Decimal::ZERO);

        let payee_ledger = Arc::new(Ledger::new());
        payee_ledger.open_account(PAYEE, payee_balance);

        let credentials = Arc::new(CredentialStore::new(CredentialConfig::immediate()));
        credentials.enroll(PAYEE, PIN);

        let issuer = TokenIssuer::new(Arc::clone(&payer_ledger), Keypair::generate());

        World {
            payer_ledger,
            payee_ledger,
            credentials,
            issuer,
        }
    }

    impl World {
        fn issue_payload(&self, amount: Decimal, validity: ValidityConfig) -> String {
            self.issuer
                .issue(IssueRequest {
                    sender: PAYER.to_string(),
                    recipient: PAYEE.to_string(),
                    amount,
                    description: Some("coffee".to_string()),
                    validity,
                })
                .expect("issuance should succeed")
                .payload
        }

        /// Payload whose validity window has already elapsed.
        fn issue_stale_payload(&self, amount: Decimal, age_secs: i64) -> String {
            let issued = self
                .issuer
                .issue(IssueRequest {
                    sender: PAYER.to_string(),
                    recipient: PAYEE.to_string(),
                    amount,
                    description: None,
                    validity: ValidityConfig::INSTANT_PAY,
                })
                .expect("issuance should succeed");
            let stale = issued
                .token
                .with_issued_at(Utc::now() - Duration::seconds(age_secs));
            codec::encode(&stale)
        }

        fn flow(&self) -> SettlementFlow {
            SettlementFlow::new(
                Arc::clone(&self.payee_ledger),
                Arc::clone(&self.credentials),
                PAYEE,
            )
        }
    }

    #[tokio::test]
    async fn test_happy_path_payer_to_payee() {
        let world = world(Decimal::new(100000, 2)); // 1000.00
        let payload = world.issue_payload(Decimal::new(4500, 2), ValidityConfig::INSTANT_PAY);

        // Issuance leaves a pending entry on the payer side.
        let payer_history = world.payer_ledger.history(PAYER);
        assert_eq!(payer_history.len(), 1);
        assert_eq!(payer_history[0].status, TransactionStatus::Pending);

        let mut flow = world.flow();
        flow.scan(&payload).expect("valid payload should scan");
        assert_eq!(flow.token_amount(), Some(Decimal::new(4500, 2)));
        flow.confirm_token_amount().expect("amount within balance");
        flow.submit_credential(PIN)
            .await
            .expect("correct credential should settle");

        // B - A.
        assert_eq!(
            world.payee_ledger.balance_of(PAYEE).unwrap(),
            Decimal::new(95500, 2)
        );
        let entries = world.payee_ledger.history(PAYEE);
        assert_eq!(
            entries.last().unwrap().status,
            TransactionStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_expired_token_fails_with_balance_unchanged() {
        let world = world(Decimal::new(100000, 2));
        // 500.00 token with a 10 s window, scanned 11 s after issuance.
        let payload = world.issue_stale_payload(Decimal::new(50000, 2), 11);

        let mut flow = world.flow();
        let result = flow.scan(&payload);

        assert!(matches!(result.unwrap_err(), PaymentError::Expired { .. }));
        assert_eq!(
            world.payee_ledger.balance_of(PAYEE).unwrap(),
            Decimal::new(100000, 2)
        );
        let entries = world.payee_ledger.history(PAYEE);
        let failed = entries.last().unwrap();
        assert_eq!(failed.status, TransactionStatus::Failed);
        assert_eq!(failed.reason, Some(FailureReason::Expired));
    }

    #[tokio::test]
    async fn test_insufficient_balance_keeps_flow_recoverable() {
        // Balance 50.00, token asks for 100.00.
        let world = world(Decimal::new(5000, 2));
        let payload =
            world.issue_payload(Decimal::new(10000, 2), ValidityConfig::PAYMENT_REQUEST);

        let mut flow = world.flow();
        flow.scan(&payload).unwrap();

        let result = flow.confirm_token_amount();
        assert!(matches!(
            result.unwrap_err(),
            PaymentError::InsufficientBalance { .. }
        ));

        // Reviewing is not terminal: a smaller amount still settles.
        flow.confirm_amount(Decimal::new(5000, 2)).unwrap();
        flow.submit_credential(PIN).await.unwrap();
        assert_eq!(
            world.payee_ledger.balance_of(PAYEE).unwrap(),
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn test_tampered_payload_never_debits() {
        let world = world(Decimal::new(100000, 2));
        // Swap the note after signing: the payload still decodes, but
        // the signature no longer covers it.
        let payload = world
            .issue_payload(Decimal::new(4500, 2), ValidityConfig::INSTANT_PAY)
            .replace("coffee", "espresso");

        let mut flow = world.flow();
        let result = flow.scan(&payload);

        assert!(matches!(result.unwrap_err(), PaymentError::Tampered { .. }));
        assert_eq!(
            world.payee_ledger.balance_of(PAYEE).unwrap(),
            Decimal::new(100000, 2)
        );
    }

    #[tokio::test]
    async fn test_garbage_scan_then_valid_scan_settles() {
        let world = world(Decimal::new(100000, 2));
        let payload = world.issue_payload(Decimal::new(4500, 2), ValidityConfig::INSTANT_PAY);

        let mut flow = world.flow();
        assert!(flow.scan("@@not-a-payload@@").is_err());
        assert!(flow.scan(r#"{"schema":"v9"}"#).is_err());

        // Still scanning; the real payload goes through.
        flow.scan(&payload).unwrap();
        flow.confirm_token_amount().unwrap();
        flow.submit_credential(PIN).await.unwrap();
        assert_eq!(
            world.payee_ledger.balance_of(PAYEE).unwrap(),
            Decimal::new(95500, 2)
        );
    }

    #[tokio::test]
    async fn test_replayed_payload_debits_exactly_once() {
        let world = world(Decimal::new(100000, 2));
        let payload =
            world.issue_payload(Decimal::new(25000, 2), ValidityConfig::PAYMENT_REQUEST);

        let mut first = world.flow();
        first.scan(&payload).unwrap();
        first.confirm_token_amount().unwrap();
        first.submit_credential(PIN).await.unwrap();

        let mut replay = world.flow();
        replay.scan(&payload).unwrap();
        replay.confirm_token_amount().unwrap();
        let result = replay.submit_credential(PIN).await;

        assert!(matches!(
            result.unwrap_err(),
            PaymentError::DuplicateSettlement { .. }
        ));
        assert_eq!(
            world.payee_ledger.balance_of(PAYEE).unwrap(),
            Decimal::new(75000, 2)
        );
    }

    #[tokio::test]
    async fn test_settled_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();

        let world = world(Decimal::new(100000, 2));
        let payload =
            world.issue_payload(Decimal::new(30000, 2), ValidityConfig::PAYMENT_REQUEST);

        let mut flow = world.flow();
        flow.scan(&payload).unwrap();
        flow.confirm_token_amount().unwrap();
        flow.submit_credential(PIN).await.unwrap();
        save_ledger(&store, &world.payee_ledger).unwrap();

        // A fresh process loads the store and sees the settled balance,
        // and the idempotency guard still holds for the old payload.
        let reloaded = Arc::new(load_ledger(&store).unwrap());
        assert_eq!(
            reloaded.balance_of(PAYEE).unwrap(),
            Decimal::new(70000, 2)
        );

        let mut replay = SettlementFlow::new(
            Arc::clone(&reloaded),
            Arc::clone(&world.credentials),
            PAYEE,
        );
        replay.scan(&payload).unwrap();
        replay.confirm_token_amount().unwrap();
        let result = replay.submit_credential(PIN).await;
        assert!(matches!(
            result.unwrap_err(),
            PaymentError::DuplicateSettlement { .. }
        ));
        assert_eq!(
            reloaded.balance_of(PAYEE).unwrap(),
            Decimal::new(70000, 2)
        );
    }
}
