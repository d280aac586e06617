//! Benchmark suite for the token hot path
//!
//! Measures the per-token cost of the operations sitting between "payer
//! taps pay" and "QR code on screen" (sign + encode) and between "payee
//! scans" and "review screen" (decode + verify), using the divan
//! benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```

use qr_pay_engine::codec;
use qr_pay_engine::crypto::{sign_transaction, verify_transaction};
use qr_pay_engine::types::{QrToken, Transaction, ValidityConfig};
use qr_pay_engine::Keypair;
use rust_decimal::Decimal;

fn main() {
    divan::main();
}

fn sample_transaction() -> Transaction {
    Transaction::new(
        "wallet_payer",
        "wallet_payee",
        Decimal::new(4500, 2),
        Some("coffee".to_string()),
    )
    .expect("sample transaction is valid")
}

fn signed_token(keypair: &Keypair) -> QrToken {
    let mut transaction = sample_transaction();
    let signature = sign_transaction(&transaction, keypair);
    transaction
        .attach_signature(signature)
        .expect("fresh transaction is unsigned");
    QrToken::issue(
        transaction,
        keypair.public_key_hex(),
        ValidityConfig::INSTANT_PAY,
    )
    .expect("signed token issues")
}

/// Benchmark Ed25519 signing over the canonical transaction bytes
#[divan::bench]
fn sign(bencher: divan::Bencher) {
    let keypair = Keypair::generate();
    let transaction = sample_transaction();

    bencher.bench_local(|| sign_transaction(divan::black_box(&transaction), &keypair));
}

/// Benchmark signature verification of a well-formed token
#[divan::bench]
fn verify(bencher: divan::Bencher) {
    let keypair = Keypair::generate();
    let token = signed_token(&keypair);
    let signature = token
        .transaction
        .signature
        .clone()
        .expect("token is signed");

    bencher.bench_local(|| {
        verify_transaction(
            divan::black_box(&token.transaction),
            &signature,
            &token.public_key,
        )
    });
}

/// Benchmark payload encoding (token to QR content string)
#[divan::bench]
fn encode(bencher: divan::Bencher) {
    let keypair = Keypair::generate();
    let token = signed_token(&keypair);

    bencher.bench_local(|| codec::encode(divan::black_box(&token)));
}

/// Benchmark payload decoding (QR content string to typed payload)
#[divan::bench]
fn decode(bencher: divan::Bencher) {
    let keypair = Keypair::generate();
    let payload = codec::encode(&signed_token(&keypair));

    bencher.bench_local(|| codec::decode(divan::black_box(&payload)).expect("payload decodes"));
}
