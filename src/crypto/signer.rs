//! Transaction signing and verification
//!
//! Both operations are pure functions over their arguments. Signing
//! covers the canonical fields only ([`Transaction::canonical_bytes`]),
//! so bookkeeping mutations like a status transition never invalidate an
//! existing signature. Verification returning `false` is not an error -
//! it is the expected signal for "invalid or tampered", which the
//! settlement flow turns into a terminal `Tampered` failure.

use ed25519_dalek::{Signature, VerifyingKey};

use super::keys::Keypair;
use crate::types::Transaction;

/// Sign a transaction's canonical fields
///
/// Deterministic: the same transaction and key always produce the same
/// hex signature, and any differing canonical field produces a different
/// one with overwhelming probability.
///
/// # Arguments
///
/// * `transaction` - The transaction to sign; only canonical fields are
///   covered
/// * `keypair` - The payer's keypair
///
/// # Returns
///
/// The hex-encoded 64-byte Ed25519 signature.
pub fn sign_transaction(transaction: &Transaction, keypair: &Keypair) -> String {
    hex::encode(keypair.sign(&transaction.canonical_bytes()))
}

/// Verify a signature against a transaction's canonical fields
///
/// Recomputes the canonical serialization and checks the signature with
/// strict Ed25519 verification.
///
/// # Arguments
///
/// * `transaction` - The transaction whose canonical fields are checked
/// * `signature_hex` - Hex-encoded signature as transported in the token
/// * `public_key_hex` - Hex-encoded public key from the token envelope
///
/// # Returns
///
/// `true` iff the signature matches. Malformed hex, wrong lengths, an
/// invalid key, or any mismatched field all yield `false`; this function
/// never panics and never returns an error.
pub fn verify_transaction(
    transaction: &Transaction,
    signature_hex: &str,
    public_key_hex: &str,
) -> bool {
    let Ok(signature_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&signature_bytes) else {
        return false;
    };
    let Ok(key_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(key_array) = <[u8; 32]>::try_from(key_bytes.as_slice()) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_array) else {
        return false;
    };

    verifying_key
        .verify_strict(&transaction.canonical_bytes(), &signature)
        .is_ok()
}

/// Sign a transaction and attach the signature in place
///
/// # Errors
///
/// Returns `PaymentError::AlreadySigned` if the transaction already
/// carries a signature; signatures are written exactly once.
pub fn sign_in_place(
    transaction: &mut Transaction,
    keypair: &Keypair,
) -> Result<(), crate::types::PaymentError> {
    let signature = sign_transaction(transaction, keypair);
    transaction.attach_signature(signature)
}
