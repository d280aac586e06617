//! Ed25519 keypair wrapper
//!
//! Keys are supplied by an external identity/keystore collaborator; this
//! module only wraps generation, seed-based derivation, and hex
//! round-tripping of the public half. Private key bytes are never logged
//! and never serialized implicitly - exporting a secret is a deliberate
//! call to [`Keypair::secret_hex`], not a serde side effect.

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use std::fmt;

use crate::types::PaymentError;

/// An Ed25519 keypair identifying one payer
///
/// Signatures produced with it are deterministic (RFC 8032): the same
/// key and message always yield the same 64-byte signature, which is
/// what makes the signer contract idempotent.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS cryptographic RNG
    pub fn generate() -> Self {
        Keypair {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Derive a keypair deterministically from a 32-byte seed
    ///
    /// Useful for reconstructing an identity from externally managed
    /// secret material. A weak seed yields a weak key; the caller is
    /// responsible for seed quality.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Keypair {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded 32-byte secret
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidKey` if the string is not valid hex
    /// or is not exactly 32 bytes long.
    pub fn from_hex(secret_hex: &str) -> Result<Self, PaymentError> {
        let bytes = hex::decode(secret_hex).map_err(|_| PaymentError::InvalidKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] =
            bytes.as_slice().try_into().map_err(|_| PaymentError::InvalidKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Sign a message, returning the 64-byte Ed25519 signature
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// The public verification key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Hex encoding of the public key, as embedded in QR tokens
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Hex encoding of the secret key
    ///
    /// Exporting secret material is an explicit act; handle the returned
    /// string accordingly.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    // Secret bytes stay out of debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}
