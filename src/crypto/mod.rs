//! Cryptography module
//!
//! Ed25519 keypair handling and the transaction signing contract:
//! - `keys` - keypair generation and hex round-tripping
//! - `signer` - deterministic signing and strict verification over the
//!   canonical transaction fields

pub mod keys;
pub mod signer;

pub use keys::Keypair;
pub use signer::{sign_in_place, sign_transaction, verify_transaction};
