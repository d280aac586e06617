//! Per-account settlement credentials
//!
//! A settlement needs explicit, separate authorization even inside an
//! already-authenticated session: a transaction-level secret checked at
//! confirmation time. Secrets are stored as SHA-256 digests keyed by
//! account id - never as compiled-in literals - and the check is
//! asynchronous with a configurable simulated latency, modeling the
//! network round-trip a production verifier would make. The contract is
//! deliberately small: submit secret, receive boolean.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::types::AccountId;

/// Configuration for the credential check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialConfig {
    /// Simulated processing/network latency per check
    pub check_latency: Duration,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        CredentialConfig {
            check_latency: Duration::from_millis(150),
        }
    }
}

impl CredentialConfig {
    /// Zero-latency configuration, mainly for tests and local demos
    pub const fn immediate() -> Self {
        CredentialConfig {
            check_latency: Duration::ZERO,
        }
    }
}

/// Store of per-account credential digests
#[derive(Debug, Default)]
pub struct CredentialStore {
    digests: DashMap<AccountId, [u8; 32]>,
    config: CredentialConfig,
}

impl CredentialStore {
    /// Create an empty store with the given configuration
    pub fn new(config: CredentialConfig) -> Self {
        CredentialStore {
            digests: DashMap::new(),
            config,
        }
    }

    /// Enroll (or replace) the credential for an account
    ///
    /// Only the SHA-256 digest is retained; the plaintext secret is
    /// dropped at the end of this call.
    pub fn enroll(&self, account: &str, secret: &str) {
        self.digests
            .insert(account.to_string(), Self::digest(secret));
        debug!(account, "credential enrolled");
    }

    /// Check a submitted secret against the stored digest
    ///
    /// Resolves after the configured latency. Returns `false` for an
    /// unknown account as well as for a mismatch - callers cannot
    /// distinguish the two, by contract.
    ///
    /// The returned future is safe to race and drop: abandoning it (for
    /// example because the token expired mid-check) leaves no state
    /// behind, so a late result can never be applied retroactively.
    pub async fn verify(&self, account: &str, secret: &str) -> bool {
        if !self.config.check_latency.is_zero() {
            sleep(self.config.check_latency).await;
        }

        let submitted = Self::digest(secret);
        self.digests
            .get(account)
            .map(|stored| *stored == submitted)
            .unwrap_or(false)
    }

    fn digest(secret: &str) -> [u8; 32] {
        Sha256::digest(secret.as_bytes()).into()
    }
}
