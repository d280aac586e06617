//! Account persistence
//!
//! Stores account state (balance plus audit log) between runs. The
//! trait keeps the ledger independent of the storage medium; the JSON
//! file backend is the default and writes one file per account.
//!
//! # Durability
//!
//! Saves go to a temporary file in the target directory first and are
//! then renamed over the destination, so a crash mid-write leaves the
//! previous snapshot intact rather than a truncated file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::Ledger;
use crate::types::{Account, AccountId, PaymentError};

/// Backend-agnostic account persistence
pub trait AccountStore {
    /// Load one account by id
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the account has never been saved.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Storage` on unreadable or corrupt data.
    fn load(&self, id: &str) -> Result<Option<Account>, PaymentError>;

    /// Save one account snapshot, replacing any previous snapshot
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Storage` when the snapshot cannot be
    /// written durably.
    fn save(&self, account: &Account) -> Result<(), PaymentError>;

    /// List the ids of all saved accounts
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Storage` when the backend cannot be
    /// enumerated.
    fn list(&self) -> Result<Vec<AccountId>, PaymentError>;
}

/// One-JSON-file-per-account store
///
/// Account `alice` lives at `<dir>/alice.json`. Ids are restricted to
/// a filename-safe alphabet so an id can never escape the store
/// directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Storage` when the directory cannot be
    /// created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PaymentError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(JsonFileStore { dir })
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, PaymentError> {
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(PaymentError::storage(format!(
                "account id '{id}' is not filename-safe"
            )));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), PaymentError> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(path)
            .map_err(|e| PaymentError::storage(format!("persist {}: {}", path.display(), e.error)))?;
        Ok(())
    }
}

impl AccountStore for JsonFileStore {
    fn load(&self, id: &str) -> Result<Option<Account>, PaymentError> {
        let path = self.path_for(id)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let account = serde_json::from_slice(&bytes)?;
        Ok(Some(account))
    }

    fn save(&self, account: &Account) -> Result<(), PaymentError> {
        let path = self.path_for(&account.id)?;
        let bytes = serde_json::to_vec_pretty(account)?;
        self.write_atomic(&path, &bytes)?;
        debug!(account = %account.id, path = %path.display(), "account saved");
        Ok(())
    }

    fn list(&self) -> Result<Vec<AccountId>, PaymentError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Load every saved account into a fresh ledger
///
/// # Errors
///
/// Returns `PaymentError::Storage` when any snapshot cannot be read.
pub fn load_ledger(store: &dyn AccountStore) -> Result<Ledger, PaymentError> {
    let ledger = Ledger::new();
    for id in store.list()? {
        if let Some(account) = store.load(&id)? {
            ledger.insert_account(account);
        }
    }
    Ok(ledger)
}

/// Save the current snapshot of every ledger account
///
/// # Errors
///
/// Returns `PaymentError::Storage` when any snapshot cannot be written.
pub fn save_ledger(store: &dyn AccountStore, ledger: &Ledger) -> Result<(), PaymentError> {
    for account in ledger.snapshot_all() {
        store.save(&account)?;
    }
    Ok(())
}
