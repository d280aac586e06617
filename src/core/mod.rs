//! Core business logic module
//!
//! This module contains the payment processing components:
//! - `issuer` - Payer-side token construction, signing, and encoding
//! - `lifecycle` - Time-bounded token validity tracking
//! - `ledger` - Account balances and the append-only audit log
//! - `credential` - Transaction-level credential enrollment and checks
//! - `settlement` - Scan-side settlement state machine

pub mod credential;
pub mod issuer;
pub mod ledger;
pub mod lifecycle;
pub mod settlement;

pub use credential::{CredentialConfig, CredentialStore};
pub use issuer::{IssueRequest, IssuedToken, TokenIssuer};
pub use ledger::Ledger;
pub use lifecycle::{TokenLifecycle, TokenState};
pub use settlement::{FlowState, SettlementFlow, SettlementReceipt};
