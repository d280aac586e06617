// CLI module
// Command-line interface and the subcommand runner behind the demo binary

mod args;

pub use args::{CliArgs, Command, ValidityPreset};

use std::sync::Arc;

use clap::Parser;
use rust_decimal::Decimal;
use tracing::info;

use crate::core::{
    CredentialConfig, CredentialStore, FlowState, IssueRequest, Ledger, SettlementFlow,
    TokenIssuer,
};
use crate::crypto::Keypair;
use crate::storage::{self, AccountStore, JsonFileStore};
use crate::types::{Account, PaymentError};

/// Parse command-line arguments using clap
///
/// On invalid arguments or `--help`, clap prints the message and exits
/// the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Execute one parsed subcommand against the on-disk account store
///
/// # Errors
///
/// Propagates every `PaymentError` from the underlying operation after
/// persisting whatever ledger entries the attempt produced.
pub async fn run(args: CliArgs) -> Result<(), PaymentError> {
    let store = JsonFileStore::open(&args.store_dir)?;

    match args.command {
        Command::Open { account, balance } => open(&store, &account, balance),
        Command::Issue {
            from,
            to,
            amount,
            description,
            validity,
            validity_secs,
            key_seed,
        } => {
            let keypair = match key_seed {
                Some(hex) => Keypair::from_hex(&hex)?,
                None => Keypair::generate(),
            };
            issue(
                &store,
                IssueRequest {
                    sender: from,
                    recipient: to,
                    amount,
                    description,
                    validity: validity.to_config(validity_secs),
                },
                keypair,
            )
        }
        Command::Settle {
            payload,
            account,
            credential,
            attempt,
            amount,
        } => {
            let attempt = attempt.as_deref().unwrap_or(&credential);
            settle(&store, &payload, &account, &credential, attempt, amount).await
        }
        Command::Show { account } => show(&store, &account),
    }
}

fn open(store: &JsonFileStore, id: &str, balance: Decimal) -> Result<(), PaymentError> {
    if balance < Decimal::ZERO {
        return Err(PaymentError::invalid_amount(balance));
    }
    let account = match store.load(id)? {
        Some(mut existing) => {
            existing.balance = existing
                .balance
                .checked_add(balance)
                .ok_or_else(|| PaymentError::arithmetic_overflow("open", id))?;
            existing
        }
        None => Account::with_balance(id, balance),
    };
    store.save(&account)?;
    println!("{}: {}", account.id, account.balance);
    Ok(())
}

fn issue(
    store: &JsonFileStore,
    request: IssueRequest,
    keypair: Keypair,
) -> Result<(), PaymentError> {
    let ledger = Arc::new(storage::load_ledger(store)?);
    let issuer = TokenIssuer::new(Arc::clone(&ledger), keypair);

    let issued = issuer.issue(request)?;
    info!(
        deadline = %issued.lifecycle.deadline(),
        remaining_secs = issued.lifecycle.remaining_seconds(),
        "token issued"
    );
    storage::save_ledger(store, &ledger)?;

    // The payload is the program's output; everything else goes to the
    // log on stderr.
    println!("{}", issued.payload);
    Ok(())
}

async fn settle(
    store: &JsonFileStore,
    payload: &str,
    account: &str,
    credential: &str,
    attempt: &str,
    amount: Option<Decimal>,
) -> Result<(), PaymentError> {
    let ledger = Arc::new(storage::load_ledger(store)?);
    if ledger.account_snapshot(account).is_none() {
        return Err(PaymentError::account_not_found(account));
    }

    let credentials = Arc::new(CredentialStore::new(CredentialConfig::default()));
    credentials.enroll(account, credential);

    let mut flow = SettlementFlow::new(Arc::clone(&ledger), credentials, account);
    let result = drive(&mut flow, payload, attempt, amount).await;

    // Failed attempts also produce ledger entries worth keeping.
    storage::save_ledger(store, &ledger)?;
    result
}

async fn drive(
    flow: &mut SettlementFlow,
    payload: &str,
    attempt: &str,
    amount: Option<Decimal>,
) -> Result<(), PaymentError> {
    flow.scan(payload)?;
    match amount {
        Some(amount) => flow.confirm_amount(amount)?,
        None => flow.confirm_token_amount()?,
    };
    flow.submit_credential(attempt).await?;

    if let FlowState::Succeeded { receipt } = flow.state() {
        println!(
            "settled {} to {} (tx {}), new balance {}",
            receipt.amount, receipt.counterparty, receipt.tx_id, receipt.new_balance
        );
    }
    Ok(())
}

fn show(store: &JsonFileStore, id: &str) -> Result<(), PaymentError> {
    let account = store
        .load(id)?
        .ok_or_else(|| PaymentError::account_not_found(id))?;

    println!("{}: {}", account.id, account.balance);
    for entry in &account.entries {
        let reason = entry
            .reason
            .map(|r| format!(" ({r})"))
            .unwrap_or_default();
        println!(
            "  {} {} {:?} {} {}{}",
            entry.recorded_at.to_rfc3339(),
            entry.tx_id,
            entry.direction,
            entry.amount,
            entry.status,
            reason
        );
    }
    Ok(())
}
