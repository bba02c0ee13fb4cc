mod config;

use chores::{get_next_assignee, ChoreBook, RotationOptions, RotationRequest};
use config::Config;
use security::{PinAuthenticator, StoredSettings};
use settlement::{ExpenseBook, MemberId, MemberRoster};
use std::collections::HashMap;
use std::sync::Arc;
use storage::{JsonFileStore, KeyValueStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Household starting...");
    info!("Data file: {:?}", config.data_path);

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&config.data_path)?);

    let roster = MemberRoster::new(store.clone(), config.settlement.roster.clone());
    let expenses = ExpenseBook::new(store.clone(), config.settlement.netting.clone());
    let chores = ChoreBook::new(store.clone());
    let auth = PinAuthenticator::new(
        Arc::new(StoredSettings::new(store.clone())),
        config.security.clone(),
    );

    let members = roster.list(true)?;
    let names: HashMap<MemberId, String> = members
        .iter()
        .map(|m| (m.id.clone(), m.name.clone()))
        .collect();
    let name = |id: &MemberId| names.get(id).cloned().unwrap_or_else(|| id.to_string());

    println!("Members: {}", members.iter().filter(|m| m.is_active).count());

    let balances = expenses.balances()?;
    println!("\nBalances");
    if balances.is_empty() {
        println!("  all settled up");
    }
    for balance in &balances {
        println!(
            "  {} owes {} {} {}",
            name(&balance.from_member_id),
            name(&balance.to_member_id),
            balance.amount,
            balance.currency
        );
    }

    println!("\nChores");
    for chore in chores.list_chores(false)? {
        let current = chore
            .current_assignee()
            .map(name)
            .unwrap_or_else(|| "-".to_string());
        let request = RotationRequest {
            sequence: &chore.rotation_sequence,
            current_index: chore.current_index,
        };
        let next = match get_next_assignee(&request, &RotationOptions::default()) {
            Ok(result) => name(&result.member_id),
            Err(e) => {
                warn!(chore = %chore.name, "Cannot rotate: {}", e);
                "-".to_string()
            }
        };
        println!("  {} ({}): {} now, {} next", chore.name, chore.cadence, current, next);
    }

    let status = auth.lock_status().await?;
    println!("\nLock");
    match status.locked_until {
        Some(until) if status.locked => println!("  locked until {}", until),
        _ => println!("  unlocked ({} failed attempts)", status.failed_attempts),
    }

    info!("Household finished");

    Ok(())
}
