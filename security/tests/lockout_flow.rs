//! Lockout flow against a file-backed store
//!
//! - Five wrong PINs lock the household
//! - The correct PIN is refused while locked, without counting an attempt
//! - State survives reopening the store
//! - The lock lifts on its own once it expires

use chrono::{Duration, Utc};
use security::{
    Config, PinAuthenticator, SettingsRepository, StoredSettings, VerifyOutcome,
};
use std::sync::Arc;
use storage::JsonFileStore;

const PIN: &str = "482913";

fn open(path: &std::path::Path) -> (PinAuthenticator, Arc<StoredSettings>) {
    let store = Arc::new(JsonFileStore::open(path).unwrap());
    let repository = Arc::new(StoredSettings::new(store));
    let auth = PinAuthenticator::new(repository.clone(), Config::default());
    (auth, repository)
}

#[tokio::test]
async fn test_five_failures_lock_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("household.json");
    let (auth, repository) = open(&path);
    auth.setup_pin(PIN, None).await.unwrap();

    let now = Utc::now();
    let mut delays = Vec::new();
    for attempt in 1..=5u32 {
        match auth.verify_at("000000", now).await.unwrap() {
            VerifyOutcome::Rejected {
                failed_attempts,
                delay,
                locked_until,
            } => {
                assert_eq!(failed_attempts, attempt);
                assert_eq!(locked_until.is_some(), attempt == 5);
                delays.push(delay.as_secs());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
    assert_eq!(delays, vec![2, 4, 8, 16, 16]);

    // Correct PIN, still locked, attempt not counted
    let outcome = auth.verify_at(PIN, now + Duration::minutes(1)).await.unwrap();
    assert!(matches!(outcome, VerifyOutcome::Locked { .. }));
    assert_eq!(repository.load().unwrap().unwrap().failed_attempts, 5);

    // Reopen from disk
    drop(auth);
    let (auth, _) = open(&path);
    let status = auth.lock_status().await.unwrap();
    assert!(status.locked);
    assert_eq!(status.failed_attempts, 5);

    let later = now + Duration::minutes(15) + Duration::seconds(1);
    assert!(auth.verify_at(PIN, later).await.unwrap().is_accepted());
    assert!(!auth.lock_status().await.unwrap().locked);
}

#[tokio::test]
async fn test_concurrent_attempts_are_all_counted() {
    let dir = tempfile::tempdir().unwrap();
    let (auth, repository) = open(&dir.path().join("household.json"));
    let auth = Arc::new(auth);
    auth.setup_pin(PIN, None).await.unwrap();

    let now = Utc::now();
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let auth = auth.clone();
            tokio::spawn(async move { auth.verify_at("111111", now).await })
        })
        .collect();
    for handle in handles {
        assert!(!handle.await.unwrap().unwrap().is_accepted());
    }

    assert_eq!(repository.load().unwrap().unwrap().failed_attempts, 3);
}
