use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::accounts::directory::generate_referral_code;
use crate::accounts::models::{Account, AccountStatus, Role};
use crate::api::handler::AppState;
use crate::config::Config;
use crate::email::LogMailer;
use crate::store::Store;

const REAPER_INTERVAL_SECS: u64 = 60;

pub async fn initialize_app_state(config: &Config) -> AppState {
    let store = Arc::new(Store::new());
    let admin = seed_admin(&store, &config.admin_email).await;
    let state = AppState::new(store.clone(), Arc::new(LogMailer), admin);

    spawn_reaper(store);

    info!(%admin, "application state initialized");
    state
}

/// The platform account that collects fees. Seeded at startup so settlement
/// always has a credit target.
async fn seed_admin(store: &Arc<Store>, email: &str) -> Uuid {
    let account = Account {
        id: Uuid::new_v4(),
        email: email.to_string(),
        country: None,
        wallet: Decimal::ZERO,
        role: Role::Admin,
        status: AccountStatus::Active,
        verified: true,
        referral_code: generate_referral_code(),
        referred_by: None,
        session: None,
        created_at: Utc::now(),
    };
    let id = account.id;
    store.write().await.accounts.insert(id, account);
    id
}

/// Periodically drop expired reservations and aged-out log records.
/// Correctness never depends on this loop; reads already treat stale
/// records as absent.
fn spawn_reaper(store: Arc<Store>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(REAPER_INTERVAL_SECS)).await;
            let (reservations, attempts, transactions) = store.purge_expired(Utc::now()).await;
            if reservations + attempts + transactions > 0 {
                info!(reservations, attempts, transactions, "purged expired records");
            }
        }
    });
}
