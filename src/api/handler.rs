use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    accounts::AccountDirectory,
    api::response::{ack, ApiResponse},
    email::Mailer,
    settlement::SettlementEngine,
    slots::SlotManager,
    store::Store,
    tasks::TaskRegistry,
    wallet::WalletLedger,
};

/// Shared handler state: the store plus every service wired onto it
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub directory: Arc<AccountDirectory>,
    pub ledger: Arc<WalletLedger>,
    pub registry: Arc<TaskRegistry>,
    pub slots: Arc<SlotManager>,
    pub settlement: Arc<SettlementEngine>,
}

impl AppState {
    pub fn new(store: Arc<Store>, mailer: Arc<dyn Mailer>, admin: Uuid) -> Self {
        Self {
            directory: Arc::new(AccountDirectory::new(store.clone(), mailer)),
            ledger: Arc::new(WalletLedger::new(store.clone())),
            registry: Arc::new(TaskRegistry::new(store.clone())),
            slots: Arc::new(SlotManager::new(store.clone())),
            settlement: Arc::new(SettlementEngine::new(store.clone(), admin)),
            store,
        }
    }
}

/// GET /health
pub async fn health_check() -> Json<ApiResponse<()>> {
    Json(ack("server is live"))
}
