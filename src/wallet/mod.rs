pub mod handlers;
pub mod ledger;
pub mod models;

pub use ledger::WalletLedger;
