pub mod handlers;
pub mod manager;
pub mod models;

pub use manager::SlotManager;
