pub mod directory;
pub mod handlers;
pub mod models;

pub use directory::AccountDirectory;
