pub mod handlers;
pub mod models;
pub mod registry;

pub use registry::TaskRegistry;
