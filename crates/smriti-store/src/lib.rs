pub mod engine;
pub mod error;
mod tables;

pub use engine::WordStore;
pub use error::StoreError;
