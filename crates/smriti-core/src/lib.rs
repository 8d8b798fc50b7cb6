pub mod cache;
pub mod source;

pub use cache::{BattleState, GLOBAL_TOPIC, WordCache};
pub use source::WordSource;

#[cfg(test)]
mod tests;
