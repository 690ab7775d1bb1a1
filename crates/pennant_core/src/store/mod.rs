//! Versioned JSON persistence for playoff brackets.

mod bracket_store;
mod error;

pub use bracket_store::BracketStore;
pub use error::StoreError;

/// Bumped whenever the persisted bracket shape changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;
