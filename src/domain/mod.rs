//! Domain layer types and invariants.

pub mod competitions;
pub mod entities;
pub mod error;
pub mod fixtures;
pub mod keys;
pub mod standings;
pub mod types;
