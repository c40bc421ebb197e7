//! Application services orchestrating the cache, the provider and background work.

pub mod error;
pub mod freshness;
pub mod jobs;
pub mod maintenance;
pub mod repos;
pub mod sports;
pub mod upstream;
