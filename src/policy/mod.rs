pub mod config;
pub mod types;

pub use config::Policy;
pub use types::{LockingPolicy, StagingPolicy, Stores};
