//! Mallacc fast-path simulator: size-class mapping, malloc cache with LRU
//! replacement, and cycle accounting for malloc/free with and without the cache.

pub mod cache;
pub mod core;
pub mod cost;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod scheduler;
pub mod shared;
pub mod simulator;
pub mod size_class;
pub mod workload;

pub use cache::MallocCache;
pub use cost::{CostModel, CostParameters};
pub use error::SimError;
pub use simulator::AllocationSimulator;
