pub mod aggregator;
pub mod provider;
pub mod types;
