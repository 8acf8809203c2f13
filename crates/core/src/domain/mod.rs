pub mod metrics;
pub mod quote;
