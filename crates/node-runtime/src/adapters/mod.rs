//! Runtime implementations of the fabric's seams.

pub mod metrics;

pub use metrics::MetricsObserver;
