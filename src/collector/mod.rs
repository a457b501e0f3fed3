//! Sensor Collection & Classification
//!
//! Turns one scrape's raw SMC readings into canonical Prometheus samples:
//! ordered classification rules with special-case overrides, canonical-key
//! deduplication, unit normalization, and the collector that ties it to the
//! metrics registry.

pub mod category;
pub mod classify;
pub mod smc_collector;

pub use category::{MetricCategory, MetricKind};
pub use classify::{classify_key, classify_readings, ClassifiedSample};
pub use smc_collector::{SmcCollector, UnameInfo};
