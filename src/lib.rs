//! SMC Exporter
//!
//! A Prometheus exporter for Apple System Management Controller (SMC)
//! sensor telemetry: temperature, power, voltage, current, fan speed, and
//! battery state.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Scrape Request                          │
//! │  ┌────────────────┐   ┌─────────────────────────────────┐    │
//! │  │ Hardware       │──▶│ Classification Engine           │    │
//! │  │ Sensor Gateway │   │ (ordered rules, dedup, units)   │    │
//! │  │ (IOKit/SMC)    │   └───────────────┬─────────────────┘    │
//! │  └────────────────┘                   │                      │
//! │  ┌────────────────┐                   ▼                      │
//! │  │ Label Resolver │──▶ ┌─────────────────────────────────┐   │
//! │  │ (sensors.json) │    │ Metrics Registry / Exposition   │   │
//! │  └────────────────┘    └─────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`smc`]: hardware gateway, value decoding, sensor label table
//! - [`collector`]: classification engine and the Prometheus collector
//! - [`error`]: error types and handling

pub mod collector;
pub mod error;
pub mod smc;

// Re-export commonly used types
pub use collector::{
    classify_key, classify_readings, ClassifiedSample, MetricCategory, MetricKind, SmcCollector,
    UnameInfo,
};

pub use error::{Error, Result};

pub use smc::{RawReadings, RawValue, SensorGateway, SensorLabels, SmcGateway, UNKNOWN_LABEL};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
