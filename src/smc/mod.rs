//! SMC Hardware Layer
//!
//! Everything that talks to (or stands in for) the System Management
//! Controller: the IOKit user-client bindings, typed-value decoding, the
//! [`SensorGateway`] capability boundary, and the sensor label table.

pub mod decode;
#[cfg(target_os = "macos")]
pub mod ffi;
pub mod gateway;
pub mod labels;

pub use decode::RawValue;
pub use gateway::{RawReadings, SensorGateway, SmcGateway};
pub use labels::{SensorLabels, UNKNOWN_LABEL};
