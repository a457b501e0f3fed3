//! Metric Categories
//!
//! The nine semantic categories a classified sensor reading can land in,
//! each mapping 1:1 to an immutable Prometheus descriptor (name, help,
//! numeric kind, label schema).

/// Metric namespace prefix for every exported series.
pub const NAMESPACE: &str = "smc";

/// Label schema shared by all sensor metrics.
pub const SENSOR_LABELS: [&str; 2] = ["sensor", "label"];

/// Label schema for the system info metric.
pub const INFO_LABELS: [&str; 5] = ["sysname", "release", "version", "machine", "nodename"];

pub const INFO_METRIC_NAME: &str = "smc_uname_info";
pub const INFO_METRIC_HELP: &str =
    "Labeled system information as provided by the uname system call.";

/// Numeric kind of a metric descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Semantic category of a classified sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricCategory {
    Temperature,
    Power,
    Voltage,
    Current,
    Fan,
    BatteryChargeLevel,
    BatteryChargePercent,
    BatteryCycles,
    BatteryTimeRemaining,
}

impl MetricCategory {
    /// Every category, in descriptor registration order.
    pub const ALL: [MetricCategory; 9] = [
        MetricCategory::Temperature,
        MetricCategory::Power,
        MetricCategory::Voltage,
        MetricCategory::Current,
        MetricCategory::Fan,
        MetricCategory::BatteryChargeLevel,
        MetricCategory::BatteryChargePercent,
        MetricCategory::BatteryCycles,
        MetricCategory::BatteryTimeRemaining,
    ];

    /// Fully-qualified metric name, `smc_<category>_<unit>`.
    pub fn metric_name(&self) -> &'static str {
        match self {
            MetricCategory::Temperature => "smc_temp_celsius",
            MetricCategory::Power => "smc_power_watts",
            MetricCategory::Voltage => "smc_voltage_volts",
            MetricCategory::Current => "smc_current_amps",
            MetricCategory::Fan => "smc_fan_rpms",
            MetricCategory::BatteryChargeLevel => "smc_battery_charge_mha",
            MetricCategory::BatteryChargePercent => "smc_battery_charge_percent",
            MetricCategory::BatteryCycles => "smc_battery_cycles",
            MetricCategory::BatteryTimeRemaining => "smc_battery_charge_secs",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            MetricCategory::Temperature => {
                "Apple System Management Control (SMC) monitor for temperature"
            }
            MetricCategory::Power => "Apple System Management Control (SMC) monitor for power",
            MetricCategory::Voltage => "Apple System Management Control (SMC) monitor for voltage",
            MetricCategory::Current => "Apple System Management Control (SMC) monitor for current",
            MetricCategory::Fan => "Apple System Management Control (SMC) monitor for fans",
            MetricCategory::BatteryChargeLevel
            | MetricCategory::BatteryChargePercent
            | MetricCategory::BatteryCycles
            | MetricCategory::BatteryTimeRemaining => {
                "Apple System Management Control (SMC) monitor for the battery"
            }
        }
    }

    /// Battery cycle count only ever grows over the device lifetime; all
    /// other categories are point-in-time gauges.
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricCategory::BatteryCycles => MetricKind::Counter,
            _ => MetricKind::Gauge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_namespaced_and_unique() {
        let names: HashSet<&str> = MetricCategory::ALL.iter().map(|c| c.metric_name()).collect();
        assert_eq!(names.len(), MetricCategory::ALL.len());
        for name in names {
            assert!(name.starts_with("smc_"), "unexpected name: {name}");
        }
    }

    #[test]
    fn test_category_kinds() {
        assert_eq!(MetricCategory::BatteryCycles.kind(), MetricKind::Counter);
        assert_eq!(MetricCategory::Temperature.kind(), MetricKind::Gauge);
        assert_eq!(MetricCategory::BatteryTimeRemaining.kind(), MetricKind::Gauge);
    }

    #[test]
    fn test_known_metric_names() {
        assert_eq!(MetricCategory::Temperature.metric_name(), "smc_temp_celsius");
        assert_eq!(MetricCategory::Fan.metric_name(), "smc_fan_rpms");
        assert_eq!(
            MetricCategory::BatteryTimeRemaining.metric_name(),
            "smc_battery_charge_secs"
        );
    }
}
