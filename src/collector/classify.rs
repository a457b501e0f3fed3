//! Sensor Classification Engine
//!
//! Resolves each raw SMC key/value pair to a metric category through an
//! ordered rule table, deduplicates by canonical (uppercased) key across
//! the typed value partitions, and normalizes units. Classification is
//! best-effort per key: a reading that matches nothing is dropped with a
//! debug log, never an error.

use std::collections::HashSet;

use tracing::debug;

use crate::collector::category::MetricCategory;
use crate::smc::{RawReadings, SensorLabels, UNKNOWN_LABEL};

// =============================================================================
// Unit Policies
// =============================================================================

/// Battery voltage sensors whose keys do not carry the `V` prefix.
const BATTERY_VOLTAGE_KEYS: [&str; 5] = ["B0AV", "BC1V", "BC2V", "BC3V", "CHBV"];

/// Battery current sensor without the `I` prefix; may report milliamps.
const BATTERY_CURRENT_KEY: &str = "B0AC";

/// `B0TF` reports this sentinel when the battery is fully charged.
const TIME_TO_FULL_SENTINEL: f64 = 0xffff as f64;

/// No SMC rail legitimately reaches 1000 V or 1000 A, so a reading above
/// this threshold is an unambiguous milli-unit signal.
const MILLI_UNIT_THRESHOLD: f64 = 1000.0;

fn unchanged(_key: &str, value: f64) -> f64 {
    value
}

fn remap_full_charge_sentinel(_key: &str, value: f64) -> f64 {
    if value == TIME_TO_FULL_SENTINEL {
        0.0
    } else {
        value
    }
}

fn millivolts_to_volts(_key: &str, value: f64) -> f64 {
    if value > MILLI_UNIT_THRESHOLD {
        value / 1000.0
    } else {
        value
    }
}

/// Only the battery current key is known to report milliamps; `I`-prefixed
/// rails are left untouched.
fn milliamps_to_amps(key: &str, value: f64) -> f64 {
    if key == BATTERY_CURRENT_KEY && value > MILLI_UNIT_THRESHOLD {
        value / 1000.0
    } else {
        value
    }
}

// =============================================================================
// Rule Table
// =============================================================================

struct Rule {
    matches: fn(&str) -> bool,
    category: MetricCategory,
    normalize: fn(&str, f64) -> f64,
}

/// Ordered classification rules, evaluated top to bottom, first match wins.
/// Exact-key special cases come before the prefix rules so that battery
/// keys are not swallowed by the `B*` catch-all.
static RULES: [Rule; 9] = [
    Rule {
        matches: |key| key == "B0TF",
        category: MetricCategory::BatteryTimeRemaining,
        normalize: remap_full_charge_sentinel,
    },
    Rule {
        matches: |key| key == "B0CT",
        category: MetricCategory::BatteryCycles,
        normalize: unchanged,
    },
    Rule {
        matches: |key| key == "BFCL",
        category: MetricCategory::BatteryChargePercent,
        normalize: unchanged,
    },
    Rule {
        matches: |key| key.starts_with('T'),
        category: MetricCategory::Temperature,
        normalize: unchanged,
    },
    Rule {
        matches: |key| key.starts_with('P'),
        category: MetricCategory::Power,
        normalize: unchanged,
    },
    Rule {
        matches: |key| key.starts_with('V') || BATTERY_VOLTAGE_KEYS.contains(&key),
        category: MetricCategory::Voltage,
        normalize: millivolts_to_volts,
    },
    Rule {
        matches: |key| key.starts_with('I') || key == BATTERY_CURRENT_KEY,
        category: MetricCategory::Current,
        normalize: milliamps_to_amps,
    },
    Rule {
        matches: |key| key.starts_with('F'),
        category: MetricCategory::Fan,
        normalize: unchanged,
    },
    Rule {
        matches: |key| key.starts_with('B'),
        category: MetricCategory::BatteryChargeLevel,
        normalize: unchanged,
    },
];

/// Resolve one raw key to its category and normalized value. Prefix rules
/// match on the raw key as reported by the hardware, not its canonical
/// uppercased form.
pub fn classify_key(key: &str, value: f64) -> Option<(MetricCategory, f64)> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(key))
        .map(|rule| (rule.category, (rule.normalize)(key, value)))
}

// =============================================================================
// Scrape-level Classification
// =============================================================================

/// One canonical metric sample produced by a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSample {
    pub category: MetricCategory,
    pub value: f64,
    /// Canonical (uppercased) sensor key, emitted as the `sensor` label.
    pub sensor: String,
    /// Human-readable label from the sensor label table.
    pub label: String,
}

/// Classify one scrape's raw readings into canonical samples.
///
/// Partitions are visited in the gateway's contractual order (float,
/// unsigned, signed), so the first partition containing a canonical key
/// wins and later occurrences are dropped as duplicates. Readings ≤ 0 mean
/// "sensor not present" on this hardware and are skipped outright.
pub fn classify_readings(readings: &RawReadings, labels: &SensorLabels) -> Vec<ClassifiedSample> {
    let mut seen: HashSet<String> = HashSet::with_capacity(readings.len());
    let mut samples = Vec::new();

    for (key, value) in readings.iter_partitioned() {
        if value <= 0.0 {
            continue;
        }

        let canonical = key.to_uppercase();
        if seen.contains(&canonical) {
            debug!(key = %canonical, value, "duplicate key across value partitions");
            continue;
        }

        let label = labels.resolve(key);
        if label == UNKNOWN_LABEL {
            debug!(key, value, "unknown sensor with positive value");
            continue;
        }

        match classify_key(key, value) {
            Some((category, value)) => {
                seen.insert(canonical.clone());
                samples.push(ClassifiedSample {
                    category,
                    value,
                    sensor: canonical,
                    label: label.to_string(),
                });
            }
            None => debug!(key, value, "no classification rule matched"),
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smc::RawValue;
    use std::collections::HashMap;

    fn labels_for(keys: &[&str]) -> SensorLabels {
        let map: HashMap<String, Vec<String>> = keys
            .iter()
            .map(|k| (k.to_string(), vec![format!("{k} label")]))
            .collect();
        SensorLabels::new(map)
    }

    fn find<'a>(samples: &'a [ClassifiedSample], sensor: &str) -> &'a ClassifiedSample {
        samples
            .iter()
            .find(|s| s.sensor == sensor)
            .unwrap_or_else(|| panic!("no sample for {sensor}"))
    }

    // -------------------------------------------------------------------------
    // Rule table
    // -------------------------------------------------------------------------

    #[test]
    fn test_prefix_rules() {
        assert_eq!(
            classify_key("TC0P", 45.0),
            Some((MetricCategory::Temperature, 45.0))
        );
        assert_eq!(classify_key("PPBR", 12.3), Some((MetricCategory::Power, 12.3)));
        assert_eq!(classify_key("VD0R", 12.1), Some((MetricCategory::Voltage, 12.1)));
        assert_eq!(classify_key("IC0C", 3.2), Some((MetricCategory::Current, 3.2)));
        assert_eq!(classify_key("F0Ac", 1200.0), Some((MetricCategory::Fan, 1200.0)));
        assert_eq!(
            classify_key("B0FC", 5000.0),
            Some((MetricCategory::BatteryChargeLevel, 5000.0))
        );
    }

    #[test]
    fn test_exact_key_rules_beat_battery_catchall() {
        assert_eq!(
            classify_key("B0CT", 150.0),
            Some((MetricCategory::BatteryCycles, 150.0))
        );
        assert_eq!(
            classify_key("BFCL", 97.0),
            Some((MetricCategory::BatteryChargePercent, 97.0))
        );
        assert_eq!(
            classify_key("B0TF", 120.0),
            Some((MetricCategory::BatteryTimeRemaining, 120.0))
        );
    }

    #[test]
    fn test_time_to_full_sentinel_remap() {
        assert_eq!(
            classify_key("B0TF", 65535.0),
            Some((MetricCategory::BatteryTimeRemaining, 0.0))
        );
        assert_eq!(
            classify_key("B0TF", 120.0),
            Some((MetricCategory::BatteryTimeRemaining, 120.0))
        );
    }

    #[test]
    fn test_voltage_millivolt_rescale() {
        // Battery voltage keys without the V prefix rescale above 1000.
        assert_eq!(
            classify_key("BC1V", 1500.0),
            Some((MetricCategory::Voltage, 1.5))
        );
        assert_eq!(
            classify_key("VP0R", 12500.0),
            Some((MetricCategory::Voltage, 12.5))
        );
        // At or below the threshold the reading is already volts.
        assert_eq!(
            classify_key("B0AV", 12.6),
            Some((MetricCategory::Voltage, 12.6))
        );
    }

    #[test]
    fn test_rescale_never_applies_to_other_categories() {
        // A temperature reading above 1000 is bogus but must not be rescaled.
        assert_eq!(
            classify_key("TC0P", 1500.0),
            Some((MetricCategory::Temperature, 1500.0))
        );
        assert_eq!(
            classify_key("F0Ac", 4200.0),
            Some((MetricCategory::Fan, 4200.0))
        );
    }

    #[test]
    fn test_current_milliamp_rescale_only_for_battery_key() {
        assert_eq!(
            classify_key("B0AC", 2500.0),
            Some((MetricCategory::Current, 2.5))
        );
        // I-prefixed rails never rescale.
        assert_eq!(
            classify_key("IC0C", 2500.0),
            Some((MetricCategory::Current, 2500.0))
        );
    }

    #[test]
    fn test_unmatched_keys() {
        assert_eq!(classify_key("XXXX", 42.0), None);
        // Prefix matching is case-sensitive, as reported by the hardware.
        assert_eq!(classify_key("tC0P", 42.0), None);
    }

    // -------------------------------------------------------------------------
    // Scrape-level engine
    // -------------------------------------------------------------------------

    #[test]
    fn test_zero_and_negative_readings_skipped() {
        let mut readings = RawReadings::new();
        readings.insert("TC0P".into(), RawValue::Float(0.0));
        readings.insert("TS0S".into(), RawValue::Signed(-12));
        let labels = labels_for(&["TC0P", "TS0S"]);

        assert!(classify_readings(&readings, &labels).is_empty());
    }

    #[test]
    fn test_emitted_values_always_positive() {
        let mut readings = RawReadings::new();
        readings.insert("TC0P".into(), RawValue::Float(45.0));
        readings.insert("TC0D".into(), RawValue::Float(-1.0));
        readings.insert("F0Ac".into(), RawValue::Unsigned(1200));
        let labels = labels_for(&["TC0P", "TC0D", "F0Ac"]);

        let samples = classify_readings(&readings, &labels);
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.value > 0.0));
    }

    #[test]
    fn test_duplicate_key_float_partition_wins() {
        let mut readings = RawReadings::new();
        readings.floats.insert("TC0P".into(), 45.0);
        readings.unsigned.insert("TC0P".into(), 99);
        let labels = labels_for(&["TC0P"]);

        let samples = classify_readings(&readings, &labels);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 45.0);
    }

    #[test]
    fn test_duplicate_key_unsigned_beats_signed() {
        let mut readings = RawReadings::new();
        readings.unsigned.insert("F0Ac".into(), 1200);
        readings.signed.insert("F0Ac".into(), 7);
        let labels = labels_for(&["F0Ac"]);

        let samples = classify_readings(&readings, &labels);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 1200.0);
    }

    #[test]
    fn test_dedup_is_case_insensitive() {
        let mut readings = RawReadings::new();
        readings.floats.insert("F0Ac".into(), 1200.0);
        readings.unsigned.insert("F0AC".into(), 7);
        let labels = labels_for(&["F0Ac", "F0AC"]);

        let samples = classify_readings(&readings, &labels);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].sensor, "F0AC");
        assert_eq!(samples[0].value, 1200.0);
    }

    #[test]
    fn test_unknown_label_skipped_and_not_marked_seen() {
        let mut readings = RawReadings::new();
        readings.insert("XXXX".into(), RawValue::Float(42.0));
        let labels = labels_for(&[]);

        assert!(classify_readings(&readings, &labels).is_empty());
    }

    #[test]
    fn test_sensor_label_is_canonical_uppercase() {
        let mut readings = RawReadings::new();
        readings.insert("F0Ac".into(), RawValue::Float(1200.0));
        let labels = labels_for(&["F0Ac"]);

        let samples = classify_readings(&readings, &labels);
        assert_eq!(samples[0].sensor, "F0AC");
        assert_eq!(samples[0].label, "F0Ac label");
    }

    #[test]
    fn test_idempotent_classification() {
        let mut readings = RawReadings::new();
        readings.insert("TC0P".into(), RawValue::Float(45.0));
        readings.insert("B0CT".into(), RawValue::Unsigned(150));
        readings.insert("BC1V".into(), RawValue::Unsigned(1500));
        let labels = labels_for(&["TC0P", "B0CT", "BC1V"]);

        let sort = |mut v: Vec<ClassifiedSample>| {
            v.sort_by(|a, b| a.sensor.cmp(&b.sensor));
            v
        };
        let first = sort(classify_readings(&readings, &labels));
        let second = sort(classify_readings(&readings, &labels));
        assert_eq!(first, second);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut readings = RawReadings::new();
        readings.floats.insert("TC0P".into(), 45.0);
        readings.floats.insert("PPBR".into(), 12.3);
        readings.unsigned.insert("B0CT".into(), 150);
        let labels = labels_for(&["TC0P", "PPBR", "B0CT"]);

        let samples = classify_readings(&readings, &labels);
        assert_eq!(samples.len(), 3);

        let temp = find(&samples, "TC0P");
        assert_eq!(temp.category, MetricCategory::Temperature);
        assert_eq!(temp.value, 45.0);

        let power = find(&samples, "PPBR");
        assert_eq!(power.category, MetricCategory::Power);
        assert_eq!(power.value, 12.3);

        let cycles = find(&samples, "B0CT");
        assert_eq!(cycles.category, MetricCategory::BatteryCycles);
        assert_eq!(cycles.value, 150.0);
    }
}
