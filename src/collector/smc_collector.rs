//! SMC Prometheus Collector
//!
//! Implements `prometheus::core::Collector`. Each scrape enumerates the
//! SMC's keys, reads and classifies their values, and materializes fresh
//! metric vectors; the only state shared across concurrent scrapes is the
//! immutable descriptor registry built at construction.

use std::collections::HashMap;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, GaugeVec, Opts};
use tracing::{debug, error};

use crate::collector::category::{
    MetricCategory, MetricKind, INFO_LABELS, INFO_METRIC_HELP, INFO_METRIC_NAME, SENSOR_LABELS,
};
use crate::collector::classify::{classify_readings, ClassifiedSample};
use crate::error::{Error, Result};
use crate::smc::{SensorGateway, SensorLabels};

// =============================================================================
// System Info
// =============================================================================

/// The five uname fields exported as constant labels on `smc_uname_info`.
#[derive(Debug, Clone)]
pub struct UnameInfo {
    pub sysname: String,
    pub nodename: String,
    pub release: String,
    pub version: String,
    pub machine: String,
}

impl UnameInfo {
    /// Capture system identification via uname(2).
    #[cfg(unix)]
    pub fn capture() -> Result<Self> {
        let mut raw: libc::utsname = unsafe { std::mem::zeroed() };
        if unsafe { libc::uname(&mut raw) } != 0 {
            return Err(Error::Uname);
        }

        Ok(Self {
            sysname: cstr_field(&raw.sysname),
            nodename: cstr_field(&raw.nodename),
            release: cstr_field(&raw.release),
            version: cstr_field(&raw.version),
            machine: cstr_field(&raw.machine),
        })
    }

    #[cfg(not(unix))]
    pub fn capture() -> Result<Self> {
        Err(Error::Uname)
    }
}

/// Extract a NUL-terminated utsname field as a lossy UTF-8 string.
#[cfg(unix)]
fn cstr_field(field: &[libc::c_char]) -> String {
    let bytes: Vec<u8> = field
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

// =============================================================================
// Collector
// =============================================================================

/// Prometheus collector for SMC sensor telemetry.
pub struct SmcCollector {
    gateway: Box<dyn SensorGateway>,
    labels: SensorLabels,
    descs: Vec<Desc>,
}

impl SmcCollector {
    /// Build the collector and its immutable descriptor registry: one
    /// descriptor per metric category plus the system info descriptor.
    pub fn new(gateway: Box<dyn SensorGateway>, labels: SensorLabels) -> Result<Self> {
        let mut descs = Vec::with_capacity(MetricCategory::ALL.len() + 1);
        for category in MetricCategory::ALL {
            descs.push(Desc::new(
                category.metric_name().to_string(),
                category.help().to_string(),
                SENSOR_LABELS.iter().map(|s| s.to_string()).collect(),
                HashMap::new(),
            )?);
        }
        descs.push(Desc::new(
            INFO_METRIC_NAME.to_string(),
            INFO_METRIC_HELP.to_string(),
            INFO_LABELS.iter().map(|s| s.to_string()).collect(),
            HashMap::new(),
        )?);

        Ok(Self {
            gateway,
            labels,
            descs,
        })
    }

    /// Run one sensor scrape: enumerate, read, classify, materialize.
    fn scrape_sensors(&self) -> Result<Vec<MetricFamily>> {
        let keys = self.gateway.enumerate_keys()?;
        let readings = self.gateway.read_values(&keys)?;
        debug!(
            keys = keys.len(),
            readings = readings.len(),
            "scraped SMC key values"
        );

        let samples = classify_readings(&readings, &self.labels);
        Self::families_from_samples(&samples)
    }

    /// Materialize classified samples into metric families. The vectors are
    /// rebuilt from scratch on every scrape so no series outlives the
    /// readings that produced it.
    fn families_from_samples(samples: &[ClassifiedSample]) -> Result<Vec<MetricFamily>> {
        let mut families = Vec::new();

        for category in MetricCategory::ALL {
            let in_category: Vec<&ClassifiedSample> =
                samples.iter().filter(|s| s.category == category).collect();
            if in_category.is_empty() {
                continue;
            }

            let opts = Opts::new(category.metric_name(), category.help());
            match category.kind() {
                MetricKind::Gauge => {
                    let vec = GaugeVec::new(opts, &SENSOR_LABELS)?;
                    for sample in in_category {
                        vec.with_label_values(&[&sample.sensor, &sample.label])
                            .set(sample.value);
                    }
                    families.extend(vec.collect());
                }
                MetricKind::Counter => {
                    let vec = CounterVec::new(opts, &SENSOR_LABELS)?;
                    for sample in in_category {
                        vec.with_label_values(&[&sample.sensor, &sample.label])
                            .inc_by(sample.value);
                    }
                    families.extend(vec.collect());
                }
            }
        }

        Ok(families)
    }

    /// Build the `smc_uname_info` family. Independent of sensor scraping;
    /// fails on its own without taking the sensor samples with it.
    fn info_family(&self) -> Result<MetricFamily> {
        let uname = UnameInfo::capture()?;

        let vec = GaugeVec::new(Opts::new(INFO_METRIC_NAME, INFO_METRIC_HELP), &INFO_LABELS)?;
        vec.with_label_values(&[
            &uname.sysname,
            &uname.release,
            &uname.version,
            &uname.machine,
            &uname.nodename,
        ])
        .set(1.0);

        vec.collect()
            .pop()
            .ok_or_else(|| Error::Internal("uname info family missing".into()))
    }
}

impl Collector for SmcCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut families = Vec::new();

        // A hardware failure yields an empty (but valid) sensor response;
        // exporter availability survives partial hardware failures.
        match self.scrape_sensors() {
            Ok(mut sensor_families) => families.append(&mut sensor_families),
            Err(e) => error!(error = %e, "sensor scrape failed"),
        }

        match self.info_family() {
            Ok(info) => families.push(info),
            Err(e) => error!(error = %e, "failed to collect uname info"),
        }

        families
    }
}
