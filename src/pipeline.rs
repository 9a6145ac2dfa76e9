use crate::alerts::{self, temperature_reading, EventContext, ThresholdEvent};
use crate::collectors::smart::RawRecord;
use crate::config::Config;
use crate::health::{self, DeriveOptions, Sources};
use crate::inventory::{self, InventoryFilter, TokenizedRecord};
use crate::models::device::CanonicalDeviceRecord;
use crate::models::metrics::{DerivedMetrics, Point};
use crate::models::smart::SmartReport;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Metrics and events for one device.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub component: String,
    pub metrics:   BTreeMap<Point, f64>,
    pub events:    Vec<ThresholdEvent>,
    #[serde(skip)]
    pub derived:   DerivedMetrics,
    #[serde(skip)]
    pub report:    SmartReport,
}

/// A device from the inventory with its analysis.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceAnalysis {
    pub device:   CanonicalDeviceRecord,
    pub analysis: Analysis,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Monitored host stamped on every event.
    pub device:  String,
    /// Datapoints the caller wants back.
    pub points:  Vec<Point>,
    pub options: DeriveOptions,
    pub filter:  InventoryFilter,
}

impl Pipeline {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self {
            device:  cfg.events.device.clone(),
            points:  cfg.metrics.points.clone(),
            options: cfg.derivation.options(),
            filter:  InventoryFilter::from_config(&cfg.inventory)?,
        })
    }

    /// Derive metrics and events for one parsed record.
    pub fn analyze(&self, raw: &RawRecord, report: SmartReport, component: &str) -> Analysis {
        let hard_disk = health::is_hard_disk(&report);
        let temperature = temperature_reading(&report.fields, &report.stats);
        let src = Sources {
            report:           &report,
            hard_disk,
            temperature:      temperature.as_ref(),
            inferred_support: raw.inferred_support(),
        };
        let derived = health::derive(&src, self.options);

        let ctx = EventContext { device: self.device.clone(), component: component.to_string() };
        let events = alerts::evaluate(&report.attributes, temperature.as_ref(), &derived, &ctx);

        Analysis {
            component: component.to_string(),
            metrics:   derived.values(&self.points),
            events,
            derived,
            report,
        }
    }

    /// Split, filter, resolve and analyze a whole collector output.
    pub fn run(&self, output: &str) -> Vec<DeviceAnalysis> {
        let mut raws = Vec::new();
        let mut reports = Vec::new();
        for raw in RawRecord::split(output) {
            let report = raw.parse();
            let tokenized = TokenizedRecord {
                fields:      report.fields.clone(),
                unsupported: raw.is_unsupported(),
            };
            if !self.filter.accepts(&tokenized) {
                continue;
            }
            raws.push(raw);
            reports.push(report);
        }

        let fields = reports.iter().map(|r| r.fields.clone()).collect();
        let devices = inventory::resolve(fields);
        debug!(records = raws.len(), devices = devices.len(), "resolved inventory");

        devices
            .into_iter()
            .map(|device| {
                let mut report = reports[device.source].clone();
                report.fields = device.fields.clone();
                let component = device
                    .fields
                    .text("Component")
                    .map(crate::models::device::prep_id)
                    .unwrap_or_else(|| device.id.clone());
                let analysis = self.analyze(&raws[device.source], report, &component);
                DeviceAnalysis { device, analysis }
            })
            .collect()
    }
}
