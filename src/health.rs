//! Health derivation: turns one parsed record into [`DerivedMetrics`].
//!
//! Every metric with more than one possible source is an ordered rule list.
//! Rules are tried in order and the first one that yields a value wins;
//! sources are never combined.

use crate::alerts::{TemperatureReading, NO_THRESHOLD};
use crate::models::metrics::DerivedMetrics;
use crate::models::smart::{Attribute, HealthStatus, SmartReport, SmartSupport};
use tracing::trace;

/// Attributes that describe wear from use rather than degradation.
pub const LIFETIME_ATTRS: [u8; 4] = [
    9,   // Power_On_Hours
    193, // Load_Cycle_Count
    225, // Load/Unload_Cycle_Count
    12,  // Power_Cycle_Count
];

/// https://www.hdsentinel.com/ssd_case_health_decrease_wearout.php
pub const SSD_ATTRS: [u8; 5] = [
    169, // Remaining_Life_Percentage
    202, // Percent_Lifetime_Remain
    173, // Wear_Leveling_Count / Media_Wearout_Indicator
    177, // Wear_Leveling_Count
    231, // SSD_Life_Left (temperature on some hard disks)
];

/// When a rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    HardDisk,
    SolidState,
}

/// Sources of counter-like metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    /// Raw value of an attribute.
    Raw(u8),
    /// Raw value of an attribute whose name mentions a temperature.
    TemperatureRaw(u8),
    /// Device statistics counter.
    Stat(&'static str),
    /// Tokenized integer field.
    Field(&'static str),
    /// Current temperature from the transport-specific reading.
    TransportTemperature,
}

/// Sources of percentage metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Percent {
    /// Normalized value of an attribute.
    Value(u8),
    /// `100 - counter` from the device statistics.
    StatRemaining(&'static str),
    /// `100 - field`
    FieldRemaining(&'static str),
    /// Share of a rated lifetime counter not yet used.
    Lifetime { used: &'static str, rated: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct Rule<S> {
    pub guard:  Guard,
    pub source: S,
}

const fn always<S>(source: S) -> Rule<S> {
    Rule { guard: Guard::Always, source }
}

const fn when<S>(guard: Guard, source: S) -> Rule<S> {
    Rule { guard, source }
}

pub const TEMPERATURE_RULES: &[Rule<Count>] = &[
    always(Count::Raw(194)),
    always(Count::Raw(190)),
    // some hard drives put temperature in 231
    when(Guard::HardDisk, Count::Raw(231)),
    always(Count::TemperatureRaw(189)),
    always(Count::TransportTemperature),
];

pub const REALLOCATED_RULES: &[Rule<Count>] = &[
    always(Count::Raw(5)),
    always(Count::Stat("Number of Reallocated Logical Sectors")),
    always(Count::Field("ElementsInGrownDefectList")),
];

pub const PENDING_RULES: &[Rule<Count>] = &[
    always(Count::Raw(197)),
    always(Count::Stat("Number of Realloc. Candidate Logical Sectors")),
];

pub const LIFETIME_RULES: &[Rule<Percent>] = &[
    always(Percent::Value(LIFETIME_ATTRS[0])),
    always(Percent::Value(LIFETIME_ATTRS[1])),
    always(Percent::Value(LIFETIME_ATTRS[2])),
    always(Percent::Value(LIFETIME_ATTRS[3])),
    always(Percent::Lifetime {
        used:  "AccumulatedLoadUnloadCycles",
        rated: "SpecifiedLoadUnloadCountOverDeviceLifetime",
    }),
    always(Percent::Lifetime {
        used:  "AccumulatedStartStopCycles",
        rated: "SpecifiedCycleCountOverDeviceLifetime",
    }),
];

pub const SSD_RULES: &[Rule<Percent>] = &[
    always(Percent::Value(SSD_ATTRS[0])),
    always(Percent::Value(SSD_ATTRS[1])),
    always(Percent::Value(SSD_ATTRS[2])),
    always(Percent::Value(SSD_ATTRS[3])),
    when(Guard::SolidState, Percent::Value(SSD_ATTRS[4])),
    always(Percent::StatRemaining("Percentage Used Endurance Indicator")),
    always(Percent::FieldRemaining("PercentageUsed")),
];

/// Knobs for behavior downstream consumers may depend on.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeriveOptions {
    /// Report attribute 198's own raw value as `reallocated_offline` instead
    /// of mirroring attribute 5's raw value.
    pub offline_uses_own_raw: bool,
}

/// Inputs the rules read from.
pub struct Sources<'a> {
    pub report:           &'a SmartReport,
    pub hard_disk:        bool,
    pub temperature:      Option<&'a TemperatureReading>,
    pub inferred_support: Option<SmartSupport>,
}

impl<'a> Sources<'a> {
    fn attr(&self, id: u8) -> Option<&'a Attribute> {
        self.report.attributes.get(&id)
    }

    fn applies(&self, guard: Guard) -> bool {
        match guard {
            Guard::Always     => true,
            Guard::HardDisk   => self.hard_disk,
            Guard::SolidState => !self.hard_disk,
        }
    }

    pub fn count(&self, source: Count) -> Option<u64> {
        match source {
            Count::Raw(id) => self.attr(id).map(|a| a.raw),
            Count::TemperatureRaw(id) => self.attr(id).filter(|a| a.is_temperature()).map(|a| a.raw),
            Count::Stat(name) => self.report.stats.get(name).copied(),
            Count::Field(key) => self.report.fields.int(key),
            Count::TransportTemperature => self.temperature.map(|t| t.current),
        }
    }

    pub fn percent(&self, source: Percent) -> Option<f64> {
        match source {
            Percent::Value(id) => self.attr(id).map(|a| a.value),
            Percent::StatRemaining(name) => self.report.stats.get(name).map(|u| remaining(*u)),
            Percent::FieldRemaining(key) => self.report.fields.int(key).map(remaining),
            Percent::Lifetime { used, rated } => {
                let used = self.report.fields.int(used)?;
                let rated = self.report.fields.int(rated)?;
                if rated == 0 {
                    return None;
                }
                Some((100.0 - 100.0 * used as f64 / rated as f64).max(0.0))
            }
        }
    }
}

fn remaining(used: u64) -> f64 {
    100.0 - used.min(100) as f64
}

fn first_count(src: &Sources<'_>, metric: &str, rules: &[Rule<Count>]) -> Option<u64> {
    rules.iter().filter(|r| src.applies(r.guard)).find_map(|r| {
        let v = src.count(r.source)?;
        trace!(metric, source = ?r.source, value = v, "rule matched");
        Some(v)
    })
}

fn first_percent(src: &Sources<'_>, metric: &str, rules: &[Rule<Percent>]) -> Option<f64> {
    rules.iter().filter(|r| src.applies(r.guard)).find_map(|r| {
        let v = src.percent(r.source)?;
        trace!(metric, source = ?r.source, value = v, "rule matched");
        Some(v)
    })
}

/// Spinning media: a numeric rotation rate or an explicit "disk" device type.
pub fn is_hard_disk(report: &SmartReport) -> bool {
    report.fields.int("RotationRate").is_some()
        || report
            .fields
            .text("DeviceType")
            .map(|t| t.eq_ignore_ascii_case("disk"))
            .unwrap_or(false)
}

/// Lowest normalized value among attributes that signal degradation; 100 if none.
pub fn overall_health(report: &SmartReport) -> f64 {
    report
        .attributes
        .values()
        .filter(|a| !a.is_temperature())
        .filter(|a| !a.is_unused())
        .filter(|a| !LIFETIME_ATTRS.contains(&a.id) && !SSD_ATTRS.contains(&a.id))
        .map(|a| a.value)
        .fold(100.0, f64::min)
}

pub fn derive(src: &Sources<'_>, opts: DeriveOptions) -> DerivedMetrics {
    let report = src.report;

    let smart_enabled = report
        .fields
        .smart_support()
        .or(src.inferred_support)
        .unwrap_or(SmartSupport::Unknown);
    let health_check = report.fields.health().unwrap_or(HealthStatus::Unknown);

    let reallocated_sectors = first_count(src, "reallocated_sectors", REALLOCATED_RULES);

    let reallocated_offline = src.attr(198).map(|own| {
        if opts.offline_uses_own_raw {
            own.raw
        } else {
            // mirrors attribute 5, which existing consumers graph as "offline"
            src.attr(5).map(|a| a.raw).unwrap_or(own.raw)
        }
    });

    DerivedMetrics {
        hard_disk:               src.hard_disk,
        smart_enabled,
        health_check,
        phy_events:              report.phy_events,
        reallocated_sectors,
        reallocated_raw:         reallocated_sectors,
        reallocated_offline,
        reallocated_offline_raw: reallocated_offline,
        pending_sectors:         first_count(src, "pending_sectors", PENDING_RULES),
        temperature_celsius:     first_count(src, "temperature_celsius", TEMPERATURE_RULES),
        read_error_health:       src.percent(Percent::Value(1)),
        reallocated_health:      src.percent(Percent::Value(5)),
        lifetime_health:         first_percent(src, "lifetime_health", LIFETIME_RULES),
        ssd_health:              first_percent(src, "ssd_health", SSD_RULES),
        overall_health:          overall_health(report),
        nvme_available_spare:    report.fields.int("AvailableSpare"),
        nvme_spare_threshold:    report.fields.int("AvailableSpareThreshold").unwrap_or(NO_THRESHOLD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::TemperatureSource;
    use crate::models::field::{FieldMap, FieldValue};
    use crate::models::smart::{AttributeTable, DeviceStats};

    fn attr(id: u8, name: &str, value: f64, threshold: f64, raw: u64) -> Attribute {
        Attribute {
            id,
            name: name.to_string(),
            value,
            worst: value,
            threshold,
            attr_type: "old age".to_string(),
            raw,
        }
    }

    fn report(attrs: Vec<Attribute>) -> SmartReport {
        SmartReport {
            fields:     FieldMap::new(),
            attributes: attrs.into_iter().map(|a| (a.id, a)).collect::<AttributeTable>(),
            stats:      DeviceStats::new(),
            phy_events: None,
        }
    }

    fn derive_for(report: &SmartReport) -> DerivedMetrics {
        let src = Sources {
            report,
            hard_disk: is_hard_disk(report),
            temperature: None,
            inferred_support: None,
        };
        derive(&src, DeriveOptions::default())
    }

    #[test]
    fn overall_health_skips_lifetime_and_temperature() {
        let r = report(vec![
            attr(5, "Reallocated Sector Ct", 100.0, 10.0, 0),
            attr(9, "Power On Hours", 80.0, 0.0, 42467),
            attr(194, "Temperature Celsius", 50.0, 0.0, 35),
        ]);
        assert_eq!(overall_health(&r), 100.0);
    }

    #[test]
    fn overall_health_takes_minimum() {
        let r = report(vec![
            attr(1, "Raw Read Error Rate", 98.0, 6.0, 0),
            attr(7, "Seek Error Rate", 72.0, 30.0, 0),
            attr(10, "Spin Retry Count", 0.0, 0.0, 0),
        ]);
        assert_eq!(overall_health(&r), 72.0);
        assert_eq!(overall_health(&report(vec![])), 100.0);
    }

    #[test]
    fn temperature_chain_order() {
        let r = report(vec![
            attr(190, "Airflow Temperature Cel", 65.0, 40.0, 35),
            attr(194, "Temperature Celsius", 65.0, 0.0, 36),
        ]);
        assert_eq!(derive_for(&r).temperature_celsius, Some(36));

        let r = report(vec![attr(189, "High Fly Writes", 100.0, 0.0, 7)]);
        assert_eq!(derive_for(&r).temperature_celsius, None);

        let r = report(vec![attr(189, "Airflow Temperature Cel", 60.0, 45.0, 40)]);
        assert_eq!(derive_for(&r).temperature_celsius, Some(40));
    }

    #[test]
    fn attribute_231_depends_on_device_class() {
        let mut r = report(vec![attr(231, "SSD Life Left", 97.0, 10.0, 39)]);
        let ssd = derive_for(&r);
        assert_eq!(ssd.ssd_health, Some(97.0));
        assert_eq!(ssd.temperature_celsius, None);

        r.fields.insert("RotationRate", FieldValue::Int(7200));
        let hdd = derive_for(&r);
        assert!(hdd.hard_disk);
        assert_eq!(hdd.ssd_health, None);
        assert_eq!(hdd.temperature_celsius, Some(39));
    }

    #[test]
    fn transport_temperature_is_last_resort() {
        let r = report(vec![]);
        let reading = TemperatureReading {
            source: TemperatureSource::Nvme,
            current: 41,
            critical: 85,
            warning: 80,
        };
        let src = Sources { report: &r, hard_disk: false, temperature: Some(&reading), inferred_support: None };
        assert_eq!(derive(&src, DeriveOptions::default()).temperature_celsius, Some(41));
    }

    #[test]
    fn reallocation_fallbacks() {
        let mut r = report(vec![]);
        r.fields.insert("ElementsInGrownDefectList", FieldValue::Int(4));
        let m = derive_for(&r);
        assert_eq!(m.reallocated_sectors, Some(4));
        assert_eq!(m.reallocated_raw, Some(4));

        r.stats.insert("Number of Reallocated Logical Sectors".into(), 2);
        assert_eq!(derive_for(&r).reallocated_sectors, Some(2));

        let r = report(vec![]);
        assert_eq!(derive_for(&r).reallocated_sectors, None);
    }

    #[test]
    fn offline_mirrors_attribute_five_by_default() {
        let r = report(vec![
            attr(5, "Reallocated Sector Ct", 100.0, 10.0, 3),
            attr(198, "Offline Uncorrectable", 100.0, 0.0, 7),
        ]);
        let legacy = derive_for(&r);
        assert_eq!(legacy.reallocated_offline, Some(3));
        assert_eq!(legacy.reallocated_offline_raw, Some(3));

        let src = Sources { report: &r, hard_disk: false, temperature: None, inferred_support: None };
        let fixed = derive(&src, DeriveOptions { offline_uses_own_raw: true });
        assert_eq!(fixed.reallocated_offline, Some(7));
    }

    #[test]
    fn pending_from_device_stats() {
        let mut r = report(vec![]);
        r.stats.insert("Number of Realloc. Candidate Logical Sectors".into(), 1);
        assert_eq!(derive_for(&r).pending_sectors, Some(1));
    }

    #[test]
    fn lifetime_prefers_attributes_then_scsi_counters() {
        let r = report(vec![
            attr(12, "Power Cycle Count", 99.0, 0.0, 40),
            attr(193, "Load Cycle Count", 90.0, 0.0, 1000),
        ]);
        assert_eq!(derive_for(&r).lifetime_health, Some(90.0));

        let mut r = report(vec![]);
        r.fields.insert("AccumulatedStartStopCycles", FieldValue::Int(50));
        r.fields.insert("SpecifiedCycleCountOverDeviceLifetime", FieldValue::Int(200));
        assert_eq!(derive_for(&r).lifetime_health, Some(75.0));

        r.fields.insert("AccumulatedLoadUnloadCycles", FieldValue::Int(300));
        r.fields.insert("SpecifiedLoadUnloadCountOverDeviceLifetime", FieldValue::Int(600));
        assert_eq!(derive_for(&r).lifetime_health, Some(50.0));
    }

    #[test]
    fn ssd_health_fallbacks() {
        let mut r = report(vec![]);
        r.fields.insert("PercentageUsed", FieldValue::Int(3));
        assert_eq!(derive_for(&r).ssd_health, Some(97.0));

        r.stats.insert("Percentage Used Endurance Indicator".into(), 4);
        assert_eq!(derive_for(&r).ssd_health, Some(96.0));

        let r = report(vec![
            attr(177, "Wear Leveling Count", 88.0, 0.0, 200),
            attr(202, "Percent Lifetime Remain", 93.0, 1.0, 7),
        ]);
        assert_eq!(derive_for(&r).ssd_health, Some(93.0));
    }

    #[test]
    fn smart_state_fallbacks() {
        let r = report(vec![]);
        let m = derive_for(&r);
        assert_eq!(m.smart_enabled, SmartSupport::Unknown);
        assert_eq!(m.health_check, HealthStatus::Unknown);

        let src = Sources {
            report: &r,
            hard_disk: false,
            temperature: None,
            inferred_support: Some(SmartSupport::Enabled),
        };
        assert_eq!(derive(&src, DeriveOptions::default()).smart_enabled, SmartSupport::Enabled);
    }

    #[test]
    fn nvme_spare_defaults_to_no_threshold() {
        let mut r = report(vec![]);
        r.fields.insert("AvailableSpare", FieldValue::Int(100));
        let m = derive_for(&r);
        assert_eq!(m.nvme_available_spare, Some(100));
        assert_eq!(m.nvme_spare_threshold, NO_THRESHOLD);
    }

    #[test]
    fn scsi_disk_type_means_hard_disk() {
        let mut r = report(vec![]);
        assert!(!is_hard_disk(&r));
        r.fields.insert("DeviceType", FieldValue::Text("disk".into()));
        assert!(is_hard_disk(&r));
    }
}
