use crate::models::field::FieldMap;
use crate::models::metrics::DerivedMetrics;
use crate::models::smart::{AttributeTable, DeviceStats};
use crate::util::human::fmt_value;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Event class for storage health events.
pub const EVENT_CLASS_STORE: &str = "/HW/Store";
/// Event class for SMART on/off; a disabled SMART marks the component down.
pub const EVENT_CLASS_STATUS: &str = "/Status";
/// Bound meaning "no threshold known". A temperature never reaches it.
pub const NO_THRESHOLD: u64 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Clear,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Clear   => "CLEAR",
            Severity::Warning => "WARN",
            Severity::Error   => "ERROR",
        }
    }
}

/// One graded event. `(device, component, event_key)` is the dedup identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdEvent {
    pub device:      String,
    pub component:   String,
    pub severity:    Severity,
    pub event_key:   String,
    pub event_class: String,
    pub summary:     String,
}

impl ThresholdEvent {
    pub fn prefix(&self) -> String {
        format!("[{}/{}] ", self.device, self.component)
    }

    /// Stable string key identifying this event condition.
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.device, self.component, self.event_key)
    }
}

/// Who the events are about.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub device:    String,
    pub component: String,
}

impl EventContext {
    fn event(&self, severity: Severity, key: &str, class: &str, summary: String) -> ThresholdEvent {
        ThresholdEvent {
            device:      self.device.clone(),
            component:   self.component.clone(),
            severity,
            event_key:   key.to_string(),
            event_class: class.to_string(),
            summary,
        }
    }
}

// ── Temperature sources ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemperatureSource {
    Scsi,
    Nvme,
    Ata,
    DeviceStats,
}

/// Current temperature with the bounds the same transport reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemperatureReading {
    pub source:   TemperatureSource,
    pub current:  u64,
    pub critical: u64,
    pub warning:  u64,
}

impl TemperatureReading {
    pub fn severity(&self) -> Severity {
        if self.current >= self.critical {
            Severity::Error
        } else if self.current >= self.warning {
            Severity::Warning
        } else {
            Severity::Clear
        }
    }
}

fn interval_re() -> &'static Regex {
    static INTERVAL_RE: OnceLock<Regex> = OnceLock::new();
    INTERVAL_RE.get_or_init(|| Regex::new(r"(-?\d+)/(-?\d+)").expect("valid min/max regex"))
}

/// Upper bound of a "min/max" pair: `-41/85 Celsius` → 85.
pub fn interval_max(value: &str) -> Option<u64> {
    let caps = interval_re().captures(value)?;
    caps[2].parse::<u64>().ok()
}

fn scsi_reading(fields: &FieldMap, _stats: &DeviceStats) -> Option<TemperatureReading> {
    Some(TemperatureReading {
        source:   TemperatureSource::Scsi,
        current:  fields.int("CurrentDriveTemperature")?,
        critical: fields.int("DriveTripTemperature").unwrap_or(NO_THRESHOLD),
        warning:  NO_THRESHOLD,
    })
}

fn nvme_reading(fields: &FieldMap, _stats: &DeviceStats) -> Option<TemperatureReading> {
    Some(TemperatureReading {
        source:   TemperatureSource::Nvme,
        current:  fields.int("Temperature")?,
        critical: fields.int("CriticalComp.Temp.Threshold").unwrap_or(NO_THRESHOLD),
        warning:  fields.int("WarningComp.Temp.Threshold").unwrap_or(NO_THRESHOLD),
    })
}

fn ata_reading(fields: &FieldMap, _stats: &DeviceStats) -> Option<TemperatureReading> {
    let bound = |key: &str| fields.text(key).and_then(interval_max).unwrap_or(NO_THRESHOLD);
    Some(TemperatureReading {
        source:   TemperatureSource::Ata,
        current:  fields.int("CurrentTemperature")?,
        critical: bound("Min/MaxTemperatureLimit"),
        warning:  bound("Min/MaxRecommendedTemperature"),
    })
}

fn stats_reading(_fields: &FieldMap, stats: &DeviceStats) -> Option<TemperatureReading> {
    Some(TemperatureReading {
        source:   TemperatureSource::DeviceStats,
        current:  *stats.get("Current Temperature")?,
        critical: stats
            .get("Specified Maximum Operating Temperature")
            .copied()
            .unwrap_or(NO_THRESHOLD),
        warning:  NO_THRESHOLD,
    })
}

type ReadingRule = fn(&FieldMap, &DeviceStats) -> Option<TemperatureReading>;

/// Transport priority: SCSI, NVMe, ATA SCT, then the device statistics log.
const READING_RULES: &[ReadingRule] = &[scsi_reading, nvme_reading, ata_reading, stats_reading];

pub fn temperature_reading(fields: &FieldMap, stats: &DeviceStats) -> Option<TemperatureReading> {
    READING_RULES.iter().find_map(|rule| rule(fields, stats))
}

// ── Rules ─────────────────────────────────────────────────────────────

/// One event per attribute: Error at or below a non-zero threshold, Clear otherwise.
pub fn attribute_events(attrs: &AttributeTable, ctx: &EventContext) -> Vec<ThresholdEvent> {
    attrs
        .values()
        .map(|attr| {
            let (severity, direction) = if attr.threshold > 0.0 && attr.value <= attr.threshold {
                (Severity::Error, "below")
            } else {
                (Severity::Clear, "above")
            };
            ctx.event(
                severity,
                &attr.name.replace(' ', ""),
                EVENT_CLASS_STORE,
                format!(
                    "{} {} health {} threshold: {}%",
                    attr.name, attr.attr_type, direction, fmt_value(attr.value)
                ),
            )
        })
        .collect()
}

pub fn temperature_event(reading: &TemperatureReading, ctx: &EventContext) -> ThresholdEvent {
    let severity = reading.severity();
    let summary = match severity {
        Severity::Error => format!(
            "Temperature above critical threshold: {}°C (limit {}°C)",
            reading.current, reading.critical
        ),
        Severity::Warning => format!(
            "Temperature above warning threshold: {}°C (limit {}°C)",
            reading.current, reading.warning
        ),
        Severity::Clear => format!("Temperature below threshold: {}°C", reading.current),
    };
    ctx.event(severity, "TemperatureCelsius", EVENT_CLASS_STORE, summary)
}

/// NVMe spare capacity against the device's own threshold. No event without one.
pub fn spare_event(metrics: &DerivedMetrics, ctx: &EventContext) -> Option<ThresholdEvent> {
    let spare = metrics.nvme_available_spare?;
    let threshold = metrics.nvme_spare_threshold;
    if threshold == NO_THRESHOLD {
        return None;
    }
    let (severity, direction) = if spare <= threshold {
        (Severity::Error, "below")
    } else {
        (Severity::Clear, "above")
    };
    Some(ctx.event(
        severity,
        "NvmeAvailableSpare",
        EVENT_CLASS_STORE,
        format!("NVMe available spare {} threshold: {}%", direction, spare),
    ))
}

fn reallocation_summary(kind: &str, count: u64) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("{} sector reallocation has occurred {} time{}", kind, count, plural)
}

pub fn reallocation_events(metrics: &DerivedMetrics, ctx: &EventContext) -> Vec<ThresholdEvent> {
    let mut events = Vec::new();
    let sources = [
        ("reallocated_sectors", "Online",  metrics.reallocated_sectors),
        ("reallocated_offline", "Offline", metrics.reallocated_offline),
    ];
    for (key, kind, count) in sources {
        if let Some(count) = count {
            let severity = if count > 0 { Severity::Error } else { Severity::Clear };
            events.push(ctx.event(severity, key, EVENT_CLASS_STORE, reallocation_summary(kind, count)));
        }
    }
    events
}

pub fn status_events(metrics: &DerivedMetrics, ctx: &EventContext) -> Vec<ThresholdEvent> {
    vec![
        ctx.event(
            metrics.smart_enabled.severity(),
            "smart_enabled",
            EVENT_CLASS_STATUS,
            format!("SMART {}", metrics.smart_enabled.label()),
        ),
        ctx.event(
            metrics.health_check.severity(),
            "health_check",
            EVENT_CLASS_STORE,
            format!("Health check {}", metrics.health_check.label()),
        ),
    ]
}

/// All events for one record, in a fixed order.
pub fn evaluate(
    attrs:       &AttributeTable,
    temperature: Option<&TemperatureReading>,
    metrics:     &DerivedMetrics,
    ctx:         &EventContext,
) -> Vec<ThresholdEvent> {
    let mut events = attribute_events(attrs, ctx);
    if let Some(reading) = temperature {
        events.push(temperature_event(reading, ctx));
    }
    events.extend(spare_event(metrics, ctx));
    events.extend(reallocation_events(metrics, ctx));
    events.extend(status_events(metrics, ctx));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field::FieldValue;
    use crate::models::smart::{Attribute, HealthStatus, SmartSupport};

    fn ctx() -> EventContext {
        EventContext { device: "nas01".into(), component: "sda".into() }
    }

    fn table(value: f64, threshold: f64) -> AttributeTable {
        let mut attrs = AttributeTable::new();
        attrs.insert(5, Attribute {
            id: 5,
            name: "Reallocated Sector Ct".into(),
            value,
            worst: value,
            threshold,
            attr_type: "pre-fail".into(),
            raw: 0,
        });
        attrs
    }

    fn metrics() -> DerivedMetrics {
        DerivedMetrics {
            hard_disk: false,
            smart_enabled: SmartSupport::Enabled,
            health_check: HealthStatus::Passed,
            phy_events: None,
            reallocated_sectors: None,
            reallocated_raw: None,
            reallocated_offline: None,
            reallocated_offline_raw: None,
            pending_sectors: None,
            temperature_celsius: None,
            read_error_health: None,
            reallocated_health: None,
            lifetime_health: None,
            ssd_health: None,
            overall_health: 100.0,
            nvme_available_spare: None,
            nvme_spare_threshold: NO_THRESHOLD,
        }
    }

    #[test]
    fn attribute_below_threshold() {
        let events = attribute_events(&table(45.0, 50.0), &ctx());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Error);
        assert_eq!(events[0].event_key, "ReallocatedSectorCt");
        assert_eq!(events[0].event_class, EVENT_CLASS_STORE);
        assert!(events[0].summary.ends_with("below threshold: 45%"), "{}", events[0].summary);
    }

    #[test]
    fn attribute_above_threshold() {
        let events = attribute_events(&table(60.0, 50.0), &ctx());
        assert_eq!(events[0].severity, Severity::Clear);
        assert_eq!(events[0].summary, "Reallocated Sector Ct pre-fail health above threshold: 60%");
    }

    #[test]
    fn zero_threshold_never_fails() {
        let events = attribute_events(&table(0.0, 0.0), &ctx());
        assert_eq!(events[0].severity, Severity::Clear);
    }

    #[test]
    fn scsi_wins_over_other_temperature_sources() {
        let mut fields = FieldMap::new();
        fields.insert("Temperature", FieldValue::Int(40));
        fields.insert("CurrentDriveTemperature", FieldValue::Int(31));
        fields.insert("DriveTripTemperature", FieldValue::Int(60));
        let reading = temperature_reading(&fields, &DeviceStats::new()).unwrap();
        assert_eq!(reading.source, TemperatureSource::Scsi);
        assert_eq!(reading.current, 31);
        assert_eq!(reading.critical, 60);
        assert_eq!(reading.warning, NO_THRESHOLD);
    }

    #[test]
    fn ata_bounds_come_from_intervals() {
        let mut fields = FieldMap::new();
        fields.insert("CurrentTemperature", FieldValue::Int(62));
        fields.insert("Min/MaxTemperatureLimit", FieldValue::Text("-41/85 Celsius".into()));
        fields.insert("Min/MaxRecommendedTemperature", FieldValue::Text("0/60 Celsius".into()));
        let reading = temperature_reading(&fields, &DeviceStats::new()).unwrap();
        assert_eq!(reading.source, TemperatureSource::Ata);
        assert_eq!(reading.critical, 85);
        assert_eq!(reading.warning, 60);
        assert_eq!(reading.severity(), Severity::Warning);
    }

    #[test]
    fn stats_temperature_fallback() {
        let mut stats = DeviceStats::new();
        stats.insert("Current Temperature".into(), 71);
        stats.insert("Specified Maximum Operating Temperature".into(), 70);
        let reading = temperature_reading(&FieldMap::new(), &stats).unwrap();
        assert_eq!(reading.source, TemperatureSource::DeviceStats);
        assert_eq!(reading.severity(), Severity::Error);
        assert!(temperature_reading(&FieldMap::new(), &DeviceStats::new()).is_none());
    }

    #[test]
    fn missing_bounds_never_warn() {
        let mut fields = FieldMap::new();
        fields.insert("Temperature", FieldValue::Int(90));
        let reading = temperature_reading(&fields, &DeviceStats::new()).unwrap();
        assert_eq!(reading.severity(), Severity::Clear);
        let event = temperature_event(&reading, &ctx());
        assert_eq!(event.summary, "Temperature below threshold: 90°C");
    }

    #[test]
    fn nvme_spare_below_threshold() {
        let mut m = metrics();
        m.nvme_available_spare = Some(5);
        m.nvme_spare_threshold = 10;
        let event = spare_event(&m, &ctx()).unwrap();
        assert_eq!(event.severity, Severity::Error);
        assert_eq!(event.event_key, "NvmeAvailableSpare");
        assert!(event.summary.contains("below threshold: 5%"));
    }

    #[test]
    fn nvme_spare_without_threshold_is_silent() {
        let mut m = metrics();
        m.nvme_available_spare = Some(5);
        assert!(spare_event(&m, &ctx()).is_none());
    }

    #[test]
    fn reallocation_wording() {
        let mut m = metrics();
        m.reallocated_sectors = Some(1);
        m.reallocated_offline = Some(3);
        let events = reallocation_events(&m, &ctx());
        assert_eq!(events[0].summary, "Online sector reallocation has occurred 1 time");
        assert_eq!(events[1].summary, "Offline sector reallocation has occurred 3 times");
        assert!(events.iter().all(|e| e.severity == Severity::Error));
    }

    #[test]
    fn status_events_follow_enum_severity() {
        let mut m = metrics();
        m.smart_enabled = SmartSupport::Disabled;
        m.health_check = HealthStatus::Unknown;
        let events = status_events(&m, &ctx());
        assert_eq!(events[0].severity, Severity::Error);
        assert_eq!(events[0].event_class, EVENT_CLASS_STATUS);
        assert_eq!(events[0].summary, "SMART is disabled");
        assert_eq!(events[1].severity, Severity::Warning);
        assert_eq!(events[1].summary, "Health check result unknown");
    }

    #[test]
    fn dedup_key_is_device_component_event() {
        let events = attribute_events(&table(60.0, 50.0), &ctx());
        assert_eq!(events[0].key(), "nas01|sda|ReallocatedSectorCt");
    }
}
