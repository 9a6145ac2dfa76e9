use crate::alerts::Severity;
use serde::Serialize;
use crate::models::field::FieldMap;
use std::collections::BTreeMap;

/// SMART capability state as reported by the "SMART support is" line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SmartSupport {
    Enabled,
    Disabled,
    Unknown,
}

impl SmartSupport {
    /// Numeric datapoint value.
    pub fn code(&self) -> u8 {
        match self {
            SmartSupport::Enabled  => 0,
            SmartSupport::Disabled => 1,
            SmartSupport::Unknown  => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SmartSupport::Enabled  => "is enabled",
            SmartSupport::Disabled => "is disabled",
            SmartSupport::Unknown  => "state unknown",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SmartSupport::Enabled  => Severity::Clear,
            SmartSupport::Disabled => Severity::Error,
            SmartSupport::Unknown  => Severity::Warning,
        }
    }

    pub fn from_value(value: &str) -> Self {
        if value.contains("Enabled") {
            SmartSupport::Enabled
        } else if value.contains("Disabled") {
            SmartSupport::Disabled
        } else {
            SmartSupport::Unknown
        }
    }
}

/// Result of the overall health self-assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Passed,
    Failed,
    Unknown,
}

impl HealthStatus {
    pub fn code(&self) -> u8 {
        match self {
            HealthStatus::Passed  => 0,
            HealthStatus::Failed  => 1,
            HealthStatus::Unknown => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Passed  => "passed",
            HealthStatus::Failed  => "failed",
            HealthStatus::Unknown => "result unknown",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            HealthStatus::Passed  => Severity::Clear,
            HealthStatus::Failed  => Severity::Error,
            HealthStatus::Unknown => Severity::Warning,
        }
    }

    /// ATA reports "PASSED", SCSI reports "OK"; anything else is a failure.
    pub fn from_value(value: &str) -> Self {
        if value.contains("PASSED") || value.trim() == "OK" {
            HealthStatus::Passed
        } else {
            HealthStatus::Failed
        }
    }
}

/// One ATA SMART attribute row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub id:        u8,
    pub name:      String,
    /// Normalized value, 0-100 once rescaled.
    pub value:     f64,
    pub worst:     f64,
    pub threshold: f64,
    /// "pre-fail" or "old age"
    pub attr_type: String,
    pub raw:       u64,
}

impl Attribute {
    /// Slots vendors leave empty report 0/0.
    pub fn is_unused(&self) -> bool {
        self.value == 0.0 && self.threshold == 0.0
    }

    pub fn is_temperature(&self) -> bool {
        self.name.contains("Temperature")
    }
}

/// Attributes keyed by id; iteration is in ascending id order.
pub type AttributeTable = BTreeMap<u8, Attribute>;

/// Counters from the device statistics log, keyed by description.
pub type DeviceStats = BTreeMap<String, u64>;

/// Everything extracted from one record, before derivation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartReport {
    pub fields:     FieldMap,
    pub attributes: AttributeTable,
    pub stats:      DeviceStats,
    /// `None` when the record has no PHY event table.
    pub phy_events: Option<u64>,
}
