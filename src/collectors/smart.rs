use crate::collectors::{fields, tables};
use crate::models::smart::{SmartReport, SmartSupport};
use crate::util::normalize;

/// Line separating per-device blocks in the collector output.
pub const RECORD_SEPARATOR: &str = "--------";

/// Phrases smartctl prints when a device cannot report SMART data at all.
const UNSUPPORTED_PHRASES: &[&str] = &[
    "Operation not supported by device",
    "Unable to detect device type",
    "lacks SMART capability",
    "SMART support is: Unavailable",
    "Unknown USB bridge",
];

/// Phrases that reveal the SMART state when no "SMART support is" line was tokenized.
const SUPPORT_PHRASES: &[(&str, SmartSupport)] = &[
    ("lacks SMART capability",              SmartSupport::Disabled),
    ("SMART support is: Unavailable",       SmartSupport::Disabled),
    ("SMART Disabled",                      SmartSupport::Disabled),
    ("=== START OF SMART DATA SECTION ===", SmartSupport::Enabled),
    ("SMART/Health Information",            SmartSupport::Enabled),
];

/// One device-access-path block of smartctl output.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub text: String,
}

impl RawRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Split collector output on separator lines; blank blocks are dropped.
    pub fn split(output: &str) -> Vec<RawRecord> {
        let mut records = Vec::new();
        let mut current = String::new();
        for line in output.lines() {
            if line.trim() == RECORD_SEPARATOR {
                if !current.trim().is_empty() {
                    records.push(RawRecord::new(std::mem::take(&mut current)));
                }
                current.clear();
                continue;
            }
            current.push_str(line);
            current.push('\n');
        }
        if !current.trim().is_empty() {
            records.push(RawRecord::new(current));
        }
        records
    }

    /// `Device Path` of the first line carrying one.
    pub fn device_path(&self) -> Option<&str> {
        self.text
            .lines()
            .find_map(|l| l.trim().strip_prefix("Device Path:"))
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn is_unsupported(&self) -> bool {
        UNSUPPORTED_PHRASES.iter().any(|p| self.text.contains(p))
    }

    pub fn inferred_support(&self) -> Option<SmartSupport> {
        SUPPORT_PHRASES
            .iter()
            .find(|(phrase, _)| self.text.contains(phrase))
            .map(|(_, state)| *state)
    }

    /// Tokenize, extract tables and normalize attributes.
    pub fn parse(&self) -> SmartReport {
        let mut attributes = tables::parse_attributes(&self.text);
        normalize::normalize(&mut attributes);

        SmartReport {
            fields:     fields::tokenize(&self.text),
            attributes,
            stats:      tables::parse_device_stats(&self.text),
            phy_events: tables::parse_phy_events(&self.text),
        }
    }
}
