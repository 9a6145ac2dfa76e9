use crate::models::field::{FieldMap, FieldValue};
use crate::models::smart::{HealthStatus, SmartSupport};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn sector_re() -> &'static Regex {
    static SECTOR_RE: OnceLock<Regex> = OnceLock::new();
    SECTOR_RE.get_or_init(|| {
        Regex::new(r"(\d[\d,]*) bytes logical(?:/physical|, (\d[\d,]*) bytes physical)?")
            .expect("valid sector size regex")
    })
}

/// Title-case one term: a letter is upper-cased after a non-letter, lower-cased otherwise.
fn title_case(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    let mut prev_letter = false;
    for c in term.chars() {
        if c.is_alphabetic() {
            if prev_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(c);
            prev_letter = false;
        }
    }
    out
}

/// Strip the "is" phrasing from a label: `SMART support is` → `SMART support`.
pub fn strip_label(label: &str) -> &str {
    let label = label.trim();
    label.strip_suffix(" is").map(str::trim_end).unwrap_or(label)
}

/// Canonical field key for a raw label: `SMART overall-health` → `SmartOverallHealth`.
pub fn canonical_key(label: &str) -> String {
    strip_label(label)
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|t| !t.is_empty())
        .map(title_case)
        .collect()
}

/// Value after trimming and dropping one trailing period.
fn clean_value(value: &str) -> &str {
    let value = value.trim();
    value.strip_suffix('.').unwrap_or(value)
}

/// Leading numeric token: `4,000,787,030,016 bytes [4.00 TB]` → 4000787030016, `5%` → 5.
fn leading_int(value: &str) -> Option<u64> {
    let token = value.split_whitespace().next()?;
    let token = token.replace(',', "");
    token.strip_suffix('%').unwrap_or(&token).parse().ok()
}

fn looks_numeric(value: &str) -> bool {
    value.contains("bytes") || value.starts_with(|c: char| c.is_ascii_digit())
}

/// How a label's value is typed and keyed.
#[derive(Debug, PartialEq)]
enum LabelKind {
    SmartSupport,
    Health,
    SectorSizes,
    Alias(&'static str),
    ModelFallback,
    Generic,
}

fn classify(label: &str, key: &str) -> LabelKind {
    if key == "SmartSupport" {
        LabelKind::SmartSupport
    } else if label.starts_with("SMART overall-health") || key == "SmartHealthStatus" {
        LabelKind::Health
    } else if key == "SectorSizes" || key == "SectorSize" {
        LabelKind::SectorSizes
    } else if key == "SataVersion" || key == "TransportProtocol" {
        LabelKind::Alias("TransportType")
    } else if label.starts_with("AAM") {
        LabelKind::Alias("AamFeature")
    } else if label.starts_with("APM") {
        LabelKind::Alias("ApmFeature")
    } else if key == "TotalNvmCapacity" {
        LabelKind::Alias("UserCapacity")
    } else if key == "Product" || key == "ModelNumber" {
        LabelKind::ModelFallback
    } else {
        LabelKind::Generic
    }
}

/// Generic typing: integers for byte counts and digit-led values, text otherwise.
/// `None` means the field is dropped.
fn typed_value(label: &str, value: &str) -> Option<FieldValue> {
    if looks_numeric(value) {
        match leading_int(value) {
            Some(n) => Some(FieldValue::Int(n)),
            // "Min/Max 22/41" style intervals are parsed later by the event rules
            None if label.contains("Min/Max") => Some(FieldValue::Text(value.to_string())),
            None => {
                debug!(label, value, "dropping malformed numeric field");
                None
            }
        }
    } else {
        Some(FieldValue::Text(value.to_string()))
    }
}

/// Tokenize every "label: value" line of one record into a [`FieldMap`].
pub fn tokenize(text: &str) -> FieldMap {
    let mut map = FieldMap::new();

    for line in text.lines() {
        if !line.contains(": ") || line.contains("capability") {
            continue;
        }
        let Some((label_raw, value_raw)) = line.split_once(": ") else { continue };
        let label = strip_label(label_raw);
        let key   = canonical_key(label);
        if key.is_empty() {
            continue;
        }
        let value = clean_value(value_raw);

        match classify(label, &key) {
            LabelKind::SmartSupport => {
                map.insert(key, FieldValue::Smart(SmartSupport::from_value(value)));
            }
            LabelKind::Health => {
                map.insert(key, FieldValue::Health(HealthStatus::from_value(value)));
            }
            LabelKind::SectorSizes => match sector_re().captures(value) {
                Some(caps) => {
                    let logical = caps.get(1).and_then(|m| leading_int(m.as_str()));
                    let physical = caps
                        .get(2)
                        .and_then(|m| leading_int(m.as_str()))
                        .or(logical);
                    if let Some(n) = logical {
                        map.insert("LogicalSector", FieldValue::Int(n));
                    }
                    if let Some(n) = physical {
                        map.insert("PhysicalSector", FieldValue::Int(n));
                    }
                }
                None => {
                    if let Some(v) = typed_value(label, value) {
                        map.insert(key, v);
                    }
                }
            },
            LabelKind::Alias(alias) => {
                if let Some(v) = typed_value(label, value) {
                    map.insert(alias, v);
                }
            }
            LabelKind::ModelFallback => {
                if let Some(v) = typed_value(label, value) {
                    if map.contains("DeviceModel") {
                        map.insert(key, v);
                    } else {
                        map.insert("DeviceModel", v);
                    }
                }
            }
            LabelKind::Generic => {
                if let Some(v) = typed_value(label, value) {
                    map.insert(key, v);
                }
            }
        }
    }

    map
}
