use crate::models::smart::{Attribute, AttributeTable, DeviceStats};
use regex::Regex;
use std::sync::OnceLock;

//   1 Raw_Read_Error_Rate     0x000a   098   098   000    Old_age   Always       -       0
// 194 Temperature_Celsius     0x0023   077   062   030    Pre-fail  Always       -       23 (Min/Max 10/38)
fn attribute_re() -> &'static Regex {
    static ATTRIBUTE_RE: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE_RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*(\d{1,3})[ \t]+(\S+)[ \t]+0x[0-9a-fA-F]{4}[ \t]+(\d+)[ \t]+(\d+)[ \t]+(\d+)[ \t]+(\S+)[ \t]+\S+[ \t]+\S+[ \t]+(\d+)",
        )
        .expect("valid attribute regex")
    })
}

// 0x03  0x020  4               0  ---  Number of Reallocated Logical Sectors
fn stat_re() -> &'static Regex {
    static STAT_RE: OnceLock<Regex> = OnceLock::new();
    STAT_RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*0x[0-9a-fA-F]{2}[ \t]+0x[0-9a-fA-F]{3}[ \t]+\d+[ \t]+(\d+)[ \t]+\S{3}[ \t]+(\w[^\r\n]*?)[ \t]*$",
        )
        .expect("valid device statistics regex")
    })
}

// 0x000a  2            4  Device-to-host register FISes sent due to a COMRESET
fn phy_re() -> &'static Regex {
    static PHY_RE: OnceLock<Regex> = OnceLock::new();
    PHY_RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*0x[0-9a-fA-F]{4}[ \t]+\d+[ \t]+(\d+)[ \t]+(\w[^\r\n]*?)[ \t]*$")
            .expect("valid phy event regex")
    })
}

/// Extract the vendor attribute table. Values are as printed; see
/// [`crate::util::normalize`] for rescaling.
pub fn parse_attributes(text: &str) -> AttributeTable {
    let mut attrs = AttributeTable::new();

    for caps in attribute_re().captures_iter(text) {
        let id: u8 = match caps[1].parse() {
            Ok(id) => id,
            Err(_) => continue,
        };
        let (value, worst, threshold, raw) = match (
            caps[3].parse::<u32>(),
            caps[4].parse::<u32>(),
            caps[5].parse::<u32>(),
            caps[7].parse::<u64>(),
        ) {
            (Ok(v), Ok(w), Ok(t), Ok(r)) => (v, w, t, r),
            _ => continue,
        };

        attrs.insert(id, Attribute {
            id,
            name:      caps[2].replace('_', " "),
            value:     value as f64,
            worst:     worst as f64,
            threshold: threshold as f64,
            attr_type: caps[6].replace('_', " ").to_lowercase(),
            raw,
        });
    }

    attrs
}

/// Extract the device statistics log (`smartctl -l devstat`).
pub fn parse_device_stats(text: &str) -> DeviceStats {
    stat_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let value = caps[1].parse::<u64>().ok()?;
            Some((caps[2].to_string(), value))
        })
        .collect()
}

/// Sum of the SATA PHY event counters, `None` when the table is absent.
pub fn parse_phy_events(text: &str) -> Option<u64> {
    let mut seen = false;
    let mut total: u64 = 0;
    for caps in phy_re().captures_iter(text) {
        seen = true;
        if &caps[2] == "Vendor specific" {
            continue;
        }
        if let Ok(v) = caps[1].parse::<u64>() {
            total = total.saturating_add(v);
        }
    }
    seen.then_some(total)
}
