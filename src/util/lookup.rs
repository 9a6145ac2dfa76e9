use std::collections::HashMap;
use std::sync::OnceLock;

/// Display names for attribute ids smartctl prints as `Unknown_Attribute`.
/// <https://en.wikipedia.org/wiki/S.M.A.R.T.>
const ATTRIBUTE_NAMES: &[(u8, &str)] = &[
    (1,   "Raw Read Error Rate"),
    (2,   "Throughput Performance"),
    (3,   "Spin Up Time"),
    (4,   "Start Stop Count"),
    (5,   "Reallocated Sector Ct"),
    (7,   "Seek Error Rate"),
    (8,   "Seek Time Performance"),
    (9,   "Power On Hours"),
    (10,  "Spin Retry Count"),
    (11,  "Calibration Retry Count"),
    (12,  "Power Cycle Count"),
    (169, "Remaining Life Percentage"),
    (170, "Available Reserved Space"),
    (171, "Program Fail Count"),
    (172, "Erase Fail Count"),
    (173, "Ave Block-Erase Count"),
    (174, "Unexpect Power Loss Ct"),
    (175, "Program Fail Count Chip"),
    (176, "Erase Fail Count Chip"),
    (177, "Wear Leveling Count"),
    (178, "Used Rsvd Blk Cnt Chip"),
    (179, "Used Rsvd Blk Cnt Tot"),
    (180, "Unused Rsvd Blk Cnt Tot"),
    (181, "Program Fail Cnt Total"),
    (182, "Erase Fail Count Total"),
    (183, "Runtime Bad Block"),
    (184, "End-to-End Error"),
    (187, "Uncorrectable Error Cnt"),
    (188, "Command Timeout"),
    (189, "High Fly Writes"),
    (190, "Airflow Temperature Cel"),
    (191, "G-Sense Error Rate"),
    (192, "Power-Off Retract Count"),
    (193, "Load Cycle Count"),
    (194, "Temperature Celsius"),
    (195, "Hardware ECC Recovered"),
    (196, "Reallocated Event Count"),
    (197, "Current Pending Sector"),
    (198, "Offline Uncorrectable"),
    (199, "CRC Error Count"),
    (200, "Multi Zone Error Rate"),
    (201, "Unc Soft Read Err Rate"),
    (202, "Percent Lifetime Remain"),
    (204, "Soft ECC Correct Rate"),
    (206, "Write Error Rate"),
    (210, "Success RAIN Recov Cnt"),
    (225, "Load/Unload Cycle Count"),
    (230, "Life Curve Status"),
    (231, "SSD Life Left"),
    (235, "POR Recovery Count"),
    (240, "Head Flying Hours"),
    (241, "Total LBAs Written"),
    (242, "Total LBAs Read"),
    (246, "Total LBAs Written"),
    (247, "Host Program Page Count"),
    (248, "FTL Program Page Count"),
];

/// Model prefix → vendor. Not exhaustive.
const VENDOR_ALIASES: &[(&str, &str)] = &[
    ("CT",  "Crucial"),
    ("HU",  "Hitachi"),
    ("HUC", "Hitachi"),
    ("KB",  "Kioxia"),
    ("KBG", "Kioxia"),
    ("MK",  "Mushkin"),
    ("MKN", "Mushkin"),
    ("SM",  "Samsung"),
    ("ST",  "Seagate"),
    ("TH",  "Toshiba"),
    ("THN", "Toshiba"),
    ("WD",  "Western Digital"),
    ("WDC", "Western Digital"),
    ("XP",  "Samsung"),
];

fn attribute_names() -> &'static HashMap<u8, &'static str> {
    static NAMES: OnceLock<HashMap<u8, &'static str>> = OnceLock::new();
    NAMES.get_or_init(|| ATTRIBUTE_NAMES.iter().copied().collect())
}

fn vendor_aliases() -> &'static HashMap<&'static str, &'static str> {
    static ALIASES: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    ALIASES.get_or_init(|| VENDOR_ALIASES.iter().copied().collect())
}

pub fn attribute_name(id: u8) -> Option<&'static str> {
    attribute_names().get(&id).copied()
}

pub fn vendor_alias(prefix: &str) -> Option<&'static str> {
    vendor_aliases().get(prefix).copied()
}

/// Split a model string into (vendor, model).
///
/// `WDC WD40EFRX-68N32N0` → (`Western Digital`, `WD40EFRX-68N32N0`);
/// `ST4000DM004` → (`Seagate`, `ST4000DM004`).
pub fn split_vendor(model: &str) -> (String, String) {
    let model = model.trim();
    match model.split_once(' ') {
        Some((vendor, rest)) => {
            let vendor = vendor_alias(vendor).unwrap_or(vendor);
            (vendor.to_string(), rest.trim().to_string())
        }
        None => {
            let prefix: String = model.chars().take(2).collect();
            let vendor = vendor_alias(&prefix).unwrap_or("Unknown");
            (vendor.to_string(), model.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_attribute_names() {
        assert_eq!(attribute_name(231), Some("SSD Life Left"));
        assert_eq!(attribute_name(6), None);
    }

    #[test]
    fn vendor_from_first_word() {
        assert_eq!(split_vendor("WDC WD40EFRX-68N32N0"),
                   ("Western Digital".to_string(), "WD40EFRX-68N32N0".to_string()));
        assert_eq!(split_vendor("Samsung SSD 860 EVO 500GB"),
                   ("Samsung".to_string(), "SSD 860 EVO 500GB".to_string()));
    }

    #[test]
    fn vendor_from_prefix() {
        assert_eq!(split_vendor("ST4000DM004").0, "Seagate");
        assert_eq!(split_vendor("CT500MX500SSD1").0, "Crucial");
        assert_eq!(split_vendor("ZZ123").0, "Unknown");
    }
}
