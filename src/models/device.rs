use crate::models::field::FieldMap;
use serde::Serialize;

/// How a record reached the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PathClass {
    /// Controller-indexed selector, e.g. `/dev/bus/0 -d megaraid,4`.
    Indexed,
    /// Plain block device node, e.g. `/dev/sde` or `/dev/sde -d sat,12`.
    Block,
}

/// smartctl `-d` types that address a disk by its index behind a controller.
const CONTROLLER_TYPES: &[&str] = &[
    "3ware", "aacraid", "areca", "cciss", "hpt", "jmb39x", "jmb39x-q", "jmb39x-q2",
    "jms56x", "megaraid", "sssraid",
];

impl PathClass {
    /// Classify a `Device Path` value.
    pub fn of(path: &str) -> Self {
        let indexed = selector(path)
            .and_then(|sel| sel.split_once(','))
            .map(|(kind, _)| CONTROLLER_TYPES.contains(&kind.trim()))
            .unwrap_or(false);
        if indexed { PathClass::Indexed } else { PathClass::Block }
    }
}

/// The `-d <type>` part of a scan path, if any.
fn selector(path: &str) -> Option<&str> {
    path.split_once(" -d ").map(|(_, sel)| sel.trim())
}

/// Bare device name from a scan path: `/dev/sde -d sat` → `sde`.
pub fn block_name(path: &str) -> String {
    let node = path.split(" -d ").next().unwrap_or(path).trim();
    node.rsplit('/').next().unwrap_or(node).to_string()
}

/// Controller pass-through node such as `/dev/bus/0`, which names a bus
/// rather than a disk.
pub fn is_controller_node(path: &str) -> bool {
    let node = path.split(" -d ").next().unwrap_or(path).trim();
    let name = block_name(node);
    node.starts_with("/dev/bus/") || (!name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
}

/// Sanitize a title into an identifier: only alphanumerics and `-_.` survive.
pub fn prep_id(title: &str) -> String {
    let id: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    id.trim_start_matches('_').to_string()
}

/// One physical device after merging all of its access paths.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalDeviceRecord {
    /// Index of the input record this one was built from.
    pub source:       usize,
    /// Serial number, or the device path when no serial was reported.
    pub key:          String,
    pub serial:       Option<String>,
    pub device_path:  Option<String>,
    pub path_class:   PathClass,
    pub block_device: String,
    pub title:        String,
    pub id:           String,
    pub vendor:       Option<String>,
    pub model:        Option<String>,
    pub fields:       FieldMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_scan_paths() {
        assert_eq!(PathClass::of("/dev/sde"), PathClass::Block);
        assert_eq!(PathClass::of("/dev/sde -d sat"), PathClass::Block);
        assert_eq!(PathClass::of("/dev/bus/0 -d megaraid,4"), PathClass::Indexed);
        assert_eq!(PathClass::of("/dev/sda -d cciss,0"), PathClass::Indexed);
        assert_eq!(PathClass::of("/dev/twa0 -d 3ware,2"), PathClass::Indexed);
        assert_eq!(PathClass::of("/dev/sg2 -d areca,3/1"), PathClass::Indexed);
    }

    #[test]
    fn sat_options_with_commas_are_block_paths() {
        assert_eq!(PathClass::of("/dev/sde -d sat,12"), PathClass::Block);
        assert_eq!(PathClass::of("/dev/sde -d sat,auto"), PathClass::Block);
        assert_eq!(PathClass::of("/dev/sdb -d usbjmicron,p"), PathClass::Block);
    }

    #[test]
    fn controller_nodes() {
        assert!(is_controller_node("/dev/bus/0"));
        assert!(is_controller_node("/dev/bus/0 -d megaraid,4"));
        assert!(!is_controller_node("/dev/sde"));
        assert!(!is_controller_node("/dev/nvme0 -d nvme"));
    }

    #[test]
    fn block_name_drops_selector() {
        assert_eq!(block_name("/dev/sde -d sat"), "sde");
        assert_eq!(block_name("/dev/nvme0"), "nvme0");
        assert_eq!(block_name("disk2"), "disk2");
    }

    #[test]
    fn prep_id_replaces_odd_characters() {
        assert_eq!(prep_id("sda"), "sda");
        assert_eq!(prep_id("bus 0/4"), "bus_0_4");
        assert_eq!(prep_id("/dev"), "dev");
    }
}
