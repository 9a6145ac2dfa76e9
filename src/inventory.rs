//! Device identity resolution: one canonical record per physical device.
//!
//! A disk behind a RAID controller can show up twice in a scan, once through
//! the controller (`/dev/bus/0 -d megaraid,4`) and once as a block device
//! (`/dev/sde`). Both carry the same serial number.

use crate::collectors::smart::RawRecord;
use crate::config::InventoryConfig;
use crate::models::device::{block_name, is_controller_node, prep_id, CanonicalDeviceRecord, PathClass};
use crate::models::field::{FieldMap, FieldValue};
use crate::util::lookup::split_vendor;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Field holding the bare block device name.
pub const BLOCK_DEVICE_KEY: &str = "BlockDevice";

/// A tokenized record plus whether smartctl could talk to the device.
#[derive(Debug, Clone)]
pub struct TokenizedRecord {
    pub fields:      FieldMap,
    pub unsupported: bool,
}

impl TokenizedRecord {
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            fields:      crate::collectors::fields::tokenize(&raw.text),
            unsupported: raw.is_unsupported(),
        }
    }
}

/// Device path / model / capability filters.
#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    path_match:       Option<Regex>,
    model_exclude:    Option<Regex>,
    skip_unsupported: bool,
}

impl InventoryFilter {
    pub fn from_config(cfg: &InventoryConfig) -> Result<Self> {
        let compile = |pattern: &str, what: &str| -> Result<Option<Regex>> {
            if pattern.is_empty() {
                return Ok(None);
            }
            Regex::new(pattern)
                .map(Some)
                .with_context(|| format!("invalid {} pattern '{}'", what, pattern))
        };
        Ok(Self {
            path_match:       compile(&cfg.path_match, "path_match")?,
            model_exclude:    compile(&cfg.model_exclude, "model_exclude")?,
            skip_unsupported: cfg.skip_unsupported,
        })
    }

    pub fn accepts(&self, record: &TokenizedRecord) -> bool {
        let path = record.fields.text("DevicePath").unwrap_or("");
        if self.skip_unsupported && record.unsupported {
            info!(path, "ignored: device does not support SMART");
            return false;
        }
        if let Some(re) = &self.path_match {
            if !re.is_match(path) {
                info!(path, pattern = re.as_str(), "ignored due to path_match");
                return false;
            }
        }
        if let (Some(re), Some(model)) = (&self.model_exclude, record.fields.text("DeviceModel")) {
            if re.is_match(model) {
                info!(path, model, "ignored due to model_exclude");
                return false;
            }
        }
        true
    }
}

/// Build one canonical record from a single access path.
fn canonical(source: usize, mut fields: FieldMap) -> Option<CanonicalDeviceRecord> {
    let path = fields.text("DevicePath").map(str::to_string);
    let serial = fields.text("SerialNumber").map(str::to_string);
    let key = serial.clone().or_else(|| path.clone())?;

    let path_class = path.as_deref().map(PathClass::of).unwrap_or(PathClass::Block);
    let existing = fields.text(BLOCK_DEVICE_KEY).map(str::to_string);
    let block_device = match existing {
        Some(name) => name,
        None => {
            let name = path.as_deref().map(block_name).unwrap_or_default();
            fields.insert(BLOCK_DEVICE_KEY, FieldValue::Text(name.clone()));
            name
        }
    };
    let title = if block_device.is_empty() { key.clone() } else { block_device.clone() };
    let (vendor, model) = match fields.text("DeviceModel") {
        Some(m) if !m.is_empty() => {
            let (v, m) = split_vendor(m);
            (Some(v), Some(m))
        }
        _ => (None, None),
    };

    Some(CanonicalDeviceRecord {
        source,
        key,
        serial,
        device_path: path,
        path_class,
        block_device,
        id: prep_id(&title),
        title,
        vendor,
        model,
        fields,
    })
}

/// The record names a kernel disk node rather than a controller bus.
fn kernel_named(record: &CanonicalDeviceRecord) -> bool {
    !record.block_device.is_empty()
        && !record.device_path.as_deref().map(is_controller_node).unwrap_or(false)
}

fn adopt_block_name(record: &mut CanonicalDeviceRecord, name: String) {
    record.title = name.clone();
    record.id = prep_id(&record.title);
    record.block_device = name.clone();
    record.fields.insert(BLOCK_DEVICE_KEY, FieldValue::Text(name));
}

/// Two records of one path class with the same key. A controller node keeps
/// its data and takes the kernel node's name; otherwise the lower path wins.
fn collide(a: CanonicalDeviceRecord, b: CanonicalDeviceRecord) -> CanonicalDeviceRecord {
    let (mut base, other) = match (kernel_named(&a), kernel_named(&b)) {
        (false, true) => (a, b),
        (true, false) => (b, a),
        _ if b.device_path < a.device_path => (b, a),
        _ => (a, b),
    };
    debug!(
        key = %base.key,
        kept = ?base.device_path,
        dropped = ?other.device_path,
        "duplicate key in one path class"
    );
    if !kernel_named(&base) && kernel_named(&other) {
        adopt_block_name(&mut base, other.block_device);
    }
    base
}

/// Merge access-path records into one record per serial number.
///
/// Output is ordered by key. Records with neither a device path nor a
/// serial number are dropped.
pub fn resolve(records: Vec<FieldMap>) -> Vec<CanonicalDeviceRecord> {
    let mut indexed: BTreeMap<String, CanonicalDeviceRecord> = BTreeMap::new();
    let mut block:   BTreeMap<String, CanonicalDeviceRecord> = BTreeMap::new();

    for (source, fields) in records.into_iter().enumerate() {
        let Some(record) = canonical(source, fields) else {
            debug!("dropping record without device path or serial number");
            continue;
        };
        let arena = match record.path_class {
            PathClass::Indexed => &mut indexed,
            PathClass::Block   => &mut block,
        };
        let record = match arena.remove(&record.key) {
            Some(prev) => collide(prev, record),
            None => record,
        };
        arena.insert(record.key.clone(), record);
    }

    for (key, record) in indexed.iter_mut() {
        // only serial numbers identify the same physical disk across paths
        if record.serial.is_none() {
            continue;
        }
        if let Some(dup) = block.remove(key) {
            debug!(serial = %key, block = %dup.block_device, "merging block path into indexed record");
            if kernel_named(&dup) {
                adopt_block_name(record, dup.block_device);
            }
        }
    }

    let mut merged = indexed;
    merged.extend(block);
    merged.into_values().collect()
}

/// Tokenize, filter and resolve a whole collector output.
pub fn model(output: &str, filter: &InventoryFilter) -> Vec<CanonicalDeviceRecord> {
    let records = RawRecord::split(output)
        .iter()
        .map(TokenizedRecord::from_raw)
        .filter(|r| filter.accepts(r))
        .map(|r| r.fields)
        .collect();
    resolve(records)
}
