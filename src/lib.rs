//! Disk health telemetry from `smartctl` text output.
//!
//! Raw collector output is split into per-device records, tokenized,
//! its tables extracted and normalized, health metrics derived through
//! ordered fallback rules, and graded threshold events emitted.

pub mod alerts;
pub mod collectors;
pub mod config;
pub mod health;
pub mod inventory;
pub mod models;
pub mod pipeline;
pub mod util;

pub use collectors::smart::RawRecord;
pub use pipeline::{Analysis, DeviceAnalysis, Pipeline};
