use crate::models::smart::{HealthStatus, SmartSupport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Datapoint identifiers a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Point {
    SmartEnabled,
    HealthCheck,
    PhyEvents,
    ReallocatedSectors,
    ReallocatedRaw,
    ReallocatedOffline,
    ReallocatedOfflineRaw,
    PendingSectors,
    TemperatureCelsius,
    ReadErrorHealth,
    ReallocatedHealth,
    LifetimeHealth,
    SsdHealth,
    OverallHealth,
    NvmeAvailableSpare,
}

impl Point {
    pub const ALL: [Point; 15] = [
        Point::SmartEnabled,
        Point::HealthCheck,
        Point::PhyEvents,
        Point::ReallocatedSectors,
        Point::ReallocatedRaw,
        Point::ReallocatedOffline,
        Point::ReallocatedOfflineRaw,
        Point::PendingSectors,
        Point::TemperatureCelsius,
        Point::ReadErrorHealth,
        Point::ReallocatedHealth,
        Point::LifetimeHealth,
        Point::SsdHealth,
        Point::OverallHealth,
        Point::NvmeAvailableSpare,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Point::SmartEnabled          => "smart_enabled",
            Point::HealthCheck           => "health_check",
            Point::PhyEvents             => "phy_events",
            Point::ReallocatedSectors    => "reallocated_sectors",
            Point::ReallocatedRaw        => "reallocated_raw",
            Point::ReallocatedOffline    => "reallocated_offline",
            Point::ReallocatedOfflineRaw => "reallocated_offline_raw",
            Point::PendingSectors        => "pending_sectors",
            Point::TemperatureCelsius    => "temperature_celsius",
            Point::ReadErrorHealth       => "read_error_health",
            Point::ReallocatedHealth     => "reallocated_health",
            Point::LifetimeHealth        => "lifetime_health",
            Point::SsdHealth             => "ssd_health",
            Point::OverallHealth         => "overall_health",
            Point::NvmeAvailableSpare    => "nvme_available_spare",
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Point {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Point::ALL
            .iter()
            .copied()
            .find(|p| p.id() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown datapoint '{}'", s))
    }
}

/// Health signals derived from one record. `None` means "no source", never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub hard_disk:               bool,
    pub smart_enabled:           SmartSupport,
    pub health_check:            HealthStatus,
    pub phy_events:              Option<u64>,
    pub reallocated_sectors:     Option<u64>,
    pub reallocated_raw:         Option<u64>,
    pub reallocated_offline:     Option<u64>,
    pub reallocated_offline_raw: Option<u64>,
    pub pending_sectors:         Option<u64>,
    pub temperature_celsius:     Option<u64>,
    pub read_error_health:       Option<f64>,
    pub reallocated_health:      Option<f64>,
    pub lifetime_health:         Option<f64>,
    pub ssd_health:              Option<f64>,
    pub overall_health:          f64,
    pub nvme_available_spare:    Option<u64>,
    /// 255 when the device reports no spare threshold.
    pub nvme_spare_threshold:    u64,
}

impl DerivedMetrics {
    pub fn value(&self, point: Point) -> Option<f64> {
        match point {
            Point::SmartEnabled          => Some(self.smart_enabled.code() as f64),
            Point::HealthCheck           => Some(self.health_check.code() as f64),
            Point::PhyEvents             => self.phy_events.map(|v| v as f64),
            Point::ReallocatedSectors    => self.reallocated_sectors.map(|v| v as f64),
            Point::ReallocatedRaw        => self.reallocated_raw.map(|v| v as f64),
            Point::ReallocatedOffline    => self.reallocated_offline.map(|v| v as f64),
            Point::ReallocatedOfflineRaw => self.reallocated_offline_raw.map(|v| v as f64),
            Point::PendingSectors        => self.pending_sectors.map(|v| v as f64),
            Point::TemperatureCelsius    => self.temperature_celsius.map(|v| v as f64),
            Point::ReadErrorHealth       => self.read_error_health,
            Point::ReallocatedHealth     => self.reallocated_health,
            Point::LifetimeHealth        => self.lifetime_health,
            Point::SsdHealth             => self.ssd_health,
            Point::OverallHealth         => Some(self.overall_health),
            Point::NvmeAvailableSpare    => self.nvme_available_spare.map(|v| v as f64),
        }
    }

    /// Values for the requested points only, skipping absent metrics.
    pub fn values(&self, points: &[Point]) -> BTreeMap<Point, f64> {
        points
            .iter()
            .filter_map(|p| self.value(*p).map(|v| (*p, v)))
            .collect()
    }
}
