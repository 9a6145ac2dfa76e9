use crate::health::DeriveOptions;
use crate::models::metrics::Point;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub inventory: InventoryConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub derivation: DerivationConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

/// Which records make it into the device inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Regex a device path must match. Empty = every path.
    pub path_match: String,
    /// Regex of device models to leave out. Empty = none.
    pub model_exclude: String,
    /// Drop devices smartctl cannot read SMART data from.
    pub skip_unsupported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Datapoints to emit, e.g. ["temperature_celsius", "overall_health"].
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Use attribute 198's own raw value for reallocated_offline.
    /// Off keeps mirroring attribute 5 like earlier releases.
    pub offline_uses_own_raw: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Monitored host name stamped on every event.
    pub device: String,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path_match:       String::new(),
            model_exclude:    String::new(),
            skip_unsupported: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { points: Point::ALL.to_vec() }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { device: "localhost".into() }
    }
}

impl DerivationConfig {
    pub fn options(&self) -> DeriveOptions {
        DeriveOptions { offline_uses_own_raw: self.offline_uses_own_raw }
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    /// Load the user config, writing defaults on first run.
    pub fn load() -> Self {
        match try_load() {
            Ok(c)  => c,
            Err(e) => {
                tracing::debug!(error = %e, "using default config");
                // best-effort
                let _ = try_write_defaults();
                Config::default()
            }
        }
    }

    /// Load an explicit config file; errors are reported, not defaulted.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("smartlens").join("smartlens.toml"))
    }
}

fn try_load() -> Result<Config> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    Config::load_from(&path)
}

fn try_write_defaults() -> Result<()> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# smartlens configuration\n# Generated on first run, edit freely\n\n{}", text))?;
    Ok(())
}
