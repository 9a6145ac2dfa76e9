use crate::alerts::Severity;
use crate::models::metrics::Point;
use crate::pipeline::DeviceAnalysis;
use crate::util::human::{fmt_bytes, fmt_value};

/// Generate a human-readable health report to a String.
pub fn generate(devices: &[DeviceAnalysis]) -> String {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut out = String::new();

    out.push_str("═══════════════════════════════════════════════\n");
    out.push_str(&format!("  smartlens Health Report — {}\n", now));
    out.push_str("═══════════════════════════════════════════════\n\n");

    let active: Vec<_> = devices
        .iter()
        .flat_map(|d| d.analysis.events.iter())
        .filter(|e| e.severity != Severity::Clear)
        .collect();

    // ── Active events ──────────────────────────────────────────────────
    out.push_str(&format!("── Active Events ({}) ─────────────────────────\n", active.len()));
    if active.is_empty() {
        out.push_str("  ● All devices nominal\n");
    } else {
        for e in &active {
            out.push_str(&format!("  [{}]  {}{}\n", e.severity.label(), e.prefix(), e.summary));
        }
    }
    out.push('\n');

    // ── Devices ────────────────────────────────────────────────────────
    out.push_str(&format!("── Devices ({}) ───────────────────────────────\n", devices.len()));
    for d in devices {
        let dev = &d.device;
        let m = &d.analysis.derived;
        let vendor = dev.vendor.as_deref().unwrap_or("Unknown");
        let model  = dev.model.as_deref().unwrap_or("—");
        let serial = dev.serial.as_deref().unwrap_or("—");
        let cap = dev
            .fields
            .int("UserCapacity")
            .map(fmt_bytes)
            .unwrap_or_else(|| "—".to_string());
        let temp = match m.temperature_celsius {
            Some(t) => format!("{}°C", t),
            None    => "—".to_string(),
        };
        let kind = if m.hard_disk { "HDD" } else { "SSD" };

        out.push_str(&format!(
            "  {:8}  {:3}  Health:{:>4}%  Temp:{:6}  Cap:{:10}  {} {}\n  Serial: {}\n",
            dev.block_device, kind, fmt_value(m.overall_health), temp, cap, vendor, model, serial
        ));

        for (point, value) in &d.analysis.metrics {
            if matches!(point, Point::OverallHealth | Point::TemperatureCelsius) {
                continue;
            }
            out.push_str(&format!("    {:24} {}\n", point.id(), fmt_value(*value)));
        }
        out.push('\n');
    }

    out.push_str("═══════════════════════════════════════════════\n");
    out
}
