use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use smartlens::alerts::Severity;
use smartlens::config::Config;
use smartlens::inventory;
use smartlens::models::metrics::Point;
use smartlens::util::report;
use smartlens::{DeviceAnalysis, Pipeline};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "smartlens", about = "Disk health metrics and events from smartctl output", version)]
struct Cli {
    /// File with smartctl output, records separated by "--------" lines. Reads stdin when omitted or "-"
    input: Option<PathBuf>,

    /// Monitored host name stamped on events (overrides config)
    #[arg(short, long)]
    device: Option<String>,

    /// Comma-separated datapoints to emit (overrides config)
    #[arg(short, long, value_delimiter = ',')]
    points: Vec<Point>,

    /// Config file to use instead of the per-user one
    #[arg(long)]
    config_file: Option<PathBuf>,

    /// Print a human-readable health report and exit
    #[arg(long)]
    report: bool,

    /// Print the resolved device inventory as JSON and exit
    #[arg(long)]
    inventory: bool,

    /// Health check: exit 0=OK, 1=WARNING, 2=ERROR (nagios/cron compatible)
    #[arg(long)]
    check: bool,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,

    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut cfg = match &cli.config_file {
        Some(path) => Config::load_from(path)?,
        None       => Config::load(),
    };
    if let Some(device) = &cli.device {
        cfg.events.device = device.clone();
    }
    if !cli.points.is_empty() {
        cfg.metrics.points = cli.points.clone();
    }

    if cli.config {
        return run_print_config(&cfg);
    }

    let output = read_input(cli.input.as_ref())?;

    if cli.inventory {
        return run_inventory(&cfg, &output);
    }

    let pipeline = Pipeline::from_config(&cfg)?;
    let devices = pipeline.run(&output);
    tracing::info!(devices = devices.len(), "analysis complete");

    if cli.check {
        return run_check(&devices);
    }
    if cli.report {
        print!("{}", report::generate(&devices));
        return Ok(());
    }
    run_json_snapshot(&devices)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(p)
            .with_context(|| format!("reading {}", p.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

fn run_json_snapshot(devices: &[DeviceAnalysis]) -> Result<()> {
    let snapshot = json!({
        "smartlens_version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Local::now().to_rfc3339(),
        "devices": devices.iter().map(|d| json!({
            "key":          d.device.key,
            "id":           d.device.id,
            "device_path":  d.device.device_path,
            "block_device": d.device.block_device,
            "vendor":       d.device.vendor,
            "model":        d.device.model,
            "serial":       d.device.serial,
            "component":    d.analysis.component,
            "metrics":      d.analysis.metrics,
            "events":       d.analysis.events,
        })).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn run_inventory(cfg: &Config, output: &str) -> Result<()> {
    let filter = inventory::InventoryFilter::from_config(&cfg.inventory)?;
    let devices = inventory::model(output, &filter);
    println!("{}", serde_json::to_string_pretty(&devices)?);
    Ok(())
}

fn run_check(devices: &[DeviceAnalysis]) -> Result<()> {
    let events: Vec<_> = devices
        .iter()
        .flat_map(|d| d.analysis.events.iter())
        .filter(|e| e.severity != Severity::Clear)
        .collect();

    if events.is_empty() {
        println!("OK — {} device(s), no active events", devices.len());
        std::process::exit(0);
    }

    for e in &events {
        println!("[{}] {}{}", e.severity.label(), e.prefix(), e.summary);
    }

    if events.iter().any(|e| e.severity == Severity::Error) {
        std::process::exit(2);
    }
    std::process::exit(1);
}

fn run_print_config(cfg: &Config) -> Result<()> {
    let path = Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    println!("Config: {}", path);
    println!();
    println!("[inventory]");
    println!("  path_match       = {:?}", cfg.inventory.path_match);
    println!("  model_exclude    = {:?}", cfg.inventory.model_exclude);
    println!("  skip_unsupported = {}", cfg.inventory.skip_unsupported);
    println!();
    println!("[metrics]");
    let points: Vec<&str> = cfg.metrics.points.iter().map(|p| p.id()).collect();
    println!("  points = {}", points.join(", "));
    println!();
    println!("[derivation]");
    println!("  offline_uses_own_raw = {}", cfg.derivation.offline_uses_own_raw);
    println!();
    println!("[events]");
    println!("  device = {}", cfg.events.device);
    Ok(())
}
