// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

use vahan_dashboard::{
    build_dashboard, format_count, load_data, CacheKey, DashboardFilters, DashboardView,
    DataPaths, LoadCache, LoadedData, SourceMode,
};

/// CLI configuration: source paths plus initial filter state.
struct Config {
    paths: DataPaths,
    filters: DashboardFilters,
    report: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = parse_args();

    if config.report {
        // Report mode: print one dashboard pass and exit
        run_report(&config)?;
    } else {
        // UI mode (default)
        run_ui_mode(config)?;
    }

    Ok(())
}

fn parse_args() -> Config {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut config = Config {
        paths: DataPaths::default(),
        filters: DashboardFilters::default(),
        report: false,
    };
    let mut from_year: Option<i32> = None;
    let mut to_year: Option<i32> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "report" => config.report = true,
            "--ev" => config.filters.ev_only = true,
            "--yearly" => match iter.next() {
                Some(path) => config.paths.yearly = path.into(),
                None => usage_error("--yearly requires a file path"),
            },
            "--monthly" => match iter.next() {
                Some(path) => config.paths.monthly = path.into(),
                None => usage_error("--monthly requires a file path"),
            },
            "--from" => from_year = Some(parse_year_arg(iter.next(), "--from")),
            "--to" => to_year = Some(parse_year_arg(iter.next(), "--to")),
            other => usage_error(&format!("unknown argument: {other}")),
        }
    }

    config.filters.year_range = match (from_year, to_year) {
        (Some(from), Some(to)) => Some((from, to)),
        (None, None) => None,
        _ => usage_error("--from and --to must be given together"),
    };

    config
}

fn parse_year_arg(value: Option<&String>, flag: &str) -> i32 {
    match value.and_then(|v| v.parse().ok()) {
        Some(year) => year,
        None => usage_error(&format!("{flag} requires a year, e.g. {flag} 2021")),
    }
}

fn usage_error(message: &str) -> ! {
    eprintln!("❌ {message}");
    eprintln!();
    eprintln!("Usage: vahan-dashboard [report] [--ev] [--yearly PATH] [--monthly PATH]");
    eprintln!("                       [--from YEAR --to YEAR]");
    process::exit(1);
}

/// Load both sources through a shared time-bounded cache.
fn load_sources(
    cache: &LoadCache,
    paths: &DataPaths,
    ev_only: bool,
) -> Result<(LoadedData, LoadedData)> {
    let yearly = cache.get_or_load(
        CacheKey {
            mode: SourceMode::Yearly,
            ev_only,
        },
        || load_data(paths, SourceMode::Yearly, ev_only),
    )?;
    let monthly = cache.get_or_load(
        CacheKey {
            mode: SourceMode::Monthly,
            ev_only,
        },
        || load_data(paths, SourceMode::Monthly, ev_only),
    )?;
    Ok((yearly, monthly))
}

fn run_report(config: &Config) -> Result<()> {
    println!("🚗 Vahan Registration Dashboard");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let cache = LoadCache::with_default_ttl();

    println!("\n📂 Loading sources...");
    let (yearly, monthly) = load_sources(&cache, &config.paths, config.filters.ev_only)?;
    println!(
        "✓ Loaded {} yearly rows, {} monthly rows",
        yearly.records.len(),
        monthly.records.len()
    );

    let view = build_dashboard(&yearly, &monthly, &config.filters);
    let data = match view {
        DashboardView::Empty => {
            println!("\n⚠️  No data matches the current filters.");
            println!("   Try expanding the year range or disabling the EV-only toggle.");
            return Ok(());
        }
        DashboardView::Ready(data) => data,
    };

    println!(
        "\n📊 Market KPIs ({}–{})",
        data.year_bounds.0, data.year_bounds.1
    );
    for kpi in &data.kpis {
        println!(
            "  {:<6} QoQ: {:>12} ({})   YoY: {:>12} ({})",
            kpi.group,
            format_count(kpi.qoq_latest),
            kpi.qoq_delta,
            format_count(kpi.yoy_latest),
            kpi.yoy_delta
        );
    }

    println!("\n📈 Monthly registrations by vehicle category (latest 12 cells)");
    let tail = data.monthly_trend.len().saturating_sub(12);
    for row in &data.monthly_trend[tail..] {
        println!(
            "  {}  {:<6} {:>12}",
            row.period.format("%Y-%m"),
            row.group,
            format_count(row.registrations as i64)
        );
    }

    if data.has_maker {
        println!("\n🏭 Manufacturer YoY growth (yearly data)");
        for row in data.maker_growth.iter().take(15) {
            let change = match row.yoy_change_pct {
                Some(pct) => format!("{pct:+.1}%"),
                None => "n/a".to_string(),
            };
            let latest = row.latest.map(format_count).unwrap_or_else(|| "-".to_string());
            println!("  {:<28} {:>8}  latest {:>12}", row.maker, change, latest);
        }
    } else {
        println!("\n⚠️  Manufacturer column not found in yearly dataset;");
        println!("   maker-level analysis is hidden. Category KPIs are still shown.");
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: Config) -> Result<()> {
    println!("🖥️  Loading Vahan Registration Dashboard UI...\n");

    let cache = LoadCache::with_default_ttl();
    let (yearly, monthly) = load_sources(&cache, &config.paths, config.filters.ev_only)?;

    println!(
        "✓ Loaded {} yearly rows, {} monthly rows\n",
        yearly.records.len(),
        monthly.records.len()
    );
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(config.paths, cache, config.filters)?;
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(config: Config) -> Result<()> {
    eprintln!("❌ TUI mode not available in this build!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print a one-shot report: vahan-dashboard report");
    let _ = config;
    std::process::exit(1);
}
