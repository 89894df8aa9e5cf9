use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use welfare_reports::config::AppConfig;
use welfare_reports::fetch::{cache::SheetCache, RemoteClient};
use welfare_reports::housekeeping;
use welfare_reports::report::{self, render, ExtractionTarget};
use welfare_reports::workbook::{load, RawWorkbook};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Monthly contribution report extraction for welfare groups"
)]
struct Args {
    /// Local workbook to read (xlsx, xls, xlsb, ods or csv).
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Shared spreadsheet URL; falls back to the configured default.
    #[arg(long, conflicts_with = "file")]
    sheet_url: Option<String>,
    /// Year the contributions belong to.
    #[arg(short, long)]
    year: i32,
    /// Month number, 1 = January.
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=12))]
    month: u8,
    #[arg(short, long, default_value = "welfare.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;

    // ─── 2) prepare folders ──────────────────────────────────────────
    for dir in [&config.upload_dir, &config.report_dir] {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    // ─── 3) retention sweep ──────────────────────────────────────────
    if config.retention_days > 0 {
        for dir in [&config.upload_dir, &config.report_dir] {
            match housekeeping::cleanup_old_files(dir, config.retention_days) {
                Ok(removed) if !removed.is_empty() => {
                    info!(dir = %dir.display(), removed = removed.len(), "cleaned up old files");
                }
                Ok(_) => {}
                Err(e) => warn!(dir = %dir.display(), error = %e, "cleanup failed"),
            }
        }
    }

    // ─── 4) load the workbook ────────────────────────────────────────
    let target = ExtractionTarget::new(args.year, args.month)?;
    let workbook = resolve_workbook(&args, &config, &target).await?;
    info!(sheets = workbook.len(), "workbook loaded");

    // ─── 5) extract the period ───────────────────────────────────────
    let record = report::extract_report(&workbook, target)?;

    // ─── 6) render + persist ─────────────────────────────────────────
    println!(
        "{}",
        render::render_text(&record, &config.report_title, &config.currency, Utc::now())
    );

    let path = report::write_record(&record, &config.report_dir)?;
    info!(
        path = %path.display(),
        total = record.total_contributions,
        contributors = record.num_contributors,
        missing = record.num_missing,
        "report written"
    );

    if let Ok(stats) = housekeeping::folder_stats(&config.report_dir) {
        info!(files = stats.files, bytes = stats.bytes, "report folder");
    }

    Ok(())
}

/// Local file when given, otherwise the shared sheet from the CLI or
/// the configured default. The remote worksheet is named after the
/// year, matching how the group lays out its online workbook.
async fn resolve_workbook(
    args: &Args,
    config: &AppConfig,
    target: &ExtractionTarget,
) -> Result<RawWorkbook> {
    if let Some(path) = &args.file {
        let stored = housekeeping::stash_upload(path, &config.upload_dir)?;
        return load::load_workbook(stored);
    }

    let url = args
        .sheet_url
        .clone()
        .or_else(|| config.default_sheet_url.clone());
    let Some(url) = url else {
        bail!("no input: pass --file or --sheet-url, or set default_sheet_url in the config");
    };

    let cache = SheetCache::new(chrono::Duration::minutes(config.fetch.cache_ttl_minutes));
    let client = RemoteClient::new(config.fetch.max_retries, config.fetch.backoff_ms);
    client
        .fetch_worksheet(&cache, &url, &target.year.to_string())
        .await
}
