use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use log::{info, LevelFilter};
use std::path::PathBuf;
use std::time::Duration;

use twse_daily::archive::ArchiveWriter;
use twse_daily::calendar::BusinessDate;
use twse_daily::delivery::{DocumentSink, HttpSink, StdoutSink, DEFAULT_API_URL};
use twse_daily::extract_daily;
use twse_daily::source::{ReportSource, DEFAULT_CSV_URL};

#[derive(Debug, Parser)]
#[command(version, about = "Extract TWSE market open/close order book snapshots and deliver them")]
struct Args {
    /// Business date as YYYYMMDD; defaults to today in Asia/Taipei
    #[arg(long, env = "TWSE_DATE")]
    date: Option<BusinessDate>,

    /// Report URL prefix; the date is appended
    #[arg(long, env = "TWSE_CSV_URL", default_value = DEFAULT_CSV_URL)]
    csv_url: String,

    /// Read the report from a local file instead of the URL
    #[arg(long, short = 'i', env = "TWSE_INPUT")]
    input: Option<PathBuf>,

    /// Storage backend endpoint receiving the JSON document
    #[arg(long, env = "TWSE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "TWSE_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Print the document to stdout instead of posting it
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Also append the document to this local archive file
    #[arg(long, env = "TWSE_ARCHIVE")]
    archive: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
    let args = Args::parse();

    let date = args.date.unwrap_or_else(BusinessDate::today);
    let timeout = Duration::from_secs(args.timeout_secs);
    let source = match &args.input {
        Some(path) => ReportSource::File(path.clone()),
        None => ReportSource::Url(args.csv_url.clone()),
    };
    info!("business date {date}, source {}", source.describe());

    let raw = source.fetch(date, timeout)?;
    let report = String::from_utf8_lossy(&raw);
    let doc = extract_daily(&report, date)
        .with_context(|| format!("extract snapshots for {date}"))?;

    if args.dry_run {
        StdoutSink.deliver(&doc)?;
    } else {
        HttpSink::new(&args.api_url, timeout)?.deliver(&doc)?;
    }

    if let Some(path) = &args.archive {
        let mut archive = ArchiveWriter::open_append(path, &source.describe())?;
        archive.append(&doc)?;
        info!("archived to {}", path.display());
    }
    Ok(())
}
