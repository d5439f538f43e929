//! Where the raw report comes from.
use anyhow::{bail, Context, Result};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use crate::calendar::BusinessDate;

pub const DEFAULT_CSV_URL: &str =
    "http://www.twse.com.tw/en/exchangeReport/MI_5MINS?response=csv&date=";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSource {
    /// URL prefix; the `YYYYMMDD` business date is appended.
    Url(String),
    /// A report saved to disk.
    File(PathBuf),
}

impl ReportSource {
    /// Human-readable origin, recorded in archive headers.
    pub fn describe(&self) -> String {
        match self {
            ReportSource::Url(prefix) => prefix.clone(),
            ReportSource::File(path) => path.display().to_string(),
        }
    }

    /// Request URL for `date`, `None` for file sources.
    pub fn url_for(&self, date: BusinessDate) -> Option<String> {
        match self {
            ReportSource::Url(prefix) => Some(format!("{prefix}{}", date.compact())),
            ReportSource::File(_) => None,
        }
    }

    /// Read the whole report body.
    pub fn fetch(&self, date: BusinessDate, timeout: Duration) -> Result<Vec<u8>> {
        match self {
            ReportSource::Url(_) => {
                let url = self.url_for(date).context("url source without a url")?;
                info!("fetching report {url}");
                let client = reqwest::blocking::Client::builder()
                    .timeout(timeout)
                    .build()
                    .context("build http client")?;
                let resp = client
                    .get(&url)
                    .send()
                    .with_context(|| format!("GET {url}"))?;
                let status = resp.status();
                if !status.is_success() {
                    bail!("GET {url} returned {status}");
                }
                let body = resp.bytes().with_context(|| format!("read body of {url}"))?;
                Ok(body.to_vec())
            }
            ReportSource::File(path) => {
                info!("reading report {}", path.display());
                std::fs::read(path).with_context(|| format!("read {path:?}"))
            }
        }
    }
}
