//! Handing the assembled document to its consumer.
use anyhow::{bail, Context, Result};
use log::info;
use std::io::Write;
use std::time::Duration;

use crate::record::DailyDocument;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/daily";

/// Consumer of the daily document. Called at most once per run.
pub trait DocumentSink {
    fn deliver(&self, doc: &DailyDocument) -> Result<()>;
}

/// POSTs the document as JSON to the storage backend.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        reqwest::Url::parse(&url).with_context(|| format!("invalid api url {url:?}"))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DocumentSink for HttpSink {
    fn deliver(&self, doc: &DailyDocument) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(doc)
            .send()
            .with_context(|| format!("POST {}", self.url))?;
        let status = resp.status();
        info!("POST {} -> {status}", self.url);
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            bail!("POST {} returned {status}: {}", self.url, body.trim());
        }
        Ok(())
    }
}

/// Prints the document instead of sending it (`--dry-run`).
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl DocumentSink for StdoutSink {
    fn deliver(&self, doc: &DailyDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(doc)?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{json}")?;
        Ok(())
    }
}
