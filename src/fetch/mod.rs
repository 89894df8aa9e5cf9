// src/fetch/mod.rs
pub mod cache;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::workbook::{load, RawWorkbook};
use cache::{SheetCache, SheetKey};

static SHEET_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)")
        .expect("spreadsheet key pattern should be valid")
});

/// Document key from a shared-spreadsheet URL.
pub fn sheet_key_from_url(url: &str) -> Result<String> {
    SHEET_KEY_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| anyhow!("no spreadsheet key in URL {}", url))
}

/// Per-worksheet CSV export endpoint for a document key.
fn export_url(key: &str, worksheet: &str) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "https://docs.google.com/spreadsheets/d/{}/gviz/tq",
        key
    ))
    .with_context(|| format!("building export URL for key {}", key))?;
    url.query_pairs_mut()
        .append_pair("tqx", "out:csv")
        .append_pair("sheet", worksheet);
    Ok(url)
}

/// HTTP access to shared spreadsheets, with bounded retries.
pub struct RemoteClient {
    client: Client,
    max_retries: u32,
    backoff_ms: u64,
}

impl RemoteClient {
    pub fn new(max_retries: u32, backoff_ms: u64) -> Self {
        Self {
            client: Client::new(),
            max_retries,
            backoff_ms,
        }
    }

    async fn get_text(&self, url: &Url) -> Result<String> {
        debug!("Fetching text from {}", url);
        Ok(self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .text()
            .await
            .with_context(|| format!("Reading text from {}", url))?)
    }

    async fn get_text_with_retry(&self, url: &Url) -> Result<String> {
        let mut attempts = 0;
        loop {
            match self.get_text(url).await {
                Ok(t) => return Ok(t),
                Err(e) if attempts < self.max_retries => {
                    attempts += 1;
                    let backoff = self.backoff_ms * 2u64.pow(attempts - 1);
                    warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                    sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    error!(%url, error = %e, "Exhausted retries");
                    return Err(e);
                }
            }
        }
    }

    /// Fetch one worksheet as a single-sheet workbook, consulting the
    /// cache first. The sheet is named after the requested worksheet,
    /// so the result is indistinguishable from a local workbook to
    /// everything downstream.
    #[instrument(level = "info", skip(self, cache, url))]
    pub async fn fetch_worksheet(
        &self,
        cache: &SheetCache,
        url: &str,
        worksheet: &str,
    ) -> Result<RawWorkbook> {
        let source = sheet_key_from_url(url)?;
        let key = SheetKey {
            source: source.clone(),
            sheet: worksheet.to_string(),
        };

        if let Some(sheet) = cache.get(&key) {
            debug!(source = %key.source, "cache hit");
            return Ok(RawWorkbook::new(vec![sheet]));
        }

        let export = export_url(&source, worksheet)?;
        let body = self.get_text_with_retry(&export).await?;
        let sheet = load::sheet_from_csv(worksheet, body.as_bytes())
            .with_context(|| format!("parsing CSV body from {}", export))?;

        cache.insert(key, sheet.clone());
        Ok(RawWorkbook::new(vec![sheet]))
    }
}
