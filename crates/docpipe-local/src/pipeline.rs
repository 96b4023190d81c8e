//! Fetch → assemble → normalize → (limit) → store, one orchestrator per source kind.

use crate::extract::{assemble_html, assemble_pdf, html_text_nodes};
use crate::sources::{HttpHtmlSource, HttpPdfSource, HTML_TIMEOUT_MS};
use crate::textprep::{limit_words, normalize, word_count};
use crate::LocalFetcher;
use docpipe_core::{
    Error, ExtractionRequest, HtmlSource, LastResult, LastResultStore, PdfDocument, PdfSource,
    Result, SourceKind,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_WORDS: usize = 3000;

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Word cap for the HTML pipeline. PDFs are never capped.
    pub max_words: usize,
    pub html_timeout: Duration,
    /// `None` leaves PDF downloads unbounded.
    pub pdf_timeout: Option<Duration>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            html_timeout: Duration::from_millis(HTML_TIMEOUT_MS),
            pdf_timeout: None,
        }
    }
}

pub struct Extractor {
    pdf: Arc<dyn PdfSource>,
    html: Arc<dyn HtmlSource>,
    store: Arc<LastResultStore>,
    max_words: usize,
}

impl Extractor {
    pub fn new(
        pdf: Arc<dyn PdfSource>,
        html: Arc<dyn HtmlSource>,
        store: Arc<LastResultStore>,
        max_words: usize,
    ) -> Self {
        Self {
            pdf,
            html,
            store,
            max_words,
        }
    }

    /// Extractor over the network with a fresh, empty store.
    pub fn local(cfg: &ExtractorConfig) -> Result<Self> {
        let fetcher = Arc::new(LocalFetcher::new()?);
        let pdf = HttpPdfSource::new(fetcher.clone()).with_timeout(cfg.pdf_timeout);
        let html = HttpHtmlSource::new(fetcher).with_timeout(cfg.html_timeout);
        Ok(Self::new(
            Arc::new(pdf),
            Arc::new(html),
            Arc::new(LastResultStore::new()),
            cfg.max_words,
        ))
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// PDF pipeline: text of every page, normalized, not word-limited.
    pub async fn extract_pdf(&self, req: &ExtractionRequest) -> Result<String> {
        let t0 = Instant::now();
        let outcome = match validate(req) {
            Ok(url) => self.run_pdf(&url).await.map(|text| (url, text)),
            Err(e) => Err(e),
        };
        self.finish(SourceKind::Pdf, req, outcome, t0)
    }

    /// HTML pipeline: allow-listed element text, normalized, limited to `max_words`.
    pub async fn extract_html(&self, req: &ExtractionRequest) -> Result<String> {
        let t0 = Instant::now();
        let outcome = match validate(req) {
            Ok(url) => self.run_html(&url).await.map(|text| (url, text)),
            Err(e) => Err(e),
        };
        self.finish(SourceKind::Html, req, outcome, t0)
    }

    pub fn last_result(&self) -> Result<Arc<LastResult>> {
        self.store.get()
    }

    async fn run_pdf(&self, url: &str) -> Result<String> {
        let doc = self.pdf.load(url).await?;
        debug!(url, pages = doc.page_count(), "pdf loaded");
        let raw = assemble_pdf(doc.as_ref())?;
        Ok(normalize(&raw))
    }

    async fn run_html(&self, url: &str) -> Result<String> {
        let html = self.html.fetch_html(url).await?;
        debug!(url, bytes = html.len(), "html fetched");
        let nodes = html_text_nodes(&html)?;
        let raw = assemble_html(&nodes);
        Ok(limit_words(&normalize(&raw), self.max_words))
    }

    /// Store and log a successful run; log a failed one and leave the store alone.
    fn finish(
        &self,
        source: SourceKind,
        req: &ExtractionRequest,
        outcome: Result<(String, String)>,
        t0: Instant,
    ) -> Result<String> {
        let elapsed_ms = t0.elapsed().as_millis() as u64;
        match outcome {
            Ok((url, text)) => {
                info!(
                    %source,
                    url = %url,
                    words = word_count(&text),
                    elapsed_ms,
                    "extraction finished"
                );
                self.store.set(LastResult {
                    text: text.clone(),
                    source,
                    url,
                });
                Ok(text)
            }
            Err(e) => {
                warn!(
                    %source,
                    url = req.url.as_deref().unwrap_or(""),
                    stage = e.stage(),
                    error = %e,
                    elapsed_ms,
                    "extraction failed"
                );
                Err(e)
            }
        }
    }
}

/// Non-empty, absolute http(s) url.
fn validate(req: &ExtractionRequest) -> Result<String> {
    let raw = req.source_url()?;
    let url = url::Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        other => Err(Error::InvalidUrl(format!("unsupported scheme {other:?}: {raw}"))),
    }
}
