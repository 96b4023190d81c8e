//! HTTP-backed document sources: raw markup for HTML pages, parsed documents for PDFs.

use crate::extract::{bytes_look_like_pdf, ExtractedPdf};
use docpipe_core::{
    Error, FetchBackend, FetchRequest, FetchResponse, HtmlSource, PdfDocument, PdfSource, Result,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const HTML_TIMEOUT_MS: u64 = 10_000;

/// Headers sent with every HTML page request; some sites refuse non-browser clients.
pub fn browser_headers() -> BTreeMap<String, String> {
    [
        (
            "User-Agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36",
        ),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
        ),
        ("Accept-Encoding", "gzip, deflate, br"),
        ("Connection", "keep-alive"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Decode a page body using the `charset` of its content type, UTF-8 when absent or unknown.
///
/// A byte-order mark wins over the declared charset; malformed sequences become U+FFFD.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_label)
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

fn timeout_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Clone)]
pub struct HttpHtmlSource {
    backend: Arc<dyn FetchBackend>,
    timeout: Duration,
}

impl HttpHtmlSource {
    pub fn new(backend: Arc<dyn FetchBackend>) -> Self {
        Self {
            backend,
            timeout: Duration::from_millis(HTML_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl HtmlSource for HttpHtmlSource {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let req = FetchRequest {
            url: url.to_string(),
            timeout_ms: Some(timeout_ms(self.timeout)),
            headers: browser_headers(),
        };
        let resp = self.backend.fetch(&req).await?.error_for_status()?;
        Ok(decode_body(&resp.bytes, resp.content_type.as_deref()))
    }
}

#[derive(Clone)]
pub struct HttpPdfSource {
    backend: Arc<dyn FetchBackend>,
    timeout: Option<Duration>,
}

impl HttpPdfSource {
    pub fn new(backend: Arc<dyn FetchBackend>) -> Self {
        Self {
            backend,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_pdf_bytes(&self, url: &str) -> Result<FetchResponse> {
        let req = FetchRequest {
            url: url.to_string(),
            timeout_ms: self.timeout.map(timeout_ms),
            headers: BTreeMap::new(),
        };
        let resp = self.backend.fetch(&req).await?.error_for_status()?;
        if !bytes_look_like_pdf(&resp.bytes) {
            return Err(Error::Fetch(format!(
                "not a PDF (content-type {}): {}",
                resp.content_type.as_deref().unwrap_or("unknown"),
                resp.final_url
            )));
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl PdfSource for HttpPdfSource {
    async fn load(&self, url: &str) -> Result<Box<dyn PdfDocument>> {
        let resp = self.fetch_pdf_bytes(url).await?;
        let bytes = resp.bytes;
        let t0 = std::time::Instant::now();
        let doc = tokio::task::spawn_blocking(move || ExtractedPdf::from_mem(&bytes))
            .await
            .map_err(|e| Error::Fetch(format!("pdf parse join failed: {e}")))??;
        debug!(
            url,
            pages = doc.page_count(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "pdf parsed"
        );
        Ok(Box::new(doc))
    }
}
