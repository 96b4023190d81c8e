use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

mod store;

pub use store::{LastResult, LastResultStore};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("assembly failed: {0}")]
    Assembly(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Pipeline stage the error belongs to (used as a log field).
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Validation(_) | Error::InvalidUrl(_) => "validate",
            Error::Fetch(_) => "fetch",
            Error::Assembly(_) => "assemble",
            Error::NotFound(_) => "retrieve",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Html,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Pdf => "pdf",
            SourceKind::Html => "html",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller asks a pipeline to extract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Missing and empty are both rejected by the pipelines; `Option` lets the
    /// boundary accept `{}` and report it as a validation failure.
    #[serde(default)]
    pub url: Option<String>,
}

impl ExtractionRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }

    /// The trimmed source url, or a validation error when absent/blank.
    pub fn source_url(&self) -> Result<&str> {
        match self.url.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => Ok(u),
            _ => Err(Error::Validation("source url is required".to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the whole request (connect + body).
    pub timeout_ms: Option<u64>,
    /// Headers to add to the outbound request.
    pub headers: BTreeMap<String, String>,
}

impl FetchRequest {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub bytes: Vec<u8>,
}

impl FetchResponse {
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into a fetch error.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Fetch(format!(
                "upstream returned HTTP {} for {}",
                self.status, self.final_url
            )))
        }
    }
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// Text of one PDF page, as fragments in the parser's reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based.
    pub page_number: u32,
    pub fragments: Vec<String>,
}

/// A loaded PDF. Pages are addressed 1..=page_count.
pub trait PdfDocument: Send + Sync {
    fn page_count(&self) -> u32;
    fn page_text(&self, page_number: u32) -> Result<PageText>;
}

#[async_trait::async_trait]
pub trait PdfSource: Send + Sync {
    async fn load(&self, url: &str) -> Result<Box<dyn PdfDocument>>;
}

#[async_trait::async_trait]
pub trait HtmlSource: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Paragraph,
    /// Level 1..=6.
    Heading(u8),
    Anchor,
    ListItem,
}

impl ElementKind {
    /// Maps a lower-case tag name to the element kinds that carry text.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(ElementKind::Paragraph),
            "a" => Some(ElementKind::Anchor),
            "li" => Some(ElementKind::ListItem),
            "h1" => Some(ElementKind::Heading(1)),
            "h2" => Some(ElementKind::Heading(2)),
            "h3" => Some(ElementKind::Heading(3)),
            "h4" => Some(ElementKind::Heading(4)),
            "h5" => Some(ElementKind::Heading(5)),
            "h6" => Some(ElementKind::Heading(6)),
            _ => None,
        }
    }
}

/// One text-bearing element of a scraped page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    pub kind: ElementKind,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_url_rejects_missing_and_blank() {
        assert!(matches!(
            ExtractionRequest::default().source_url(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            ExtractionRequest::new("   ").source_url(),
            Err(Error::Validation(_))
        ));
        assert_eq!(
            ExtractionRequest::new(" https://example.com/a.pdf ")
                .source_url()
                .unwrap(),
            "https://example.com/a.pdf"
        );
    }

    #[test]
    fn extraction_request_accepts_empty_json_object() {
        let req: ExtractionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.url.is_none());
    }

    #[test]
    fn error_for_status_rejects_non_2xx() {
        let resp = FetchResponse {
            url: "https://example.com/".to_string(),
            final_url: "https://example.com/".to_string(),
            status: 404,
            content_type: None,
            headers: BTreeMap::new(),
            bytes: Vec::new(),
        };
        let err = resp.error_for_status().unwrap_err();
        assert_eq!(err.stage(), "fetch");
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn element_kind_covers_the_allow_list_only() {
        for tag in ["p", "h1", "h2", "h3", "h4", "h5", "h6", "a", "li"] {
            assert!(ElementKind::from_tag(tag).is_some(), "{tag}");
        }
        for tag in ["div", "span", "script", "ul", "h7"] {
            assert!(ElementKind::from_tag(tag).is_none(), "{tag}");
        }
        assert_eq!(ElementKind::from_tag("h3"), Some(ElementKind::Heading(3)));
    }
}
