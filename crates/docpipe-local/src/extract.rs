use docpipe_core::{ElementKind, Error, PageText, PdfDocument, Result, TextNode};
use std::panic::{self, AssertUnwindSafe};

/// Elements whose text never reaches the output.
const NON_TEXT_TAGS: &str = "script, style, noscript";

/// Elements that count as text, in the order they appear in the document.
const TEXT_TAGS: &str = "p, h1, h2, h3, h4, h5, h6, a, li";

fn selector(css: &str) -> Result<html_scraper::Selector> {
    html_scraper::Selector::parse(css)
        .map_err(|e| Error::Assembly(format!("invalid selector {css:?}: {e:?}")))
}

/// Collect the text-bearing elements of an HTML document.
///
/// `script`/`style`/`noscript` subtrees are detached first, so neither their text nor any
/// element nested inside them is selected. Nested matches (a link inside a list item) each
/// yield their own node.
pub fn html_text_nodes(html: &str) -> Result<Vec<TextNode>> {
    let mut doc = html_scraper::Html::parse_document(html);

    let non_text = selector(NON_TEXT_TAGS)?;
    let ids: Vec<_> = doc.select(&non_text).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    // `Html::select` walks the node arena, which still holds detached nodes; walking from
    // the root only sees what is attached, in document order.
    let text_sel = selector(TEXT_TAGS)?;
    let nodes = doc
        .root_element()
        .select(&text_sel)
        .filter_map(|el| {
            let kind = ElementKind::from_tag(el.value().name())?;
            let text = el.text().collect::<String>().trim().to_string();
            Some(TextNode { kind, text })
        })
        .collect();
    Ok(nodes)
}

/// Concatenate node texts, each followed by a single space.
pub fn assemble_html(nodes: &[TextNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        out.push_str(&node.text);
        out.push(' ');
    }
    out
}

/// Join each page's fragments with a space and end every page with `\n`.
///
/// Pages are visited 1..=page_count; any page that fails aborts the whole document.
pub fn assemble_pdf(doc: &dyn PdfDocument) -> Result<String> {
    let mut out = String::new();
    for page_number in 1..=doc.page_count() {
        let page = doc.page_text(page_number)?;
        out.push_str(&page.fragments.join(" "));
        out.push('\n');
    }
    Ok(out)
}

/// Best-effort sniff for PDF bytes.
///
/// Readers accept the `%PDF-` header anywhere in the first KiB, so we do too.
pub fn bytes_look_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

/// Extract one text string per page with `pdf-extract`.
///
/// The library panics on some malformed inputs; those panics are reported as fetch errors
/// like any other unreadable document.
pub fn pdf_pages_from_mem(bytes: &[u8]) -> Result<Vec<String>> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(Error::Fetch(format!("pdf parse failed: {e}"))),
        Err(_) => Err(Error::Fetch("pdf parse failed: malformed document".to_string())),
    }
}

/// Split a page's raw text into fragments: trimmed, non-blank lines in output order.
pub fn page_fragments(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// A PDF whose pages have already been extracted to text.
#[derive(Debug, Clone)]
pub struct ExtractedPdf {
    pages: Vec<String>,
}

impl ExtractedPdf {
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self { pages }
    }

    pub fn from_mem(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_pages(pdf_pages_from_mem(bytes)?))
    }
}

impl PdfDocument for ExtractedPdf {
    fn page_count(&self) -> u32 {
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    fn page_text(&self, page_number: u32) -> Result<PageText> {
        let raw = (page_number as usize)
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .ok_or_else(|| {
                Error::Assembly(format!(
                    "page {page_number} out of range (document has {} pages)",
                    self.pages.len()
                ))
            })?;
        Ok(PageText {
            page_number,
            fragments: page_fragments(raw),
        })
    }
}
