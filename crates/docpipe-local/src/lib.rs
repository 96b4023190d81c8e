use docpipe_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub mod extract;
pub mod pipeline;
pub mod sources;
pub mod textprep;

pub use pipeline::{Extractor, ExtractorConfig, DEFAULT_MAX_WORDS};
pub use sources::{HttpHtmlSource, HttpPdfSource};

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("docpipe/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            // No overall client timeout: each FetchRequest carries its own (or none).
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    fn apply_headers(
        &self,
        mut rb: reqwest::RequestBuilder,
        headers: &BTreeMap<String, String>,
    ) -> reqwest::RequestBuilder {
        for (k, v) in headers {
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::from_bytes(k.as_bytes()),
                reqwest::header::HeaderValue::from_str(v),
            ) {
                rb = rb.header(name, value);
            }
        }
        rb
    }
}

fn transport_error(req: &FetchRequest, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        let ms = req.timeout_ms.map(|t| t.to_string()).unwrap_or_else(|| "?".to_string());
        Error::Fetch(format!("timed out after {ms}ms: {}", req.url))
    } else {
        Error::Fetch(e.to_string())
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let t_req = std::time::Instant::now();
        let url = url::Url::parse(&req.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        rb = self.apply_headers(rb, &req.headers);
        let resp = rb.send().await.map_err(|e| transport_error(req, e))?;
        let final_url = resp.url().to_string();
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut headers = BTreeMap::new();
        for (k, v) in resp.headers().iter() {
            if let Ok(s) = v.to_str() {
                headers.insert(k.as_str().to_string(), s.to_string());
            }
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| transport_error(req, e))?
            .to_vec();

        debug!(
            url = %req.url,
            status,
            bytes = bytes.len(),
            elapsed_ms = t_req.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(FetchResponse {
            url: req.url.clone(),
            final_url,
            status,
            content_type,
            headers,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header, http::StatusCode, routing::get, Router};
    use std::net::SocketAddr;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn request(url: String, timeout_ms: Option<u64>) -> FetchRequest {
        FetchRequest {
            url,
            timeout_ms,
            headers: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn local_fetcher_returns_body_status_and_content_type() {
        let app = Router::new().route(
            "/",
            get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "hello") }),
        );
        let base = serve(app).await;

        let fetcher = LocalFetcher::new().unwrap();
        let resp = fetcher
            .fetch(&request(format!("{base}/"), Some(2_000)))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type.as_deref(), Some("text/plain"));
        assert_eq!(resp.text_lossy(), "hello");
    }

    #[tokio::test]
    async fn local_fetcher_forwards_request_headers() {
        let app = Router::new().route(
            "/",
            get(|headers: axum::http::HeaderMap| async move {
                let accept_lang = headers
                    .get(header::ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("");
                (StatusCode::OK, format!("accept-language={accept_lang}"))
            }),
        );
        let base = serve(app).await;

        let fetcher = LocalFetcher::new().unwrap();
        let mut req = request(format!("{base}/"), Some(2_000));
        req.headers
            .insert("Accept-Language".to_string(), "en-US".to_string());
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.text_lossy(), "accept-language=en-US");
    }

    #[tokio::test]
    async fn local_fetcher_reports_non_2xx_without_failing() {
        let app = Router::new().route(
            "/",
            get(|| async { (StatusCode::NOT_FOUND, "nope") }),
        );
        let base = serve(app).await;

        let fetcher = LocalFetcher::new().unwrap();
        let resp = fetcher
            .fetch(&request(format!("{base}/"), Some(2_000)))
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn local_fetcher_enforces_request_timeout() {
        let app = Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let base = serve(app).await;

        let fetcher = LocalFetcher::new().unwrap();
        let err = fetcher
            .fetch(&request(format!("{base}/"), Some(200)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(_)), "got {err:?}");
        assert!(err.to_string().contains("timed out"), "got {err}");
    }

    #[tokio::test]
    async fn local_fetcher_rejects_unparseable_url_before_io() {
        let fetcher = LocalFetcher::new().unwrap();
        let err = fetcher
            .fetch(&request("not a url".to_string(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)), "got {err:?}");
    }
}
