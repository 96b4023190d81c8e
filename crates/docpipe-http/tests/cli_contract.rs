use axum::{http::header, routing::get, Router};
use std::net::SocketAddr;

fn docpipe() -> std::process::Command {
    let bin = assert_cmd::cargo::cargo_bin!("docpipe");
    let mut cmd = std::process::Command::new(bin);
    // Keep contracts hermetic: no env-file and quiet logs.
    cmd.env_remove("DOCPIPE_ENV_FILE");
    cmd.env("RUST_LOG", "error");
    cmd
}

#[test]
fn docpipe_version_contract() {
    let out = docpipe().args(["version"]).output().expect("run docpipe version");

    assert!(out.status.success(), "docpipe version failed");
    let s = String::from_utf8_lossy(&out.stdout);
    let v: serde_json::Value = serde_json::from_str(&s).expect("parse version json");

    assert_eq!(v["schema_version"].as_u64(), Some(1));
    assert_eq!(v["name"].as_str(), Some("docpipe"));
    assert!(!v["version"].as_str().unwrap_or("").is_empty());
}

#[test]
fn docpipe_version_text_output() {
    let out = docpipe()
        .args(["version", "--output", "text"])
        .output()
        .expect("run docpipe version");
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("docpipe "));
}

#[tokio::test]
async fn extract_html_prints_envelope_with_limited_text() {
    let app = Router::new().route(
        "/page.html",
        get(|| async {
            (
                [(header::CONTENT_TYPE, "text/html")],
                "<html><body><style>.x{}</style><li>one two</li><p>three four</p></body></html>",
            )
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let url = format!("http://{addr}/page.html");

    let out = tokio::task::spawn_blocking(move || {
        docpipe()
            .args(["extract-html", "--url", &url, "--max-words", "3"])
            .output()
            .expect("run docpipe extract-html")
    })
    .await
    .unwrap();

    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    let v: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("parse extract envelope");
    assert_eq!(v["kind"], "extract_html");
    assert_eq!(v["ok"], true);
    assert_eq!(v["extracted_text"], "one two three");
}

#[tokio::test]
async fn extract_pdf_prints_envelope_with_every_page() {
    let pdf: &[u8] = include_bytes!("../../docpipe-local/tests/fixtures/three_pages.pdf");
    let app = Router::new().route(
        "/doc.pdf",
        get(move || async move { ([(header::CONTENT_TYPE, "application/pdf")], pdf) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let url = format!("http://{addr}/doc.pdf");

    let out = tokio::task::spawn_blocking(move || {
        docpipe()
            .args(["extract-pdf", "--url", &url])
            .output()
            .expect("run docpipe extract-pdf")
    })
    .await
    .unwrap();

    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    let v: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("parse extract envelope");
    assert_eq!(v["kind"], "extract_pdf");
    assert_eq!(v["ok"], true);
    assert_eq!(v["extracted_text"], "Hello World Foo Third page");
}

#[test]
fn extract_pdf_with_unsupported_scheme_fails_with_envelope() {
    let out = docpipe()
        .args(["extract-pdf", "--url", "ftp://example.com/doc.pdf"])
        .output()
        .expect("run docpipe extract-pdf");

    assert!(!out.status.success());
    let v: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("parse extract envelope");
    assert_eq!(v["kind"], "extract_pdf");
    assert_eq!(v["ok"], false);
    assert_eq!(v["error"]["stage"], "validate");
}
