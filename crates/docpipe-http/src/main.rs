use anyhow::Result;
use clap::{Parser, Subcommand};
use docpipe::config::{self, PipelineArgs};
use docpipe::core::{ExtractionRequest, SourceKind};
use docpipe::http;
use docpipe::local::Extractor;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "docpipe")]
#[command(about = "Extract plain text from remote PDFs and HTML pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service.
    Serve(ServeCmd),
    /// Extract text from a PDF URL once and print a JSON envelope.
    ExtractPdf(ExtractCmd),
    /// Scrape text from an HTML page once and print a JSON envelope.
    ExtractHtml(ExtractCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    /// Interface to bind.
    #[arg(long, env = "DOCPIPE_HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3002)]
    port: u16,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(clap::Args, Debug)]
struct ExtractCmd {
    /// Source URL.
    #[arg(long)]
    url: String,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

async fn serve(args: ServeCmd) -> Result<()> {
    let extractor = Arc::new(Extractor::local(&args.pipeline.extractor_config())?);
    let max_words = extractor.max_words();
    let app = http::router(extractor);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, max_words, "docpipe listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("docpipe stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
}

async fn extract_once(source: SourceKind, args: ExtractCmd) -> Result<()> {
    let extractor = Extractor::local(&args.pipeline.extractor_config())?;
    let req = ExtractionRequest::new(args.url.clone());
    let outcome = match source {
        SourceKind::Pdf => extractor.extract_pdf(&req).await,
        SourceKind::Html => extractor.extract_html(&req).await,
    };
    let kind = format!("extract_{source}");
    match outcome {
        Ok(text) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": kind,
                "ok": true,
                "url": args.url,
                "extracted_text": text,
            });
            println!("{v}");
            Ok(())
        }
        Err(e) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": kind,
                "ok": false,
                "url": args.url,
                "error": { "stage": e.stage(), "message": e.to_string() },
            });
            println!("{v}");
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = config::load_env_file();
    config::init_tracing();
    if let Some(report) = &env_file {
        report.log();
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await?,
        Commands::ExtractPdf(args) => extract_once(SourceKind::Pdf, args).await?,
        Commands::ExtractHtml(args) => extract_once(SourceKind::Html, args).await?,
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "docpipe",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("docpipe {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }

    Ok(())
}
