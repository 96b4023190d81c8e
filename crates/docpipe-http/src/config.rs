//! Process configuration: env-file loading, logging setup and pipeline knobs.

use docpipe_local::{ExtractorConfig, DEFAULT_MAX_WORDS};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Pipeline settings shared by `serve` and the one-shot extract commands.
#[derive(clap::Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Word cap applied to scraped HTML text (PDF text is never capped).
    #[arg(long, env = "DOCPIPE_MAX_WORDS", default_value_t = DEFAULT_MAX_WORDS)]
    pub max_words: usize,
    /// Timeout for HTML page fetches.
    #[arg(long, env = "DOCPIPE_HTML_TIMEOUT_MS", default_value_t = 10_000)]
    pub html_timeout_ms: u64,
    /// Timeout for PDF downloads (default: none).
    #[arg(long, env = "DOCPIPE_PDF_TIMEOUT_MS")]
    pub pdf_timeout_ms: Option<u64>,
}

impl PipelineArgs {
    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            max_words: self.max_words,
            html_timeout: Duration::from_millis(self.html_timeout_ms),
            pdf_timeout: self.pdf_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// What an env file contributed to the process environment.
#[derive(Debug, Default)]
pub struct EnvFileReport {
    pub path: PathBuf,
    /// Keys set from the file.
    pub applied: Vec<String>,
    /// Keys in the file that the process environment already defined.
    pub shadowed: Vec<String>,
}

impl EnvFileReport {
    /// Logged by key name only; values may be secrets.
    pub fn log(&self) {
        debug!(
            path = %self.path.display(),
            applied = ?self.applied,
            shadowed = ?self.shadowed,
            "env file loaded"
        );
    }
}

/// Load `KEY=VALUE` lines from the file named by `DOCPIPE_ENV_FILE`, if set.
///
/// Runs before argument parsing (and before logging, so the file may set `RUST_LOG`);
/// callers log the returned report once tracing is up.
pub fn load_env_file() -> Option<EnvFileReport> {
    let p = std::env::var("DOCPIPE_ENV_FILE").ok()?;
    let p = p.trim();
    if p.is_empty() {
        return None;
    }
    load_env_file_from(Path::new(p))
}

/// Apply an env file. Variables already present in the process environment are never
/// overridden; an unreadable file yields `None`.
pub fn load_env_file_from(path: &Path) -> Option<EnvFileReport> {
    let txt = std::fs::read_to_string(path).ok()?;
    let mut report = EnvFileReport {
        path: path.to_path_buf(),
        ..Default::default()
    };
    for (k, v) in parse_env_file(&txt) {
        if std::env::var_os(&k).is_some() {
            report.shadowed.push(k);
        } else {
            std::env::set_var(&k, v);
            report.applied.push(k);
        }
    }
    Some(report)
}

/// Parse dotenv-style text: `#` comments, optional `export ` prefix, and values
/// optionally wrapped in matching single or double quotes.
pub fn parse_env_file(txt: &str) -> Vec<(String, String)> {
    txt.lines()
        .filter_map(|raw| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (k, v) = line.split_once('=')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), unquote(v.trim()).to_string()))
        })
        .collect()
}

fn unquote(v: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = v.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner;
        }
    }
    v
}

/// Install the global `tracing` subscriber: `RUST_LOG` filter (default `info`), stderr output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
