//! CLI binary for edgequake-docsum.
//!
//! `docsum serve` runs the HTTP service; `docsum file` and `docsum url` run
//! one pipeline locally and print the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_docsum::{server, ReportOutput, ReportService, ServiceConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service on port 5000
  docsum serve --addr 0.0.0.0:5000

  # Summarise a local PDF or scanned image
  docsum file report.pdf
  docsum file receipt.jpg --output-dir ./reports

  # Summarise a web page, JSON payload on stdout
  docsum --json url https://example.com/article

  # Always write document_summary.pdf / url_summary.pdf
  docsum --fixed-names file notes.pdf

HTTP API:
  POST /api/upload          multipart/form-data, field "file" (pdf, png, jpg, jpeg)
  POST /api/url-to-report   {"url": "https://..."}
  GET  /health

  Success: {"summary": "...", "report_path": "/abs/path/report.pdf"}
  Failure: {"error": "..."}

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Provider used together with EDGEQUAKE_MODEL
  EDGEQUAKE_MODEL         Model ID
  PDFIUM_LIB_PATH         libpdfium file or directory (default: system library)
  DOCSUM_FONT_DIR         Report font directory (default: /usr/share/fonts/truetype/dejavu)
  DOCSUM_FONT_FAMILY      Report font file stem (default: DejaVuSans)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Summarise documents and web pages into PDF reports.
#[derive(Parser, Debug)]
#[command(
    name = "docsum",
    version,
    about = "Summarise documents and web pages into PDF reports using LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    service: ServiceArgs,

    /// Print the `{summary, report_path}` payload as JSON.
    #[arg(long, global = true, env = "DOCSUM_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, global = true, env = "DOCSUM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCSUM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCSUM_QUIET")]
    quiet: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "DOCSUM_LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "DOCSUM_ADDR", default_value = "127.0.0.1:5000")]
        addr: SocketAddr,
    },
    /// Summarise a local pdf, png, jpg or jpeg file.
    File {
        path: PathBuf,
    },
    /// Summarise a web page.
    Url {
        url: String,
    },
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "DOCSUM_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// Max summary tokens for uploaded documents.
    #[arg(long, global = true, env = "DOCSUM_DOCUMENT_MAX_TOKENS", default_value_t = 500)]
    document_max_tokens: usize,

    /// Max summary tokens for web pages.
    #[arg(long, global = true, env = "DOCSUM_WEB_MAX_TOKENS", default_value_t = 800)]
    web_max_tokens: usize,

    /// Directory reports are written to.
    #[arg(long, global = true, env = "DOCSUM_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Give every report a unique file name.
    #[arg(long, global = true, env = "DOCSUM_UNIQUE_NAMES", default_value_t = true,
          action = clap::ArgAction::Set)]
    unique_names: bool,

    /// Always write document_summary.pdf / url_summary.pdf (overwriting).
    #[arg(long, global = true)]
    fixed_names: bool,

    /// Web page fetch timeout in seconds.
    #[arg(long, global = true, env = "DOCSUM_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// LLM call timeout in seconds.
    #[arg(long, global = true, env = "DOCSUM_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// libpdfium file or the directory containing it.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Largest accepted upload, in bytes.
    #[arg(long, global = true, env = "DOCSUM_MAX_UPLOAD_BYTES", default_value_t = 25 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Directory holding the report's TrueType font family.
    #[arg(long, global = true, env = "DOCSUM_FONT_DIR", default_value = edgequake_docsum::config::DEFAULT_FONT_DIR)]
    font_dir: PathBuf,

    /// File-name stem of the report font family (e.g. DejaVuSans).
    #[arg(long, global = true, env = "DOCSUM_FONT_FAMILY", default_value = edgequake_docsum::config::DEFAULT_FONT_FAMILY)]
    font_family: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback a one-shot run needs, so library
    // INFO logs are only shown when it is off or when serving.
    let serving = matches!(cli.command, Command::Serve { .. });
    let show_progress = !serving && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info,tower_http=debug"
    };
    init_tracing(filter, cli.log_json);

    let config = build_config(&cli.service)?;
    let service = ReportService::new(config).context("Failed to initialise report service")?;

    match &cli.command {
        Command::Serve { addr } => {
            server::serve(Arc::new(service), *addr)
                .await
                .context("HTTP server failed")?;
        }
        Command::File { path } => {
            let spinner = spinner(show_progress, &format!("Summarising {}", path.display()));
            let start = Instant::now();
            let result = service.summarize_document(path).await;
            finish(spinner, &result, start);
            let output = result.context("Document summary failed")?;
            print_output(&output, cli.json, cli.quiet)?;
        }
        Command::Url { url } => {
            let spinner = spinner(show_progress, &format!("Summarising {url}"));
            let start = Instant::now();
            let result = service.summarize_url(url).await;
            finish(spinner, &result, start);
            let output = result.context("Web page summary failed")?;
            print_output(&output, cli.json, cli.quiet)?;
        }
    }

    Ok(())
}

fn init_tracing(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
}

/// Map CLI args to `ServiceConfig`.
fn build_config(args: &ServiceArgs) -> Result<ServiceConfig> {
    let mut builder = ServiceConfig::builder()
        .temperature(args.temperature)
        .document_max_tokens(args.document_max_tokens)
        .web_max_tokens(args.web_max_tokens)
        .output_dir(&args.output_dir)
        .unique_report_names(args.unique_names && !args.fixed_names)
        .fetch_timeout_secs(args.fetch_timeout)
        .api_timeout_secs(args.api_timeout)
        .max_upload_bytes(args.max_upload_bytes)
        .font_dir(&args.font_dir)
        .font_family(&args.font_family);

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = args.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path);
    }

    builder.build().context("Invalid configuration")
}

fn spinner(enabled: bool, message: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

fn finish<T, E: std::fmt::Display>(bar: Option<ProgressBar>, result: &Result<T, E>, start: Instant) {
    let Some(bar) = bar else { return };
    bar.finish_and_clear();
    let secs = format!("{:.1}s", start.elapsed().as_secs_f64());
    match result {
        Ok(_) => eprintln!("{} Report ready  {}", green("✔"), dim(&secs)),
        Err(e) => eprintln!("{} {}  {}", red("✘"), e, dim(&secs)),
    }
}

fn print_output(output: &ReportOutput, json: bool, quiet: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    write_summary(&mut io::stdout().lock(), &output.summary)?;
    if !quiet {
        eprintln!("   →  {}", bold(&output.report_path.display().to_string()));
    }
    Ok(())
}

/// Write `summary` to `out`, newline-terminated.
fn write_summary(out: &mut impl Write, summary: &str) -> Result<()> {
    out.write_all(summary.as_bytes())
        .context("Failed to write to stdout")?;
    if !summary.ends_with('\n') {
        out.write_all(b"\n").context("Failed to write to stdout")?;
    }
    Ok(())
}
