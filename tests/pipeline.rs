//! Pipeline integration tests for edgequake-docsum.
//!
//! The summarization model is replaced by a scripted [`LanguageModel`] and
//! the web by a local axum server, so these run offline.

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use edgequake_docsum::{
    CompletionRequest, LanguageModel, ReportError, ReportFonts, ReportService, ServiceConfig,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip a test that renders a report when the report fonts are not installed.
macro_rules! skip_unless_fonts {
    () => {
        let fonts = ReportFonts::default();
        if fonts.load().is_err() {
            eprintln!("SKIP: report fonts not found in {}", fonts.dir().display());
            return;
        }
    };
}

const ARTICLE: &str = r#"<!doctype html>
<html><head><title>Rust 2024</title><script>track()</script></head>
<body>
  <nav><a href="/">Home</a></nav>
  <h1>Rust 2024 edition</h1>
  <p>The edition ships <em>async closures</em> and new prelude items.</p>
  <ul><li>Stable on 1.85</li><li>Opt-in per crate</li></ul>
</body></html>"#;

/// Answers every request with the same reply and records what it was asked.
struct ScriptedModel {
    reply: String,
    calls: AtomicUsize,
    prompts: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ReportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request);
        Ok(self.reply.clone())
    }
}

struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ReportError> {
        Err(ReportError::Upstream {
            message: "rate limited".into(),
        })
    }
}

fn service(dir: &Path, unique: bool, model: Arc<dyn LanguageModel>) -> ReportService {
    let config = ServiceConfig::builder()
        .output_dir(dir)
        .unique_report_names(unique)
        .fetch_timeout_secs(5)
        .build()
        .unwrap();
    ReportService::with_model(config, model).unwrap()
}

async fn spawn_site() -> String {
    async fn browser_only(headers: HeaderMap) -> Result<Html<&'static str>, StatusCode> {
        let agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if agent.starts_with("Mozilla/5.0") && headers.contains_key(header::REFERER) {
            Ok(Html(ARTICLE))
        } else {
            Err(StatusCode::FORBIDDEN)
        }
    }

    let app = Router::new()
        .route("/article", get(|| async { Html(ARTICLE) }))
        .route("/browser-only", get(browser_only))
        .route("/forbidden", get(|| async { StatusCode::FORBIDDEN }))
        .route("/gone", get(|| async { StatusCode::GONE }))
        .route(
            "/blank",
            get(|| async { Html("<html><body><script>render()</script>  </body></html>") }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn png_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        16,
        16,
        image::Rgb([250, 250, 250]),
    ))
    .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
    .unwrap();
    buf
}

fn page_count(path: &Path) -> usize {
    lopdf::Document::load(path).unwrap().get_pages().len()
}

// ── URL pipeline ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn url_report_is_structured_and_trimmed() {
    skip_unless_fonts!();
    let site = spawn_site().await;
    let dir = tempfile::tempdir().unwrap();
    let model = ScriptedModel::new("\n  **Overview**\n* async closures\n* prelude\nDone.  \n");
    let svc = service(dir.path(), true, model.clone());

    let out = svc.summarize_url(&format!("{site}/article")).await.unwrap();

    assert_eq!(out.summary, "**Overview**\n* async closures\n* prelude\nDone.");
    let name = out.report_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("url_summary-") && name.ends_with(".pdf"), "{name}");
    assert!(out.report_path.is_absolute());
    assert_eq!(page_count(&out.report_path), 1);

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].max_tokens, 800);
    assert!(prompts[0].user_prompt.contains("Rust 2024 edition"));
    assert!(prompts[0].user_prompt.contains("Opt-in per crate"));
    assert!(!prompts[0].user_prompt.contains("track()"));
}

#[tokio::test]
async fn url_fetch_sends_browser_headers() {
    skip_unless_fonts!();
    let site = spawn_site().await;
    let dir = tempfile::tempdir().unwrap();
    let model = ScriptedModel::new("ok");
    let svc = service(dir.path(), true, model.clone());

    svc.summarize_url(&format!("{site}/browser-only")).await.unwrap();
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn forbidden_page_never_reaches_model() {
    let site = spawn_site().await;
    let dir = tempfile::tempdir().unwrap();
    let model = ScriptedModel::new("unused");
    let svc = service(dir.path(), true, model.clone());

    let err = svc
        .summarize_url(&format!("{site}/forbidden"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::AccessDenied { .. }));
    assert_eq!(
        err.to_string(),
        "Access denied. The server returned a 403 Forbidden error."
    );
    assert_eq!(model.calls(), 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn other_status_reported_with_code() {
    let site = spawn_site().await;
    let dir = tempfile::tempdir().unwrap();
    let model = ScriptedModel::new("unused");
    let svc = service(dir.path(), true, model.clone());

    let err = svc.summarize_url(&format!("{site}/gone")).await.unwrap_err();
    assert!(matches!(err, ReportError::FetchStatus { status: 410, .. }));
    assert_eq!(err.to_string(), "Failed to fetch the URL. Status code: 410");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn blank_page_is_empty_page_error() {
    let site = spawn_site().await;
    let dir = tempfile::tempdir().unwrap();
    let model = ScriptedModel::new("unused");
    let svc = service(dir.path(), true, model.clone());

    let err = svc.summarize_url(&format!("{site}/blank")).await.unwrap_err();
    assert_eq!(err.to_string(), "No text content found on the page.");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn invalid_url_rejected_without_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let model = ScriptedModel::new("unused");
    let svc = service(dir.path(), true, model.clone());

    let err = svc.summarize_url("file:///etc/passwd").await.unwrap_err();
    assert!(matches!(err, ReportError::InvalidUrl { .. }));
    assert_eq!(model.calls(), 0);
}

// ── Document pipeline ────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_document_never_extracts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    std::fs::write(&input, "plain text").unwrap();
    let model = ScriptedModel::new("unused");
    let svc = service(dir.path(), false, model.clone());

    let err = svc.summarize_document(&input).await.unwrap_err();
    assert!(matches!(err, ReportError::UnsupportedFormat { .. }));
    assert_eq!(model.calls(), 0);
    assert!(!dir.path().join("document_summary.pdf").exists());
}

#[tokio::test]
async fn image_document_uses_flat_profile() {
    skip_unless_fonts!();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scan.jpg");
    image::DynamicImage::ImageRgb8(image::RgbImage::new(20, 10))
        .save(&input)
        .unwrap();
    let model = ScriptedModel::new("Intro **key** line\n* first\n* second");
    let svc = service(dir.path(), false, model.clone());

    let out = svc.summarize_document(&input).await.unwrap();

    assert_eq!(out.summary, "Intro **key** line\n* first\n* second");
    assert_eq!(out.report_path, dir.path().join("document_summary.pdf"));
    assert_eq!(page_count(&out.report_path), 1);

    let prompts = model.prompts.lock().unwrap();
    // OCR call, then the summary call
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].image.is_some());
    assert!(prompts[1].image.is_none());
    assert_eq!(prompts[1].max_tokens, 500);
    assert_eq!(prompts[1].temperature, 0.5);
    assert!(prompts[1].user_prompt.starts_with("Summarize this: "));
}

#[tokio::test]
async fn empty_summary_renders_title_only_report() {
    skip_unless_fonts!();
    let dir = tempfile::tempdir().unwrap();
    let svc = service(dir.path(), false, ScriptedModel::new(""));

    let out = svc.summarize_upload("blank.png", &png_bytes()).await.unwrap();
    assert_eq!(out.summary, "");
    assert_eq!(page_count(&out.report_path), 1);
}

#[tokio::test]
async fn long_summary_spans_pages() {
    skip_unless_fonts!();
    let dir = tempfile::tempdir().unwrap();
    let reply: String = (1..=150)
        .map(|i| format!("* finding number {i} with **bold** detail\n"))
        .collect();
    let svc = service(dir.path(), false, ScriptedModel::new(reply));

    let out = svc.summarize_upload("long.png", &png_bytes()).await.unwrap();
    assert!(page_count(&out.report_path) > 1);
}

#[tokio::test]
async fn fixed_names_overwrite_previous_report() {
    skip_unless_fonts!();
    let dir = tempfile::tempdir().unwrap();
    let first = service(dir.path(), false, ScriptedModel::new("short"))
        .summarize_upload("a.png", &png_bytes())
        .await
        .unwrap();
    let reply: String = (0..150).map(|i| format!("* item {i}\n")).collect();
    let second = service(dir.path(), false, ScriptedModel::new(reply))
        .summarize_upload("b.png", &png_bytes())
        .await
        .unwrap();

    assert_eq!(first.report_path, second.report_path);
    assert!(page_count(&second.report_path) > 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn unique_names_keep_both_reports() {
    skip_unless_fonts!();
    let dir = tempfile::tempdir().unwrap();
    let svc = service(dir.path(), true, ScriptedModel::new("x"));
    let a = svc.summarize_upload("a.png", &png_bytes()).await.unwrap();
    let b = svc.summarize_upload("b.png", &png_bytes()).await.unwrap();

    assert_ne!(a.report_path, b.report_path);
    assert!(a.report_path.exists() && b.report_path.exists());
}

#[tokio::test]
async fn upstream_failure_leaves_no_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    std::fs::write(&input, png_bytes()).unwrap();
    let svc = service(dir.path(), false, Arc::new(FailingModel));

    let err = svc.summarize_document(&input).await.unwrap_err();
    assert!(matches!(err, ReportError::Upstream { .. }));
    assert!(!dir.path().join("document_summary.pdf").exists());
}

#[tokio::test]
async fn missing_output_dir_is_created() {
    skip_unless_fonts!();
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("reports/2024");
    let svc = service(&nested, false, ScriptedModel::new("x"));

    let out = svc.summarize_upload("a.png", &png_bytes()).await.unwrap();
    assert_eq!(out.report_path, nested.join("document_summary.pdf"));
    assert!(out.report_path.exists());
}
