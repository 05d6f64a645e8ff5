//! Web fetching: URL → visible page text.
//!
//! Requests carry ordinary browser headers because many sites turn away
//! clients that look like scripts. The response is classified before its
//! body is parsed:
//!
//! | Outcome | Error |
//! |---------|-------|
//! | `403` | [`ReportError::AccessDenied`] |
//! | any other non-`200` | [`ReportError::FetchStatus`] |
//! | `200`, no visible text | [`ReportError::EmptyPage`] |
//!
//! Visible text is what a reader would see: markup, scripts, styles and the
//! document head are dropped, and text is grouped into one line per block
//! element.

use crate::error::ReportError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{StatusCode, Url};
use scraper::{ElementRef, Html, Node};
use std::time::Duration;
use tracing::{debug, info, warn};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Elements whose content is never shown to a reader.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// Elements that start a new line of visible text.
const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "div", "dl", "dt",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Fetches web pages and reduces them to visible text.
#[derive(Debug, Clone)]
pub struct WebFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl WebFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ReportError::Internal(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Fetch `url` and return its visible text.
    pub async fn fetch_text(&self, url: &str) -> Result<String, ReportError> {
        let parsed = parse_url(url)?;
        info!("Fetching {}", parsed);

        let response = self
            .client
            .get(parsed.clone())
            .headers(browser_headers(url))
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            warn!("{} answered 403", url);
            return Err(ReportError::AccessDenied {
                url: url.to_string(),
            });
        }
        if status != StatusCode::OK {
            warn!("{} answered {}", url, status);
            return Err(ReportError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        debug!("Fetched {} bytes of HTML", html.len());

        let text = visible_text(&html);
        if text.trim().is_empty() {
            return Err(ReportError::EmptyPage {
                url: url.to_string(),
            });
        }
        Ok(text)
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> ReportError {
        if e.is_timeout() {
            ReportError::FetchTimeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            ReportError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Parse `url`, accepting only absolute http(s) URLs.
pub fn parse_url(url: &str) -> Result<Url, ReportError> {
    let invalid = |reason: String| ReportError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

fn browser_headers(referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, value);
    }
    headers
}

/// The text a reader would see in `html`, one line per block of content.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();
    let mut current = String::new();
    collect(document.root_element(), &mut lines, &mut current);
    flush_line(&mut lines, &mut current);
    lines.join("\n")
}

fn collect(element: ElementRef<'_>, lines: &mut Vec<String>, current: &mut String) {
    let name = element.value().name();
    if HIDDEN.contains(&name) {
        return;
    }
    let block = BLOCKS.contains(&name);
    if block {
        flush_line(lines, current);
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                for word in text.split_whitespace() {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(word);
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect(child, lines, current);
                }
            }
            _ => {}
        }
    }
    if block {
        flush_line(lines, current);
    }
}

fn flush_line(lines: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        lines.push(std::mem::take(current));
    }
}
