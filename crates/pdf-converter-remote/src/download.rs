// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF download over HTTP(S) with retry on transient failures.

use std::path::Path;
use std::time::Duration;

use pdf_converter_core::config::ConverterConfig;
use pdf_converter_core::error::{ConverterError, Result};
use reqwest::{Client, Url};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::retry::{RetryConfig, RetryDecision, should_retry};

/// Longest error body kept in an `HttpStatus` error.
const MAX_ERROR_BODY: usize = 512;

/// Map a reqwest transport error into a `Download` error with context.
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> ConverterError {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_builder() {
        "builder error"
    } else {
        "request failed"
    };
    ConverterError::Download(format!("{context}: {kind}: {err}"))
}

/// Cut an error body down to something printable.
pub(crate) fn truncate_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

/// Downloads remote PDFs to local files.
#[derive(Debug, Clone)]
pub struct PdfDownloader {
    client: Client,
    retry: RetryConfig,
}

impl PdfDownloader {
    // -- Construction ---------------------------------------------------------

    /// Create a downloader with a per-request timeout and retry policy.
    pub fn new(timeout: Duration, retry: RetryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| transport_error("cannot build HTTP client", err))?;
        Ok(Self { client, retry })
    }

    /// Timeout and retry count taken from the converter configuration.
    pub fn from_config(config: &ConverterConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.request_timeout_secs),
            RetryConfig::with_retries(config.download_retries),
        )
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    // -- Download -------------------------------------------------------------

    /// Fetch `url` into `dest`, creating parent directories as needed.
    ///
    /// Transient failures (connection problems, 408/429/5xx) are retried with
    /// exponential backoff. Returns the number of bytes written.
    #[instrument(skip(self, dest), fields(dest = %dest.display()))]
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let url = Url::parse(url)
            .map_err(|err| ConverterError::Download(format!("invalid url '{url}': {err}")))?;

        let mut attempt = 0u32;
        loop {
            match self.fetch_once(&url, dest).await {
                Ok(written) => {
                    info!(bytes = written, attempt, "PDF downloaded");
                    return Ok(written);
                }
                Err(err) => match should_retry(&err, attempt, &self.retry) {
                    RetryDecision::RetryAfter(delay) => {
                        warn!(%err, attempt, delay_ms = delay.as_millis(), "download failed, retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::GiveUp(_) | RetryDecision::Exhausted => return Err(err),
                },
            }
        }
    }

    async fn fetch_once(&self, url: &Url, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| transport_error(&format!("GET {url}"), err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConverterError::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| transport_error(&format!("reading body of {url}"), err))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(bytes = written, "response body written");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn downloader(max_retries: u32) -> PdfDownloader {
        PdfDownloader::from_config(&ConverterConfig::default())
            .unwrap()
            .with_retry(fast_retry(max_retries))
    }

    #[tokio::test]
    async fn downloads_into_nested_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.5 body".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a").join("b").join("doc.pdf");
        let written = downloader(0)
            .download(&format!("{}/doc.pdf", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.5 body");
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = downloader(3)
            .download(&format!("{}/gone.pdf", server.uri()), &dir.path().join("x.pdf"))
            .await
            .unwrap_err();

        match err {
            ConverterError::HttpStatus { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = downloader(2)
            .download(&format!("{}/busy.pdf", server.uri()), &dir.path().join("x.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let written = downloader(3)
            .download(&format!("{}/flaky.pdf", server.uri()), &dir.path().join("x.pdf"))
            .await
            .unwrap();
        assert_eq!(written, 2);
    }

    #[tokio::test]
    async fn malformed_url_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let err = downloader(3).download("not a url", &dir.path().join("x.pdf")).await.unwrap_err();
        assert!(matches!(err, ConverterError::Download(ref detail) if detail.contains("invalid url")));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let cut = truncate_body(body);
        assert!(cut.len() < 600);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate_body("short".into()), "short");
    }
}
