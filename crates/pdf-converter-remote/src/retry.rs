// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry engine with exponential backoff + jitter for network requests.
//
// Classifies errors into Transient (auto-retry), UserAction (fix and rerun),
// and Permanent (give up). Only transient errors trigger automatic retries.

use std::time::Duration;

use pdf_converter_core::error::ConverterError;
use pdf_converter_core::types::ErrorClass;
use tracing::{debug, info, warn};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Default delays with a custom retry count.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

/// Result of evaluating whether to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after this delay.
    RetryAfter(Duration),
    /// Do not retry — error is permanent or user action needed.
    GiveUp(ErrorClass),
    /// Maximum retries exhausted.
    Exhausted,
}

/// Classify a `ConverterError` into an `ErrorClass` for retry decisions.
pub fn classify_error(err: &ConverterError) -> ErrorClass {
    match err {
        // Transient — connection trouble, timeouts, overloaded servers
        ConverterError::Download(detail) => classify_download_detail(detail),
        ConverterError::HttpStatus { status, .. } => classify_status(*status),
        ConverterError::Docling(detail) => classify_detail(detail),

        // User action needed
        ConverterError::MissingConfig(_) => ErrorClass::UserAction,
        ConverterError::UnknownColumn(_) => ErrorClass::UserAction,
        ConverterError::Table(_) => ErrorClass::UserAction,

        // Permanent — bad input, unsupported content
        ConverterError::UnsupportedMethod(_) => ErrorClass::Permanent,
        ConverterError::PdfError(_) => ErrorClass::Permanent,
        ConverterError::ImageError(_) => ErrorClass::Permanent,
        ConverterError::RenderError(_) => ErrorClass::Permanent,
        ConverterError::Archive(_) => ErrorClass::Permanent,
        ConverterError::Serialization(_) => ErrorClass::Permanent,

        // IO errors depend on the kind
        ConverterError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::Interrupted => ErrorClass::Transient,
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                ErrorClass::UserAction
            }
            _ => ErrorClass::Permanent,
        },
    }
}

/// Request timeout, rate limiting and server errors are worth another try.
fn classify_status(status: u16) -> ErrorClass {
    match status {
        408 | 429 | 500..=599 => ErrorClass::Transient,
        401 | 403 => ErrorClass::UserAction,
        _ => ErrorClass::Permanent,
    }
}

/// Classify a transport failure message.
fn classify_download_detail(detail: &str) -> ErrorClass {
    let lower = detail.to_ascii_lowercase();
    if lower.contains("invalid url") || lower.contains("relative url") || lower.contains("builder error") {
        return ErrorClass::Permanent;
    }
    // Default to transient (optimistic — retry first, give up later)
    ErrorClass::Transient
}

/// Classify a docling-serve failure message.
fn classify_detail(detail: &str) -> ErrorClass {
    let lower = detail.to_ascii_lowercase();
    if lower.contains("timed out") || lower.contains("timeout") || lower.contains("connection") {
        return ErrorClass::Transient;
    }
    ErrorClass::Permanent
}

/// Decide whether to retry based on the error class and attempt count.
pub fn should_retry(err: &ConverterError, attempt: u32, config: &RetryConfig) -> RetryDecision {
    let class = classify_error(err);

    match class {
        ErrorClass::Permanent => {
            info!("permanent error — not retrying");
            RetryDecision::GiveUp(ErrorClass::Permanent)
        }
        ErrorClass::UserAction => {
            info!("user action required — not auto-retrying");
            RetryDecision::GiveUp(ErrorClass::UserAction)
        }
        ErrorClass::Transient => {
            if attempt >= config.max_retries {
                warn!(attempt, max = config.max_retries, "retry limit exhausted");
                RetryDecision::Exhausted
            } else {
                let delay = compute_delay(attempt, config);
                debug!(attempt, delay_ms = delay.as_millis(), "scheduling retry");
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

/// Compute exponential backoff delay with jitter.
///
/// delay = min(base * 2^attempt + jitter, max_delay)
/// jitter is a value in [0, base) to spread out concurrent clients.
pub fn compute_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base_ms = config.base_delay.as_millis() as u64;
    let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(10));

    let jitter_ms = jitter(base_ms, attempt);
    let total_ms = exp_ms.saturating_add(jitter_ms);
    let capped_ms = total_ms.min(config.max_delay.as_millis() as u64);

    Duration::from_millis(capped_ms)
}

/// Deterministic jitter: a multiplicative hash of the attempt number folded
/// into `[0, base)`.
fn jitter(base_ms: u64, attempt: u32) -> u64 {
    let hash = (attempt as u64).wrapping_mul(6364136223846793005);
    hash % base_ms.max(1)
}
