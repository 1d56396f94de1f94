// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every technical error is mapped to a short plain-English summary with a
// concrete next step.

use crate::config::{ENV_DOCLING_API_KEY, ENV_DOCLING_URL};
use crate::error::ConverterError;

/// A human-readable error with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What to try next.
    pub suggestion: String,
    /// Whether running the same command again may succeed.
    pub retriable: bool,
}

impl HumanError {
    fn new(message: impl Into<String>, suggestion: impl Into<String>, retriable: bool) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable,
        }
    }
}

/// Convert a `ConverterError` into a `HumanError`.
pub fn humanize_error(err: &ConverterError) -> HumanError {
    match err {
        ConverterError::UnsupportedMethod(name) => HumanError::new(
            format!("'{name}' is not a conversion method."),
            "Use one of: layout (pymupdf), relative (pdfplumber), docling-serve (docling), pdf-extract (pymupdf4llm).",
            false,
        ),

        ConverterError::PdfError(_) => HumanError::new(
            "The PDF could not be read.",
            "The file may be damaged, encrypted, or not a PDF at all. Try opening it in a viewer first.",
            false,
        ),

        ConverterError::ImageError(_) => HumanError::new(
            "An embedded image could not be decoded.",
            "The text conversion is unaffected; run again without --images to skip image extraction.",
            false,
        ),

        ConverterError::RenderError(_) => HumanError::new(
            "The PDF could not be generated.",
            "Check that the Markdown file is valid UTF-8 text.",
            false,
        ),

        ConverterError::Download(detail) => humanize_network_error(detail),

        ConverterError::HttpStatus { status, .. } => match *status {
            401 | 403 => HumanError::new(
                "The server rejected our credentials.",
                format!("Check {ENV_DOCLING_API_KEY} or the access rights for the URL."),
                false,
            ),
            404 => HumanError::new(
                "Nothing was found at that address.",
                "Check the URL for typos.",
                false,
            ),
            408 | 429 => HumanError::new(
                "The server is busy.",
                "Wait a minute and try again.",
                true,
            ),
            s if s >= 500 => HumanError::new(
                "The server had an internal problem.",
                "Try again later.",
                true,
            ),
            s => HumanError::new(
                format!("The server answered with HTTP {s}."),
                "Check the request parameters and try again.",
                false,
            ),
        },

        ConverterError::Docling(_) => HumanError::new(
            "docling-serve could not convert the document.",
            "Check the docling-serve logs; scanned PDFs may need OCR enabled.",
            true,
        ),

        ConverterError::MissingConfig(key) => {
            let hint = if *key == ENV_DOCLING_URL {
                "Set it to the docling-serve base URL, e.g. http://localhost:5001 (a .env file works too)."
            } else {
                "Set it in the environment or in a .env file next to where you run the command."
            };
            HumanError::new(format!("{key} is not set."), hint, false)
        }

        ConverterError::Archive(_) => HumanError::new(
            "The ZIP archive could not be written.",
            "Check there is free disk space in the output directory.",
            true,
        ),

        ConverterError::Table(_) => HumanError::new(
            "The CSV file could not be processed.",
            "Make sure every row has the same number of columns as the header.",
            false,
        ),

        ConverterError::UnknownColumn(column) => HumanError::new(
            format!("The CSV file has no column named '{column}'."),
            "Check the header row and pass the exact column name with --url-column.",
            false,
        ),

        ConverterError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                "The file couldn't be found.",
                "Check the path; relative paths are resolved from the current directory.",
                false,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "Permission denied.",
                "Check the file permissions of the input and output locations.",
                false,
            ),
            _ => HumanError::new(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, the disk may be full.",
                true,
            ),
        },

        ConverterError::Serialization(_) => HumanError::new(
            "A server response could not be understood.",
            "The server may be running an incompatible version.",
            false,
        ),
    }
}

/// Parse transport-level error details into human-readable messages.
fn humanize_network_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("timed out") || lower.contains("timeout") {
        HumanError::new(
            "The server didn't respond in time.",
            "Try again; large documents may need a longer timeout.",
            true,
        )
    } else if lower.contains("connection refused") || lower.contains("connect") {
        HumanError::new(
            "We couldn't connect to the server.",
            "Check the address and that the server is running.",
            true,
        )
    } else if lower.contains("dns") || lower.contains("resolve") {
        HumanError::new(
            "The server name could not be resolved.",
            "Check the URL and your network connection.",
            true,
        )
    } else if lower.contains("builder") || lower.contains("relative url") || lower.contains("invalid url") {
        HumanError::new(
            "The address doesn't look like a URL.",
            "URLs must start with http:// or https://.",
            false,
        )
    } else {
        HumanError::new(
            "The download failed.",
            format!("Try again. (Detail: {detail})"),
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_retriable() {
        let human = humanize_error(&ConverterError::Download("operation timed out".into()));
        assert!(human.retriable);
        assert!(human.message.contains("in time"));
    }

    #[test]
    fn missing_docling_url_mentions_variable() {
        let human = humanize_error(&ConverterError::MissingConfig(ENV_DOCLING_URL));
        assert!(human.message.contains("DOCLING_HTTP_CLIENT"));
        assert!(!human.retriable);
    }

    #[test]
    fn server_errors_are_retriable_client_errors_are_not() {
        let busy = humanize_error(&ConverterError::HttpStatus { status: 503, body: String::new() });
        let missing = humanize_error(&ConverterError::HttpStatus { status: 404, body: String::new() });
        assert!(busy.retriable);
        assert!(!missing.retriable);
    }

    #[test]
    fn not_found_io_error() {
        let err = ConverterError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let human = humanize_error(&err);
        assert!(human.message.contains("couldn't be found"));
    }
}
