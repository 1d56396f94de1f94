// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docling-serve client — server-side PDF to Markdown conversion.
//
// Uploads the PDF as multipart form data to `/v1/convert/file` and reads the
// Markdown back either from the JSON body (`inbody`) or from a returned ZIP.

use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Duration;

use pdf_converter_core::config::{ConverterConfig, ENV_DOCLING_API_KEY, ENV_DOCLING_URL};
use pdf_converter_core::error::{ConverterError, Result};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::download::{transport_error, truncate_body};

/// Conversion settings sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoclingOptions {
    pub to_formats: Vec<String>,
    /// `embedded`, `placeholder` or `referenced`.
    pub image_export_mode: String,
    pub pipeline: String,
    pub do_ocr: bool,
    pub force_ocr: bool,
    /// `easyocr`, `tesseract` or `rapidocr`.
    pub ocr_engine: String,
    pub ocr_lang: Vec<String>,
    /// `pypdfium2` or one of the `dlparse_*` back-ends.
    pub pdf_backend: String,
    /// `fast` or `accurate`.
    pub table_mode: String,
    pub abort_on_error: bool,
    /// Ask for a ZIP archive instead of an inline JSON document.
    pub return_as_file: bool,
    pub include_images: bool,
    pub images_scale: f32,
    pub md_page_break_placeholder: String,
    /// Inclusive 1-indexed page range.
    pub page_range: Option<(u32, u32)>,
    /// Server-side conversion timeout, in seconds.
    pub document_timeout_secs: u64,
}

impl Default for DoclingOptions {
    fn default() -> Self {
        Self {
            to_formats: vec!["md".into()],
            image_export_mode: "embedded".into(),
            pipeline: "standard".into(),
            do_ocr: true,
            force_ocr: false,
            ocr_engine: "easyocr".into(),
            ocr_lang: ["en", "fr", "de", "it"].map(String::from).to_vec(),
            pdf_backend: "pypdfium2".into(),
            table_mode: "accurate".into(),
            abort_on_error: false,
            return_as_file: false,
            include_images: true,
            images_scale: 2.0,
            md_page_break_placeholder: String::new(),
            page_range: None,
            document_timeout_secs: 3600,
        }
    }
}

impl DoclingOptions {
    /// `inbody` for inline JSON, `zip` for an archive.
    pub fn target_type(&self) -> &'static str {
        if self.return_as_file { "zip" } else { "inbody" }
    }

    /// The text fields of the multipart form, in a stable order.
    pub fn form_fields(&self) -> Result<Vec<(&'static str, String)>> {
        let mut fields = vec![
            ("to_formats", serde_json::to_string(&self.to_formats)?),
            ("target_type", self.target_type().to_string()),
            ("document_timeout", self.document_timeout_secs.to_string()),
            ("include_images", self.include_images.to_string()),
            ("image_export_mode", self.image_export_mode.clone()),
            ("images_scale", self.images_scale.to_string()),
            ("md_page_break_placeholder", self.md_page_break_placeholder.clone()),
            ("pipeline", self.pipeline.clone()),
            ("do_ocr", self.do_ocr.to_string()),
            ("force_ocr", self.force_ocr.to_string()),
            ("ocr_engine", self.ocr_engine.clone()),
            ("ocr_lang", serde_json::to_string(&self.ocr_lang)?),
            ("pdf_backend", self.pdf_backend.clone()),
            ("table_mode", self.table_mode.clone()),
            ("abort_on_error", self.abort_on_error.to_string()),
        ];
        if let Some((from, to)) = self.page_range {
            fields.push(("page_range", serde_json::to_string(&[from, to])?));
        }
        Ok(fields)
    }
}

/// Inline conversion response.
#[derive(Debug, Deserialize)]
struct ConvertResponse {
    status: Option<String>,
    document: Option<Value>,
    #[serde(default)]
    errors: Value,
}

/// Client for a docling-serve instance.
#[derive(Debug, Clone)]
pub struct DoclingClient {
    client: Client,
    base_url: String,
    api_key: String,
    options: DoclingOptions,
}

impl DoclingClient {
    // -- Construction ---------------------------------------------------------

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| transport_error("cannot build HTTP client", err))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            options: DoclingOptions::default(),
        })
    }

    /// Build a client from `DOCLING_HTTP_CLIENT` / `DOCLING_API_KEY` settings.
    pub fn from_config(config: &ConverterConfig) -> Result<Self> {
        let base_url = config
            .docling_url
            .as_deref()
            .ok_or(ConverterError::MissingConfig(ENV_DOCLING_URL))?;
        let api_key = config
            .docling_api_key
            .as_deref()
            .ok_or(ConverterError::MissingConfig(ENV_DOCLING_API_KEY))?;

        let mut client = Self::new(base_url, api_key, Duration::from_secs(config.request_timeout_secs))?;
        client.options.document_timeout_secs = config.document_timeout_secs;
        Ok(client)
    }

    pub fn with_options(mut self, options: DoclingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DoclingOptions {
        &self.options
    }

    /// Full URL of the file conversion endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/v1/convert/file", self.base_url.trim_end_matches('/'))
    }

    // -- Conversion -----------------------------------------------------------

    /// Upload a PDF and return the Markdown docling-serve produced for it.
    #[instrument(skip_all, fields(path = %path.display(), target = self.options.target_type()))]
    pub async fn convert_file(&self, path: &Path) -> Result<String> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        info!(bytes = data.len(), "uploading PDF to docling-serve");

        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|err| transport_error("invalid upload part", err))?;
        let mut form = Form::new().part("files", part);
        for (name, value) in self.options.form_fields()? {
            form = form.text(name, value);
        }

        let endpoint = self.endpoint();
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|err| transport_error(&format!("POST {endpoint}"), err))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %body, "docling-serve rejected the document");
            return Err(ConverterError::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| transport_error("reading docling-serve response", err))?;
        debug!(bytes = body.len(), "docling-serve response received");

        if self.options.return_as_file {
            markdown_from_zip(&body)
        } else {
            markdown_from_json(&body)
        }
    }
}

/// Pull `document.md_content` out of an inline response.
fn markdown_from_json(body: &[u8]) -> Result<String> {
    let response: ConvertResponse = serde_json::from_slice(body)?;

    match (response.status.as_deref(), response.document) {
        (Some("success"), Some(Value::Object(document))) => Ok(document
            .get("md_content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()),
        (Some("success"), Some(other)) => Err(ConverterError::Docling(format!(
            "unexpected document payload: {other}"
        ))),
        (status, _) => Err(ConverterError::Docling(format!(
            "status {}; errors: {}",
            status.unwrap_or("missing"),
            response.errors
        ))),
    }
}

/// The first Markdown file inside a ZIP response.
fn markdown_from_zip(body: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(body))
        .map_err(|err| ConverterError::Archive(format!("invalid ZIP from docling-serve: {err}")))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| ConverterError::Archive(format!("unreadable ZIP entry: {err}")))?;
        if entry.is_file() && entry.name().ends_with(".md") {
            let mut markdown = String::new();
            entry.read_to_string(&mut markdown)?;
            return Ok(markdown);
        }
    }
    Err(ConverterError::Docling("ZIP response contains no Markdown file".into()))
}
