// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Converter configuration, overlaid from environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable naming the docling-serve base URL.
pub const ENV_DOCLING_URL: &str = "DOCLING_HTTP_CLIENT";
/// Environment variable holding the docling-serve bearer token.
pub const ENV_DOCLING_API_KEY: &str = "DOCLING_API_KEY";
pub const ENV_IMAGE_FOLDER: &str = "PDF_CONVERTER_IMAGE_FOLDER";
pub const ENV_OUTPUT_DIR: &str = "PDF_CONVERTER_OUTPUT_DIR";

/// Settings shared by every conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Root folder for extracted images; each document gets a sub-folder.
    pub image_folder: PathBuf,
    /// Where converted `.md`/`.txt` files are written.
    pub output_dir: PathBuf,
    /// docling-serve base URL (e.g. `http://localhost:5001`).
    pub docling_url: Option<String>,
    /// Bearer token for docling-serve.
    pub docling_api_key: Option<String>,
    /// Timeout for a single HTTP request, in seconds.
    pub request_timeout_secs: u64,
    /// Server-side document timeout passed to docling-serve, in seconds.
    pub document_timeout_secs: u64,
    /// Retries for transient download failures.
    pub download_retries: u32,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            image_folder: PathBuf::from("./images"),
            output_dir: std::env::temp_dir(),
            docling_url: None,
            docling_api_key: None,
            request_timeout_secs: 120,
            document_timeout_secs: 3600,
            download_retries: 3,
        }
    }
}

impl ConverterConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each known key.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(folder) = get(ENV_IMAGE_FOLDER) {
            config.image_folder = PathBuf::from(folder);
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }
        config.docling_url = get(ENV_DOCLING_URL);
        config.docling_api_key = get(ENV_DOCLING_API_KEY);
        config
    }
}
