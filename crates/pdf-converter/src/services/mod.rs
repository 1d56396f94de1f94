// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — orchestrates the backend crates for the command line.
//
// Each service wraps one or more backend crate APIs in a way that is convenient
// for the CLI to call (async where the network is involved, files on disk as
// results).

pub mod batch;
pub mod converter;
pub mod fetch;
pub mod text_converter;

/// Create a uniquely named, persistent file in `dir` with the given extension.
pub(crate) fn unique_output_file(dir: &std::path::Path, extension: &str) -> pdf_converter_core::Result<std::path::PathBuf> {
    std::fs::create_dir_all(dir)?;
    let file = tempfile::Builder::new()
        .prefix("pdf-converter-")
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;
    let (_, path) = file.keep().map_err(|err| pdf_converter_core::ConverterError::Io(err.error))?;
    Ok(path)
}
