// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch enrichment of CSV tables: convert every PDF URL in one column and
// store the Markdown in another.

use std::io::{Read, Write};
use std::path::Path;

use pdf_converter_core::config::ConverterConfig;
use pdf_converter_core::error::{ConverterError, Result};
use pdf_converter_core::types::ConversionMethod;
use tracing::{debug, info, instrument, warn};

use super::fetch::{DEFAULT_PDF_PATH, convert_pdf_to_md};

fn csv_err(context: &str, err: csv::Error) -> ConverterError {
    ConverterError::Table(format!("{context}: {err}"))
}

/// An in-memory CSV table: one header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    // -- Construction ---------------------------------------------------------

    /// Build a table, padding short rows with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        Self::from_reader(file).map_err(|err| match err {
            ConverterError::Table(detail) => ConverterError::Table(format!("{}: {}", path.display(), detail)),
            other => other,
        })
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|err| csv_err("cannot read header row", err))?
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, _>>()
            .map_err(|err| csv_err("cannot read row", err))?;
        Ok(Self::new(headers, rows))
    }

    // -- Output ---------------------------------------------------------------

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.to_writer(file)
    }

    pub fn to_writer(&self, writer: impl Write) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer
            .write_record(&self.headers)
            .map_err(|err| csv_err("cannot write header row", err))?;
        for row in &self.rows {
            writer.write_record(row).map_err(|err| csv_err("cannot write row", err))?;
        }
        writer.flush()?;
        Ok(())
    }

    // -- Access ---------------------------------------------------------------

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Index of `name`, appending an empty column if it does not exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: String) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value;
        }
    }
}

/// Default Markdown column name: `<url_column>_md_<method>`, using the
/// method name exactly as given (`pymupdf` stays `pymupdf`).
pub fn default_column_name(url_column: &str, method: &str) -> String {
    format!("{url_column}_md_{method}")
}

/// Return a copy of `table` with a column holding the Markdown of every URL
/// in `url_column`.
///
/// `method` is any name or alias accepted by [`ConversionMethod::parse_lenient`].
///
/// Rows whose download or conversion fails get an empty cell; the failure is
/// logged and the batch continues. With a `checkpoint` path, the whole table
/// is written there after every row.
#[instrument(skip_all, fields(rows = table.len(), %url_column, %method))]
pub async fn add_markdown_column(
    table: &Table,
    url_column: &str,
    method: &str,
    md_column: Option<&str>,
    checkpoint: Option<&Path>,
    config: &ConverterConfig,
) -> Result<Table> {
    let url_index = table
        .column_index(url_column)
        .ok_or_else(|| ConverterError::UnknownColumn(url_column.to_string()))?;
    let md_column = md_column
        .map(str::to_string)
        .unwrap_or_else(|| default_column_name(url_column, method));
    let method = ConversionMethod::parse_lenient(method);

    let mut table = table.clone();
    let md_index = table.ensure_column(&md_column);
    let pdf_path = config.output_dir.join(DEFAULT_PDF_PATH);
    let mut failures = 0usize;

    for row in 0..table.len() {
        let url = table.cell(row, url_index).unwrap_or_default().trim().to_string();
        let markdown = if url.is_empty() {
            warn!(row, "empty URL, skipping");
            String::new()
        } else {
            match convert_pdf_to_md(&url, method, &pdf_path, config).await {
                Ok(markdown) => markdown,
                Err(err) => {
                    warn!(row, %url, %err, "conversion failed, storing empty cell");
                    failures += 1;
                    String::new()
                }
            }
        };
        table.set_cell(row, md_index, markdown);

        if let Some(path) = checkpoint {
            table.write(path)?;
            debug!(row, checkpoint = %path.display(), "checkpoint written");
        }
    }

    info!(rows = table.len(), failures, column = %md_column, "markdown column added");
    Ok(table)
}
