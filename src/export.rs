//! Report export - writes the mirrored stars to a flat file
//!
//! Supported formats are an Excel workbook, a JSON array, an HTML table and a
//! Markdown table. Long repository names and descriptions can be truncated.

use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::StarRecord;
use crate::store::{SortColumn, StarStore};

/// Column headers, in table order
pub const HEADERS: [&str; 8] = [
    "starred_by",
    "repo_id",
    "stars",
    "pushed_at",
    "repo_name",
    "repo_url",
    "description",
    "language",
];

/// Position of `repo_url` in [`HEADERS`]
const URL_COLUMN: usize = 5;

/// HTML report; autoescaped by its `.html` name
const STARS_TEMPLATE: &str = include_str!("templates/stars.html");

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Excel,
    Json,
    Html,
    Markdown,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub order_by: SortColumn,
    pub descending: bool,
    /// 0 keeps names whole
    pub name_limit: usize,
    /// 0 keeps descriptions whole
    pub description_limit: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            order_by: SortColumn::Stars,
            descending: true,
            name_limit: 0,
            description_limit: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode JSON report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render HTML report: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to write workbook {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },
}

/// Write every committed star to `path`, returning the number of rows
pub fn export(
    store: &StarStore,
    path: &Path,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<usize, ExportError> {
    let records: Vec<StarRecord> = store
        .query(options.order_by, options.descending)?
        .into_iter()
        .map(|record| truncate_record(record, options))
        .collect();

    debug!(
        "Exporting {} stars ordered by {} as {:?}",
        records.len(),
        options.order_by.as_str(),
        format
    );

    match format {
        ExportFormat::Excel => write_excel(path, &records)?,
        ExportFormat::Json => {
            let file = File::create(path).map_err(|source| io_error(path, source))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &records)?;
            writer.flush().map_err(|source| io_error(path, source))?;
        }
        ExportFormat::Html => write_text(path, &render_html(&records)?)?,
        ExportFormat::Markdown => write_text(path, &render_markdown(&records))?,
    }

    info!("Exported {} stars to {}", records.len(), path.display());
    Ok(records.len())
}

/// Cut `value` to `limit` characters followed by " ..."; 0 disables
pub fn truncate(value: &str, limit: usize) -> String {
    if limit == 0 || value.chars().count() <= limit {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(limit).collect();
    cut.push_str(" ...");
    cut
}

fn truncate_record(mut record: StarRecord, options: &ExportOptions) -> StarRecord {
    record.repo_name = record
        .repo_name
        .map(|name| truncate(&name, options.name_limit));
    record.description = record
        .description
        .map(|descr| truncate(&descr, options.description_limit));
    record
}

fn cells(record: &StarRecord) -> [String; 8] {
    [
        record.starred_by.clone(),
        record.repo_id.to_string(),
        record.stars.to_string(),
        record.pushed_at_string(),
        record.repo_name.clone().unwrap_or_default(),
        record.repo_url.clone().unwrap_or_default(),
        record.description.clone().unwrap_or_default(),
        record.language.clone().unwrap_or_default(),
    ]
}

fn write_excel(path: &Path, records: &[StarRecord]) -> Result<(), ExportError> {
    let spreadsheet_error = |message: String| ExportError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };

    let mut book = umya_spreadsheet::new_file();
    let ws = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| spreadsheet_error("new workbook has no Sheet1".to_string()))?;

    for (col, header) in HEADERS.iter().enumerate() {
        ws.get_cell_mut((col as u32 + 1, 1u32)).set_value(*header);
    }

    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 2;
        for (col, value) in cells(record).into_iter().enumerate() {
            let cell = ws.get_cell_mut((col as u32 + 1, row));
            match col {
                1 => cell.set_value_number(record.repo_id as f64),
                2 => cell.set_value_number(record.stars as f64),
                _ => cell.set_value(value),
            };
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| spreadsheet_error(e.to_string()))
}

fn render_html(records: &[StarRecord]) -> Result<String, ExportError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("stars.html", STARS_TEMPLATE)?;

    let rows: Vec<[String; 8]> = records.iter().map(cells).collect();
    let html = env.get_template("stars.html")?.render(context! {
        headers => HEADERS,
        rows => rows,
        url_column => URL_COLUMN,
    })?;
    Ok(html)
}

fn render_markdown(records: &[StarRecord]) -> String {
    let mut md = format!("| {} |\n", HEADERS.join(" | "));
    let _ = writeln!(
        md,
        "|{}",
        HEADERS.iter().map(|_| ":---|").collect::<String>()
    );

    for record in records {
        let row: Vec<String> = cells(record).iter().map(|v| escape_markdown(v)).collect();
        let _ = writeln!(md, "| {} |", row.join(" | "));
    }
    md
}

fn escape_markdown(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace('\n', " ")
}

fn write_text(path: &Path, content: &str) -> Result<(), ExportError> {
    std::fs::write(path, content).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}
