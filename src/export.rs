//! Rendering report tables as text, CSV, TSV or JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::prelude::*;
use clap::ValueEnum;
use csv::WriterBuilder;
use log::info;
use serde::Serialize;

use crate::aggregate::{BucketShare, CategoryCount, Indicators, InterviewSentiment, TypeCoverage};
use crate::error::ReportError;
use crate::record::ExamplePhrase;
use crate::summary::LongRow;

/// Output format for a report table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// Aligned plain text on stdout.
    #[default]
    Txt,
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

/// A row type that can be laid out as table cells.
///
/// Absent values render as empty cells.
pub trait Row: Serialize {
    const HEADERS: &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_default()
}

impl Row for CategoryCount {
    const HEADERS: &'static [&'static str] = &["category", "phrase_count", "patient_count"];
    fn cells(&self) -> Vec<String> {
        vec![
            self.category.label().to_string(),
            self.phrase_count.to_string(),
            self.patient_count.to_string(),
        ]
    }
}

impl Row for LongRow {
    const HEADERS: &'static [&'static str] = &["category", "metric", "value"];
    fn cells(&self) -> Vec<String> {
        vec![
            self.category.label().to_string(),
            self.metric.name().to_string(),
            self.value.to_string(),
        ]
    }
}

impl Row for InterviewSentiment {
    const HEADERS: &'static [&'static str] = &[
        "interview_id",
        "mean_sentiment",
        "standard_error",
        "ci_half_width",
        "bucket",
        "phrase_count",
    ];
    fn cells(&self) -> Vec<String> {
        vec![
            self.interview_id.to_string(),
            format!("{:.4}", self.mean_sentiment),
            opt(self.standard_error),
            opt(self.ci_half_width),
            self.bucket.label().to_string(),
            self.phrase_count.to_string(),
        ]
    }
}

impl Row for BucketShare {
    const HEADERS: &'static [&'static str] = &["bucket", "count", "percentage"];
    fn cells(&self) -> Vec<String> {
        vec![
            self.bucket.label().to_string(),
            self.count.to_string(),
            format!("{:.1}", self.percentage),
        ]
    }
}

impl Row for TypeCoverage {
    const HEADERS: &'static [&'static str] = &["group", "interviews", "percentage", "phrases"];
    fn cells(&self) -> Vec<String> {
        vec![
            self.group.to_string(),
            self.interviews.to_string(),
            format!("{:.1}", self.percentage),
            self.phrases.to_string(),
        ]
    }
}

impl Row for Indicators {
    const HEADERS: &'static [&'static str] =
        &["interviews", "relevant_phrases", "questions", "reflections"];
    fn cells(&self) -> Vec<String> {
        vec![
            self.interviews.to_string(),
            self.relevant_phrases.to_string(),
            self.questions.to_string(),
            self.reflections.to_string(),
        ]
    }
}

/// One drill-down line: a phrase and the interview it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseRow {
    pub interview_id: u32,
    pub text: String,
}

impl Row for PhraseRow {
    const HEADERS: &'static [&'static str] = &["interview_id", "phrase"];
    fn cells(&self) -> Vec<String> {
        vec![self.interview_id.to_string(), self.text.clone()]
    }
}

impl Row for ExamplePhrase {
    const HEADERS: &'static [&'static str] = &["kind", "phrase"];
    fn cells(&self) -> Vec<String> {
        vec![self.kind.clone(), self.text.clone()]
    }
}

/// A rendered report table, detached from its row type.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    pub json: serde_json::Value,
}

impl Table {
    pub fn of<R: Row>(name: &'static str, rows: &[R]) -> Result<Self, ReportError> {
        Ok(Table {
            name,
            headers: R::HEADERS.to_vec(),
            rows: rows.iter().map(Row::cells).collect(),
            json: serde_json::to_value(rows)?,
        })
    }

    /// Plain text with columns padded to their widest cell.
    pub fn to_text(&self) -> String {
        let shown: Vec<Vec<&str>> = self
            .rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|c| if c.is_empty() { "n/a" } else { c.as_str() })
                    .collect()
            })
            .collect();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &shown {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let line = |cells: &[&str]| -> String {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:<w$}"))
                .collect();
            padded.join("  ").trim_end().to_string()
        };

        let mut out = format!("== {} ==\n", self.name);
        out.push_str(&line(&self.headers));
        out.push('\n');
        if shown.is_empty() {
            out.push_str("(no rows)\n");
        }
        for row in &shown {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}

/// Neutralizes spreadsheet formula injection by prefixing a single quote
/// to cells that start with `=`, `+`, `-` or `@`.
///
/// Numbers such as `-0.4000` are left alone.
pub fn csv_safe_cell(cell: String) -> String {
    let risky = matches!(cell.chars().next(), Some('=' | '+' | '-' | '@'));
    if risky && cell.parse::<f64>().is_err() {
        format!("'{cell}")
    } else {
        cell
    }
}

fn write_delimited<W: Write>(table: &Table, delimiter: u8, out: W) -> Result<(), ReportError> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(out);
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().cloned().map(csv_safe_cell))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Serializes `table` in `format` to any writer.
pub fn write_table<W: Write>(
    table: &Table,
    format: ExportFormat,
    mut out: W,
) -> Result<(), ReportError> {
    match format {
        ExportFormat::Txt => {
            out.write_all(table.to_text().as_bytes())?;
        }
        ExportFormat::Csv => write_delimited(table, b',', out)?,
        ExportFormat::Tsv => write_delimited(table, b'\t', out)?,
        ExportFormat::Json => serde_json::to_writer_pretty(out, &table.json)?,
    }
    Ok(())
}

/// Writes `table` to `<dir>/<name>_<YYYYMMDD_HHMMSS>.<ext>` and returns the path.
pub fn save_table(table: &Table, format: ExportFormat, dir: &Path) -> Result<PathBuf, ReportError> {
    let local: DateTime<Local> = Local::now();
    let filename = format!(
        "{}_{}.{}",
        table.name,
        local.format("%Y%m%d_%H%M%S"),
        format.extension()
    );
    let path = dir.join(filename);
    let file = File::create(&path).map_err(|source| ReportError::Export {
        path: path.clone(),
        source,
    })?;
    write_export(table, format, &path, BufWriter::new(file))?;
    info!("wrote {}", path.display());
    Ok(path)
}

/// Writes and flushes one export; any failure names `path`.
fn write_export<W: Write>(
    table: &Table,
    format: ExportFormat,
    path: &Path,
    mut out: W,
) -> Result<(), ReportError> {
    write_table(table, format, &mut out)
        .and_then(|()| out.flush().map_err(ReportError::Io))
        .map_err(|e| ReportError::Export {
            path: path.to_path_buf(),
            source: e.into_io(),
        })
}
