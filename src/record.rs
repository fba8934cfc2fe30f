//! Typed phrase records and the CSV loaders for both tabular sources.

use std::path::{Path, PathBuf};

use csv::{ErrorKind, ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::category::{Category, Taxonomy, category_for};
use crate::error::ReportError;

/// What kind of utterance a phrase is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PhraseType {
    Question,
    Reflection,
    Irrelevant,
}

impl PhraseType {
    /// Reads the type column. Unknown strings are irrelevant interactions.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.eq_ignore_ascii_case("Duda/pregunta") || s.eq_ignore_ascii_case("question") {
            PhraseType::Question
        } else if s.eq_ignore_ascii_case("Comentario/reflexión")
            || s.eq_ignore_ascii_case("reflection")
        {
            PhraseType::Reflection
        } else {
            PhraseType::Irrelevant
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PhraseType::Question => "Question",
            PhraseType::Reflection => "Reflection",
            PhraseType::Irrelevant => "Irrelevant",
        }
    }
}

/// One segmented utterance. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseRecord {
    pub interview_id: u32,
    pub text: String,
    pub kind: PhraseType,
    pub topic_code_1: Option<i64>,
    pub topic_code_2: Option<i64>,
    pub sentiment_score: Option<f64>,
}

impl PhraseRecord {
    /// Derived category in `taxonomy`.
    ///
    /// `None` when the code is absent or out of range, or when the record's
    /// type does not belong to that taxonomy.
    pub fn category(&self, taxonomy: Taxonomy) -> Option<Category> {
        let code = match (taxonomy, self.kind) {
            (Taxonomy::Questions, PhraseType::Question) => self.topic_code_1?,
            (Taxonomy::Reflections, PhraseType::Reflection) => self.topic_code_2?,
            _ => return None,
        };
        category_for(taxonomy, code)
    }

    /// Sentiment score, defined only on reflection phrases.
    pub fn sentiment(&self) -> Option<f64> {
        match self.kind {
            PhraseType::Reflection => self.sentiment_score.filter(|s| s.is_finite()),
            _ => None,
        }
    }
}

/// One row of the illustrative example-phrase table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePhrase {
    #[serde(rename = "tipo", alias = "Tipo")]
    pub kind: String,
    #[serde(rename = "frase")]
    pub text: String,
}

/// A source row that could not become a record at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub source: PathBuf,
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct RawPhraseRow {
    num_entrevista: Option<String>,
    #[serde(default)]
    frase: Option<String>,
    #[serde(rename = "Tipo", alias = "tipo", default)]
    tipo: Option<String>,
    #[serde(default)]
    categorias1: Option<String>,
    #[serde(default)]
    categorias2: Option<String>,
    #[serde(default)]
    sent_robertuito: Option<String>,
}

/// Parses a topic code written as `3`, `3.0` or blank.
fn parse_code(raw: Option<&str>) -> Result<Option<i64>, String> {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(v) = s.parse::<i64>() {
        return Ok(Some(v));
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(Some(v as i64)),
        Ok(v) if v.is_nan() => Ok(None),
        _ => Err(format!("unreadable topic code {s:?}")),
    }
}

fn parse_score(raw: Option<&str>) -> Result<Option<f64>, String> {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Ok(None),
        Err(_) => Err(format!("unreadable sentiment score {s:?}")),
    }
}

fn parse_interview_id(raw: Option<&str>) -> Result<u32, String> {
    let s = raw.map(str::trim).unwrap_or_default();
    if let Ok(v) = s.parse::<u32>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&v) => Ok(v as u32),
        _ => Err(format!("interview id {s:?} is not a non-negative integer")),
    }
}

impl RawPhraseRow {
    /// Turns a raw row into a record. Code and score problems only warn;
    /// an unusable interview id rejects the row.
    fn into_record(self, source: &Path, line: u64) -> Result<PhraseRecord, String> {
        let interview_id = parse_interview_id(self.num_entrevista.as_deref())?;
        let soft = |r: Result<Option<i64>, String>| {
            r.unwrap_or_else(|reason| {
                warn!("{}:{line}: {reason}; treating as unmapped", source.display());
                None
            })
        };
        let topic_code_1 = soft(parse_code(self.categorias1.as_deref()));
        let topic_code_2 = soft(parse_code(self.categorias2.as_deref()));
        let sentiment_score = parse_score(self.sent_robertuito.as_deref()).unwrap_or_else(|reason| {
            warn!("{}:{line}: {reason}; treating as missing", source.display());
            None
        });
        Ok(PhraseRecord {
            interview_id,
            text: self.frase.unwrap_or_default(),
            kind: PhraseType::parse(self.tipo.as_deref().unwrap_or_default()),
            topic_code_1,
            topic_code_2,
            sentiment_score,
        })
    }
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, ReportError> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| ReportError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

fn headers(rdr: &mut csv::Reader<std::fs::File>, path: &Path) -> Result<StringRecord, ReportError> {
    rdr.headers()
        .cloned()
        .map_err(|source| ReportError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

fn require(
    headers: &StringRecord,
    path: &Path,
    column: &'static str,
    alias: Option<&'static str>,
) -> Result<(), ReportError> {
    let has_column = headers.iter().any(|h| h == column);
    let has_alias = alias.is_some_and(|a| headers.iter().any(|h| h == a));
    match (has_column, has_alias, alias) {
        (true, true, Some(alias)) => Err(ReportError::AmbiguousColumn {
            path: path.to_path_buf(),
            column,
            alias,
        }),
        (false, false, _) => Err(ReportError::MissingColumn {
            path: path.to_path_buf(),
            column,
        }),
        _ => Ok(()),
    }
}

/// Reads rows, splitting per-row failures from I/O failures on the source.
fn read_rows<T, F>(
    path: &Path,
    required: &[(&'static str, Option<&'static str>)],
    mut convert: F,
) -> Result<(Vec<T>, Vec<SkippedRow>), ReportError>
where
    F: FnMut(&StringRecord, &StringRecord, u64) -> Result<T, String>,
{
    let mut rdr = open(path)?;
    let hdr = headers(&mut rdr, path)?;
    for &(column, alias) in required {
        require(&hdr, path, column, alias)?;
    }

    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) if matches!(e.kind(), ErrorKind::Io(_)) => {
                return Err(ReportError::SourceUnavailable {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                skipped.push(skip(path, line, e.to_string()));
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line());
        match convert(&record, &hdr, line) {
            Ok(row) => rows.push(row),
            Err(reason) => skipped.push(skip(path, line, reason)),
        }
    }
    Ok((rows, skipped))
}

fn skip(path: &Path, line: u64, reason: String) -> SkippedRow {
    warn!("{}:{line}: skipping row: {reason}", path.display());
    SkippedRow {
        source: path.to_path_buf(),
        line,
        reason,
    }
}

/// Loads the primary phrase table.
pub fn load_phrases(path: &Path) -> Result<(Vec<PhraseRecord>, Vec<SkippedRow>), ReportError> {
    let (records, skipped) = read_rows(
        path,
        &[("num_entrevista", None), ("frase", None), ("Tipo", Some("tipo"))],
        |record, hdr, line| {
            let raw: RawPhraseRow = record.deserialize(Some(hdr)).map_err(|e| e.to_string())?;
            raw.into_record(path, line)
        },
    )?;
    debug!(
        "loaded {} phrase records from {} ({} skipped)",
        records.len(),
        path.display(),
        skipped.len()
    );
    Ok((records, skipped))
}

/// Loads the secondary example-phrase table.
pub fn load_examples(path: &Path) -> Result<(Vec<ExamplePhrase>, Vec<SkippedRow>), ReportError> {
    let (examples, skipped) = read_rows(
        path,
        &[("tipo", Some("Tipo")), ("frase", None)],
        |record, hdr, _line| record.deserialize(Some(hdr)).map_err(|e| e.to_string()),
    )?;
    debug!(
        "loaded {} example phrases from {}",
        examples.len(),
        path.display()
    );
    Ok((examples, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(kind: PhraseType, c1: Option<i64>, c2: Option<i64>, s: Option<f64>) -> PhraseRecord {
        PhraseRecord {
            interview_id: 1,
            text: "x".into(),
            kind,
            topic_code_1: c1,
            topic_code_2: c2,
            sentiment_score: s,
        }
    }

    #[test]
    fn type_strings() {
        assert_eq!(PhraseType::parse("Duda/pregunta"), PhraseType::Question);
        assert_eq!(PhraseType::parse(" Comentario/reflexión "), PhraseType::Reflection);
        assert_eq!(PhraseType::parse("reflection"), PhraseType::Reflection);
        assert_eq!(PhraseType::parse("Saludo"), PhraseType::Irrelevant);
        assert_eq!(PhraseType::parse(""), PhraseType::Irrelevant);
    }

    #[test]
    fn category_requires_matching_type() {
        let q = record(PhraseType::Question, Some(2), None, None);
        assert_eq!(q.category(Taxonomy::Questions).unwrap().code(), 2);
        assert_eq!(q.category(Taxonomy::Reflections), None);

        // a reflection carrying a question code is inconsistent
        let r = record(PhraseType::Reflection, Some(2), None, Some(0.1));
        assert_eq!(r.category(Taxonomy::Questions), None);
        assert_eq!(r.category(Taxonomy::Reflections), None);

        let out_of_range = record(PhraseType::Question, Some(11), None, None);
        assert_eq!(out_of_range.category(Taxonomy::Questions), None);
    }

    #[test]
    fn sentiment_only_on_reflections() {
        assert_eq!(record(PhraseType::Reflection, None, Some(1), Some(0.4)).sentiment(), Some(0.4));
        assert_eq!(record(PhraseType::Question, Some(1), None, Some(0.4)).sentiment(), None);
        assert_eq!(record(PhraseType::Reflection, None, Some(1), Some(f64::NAN)).sentiment(), None);
    }

    #[test]
    fn code_parsing() {
        assert_eq!(parse_code(Some("3")), Ok(Some(3)));
        assert_eq!(parse_code(Some("3.0")), Ok(Some(3)));
        assert_eq!(parse_code(Some(" ")), Ok(None));
        assert_eq!(parse_code(None), Ok(None));
        assert_eq!(parse_code(Some("nan")), Ok(None));
        assert!(parse_code(Some("3.5")).is_err());
        assert!(parse_code(Some("abc")).is_err());
    }

    #[test]
    fn score_parsing() {
        assert_eq!(parse_score(Some("-0.25")), Ok(Some(-0.25)));
        assert_eq!(parse_score(Some("")), Ok(None));
        assert_eq!(parse_score(Some("inf")), Ok(None));
        assert_eq!(parse_score(Some("-inf")), Ok(None));
        assert_eq!(parse_score(Some("nan")), Ok(None));
        assert!(parse_score(Some("muy bien")).is_err());
    }

    #[test]
    fn interview_id_parsing() {
        assert_eq!(parse_interview_id(Some("12")), Ok(12));
        assert_eq!(parse_interview_id(Some(" 3.0 ")), Ok(3));
        assert!(parse_interview_id(Some("-1")).is_err());
        assert!(parse_interview_id(Some("-1.0")).is_err());
        assert!(parse_interview_id(Some("2.5")).is_err());
        assert!(parse_interview_id(Some("")).is_err());
        assert!(parse_interview_id(None).is_err());
    }

    #[test]
    fn loads_phrases_and_skips_bad_ids() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "num_entrevista,frase,Tipo,categorias1,categorias2,sent_robertuito").unwrap();
        writeln!(f, "1,¿Cuánto tarda?,Duda/pregunta,10.0,,").unwrap();
        writeln!(f, "1,Me duele mucho,Comentario/reflexión,,1,-0.8").unwrap();
        writeln!(f, "x,roto,Duda/pregunta,1,,").unwrap();
        writeln!(f, "2,Hola,Saludo,,,").unwrap();
        f.flush().unwrap();

        let (records, skipped) = load_phrases(f.path()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].line, 4);
        assert_eq!(records[0].topic_code_1, Some(10));
        assert_eq!(records[1].sentiment(), Some(-0.8));
        assert_eq!(records[2].kind, PhraseType::Irrelevant);
    }

    #[test]
    fn lowercase_type_header_is_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "num_entrevista,frase,tipo").unwrap();
        writeln!(f, "4,Tengo miedo,Comentario/reflexión").unwrap();
        f.flush().unwrap();
        let (records, _) = load_phrases(f.path()).unwrap();
        assert_eq!(records[0].kind, PhraseType::Reflection);
        assert_eq!(records[0].sentiment(), None);
    }

    #[test]
    fn missing_column_is_fatal() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "num_entrevista,Tipo").unwrap();
        writeln!(f, "1,Duda/pregunta").unwrap();
        f.flush().unwrap();
        let err = load_phrases(f.path()).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn { column: "frase", .. }));
        assert!(err.is_startup());
    }

    #[test]
    fn both_type_spellings_in_header_is_fatal() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "num_entrevista,frase,Tipo,tipo").unwrap();
        writeln!(f, "1,Tengo miedo,Comentario/reflexión,Comentario/reflexión").unwrap();
        f.flush().unwrap();
        let err = load_phrases(f.path()).unwrap_err();
        assert!(matches!(
            err,
            ReportError::AmbiguousColumn {
                column: "Tipo",
                alias: "tipo",
                ..
            }
        ));
        assert!(err.is_startup());
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = load_examples(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ReportError::SourceUnavailable { .. }));
    }
}
