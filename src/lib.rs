#![forbid(unsafe_code)]
//! # interview_report
//!
//! Descriptive statistics over interview transcripts that were segmented into
//! phrases and labelled upstream (phrase type, topic code, sentiment score).
//!
//! The crate loads the phrase table once into an immutable [`Dataset`] and
//! answers report queries with pure functions over it:
//!
//! - category counts per topic taxonomy, wide or long-form ([`aggregate::category_counts`], [`summary::to_long_form`])
//! - per-interview mean sentiment with a 95% confidence half-width ([`aggregate::interview_sentiment`])
//! - the five-bucket sentiment distribution ([`aggregate::sentiment_distribution`])
//! - interview coverage per phrase type and headline indicators
//! - drill-down phrase listings and illustrative example phrases
//!
//! ## Example
//! ```
//! use interview_report::{PhraseRecord, PhraseType, Taxonomy, aggregate};
//!
//! let records = vec![PhraseRecord {
//!     interview_id: 7,
//!     text: "¿Cuánto dura la espera?".into(),
//!     kind: PhraseType::Question,
//!     topic_code_1: Some(10),
//!     topic_code_2: None,
//!     sentiment_score: None,
//! }];
//! let rows = aggregate::category_counts(&records, Taxonomy::Questions);
//! assert_eq!(rows[0].category.label(), "Logística y tiempos de espera");
//! assert_eq!(rows[0].patient_count, 1);
//! ```

pub mod aggregate;
pub mod category;
pub mod error;
pub mod export;
pub mod record;
pub mod sentiment;
pub mod summary;

use std::path::Path;

use clap::ValueEnum;
use log::{info, warn};

pub use aggregate::{
    Basis, BucketShare, CategoryCount, Indicators, InterviewSentiment, TypeCoverage, Z_95,
};
pub use category::{Category, QuestionTopic, ReflectionTopic, Taxonomy, category_for};
pub use error::ReportError;
pub use export::{ExportFormat, PhraseRow, Table, csv_safe_cell, save_table, write_table};
pub use record::{ExamplePhrase, PhraseRecord, PhraseType, SkippedRow};
pub use sentiment::SentimentBucket;
pub use summary::{LongRow, Metric};

/// Number of interviews in the study.
pub const STUDY_INTERVIEWS: u64 = 41;

/// Which table a query produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Report {
    /// Phrase and patient counts per category.
    #[default]
    Categories,
    /// Mean sentiment and confidence interval per interview.
    Sentiment,
    /// Share of each sentiment bucket.
    Distribution,
    /// Interviews with reflections, questions, or neither.
    Coverage,
    /// Headline counts.
    Indicators,
    /// Phrases filed under one category.
    Phrases,
    /// Illustrative example phrases.
    Examples,
}

/// Options for one report query.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub report: Report,
    pub taxonomy: Taxonomy,
    /// Metrics kept in long form; an empty list gives an empty table.
    pub metrics: Vec<Metric>,
    pub long_form: bool,
    pub sort_by: Metric,
    pub basis: Basis,
    /// Topic code for the `phrases` drill-down.
    pub category: Option<i64>,
    /// Example kind for the `examples` lookup; all kinds when `None`.
    pub kind: Option<String>,
    pub total_interviews: u64,
    pub z: f64,
    pub export_format: ExportFormat,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            report: Report::Categories,
            taxonomy: Taxonomy::Questions,
            metrics: Metric::ALL.to_vec(),
            long_form: false,
            sort_by: Metric::PhraseCount,
            basis: Basis::Phrases,
            category: None,
            kind: None,
            total_interviews: STUDY_INTERVIEWS,
            z: Z_95,
            export_format: ExportFormat::Txt,
        }
    }
}

/// The loaded sources. Never mutated after [`Dataset::load`].
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<PhraseRecord>,
    pub examples: Vec<ExamplePhrase>,
    pub skipped: Vec<SkippedRow>,
}

impl Dataset {
    /// Reads the phrase table and, if given, the example-phrase table.
    ///
    /// Unreadable sources or missing columns are fatal; unusable rows are
    /// collected in `skipped`.
    pub fn load(phrases: &Path, examples: Option<&Path>) -> Result<Self, ReportError> {
        let (records, mut skipped) = record::load_phrases(phrases)?;
        let examples = match examples {
            Some(path) => {
                let (examples, more) = record::load_examples(path)?;
                skipped.extend(more);
                examples
            }
            None => Vec::new(),
        };
        info!(
            "dataset ready: {} phrases, {} examples, {} skipped rows",
            records.len(),
            examples.len(),
            skipped.len()
        );
        Ok(Dataset {
            records,
            examples,
            skipped,
        })
    }

    pub fn from_records(records: Vec<PhraseRecord>) -> Self {
        Dataset {
            records,
            ..Dataset::default()
        }
    }
}

/// Answers one report query against `dataset`.
pub fn run_report(dataset: &Dataset, options: &ReportOptions) -> Result<Table, ReportError> {
    let records = &dataset.records;
    match options.report {
        Report::Categories => {
            let mut rows = aggregate::category_counts(records, options.taxonomy);
            if options.sort_by != Metric::PhraseCount {
                summary::sort_by_metric(&mut rows, options.sort_by);
            }
            if options.long_form {
                Table::of("categories_long", &summary::to_long_form(&rows, &options.metrics))
            } else {
                Table::of("categories", &rows)
            }
        }
        Report::Sentiment => {
            if !(options.z.is_finite() && options.z > 0.0) {
                return Err(ReportError::InvalidZ(options.z));
            }
            Table::of("sentiment", &aggregate::interview_sentiment(records, options.z))
        }
        Report::Distribution => Table::of(
            "distribution",
            &aggregate::sentiment_distribution(records, options.basis),
        ),
        Report::Coverage => Table::of(
            "coverage",
            &aggregate::type_coverage(records, options.total_interviews),
        ),
        Report::Indicators => Table::of(
            "indicators",
            &[aggregate::indicators(records, options.total_interviews)],
        ),
        Report::Phrases => {
            let code = options.category.unwrap_or(0);
            let category =
                category_for(options.taxonomy, code).ok_or(ReportError::UnknownCategory {
                    taxonomy: options.taxonomy,
                    code,
                })?;
            let rows: Vec<PhraseRow> = aggregate::phrases_in_category(records, category)
                .into_iter()
                .map(|(interview_id, text)| PhraseRow {
                    interview_id,
                    text: text.to_string(),
                })
                .collect();
            Table::of("phrases", &rows)
        }
        Report::Examples => {
            let rows: Vec<ExamplePhrase> = match &options.kind {
                Some(kind) => {
                    let rows: Vec<ExamplePhrase> =
                        aggregate::examples_of_kind(&dataset.examples, kind)
                            .into_iter()
                            .map(|text| ExamplePhrase {
                                kind: kind.clone(),
                                text: text.to_string(),
                            })
                            .collect();
                    if rows.is_empty() {
                        warn!(
                            "no example phrases of kind {kind:?}; known kinds: {:?}",
                            aggregate::example_kinds(&dataset.examples)
                        );
                    }
                    rows
                }
                None => dataset.examples.clone(),
            };
            Table::of("examples", &rows)
        }
    }
}

/// Print skipped source rows to stderr.
pub fn print_skipped_rows(skipped: &[SkippedRow]) {
    eprintln!("Skipped {} row(s):", skipped.len());
    for row in skipped {
        eprintln!("  {}:{}: {}", row.source.display(), row.line, row.reason);
    }
}
