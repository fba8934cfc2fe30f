//! Group-by reductions over the immutable record set.
//!
//! Every function here is pure: it borrows the records, builds fresh output
//! and returns it in a deterministic order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, warn};
use serde::Serialize;

use crate::category::{Category, Taxonomy};
use crate::record::{ExamplePhrase, PhraseRecord, PhraseType};
use crate::sentiment::SentimentBucket;
use crate::summary::{Metric, ordered_buckets, sort_by_metric};

/// Gaussian 95% quantile used for confidence-interval half-widths.
pub const Z_95: f64 = 1.96;

/// Wide aggregation row: one category with its counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub phrase_count: u64,
    pub patient_count: u64,
}

impl CategoryCount {
    pub fn metric(&self, metric: Metric) -> u64 {
        match metric {
            Metric::PhraseCount => self.phrase_count,
            Metric::PatientCount => self.patient_count,
        }
    }
}

/// Per-interview sentiment summary over reflection phrases.
///
/// `standard_error` and `ci_half_width` are `None` for single-phrase
/// interviews, where the sample standard error is undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewSentiment {
    pub interview_id: u32,
    pub mean_sentiment: f64,
    pub standard_error: Option<f64>,
    pub phrase_count: u64,
    pub ci_half_width: Option<f64>,
    pub bucket: SentimentBucket,
}

/// Share of one sentiment bucket in a distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketShare {
    pub bucket: SentimentBucket,
    pub count: u64,
    pub percentage: f64,
}

/// What the sentiment distribution counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Basis {
    /// One vote per reflection phrase.
    #[default]
    Phrases,
    /// One vote per interview, from its mean score.
    Interviews,
}

/// Interview coverage per phrase type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCoverage {
    pub group: &'static str,
    pub interviews: u64,
    pub percentage: f64,
    pub phrases: u64,
}

/// Headline counts for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indicators {
    pub interviews: u64,
    pub relevant_phrases: u64,
    pub questions: u64,
    pub reflections: u64,
}

/// Counts phrases and distinct interviews per mapped category.
///
/// Records unmapped in `taxonomy` (other type, missing or out-of-range code)
/// are left out. Sorted by descending phrase count, ties in canonical order.
pub fn category_counts(records: &[PhraseRecord], taxonomy: Taxonomy) -> Vec<CategoryCount> {
    let mut groups: BTreeMap<Category, (u64, BTreeSet<u32>)> = BTreeMap::new();
    for r in records {
        if let Some(category) = r.category(taxonomy) {
            let entry = groups.entry(category).or_default();
            entry.0 += 1;
            entry.1.insert(r.interview_id);
        }
    }
    let mut rows: Vec<CategoryCount> = groups
        .into_iter()
        .map(|(category, (phrases, patients))| CategoryCount {
            category,
            phrase_count: phrases,
            patient_count: patients.len() as u64,
        })
        .collect();
    sort_by_metric(&mut rows, Metric::PhraseCount);
    debug!("{} categories with phrases in {taxonomy} taxonomy", rows.len());
    rows
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard error of the mean (n - 1 in the variance). `None` below two samples.
pub fn standard_error(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    let se = (var / n as f64).sqrt();
    se.is_finite().then_some(se)
}

fn scores_by_interview(records: &[PhraseRecord]) -> BTreeMap<u32, Vec<f64>> {
    let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for r in records {
        if let Some(score) = r.sentiment() {
            groups.entry(r.interview_id).or_default().push(score);
        }
    }
    groups
}

/// Mean sentiment per interview with standard error and CI half-width `z * se`.
///
/// Interviews without scored reflection phrases produce no row. Ordered by
/// interview id.
pub fn interview_sentiment(records: &[PhraseRecord], z: f64) -> Vec<InterviewSentiment> {
    scores_by_interview(records)
        .into_iter()
        .map(|(interview_id, scores)| {
            let mean_sentiment = mean(&scores);
            let standard_error = standard_error(&scores);
            InterviewSentiment {
                interview_id,
                mean_sentiment,
                standard_error,
                phrase_count: scores.len() as u64,
                ci_half_width: standard_error.map(|se| z * se).filter(|w| w.is_finite()),
                bucket: SentimentBucket::from_score(mean_sentiment),
            }
        })
        .collect()
}

/// Percentage of each bucket, all five buckets in canonical order.
pub fn sentiment_distribution(records: &[PhraseRecord], basis: Basis) -> Vec<BucketShare> {
    let buckets: Vec<SentimentBucket> = match basis {
        Basis::Phrases => records
            .iter()
            .filter_map(PhraseRecord::sentiment)
            .map(SentimentBucket::from_score)
            .collect(),
        Basis::Interviews => scores_by_interview(records)
            .values()
            .map(|s| SentimentBucket::from_score(mean(s)))
            .collect(),
    };
    let mut counts: HashMap<SentimentBucket, u64> = HashMap::new();
    for b in &buckets {
        *counts.entry(*b).or_insert(0) += 1;
    }
    let total = buckets.len() as u64;
    ordered_buckets(&counts)
        .into_iter()
        .map(|(bucket, count)| BucketShare {
            bucket,
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// How many interviews produced reflections, questions, or neither.
///
/// `total_interviews` is the study size; interviews absent from the data
/// count as having no relevant interaction.
pub fn type_coverage(records: &[PhraseRecord], total_interviews: u64) -> Vec<TypeCoverage> {
    let ids = |kind: PhraseType| -> BTreeSet<u32> {
        records
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.interview_id)
            .collect()
    };
    let phrases = |kind: PhraseType| records.iter().filter(|r| r.kind == kind).count() as u64;

    let reflection_ids = ids(PhraseType::Reflection);
    let question_ids = ids(PhraseType::Question);
    let relevant = reflection_ids.union(&question_ids).count() as u64;
    if relevant > total_interviews {
        warn!(
            "{relevant} interviews have relevant phrases but the study size is {total_interviews}"
        );
    }
    let silent = total_interviews.saturating_sub(relevant);

    [
        ("Reflection", reflection_ids.len() as u64, phrases(PhraseType::Reflection)),
        ("Question", question_ids.len() as u64, phrases(PhraseType::Question)),
        ("No relevant interaction", silent, phrases(PhraseType::Irrelevant)),
    ]
    .into_iter()
    .map(|(group, interviews, phrases)| TypeCoverage {
        group,
        interviews,
        percentage: percentage(interviews, total_interviews),
        phrases,
    })
    .collect()
}

pub fn indicators(records: &[PhraseRecord], total_interviews: u64) -> Indicators {
    let count = |kind| records.iter().filter(|r| r.kind == kind).count() as u64;
    Indicators {
        interviews: total_interviews,
        relevant_phrases: records.len() as u64,
        questions: count(PhraseType::Question),
        reflections: count(PhraseType::Reflection),
    }
}

/// Drill-down: (interview id, phrase) for every record in `category`, in source order.
pub fn phrases_in_category(records: &[PhraseRecord], category: Category) -> Vec<(u32, &str)> {
    records
        .iter()
        .filter(|r| r.category(category.taxonomy()) == Some(category))
        .map(|r| (r.interview_id, r.text.as_str()))
        .collect()
}

/// Distinct example kinds in first-seen order.
pub fn example_kinds(examples: &[ExamplePhrase]) -> Vec<&str> {
    let mut seen = Vec::new();
    for e in examples {
        if !seen.contains(&e.kind.as_str()) {
            seen.push(e.kind.as_str());
        }
    }
    seen
}

pub fn examples_of_kind<'a>(examples: &'a [ExamplePhrase], kind: &str) -> Vec<&'a str> {
    examples
        .iter()
        .filter(|e| e.kind == kind)
        .map(|e| e.text.as_str())
        .collect()
}
