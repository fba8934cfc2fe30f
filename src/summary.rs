//! Reshaping aggregation output into the tables the presentation layer draws.

use std::collections::HashMap;

use clap::ValueEnum;
use serde::Serialize;

use crate::aggregate::CategoryCount;
use crate::category::Category;
use crate::sentiment::SentimentBucket;

/// A count column of the wide category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PhraseCount,
    PatientCount,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::PhraseCount, Metric::PatientCount];

    pub fn name(self) -> &'static str {
        match self {
            Metric::PhraseCount => "phrase_count",
            Metric::PatientCount => "patient_count",
        }
    }
}

/// One (category, metric, value) tuple of a long-form table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongRow {
    pub category: Category,
    pub metric: Metric,
    pub value: u64,
}

/// Melts wide rows into long form, keeping only the requested metrics.
///
/// Rows are metric-major: every category for the first metric, then every
/// category for the next, each block in the incoming category order. An
/// empty selection gives an empty table.
pub fn to_long_form(rows: &[CategoryCount], metrics: &[Metric]) -> Vec<LongRow> {
    Metric::ALL
        .iter()
        .filter(|m| metrics.contains(m))
        .flat_map(move |&metric| {
            rows.iter().map(move |r| LongRow {
                category: r.category,
                metric,
                value: r.metric(metric),
            })
        })
        .collect()
}

/// Sorts descending by `metric`; equal values keep canonical category order.
pub fn sort_by_metric(rows: &mut [CategoryCount], metric: Metric) {
    rows.sort_by(|a, b| {
        b.metric(metric)
            .cmp(&a.metric(metric))
            .then_with(|| a.category.cmp(&b.category))
    });
}

/// All five buckets in canonical order, zero where `counts` has no entry.
pub fn ordered_buckets(counts: &HashMap<SentimentBucket, u64>) -> Vec<(SentimentBucket, u64)> {
    SentimentBucket::ALL
        .iter()
        .map(|b| (*b, counts.get(b).copied().unwrap_or(0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{Taxonomy, category_for};

    fn row(code: i64, phrases: u64, patients: u64) -> CategoryCount {
        CategoryCount {
            category: category_for(Taxonomy::Reflections, code).unwrap(),
            phrase_count: phrases,
            patient_count: patients,
        }
    }

    #[test]
    fn long_form_is_metric_major() {
        let rows = vec![row(3, 5, 2), row(1, 4, 4)];
        let long = to_long_form(&rows, &[Metric::PatientCount, Metric::PhraseCount]);
        let flat: Vec<(i64, &str, u64)> = long
            .iter()
            .map(|r| (r.category.code(), r.metric.name(), r.value))
            .collect();
        assert_eq!(
            flat,
            vec![
                (3, "phrase_count", 5),
                (1, "phrase_count", 4),
                (3, "patient_count", 2),
                (1, "patient_count", 4),
            ]
        );
    }

    #[test]
    fn metric_filter() {
        let rows = vec![row(3, 5, 2), row(1, 4, 4)];
        let long = to_long_form(&rows, &[Metric::PhraseCount]);
        assert_eq!(long.len(), 2);
        assert!(long.iter().all(|r| r.metric != Metric::PatientCount));
        assert!(to_long_form(&rows, &[]).is_empty());
    }

    #[test]
    fn sort_by_patients_with_tie_break() {
        let mut rows = vec![row(6, 9, 1), row(4, 1, 3), row(2, 2, 3)];
        sort_by_metric(&mut rows, Metric::PatientCount);
        let codes: Vec<i64> = rows.iter().map(|r| r.category.code()).collect();
        assert_eq!(codes, vec![2, 4, 6]);
    }

    #[test]
    fn buckets_fill_and_order() {
        let mut counts = HashMap::new();
        counts.insert(SentimentBucket::Positive, 3);
        counts.insert(SentimentBucket::VeryNegative, 1);
        let ordered = ordered_buckets(&counts);
        assert_eq!(ordered.len(), 5);
        assert_eq!(ordered[0], (SentimentBucket::VeryNegative, 1));
        assert_eq!(ordered[3], (SentimentBucket::Positive, 3));
        assert_eq!(ordered[4], (SentimentBucket::VeryPositive, 0));
    }
}
