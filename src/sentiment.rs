use std::fmt;

use serde::{Serialize, Serializer};

/// Five ordinal sentiment labels, declared in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SentimentBucket {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

impl SentimentBucket {
    pub const ALL: [SentimentBucket; 5] = [
        SentimentBucket::VeryNegative,
        SentimentBucket::Negative,
        SentimentBucket::Neutral,
        SentimentBucket::Positive,
        SentimentBucket::VeryPositive,
    ];

    /// Buckets a score with the fixed thresholds.
    ///
    /// The negative side compares with strict `<`, the positive side with
    /// strict `>`, so ±0.3 is Neutral and ±0.6 stays out of the "Very" tiers.
    /// Scores outside [-1, 1] fall through the same comparisons.
    pub fn from_score(score: f64) -> Self {
        if score < -0.6 {
            SentimentBucket::VeryNegative
        } else if score < -0.3 {
            SentimentBucket::Negative
        } else if score <= 0.3 {
            SentimentBucket::Neutral
        } else if score <= 0.6 {
            SentimentBucket::Positive
        } else {
            SentimentBucket::VeryPositive
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SentimentBucket::VeryNegative => "Very Negative",
            SentimentBucket::Negative => "Negative",
            SentimentBucket::Neutral => "Neutral",
            SentimentBucket::Positive => "Positive",
            SentimentBucket::VeryPositive => "Very Positive",
        }
    }
}

impl fmt::Display for SentimentBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for SentimentBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_and_boundaries() {
        let cases = [
            (-0.7, "Very Negative"),
            (-0.6, "Negative"),
            (-0.31, "Negative"),
            (-0.3, "Neutral"),
            (0.0, "Neutral"),
            (0.3, "Neutral"),
            (0.31, "Positive"),
            (0.6, "Positive"),
            (0.61, "Very Positive"),
        ];
        for (score, expected) in cases {
            assert_eq!(SentimentBucket::from_score(score).label(), expected, "score {score}");
        }
    }

    #[test]
    fn out_of_domain_scores_still_classify() {
        assert_eq!(SentimentBucket::from_score(-4.0), SentimentBucket::VeryNegative);
        assert_eq!(SentimentBucket::from_score(2.5), SentimentBucket::VeryPositive);
    }

    #[test]
    fn all_is_sorted() {
        assert!(SentimentBucket::ALL.windows(2).all(|w| w[0] < w[1]));
    }
}
