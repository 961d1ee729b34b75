// VoteAggregator - per-segment labels to a single verdict
//
// Majority vote over segment labels. Ties resolve to negative; an empty label
// list gives an undetermined verdict rather than an error.

use serde::{Deserialize, Serialize};

use crate::classifier::Label;

/// Final diagnosis category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Positive,
    Negative,
    Undetermined,
}

/// Label counts for one recording
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    /// Segments labelled positive (`ct1`)
    pub positive: usize,
    /// Segments labelled negative (`ct0`)
    pub negative: usize,
}

impl VoteTally {
    pub fn from_labels(labels: &[Label]) -> Self {
        labels.iter().fold(Self::default(), |mut tally, label| {
            tally.record(*label);
            tally
        })
    }

    pub fn record(&mut self, label: Label) {
        match label {
            Label::Positive => self.positive += 1,
            Label::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative
    }

    /// Collapse the tally into a verdict
    pub fn verdict(&self) -> Verdict {
        let total = self.total();
        if total == 0 {
            return Verdict {
                outcome: Outcome::Undetermined,
                confidence_percent: None,
                message: "No prediction possible: no valid segments were found".to_string(),
            };
        }

        let (outcome, winner) = if self.positive > self.negative {
            (Outcome::Positive, self.positive)
        } else {
            (Outcome::Negative, self.negative)
        };
        let confidence = 100.0 * winner as f64 / total as f64;
        let condition = match outcome {
            Outcome::Positive => "sick",
            _ => "healthy",
        };

        Verdict {
            outcome,
            confidence_percent: Some(confidence),
            message: format!("{:.2}% sure that the patient is {}", confidence, condition),
        }
    }
}

/// Confidence-scored diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: Outcome,
    /// `100 × max(ct1, ct0) / (ct1 + ct0)`, absent when no segment was voted
    pub confidence_percent: Option<f64>,
    pub message: String,
}

/// Majority vote over segment labels
pub fn aggregate(labels: &[Label]) -> Verdict {
    VoteTally::from_labels(labels).verdict()
}
