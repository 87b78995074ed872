//! Folding per-chunk answers into one answer.

use serde::{Deserialize, Serialize};

/// How per-chunk answers are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FoldPolicy {
    /// Keep the longest answer (ties go to the earliest chunk).
    #[default]
    Longest,
    /// Join all answers in chunk order.
    Concatenate,
}

impl FoldPolicy {
    /// Fold answers given in chunk order.
    pub fn fold(&self, mut answers: Vec<String>, separator: &str) -> String {
        if answers.len() <= 1 {
            return answers.pop().unwrap_or_default();
        }

        match self {
            FoldPolicy::Longest => {
                let mut best = 0;
                let mut best_len = 0;
                for (i, answer) in answers.iter().enumerate() {
                    let len = answer.chars().count();
                    if len > best_len {
                        best = i;
                        best_len = len;
                    }
                }
                answers.swap_remove(best)
            }
            FoldPolicy::Concatenate => answers.join(separator),
        }
    }
}

impl std::str::FromStr for FoldPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "longest" => Ok(FoldPolicy::Longest),
            "concatenate" | "concat" => Ok(FoldPolicy::Concatenate),
            _ => Err(format!("Unknown fold policy: {}", s)),
        }
    }
}
