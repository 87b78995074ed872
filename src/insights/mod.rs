//! Qualitative insights: a battery of questions answered over transcripts
//! and comments.

pub mod context;

pub use context::format_metadata;

use crate::error::TrendlensError;
use crate::platform::{CommentFetch, TranscriptFetch, VideoRecord};
use crate::summarize::{BatchSummarizer, PromptContext};
use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{info, instrument, warn};

static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]+").expect("Invalid regex"));

/// Length of a platform video identifier.
const IDENTIFIER_LEN: usize = 11;

/// Default deadline for answering one question.
const DEFAULT_DEADLINE: Duration = Duration::from_secs(600);

/// Which material a question is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corpus {
    Transcripts,
    Comments,
}

impl std::fmt::Display for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Corpus::Transcripts => write!(f, "transcripts"),
            Corpus::Comments => write!(f, "comments"),
        }
    }
}

/// One question of the battery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Key the answer is reported under.
    pub key: String,
    pub text: String,
    pub corpus: Corpus,
}

impl Question {
    pub fn new(key: &str, text: &str, corpus: Corpus) -> Self {
        Self {
            key: key.to_string(),
            text: text.to_string(),
            corpus,
        }
    }
}

/// Which videos contributed material.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Coverage {
    pub videos: usize,
    pub with_transcripts: Vec<String>,
    pub with_comments: Vec<String>,
    /// Video id to reason, for transcripts that could not be fetched.
    pub missing_transcripts: BTreeMap<String, String>,
    /// Video id to reason, for comments that could not be fetched.
    pub missing_comments: BTreeMap<String, String>,
}

/// Result of an insight pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InsightReport {
    pub answers: BTreeMap<String, String>,
    pub failures: BTreeMap<String, String>,
    /// Questions whose corpus was empty.
    pub skipped: Vec<String>,
    pub coverage: Coverage,
}

/// Remove every isolated 11-character identifier-like token.
///
/// Tokens are maximal runs of `[A-Za-z0-9_-]`; longer and shorter runs are kept.
/// Ordinary 11-letter words are removed as well.
pub fn scrub_identifiers(text: &str) -> String {
    let mut scrubbed = String::with_capacity(text.len());
    let mut last = 0;

    for token in TOKEN_REGEX.find_iter(text) {
        if token.len() == IDENTIFIER_LEN {
            scrubbed.push_str(&text[last..token.start()]);
            last = token.end();
        }
    }
    scrubbed.push_str(&text[last..]);
    scrubbed
}

/// Runs the question battery through a [`BatchSummarizer`].
pub struct InsightOrchestrator {
    summarizer: BatchSummarizer,
    deadline: Duration,
}

impl InsightOrchestrator {
    pub fn new(summarizer: BatchSummarizer) -> Self {
        Self {
            summarizer,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Bound every question by `deadline`. Requests still in flight when it
    /// passes are dropped.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn questions(&self) -> &[Question] {
        &self.summarizer.prompts().questions
    }

    /// Answer every question over the material of `videos`.
    ///
    /// Never fails as a whole: a failing or timed-out question is recorded in
    /// `failures` and the others are still answered.
    #[instrument(skip_all, fields(topic = %topic, videos = videos.len()))]
    pub async fn derive_insights(
        &self,
        transcripts: &HashMap<String, TranscriptFetch>,
        comments: &HashMap<String, CommentFetch>,
        videos: &[VideoRecord],
        topic: &str,
        goal: &str,
    ) -> InsightReport {
        let mut coverage = Coverage {
            videos: videos.len(),
            ..Coverage::default()
        };

        let mut transcript_texts = Vec::new();
        let mut comment_texts = Vec::new();

        for video in videos {
            match transcripts.get(&video.id) {
                Some(TranscriptFetch::Available(transcript)) => {
                    coverage.with_transcripts.push(video.id.clone());
                    transcript_texts.push(transcript.full_text());
                }
                Some(TranscriptFetch::Unavailable { reason }) => {
                    coverage.missing_transcripts.insert(video.id.clone(), reason.clone());
                }
                None => {
                    coverage
                        .missing_transcripts
                        .insert(video.id.clone(), "not fetched".to_string());
                }
            }

            match comments.get(&video.id) {
                Some(CommentFetch::Available(items)) => {
                    coverage.with_comments.push(video.id.clone());
                    comment_texts.extend(items.iter().cloned());
                }
                Some(CommentFetch::Unavailable { reason }) => {
                    coverage.missing_comments.insert(video.id.clone(), reason.clone());
                }
                None => {
                    coverage
                        .missing_comments
                        .insert(video.id.clone(), "not fetched".to_string());
                }
            }
        }

        let transcript_corpus = scrub_identifiers(&transcript_texts.join("\n"));
        let comment_corpus = scrub_identifiers(&comment_texts.join("\n"));

        let context = PromptContext {
            topic: topic.to_string(),
            goal: goal.to_string(),
            metadata: format_metadata(videos),
        };

        let mut report = InsightReport {
            coverage,
            ..InsightReport::default()
        };

        let mut pending = Vec::new();
        for question in self.questions() {
            let corpus = match question.corpus {
                Corpus::Transcripts => transcript_corpus.as_str(),
                Corpus::Comments => comment_corpus.as_str(),
            };

            if corpus.trim().is_empty() {
                warn!("Skipping '{}': no {} available", question.key, question.corpus);
                report.skipped.push(question.key.clone());
                continue;
            }
            pending.push((question, corpus));
        }

        info!("Answering {} question(s)", pending.len());

        let context = &context;
        let deadline = self.deadline;
        let outcomes = join_all(pending.into_iter().map(|(question, corpus)| async move {
            let summary = self.summarizer.summarize(&question.text, corpus, context);
            let outcome = match tokio::time::timeout(deadline, summary).await {
                Ok(outcome) => outcome,
                Err(_) => Err(TrendlensError::Timeout(format!(
                    "question '{}' exceeded {:?}",
                    question.key, deadline
                ))),
            };
            (question.key.clone(), outcome)
        }))
        .await;

        for (key, outcome) in outcomes {
            match outcome {
                Ok(answer) => {
                    report.answers.insert(key, answer);
                }
                Err(e) => {
                    warn!("Question '{}' failed: {}", key, e);
                    report.failures.insert(key, e.to_string());
                }
            }
        }

        report
    }
}
