//! Batch summarization: answer one question about a corpus too large for a
//! single model call.
//!
//! The corpus is chunked, every chunk becomes an independent completion
//! request, and the per-chunk answers are folded into one.

mod fold;

pub use fold::FoldPolicy;

use crate::chunking::TextChunker;
use crate::completion::CompletionClient;
use crate::config::{InsightPrompts, Prompts};
use crate::error::{Result, TrendlensError};
use crate::retry::{with_backoff, RetryPolicy};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

/// Request-scoped context rendered into every prompt.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// The user's topic or query.
    pub topic: String,
    /// What the user wants to optimize for.
    pub goal: String,
    /// One-line summaries of the analyzed videos.
    pub metadata: String,
}

/// Answers questions over arbitrarily long text.
pub struct BatchSummarizer {
    client: Arc<dyn CompletionClient>,
    chunker: TextChunker,
    fold: FoldPolicy,
    separator: String,
    prompts: Prompts,
    max_concurrent: usize,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl BatchSummarizer {
    /// Create a summarizer. `max_concurrent` bounds in-flight requests across
    /// every `summarize` call sharing this instance. A permit is held for one
    /// attempt only, never across a retry delay.
    pub fn new(client: Arc<dyn CompletionClient>, chunk_budget: usize, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            client,
            chunker: TextChunker::new(chunk_budget),
            fold: FoldPolicy::default(),
            separator: "\n\n".to_string(),
            prompts: Prompts::default(),
            max_concurrent,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            retry: RetryPolicy::none(),
        }
    }

    /// Retry failed chunk requests with backoff.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the fold policy and the separator used by `Concatenate`.
    pub fn with_fold(mut self, fold: FoldPolicy, separator: &str) -> Self {
        self.fold = fold;
        self.separator = separator.to_string();
        self
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn prompts(&self) -> &InsightPrompts {
        &self.prompts.insights
    }

    /// Render the system prompt and the question message for a request.
    fn render_frame(&self, question: &str, context: &PromptContext) -> (String, String) {
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), context.topic.clone());
        vars.insert("goal".to_string(), context.goal.clone());
        vars.insert("question".to_string(), question.to_string());
        vars.insert("metadata".to_string(), context.metadata.clone());

        let system = self.prompts.render_with_custom(&self.prompts.insights.system, &vars);
        let question = self.prompts.render_with_custom(&self.prompts.insights.question, &vars);
        (system, question)
    }

    fn render_chunk(&self, chunk: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("chunk".to_string(), chunk.to_string());
        Prompts::render(&self.prompts.insights.chunk, &vars)
    }

    /// Answer `question` over `corpus`.
    ///
    /// The first failing chunk aborts the question with `ChunkFailed`;
    /// requests still in flight for this question are dropped.
    #[instrument(skip(self, corpus, context), fields(question = %question, corpus_chars = corpus.len()))]
    pub async fn summarize(&self, question: &str, corpus: &str, context: &PromptContext) -> Result<String> {
        let chunks = self.chunker.chunk(corpus);
        let total = chunks.len();
        let (system, question_message) = self.render_frame(question, context);

        info!("Summarizing over {} chunk(s)", total);

        let system = system.as_str();
        let question_message = question_message.as_str();

        let mut requests = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move {
                let messages = vec![question_message.to_string(), self.render_chunk(&chunk)];
                let label = format!("chunk {}/{}", index + 1, total);
                let result = with_backoff(&self.retry, &label, || {
                    let messages = &messages;
                    async move {
                        let _permit = self
                            .permits
                            .acquire()
                            .await
                            .map_err(|_| TrendlensError::Completion("request pool closed".to_string()))?;
                        self.client.complete(system, messages).await
                    }
                })
                .await;
                (index, result)
            })
            .buffer_unordered(self.max_concurrent);

        let mut answers: Vec<(usize, String)> = Vec::with_capacity(total);
        while let Some((index, result)) = requests.next().await {
            match result {
                Ok(answer) => {
                    debug!("Chunk {}/{} answered ({} chars)", index + 1, total, answer.len());
                    answers.push((index, answer));
                }
                Err(e) => {
                    return Err(TrendlensError::ChunkFailed {
                        question: question.to_string(),
                        chunk: index + 1,
                        chunks: total,
                        source: Box::new(e),
                    });
                }
            }
        }

        answers.sort_by_key(|(index, _)| *index);
        let answers: Vec<String> = answers.into_iter().map(|(_, a)| a).collect();

        Ok(self.fold.fold(answers, &self.separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers with a canned reply per chunk, recording every request.
    struct ScriptedClient {
        requests: Mutex<Vec<(String, Vec<String>)>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl ScriptedClient {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                fail_on: None,
            }
        }

        fn failing_on(marker: &'static str) -> Self {
            Self {
                fail_on: Some(marker),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, system_prompt: &str, user_messages: &[String]) -> Result<String> {
            self.requests
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_messages.to_vec()));

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let chunk = user_messages.last().cloned().unwrap_or_default();
            if let Some(marker) = self.fail_on {
                if chunk.contains(marker) {
                    return Err(TrendlensError::OpenAI("service unavailable".to_string()));
                }
            }
            Ok(format!("answer for [{}]", chunk.trim_start_matches("Material:\n")))
        }
    }

    /// Fails the first request for chunks containing `flaky_on`, logging every call.
    struct FlakyClient {
        flaky_on: &'static str,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionClient for FlakyClient {
        async fn complete(&self, _system_prompt: &str, user_messages: &[String]) -> Result<String> {
            let chunk = user_messages[1].trim_start_matches("Material:\n").to_string();
            let first_try = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(chunk.clone());
                calls.iter().filter(|c| **c == chunk).count() == 1
            };
            tokio::time::sleep(Duration::from_millis(5)).await;
            if first_try && chunk.contains(self.flaky_on) {
                return Err(TrendlensError::OpenAI("service unavailable".to_string()));
            }
            Ok(format!("answer for [{}]", chunk))
        }
    }

    fn context() -> PromptContext {
        PromptContext {
            topic: "sourdough".to_string(),
            goal: "views".to_string(),
            metadata: "Video titled Bread by Bakers has 10 views.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_single_chunk_returns_raw_answer() {
        let client = Arc::new(ScriptedClient::new());
        let summarizer = BatchSummarizer::new(client.clone(), 1850, 4)
            .with_fold(FoldPolicy::Concatenate, " | ");

        let answer = summarizer
            .summarize("What topics?", "short corpus", &context())
            .await
            .unwrap();

        assert_eq!(answer, "answer for [short corpus]");
        assert_eq!(client.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prompt_has_three_parts() {
        let client = Arc::new(ScriptedClient::new());
        let summarizer = BatchSummarizer::new(client.clone(), 1850, 4);

        summarizer
            .summarize("What topics?", "some transcript text", &context())
            .await
            .unwrap();

        let requests = client.requests.lock().unwrap();
        let (system, messages) = &requests[0];
        assert!(system.contains("\"sourdough\""));
        assert!(system.contains("optimize for views"));
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("What topics?"));
        assert!(messages[0].contains("Video titled Bread"));
        assert!(messages[1].contains("some transcript text"));
    }

    #[tokio::test]
    async fn test_one_request_per_chunk_and_longest_fold() {
        let client = Arc::new(ScriptedClient::new());
        let summarizer = BatchSummarizer::new(client.clone(), 9, 2);

        // Chunks: "aa bb", "cccccccc", "d"
        let answer = summarizer
            .summarize("Q", "aa bb cccccccc d", &context())
            .await
            .unwrap();

        assert_eq!(client.requests.lock().unwrap().len(), 3);
        assert_eq!(answer, "answer for [cccccccc]");
    }

    #[tokio::test]
    async fn test_concatenate_keeps_chunk_order() {
        let client = Arc::new(ScriptedClient::new());
        let summarizer =
            BatchSummarizer::new(client.clone(), 5, 3).with_fold(FoldPolicy::Concatenate, " | ");

        let answer = summarizer
            .summarize("Q", "one two three four", &context())
            .await
            .unwrap();

        assert_eq!(
            answer,
            "answer for [one] | answer for [two] | answer for [three] | answer for [four]"
        );
    }

    #[tokio::test]
    async fn test_failed_chunk_is_reported() {
        let client = Arc::new(ScriptedClient::failing_on("bad"));
        let summarizer = BatchSummarizer::new(client, 4, 1);

        let err = summarizer
            .summarize("top_topics", "good bad fine", &context())
            .await
            .unwrap_err();

        match err {
            TrendlensError::ChunkFailed {
                question,
                chunk,
                chunks,
                source,
            } => {
                assert_eq!(question, "top_topics");
                assert_eq!(chunk, 2);
                assert_eq!(chunks, 3);
                assert!(matches!(*source, TrendlensError::OpenAI(_)));
            }
            other => panic!("expected ChunkFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let client = Arc::new(ScriptedClient::new());
        let summarizer = BatchSummarizer::new(client.clone(), 3, 2);

        let corpus = (0..12).map(|i| format!("w{}", i % 10)).collect::<Vec<_>>().join(" ");
        summarizer.summarize("Q", &corpus, &context()).await.unwrap();

        assert_eq!(client.requests.lock().unwrap().len(), 12);
        assert!(client.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_retry_releases_permit_during_backoff() {
        let client = Arc::new(FlakyClient {
            flaky_on: "first",
            calls: Mutex::new(Vec::new()),
        });
        let retry = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(200),
        };
        let summarizer = BatchSummarizer::new(client.clone(), 1850, 1).with_retry(retry);

        let ctx_a = context();
        let ctx_b = context();
        let (a, b) = tokio::join!(
            summarizer.summarize("A", "first", &ctx_a),
            summarizer.summarize("B", "second", &ctx_b),
        );

        assert_eq!(a.unwrap(), "answer for [first]");
        assert_eq!(b.unwrap(), "answer for [second]");
        // The other question ran while the failed chunk was backing off
        assert_eq!(*client.calls.lock().unwrap(), vec!["first", "second", "first"]);
    }

    #[tokio::test]
    async fn test_chunk_fails_without_retry_policy() {
        let client = Arc::new(FlakyClient {
            flaky_on: "first",
            calls: Mutex::new(Vec::new()),
        });
        let summarizer = BatchSummarizer::new(client.clone(), 1850, 1);

        let err = summarizer.summarize("A", "first", &context()).await.unwrap_err();
        assert!(matches!(err, TrendlensError::ChunkFailed { .. }));
        assert_eq!(client.calls.lock().unwrap().len(), 1);
    }
}
