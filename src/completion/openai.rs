//! OpenAI chat completion implementation.

use super::CompletionClient;
use crate::config::InsightSettings;
use crate::error::{Result, TrendlensError};
use crate::openai::create_client_with_timeout;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-backed completion client.
pub struct OpenAiCompletion {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

/// API error codes and types worth another attempt.
const TRANSIENT_KINDS: &[&str] = &["rate_limit_exceeded", "server_error", "timeout", "overloaded_error"];

/// Map a client error onto the crate taxonomy.
///
/// Transport failures, rate limits and server-side errors stay retryable as
/// `OpenAI`. Rejections such as a bad key, an unknown model or an oversized
/// request become `Completion` and are not retried.
fn classify(e: OpenAIError) -> TrendlensError {
    let transient = match &e {
        OpenAIError::Reqwest(_) => true,
        OpenAIError::ApiError(api) => [api.code.as_deref(), api.r#type.as_deref()]
            .into_iter()
            .flatten()
            .any(|kind| TRANSIENT_KINDS.contains(&kind)),
        _ => false,
    };

    let message = format!("Failed to generate response: {}", e);
    if transient {
        TrendlensError::OpenAI(message)
    } else {
        TrendlensError::Completion(message)
    }
}

impl OpenAiCompletion {
    /// Create a client from the insight settings.
    pub fn with_config(settings: &InsightSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(settings.request_timeout(), settings.api_base_url.as_deref())?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    /// Model used for every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(
        &self,
        system_prompt: &str,
        user_messages: &[String],
    ) -> Result<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt.to_string())
                .build()
                .map_err(|e| TrendlensError::Completion(e.to_string()))?
                .into()];

        for content in user_messages {
            messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .map_err(|e| TrendlensError::Completion(e.to_string()))?
                    .into(),
            );
        }

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| TrendlensError::Completion(e.to_string()))
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    #[instrument(skip(self, system_prompt, user_messages), fields(model = %self.model, messages = user_messages.len()))]
    async fn complete(&self, system_prompt: &str, user_messages: &[String]) -> Result<String> {
        let request = self.build_request(system_prompt, user_messages)?;

        let response = self.client.chat().create(request).await.map_err(classify)?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TrendlensError::Completion("Empty response from LLM".to_string()))?
            .clone();

        debug!("Completion returned {} chars", answer.len());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::summarize::{BatchSummarizer, PromptContext};
    use async_openai::error::ApiError;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_request_carries_all_messages() {
        let settings = InsightSettings {
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.2,
            ..InsightSettings::default()
        };
        let client = OpenAiCompletion::with_config(&settings).unwrap();
        assert_eq!(client.model(), "gpt-4.1-mini");

        let request = client
            .build_request(
                "persona",
                &["question".to_string(), "chunk".to_string()],
            )
            .unwrap();
        assert_eq!(request.model, "gpt-4.1-mini");
        assert_eq!(request.messages.len(), 3);
        assert!(matches!(request.messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(request.messages[2], ChatCompletionRequestMessage::User(_)));
        assert_eq!(request.temperature, Some(0.2));
    }

    fn api_error(code: Option<&str>, kind: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: "upstream said no".to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        })
    }

    #[test]
    fn test_classify_errors() {
        assert!(classify(api_error(Some("rate_limit_exceeded"), Some("requests"))).is_retryable());
        assert!(classify(api_error(None, Some("server_error"))).is_retryable());

        let rejected = classify(api_error(Some("invalid_api_key"), Some("invalid_request_error")));
        assert!(matches!(rejected, TrendlensError::Completion(_)));
        assert!(!rejected.is_retryable());

        assert!(!classify(api_error(Some("context_length_exceeded"), None)).is_retryable());
        assert!(!classify(OpenAIError::InvalidArgument("no messages".to_string())).is_retryable());
    }

    #[tokio::test]
    async fn test_rejected_request_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {
                    "message": "Incorrect API key provided",
                    "type": "invalid_request_error",
                    "param": null,
                    "code": "invalid_api_key"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = InsightSettings {
            api_base_url: Some(server.uri()),
            ..InsightSettings::default()
        };
        let client = Arc::new(OpenAiCompletion::with_config(&settings).unwrap());
        let retry = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };
        let summarizer = BatchSummarizer::new(client, 1850, 1).with_retry(retry);

        let err = summarizer
            .summarize("Q", "some text", &PromptContext::default())
            .await
            .unwrap_err();

        match err {
            TrendlensError::ChunkFailed { source, .. } => {
                assert!(matches!(*source, TrendlensError::Completion(_)));
                assert!(source.to_string().contains("Incorrect API key"));
            }
            other => panic!("expected ChunkFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reply_content_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1700000000,
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Bread wins"},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = InsightSettings {
            api_base_url: Some(server.uri()),
            ..InsightSettings::default()
        };
        let client = OpenAiCompletion::with_config(&settings).unwrap();

        let answer = client
            .complete("persona", &["question".to_string(), "chunk".to_string()])
            .await
            .unwrap();
        assert_eq!(answer, "Bread wins");
    }
}
