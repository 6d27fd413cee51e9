use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::NewsAnalysis;

use super::RelevanceScorer;

const SCHEMA_NAME: &str = "NewsAnalysis";
const MAX_CONTENT_CHARS: usize = 20_000;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
    reasoning_effort: &'static str,
    stream: bool,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Scores articles through an OpenAI-compatible chat completions endpoint
/// using a JSON-schema constrained reply.
pub struct Scorer {
    client: Client,
    api_key: String,
    api_base_url: String,
    model: String,
    rubric: String,
}

impl Scorer {
    pub fn new(
        api_key: impl Into<String>,
        api_base_url: impl Into<String>,
        model: impl Into<String>,
        rubric: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base_url: api_base_url.into(),
            model: model.into(),
            rubric: rubric.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or(AppError::MissingApiKey)?;
        Self::new(
            api_key,
            config.api_base_url.clone(),
            config.model.clone(),
            config.rubric()?,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base_url.trim_end_matches('/'))
    }

    pub async fn score_article(&self, title: &str, content: &str) -> Result<NewsAnalysis> {
        let content = truncate_chars(content, MAX_CONTENT_CHARS);
        let user_message = format!("Title: {title}, Content: {content}");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &self.rubric,
                },
                Message {
                    role: "user",
                    content: &user_message,
                },
            ],
            temperature: 0.1,
            max_completion_tokens: 2000,
            top_p: 0.1,
            reasoning_effort: "medium",
            stream: false,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: SCHEMA_NAME,
                    schema: NewsAnalysis::json_schema(),
                },
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AppError::ScoringApi(format!("HTTP {status}: {error_text}")));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat.choices.into_iter().next().and_then(|c| c.message.content);

        Ok(parse_analysis(content.as_deref()))
    }
}

#[async_trait]
impl RelevanceScorer for Scorer {
    async fn score(&self, title: &str, content: &str) -> Result<NewsAnalysis> {
        self.score_article(title, content).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Anything that does not fit the schema scores as noise.
fn parse_analysis(content: Option<&str>) -> NewsAnalysis {
    let Some(raw) = content else {
        tracing::warn!("Scoring response had no content; defaulting to noise");
        return NewsAnalysis::noise("empty response");
    };

    match serde_json::from_str::<NewsAnalysis>(raw) {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::warn!(error = %e, "Scoring response did not match schema; defaulting to noise");
            NewsAnalysis::noise(format!("unparseable response: {e}"))
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelevanceScore;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    fn scorer(server: &MockServer) -> Scorer {
        Scorer::new("test-key", format!("{}/openai/v1", server.uri()), "openai/gpt-oss-120b", "rubric text")
            .unwrap()
    }

    #[tokio::test]
    async fn sends_schema_constrained_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "openai/gpt-oss-120b",
                "stream": false,
                "messages": [
                    { "role": "system", "content": "rubric text" },
                    { "role": "user", "content": "Title: Fab fire, Content: Output halted." }
                ],
                "response_format": {
                    "type": "json_schema",
                    "json_schema": { "name": "NewsAnalysis" }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"reasoning":"Major fab offline","entities":["TSMC"],"score":80}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let analysis = scorer(&server).score("Fab fire", "Output halted.").await.unwrap();
        assert_eq!(analysis.score, RelevanceScore::High);
        assert_eq!(analysis.entities, vec!["TSMC"]);
    }

    #[tokio::test]
    async fn malformed_payload_scores_as_noise() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"reasoning":"maybe","entities":[],"score":65}"#,
            )))
            .mount(&server)
            .await;

        let analysis = scorer(&server).score("t", "c").await.unwrap();
        assert_eq!(analysis.score, RelevanceScore::Noise);
        assert!(analysis.reasoning.starts_with("unparseable response"));
    }

    #[tokio::test]
    async fn api_error_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = scorer(&server).score("t", "c").await.unwrap_err();
        assert!(matches!(err, AppError::ScoringApi(msg) if msg.contains("invalid api key")));
    }

    #[test]
    fn missing_content_scores_as_noise() {
        assert_eq!(parse_analysis(None).score, RelevanceScore::Noise);
        assert_eq!(parse_analysis(Some("not json")).score, RelevanceScore::Noise);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
