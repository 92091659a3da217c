//! OpenAI-compatible chat-completions wire format.
//!
//! Only the fields this crate sends or reads are modelled; unknown response
//! fields are ignored.

use serde::{Deserialize, Serialize};

use chat::{Message, RequestSpec};

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub n: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl<'a> From<&'a RequestSpec> for ChatCompletionRequest<'a> {
    fn from(spec: &'a RequestSpec) -> Self {
        Self {
            model: spec.model.as_str(),
            messages: spec.messages(),
            max_tokens: spec.sampling.max_tokens,
            n: spec.sampling.n,
            temperature: spec.sampling.temperature,
            top_p: spec.sampling.top_p,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    /// `null` for refusals and tool-only replies.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of every choice, in order. `null` content becomes `""`.
    pub fn into_texts(self) -> Vec<String> {
        self.choices
            .into_iter()
            .map(|c| c.message.content.unwrap_or_default())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chat::{ModelId, SamplingParams};

    use super::*;

    #[test]
    fn request_body_matches_openai_schema() {
        let spec = RequestSpec::new(ModelId::new("deepseek-chat").unwrap(), "hi")
            .with_system("be brief")
            .with_sampling(SamplingParams {
                max_tokens: 16,
                n: 2,
                temperature: 0.5,
                top_p: 1.0,
            });
        let body = serde_json::to_value(ChatCompletionRequest::from(&spec)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "deepseek-chat",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ],
                "max_tokens": 16,
                "n": 2,
                "temperature": 0.5,
                "top_p": 1.0
            })
        );
    }

    #[test]
    fn null_content_becomes_empty_text() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":null}},
                {"index":1,"message":{"role":"assistant","content":" ok "}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_texts(), vec!["".to_string(), " ok ".to_string()]);
    }
}
