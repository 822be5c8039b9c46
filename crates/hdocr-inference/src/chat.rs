//! OpenAI-compatible chat-completions payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::error::InferenceError;

/// Question asked for every invoice image.
pub const DEFAULT_PROMPT: &str = "Trích xuất giá trị của các cột tên hàng, số lượng, đơn giá, thành tiền của các sản phẩm trong hóa đơn.";

/// Chat-completions request body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Not part of the OpenAI schema, honoured by vLLM and friends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageUrl {
    pub url: String,
}

impl<'a> ChatRequest<'a> {
    /// Single user turn carrying the image followed by the question.
    pub fn single_image(model: &'a str, prompt: &'a str, data_url: String) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                    ContentPart::Text { text: prompt },
                ],
            }],
            max_tokens: 2048,
            temperature: 0.0,
            repetition_penalty: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Value,
}

/// Pull the assistant text out of a chat-completions response body.
///
/// `content` is usually a string, but some servers answer with a list of
/// `{"type": "text", "text": ...}` parts; those are joined in order.
pub(crate) fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::Response(e.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| InferenceError::Response("no choices in response".to_string()))?;

    let text = match choice.message.content {
        Value::String(s) => s,
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        Value::Null => String::new(),
        other => {
            return Err(InferenceError::Response(format!(
                "unexpected content type: {}",
                other
            )));
        }
    };

    if text.trim().is_empty() {
        return Err(InferenceError::EmptyResponse);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_string_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"| Tên hàng | Số lượng |"}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "| Tên hàng | Số lượng |");
    }

    #[test]
    fn test_parse_part_list_content() {
        let body = r#"{"choices":[{"message":{"content":[{"type":"text","text":"a "},{"type":"text","text":"b"}]}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "a b");
    }

    #[test]
    fn test_parse_empty_content() {
        let body = r#"{"choices":[{"message":{"content":"   "}}]}"#;
        assert!(matches!(
            parse_chat_response(body),
            Err(InferenceError::EmptyResponse)
        ));
    }

    #[test]
    fn test_parse_no_choices() {
        assert!(matches!(
            parse_chat_response(r#"{"choices":[]}"#),
            Err(InferenceError::Response(_))
        ));
        assert!(matches!(
            parse_chat_response("<html>bad gateway</html>"),
            Err(InferenceError::Response(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let mut request =
            ChatRequest::single_image("vintern", DEFAULT_PROMPT, "data:image/png;base64,AA".into());
        request.repetition_penalty = Some(2.5);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "vintern");
        assert_eq!(json["messages"][0]["content"][0]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][0]["image_url"]["url"],
            "data:image/png;base64,AA"
        );
        assert_eq!(json["messages"][0]["content"][1]["type"], "text");
        assert_eq!(json["repetition_penalty"], 2.5);
    }
}
