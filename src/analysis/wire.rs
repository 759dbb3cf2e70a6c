//! JSON bodies exchanged with the `generateContent` endpoint.

use serde::{Deserialize, Serialize};

use crate::capture::ImagePayload;

/// `finishReason` reported when the service withholds content.
pub const SAFETY_FINISH_REASON: &str = "SAFETY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl GenerateContentRequest {
    pub fn new(instruction: &str, prompt: &str, image: &ImagePayload) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                ],
            }],
            system_instruction: Content {
                parts: vec![Part::Text {
                    text: instruction.to_string(),
                }],
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// Text of the first part of the first candidate, if non-empty.
    pub fn diagnostic_text(&self) -> Option<&str> {
        self.first_candidate()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|text| !text.is_empty())
    }

    pub fn is_safety_blocked(&self) -> bool {
        self.first_candidate()
            .and_then(|candidate| candidate.finish_reason.as_deref())
            .is_some_and(|reason| reason == SAFETY_FINISH_REASON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_to_expected_shape() {
        let image = ImagePayload {
            mime_type: "image/jpeg".to_string(),
            data: "QUJD".to_string(),
        };
        let request = GenerateContentRequest::new("be a botanist", "look at this", &image);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{
                    "parts": [
                        { "text": "look at this" },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "QUJD" } }
                    ]
                }],
                "systemInstruction": { "parts": [{ "text": "be a botanist" }] }
            })
        );
    }

    #[test]
    fn response_extracts_first_text_part() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "## Healthy" }, { "text": "ignored" }] },
                  "finishReason": "STOP" },
                { "content": { "parts": [{ "text": "second" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(response.diagnostic_text(), Some("## Healthy"));
        assert!(!response.is_safety_blocked());
    }

    #[test]
    fn response_without_candidates_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.diagnostic_text().is_none());

        let empty: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "" }] } }]
        }))
        .unwrap();
        assert!(empty.diagnostic_text().is_none());
    }

    #[test]
    fn whitespace_only_text_is_still_a_report() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "  \n" }] } }]
        }))
        .unwrap();
        assert_eq!(response.diagnostic_text(), Some("  \n"));
    }

    #[test]
    fn safety_finish_reason_is_detected() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();
        assert!(response.is_safety_blocked());
        assert!(response.diagnostic_text().is_none());
    }
}
