use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::capture::{ImagePayload, DEFAULT_MIME_TYPE};

const PREVIEW_ELLIPSIS: &str = "...";

/// One persisted result of a successful diagnostic request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    #[serde(rename = "imageData")]
    pub image_data: String,
    #[serde(rename = "mimeType", default = "default_mime_type")]
    pub mime_type: String,
    #[serde(rename = "result")]
    pub result_text: String,
    /// Epoch milliseconds; never changes after creation.
    #[serde(rename = "timestamp")]
    pub created_at: u64,
    #[serde(rename = "isFavorite", default)]
    pub is_favorite: bool,
}

fn default_mime_type() -> String {
    DEFAULT_MIME_TYPE.to_string()
}

impl AnalysisRecord {
    /// Builds a fresh, non-favorite record stamped with the current time.
    pub fn new(image: &ImagePayload, result_text: impl Into<String>) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::with_timestamp(
            format!("analysis-{}", now.as_nanos()),
            image,
            result_text,
            u64::try_from(now.as_millis()).unwrap_or(u64::MAX),
        )
    }

    pub fn with_timestamp(
        id: impl Into<String>,
        image: &ImagePayload,
        result_text: impl Into<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id: id.into(),
            image_data: image.data.clone(),
            mime_type: image.mime_type.clone(),
            result_text: result_text.into(),
            created_at,
            is_favorite: false,
        }
    }

    pub fn image(&self) -> ImagePayload {
        ImagePayload {
            mime_type: self.mime_type.clone(),
            data: self.image_data.clone(),
        }
    }

    /// Leading `max_chars` characters of the report followed by an ellipsis.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.result_text.chars().take(max_chars).collect();
        preview.push_str(PREVIEW_ELLIPSIS);
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ImagePayload {
        ImagePayload {
            mime_type: "image/png".to_string(),
            data: "aGVsbG8=".to_string(),
        }
    }

    #[test]
    fn new_record_is_not_favorite_and_carries_image() {
        let record = AnalysisRecord::new(&payload(), "healthy");
        assert!(!record.is_favorite);
        assert!(record.id.starts_with("analysis-"));
        assert!(record.created_at > 0);
        assert_eq!(record.image(), payload());
    }

    #[test]
    fn json_shape_uses_stored_field_names() {
        let record = AnalysisRecord::with_timestamp("1", &payload(), "ok", 42);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["imageData"], "aGVsbG8=");
        assert_eq!(value["result"], "ok");
        assert_eq!(value["timestamp"], 42);
        assert_eq!(value["isFavorite"], false);
    }

    #[test]
    fn legacy_entries_without_optional_fields_deserialize() {
        let record: AnalysisRecord = serde_json::from_str(
            r#"{"id":"1700000000000","imageData":"abc","result":"leaf","timestamp":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(record.mime_type, DEFAULT_MIME_TYPE);
        assert!(!record.is_favorite);
    }

    #[test]
    fn preview_truncates_on_character_boundaries() {
        let record = AnalysisRecord::with_timestamp("1", &payload(), "Folha saudável", 1);
        assert_eq!(record.preview(13), "Folha saudáve...");
        assert_eq!(record.preview(200), "Folha saudável...");
    }
}
