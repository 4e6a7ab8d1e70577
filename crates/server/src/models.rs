use rag_core::{Document, DocumentMetadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrieveRequest {
    #[serde(default)]
    pub query: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub question: String,
    pub context: Vec<Document>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<Value>,
    #[serde(default)]
    pub context: Option<Vec<Document>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub context: Vec<Document>,
}

/// Document metadata flattened next to the document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(flatten)]
    pub metadata: DocumentMetadata,
    pub content: String,
}

impl From<&Document> for Source {
    fn from(document: &Document) -> Self {
        Self {
            metadata: document.metadata.clone(),
            content: document.page_content.clone(),
        }
    }
}

/// Non-empty after trimming, or `None`.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// The trimmed text of a `query`/`question` field. Missing, null and blank
/// values are `None`; any other non-string value is rejected.
pub fn query_text<'a>(
    field: &str,
    value: Option<&'a Value>,
) -> Result<Option<&'a str>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(non_blank(Some(text.as_str()))),
        Some(other) => Err(ApiError::Validation(format!(
            "`{}` must be a string, got {}",
            field, other
        ))),
    }
}
