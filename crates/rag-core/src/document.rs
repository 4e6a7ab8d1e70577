use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of segment a document was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Text,
    Image,
    Table,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentType::Text => "Text",
            DocumentType::Image => "Image",
            DocumentType::Table => "Table",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub page_number: u32,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imgbb_url: Option<String>,
}

impl DocumentMetadata {
    pub fn new(doc_type: DocumentType, page_number: u32, source: impl Into<String>) -> Self {
        Self {
            doc_type,
            page_number,
            source: source.into(),
            image_name: None,
            image_ext: None,
            image_base64: None,
            imgbb_url: None,
        }
    }

    pub fn text(page_number: u32, source: impl Into<String>) -> Self {
        Self::new(DocumentType::Text, page_number, source)
    }

    pub fn table(page_number: u32, source: impl Into<String>) -> Self {
        Self::new(DocumentType::Table, page_number, source)
    }

    /// Metadata for an extracted image. `imgbb_url` stays unset when the upload failed.
    pub fn image(
        page_number: u32,
        source: impl Into<String>,
        image_name: impl Into<String>,
        image_ext: impl Into<String>,
        image_base64: impl Into<String>,
        imgbb_url: Option<String>,
    ) -> Self {
        Self {
            image_name: Some(image_name.into()),
            image_ext: Some(image_ext.into()),
            image_base64: Some(image_base64.into()),
            imgbb_url,
            ..Self::new(DocumentType::Image, page_number, source)
        }
    }
}

/// A unit of retrievable content: either a whole extracted segment or a chunk of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(page_content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }

    /// Copy of this document carrying different content but the same metadata.
    pub fn with_content(&self, page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_serialize_document_type_as_plain_names() {
        assert_eq!(serde_json::to_string(&DocumentType::Text).unwrap(), "\"Text\"");
        assert_eq!(
            serde_json::to_string(&DocumentType::Image).unwrap(),
            "\"Image\""
        );
        assert_eq!(
            serde_json::to_string(&DocumentType::Table).unwrap(),
            "\"Table\""
        );
    }

    #[test]
    fn should_serialize_text_metadata_without_image_fields() {
        let metadata = DocumentMetadata::text(3, "./data/report.pdf");

        let value = serde_json::to_value(&metadata).unwrap();

        assert_eq!(
            value,
            json!({"type": "Text", "page_number": 3, "source": "./data/report.pdf"})
        );
    }

    #[test]
    fn should_serialize_image_metadata_with_all_fields() {
        let metadata = DocumentMetadata::image(
            2,
            "./data/report.pdf",
            "report_page_2_img_1.png",
            "png",
            "aGVsbG8=",
            Some("https://i.ibb.co/abc/img.png".to_string()),
        );

        let value = serde_json::to_value(&metadata).unwrap();

        assert_eq!(value["type"], "Image");
        assert_eq!(value["page_number"], 2);
        assert_eq!(value["image_name"], "report_page_2_img_1.png");
        assert_eq!(value["image_ext"], "png");
        assert_eq!(value["image_base64"], "aGVsbG8=");
        assert_eq!(value["imgbb_url"], "https://i.ibb.co/abc/img.png");
    }

    #[test]
    fn should_omit_hosted_url_when_upload_failed() {
        let metadata = DocumentMetadata::image(1, "a.pdf", "a_page_1_img_1.jpeg", "jpeg", "", None);

        let value = serde_json::to_value(&metadata).unwrap();

        assert!(value.get("imgbb_url").is_none());
        assert_eq!(value["image_name"], "a_page_1_img_1.jpeg");
    }

    #[test]
    fn should_deserialize_document_from_langchain_shape() {
        let json = r#"{
            "page_content": "Quarterly revenue grew.",
            "metadata": {"type": "Table", "page_number": 4, "source": "q.pdf"}
        }"#;

        let document: Document = serde_json::from_str(json).unwrap();

        assert_eq!(document.page_content, "Quarterly revenue grew.");
        assert_eq!(document.metadata.doc_type, DocumentType::Table);
        assert_eq!(document.metadata.page_number, 4);
        assert_eq!(document.metadata.source, "q.pdf");
        assert_eq!(document.metadata.imgbb_url, None);
    }

    #[test]
    fn should_keep_metadata_when_replacing_content() {
        let document = Document::new("full page text", DocumentMetadata::text(1, "notes.txt"));

        let chunk = document.with_content("page");

        assert_eq!(chunk.page_content, "page");
        assert_eq!(chunk.metadata, document.metadata);
    }
}
