use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 搜索建议条目（后端返回的单个文档）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHit {
    pub id: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    pub file_size: u64,
    pub mime_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub has_ocr_text: bool,
    /// 相关度，取值 [0, 1]，按后端顺序展示，本地不重新排序
    #[serde(default)]
    pub search_rank: f32,
}

impl DocumentHit {
    /// 展示名：优先使用上传时的原始文件名
    pub fn display_name(&self) -> &str {
        self.original_filename.as_deref().unwrap_or(&self.filename)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
}

/// 后端响应信封
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub documents: Vec<DocumentHit>,
    pub total: usize,
}

/// 最近搜索记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub query: String,
    pub searched_at: DateTime<Utc>,
}

impl RecentSearch {
    pub fn new(query: impl Into<String>, searched_at: DateTime<Utc>) -> Self {
        Self {
            query: query.into(),
            searched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_envelope() {
        let body = r#"{
            "documents": [{
                "id": "1",
                "filename": "test.pdf",
                "original_filename": "test.pdf",
                "file_size": 1024,
                "mime_type": "application/pdf",
                "tags": ["test"],
                "created_at": "2023-01-01T00:00:00Z",
                "has_ocr_text": true,
                "search_rank": 0.85
            }],
            "total": 1
        }"#;

        let resp: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.total, 1);
        let hit = &resp.documents[0];
        assert_eq!(hit.display_name(), "test.pdf");
        assert_eq!(hit.tags, vec!["test".to_string()]);
        assert!(hit.has_ocr_text);
        assert!((hit.search_rank - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_optional_fields_default() {
        let body = r#"{
            "id": "7",
            "filename": "scan.png",
            "file_size": 0,
            "mime_type": "image/png",
            "created_at": "2024-05-01T12:00:00Z"
        }"#;

        let hit: DocumentHit = serde_json::from_str(body).unwrap();
        assert!(hit.tags.is_empty());
        assert!(!hit.has_ocr_text);
        assert_eq!(hit.original_filename, None);
        assert_eq!(hit.display_name(), "scan.png");
    }
}
