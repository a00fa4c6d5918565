use crate::config::{PLACEHOLDER_PROMPT, POPULAR_SEARCHES};
use crate::types::{DocumentHit, SearchResponse};

/// 热门搜索来源
pub trait PopularSearches {
    fn popular(&self) -> Vec<String>;
}

/// 固定列表
pub struct StaticPopular(pub Vec<String>);

impl Default for StaticPopular {
    fn default() -> Self {
        Self(POPULAR_SEARCHES.iter().map(|s| s.to_string()).collect())
    }
}

impl PopularSearches for StaticPopular {
    fn popular(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// 单行建议的渲染数据
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRow {
    pub id: String,
    pub name: String,
    pub size: String,
    pub tags: Vec<String>,
    pub has_text: bool,
    pub relevance: u8,
    pub icon: &'static str,
}

impl From<&DocumentHit> for SuggestionRow {
    fn from(hit: &DocumentHit) -> Self {
        Self {
            id: hit.id.clone(),
            name: hit.display_name().to_string(),
            size: format_size(hit.file_size),
            tags: hit.tags.clone(),
            has_text: hit.has_ocr_text,
            relevance: (hit.search_rank.clamp(0.0, 1.0) * 100.0).round() as u8,
            icon: mime_icon(&hit.mime_type),
        }
    }
}

/// 面板内容
#[derive(Debug, Clone, PartialEq)]
pub enum PanelView {
    Placeholder {
        prompt: &'static str,
        recent: Vec<String>,
        popular: Vec<String>,
    },
    Results {
        rows: Vec<SuggestionRow>,
        loading: bool,
        total: usize,
        error: Option<String>,
    },
}

impl PanelView {
    /// 可用方向键选中的条目数
    pub fn len(&self) -> usize {
        match self {
            Self::Placeholder { recent, popular, .. } => recent.len() + popular.len(),
            Self::Results { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 占位视图中第 index 项对应的搜索词（最近在前，热门在后）
    pub fn placeholder_term(&self, index: usize) -> Option<&str> {
        match self {
            Self::Placeholder { recent, popular, .. } => recent
                .iter()
                .chain(popular.iter())
                .nth(index)
                .map(String::as_str),
            Self::Results { .. } => None,
        }
    }
}

/// 建议列表状态，不做任何 I/O
#[derive(Debug, Default)]
pub struct SuggestionStore {
    items: Vec<DocumentHit>,
    total: usize,
    loading: bool,
    error: Option<String>,
}

impl SuggestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[DocumentHit] {
        &self.items
    }

    #[allow(dead_code)]
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[allow(dead_code)]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin_fetch(&mut self) {
        self.loading = true;
    }

    /// 整体替换，不做增量合并
    pub fn apply_success(&mut self, response: SearchResponse) {
        self.items = response.documents;
        self.total = response.total;
        self.loading = false;
        self.error = None;
    }

    /// 保留之前的结果，只记录错误
    pub fn apply_failure(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.total = 0;
        self.loading = false;
        self.error = None;
    }

    pub fn placeholder_view(&self, recent: Vec<String>, popular: Vec<String>) -> PanelView {
        PanelView::Placeholder {
            prompt: PLACEHOLDER_PROMPT,
            recent,
            popular,
        }
    }

    pub fn results_view(&self) -> PanelView {
        PanelView::Results {
            rows: self.items.iter().map(SuggestionRow::from).collect(),
            loading: self.loading,
            total: self.total,
            error: self.error.clone(),
        }
    }
}

/// 文件大小转为可读字符串，如 `1.0 KB`
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn mime_icon(mime: &str) -> &'static str {
    match mime {
        "application/pdf" => "📕",
        m if m.starts_with("image/") => "🖼",
        m if m.starts_with("text/") => "📝",
        m if m.contains("word") || m.contains("opendocument.text") => "📝",
        m if m.contains("sheet") || m.contains("excel") => "📈",
        m if m.contains("presentation") || m.contains("powerpoint") => "📊",
        _ => "📄",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn hit(id: &str, name: &str) -> DocumentHit {
        DocumentHit {
            id: id.to_string(),
            filename: name.to_string(),
            original_filename: None,
            file_size: 1024,
            mime_type: "application/pdf".to_string(),
            tags: vec!["test".to_string()],
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            has_ocr_text: true,
            search_rank: 0.85,
        }
    }

    #[test]
    fn row_shows_name_size_tags_and_text_flag() {
        let row = SuggestionRow::from(&hit("1", "test.pdf"));
        assert_eq!(row.name, "test.pdf");
        assert_eq!(row.size, "1.0 KB");
        assert_eq!(row.tags, vec!["test"]);
        assert!(row.has_text);
        assert_eq!(row.relevance, 85);
        assert_eq!(row.icon, "📕");
    }

    #[test]
    fn success_replaces_whole_list_in_received_order() {
        let mut store = SuggestionStore::new();
        store.apply_success(SearchResponse {
            documents: vec![hit("1", "a.pdf"), hit("2", "b.pdf")],
            total: 2,
        });
        store.apply_success(SearchResponse {
            documents: vec![hit("9", "z.pdf"), hit("3", "c.pdf")],
            total: 40,
        });

        let ids: Vec<_> = store.items().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "3"]);
        assert_eq!(store.total(), 40);
    }

    #[test]
    fn failure_keeps_previous_items() {
        let mut store = SuggestionStore::new();
        store.apply_success(SearchResponse {
            documents: vec![hit("1", "a.pdf")],
            total: 1,
        });
        store.begin_fetch();
        store.apply_failure("connection refused".to_string());

        assert_eq!(store.items().len(), 1);
        assert!(!store.is_loading());
        assert_eq!(store.error(), Some("connection refused"));

        match store.results_view() {
            PanelView::Results { rows, error, .. } => {
                assert_eq!(rows.len(), 1);
                assert!(error.is_some());
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn placeholder_terms_list_recent_before_popular() {
        let store = SuggestionStore::new();
        let view = store.placeholder_view(
            vec!["mine".to_string()],
            vec!["invoice".to_string(), "contract".to_string()],
        );
        assert_eq!(view.len(), 3);
        assert_eq!(view.placeholder_term(0), Some("mine"));
        assert_eq!(view.placeholder_term(2), Some("contract"));
        assert_eq!(view.placeholder_term(3), None);
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
