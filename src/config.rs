use std::path::PathBuf;
use std::time::Duration;

/// 输入停止后多久发起搜索
pub const DEBOUNCE_MS: u64 = 300;

/// 失焦后延迟关闭面板，给点击建议行留出时间
pub const BLUR_GRACE_MS: u64 = 200;

/// 最近搜索保留条数
pub const MAX_RECENT_SEARCHES: usize = 10;

/// 每次请求的建议条数
pub const SUGGESTION_LIMIT: usize = 5;

/// 最近搜索在键值存储中的键
pub const RECENT_SEARCHES_KEY: &str = "recentSearches";

pub const INPUT_HINT: &str = "Search documents...";

pub const PLACEHOLDER_PROMPT: &str = "Start typing to search documents";

pub const DEFAULT_SERVER: &str = "http://localhost:8000";

/// 内置热门搜索
pub const POPULAR_SEARCHES: &[&str] = &["invoice", "contract", "receipt", "report", "meeting notes"];

/// 搜索栏运行时配置
#[derive(Debug, Clone)]
pub struct SearchBarConfig {
    pub debounce: Duration,
    pub blur_grace: Duration,
    pub max_recent: usize,
    pub limit: usize,
}

impl Default for SearchBarConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_MS),
            blur_grace: Duration::from_millis(BLUR_GRACE_MS),
            max_recent: MAX_RECENT_SEARCHES,
            limit: SUGGESTION_LIMIT,
        }
    }
}

/// 后端连接配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_url: String,
    pub token: Option<String>,
}

/// 数据保存目录
pub fn data_dir() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("DocSearch");
    std::fs::create_dir_all(&p).ok();
    p
}

pub fn storage_path() -> PathBuf {
    data_dir().join("storage.json")
}
