//! 最近搜索：去重、限长、持久化

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::RECENT_SEARCHES_KEY;
use crate::storage::KeyValueStore;
use crate::types::RecentSearch;

pub struct RecentSearches {
    entries: Vec<RecentSearch>,
    cap: usize,
    store: Box<dyn KeyValueStore>,
}

impl RecentSearches {
    /// 启动时读取一次。键不存在、内容损坏或存储不可用都视为空列表
    pub fn load(store: Box<dyn KeyValueStore>, cap: usize) -> Self {
        let entries = match store.get(RECENT_SEARCHES_KEY) {
            Ok(Some(raw)) => parse_entries(&raw, Utc::now()),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("读取最近搜索失败: {:#}", e);
                Vec::new()
            }
        };

        let mut history = Self {
            entries,
            cap,
            store,
        };
        history.entries.truncate(cap);
        debug!("已加载 {} 条最近搜索", history.entries.len());
        history
    }

    pub fn entries(&self) -> &[RecentSearch] {
        &self.entries
    }

    pub fn queries(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.query.clone()).collect()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 记录一次搜索：移到最前，精确匹配去重，超出上限截断
    pub fn record(&mut self, query: &str, at: DateTime<Utc>) {
        if query.is_empty() || self.cap == 0 {
            return;
        }
        self.entries.retain(|e| e.query != query);
        self.entries.insert(0, RecentSearch::new(query, at));
        self.entries.truncate(self.cap);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("序列化最近搜索失败: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(RECENT_SEARCHES_KEY, &json) {
            warn!("保存最近搜索失败: {:#}", e);
        }
    }
}

/// 兼容两种格式：带时间的记录数组，或旧版纯字符串数组
fn parse_entries(raw: &str, now: DateTime<Utc>) -> Vec<RecentSearch> {
    if let Ok(entries) = serde_json::from_str::<Vec<RecentSearch>>(raw) {
        return entries;
    }
    if let Ok(queries) = serde_json::from_str::<Vec<String>>(raw) {
        return queries
            .into_iter()
            .filter(|q| !q.is_empty())
            .map(|q| RecentSearch::new(q, now))
            .collect();
    }
    warn!("最近搜索数据损坏，已忽略");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonFileStore, MemoryStore};
    use anyhow::{anyhow, Result};
    use chrono::TimeZone;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("storage unavailable"))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("quota exceeded"))
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn record_moves_duplicate_to_front() {
        let mut history = RecentSearches::load(Box::new(MemoryStore::new()), 10);
        history.record("alpha", at(0));
        history.record("beta", at(1));
        history.record("alpha", at(2));

        assert_eq!(history.queries(), vec!["alpha", "beta"]);
        assert_eq!(history.entries()[0].searched_at, at(2));
    }

    #[test]
    fn record_is_case_sensitive() {
        let mut history = RecentSearches::load(Box::new(MemoryStore::new()), 10);
        history.record("Report", at(0));
        history.record("report", at(1));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn cap_is_never_exceeded() {
        let mut history = RecentSearches::load(Box::new(MemoryStore::new()), 3);
        for (i, q) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            history.record(q, at(i as i64));
        }
        assert_eq!(history.queries(), vec!["e", "d", "c"]);
    }

    #[test]
    fn record_and_clear_write_through_to_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut history = RecentSearches::load(Box::new(JsonFileStore::new(path.clone())), 10);
        history.record("lease", at(1));
        history.record("invoice", at(5));

        let reloaded = RecentSearches::load(Box::new(JsonFileStore::new(path.clone())), 10);
        assert_eq!(reloaded.queries(), vec!["invoice", "lease"]);
        assert_eq!(reloaded.entries()[0].searched_at, at(5));

        history.clear();
        let raw = JsonFileStore::new(path.clone()).get(RECENT_SEARCHES_KEY).unwrap();
        assert_eq!(raw.as_deref(), Some("[]"));
        assert!(RecentSearches::load(Box::new(JsonFileStore::new(path)), 10).is_empty());
    }

    #[test]
    fn legacy_string_array_is_accepted() {
        let store = MemoryStore::with_value(RECENT_SEARCHES_KEY, r#"["tax", "lease", ""]"#);
        let history = RecentSearches::load(Box::new(store), 10);
        assert_eq!(history.queries(), vec!["tax", "lease"]);
    }

    #[test]
    fn malformed_value_starts_empty() {
        let store = MemoryStore::with_value(RECENT_SEARCHES_KEY, "{oops");
        let history = RecentSearches::load(Box::new(store), 10);
        assert!(history.is_empty());
    }

    #[test]
    fn oversized_stored_list_is_truncated() {
        let store = MemoryStore::with_value(RECENT_SEARCHES_KEY, r#"["a","b","c","d"]"#);
        let history = RecentSearches::load(Box::new(store), 2);
        assert_eq!(history.queries(), vec!["a", "b"]);
    }

    #[test]
    fn broken_store_never_blocks_recording() {
        let mut history = RecentSearches::load(Box::new(BrokenStore), 10);
        assert!(history.is_empty());
        history.record("still works", at(0));
        assert_eq!(history.queries(), vec!["still works"]);
    }

    #[test]
    fn clear_empties_list() {
        let mut history = RecentSearches::load(Box::new(MemoryStore::new()), 10);
        history.record("x", at(0));
        history.clear();
        assert!(history.is_empty());
    }
}
