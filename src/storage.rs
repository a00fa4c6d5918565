//! 键值存储，用于持久化最近搜索

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

pub trait KeyValueStore {
    /// 键不存在时返回 `Ok(None)`
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// 以单个 JSON 对象文件保存所有键
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let data = std::fs::read_to_string(&self.path)
            .with_context(|| format!("读取存储文件失败: {}", self.path.display()))?;
        if data.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&data)
            .with_context(|| format!("存储文件格式错误: {}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // 文件损坏时直接覆盖，不阻塞写入
        let mut all = self.read_all().unwrap_or_default();
        all.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&all)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("写入存储文件失败: {}", self.path.display()))
    }
}

#[allow(dead_code)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("storage.json"));
        assert_eq!(store.get("recentSearches").unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = JsonFileStore::new(path.clone());
        store.set("a", "1").unwrap();
        store.set("b", "[\"x\"]").unwrap();

        let reopened = JsonFileStore::new(path);
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("[\"x\"]"));
    }

    #[test]
    fn file_store_corrupt_file_errors_on_read_but_recovers_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = JsonFileStore::new(path);
        assert!(store.get("a").is_err());

        store.set("a", "fresh").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("fresh"));
    }
}
