use anyhow::{anyhow, Context, Result};
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

use crate::config::ServerConfig;
use crate::types::{DocumentHit, SearchRequest, SearchResponse};

pub type SearchFuture = Pin<Box<dyn Future<Output = Result<SearchResponse>> + Send + 'static>>;

/// 文档搜索后端
pub trait SearchService: Send + Sync {
    fn search(&self, request: SearchRequest) -> SearchFuture;

    /// 状态栏展示用
    fn describe(&self) -> String;
}

/// 远程文档服务
pub struct HttpSearchBackend {
    client: reqwest::Client,
    server: ServerConfig,
}

impl HttpSearchBackend {
    pub fn new(server: ServerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("创建 HTTP 客户端失败")?;
        Ok(Self { client, server })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/search/enhanced", self.server.base_url.trim_end_matches('/'))
    }
}

impl SearchService for HttpSearchBackend {
    fn search(&self, request: SearchRequest) -> SearchFuture {
        let mut req = self.client.get(self.endpoint()).query(&[
            ("query", request.query.clone()),
            ("limit", request.limit.to_string()),
            ("include_snippets", "false".to_string()),
        ]);
        if let Some(token) = self.server.token.as_deref() {
            req = req.bearer_auth(token);
        }

        Box::pin(async move {
            let resp = req.send().await.context("搜索请求发送失败")?;
            let status = resp.status();
            if !status.is_success() {
                return Err(anyhow!("搜索服务返回 {}", status));
            }
            let body: SearchResponse = resp.json().await.context("搜索响应解析失败")?;
            debug!("'{}' 返回 {} / {} 条", request.query, body.documents.len(), body.total);
            Ok(body)
        })
    }

    fn describe(&self) -> String {
        self.server.base_url.clone()
    }
}

/// 内存文档集合，用于离线演示与测试
#[derive(Default)]
pub struct StaticSearchBackend {
    documents: Vec<DocumentHit>,
    latency: HashMap<String, Duration>,
    failing: HashSet<String>,
}

impl StaticSearchBackend {
    pub fn new(documents: Vec<DocumentHit>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    /// 指定查询的响应延迟
    #[allow(dead_code)]
    pub fn with_latency(mut self, query: &str, latency: Duration) -> Self {
        self.latency.insert(query.to_string(), latency);
        self
    }

    /// 指定查询总是失败
    #[allow(dead_code)]
    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    fn lookup(&self, request: &SearchRequest) -> SearchResponse {
        let needle = request.query.to_lowercase();
        let matched: Vec<DocumentHit> = self
            .documents
            .iter()
            .filter(|d| {
                d.display_name().to_lowercase().contains(&needle)
                    || d.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        let total = matched.len();
        SearchResponse {
            documents: matched.into_iter().take(request.limit).collect(),
            total,
        }
    }
}

impl SearchService for StaticSearchBackend {
    fn search(&self, request: SearchRequest) -> SearchFuture {
        let delay = self.latency.get(&request.query).copied();
        let outcome = if self.failing.contains(&request.query) {
            Err(anyhow!("backend unavailable"))
        } else {
            Ok(self.lookup(&request))
        };

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            outcome
        })
    }

    fn describe(&self) -> String {
        format!("离线模式 ({} 个文档)", self.documents.len())
    }
}

pub fn document(id: &str, filename: &str, size: u64, tags: &[&str], rank: f32) -> DocumentHit {
    let mime_type = match filename.rsplit('.').next().map(|e| e.to_lowercase()) {
        Some(ext) if ext == "pdf" => "application/pdf",
        Some(ext) if ext == "png" || ext == "jpg" || ext == "jpeg" => "image/png",
        Some(ext) if ext == "txt" || ext == "md" => "text/plain",
        _ => "application/octet-stream",
    };
    DocumentHit {
        id: id.to_string(),
        filename: filename.to_string(),
        original_filename: Some(filename.to_string()),
        file_size: size,
        mime_type: mime_type.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).single().unwrap_or_default(),
        has_ocr_text: true,
        search_rank: rank,
    }
}

/// 离线演示数据
pub fn sample_documents() -> Vec<DocumentHit> {
    vec![
        document("1", "test.pdf", 1024, &["test"], 0.85),
        document("2", "invoice-2023-04.pdf", 48_213, &["invoice", "finance"], 0.81),
        document("3", "contract-lease.pdf", 312_004, &["contract", "legal"], 0.77),
        document("4", "receipt-grocery.png", 1_840_331, &["receipt"], 0.64),
        document("5", "quarterly-report.pdf", 5_402_112, &["report", "finance"], 0.58),
        document("6", "meeting-notes.txt", 2_048, &["meeting notes"], 0.42),
    ]
}
