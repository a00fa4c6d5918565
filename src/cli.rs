use clap::Parser;
use serde_json::json;
use std::sync::Arc;

use crate::config::{
    SearchBarConfig, ServerConfig, DEBOUNCE_MS, DEFAULT_SERVER, MAX_RECENT_SEARCHES, SUGGESTION_LIMIT,
};
use crate::history::RecentSearches;
use crate::searcher::SearchService;
use crate::storage::KeyValueStore;
use crate::types::SearchRequest;

#[derive(Parser, Debug)]
#[command(author, version, about = "DocSearch 全局文档搜索栏", long_about = None)]
pub struct CliArgs {
    /// 文档服务地址
    #[arg(long = "server", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// 访问令牌（Bearer）
    #[arg(long = "token")]
    pub token: Option<String>,

    /// 输入防抖间隔（毫秒）
    #[arg(long = "debounce-ms", default_value_t = DEBOUNCE_MS)]
    pub debounce_ms: u64,

    /// 每次请求的建议条数
    #[arg(short = 'm', long = "limit", default_value_t = SUGGESTION_LIMIT)]
    pub limit: usize,

    /// 使用内置示例文档，不连接服务
    #[arg(long = "offline")]
    pub offline: bool,

    /// 无界面模式：搜索一次并输出 JSON
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,

    /// 无界面模式：输出最近搜索
    #[arg(long = "recent")]
    pub recent: bool,

    /// 输出调试日志
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn is_headless(&self) -> bool {
        self.query.is_some() || self.recent
    }

    pub fn search_bar_config(&self) -> SearchBarConfig {
        SearchBarConfig {
            debounce: std::time::Duration::from_millis(self.debounce_ms),
            limit: self.limit,
            max_recent: MAX_RECENT_SEARCHES,
            ..SearchBarConfig::default()
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            base_url: self.server.clone(),
            token: self.token.clone(),
        }
    }
}

// CLI入口
pub async fn run_cli(
    args: &CliArgs,
    backend: Arc<dyn SearchService>,
    store: Box<dyn KeyValueStore>,
) -> anyhow::Result<()> {
    let output = if args.recent {
        let history = RecentSearches::load(store, MAX_RECENT_SEARCHES);
        json!({
            "code": 0,
            "msg": "success",
            "recent": history.entries(),
        })
    } else {
        let query = args.query.clone().unwrap_or_default();
        let response = backend
            .search(SearchRequest {
                query: query.clone(),
                limit: args.limit,
            })
            .await?;
        json!({
            "code": 0,
            "msg": "success",
            "query": query,
            "backend": backend.describe(),
            "total": response.total,
            "results": response.documents,
        })
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_config_constants() {
        let args = CliArgs::parse_from(["docsearch"]);
        assert!(!args.is_headless());
        assert_eq!(args.server, DEFAULT_SERVER);
        let config = args.search_bar_config();
        assert_eq!(config.debounce.as_millis() as u64, DEBOUNCE_MS);
        assert_eq!(config.limit, SUGGESTION_LIMIT);
    }

    #[test]
    fn headless_flags() {
        let args = CliArgs::parse_from(["docsearch", "-q", "invoice", "--offline", "-m", "3"]);
        assert!(args.is_headless());
        assert!(args.offline);
        assert_eq!(args.query.as_deref(), Some("invoice"));
        assert_eq!(args.search_bar_config().limit, 3);

        let args = CliArgs::parse_from(["docsearch", "--recent", "--token", "abc"]);
        assert!(args.is_headless());
        assert_eq!(args.server_config().token.as_deref(), Some("abc"));
    }
}
