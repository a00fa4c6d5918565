use reqwest::Url;
use tracing::{info, warn};

/// 跳转目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Document(String),
    SearchResults(String),
}

impl Route {
    /// 站内路径，id 与查询都做转义
    pub fn path(&self) -> String {
        match self {
            Self::Document(id) => local_path(|url| {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.clear().push("documents").push(id);
                }
            }),
            Self::SearchResults(query) => local_path(|url| {
                url.set_path("/search");
                url.query_pairs_mut().append_pair("query", query);
            }),
        }
    }
}

// 借用 Url 做编码，只取路径和查询部分
fn local_path(build: impl FnOnce(&mut Url)) -> String {
    let mut url = match Url::parse("http://localhost/") {
        Ok(url) => url,
        Err(_) => return "/".to_string(),
    };
    build(&mut url);
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

pub trait Navigator {
    fn navigate(&mut self, route: &Route);
}

/// 在系统浏览器中打开 Web 端页面
pub struct BrowserNavigator {
    base: String,
}

impl BrowserNavigator {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn url_for(&self, route: &Route) -> anyhow::Result<Url> {
        let base = Url::parse(&self.base)?;
        Ok(base.join(&route.path())?)
    }
}

impl Navigator for BrowserNavigator {
    fn navigate(&mut self, route: &Route) {
        let url = match self.url_for(route) {
            Ok(url) => url,
            Err(e) => {
                warn!("无法生成跳转地址 {:?}: {}", route, e);
                return;
            }
        };
        info!("打开 {}", url);

        // 异步打开，不阻塞界面
        std::thread::spawn(move || {
            if let Err(e) = open::that(url.as_str()) {
                warn!("打开浏览器失败: {}", e);
            }
        });
    }
}

/// 只记录跳转，供测试与场景回放使用
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub visited: Vec<String>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, route: &Route) {
        self.visited.push(route.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_route() {
        assert_eq!(Route::Document("42".to_string()).path(), "/documents/42");
    }

    #[test]
    fn search_route_encodes_query() {
        let route = Route::SearchResults("tax & lease 2023".to_string());
        assert_eq!(route.path(), "/search?query=tax+%26+lease+2023");
    }

    #[test]
    fn document_id_is_escaped_as_one_segment() {
        let route = Route::Document("a/b?c#d".to_string());
        assert_eq!(route.path(), "/documents/a%2Fb%3Fc%23d");

        let nav = BrowserNavigator::new("http://docs.local:8000/app/");
        let url = nav.url_for(&route).unwrap();
        assert_eq!(url.path(), "/documents/a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn browser_url_joins_server() {
        let nav = BrowserNavigator::new("http://docs.local:8000/");
        let url = nav.url_for(&Route::Document("abc".to_string())).unwrap();
        assert_eq!(url.as_str(), "http://docs.local:8000/documents/abc");
    }

    #[test]
    fn recording_navigator_keeps_order() {
        let mut nav = RecordingNavigator::default();
        nav.navigate(&Route::Document("1".to_string()));
        nav.navigate(&Route::SearchResults("q".to_string()));
        assert_eq!(nav.visited, vec!["/documents/1", "/search?query=q"]);
    }
}
