//! 全局搜索栏状态机
//!
//! 面板状态：Closed → Placeholder（获得焦点且无输入）⇄ Results（有输入）→ Closed
//! （失焦超时、Esc 或完成选择）。界面层每帧调用 [`SearchBar::tick`]，把返回的
//! [`FetchTicket`] 交给调度器，再把结果通过 [`SearchBar::apply`] 送回。

use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::{SearchBarConfig, INPUT_HINT};
use crate::dispatcher::FetchOutcome;
use crate::history::RecentSearches;
use crate::input::{FetchTicket, InputController};
use crate::navigation::{Navigator, Route};
use crate::suggestions::{PanelView, PopularSearches, SuggestionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Placeholder,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Enter,
    Escape,
}

/// 一帧的渲染数据
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBarView {
    pub query: String,
    pub hint: &'static str,
    pub show_clear: bool,
    pub state: PanelState,
    pub panel: Option<PanelView>,
    pub highlighted: Option<usize>,
}

pub struct SearchBar<N: Navigator> {
    config: SearchBarConfig,
    input: InputController,
    store: SuggestionStore,
    history: RecentSearches,
    popular: Box<dyn PopularSearches>,
    navigator: N,
    open: bool,
    highlighted: Option<usize>,
    blur_deadline: Option<Instant>,
    pointer_on_panel: bool,
    last_selected: Option<String>,
}

impl<N: Navigator> SearchBar<N> {
    pub fn new(
        config: SearchBarConfig,
        history: RecentSearches,
        popular: Box<dyn PopularSearches>,
        navigator: N,
    ) -> Self {
        let input = InputController::new(config.debounce, config.limit);
        Self {
            config,
            input,
            store: SuggestionStore::new(),
            history,
            popular,
            navigator,
            open: false,
            highlighted: None,
            blur_deadline: None,
            pointer_on_panel: false,
            last_selected: None,
        }
    }

    pub fn query(&self) -> &str {
        self.input.query()
    }

    #[allow(dead_code)]
    pub fn store(&self) -> &SuggestionStore {
        &self.store
    }

    #[allow(dead_code)]
    pub fn history(&self) -> &RecentSearches {
        &self.history
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    #[allow(dead_code)]
    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    #[allow(dead_code)]
    pub fn last_selected(&self) -> Option<&str> {
        self.last_selected.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// 防抖计时中或请求在途
    pub fn is_waiting(&self) -> bool {
        self.input.has_pending() || self.store.is_loading()
    }

    pub fn panel_state(&self) -> PanelState {
        if !self.open {
            PanelState::Closed
        } else if self.input.is_empty() {
            PanelState::Placeholder
        } else {
            PanelState::Results
        }
    }

    // ---- 输入 ----

    pub fn set_text(&mut self, text: &str, now: Instant) {
        if text == self.input.query() {
            return;
        }
        self.input.set_text(text, now);
        self.highlighted = None;
        self.open = true;
        if self.input.is_empty() {
            // 同步清空，不等网络
            self.store.clear();
        }
    }

    /// 清空按钮：文本、待发请求、建议列表一并清掉，焦点回到输入框
    pub fn clear(&mut self) {
        self.input.clear();
        self.store.clear();
        self.highlighted = None;
        self.focus();
    }

    pub fn tick(&mut self, now: Instant) -> Option<FetchTicket> {
        if let Some(deadline) = self.blur_deadline {
            if now >= deadline {
                debug!("失焦超时，关闭面板");
                self.close();
            }
        }

        let ticket = self.input.poll(now)?;
        self.store.begin_fetch();
        Some(ticket)
    }

    /// 下一次需要 tick 的时间
    pub fn next_wake(&self, now: Instant) -> Option<Duration> {
        let blur = self
            .blur_deadline
            .map(|d| d.saturating_duration_since(now));
        match (self.input.time_until_due(now), blur) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// 应用搜索结果；序号过期或查询已与输入框不一致的结果直接丢弃
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        if !self.input.is_current(outcome.seq) || outcome.query != self.input.query() {
            debug!("丢弃过期结果 #{} '{}'", outcome.seq, outcome.query);
            return false;
        }
        self.input.settle(outcome.seq);

        match outcome.result {
            Ok(response) => {
                self.store.apply_success(response);
                self.highlighted = None;
            }
            Err(e) => {
                self.store.apply_failure(format!("Search failed: {:#}", e));
            }
        }
        true
    }

    // ---- 焦点 ----

    pub fn focus(&mut self) {
        self.open = true;
        self.blur_deadline = None;
    }

    /// 延迟关闭，让面板上的点击先生效
    pub fn blur(&mut self, now: Instant) {
        if self.pointer_on_panel {
            return;
        }
        self.blur_deadline = Some(now + self.config.blur_grace);
    }

    pub fn pointer_down_on_panel(&mut self) {
        self.pointer_on_panel = true;
        self.blur_deadline = None;
    }

    pub fn pointer_released(&mut self) {
        self.pointer_on_panel = false;
    }

    // ---- 键盘 ----

    pub fn handle_key(&mut self, key: NavKey, now: Instant) {
        match key {
            NavKey::Escape => self.close(),
            NavKey::Down | NavKey::Up => self.move_highlight(key),
            NavKey::Enter => {
                match (self.panel_state(), self.highlighted) {
                    (PanelState::Results, Some(i)) => {
                        self.select_result(i);
                    }
                    (PanelState::Results, None) => {
                        self.submit_search();
                    }
                    (PanelState::Placeholder, Some(i)) => {
                        self.pick_term(i, now);
                    }
                    _ => {}
                }
            }
        }
    }

    // 到边界停住，不循环
    fn move_highlight(&mut self, key: NavKey) {
        if !self.open {
            return;
        }
        let len = self.current_panel().map(|p| p.len()).unwrap_or(0);
        if len == 0 {
            self.highlighted = None;
            return;
        }
        self.highlighted = match (key, self.highlighted) {
            (NavKey::Down, None) => Some(0),
            (NavKey::Down, Some(i)) => Some((i + 1).min(len - 1)),
            (NavKey::Up, Some(i)) => Some(i.saturating_sub(1).min(len - 1)),
            (_, current) => current,
        };
    }

    // ---- 选择 ----

    /// 选中一条结果：记入最近搜索、关闭面板、跳转文档
    pub fn select_result(&mut self, index: usize) -> bool {
        let Some(hit) = self.store.items().get(index) else {
            return false;
        };
        let id = hit.id.clone();
        let query = self.input.query().to_string();

        self.history.record(&query, Utc::now());
        info!("选中文档 {} (查询 '{}')", id, query);
        self.last_selected = Some(id.clone());
        self.close();
        self.navigator.navigate(&Route::Document(id));
        true
    }

    /// 跳到完整搜索结果页；没有结果时不做任何事
    pub fn submit_search(&mut self) -> bool {
        if self.input.is_empty() || self.store.items().is_empty() {
            return false;
        }
        let query = self.input.query().to_string();
        self.history.record(&query, Utc::now());
        self.close();
        self.navigator.navigate(&Route::SearchResults(query));
        true
    }

    /// 占位视图里点选最近/热门搜索词：填入输入框并开始搜索
    pub fn pick_term(&mut self, index: usize, now: Instant) -> bool {
        let Some(term) = self
            .current_panel()
            .and_then(|p| p.placeholder_term(index).map(str::to_string))
        else {
            return false;
        };
        self.set_text(&term, now);
        true
    }

    pub fn clear_recent(&mut self) {
        self.history.clear();
        self.highlighted = None;
    }

    fn close(&mut self) {
        self.open = false;
        self.highlighted = None;
        self.blur_deadline = None;
        self.pointer_on_panel = false;
    }

    // ---- 视图 ----

    pub fn current_panel(&self) -> Option<PanelView> {
        match self.panel_state() {
            PanelState::Closed => None,
            PanelState::Placeholder => Some(
                self.store
                    .placeholder_view(self.history.queries(), self.popular.popular()),
            ),
            PanelState::Results => Some(self.store.results_view()),
        }
    }

    pub fn view(&self) -> SearchBarView {
        SearchBarView {
            query: self.input.query().to_string(),
            hint: INPUT_HINT,
            show_clear: !self.input.is_empty(),
            state: self.panel_state(),
            panel: self.current_panel(),
            highlighted: self.highlighted,
        }
    }
}
