//! 输入控制：查询文本、搜索防抖与请求序号

use std::time::{Duration, Instant};
use tracing::debug;

use crate::types::SearchRequest;

/// 一次待发送的搜索，`seq` 单调递增
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub seq: u64,
    pub request: SearchRequest,
}

#[derive(Debug)]
pub struct InputController {
    query: String,
    debounce: Duration,
    limit: usize,
    // 搜索防抖
    last_input_change: Option<Instant>,
    pending_search: bool,
    // 最近一次发出（或作废）的序号，只有它的响应会被采用
    latest_seq: u64,
    in_flight: bool,
}

impl InputController {
    pub fn new(debounce: Duration, limit: usize) -> Self {
        Self {
            query: String::new(),
            debounce,
            limit,
            last_input_change: None,
            pending_search: false,
            latest_seq: 0,
            in_flight: false,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.pending_search
    }

    #[cfg(test)]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// 文本立即生效；非空则重新计时，空则取消一切。
    /// 文本一变，在途请求即作废
    pub fn set_text(&mut self, text: &str, now: Instant) {
        if text == self.query {
            return;
        }
        self.query.clear();
        self.query.push_str(text);

        if self.query.is_empty() {
            self.cancel();
        } else {
            self.invalidate();
            self.pending_search = true;
            self.last_input_change = Some(now);
        }
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.cancel();
    }

    /// 距离下次触发还要多久，供界面安排重绘
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if !self.pending_search {
            return None;
        }
        let changed = self.last_input_change?;
        Some((changed + self.debounce).saturating_duration_since(now))
    }

    /// 安静期结束时发出一次请求
    pub fn poll(&mut self, now: Instant) -> Option<FetchTicket> {
        if !self.pending_search {
            return None;
        }
        let changed = self.last_input_change?;
        if now.duration_since(changed) < self.debounce {
            return None;
        }

        self.pending_search = false;
        self.latest_seq += 1;
        self.in_flight = true;
        debug!("发起搜索 #{}: '{}'", self.latest_seq, self.query);
        Some(FetchTicket {
            seq: self.latest_seq,
            request: SearchRequest {
                query: self.query.clone(),
                limit: self.limit,
            },
        })
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest_seq && self.in_flight
    }

    /// 当前请求已返回
    pub fn settle(&mut self, seq: u64) {
        if seq == self.latest_seq {
            self.in_flight = false;
        }
    }

    fn cancel(&mut self) {
        self.pending_search = false;
        self.last_input_change = None;
        self.invalidate();
    }

    // 跳过一个序号，让已发出的请求全部过期
    fn invalidate(&mut self) {
        if self.in_flight {
            self.latest_seq += 1;
            self.in_flight = false;
        }
    }
}
