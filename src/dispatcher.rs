//! 在异步运行时上执行搜索，结果通过通道回到界面线程

use anyhow::Result;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::input::FetchTicket;
use crate::searcher::SearchService;
use crate::types::SearchResponse;

pub struct FetchOutcome {
    pub seq: u64,
    pub query: String,
    pub result: Result<SearchResponse>,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

pub struct FetchDispatcher {
    handle: Handle,
    backend: Arc<dyn SearchService>,
    tx: UnboundedSender<FetchOutcome>,
    rx: UnboundedReceiver<FetchOutcome>,
    in_flight: Option<JoinHandle<()>>,
    waker: Option<Waker>,
}

impl FetchDispatcher {
    pub fn new(handle: Handle, backend: Arc<dyn SearchService>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            handle,
            backend,
            tx,
            rx,
            in_flight: None,
            waker: None,
        }
    }

    /// 结果到达时调用，用于唤醒界面重绘
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    pub fn backend_info(&self) -> String {
        self.backend.describe()
    }

    pub fn dispatch(&mut self, ticket: FetchTicket) {
        // 旧请求的结果反正会被丢弃，能取消就顺手取消
        self.cancel();

        let FetchTicket { seq, request } = ticket;
        let query = request.query.clone();
        let fut = self.backend.search(request);
        let tx = self.tx.clone();
        let waker = self.waker.clone();

        self.in_flight = Some(self.handle.spawn(async move {
            let result = fut.await;
            if let Err(e) = &result {
                warn!("搜索 #{} '{}' 失败: {:#}", seq, query, e);
            }
            if tx.send(FetchOutcome { seq, query, result }).is_err() {
                debug!("界面已关闭，丢弃搜索 #{}", seq);
                return;
            }
            if let Some(wake) = waker {
                wake();
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }

    /// 取出所有已到达的结果，不阻塞
    pub fn drain(&mut self) -> Vec<FetchOutcome> {
        let mut out = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            out.push(outcome);
        }
        out
    }

    #[allow(dead_code)]
    pub async fn next(&mut self) -> Option<FetchOutcome> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::{sample_documents, StaticSearchBackend};
    use crate::types::SearchRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn ticket(seq: u64, query: &str) -> FetchTicket {
        FetchTicket {
            seq,
            request: SearchRequest {
                query: query.to_string(),
                limit: 5,
            },
        }
    }

    #[tokio::test]
    async fn outcome_carries_ticket_sequence() {
        let backend = Arc::new(StaticSearchBackend::new(sample_documents()));
        let mut dispatcher = FetchDispatcher::new(Handle::current(), backend);

        dispatcher.dispatch(ticket(7, "test"));
        let outcome = dispatcher.next().await.unwrap();
        assert_eq!(outcome.seq, 7);
        assert_eq!(outcome.query, "test");
        assert_eq!(outcome.result.unwrap().documents.len(), 1);
    }

    #[tokio::test]
    async fn failures_are_delivered_not_panicked() {
        let backend = Arc::new(StaticSearchBackend::new(sample_documents()).failing_on("down"));
        let mut dispatcher = FetchDispatcher::new(Handle::current(), backend);

        dispatcher.dispatch(ticket(1, "down"));
        let outcome = dispatcher.next().await.unwrap();
        assert!(outcome.result.is_err());
    }

    #[tokio::test]
    async fn newer_dispatch_aborts_slow_predecessor() {
        let backend = Arc::new(
            StaticSearchBackend::new(sample_documents())
                .with_latency("slow", Duration::from_millis(200)),
        );
        let mut dispatcher = FetchDispatcher::new(Handle::current(), backend);

        dispatcher.dispatch(ticket(1, "slow"));
        dispatcher.dispatch(ticket(2, "test"));

        let outcome = dispatcher.next().await.unwrap();
        assert_eq!(outcome.seq, 2);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(dispatcher.drain().is_empty());
    }

    #[tokio::test]
    async fn waker_fires_once_per_outcome() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let backend = Arc::new(StaticSearchBackend::new(sample_documents()));
        let mut dispatcher = FetchDispatcher::new(Handle::current(), backend)
            .with_waker(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        dispatcher.dispatch(ticket(1, "invoice"));
        dispatcher.next().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
