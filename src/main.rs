mod cli;
mod config;
mod dispatcher;
mod gui;
mod history;
mod input;
mod navigation;
mod search_bar;
mod searcher;
mod storage;
mod suggestions;
mod types;

use crate::cli::CliArgs;
use crate::gui::DocSearchApp;
use crate::history::RecentSearches;
use crate::navigation::BrowserNavigator;
use crate::search_bar::SearchBar;
use crate::searcher::{sample_documents, HttpSearchBackend, SearchService, StaticSearchBackend};
use crate::storage::JsonFileStore;
use crate::suggestions::StaticPopular;
use clap::Parser;
use eframe::egui;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_ansi(false)
        .init();

    let backend: Arc<dyn SearchService> = if args.offline {
        Arc::new(StaticSearchBackend::new(sample_documents()))
    } else {
        Arc::new(HttpSearchBackend::new(args.server_config())?)
    };
    let store = Box::new(JsonFileStore::new(config::storage_path()));

    let rt = tokio::runtime::Runtime::new()?;

    if args.is_headless() {
        return rt.block_on(cli::run_cli(&args, backend, store));
    }

    tracing::info!("启动搜索栏，后端: {}", backend.describe());
    let bar_config = args.search_bar_config();
    let history = RecentSearches::load(store, bar_config.max_recent);
    let bar = SearchBar::new(
        bar_config,
        history,
        Box::new(StaticPopular::default()),
        BrowserNavigator::new(args.server.clone()),
    );
    let handle = rt.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("DocSearch")
            .with_inner_size([760.0, 560.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DocSearch",
        options,
        Box::new(move |cc| Ok(Box::new(DocSearchApp::new(cc, bar, handle, backend)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI 运行失败: {}", e))?;

    // 运行时需活到窗口关闭
    drop(rt);

    Ok(())
}
