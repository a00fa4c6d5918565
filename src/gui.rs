use chrono::Timelike;
use eframe::egui;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;

use crate::dispatcher::FetchDispatcher;
use crate::navigation::{BrowserNavigator, Route};
use crate::search_bar::{NavKey, SearchBar};
use crate::searcher::SearchService;
use crate::suggestions::{PanelView, SuggestionRow};

/// 本帧收集到的面板操作，渲染结束后统一执行
enum PanelAction {
    Select(usize),
    Pick(usize),
    ClearRecent,
    ShowAll,
}

pub struct DocSearchApp {
    bar: SearchBar<BrowserNavigator>,
    dispatcher: FetchDispatcher,
    backend_info: String,
    is_dark: bool,
    focus_input: bool,
    pressing_panel: bool,
    // 上一帧面板区域，用于判断指针是否按在面板上
    panel_rect: Option<egui::Rect>,
}

impl DocSearchApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        bar: SearchBar<BrowserNavigator>,
        handle: Handle,
        backend: Arc<dyn SearchService>,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        let dispatcher = FetchDispatcher::new(handle, backend).with_waker(move || ctx.request_repaint());
        let backend_info = dispatcher.backend_info();

        // 白天(6:00-18:00)浅色，晚上深色
        let hour = chrono::Local::now().hour();
        let is_dark = !(6..18).contains(&hour);
        cc.egui_ctx.set_visuals(if is_dark {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        Self {
            bar,
            dispatcher,
            backend_info,
            is_dark,
            focus_input: true,
            pressing_panel: false,
            panel_rect: None,
        }
    }

    fn pump(&mut self, ctx: &egui::Context, now: Instant) {
        for outcome in self.dispatcher.drain() {
            self.bar.apply(outcome);
        }
        if let Some(ticket) = self.bar.tick(now) {
            self.dispatcher.dispatch(ticket);
        }
        if let Some(wait) = self.bar.next_wake(now) {
            ctx.request_repaint_after(wait);
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context, now: Instant) {
        let keys = [
            (egui::Key::ArrowUp, NavKey::Up),
            (egui::Key::ArrowDown, NavKey::Down),
            (egui::Key::Enter, NavKey::Enter),
            (egui::Key::Escape, NavKey::Escape),
        ];
        for (key, nav) in keys {
            if ctx.input(|i| i.key_pressed(key)) {
                self.bar.handle_key(nav, now);
            }
        }
    }

    fn apply_action(&mut self, action: PanelAction, now: Instant) {
        match action {
            PanelAction::Select(i) => {
                self.bar.select_result(i);
            }
            PanelAction::Pick(i) => {
                self.bar.pick_term(i, now);
                self.focus_input = true;
            }
            PanelAction::ClearRecent => {
                self.bar.clear_recent();
                self.focus_input = true;
            }
            PanelAction::ShowAll => {
                self.bar.submit_search();
            }
        }
    }
}

struct Theme {
    panel_bg: egui::Color32,
    text: egui::Color32,
    muted: egui::Color32,
    accent: egui::Color32,
    input_bg: egui::Color32,
    highlight_bg: egui::Color32,
}

impl Theme {
    fn light() -> Self {
        Self {
            panel_bg: egui::Color32::from_rgb(240, 240, 240),
            text: egui::Color32::from_rgb(40, 40, 40),
            muted: egui::Color32::from_rgb(140, 140, 150),
            accent: egui::Color32::from_rgb(60, 120, 230),
            input_bg: egui::Color32::WHITE,
            highlight_bg: egui::Color32::from_rgba_unmultiplied(200, 220, 255, 200),
        }
    }

    fn dark() -> Self {
        Self {
            panel_bg: egui::Color32::from_rgb(30, 33, 40),
            text: egui::Color32::WHITE,
            muted: egui::Color32::from_rgb(150, 150, 165),
            accent: egui::Color32::from_rgb(100, 160, 255),
            input_bg: egui::Color32::from_rgb(42, 45, 54),
            highlight_bg: egui::Color32::from_rgba_unmultiplied(100, 160, 255, 55),
        }
    }
}

impl eframe::App for DocSearchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // 指针按在面板上时，输入框失焦不应关闭面板
        let (pressed, released, pointer) = ctx.input(|i| {
            (
                i.pointer.any_pressed(),
                i.pointer.any_released(),
                i.pointer.interact_pos(),
            )
        });
        if pressed && matches!((self.panel_rect, pointer), (Some(r), Some(p)) if r.contains(p)) {
            self.pressing_panel = true;
            self.bar.pointer_down_on_panel();
        }

        self.pump(ctx, now);
        let enter_or_escape =
            ctx.input(|i| i.key_pressed(egui::Key::Enter) || i.key_pressed(egui::Key::Escape));
        self.handle_keys(ctx, now);

        let theme = if self.is_dark { Theme::dark() } else { Theme::light() };
        let mut action = None;

        egui::TopBottomPanel::top("title").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("📄 DocSearch").size(15.0).color(theme.accent));
                ui.label(
                    egui::RichText::new(&self.backend_info)
                        .size(12.0)
                        .color(theme.muted),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let icon = if self.is_dark { "☀" } else { "🌙" };
                    if ui.button(icon).clicked() {
                        self.is_dark = !self.is_dark;
                        ui.ctx().set_visuals(if self.is_dark {
                            egui::Visuals::dark()
                        } else {
                            egui::Visuals::light()
                        });
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(12.0);

            // 搜索框
            let mut text = self.bar.query().to_string();
            let show_clear = !text.is_empty();
            let search_frame = egui::Frame::none()
                .fill(theme.input_bg)
                .rounding(10.0)
                .stroke(egui::Stroke::new(1.5, theme.accent.linear_multiply(0.8)))
                .inner_margin(egui::Margin::symmetric(16.0, 10.0));

            search_frame.show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("🔍").size(20.0).color(theme.accent));
                    let clear_width = if show_clear { 32.0 } else { 0.0 };
                    let text_edit = ui.add(
                        egui::TextEdit::singleline(&mut text)
                            .hint_text(crate::config::INPUT_HINT)
                            .frame(false)
                            .desired_width(ui.available_width() - clear_width)
                            .font(egui::FontId::proportional(20.0))
                            .text_color(theme.text),
                    );

                    if text_edit.changed() {
                        self.bar.set_text(&text, now);
                    }
                    if text_edit.gained_focus() {
                        self.bar.focus();
                    }
                    if text_edit.lost_focus() {
                        if enter_or_escape {
                            // 回车/Esc 会让单行输入框失焦；面板仍打开时把焦点还回去
                            if self.bar.is_open() {
                                self.focus_input = true;
                            }
                        } else {
                            self.bar.blur(now);
                        }
                    }

                    if show_clear {
                        let clear_btn = ui.add(
                            egui::Button::new(egui::RichText::new("✕").size(14.0))
                                .fill(egui::Color32::TRANSPARENT)
                                .stroke(egui::Stroke::NONE),
                        );
                        if clear_btn.clicked() {
                            self.bar.clear();
                            self.dispatcher.cancel();
                            self.focus_input = true;
                        }
                    }

                    if self.focus_input {
                        text_edit.request_focus();
                        self.focus_input = false;
                    }
                });
            });

            ui.add_space(8.0);

            let view = self.bar.view();
            let waiting = self.bar.is_waiting();
            let Some(panel) = view.panel else {
                self.panel_rect = None;
                return;
            };

            let panel_frame = egui::Frame::none()
                .fill(theme.panel_bg)
                .rounding(10.0)
                .inner_margin(egui::Margin::symmetric(12.0, 10.0));
            let response = panel_frame.show(ui, |ui| match &panel {
                PanelView::Placeholder {
                    prompt,
                    recent,
                    popular,
                } => {
                    action = placeholder_ui(ui, &theme, prompt, recent, popular, view.highlighted);
                }
                PanelView::Results {
                    rows,
                    loading,
                    total,
                    error,
                } => {
                    if *loading {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(egui::RichText::new("Searching...").color(theme.muted));
                        });
                    }
                    if let Some(err) = error {
                        ui.label(egui::RichText::new(err).size(12.0).color(egui::Color32::from_rgb(220, 80, 80)));
                    }
                    if rows.is_empty() && !waiting && error.is_none() {
                        ui.label(egui::RichText::new("No documents found").color(theme.muted));
                    }

                    egui::ScrollArea::vertical()
                        .auto_shrink([false, true])
                        .max_height(420.0)
                        .show(ui, |ui| {
                            for (i, row) in rows.iter().enumerate() {
                                let selected = view.highlighted == Some(i);
                                if result_row(ui, &theme, row, &view.query, selected, self.bar.navigator()) {
                                    action = Some(PanelAction::Select(i));
                                }
                            }
                        });

                    if *total > rows.len() {
                        ui.add_space(4.0);
                        if ui
                            .link(egui::RichText::new(format!("View all {} results", total)).color(theme.accent))
                            .clicked()
                        {
                            action = Some(PanelAction::ShowAll);
                        }
                    }
                }
            });
            self.panel_rect = Some(response.response.rect);
        });

        if let Some(action) = action {
            self.apply_action(action, now);
        }

        if released && self.pressing_panel {
            self.pressing_panel = false;
            self.bar.pointer_released();
            // 点完面板后面板仍打开：焦点回到输入框
            if self.bar.is_open() {
                self.focus_input = true;
            }
        }
    }
}

fn placeholder_ui(
    ui: &mut egui::Ui,
    theme: &Theme,
    prompt: &str,
    recent: &[String],
    popular: &[String],
    highlighted: Option<usize>,
) -> Option<PanelAction> {
    let mut action = None;
    ui.label(egui::RichText::new(prompt).color(theme.muted));

    if !recent.is_empty() {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Recent searches").size(12.0).strong().color(theme.text));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("Clear").clicked() {
                    action = Some(PanelAction::ClearRecent);
                }
            });
        });
        for (i, term) in recent.iter().enumerate() {
            let text = egui::RichText::new(format!("🕘 {}", term)).color(theme.text);
            if ui.selectable_label(highlighted == Some(i), text).clicked() {
                action = Some(PanelAction::Pick(i));
            }
        }
    }

    if !popular.is_empty() {
        ui.add_space(8.0);
        ui.label(egui::RichText::new("Popular searches").size(12.0).strong().color(theme.text));
        ui.horizontal_wrapped(|ui| {
            for (offset, term) in popular.iter().enumerate() {
                let i = recent.len() + offset;
                let text = egui::RichText::new(term).color(theme.accent);
                if ui.selectable_label(highlighted == Some(i), text).clicked() {
                    action = Some(PanelAction::Pick(i));
                }
            }
        });
    }
    action
}

/// 返回该行是否被点击
fn result_row(
    ui: &mut egui::Ui,
    theme: &Theme,
    row: &SuggestionRow,
    query: &str,
    selected: bool,
    navigator: &BrowserNavigator,
) -> bool {
    let (rect, response) = ui.allocate_at_least(egui::vec2(ui.available_width(), 52.0), egui::Sense::click());

    if selected {
        ui.painter().rect_filled(rect, 8.0, theme.highlight_bg);
        ui.painter().rect_stroke(rect, 8.0, egui::Stroke::new(1.0, theme.accent));
    } else if response.hovered() {
        ui.painter().rect_filled(rect, 8.0, theme.accent.linear_multiply(0.08));
    }

    response.context_menu(|ui| {
        if ui.button("Copy link").clicked() {
            if let Ok(url) = navigator.url_for(&Route::Document(row.id.clone())) {
                ui.output_mut(|o| o.copied_text = url.to_string());
            }
            ui.close_menu();
        }
    });

    ui.allocate_new_ui(egui::UiBuilder::new().max_rect(rect.shrink2(egui::vec2(12.0, 6.0))), |ui| {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(row.icon).size(24.0));
            ui.add_space(8.0);
            ui.vertical(|ui| {
                ui.add(egui::Label::new(highlight_job(&row.name, query, theme.text, egui::Color32::from_rgb(255, 140, 0))).truncate());
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(&row.size).size(12.0).color(theme.muted));
                    for tag in &row.tags {
                        ui.label(egui::RichText::new(format!("#{}", tag)).size(12.0).color(theme.accent));
                    }
                    if row.has_text {
                        ui.label(egui::RichText::new("OCR").size(11.0).color(egui::Color32::from_rgb(80, 170, 110)));
                    }
                });
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(format!("{}%", row.relevance)).size(12.0).color(theme.muted));
            });
        });
    });

    response.clicked()
}

/// 文件名中命中查询的部分高亮
fn highlight_job(name: &str, query: &str, normal: egui::Color32, highlight: egui::Color32) -> egui::text::LayoutJob {
    let mut job = egui::text::LayoutJob::default();
    job.wrap.max_rows = 1;
    job.wrap.break_anywhere = true;

    let text_format = |color| egui::TextFormat {
        font_id: egui::FontId::proportional(16.0),
        color,
        ..Default::default()
    };

    let name_lower = name.to_lowercase();
    let query_lower = query.to_lowercase();
    // 小写后字节长度变化时无法对齐下标，直接整体显示
    if query_lower.is_empty() || name_lower.len() != name.len() || query_lower.len() != query.len() {
        job.append(name, 0.0, text_format(normal));
        return job;
    }

    let mut start = 0;
    while let Some(pos) = name_lower[start..].find(&query_lower) {
        let abs = start + pos;
        job.append(&name[start..abs], 0.0, text_format(normal));
        job.append(&name[abs..abs + query_lower.len()], 0.0, text_format(highlight));
        start = abs + query_lower.len();
    }
    job.append(&name[start..], 0.0, text_format(normal));
    job
}
