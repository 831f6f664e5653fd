use eframe::egui;

use crate::state::{AppState, Page};
use crate::ui::{pages, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct InsightsApp {
    pub state: AppState,
}

impl InsightsApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl Default for InsightsApp {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl eframe::App for InsightsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: navigation and filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: current page ----
        let page = self.state.page;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match page {
                    Page::Streaming => pages::streaming_page(ui, &mut self.state),
                    Page::Campaigns => pages::campaign_page(ui, &mut self.state),
                });
        });
    }
}
