use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::campaign;
use crate::data::loader::Dataset;
use crate::data::streaming;
use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – navigation and filter widgets
// ---------------------------------------------------------------------------

fn filter_columns(dataset: Dataset) -> &'static [&'static str] {
    match dataset {
        Dataset::Streaming => &streaming::FILTER_COLUMNS,
        Dataset::Campaigns => &campaign::FILTER_COLUMNS,
    }
}

/// Render the left panel: page selector, then the filters of that page.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Navigation");
    for page in Page::ALL {
        ui.radio_value(&mut state.page, page, page.label());
    }
    ui.separator();

    ui.heading("Filters");
    let dataset = state.page.dataset();
    let Some(source) = state.source(dataset).cloned() else {
        ui.label(format!("No {dataset} table loaded."));
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for &col in filter_columns(dataset) {
                let Some(all_values) = source.distinct(col) else {
                    continue;
                };

                let n_selected = state.filters(dataset).get(col).map_or(0, |s| s.len());
                let n_total = all_values.len();
                let header_text = format!("{col}  ({n_selected}/{n_total})");

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt((dataset.name(), col))
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(dataset, col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(dataset, col);
                            }
                        });

                        for val in all_values {
                            let mut checked = state
                                .filters(dataset)
                                .get(col)
                                .is_some_and(|s| s.contains(val));
                            if ui.checkbox(&mut checked, val.to_string()).changed() {
                                state.toggle_filter_value(dataset, col, val);
                            }
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open streaming table…").clicked() {
                open_file_dialog(state, Dataset::Streaming);
                ui.close_menu();
            }
            if ui.button("Open campaign table…").clicked() {
                open_file_dialog(state, Dataset::Campaigns);
                ui.close_menu();
            }
        });

        ui.separator();

        let dataset = state.page.dataset();
        if let (Some(src), Some(view)) = (state.source(dataset), state.filtered(dataset)) {
            ui.label(format!("{} rows loaded, {} visible", src.len(), view.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn pick_file(dataset: Dataset) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(format!("Open {dataset} table"))
        .add_filter("Supported files", &["csv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}

pub fn open_file_dialog(state: &mut AppState, dataset: Dataset) {
    let Some(path) = pick_file(dataset) else {
        return;
    };
    match state.load(dataset, &path) {
        Ok(()) => {
            state.page = match dataset {
                Dataset::Streaming => Page::Streaming,
                Dataset::Campaigns => Page::Campaigns,
            };
        }
        Err(e) => {
            log::error!("Failed to load {dataset} table: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
