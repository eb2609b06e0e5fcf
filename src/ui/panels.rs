use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::app::Tab;
use crate::data::model::Dimension;
use crate::state::{AppState, FilterEvent};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel and apply any selection changes.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    // Collected during layout, applied afterwards so every widget in this
    // frame sees the same selection.
    let mut events: Vec<FilterEvent> = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for dim in [Dimension::City, Dimension::ProductLine] {
                let all_values = dim.values(&dataset);
                let selected = state.selection.set(dim);
                let colors = match dim {
                    Dimension::City => state.city_colors.as_ref(),
                    Dimension::ProductLine => state.line_colors.as_ref(),
                };

                let header_text = format!(
                    "{}  ({}/{})",
                    dim.label(),
                    selected.len(),
                    all_values.len()
                );

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(dim.label())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                events.push(FilterEvent::SelectAll(dim));
                            }
                            if ui.small_button("None").clicked() {
                                events.push(FilterEvent::SelectNone(dim));
                            }
                        });

                        for value in all_values {
                            let mut text = RichText::new(value);
                            if let Some(cm) = colors {
                                text = text.color(cm.color_for(value));
                            }
                            let mut checked = selected.contains(value);
                            if ui.checkbox(&mut checked, text).changed() {
                                events.push(FilterEvent::Toggle {
                                    dim,
                                    value: value.clone(),
                                });
                            }
                        }
                    });
            }
        });

    for event in events {
        state.apply(event);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, dataset summary and tab selector.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, tab: &mut Tab) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_reload = state.source.is_some();
            if ui.add_enabled(can_reload, egui::Button::new("Reload")).clicked() {
                // Failures are reported through `status_message`.
                let _ = state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        for t in Tab::ALL {
            ui.selectable_value(tab, t, t.title());
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} rows loaded, {} visible",
                ds.len(),
                state.view.filtered.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["csv", "tsv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        // Failures are reported through `status_message`.
        let _ = state.open(&path);
    }
}
