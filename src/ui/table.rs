use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::model::{NumericColumn, COL_CITY, COL_DATE, COL_PRODUCT_LINE};
use crate::state::AppState;

fn cell(v: Option<f64>) -> String {
    v.map_or_else(|| "–".to_string(), |x| format!("{x:.2}"))
}

/// Scrollable view of the filtered rows.
pub fn filtered_rows(ui: &mut Ui, state: &AppState) {
    let records = state.view.filtered.records();
    ui.heading(format!("{} rows", records.len()));

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(90.0))
        .columns(Column::auto().at_least(80.0), 2)
        .columns(Column::auto().at_least(70.0), NumericColumn::ALL.len())
        .header(22.0, |mut header| {
            for title in [COL_DATE, COL_CITY, COL_PRODUCT_LINE] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
            for column in NumericColumn::ALL {
                header.col(|ui| {
                    ui.strong(column.label());
                });
            }
        })
        .body(|body| {
            body.rows(18.0, records.len(), |mut row| {
                let r = &records[row.index()];
                row.col(|ui| {
                    ui.label(r.date.to_string());
                });
                row.col(|ui| {
                    ui.label(r.city.as_str());
                });
                row.col(|ui| {
                    ui.label(r.product_line.as_str());
                });
                for column in NumericColumn::ALL {
                    row.col(|ui| {
                        ui.label(cell(r.value(column)));
                    });
                }
            });
        });
}
