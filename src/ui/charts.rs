use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints, Points,
};

use crate::color::{code_color, diverging, ColorMap};
use crate::state::{AppState, Camera, PARALLEL_COLUMNS, SCATTER_3D_COLUMNS};

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

/// Plot x-coordinate of a date: days since 0001-01-01.
fn date_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn date_axis(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    NaiveDate::from_num_days_from_ce_opt(mark.value.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Axis formatter that shows `labels[i]` at integer position `i`.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        if mark.value.fract() != 0.0 || mark.value < 0.0 {
            return String::new();
        }
        labels.get(mark.value as usize).cloned().unwrap_or_default()
    }
}

fn line_color(colors: &Option<ColorMap>, line: &str) -> Color32 {
    colors
        .as_ref()
        .map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(line))
}

fn empty_notice(ui: &mut Ui) {
    ui.label(RichText::new("No rows match the current filters.").italics());
}

// ---------------------------------------------------------------------------
// Timeline tab
// ---------------------------------------------------------------------------

/// Daily sales line and monthly sales bars with the mean rating.
pub fn timeline(ui: &mut Ui, state: &AppState) {
    let view = &state.view;

    ui.heading("Daily sales");
    if view.daily.is_empty() {
        empty_notice(ui);
    } else {
        let points: PlotPoints = view.daily.iter().map(|d| [date_x(d.date), d.total]).collect();
        Plot::new("daily_sales")
            .height(CHART_HEIGHT)
            .x_axis_formatter(date_axis)
            .y_axis_label("Total")
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(points).name("Total").width(1.5));
            });
    }

    ui.add_space(12.0);
    ui.heading("Monthly sales vs mean rating");
    if view.monthly.is_empty() {
        empty_notice(ui);
        return;
    }

    let bars: Vec<Bar> = view
        .monthly
        .iter()
        .map(|m| {
            Bar::new(date_x(m.month_end), m.total_sum)
                .width(20.0)
                .name(m.month_end.format("%Y-%m").to_string())
        })
        .collect();
    Plot::new("monthly_sales")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_formatter(date_axis)
        .y_axis_label("Sales (USD)")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Sales").color(Color32::from_rgb(99, 110, 250)));
        });

    let ratings: PlotPoints = view
        .monthly
        .iter()
        .filter_map(|m| Some([date_x(m.month_end), m.rating_mean?]))
        .collect();
    Plot::new("monthly_rating")
        .height(CHART_HEIGHT * 0.6)
        .legend(Legend::default())
        .x_axis_formatter(date_axis)
        .y_axis_label("Mean rating")
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(ratings)
                    .name("Mean rating")
                    .color(Color32::from_rgb(239, 85, 59))
                    .width(2.0),
            );
        });
}

// ---------------------------------------------------------------------------
// Product detail tab
// ---------------------------------------------------------------------------

/// Unit price vs quantity scatter, and gross income box plot per product line.
pub fn product_detail(ui: &mut Ui, state: &AppState) {
    let view = &state.view;
    let lines = view.filtered.product_lines();

    ui.heading("Unit price vs quantity");
    Plot::new("price_quantity")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Unit price")
        .y_axis_label("Quantity")
        .show(ui, |plot_ui| {
            for line in lines {
                let points: PlotPoints = view
                    .filtered
                    .records()
                    .iter()
                    .filter(|r| &r.product_line == line)
                    .filter_map(|r| Some([r.unit_price?, r.quantity? as f64]))
                    .collect();
                plot_ui.points(
                    Points::new(points)
                        .radius(3.0)
                        .color(line_color(&state.line_colors, line))
                        .name(line),
                );
            }
        });

    ui.add_space(12.0);
    ui.heading("Gross income by product line");
    if view.income_boxes.is_empty() {
        empty_notice(ui);
        return;
    }
    let names: Vec<String> = view.income_boxes.iter().map(|b| b.group.clone()).collect();
    Plot::new("income_boxes")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_formatter(category_axis(names))
        .y_axis_label("gross income")
        .show(ui, |plot_ui| {
            for (i, stats) in view.income_boxes.iter().enumerate() {
                let color = line_color(&state.line_colors, &stats.group);
                let elem = BoxElem::new(
                    i as f64,
                    BoxSpread::new(
                        stats.lower_whisker,
                        stats.q1,
                        stats.median,
                        stats.q3,
                        stats.upper_whisker,
                    ),
                )
                .name(&stats.group);
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&stats.group).color(color));

                if !stats.outliers.is_empty() {
                    let outliers: PlotPoints = stats.outliers.iter().map(|&v| [i as f64, v]).collect();
                    plot_ui.points(Points::new(outliers).radius(2.5).color(color));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Correlation tab
// ---------------------------------------------------------------------------

/// Heatmap of the correlation matrix, one coloured cell per coefficient.
pub fn correlation_heatmap(ui: &mut Ui, state: &AppState) {
    let corr = &state.view.correlation;
    ui.heading("Correlation heatmap (numeric columns)");

    egui::Grid::new("correlation_grid")
        .spacing([4.0, 4.0])
        .min_col_width(90.0)
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for col in &corr.columns {
                ui.strong(col.label());
            }
            ui.end_row();

            for (i, row_col) in corr.columns.iter().enumerate() {
                ui.strong(row_col.label());
                for j in 0..corr.columns.len() {
                    let v = corr.get(i, j);
                    let text_color = if v.abs() > 0.5 {
                        Color32::WHITE
                    } else {
                        Color32::BLACK
                    };
                    ui.label(
                        RichText::new(format!("{v:.2}"))
                            .monospace()
                            .color(text_color)
                            .background_color(diverging(v)),
                    );
                }
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Multivariate tab
// ---------------------------------------------------------------------------

/// Parallel coordinates coloured by city code, and the PCA projection.
pub fn multivariate(ui: &mut Ui, state: &AppState) {
    parallel_coordinates(ui, state);
    ui.add_space(12.0);
    ui.separator();
    pca_scatter(ui, state);
}

/// Min–max scale `values` to `[0, 1]`; a constant axis sits at 0.5.
fn normalize_axis(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present = values.iter().flatten();
    let min = present.clone().copied().fold(f64::INFINITY, f64::min);
    let max = present.copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    values
        .iter()
        .map(|v| {
            v.map(|x| {
                if range.abs() < f64::EPSILON || !range.is_finite() {
                    0.5
                } else {
                    (x - min) / range
                }
            })
        })
        .collect()
}

fn parallel_coordinates(ui: &mut Ui, state: &AppState) {
    let view = &state.view;
    ui.heading("Parallel coordinates by city");

    let n_codes = view.city_codes.len();
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for (city, code) in view.city_codes.iter() {
            ui.label(RichText::new(format!("■ {code}: {city}")).color(code_color(code, n_codes)));
        }
    });

    let axes: Vec<Vec<Option<f64>>> = view.parallel.iter().map(|v| normalize_axis(v)).collect();
    let labels: Vec<String> = PARALLEL_COLUMNS.iter().map(|c| c.label().to_string()).collect();

    Plot::new("parallel_coordinates")
        .height(CHART_HEIGHT)
        .x_axis_formatter(category_axis(labels))
        .y_axis_label("scaled value")
        .show(ui, |plot_ui| {
            for (row, &code) in view.row_city_codes.iter().enumerate() {
                let points: Option<Vec<[f64; 2]>> = axes
                    .iter()
                    .enumerate()
                    .map(|(k, axis)| Some([k as f64, axis[row]?]))
                    .collect();
                let Some(points) = points else {
                    continue;
                };
                plot_ui.line(
                    Line::new(PlotPoints::new(points))
                        .color(code_color(code, n_codes).gamma_multiply(0.6))
                        .width(1.0),
                );
            }
        });
}

fn pca_scatter(ui: &mut Ui, state: &AppState) {
    let view = &state.view;
    let [r1, r2] = view.projection.explained_variance_ratio;
    ui.heading("PCA: grouping by product line");
    ui.label(format!(
        "Explained variance: PC1 {:.1}%, PC2 {:.1}%",
        r1 * 100.0,
        r2 * 100.0
    ));

    Plot::new("pca_projection")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("PC1")
        .y_axis_label("PC2")
        .show(ui, |plot_ui| {
            for line in view.filtered.product_lines() {
                let points: PlotPoints = view
                    .projection
                    .points
                    .iter()
                    .zip(&view.projection_labels)
                    .filter(|(_, label)| *label == line)
                    .map(|(pt, _)| *pt)
                    .collect();
                plot_ui.points(
                    Points::new(points)
                        .radius(3.0)
                        .color(line_color(&state.line_colors, line))
                        .name(line),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// 3-D tab
// ---------------------------------------------------------------------------

/// Orthographic screen position of a point in `[-1, 1]^3` seen from `camera`:
/// yaw turns about the vertical axis, pitch tilts towards the viewer.
pub fn project_view(p: [f64; 3], camera: &Camera) -> [f64; 2] {
    let (sy, cy) = camera.yaw.to_radians().sin_cos();
    let (sp, cp) = camera.pitch.to_radians().sin_cos();
    let [x, y, z] = p;
    let x1 = x * cy - y * sy;
    let y1 = x * sy + y * cy;
    let z2 = y1 * sp + z * cp;
    [x1, z2]
}

/// Price, quantity and gross income scatter with a rotatable camera.
pub fn scatter_3d(ui: &mut Ui, state: &mut AppState) {
    let AppState {
        view,
        camera,
        line_colors,
        ..
    } = state;

    ui.heading("Price vs quantity vs gross income");
    ui.horizontal(|ui: &mut Ui| {
        ui.add(egui::Slider::new(&mut camera.yaw, -180.0..=180.0).text("Yaw"));
        ui.add(egui::Slider::new(&mut camera.pitch, -90.0..=90.0).text("Pitch"));
        if ui.button("Reset").clicked() {
            *camera = Camera::default();
        }
    });

    // Scale each axis to [-1, 1] so the cube stays square on screen.
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for p in &view.points_3d {
        for k in 0..3 {
            lo[k] = lo[k].min(p.xyz[k]);
            hi[k] = hi[k].max(p.xyz[k]);
        }
    }
    let scale = |xyz: [f64; 3]| -> [f64; 3] {
        let mut out = [0.0; 3];
        for k in 0..3 {
            let range = hi[k] - lo[k];
            out[k] = if range > 0.0 {
                2.0 * (xyz[k] - lo[k]) / range - 1.0
            } else {
                0.0
            };
        }
        out
    };
    let cam = *camera;

    Plot::new("scatter_3d")
        .height(CHART_HEIGHT * 2.0)
        .data_aspect(1.0)
        .legend(Legend::default())
        .show_axes(false)
        .show_grid(false)
        .show(ui, |plot_ui| {
            for (k, column) in SCATTER_3D_COLUMNS.iter().enumerate() {
                let mut tip = [-1.0; 3];
                tip[k] = 1.0;
                let axis: PlotPoints =
                    vec![project_view([-1.0; 3], &cam), project_view(tip, &cam)].into();
                plot_ui.line(Line::new(axis).color(Color32::GRAY).name(column.label()));
            }

            for line in view.filtered.product_lines() {
                let points: PlotPoints = view
                    .points_3d
                    .iter()
                    .filter(|p| &p.product_line == line)
                    .map(|p| project_view(scale(p.xyz), &cam))
                    .collect();
                plot_ui.points(
                    Points::new(points)
                        .radius(3.0)
                        .color(line_color(line_colors, line))
                        .name(line),
                );
            }
        });
}
