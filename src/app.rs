use eframe::egui;

use crate::state::AppState;
use crate::ui::{charts, panels, table};

/// Dashboard pages, one per group of charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Timeline,
    Product,
    Correlation,
    Multivariate,
    Scatter3d,
    Table,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Timeline,
        Tab::Product,
        Tab::Correlation,
        Tab::Multivariate,
        Tab::Scatter3d,
        Tab::Table,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Timeline => "Timeline",
            Tab::Product => "Product detail",
            Tab::Correlation => "Correlations",
            Tab::Multivariate => "Multivariate",
            Tab::Scatter3d => "3D view",
            Tab::Table => "Rows",
        }
    }
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SalesDashApp {
    pub state: AppState,
    pub tab: Tab,
}

impl SalesDashApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tab: Tab::default(),
        }
    }
}

impl eframe::App for SalesDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state, &mut self.tab);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts of the active tab ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dataset.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open a sales file to start  (File → Open…)");
                });
                return;
            }
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match self.tab {
                    Tab::Timeline => charts::timeline(ui, &self.state),
                    Tab::Product => charts::product_detail(ui, &self.state),
                    Tab::Correlation => charts::correlation_heatmap(ui, &self.state),
                    Tab::Multivariate => charts::multivariate(ui, &self.state),
                    Tab::Scatter3d => charts::scatter_3d(ui, &mut self.state),
                    Tab::Table => table::filtered_rows(ui, &self.state),
                });
        });
    }
}
