mod analysis;
mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::SalesDashApp;
use config::AppConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::from_env();
    log::info!("Data file: {}", config.data_path.display());

    // A failed startup load is shown in the status bar; File → Open still works.
    let mut state = AppState::default();
    if state.open(&config.data_path).is_err() {
        log::warn!("Starting without a dataset");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(SalesDashApp::new(state)))),
    )
}
