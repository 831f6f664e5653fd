use anyhow::anyhow;
use clap::Parser;
use eframe::egui;

use stream_insights::app::InsightsApp;
use stream_insights::config::{Args, DashboardConfig};
use stream_insights::data::loader::Dataset;
use stream_insights::state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = DashboardConfig::resolve(&args)?;
    let [width, height] = config.window_size;

    let mut state = AppState::new(config);
    let startup = [
        (Dataset::Streaming, state.config.streaming_path.clone()),
        (Dataset::Campaigns, state.config.campaigns_path.clone()),
    ];
    for (dataset, path) in startup {
        if path.exists() {
            state.load(dataset, &path)?;
        } else {
            log::warn!(
                "{dataset} table {} not found; open it from the File menu",
                path.display()
            );
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Stream Insights",
        options,
        Box::new(|_cc| Ok(Box::new(InsightsApp::new(state)))),
    )
    .map_err(|e| anyhow!("running the dashboard: {e}"))
}
