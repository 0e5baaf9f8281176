mod config;
mod error;
mod master;
mod rows;
mod scheduler;
mod structs;
mod ui;
mod vault;

use eframe::egui;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::scheduler::{DesktopNotifier, Scheduler};
use crate::ui::TrackerApp;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::default();
    eprintln!(
        "{}",
        console::style("WARNING: credentials, PIN and row passwords are stored unencrypted in the data file.")
            .yellow()
            .bold()
    );
    log::info!("Using data file {}", config.data_file.display());

    let notifier = Arc::new(DesktopNotifier::new(&config.app_name));
    let scheduler = Arc::new(Scheduler::new(notifier));
    scheduler.start()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_title(config.app_name.clone()),
        ..Default::default()
    };
    let title = config.app_name.clone();
    let app = TrackerApp::new(config, Arc::clone(&scheduler));
    let result = eframe::run_native(&title, options, Box::new(|_cc| Ok(Box::new(app))));

    scheduler.stop();
    result?;
    Ok(())
}
