mod app;

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use lineage_explorer::EngineConfig;
use log::{LevelFilter, error, info};

use crate::app::DataSource;

const DEFAULT_DEMO_SIZE: usize = 600;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Lineage snapshot: a JSON array of records or `{ "nodes": [...] }`
    #[arg(long, conflicts_with = "demo")]
    data: Option<PathBuf>,

    /// Generate a synthetic lineage with this many records instead of loading a file
    #[arg(long)]
    demo: Option<usize>,

    /// Seed for the synthetic lineage
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Engine tunables as JSON; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Horizontal distance between sibling nodes
    #[arg(long)]
    spacing_x: Option<f32>,

    /// Vertical distance between generations
    #[arg(long)]
    spacing_y: Option<f32>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path).context("engine configuration")?,
            None => EngineConfig::default(),
        };
        if let Some(spacing_x) = self.spacing_x {
            config.layout.spacing_x = spacing_x;
        }
        if let Some(spacing_y) = self.spacing_y {
            config.layout.spacing_y = spacing_y;
        }
        Ok(config)
    }

    fn data_source(&self) -> DataSource {
        match &self.data {
            Some(path) => DataSource::File(path.clone()),
            None => DataSource::Demo {
                count: self.demo.unwrap_or(DEFAULT_DEMO_SIZE),
                seed: self.seed,
            },
        }
    }
}

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'info' instead.", args.log_level);
        LevelFilter::Info
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    let config = match args.engine_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{err:#}");
            process::exit(1);
        }
    };
    let source = args.data_source();
    info!(source:% = source; "Starting lineage explorer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Lineage Explorer",
        options,
        Box::new(move |cc| Ok(Box::new(app::LineageApp::new(cc, source, config)))),
    );
    if let Err(err) = result {
        error!("{err}");
        process::exit(1);
    }
}
