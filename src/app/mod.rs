use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Result;
use eframe::egui::{self, Context};
use lineage_explorer::lineage::{generate_demo_lineage, load_snapshot};
use lineage_explorer::{EngineConfig, EngineEvent, GraphEngine, LineageNode};
use log::{info, warn};

mod graph;
mod render_utils;
mod ui;

type LoadResult = Result<Vec<LineageNode>, String>;

#[derive(Clone, Debug)]
pub enum DataSource {
    File(PathBuf),
    Demo { count: usize, seed: u64 },
}

impl DataSource {
    fn load(&self) -> Result<Vec<LineageNode>> {
        match self {
            Self::File(path) => load_snapshot(path),
            Self::Demo { count, seed } => Ok(generate_demo_lineage(*count, *seed)),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Demo { count, seed } => write!(f, "demo lineage ({count} records, seed {seed})"),
        }
    }
}

pub struct LineageApp {
    source: DataSource,
    config: EngineConfig,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: GraphEngine,
    search: String,
    search_missed: bool,
    spacing_x: f32,
    spacing_y: f32,
    show_all_hybrid_links: bool,
    selected_record: Option<LineageNode>,
    needs_initial_fit: bool,
    show_fps_bar: bool,
    fps_show_current: bool,
    fps_show_average: bool,
    fps_show_frame_time: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

impl LineageApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: DataSource,
        config: EngineConfig,
    ) -> Self {
        let state = Self::start_load(&source);
        Self {
            source,
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: DataSource) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source.load().map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: &DataSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source.clone()),
        }
    }
}

impl eframe::App for LineageApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(nodes)) => {
                        let mut model = ViewModel::new(self.config.clone());
                        model.engine.set_data(nodes);
                        transition = Some(AppState::Ready(Box::new(model)));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Loading {}...", self.source));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load lineage snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.source));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    info!(source:% = self.source; "Reloading lineage snapshot");
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        // Reloads keep the engine so collapse, focus and selection carry over.
                        Ok(Ok(nodes)) => model.engine.set_data(nodes),
                        Ok(Err(error)) => {
                            warn!("Reload failed: {error}");
                            transition = Some(AppState::Error(error));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(config: EngineConfig) -> Self {
        let spacing_x = config.layout.spacing_x;
        let spacing_y = config.layout.spacing_y;
        let show_all_hybrid_links = config.links.show_all_hybrid_links;
        Self {
            engine: GraphEngine::new(config),
            search: String::new(),
            search_missed: false,
            spacing_x,
            spacing_y,
            show_all_hybrid_links,
            selected_record: None,
            needs_initial_fit: true,
            show_fps_bar: true,
            fps_show_current: true,
            fps_show_average: true,
            fps_show_frame_time: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    fn apply_engine_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::NodeSelected(node) => {
                    info!(code = node.lineage_code.as_str(); "Lineage selected");
                    self.selected_record = Some(node);
                }
                EngineEvent::FocusChanged { focus, name } => {
                    info!(focus:? = focus, name:? = name; "Focus changed");
                }
            }
        }
        if self.engine.selected().is_none() {
            self.selected_record = None;
        }
    }
}
