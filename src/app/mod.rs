use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{Context, Vec2};

use crate::document::{DocumentLoader, DocumentSource, ScanRequest};
use crate::interaction::GraphController;
use crate::layout::ForceParams;

mod graph;
mod render_utils;
mod ui;

/// Startup inputs resolved from the command line.
pub struct LaunchOptions {
    pub params: ForceParams,
    pub initial_source: Option<DocumentSource>,
    pub document_path: String,
    pub scan: ScanRequest,
}

pub struct ArchVisualizerApp {
    loader: DocumentLoader,
    view: ViewModel,
}

struct ViewModel {
    controller: GraphController,
    document_path: String,
    scan: ScanRequest,
    search: String,
    selected: Option<String>,
    focus_requested: bool,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    load_error: Option<String>,
    loading_label: Option<String>,
    pending_load: Option<DocumentSource>,
    search_match_cache: Option<SearchMatchCache>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<String>>,
}

impl ArchVisualizerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let mut app = Self {
            loader: DocumentLoader::default(),
            view: ViewModel::new(options.params, options.document_path, options.scan),
        };

        if let Some(source) = options.initial_source {
            app.request_load(source);
        }
        app
    }

    fn request_load(&mut self, source: DocumentSource) {
        self.view.loading_label = Some(source.describe());
        self.loader.request(source);
    }

    fn poll_loader(&mut self) {
        let Some(outcome) = self.loader.poll() else {
            return;
        };

        self.view.loading_label = None;
        match self.view.controller.apply_load(outcome.result) {
            Ok(()) => {
                self.view.load_error = None;
                self.view.selected = None;
            }
            Err(error) => {
                self.view.load_error = Some(format!("{}: {error}", outcome.source.describe()));
            }
        }
    }
}

impl eframe::App for ArchVisualizerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_loader();
        if self.loader.is_loading() {
            ctx.request_repaint();
        }

        self.view.show(ctx, self.loader.is_loading());

        if let Some(source) = self.view.pending_load.take() {
            self.request_load(source);
        }
    }
}
