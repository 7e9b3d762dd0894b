use eframe::{egui, NativeOptions};
use egui::CentralPanel;
use log::{info, debug, trace};
use reqwest::Client as ReqwestClient;
use std::sync::Arc;

// Project Modules
mod errors;
mod config;
mod model;
mod media;
mod day_gate;
mod slide_fetcher;
mod slides_controller;
mod playback;
mod widgets;

use errors::AppError;
use config::AppConfig;
use day_gate::SystemClock;
use slide_fetcher::{HttpTransport, SlideFetcher};
use slides_controller::{RepaintHook, SlidesController};
use playback::PlaybackEngine;
use widgets::{UiAction, ViewerModel, ViewportFullscreen};

// --- Constants ---
const DEFAULT_CONFIG_PATH: &str = "/etc/loterica_slides.conf";
const WINDOW_TITLE: &str = "Loterica Dalila Slides";

struct SlideshowApp {
    controller: SlidesController<HttpTransport>,
    playback: PlaybackEngine,
}

impl SlideshowApp {
    fn new(cc: &eframe::CreationContext<'_>, app_config: AppConfig) -> Self {
        info!("Initializing SlideshowApp...");
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let repaint_ctx = cc.egui_ctx.clone();
        let repaint: RepaintHook = Arc::new(move || repaint_ctx.request_repaint());

        let transport = HttpTransport::new(ReqwestClient::new(), app_config.request_timeout);
        let fetcher = SlideFetcher::from_config(transport, &app_config);
        let controller = SlidesController::new(fetcher, Arc::new(SystemClock), app_config.shuffle_slides)
            .with_repaint_hook(Arc::clone(&repaint));
        let playback = PlaybackEngine::new(app_config.auto_advance_interval).with_repaint_hook(repaint);

        Self { controller, playback }
    }

    fn apply(&mut self, ctx: &egui::Context, action: UiAction) {
        debug!("UI action: {:?}", action);
        match action {
            UiAction::SelectDay(day) => {
                self.controller.clear_error();
                self.controller.select_day(day);
                self.playback.reset(self.controller.slides().len());
            }
            UiAction::Back => {
                if self.playback.is_fullscreen() {
                    self.toggle_fullscreen(ctx);
                }
                self.controller.deselect();
                self.playback.reset(0);
            }
            UiAction::Prev => self.playback.prev(),
            UiAction::Next => self.playback.next(),
            UiAction::TogglePlay => {
                self.playback.toggle_play();
                debug!("Auto-advance scheduled: {}", self.playback.is_scheduled());
            }
            UiAction::ToggleFullscreen => self.toggle_fullscreen(ctx),
            UiAction::JumpTo(index) => self.playback.jump_to(index),
            UiAction::Retry => {
                self.controller.retry();
                self.playback.reset(self.controller.slides().len());
            }
            UiAction::DismissError => self.controller.clear_error(),
        }
    }

    /// Opens or closes the fullscreen view and takes the window along.
    fn toggle_fullscreen(&mut self, ctx: &egui::Context) {
        let mut surface = ViewportFullscreen { ctx, assumed: self.playback.is_fullscreen() };
        self.playback.toggle_fullscreen();
        playback::sync_native_fullscreen(&mut surface, self.playback.is_fullscreen());
    }
}

impl eframe::App for SlideshowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.controller.poll() {
            debug!("Slides state changed: {:?}", self.controller.phase());
            self.playback.reset(self.controller.slides().len());
        }
        let advanced = self.playback.poll();
        if advanced > 0 {
            trace!(
                "Auto-advanced {} time(s), now on slide {} of {}",
                advanced,
                self.playback.current_index() + 1,
                self.playback.slide_count()
            );
        }

        let mut actions = Vec::new();
        let selected_day = self.controller.selected_day();
        widgets::keyboard_actions(ctx, selected_day.is_some(), self.playback.is_fullscreen(), &mut actions);

        if self.playback.is_fullscreen() {
            let slide = self.controller.slides().get(self.playback.current_index());
            widgets::fullscreen_view(ctx, slide, self.playback.is_playing(), &mut actions);
        } else {
            CentralPanel::default().show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    widgets::header(ui);
                    match selected_day {
                        None => widgets::day_grid(ui, &mut actions),
                        Some(day) => {
                            let model = ViewerModel {
                                day,
                                slides: self.controller.slides(),
                                current: self.playback.current_index(),
                                loading: self.controller.is_loading(),
                                error: self.controller.error(),
                                is_playing: self.playback.is_playing(),
                            };
                            widgets::viewer(ui, &model, &mut actions);
                            widgets::error_banner(ui, model.error, &mut actions);
                            widgets::slide_list(ui, model.slides, model.current, &mut actions);
                        }
                    }
                });
            });
        }

        for action in actions {
            self.apply(ctx, action);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("SlideshowApp on_exit called. Cancelling outstanding work.");
        self.controller.deselect();
        self.playback.reset(0);
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    env_logger::init(); // Initialize logger
    info!("Starting loterica_slides application...");
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let app_config = config::load_config_or_default(&config_path)?;
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(WINDOW_TITLE, options, Box::new(move |cc| Box::new(SlideshowApp::new(cc, app_config))))?;
    Ok(())
}
