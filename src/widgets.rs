//! Renders the slides state with egui.
//!
//! Drawing functions never mutate application state; they push [`UiAction`]s
//! which `SlideshowApp` applies once the frame is laid out.

use crate::media::{self, MediaView};
use crate::model::{ErrorKind, ErrorState, Slide, WeekDay};
use crate::playback::FullscreenSurface;
use egui::{vec2, Align2, Color32, FontId, Key, Rect, RichText, Sense, Ui, ViewportCommand};
use log::trace;

const TILE_SIZE: [f32; 2] = [220.0, 120.0];
const TITLE_PADDING: f32 = 10.0;
const THUMBNAIL_SIZE: [f32; 2] = [48.0, 32.0];
const ERROR_RED: Color32 = Color32::from_rgb(0xf8, 0x71, 0x71);
const BANNER_FILL: Color32 = Color32::from_rgb(0x7f, 0x1d, 0x1d);

/// Something the operator asked for during this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    SelectDay(WeekDay),
    Back,
    Prev,
    Next,
    TogglePlay,
    ToggleFullscreen,
    JumpTo(usize),
    Retry,
    DismissError,
}

/// Everything the viewer needs to draw one frame.
pub struct ViewerModel<'a> {
    pub day: WeekDay,
    pub slides: &'a [Slide],
    pub current: usize,
    pub loading: bool,
    pub error: &'a ErrorState,
    pub is_playing: bool,
}

impl ViewerModel<'_> {
    fn current_slide(&self) -> Option<&Slide> {
        self.slides.get(self.current)
    }
}

pub fn accent_color(day: WeekDay) -> Color32 {
    let [r, g, b] = day.accent();
    Color32::from_rgb(r, g, b)
}

/// Maps key presses to actions. Navigation keys only apply inside a day.
pub fn keyboard_actions(ctx: &egui::Context, day_selected: bool, fullscreen: bool, actions: &mut Vec<UiAction>) {
    ctx.input(|input| {
        if fullscreen && input.key_pressed(Key::Escape) {
            actions.push(UiAction::ToggleFullscreen);
        }
        if !day_selected {
            return;
        }
        if input.key_pressed(Key::ArrowRight) {
            actions.push(UiAction::Next);
        }
        if input.key_pressed(Key::ArrowLeft) {
            actions.push(UiAction::Prev);
        }
        if input.key_pressed(Key::Space) {
            actions.push(UiAction::TogglePlay);
        }
        if input.key_pressed(Key::F) {
            actions.push(UiAction::ToggleFullscreen);
        }
        if !fullscreen && input.key_pressed(Key::Backspace) {
            actions.push(UiAction::Back);
        }
    });
}

pub fn header(ui: &mut Ui) {
    ui.vertical_centered(|ui| {
        ui.heading(RichText::new("Loterica Dalila Slides da Semana").size(30.0).strong());
        ui.label(RichText::new("Selecione um dia para ver a apresentação").color(Color32::LIGHT_GRAY));
    });
    ui.add_space(24.0);
}

/// One tile per selectable day, three per row.
pub fn day_grid(ui: &mut Ui, actions: &mut Vec<UiAction>) {
    egui::Grid::new("day_grid").num_columns(3).spacing([24.0, 24.0]).show(ui, |ui| {
        for (i, day) in WeekDay::SELECTABLE.into_iter().enumerate() {
            let label = RichText::new(day.display_name()).size(20.0).color(Color32::WHITE).strong();
            let tile = egui::Button::new(label).fill(accent_color(day));
            if ui.add_sized(TILE_SIZE, tile).clicked() {
                actions.push(UiAction::SelectDay(day));
            }
            if (i + 1) % 3 == 0 {
                ui.end_row();
            }
        }
    });
}

/// Day header, media area and playback controls.
pub fn viewer(ui: &mut Ui, model: &ViewerModel<'_>, actions: &mut Vec<UiAction>) {
    ui.horizontal(|ui| {
        let (dot, _) = ui.allocate_exact_size(vec2(16.0, 16.0), Sense::hover());
        ui.painter().circle_filled(dot.center(), 8.0, accent_color(model.day));
        ui.heading(model.day.display_name());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("⬅ Voltar").clicked() {
                actions.push(UiAction::Back);
            }
        });
    });
    ui.add_space(8.0);

    let width = ui.available_width();
    let (area, _) = ui.allocate_exact_size(vec2(width, width * 9.0 / 16.0), Sense::hover());
    ui.painter().rect_filled(area, 8.0, Color32::BLACK);
    if model.loading {
        ui.put(area, egui::Spinner::new().size(32.0));
    } else if model.error.has_error() || model.current_slide().is_none() {
        ui.painter().text(area.center(), Align2::CENTER_CENTER, "⚠", FontId::proportional(32.0), ERROR_RED);
    } else {
        media_area(ui, area, model.current_slide());
    }

    ui.add_space(8.0);
    controls(ui, model.is_playing, true, actions);
}

/// Draws the active slide into `area`, letterboxed, with its title overlaid.
pub fn media_area(ui: &mut Ui, area: Rect, slide: Option<&Slide>) {
    match media::view_for(slide) {
        MediaView::Image { src, alt } => {
            ui.put(area, egui::Image::new(src).fit_to_exact_size(area.size()));
            draw_title_overlay(ui, area, alt);
        }
        MediaView::Video { src, title, autoplay, muted, looping } => {
            trace!("Video slide '{}' ({}): autoplay={} muted={} looping={}", title, src, autoplay, muted, looping);
            let glyph = if autoplay { "▶" } else { "⏸" };
            ui.painter().text(area.center(), Align2::CENTER_CENTER, glyph, FontId::proportional(64.0), Color32::WHITE);
            let hint = match (muted, looping) {
                (true, true) => "🔇 🔁",
                (true, false) => "🔇",
                (false, true) => "🔁",
                (false, false) => "",
            };
            ui.painter().text(area.right_top() + vec2(-TITLE_PADDING, TITLE_PADDING), Align2::RIGHT_TOP, hint, FontId::proportional(18.0), Color32::LIGHT_GRAY);
            draw_title_overlay(ui, area, title);
        }
        MediaView::Unsupported { message } | MediaView::Empty { message } => {
            ui.painter().text(area.center(), Align2::CENTER_CENTER, message, FontId::proportional(20.0), Color32::LIGHT_GRAY);
        }
    }
}

/// Title on a translucent band along the bottom edge of `area`, clipped to it.
fn draw_title_overlay(ui: &Ui, area: Rect, title: &str) {
    if title.trim().is_empty() {
        return;
    }
    let painter = ui.painter_at(area);
    let galley = painter.layout_no_wrap(title.to_string(), FontId::proportional(22.0), Color32::WHITE);
    let band = Rect::from_min_max(
        egui::pos2(area.left(), area.bottom() - galley.size().y - 2.0 * TITLE_PADDING),
        area.right_bottom(),
    );
    painter.rect_filled(band, 0.0, Color32::from_black_alpha(160));
    let pos = egui::pos2(area.left() + TITLE_PADDING, band.top() + TITLE_PADDING);
    painter.galley(pos, galley, Color32::WHITE);
}

/// Prev / play-pause / next, plus the fullscreen toggle when asked for.
pub fn controls(ui: &mut Ui, is_playing: bool, show_fullscreen: bool, actions: &mut Vec<UiAction>) {
    ui.horizontal(|ui| {
        if ui.button(RichText::new("⏮").size(22.0)).clicked() {
            actions.push(UiAction::Prev);
        }
        let play_label = if is_playing { "⏸" } else { "▶" };
        if ui.button(RichText::new(play_label).size(22.0)).clicked() {
            actions.push(UiAction::TogglePlay);
        }
        if ui.button(RichText::new("⏭").size(22.0)).clicked() {
            actions.push(UiAction::Next);
        }
        if show_fullscreen && ui.button(RichText::new("⛶").size(22.0)).clicked() {
            actions.push(UiAction::ToggleFullscreen);
        }
    });
}

/// Error message with retry (network errors only) and dismiss actions.
pub fn error_banner(ui: &mut Ui, error: &ErrorState, actions: &mut Vec<UiAction>) {
    if !error.has_error() {
        return;
    }
    egui::Frame::none().fill(BANNER_FILL).rounding(8.0).inner_margin(12.0).show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.colored_label(ERROR_RED, "⚠");
            ui.vertical(|ui| {
                ui.label(RichText::new(error_title(error.kind())).strong().color(Color32::WHITE));
                ui.label(RichText::new(error.message()).color(Color32::from_rgb(0xfe, 0xca, 0xca)));
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("✖").clicked() {
                    actions.push(UiAction::DismissError);
                }
                if error.can_retry() && ui.button("⟳ Tentar novamente").clicked() {
                    actions.push(UiAction::Retry);
                }
            });
        });
    });
    ui.add_space(12.0);
}

fn error_title(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Network => "Erro de conexão",
        ErrorKind::NoContent => "Indisponível",
        ErrorKind::Api | ErrorKind::Iframe | ErrorKind::General => "Erro",
    }
}

/// Every slide of the day; clicking one jumps to it.
pub fn slide_list(ui: &mut Ui, slides: &[Slide], current: usize, actions: &mut Vec<UiAction>) {
    if slides.is_empty() {
        return;
    }
    ui.label(RichText::new("Todas as Apresentações").size(18.0).strong());
    egui::ScrollArea::vertical().max_height(280.0).show(ui, |ui| {
        for (i, slide) in slides.iter().enumerate() {
            ui.horizontal(|ui| {
                match &slide.thumbnail {
                    Some(thumbnail) => {
                        ui.add(egui::Image::new(thumbnail.as_str()).fit_to_exact_size(THUMBNAIL_SIZE.into()));
                    }
                    None => {
                        ui.add_sized(THUMBNAIL_SIZE, egui::Label::new(RichText::new("⚠").color(Color32::GRAY)));
                    }
                }
                let text = format!("{}\nSlide {}", slide.title, i + 1);
                if ui.selectable_label(i == current, text).clicked() {
                    actions.push(UiAction::JumpTo(i));
                }
            });
        }
    });
}

/// The current slide over the whole window, controls along the bottom.
pub fn fullscreen_view(ctx: &egui::Context, slide: Option<&Slide>, is_playing: bool, actions: &mut Vec<UiAction>) {
    egui::TopBottomPanel::bottom("fullscreen_controls")
        .frame(egui::Frame::none().fill(Color32::BLACK).inner_margin(12.0))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                controls(ui, is_playing, false, actions);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button(RichText::new("✖").size(22.0)).clicked() {
                        actions.push(UiAction::ToggleFullscreen);
                    }
                });
            });
        });
    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(Color32::BLACK))
        .show(ctx, |ui| {
            let area = ui.available_rect_before_wrap();
            media_area(ui, area, slide);
        });
}

/// The window's own fullscreen, through viewport commands.
///
/// Backends that do not report the viewport state fall back to `assumed`.
pub struct ViewportFullscreen<'a> {
    pub ctx: &'a egui::Context,
    pub assumed: bool,
}

impl FullscreenSurface for ViewportFullscreen<'_> {
    fn is_fullscreen(&self) -> bool {
        self.ctx.input(|i| i.viewport().fullscreen).unwrap_or(self.assumed)
    }

    fn request_fullscreen(&mut self) -> Result<(), String> {
        self.ctx.send_viewport_cmd(ViewportCommand::Fullscreen(true));
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), String> {
        self.ctx.send_viewport_cmd(ViewportCommand::Fullscreen(false));
        Ok(())
    }
}
