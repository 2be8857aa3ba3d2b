use eframe::egui;

use crate::app_state::{AppState, ToastType};
use crate::settings::{FONT_SIZE_RANGE, MAX_DEBOUNCE_MS};

const WINDOW_WIDTH: f32 = 460.0;
const WINDOW_HEIGHT: f32 = 440.0;

/// Animated overlay editing a draft copy of the settings. "Done" validates
/// and applies the draft; closing any other way discards it.
pub fn show(ctx: &egui::Context, state: &mut AppState) {
    let now = ctx.input(|i| i.time);
    let start_time = *state.settings_open_time.get_or_insert(now);
    let duration = if state.settings_is_closing { 0.25 } else { 0.3 };
    let raw_t = ((now - start_time) as f32 / duration).clamp(0.0, 1.0);

    if state.settings_is_closing && raw_t >= 1.0 {
        state.show_settings = false;
        state.settings_open_time = None;
        state.settings_is_closing = false;
        return;
    }
    if raw_t < 1.0 {
        ctx.request_repaint();
    }

    let display_t = if state.settings_is_closing {
        1.0 - raw_t
    } else {
        1.0 - (1.0 - raw_t).powi(3)
    };
    let slide_offset = 20.0 * (1.0 - display_t);
    let screen_rect = ctx.input(|i| i.screen_rect());
    let center = screen_rect.center();

    egui::Area::new(egui::Id::new("settings_overlay"))
        .fixed_pos(egui::pos2(0.0, 0.0))
        .interactable(true)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            ui.painter().rect_filled(
                screen_rect,
                0.0,
                egui::Color32::from_black_alpha((200.0 * display_t) as u8),
            );
            if ui.allocate_rect(screen_rect, egui::Sense::click()).clicked() {
                close_settings(state);
            }
        });

    let window_pos = egui::pos2(
        center.x - WINDOW_WIDTH / 2.0,
        center.y - WINDOW_HEIGHT / 2.0 + slide_offset,
    );

    egui::Area::new(egui::Id::new("settings_content_area"))
        .fixed_pos(window_pos)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(egui::Color32::from_rgb(20, 20, 22))
                .rounding(20.0)
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_white_alpha(15)))
                .shadow(egui::epaint::Shadow {
                    offset: egui::Vec2::ZERO,
                    blur: 60.0,
                    spread: 30.0,
                    color: egui::Color32::from_black_alpha(160),
                })
                .show(ui, |ui| {
                    ui.set_width(WINDOW_WIDTH);
                    ui.set_height(WINDOW_HEIGHT);
                    ui.add_space(20.0);
                    render_header(ui, state);
                    ui.add_space(10.0);
                    ui.separator();
                    egui::ScrollArea::vertical()
                        .max_height(WINDOW_HEIGHT - 110.0)
                        .show(ui, |ui| {
                            ui.add_space(16.0);
                            render_body(ui, state);
                            ui.add_space(20.0);
                        });
                    render_footer(ui, state, now);
                    ui.add_space(20.0);
                });
        });
}

fn render_header(ui: &mut egui::Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.add_space(24.0);
        ui.heading(
            egui::RichText::new("Playground Settings")
                .size(20.0)
                .strong()
                .color(egui::Color32::from_white_alpha(240)),
        );
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.add_space(24.0);
            let close_btn = ui.add(
                egui::Button::new(
                    egui::RichText::new("✕")
                        .size(16.0)
                        .color(egui::Color32::from_gray(180)),
                )
                .frame(false),
            );
            if close_btn.clicked() {
                close_settings(state);
            }
            if close_btn.hovered() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            }
        });
    });
}

fn section(ui: &mut egui::Ui, title: &str, content: impl FnOnce(&mut egui::Ui)) {
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.add_space(24.0);
        ui.label(
            egui::RichText::new(title)
                .strong()
                .color(egui::Color32::WHITE)
                .size(16.0),
        );
    });
    ui.add_space(12.0);
    egui::Frame::none()
        .fill(egui::Color32::from_rgb(32, 32, 36))
        .rounding(12.0)
        .inner_margin(egui::Margin::symmetric(20.0, 16.0))
        .show(ui, content);
    ui.add_space(8.0);
}

fn render_body(ui: &mut egui::Ui, state: &mut AppState) {
    let label_color = egui::Color32::from_gray(170);
    let draft = &mut state.settings_draft;

    ui.vertical_centered(|ui| {
        ui.set_width(ui.available_width() - 48.0);

        section(ui, "Compilation", |ui| {
            egui::Grid::new("compile_grid")
                .num_columns(2)
                .spacing([40.0, 16.0])
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("Compile delay").color(label_color));
                    ui.add(
                        egui::DragValue::new(&mut draft.compile_debounce_ms)
                            .clamp_range(0..=MAX_DEBOUNCE_MS)
                            .suffix(" ms"),
                    );
                    ui.end_row();

                    ui.label(egui::RichText::new("Link update delay").color(label_color));
                    ui.add(
                        egui::DragValue::new(&mut draft.share_link_debounce_ms)
                            .clamp_range(0..=MAX_DEBOUNCE_MS)
                            .suffix(" ms"),
                    );
                    ui.end_row();
                });
        });

        section(ui, "Editor", |ui| {
            egui::Grid::new("editor_grid")
                .num_columns(2)
                .spacing([40.0, 16.0])
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("Font size").color(label_color));
                    ui.add(
                        egui::DragValue::new(&mut draft.font_size)
                            .clamp_range(FONT_SIZE_RANGE)
                            .speed(0.5),
                    );
                    ui.end_row();

                    ui.label(egui::RichText::new("Show console").color(label_color));
                    ui.checkbox(&mut draft.show_console, "");
                    ui.end_row();
                });
        });

        section(ui, "Sharing", |ui| {
            egui::Grid::new("share_grid")
                .num_columns(2)
                .spacing([40.0, 16.0])
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("Link base URL").color(label_color));
                    ui.add(egui::TextEdit::singleline(&mut draft.base_url).desired_width(220.0));
                    ui.end_row();

                    ui.label(egui::RichText::new("\"Copied\" alert").color(label_color));
                    ui.add(
                        egui::DragValue::new(&mut draft.copied_alert_secs)
                            .clamp_range(0.0..=30.0)
                            .speed(0.1)
                            .suffix(" s"),
                    );
                    ui.end_row();
                });
        });

        if let Some(error) = &state.settings_error {
            ui.add_space(8.0);
            ui.colored_label(egui::Color32::from_rgb(220, 100, 100), error);
        }
    });
}

fn render_footer(ui: &mut egui::Ui, state: &mut AppState, now: f64) {
    ui.add_space(8.0);
    ui.with_layout(egui::Layout::top_down(egui::Align::Center), |ui| {
        let btn = egui::Button::new(
            egui::RichText::new("Done")
                .size(15.0)
                .strong()
                .color(egui::Color32::WHITE),
        )
        .min_size(egui::vec2(160.0, 36.0))
        .fill(egui::Color32::from_rgb(100, 150, 255))
        .rounding(8.0)
        .stroke(egui::Stroke::NONE);

        if ui.add(btn).clicked() {
            match state.apply_settings(state.settings_draft.clone()) {
                Ok(()) => {
                    state.settings_error = None;
                    close_settings(state);
                }
                Err(err) => {
                    tracing::warn!(%err, "settings rejected");
                    state.settings_error = Some(err.to_string());
                    state.show_toast("Settings not applied", ToastType::Error, now);
                }
            }
        }
    });
}

/// Starts the closing animation. Unsaved edits are dropped.
pub fn close_settings(state: &mut AppState) {
    if !state.settings_is_closing {
        state.settings_is_closing = true;
        state.settings_open_time = None;
        state.settings_draft = state.settings.clone();
    }
}

/// Opens the modal with a fresh draft of the current settings.
pub fn open_settings(state: &mut AppState) {
    state.show_settings = true;
    state.settings_open_time = None;
    state.settings_is_closing = false;
    state.settings_draft = state.settings.clone();
    state.settings_error = None;
}
