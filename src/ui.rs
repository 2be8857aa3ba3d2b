use std::time::Duration;

use eframe::egui;

use crate::app_state::{AppState, ToastType};
use crate::codec::serialize_state;
use crate::compiler::GrassCompiler;
use crate::controller::PlaygroundSession;
use crate::settings::{resolve, Settings, SettingsOverrides};
use crate::share::ShareLocation;
use crate::states::{InputFormat, OutputFormat};
use crate::{code_panel, console_panel, modals, output_panel};

const SETTINGS_KEY: &str = "sass_playground.settings";
const FRAGMENT_KEY: &str = "sass_playground.fragment";

/// What `main` hands over to the window.
#[derive(Debug, Default)]
pub struct LaunchOptions {
    /// Link given on the command line; wins over the stored session.
    pub link: Option<String>,
    pub file_settings: Option<Settings>,
    pub overrides: SettingsOverrides,
    /// Skip the session stored by the previous run.
    pub fresh: bool,
}

pub struct PlaygroundApp {
    state: AppState,
}

impl PlaygroundApp {
    pub fn new(cc: &eframe::CreationContext<'_>, launch: LaunchOptions) -> Self {
        let storage = cc.storage.filter(|_| !launch.fresh);
        let stored_settings: Option<Settings> =
            storage.and_then(|s| eframe::get_value(s, SETTINGS_KEY));
        let stored_fragment = storage.and_then(|s| s.get_string(FRAGMENT_KEY));

        let settings = match resolve(launch.file_settings.clone(), stored_settings, &launch.overrides) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::error!(%err, "falling back to default settings");
                Settings::default()
            }
        };
        let base = settings
            .base_url()
            .unwrap_or_else(|_| ShareLocation::default().base().clone());

        let compiler = Box::new(GrassCompiler::new());
        let session = match launch.link.or(stored_fragment) {
            Some(link) => PlaygroundSession::from_link(&link, compiler, &settings, base),
            None => PlaygroundSession::new(compiler, &settings, base),
        };
        tracing::info!(version = %session.compiler_version(), "playground ready");

        Self {
            state: AppState::new(session, settings),
        }
    }
}

impl eframe::App for PlaygroundApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        let state = &mut self.state;

        // 1. Debounced work
        let outcome = state.tick(now);
        if !outcome.is_idle() {
            ctx.request_repaint();
        }

        // 2. Tab bar (top)
        egui::TopBottomPanel::top("tab_bar")
            .exact_height(36.0)
            .show(ctx, |ui| {
                tab_bar(ui, state, now);
            });

        // 3. Console (bottom)
        if state.settings.show_console {
            egui::TopBottomPanel::bottom("console_panel")
                .resizable(true)
                .min_height(60.0)
                .default_height(140.0)
                .show(ctx, |ui| {
                    console_panel::show(ui, state);
                });
        }

        // 4. Input | Output
        let half = ctx.screen_rect().width() * 0.5;
        egui::SidePanel::left("input_panel")
            .resizable(true)
            .default_width(half)
            .min_width(200.0)
            .show(ctx, |ui| {
                code_panel::show(ui, state, now);
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            output_panel::show(ui, state);
        });

        // 5. Overlays
        if state.show_open_link {
            open_link_window(ctx, state, now);
        }
        if state.show_settings {
            modals::settings::show(ctx, state);
        }
        show_toast(ctx, state, now);

        // Controls and error tint are redrawn every frame; a pending refresh
        // only needs the frame to happen.
        let invalidation = state.session.take_invalidation();
        if invalidation.controls || invalidation.error_indicator {
            ctx.request_repaint();
        }

        // 6. Wake up for the next timer
        let mut wait = state.session.next_deadline(now);
        let alerts = [
            state.session.copied_alert_remaining(now),
            state
                .toast
                .as_ref()
                .map(|t| t.deadline - now)
                .filter(|secs| *secs > 0.0),
        ];
        for secs in alerts.into_iter().flatten() {
            let alert = Duration::from_secs_f64(secs);
            wait = Some(wait.map_or(alert, |w| w.min(alert)));
        }
        if let Some(wait) = wait {
            ctx.request_repaint_after(wait);
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, SETTINGS_KEY, &self.state.settings);
        // Encode now: the share link may still be waiting on its debounce.
        match serialize_state(self.state.session.state()) {
            Ok(fragment) => storage.set_string(FRAGMENT_KEY, fragment),
            Err(err) => tracing::warn!(%err, "session not stored"),
        }
    }
}

fn format_button(ui: &mut egui::Ui, label: &str, active: bool) -> bool {
    let accent = egui::Color32::from_rgb(100, 150, 255);
    let mut btn = egui::Button::new(egui::RichText::new(label).size(13.0).color(if active {
        egui::Color32::WHITE
    } else {
        egui::Color32::from_gray(180)
    }))
    .rounding(6.0);
    btn = if active {
        btn.fill(accent).stroke(egui::Stroke::NONE)
    } else {
        btn.fill(egui::Color32::from_white_alpha(10))
    };
    ui.add(btn).clicked()
}

fn tab_bar(ui: &mut egui::Ui, state: &mut AppState, now: f64) {
    ui.horizontal_centered(|ui| {
        ui.spacing_mut().item_spacing.x = 6.0;

        let current = state.session.state().input_format;
        for format in InputFormat::ALL {
            // re-selecting the active format still recompiles
            if format_button(ui, format.label(), current == format) {
                state.session.set_input_format(format, now);
            }
        }
        ui.separator();
        let current = state.session.state().output_format;
        for format in OutputFormat::ALL {
            if format_button(ui, format.label(), current == format) {
                state.session.set_output_format(format, now);
            }
        }
        ui.separator();
        ui.label(egui::RichText::new(state.session.compiler_version()).weak().size(11.0));

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add(egui::Button::new("⚙").frame(false))
                .on_hover_text("Settings")
                .clicked()
            {
                if state.show_settings {
                    modals::settings::close_settings(state);
                } else {
                    modals::settings::open_settings(state);
                }
            }
            if ui.button("Open link…").clicked() {
                state.show_open_link = true;
                state.link_input.clear();
            }
            if ui
                .button("🔗 Copy link")
                .on_hover_text(state.session.share_link())
                .clicked()
            {
                let link = state.session.copy_link(now);
                ui.ctx().output_mut(|o| o.copied_text = link);
            }
            if state.session.copied_alert_visible(now) {
                ui.colored_label(egui::Color32::from_rgb(120, 200, 140), "Copied!");
            }
        });
    });
}

fn open_link_window(ctx: &egui::Context, state: &mut AppState, now: f64) {
    let mut open = true;
    let mut submitted = false;
    egui::Window::new("Open link")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 80.0))
        .show(ctx, |ui| {
            ui.label("Paste a playground link or fragment:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut state.link_input)
                    .desired_width(420.0)
                    .hint_text("https://sass-lang.com/playground#…"),
            );
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            ui.horizontal(|ui| {
                let can_open = !state.link_input.trim().is_empty();
                if ui.add_enabled(can_open, egui::Button::new("Open")).clicked() || (enter && can_open) {
                    submitted = true;
                }
            });
        });

    if submitted {
        let link = std::mem::take(&mut state.link_input);
        state.open_link(&link, now);
        open = false;
    }
    state.show_open_link = open;
}

fn show_toast(ctx: &egui::Context, state: &mut AppState, now: f64) {
    let Some(toast) = &state.toast else {
        return;
    };
    if now > toast.deadline {
        state.toast = None;
        return;
    }
    let bg_color = match toast.kind {
        ToastType::Error => egui::Color32::from_rgb(200, 50, 50),
        ToastType::Success => egui::Color32::from_rgb(50, 150, 50),
        ToastType::Info => egui::Color32::from_gray(80),
    };
    egui::Area::new(egui::Id::new("toast_notification"))
        .order(egui::Order::Tooltip)
        .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -60.0))
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(bg_color)
                .rounding(8.0)
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_white_alpha(50)))
                .inner_margin(12.0)
                .shadow(egui::epaint::Shadow {
                    offset: egui::Vec2::ZERO,
                    blur: 16.0,
                    spread: 8.0,
                    color: egui::Color32::from_black_alpha(96),
                })
                .show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(&toast.message)
                            .color(egui::Color32::WHITE)
                            .size(16.0),
                    );
                });
        });
}
