use eframe::egui;

use crate::app_state::AppState;
use crate::states::OutputFormat;

/// Read-only CSS viewer. Keeps showing the last successful output while the
/// input has errors.
pub fn show(ui: &mut egui::Ui, state: &AppState) {
    let output_format = state.session.state().output_format;
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new("📄 output.css")
                .color(egui::Color32::from_rgb(224, 224, 224))
                .size(13.0),
        );
        ui.label(
            egui::RichText::new(match output_format {
                OutputFormat::Expanded => "expanded",
                OutputFormat::Compressed => "compressed",
            })
            .weak(),
        );
    });
    ui.separator();

    let font_size = state.settings.font_size;
    let theme = egui_extras::syntax_highlighting::CodeTheme::from_memory(ui.ctx());
    let mut layouter = |ui: &egui::Ui, string: &str, wrap_width: f32| {
        let mut layout_job =
            egui_extras::syntax_highlighting::highlight(ui.ctx(), &theme, string, "css");
        for section in &mut layout_job.sections {
            section.format.font_id = egui::FontId::monospace(font_size);
        }
        layout_job.wrap.max_width = wrap_width;
        ui.fonts(|f| f.layout_job(layout_job))
    };

    let mut text = state.session.output_text();
    egui::ScrollArea::both()
        .id_source("output_scroll")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut text)
                    .id(ui.make_persistent_id("output_text"))
                    .code_editor()
                    .frame(false)
                    .desired_width(f32::INFINITY)
                    .layouter(&mut layouter),
            );
        });
}
