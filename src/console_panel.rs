use eframe::egui;

use crate::app_state::AppState;
use crate::compiler::{ConsoleLine, LogKind};
use crate::states::Selection;

fn kind_color(kind: LogKind) -> egui::Color32 {
    match kind {
        LogKind::Error => egui::Color32::from_rgb(220, 90, 90),
        LogKind::Warn => egui::Color32::from_rgb(230, 180, 60),
        LogKind::Debug => egui::Color32::from_rgb(120, 170, 230),
    }
}

/// Selects the whole of `line_number` (1-based) in the editor.
fn line_selection(line_number: usize) -> Option<Selection> {
    Selection::new(line_number, 1, line_number + 1, 1)
}

/// One row per debug-output entry of the last compile. Clicking a located
/// row selects that line in the editor.
pub fn show(ui: &mut egui::Ui, state: &mut AppState) {
    let lines: &[ConsoleLine] = state.session.console();
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Console").strong());
        ui.label(egui::RichText::new(format!("{} entries", lines.len())).weak());
    });
    ui.separator();

    let mut jump_to = None;
    egui::ScrollArea::vertical()
        .id_source("console_scroll")
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if lines.is_empty() {
                ui.label(egui::RichText::new("No output").italics().weak());
            }
            for (i, line) in lines.iter().enumerate() {
                ui.horizontal_wrapped(|ui| {
                    let label = egui::RichText::new(line.location_label())
                        .monospace()
                        .color(kind_color(line.kind));
                    match line.line_number {
                        Some(number) => {
                            if ui
                                .add(egui::Label::new(label).sense(egui::Sense::click()))
                                .on_hover_text(format!("Go to line {number}"))
                                .clicked()
                            {
                                jump_to = line_selection(number);
                            }
                        }
                        None => {
                            ui.label(label);
                        }
                    }
                    ui.add(egui::Label::new(egui::RichText::new(&line.message).monospace()).wrap(true));
                });
                if i + 1 < lines.len() {
                    ui.add_space(2.0);
                }
            }
        });

    if jump_to.is_some() {
        state.pending_selection = jump_to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_selects_whole_line() {
        let selection = line_selection(3).expect("selection");
        assert_eq!(selection.to_string(), "L3C1-L4C1");
    }
}
