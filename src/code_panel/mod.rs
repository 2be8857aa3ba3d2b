pub mod gutter;
pub mod highlighter;
pub mod utils;

use eframe::egui;

use crate::app_state::AppState;
use crate::autocomplete;
use crate::compiler::Diagnostic;
use crate::states::InputFormat;

const EDITOR_BG: egui::Color32 = egui::Color32::from_rgb(10, 10, 10);
const ERROR_TINT: egui::Color32 = egui::Color32::from_rgb(200, 70, 70);

fn file_name(format: InputFormat) -> &'static str {
    match format {
        InputFormat::Scss => "input.scss",
        InputFormat::Indented => "input.sass",
    }
}

/// Input editor: gutter, highlighted TextEdit, diagnostics, color swatches,
/// autocomplete. Edits and selection changes are written to the session.
pub fn show(ui: &mut egui::Ui, state: &mut AppState, now: f64) {
    let has_error = state.session.state().compiler_has_error;
    let font_size = state.settings.font_size;

    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new(format!("📄 {}", file_name(state.session.state().input_format)))
                .color(egui::Color32::from_rgb(224, 224, 224))
                .size(13.0),
        );
        if has_error {
            ui.colored_label(ERROR_TINT, "● error");
        }
    });
    ui.separator();

    let mut layouter = |ui: &egui::Ui, string: &str, wrap_width: f32| {
        let mut layout_job = egui::text::LayoutJob::default();
        highlighter::highlight_code(&mut layout_job, string, font_size);
        layout_job.wrap.max_width = wrap_width;
        ui.fonts(|f| f.layout_job(layout_job))
    };

    let frame_stroke = if has_error {
        egui::Stroke::new(1.5, ERROR_TINT)
    } else {
        egui::Stroke::new(1.0, egui::Color32::from_gray(40))
    };

    egui::Frame::none()
        .fill(EDITOR_BG)
        .stroke(frame_stroke)
        .show(ui, |ui| {
            egui::ScrollArea::vertical()
                .id_source("input_editor_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.set_min_width(ui.available_width());
                    ui.set_min_height(ui.available_height());

                    let text_edit_id = ui.make_persistent_id("input_text_edit");

                    // 1. Keys for the popup, BEFORE the TextEdit sees them
                    let mut accepted = autocomplete::process_input(
                        ui,
                        text_edit_id,
                        &mut state.editor_text,
                        &mut state.completion,
                    );

                    // 2. Deep-link selection
                    let mut scroll_to_selection = None;
                    if let Some(selection) = state.pending_selection.take() {
                        let range = utils::chars_of_selection(&state.editor_text, &selection);
                        let mut te_state =
                            egui::TextEdit::load_state(ui.ctx(), text_edit_id).unwrap_or_default();
                        te_state.cursor.set_char_range(Some(egui::text::CCursorRange::two(
                            egui::text::CCursor::new(range.start),
                            egui::text::CCursor::new(range.end),
                        )));
                        egui::TextEdit::store_state(ui.ctx(), text_edit_id, te_state);
                        ui.ctx().memory_mut(|mem| mem.request_focus(text_edit_id));
                        scroll_to_selection = Some(range.start);
                    }

                    let gutter_width = (font_size * 0.6) * digits(&state.editor_text) as f32 + 28.0;

                    ui.horizontal_top(|ui| {
                        ui.spacing_mut().item_spacing.x = 0.0;
                        let gutter_response = ui.allocate_rect(
                            egui::Rect::from_min_size(
                                ui.cursor().min,
                                egui::vec2(gutter_width, ui.available_height()),
                            ),
                            egui::Sense::click(),
                        );
                        ui.add_space(6.0);

                        let rows = state.editor_text.lines().count().max(12);
                        let output = egui::TextEdit::multiline(&mut state.editor_text)
                            .id(text_edit_id)
                            .font(egui::FontId::monospace(font_size))
                            .code_editor()
                            .desired_rows(rows)
                            .frame(false)
                            .desired_width(f32::INFINITY)
                            .lock_focus(true)
                            .layouter(&mut layouter)
                            .show(ui);

                        // 3. Popup AFTER the TextEdit
                        accepted |= autocomplete::handle_state_and_render(
                            ui,
                            &output,
                            &mut state.editor_text,
                            &mut state.completion,
                        );

                        gutter::render_gutter(
                            ui,
                            &gutter_response,
                            &output,
                            text_edit_id,
                            &state.editor_text,
                            state.session.diagnostics(),
                            font_size,
                        );
                        paint_squiggles(ui, &output, &state.editor_text, state.session.diagnostics());
                        utils::paint_color_swatches(ui, &state.editor_text, &output, font_size);

                        if let Some(char_idx) = scroll_to_selection {
                            let cursor = output.galley.from_ccursor(egui::text::CCursor::new(char_idx));
                            let rect = output.galley.pos_from_cursor(&cursor).translate(output.galley_pos.to_vec2());
                            ui.scroll_to_rect(rect, Some(egui::Align::Center));
                        }

                        if output.response.changed() || accepted {
                            state
                                .session
                                .set_input_value(state.editor_text.clone(), now);
                        }

                        if let Some(range) = output.cursor_range {
                            let selection = utils::selection_from_chars(
                                &state.editor_text,
                                range.secondary.ccursor.index..range.primary.ccursor.index,
                            );
                            state.session.set_selection(selection, now);
                        }
                    });
                });
        });
}

fn digits(code: &str) -> usize {
    let lines = code.split('\n').count().max(1);
    lines.to_string().len().max(2)
}

/// Wavy underline under every diagnostic, with the message on hover.
fn paint_squiggles(
    ui: &egui::Ui,
    output: &egui::text_edit::TextEditOutput,
    code: &str,
    diagnostics: &[Diagnostic],
) {
    let galley = &output.galley;
    let origin = output.galley_pos.to_vec2();
    let painter = ui.painter();

    for (index, diagnostic) in diagnostics.iter().enumerate() {
        let color = gutter::severity_color(diagnostic.severity);

        for segment in utils::line_segments(code, diagnostic.from, diagnostic.to) {
            let (seg_start, seg_end) = (segment.start, segment.end);
            let start = galley.from_ccursor(egui::text::CCursor::new(utils::byte_to_char(code, seg_start)));
            let end = galley.from_ccursor(egui::text::CCursor::new(utils::byte_to_char(code, seg_end)));
            let start_rect = galley.pos_from_cursor(&start).translate(origin);
            let end_rect = galley.pos_from_cursor(&end).translate(origin);
            let x_end = if start.rcursor.row == end.rcursor.row {
                end_rect.left()
            } else {
                galley.rows[start.rcursor.row].rect.right() + origin.x
            };
            let x_end = x_end.max(start_rect.left() + 6.0);

            let y = start_rect.bottom() - 1.0;
            let mut points = Vec::new();
            let mut x = start_rect.left();
            let mut up = true;
            while x < x_end {
                points.push(egui::pos2(x, if up { y - 1.5 } else { y + 1.0 }));
                x += 3.0;
                up = !up;
            }
            points.push(egui::pos2(x_end, y));
            painter.add(egui::Shape::line(points, egui::Stroke::new(1.0, color)));

            let hover = egui::Rect::from_min_max(
                egui::pos2(start_rect.left(), start_rect.top()),
                egui::pos2(x_end, start_rect.bottom() + 2.0),
            );
            if ui.rect_contains_pointer(hover) {
                egui::show_tooltip_at_pointer(
                    ui.ctx(),
                    egui::Id::new(("diagnostic", index, seg_start)),
                    |ui| {
                        ui.colored_label(color, &diagnostic.message);
                    },
                );
            }
        }
    }
}
