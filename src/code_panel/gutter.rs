use std::collections::HashMap;

use eframe::egui;

use super::utils::{byte_to_char, char_to_byte};
use crate::compiler::{Diagnostic, Severity};

pub(crate) fn severity_color(severity: Severity) -> egui::Color32 {
    match severity {
        Severity::Error => egui::Color32::from_rgb(220, 80, 80),
        Severity::Warning => egui::Color32::from_rgb(230, 180, 60),
        Severity::Info => egui::Color32::from_rgb(90, 160, 230),
    }
}

/// Most severe diagnostic per 0-based line.
fn worst_per_line(diagnostics: &[Diagnostic]) -> HashMap<usize, &Diagnostic> {
    let mut by_line: HashMap<usize, &Diagnostic> = HashMap::new();
    for d in diagnostics {
        by_line
            .entry(d.line)
            .and_modify(|current| {
                if d.severity > current.severity {
                    *current = d;
                }
            })
            .or_insert(d);
    }
    by_line
}

/// Paints line numbers and diagnostic markers into the pre-allocated gutter
/// and moves the cursor on gutter clicks. Clicking a marker jumps to the
/// start of its diagnostic.
pub(crate) fn render_gutter(
    ui: &mut egui::Ui,
    gutter_response: &egui::Response,
    output: &egui::text_edit::TextEditOutput,
    text_edit_id: egui::Id,
    code: &str,
    diagnostics: &[Diagnostic],
    font_size: f32,
) {
    let font_id = egui::FontId::monospace(font_size);
    let gutter_rect = gutter_response.rect;

    let active_line_idx = output
        .cursor_range
        .map(|range| {
            code.chars()
                .take(range.primary.ccursor.index)
                .filter(|&c| c == '\n')
                .count()
        })
        .unwrap_or(0);

    let mut full_gutter_rect = gutter_rect;
    full_gutter_rect.set_bottom(ui.clip_rect().bottom().max(output.response.rect.bottom()));
    let gutter_painter = ui.painter().with_clip_rect(full_gutter_rect);
    gutter_painter.rect_filled(full_gutter_rect, 0.0, egui::Color32::from_rgb(24, 24, 24));

    let gutter_text_color = egui::Color32::from_gray(100);
    let galley = &output.galley;
    let galley_pos = output.galley_pos;
    let markers = worst_per_line(diagnostics);

    // Rows of a wrapped line do not end with a newline
    let mut line_index = 0;
    let mut starts_line = true;
    for row in &galley.rows {
        let this_line = line_index;
        let is_start = starts_line;
        starts_line = row.ends_with_newline;
        if row.ends_with_newline {
            line_index += 1;
        }
        if !is_start {
            continue;
        }

        let y = galley_pos.y + row.rect.top();
        if y + row.rect.height() < ui.clip_rect().top() {
            continue;
        }
        if y > ui.clip_rect().bottom() {
            break;
        }

        let is_active = this_line == active_line_idx;
        gutter_painter.text(
            egui::pos2(full_gutter_rect.right() - 8.0, y),
            egui::Align2::RIGHT_TOP,
            (this_line + 1).to_string(),
            font_id.clone(),
            if is_active {
                egui::Color32::from_rgb(220, 220, 220)
            } else {
                gutter_text_color
            },
        );

        if let Some(diagnostic) = markers.get(&this_line) {
            let dot_center =
                egui::pos2(full_gutter_rect.left() + 10.0, y + row.rect.height() * 0.5);
            gutter_painter.circle_filled(dot_center, 4.0, severity_color(diagnostic.severity));

            let hit_rect =
                egui::Rect::from_center_size(dot_center, egui::vec2(16.0, row.rect.height()));
            if ui.rect_contains_pointer(hit_rect) {
                ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                egui::show_tooltip_at_pointer(
                    ui.ctx(),
                    egui::Id::new(("gutter_marker", this_line)),
                    |ui| {
                        ui.label(&diagnostic.message);
                    },
                );
            }
        }
    }

    if !gutter_response.clicked() {
        return;
    }
    let Some(pos) = ui.ctx().pointer_interact_pos() else {
        return;
    };
    let cursor = galley.cursor_from_pos(egui::vec2(0.0, pos.y - galley_pos.y));
    let mut char_idx = cursor.ccursor.index;

    let marker_hit_x = full_gutter_rect.left()..=full_gutter_rect.left() + 20.0;
    if marker_hit_x.contains(&pos.x) {
        let line = code.chars().take(char_idx).filter(|&c| c == '\n').count();
        if let Some(diagnostic) = markers.get(&line) {
            char_idx = byte_to_char(code, diagnostic.from);
        }
    } else {
        // line start
        let byte = char_to_byte(code, char_idx);
        let line_start = code[..byte].rfind('\n').map_or(0, |i| i + 1);
        char_idx = byte_to_char(code, line_start);
    }

    if let Some(mut te_state) = egui::TextEdit::load_state(ui.ctx(), text_edit_id) {
        te_state
            .cursor
            .set_char_range(Some(egui::text::CCursorRange::one(egui::text::CCursor::new(char_idx))));
        egui::TextEdit::store_state(ui.ctx(), text_edit_id, te_state);
    }
    ui.ctx().memory_mut(|mem| mem.request_focus(text_edit_id));
}
