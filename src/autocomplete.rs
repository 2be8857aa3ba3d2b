use std::ops::Range;

use eframe::egui;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::code_panel::utils::{byte_to_char, char_to_byte};

// ─── Completion sources ──────────────────────────────────────────────────────

const AT_RULE_KEYWORDS: &[&str] = &[
    "use", "forward", "import", "mixin", "include", "function", "extend", "error", "warn",
    "debug", "at-root", "if", "else", "each", "for", "while",
];

pub struct BuiltinModule {
    pub name: &'static str,
    pub description: &'static str,
    pub variables: &'static [&'static str],
    pub functions: &'static [&'static str],
}

pub const BUILTIN_MODULES: &[BuiltinModule] = &[
    BuiltinModule {
        name: "color",
        description: "generates new colors based on existing ones, making it easy to build color themes",
        variables: &[],
        functions: &[
            "adjust", "alpha", "blackness", "blue", "change", "complement", "grayscale", "green",
            "hue", "hwb", "ie-hex-str", "invert", "lightness", "mix", "red", "saturation", "scale",
            "whiteness",
        ],
    },
    BuiltinModule {
        name: "list",
        description: "lets you access and modify values in lists",
        variables: &[],
        functions: &[
            "append", "index", "is-bracketed", "join", "length", "nth", "separator", "set-nth",
            "slash", "zip",
        ],
    },
    BuiltinModule {
        name: "map",
        description: "makes it possible to look up the value associated with a key in a map, and much more",
        variables: &[],
        functions: &["deep-merge", "deep-remove", "get", "has-key", "keys", "merge", "remove", "set", "values"],
    },
    BuiltinModule {
        name: "math",
        description: "provides functions that operate on numbers",
        variables: &[
            "$e", "$pi", "$epsilon", "$max-safe-integer", "$min-safe-integer", "$max-number",
            "$min-number",
        ],
        functions: &[
            "ceil", "clamp", "floor", "max", "min", "round", "abs", "hypot", "log", "pow", "sqrt",
            "acos", "asin", "atan", "atan2", "cos", "sin", "tan", "compatible", "is-unitless",
            "unit", "div", "percentage", "random",
        ],
    },
    BuiltinModule {
        name: "meta",
        description: "exposes the details of Sass's inner workings",
        variables: &[],
        functions: &[
            "calc-args", "calc-name", "call", "content-exists", "feature-exists", "function-exists",
            "get-function", "global-variable-exists", "inspect", "keywords", "mixin-exists",
            "module-functions", "module-variables", "type-of", "variable-exists",
        ],
    },
    BuiltinModule {
        name: "selector",
        description: "provides access to Sass's powerful selector engine",
        variables: &[],
        functions: &["append", "extend", "is-superselector", "nest", "parse", "replace", "unify", "simple-selectors"],
    },
    BuiltinModule {
        name: "string",
        description: "makes it easy to combine, search, or split apart strings",
        variables: &[],
        functions: &["index", "insert", "length", "quote", "slice", "to-lower-case", "to-upper-case", "unique-id", "unquote"],
    },
];

static AT_RULE_BEFORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[\w-]*$").expect("at-rule regex"));
static USE_MODULE_BEFORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@use\s+("(?:sass:)?[\w-]*)$"#).expect("@use regex"));
static MODULE_MEMBER_BEFORE: Lazy<Regex> = Lazy::new(|| {
    let names: Vec<&str> = BUILTIN_MODULES.iter().map(|m| m.name).collect();
    Regex::new(&format!(r"\b(?:{})\.\$?[\w-]*$", names.join("|"))).expect("module member regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Keyword,
    Module,
    Variable,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub label: String,
    /// Text that replaces the matched range.
    pub insert: String,
    pub kind: CompletionKind,
    pub info: Option<&'static str>,
}

/// Suggestions for the word ending at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSet {
    /// Byte range the chosen completion replaces.
    pub range: Range<usize>,
    pub items: Vec<Completion>,
}

/// Computes completions at byte offset `cursor`. Only the current line
/// before the cursor is inspected.
pub fn completions_at(text: &str, cursor: usize) -> Option<CompletionSet> {
    if cursor > text.len() || !text.is_char_boundary(cursor) {
        return None;
    }
    let line_start = text[..cursor].rfind('\n').map_or(0, |i| i + 1);
    let before = &text[line_start..cursor];

    let (range, items) = if let Some(caps) = USE_MODULE_BEFORE.captures(before) {
        let typed = caps.get(1)?;
        (typed.start()..typed.end(), module_completions(typed.as_str()))
    } else if let Some(m) = MODULE_MEMBER_BEFORE.find(before) {
        (m.start()..m.end(), member_completions(m.as_str()))
    } else if let Some(m) = AT_RULE_BEFORE.find(before) {
        (m.start()..m.end(), at_rule_completions(m.as_str()))
    } else {
        return None;
    };

    // a lone exact match leaves nothing to complete
    if items.is_empty() || (items.len() == 1 && items[0].insert == before[range.clone()]) {
        return None;
    }
    Some(CompletionSet {
        range: line_start + range.start..line_start + range.end,
        items,
    })
}

fn at_rule_completions(typed: &str) -> Vec<Completion> {
    AT_RULE_KEYWORDS
        .iter()
        .map(|keyword| format!("@{keyword}"))
        .filter(|label| label.starts_with(typed))
        .map(|label| Completion {
            insert: format!("{label} "),
            label,
            kind: CompletionKind::Keyword,
            info: None,
        })
        .collect()
}

fn module_completions(typed: &str) -> Vec<Completion> {
    BUILTIN_MODULES
        .iter()
        .filter_map(|module| {
            // closing quote is usually already there
            let insert = format!("\"sass:{}", module.name);
            insert.starts_with(typed).then(|| Completion {
                label: format!("\"sass:{}\"", module.name),
                insert,
                kind: CompletionKind::Module,
                info: Some(module.description),
            })
        })
        .collect()
}

fn member_completions(typed: &str) -> Vec<Completion> {
    let mut items = Vec::new();
    for module in BUILTIN_MODULES {
        let variables = module
            .variables
            .iter()
            .map(|v| (format!("{}.{v}", module.name), CompletionKind::Variable));
        let functions = module
            .functions
            .iter()
            .map(|f| (format!("{}.{f}", module.name), CompletionKind::Function));
        for (label, kind) in functions.chain(variables) {
            if label.starts_with(typed) {
                items.push(Completion {
                    insert: label.clone(),
                    label,
                    kind,
                    info: None,
                });
            }
        }
    }
    items
}

/// Replaces the completed range; returns the new text and the byte offset
/// right after the inserted text.
pub fn apply_completion(text: &str, range: Range<usize>, completion: &Completion) -> (String, usize) {
    let mut out = String::with_capacity(text.len() + completion.insert.len());
    out.push_str(&text[..range.start]);
    out.push_str(&completion.insert);
    let cursor = out.len();
    out.push_str(&text[range.end..]);
    (out, cursor)
}

// ─── Popup ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct CompletionState {
    pub popup_open: bool,
    pub set: Option<CompletionSet>,
    pub selected_index: usize,
    /// Char index of the cursor when the popup was last updated.
    pub cursor_idx: usize,
}

impl CompletionState {
    pub fn close(&mut self) {
        self.popup_open = false;
        self.set = None;
        self.selected_index = 0;
    }

    fn items_len(&self) -> usize {
        self.set.as_ref().map_or(0, |set| set.items.len())
    }
}

/// Consumes navigation keys BEFORE the TextEdit sees them. Returns `true`
/// when `code` was modified by accepting a completion.
pub fn process_input(
    ui: &mut egui::Ui,
    text_edit_id: egui::Id,
    code: &mut String,
    completion: &mut CompletionState,
) -> bool {
    let len = completion.items_len();
    if !completion.popup_open || len == 0 {
        return false;
    }

    enum Action {
        Consume,
        Accept,
    }

    let action = if ui.input(|i| i.key_pressed(egui::Key::ArrowDown)) {
        completion.selected_index = (completion.selected_index + 1) % len;
        Some(Action::Consume)
    } else if ui.input(|i| i.key_pressed(egui::Key::ArrowUp)) {
        completion.selected_index = completion.selected_index.checked_sub(1).unwrap_or(len - 1);
        Some(Action::Consume)
    } else if ui.input(|i| i.key_pressed(egui::Key::Tab) || i.key_pressed(egui::Key::Enter)) {
        Some(Action::Accept)
    } else if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
        completion.close();
        Some(Action::Consume)
    } else {
        None
    };

    let Some(action) = action else {
        return false;
    };
    ui.input_mut(|i| {
        for key in [
            egui::Key::ArrowDown,
            egui::Key::ArrowUp,
            egui::Key::Tab,
            egui::Key::Enter,
            egui::Key::Escape,
        ] {
            i.consume_key(egui::Modifiers::NONE, key);
        }
    });

    match action {
        Action::Consume => false,
        Action::Accept => accept_selected(ui.ctx(), text_edit_id, code, completion),
    }
}

fn accept_selected(
    ctx: &egui::Context,
    text_edit_id: egui::Id,
    code: &mut String,
    completion: &mut CompletionState,
) -> bool {
    let Some(set) = completion.set.take() else {
        return false;
    };
    let Some(item) = set.items.get(completion.selected_index) else {
        completion.close();
        return false;
    };
    if set.range.end > code.len() {
        completion.close();
        return false;
    }

    let (text, cursor) = apply_completion(code, set.range.clone(), item);
    *code = text;
    let char_cursor = byte_to_char(code, cursor);
    if let Some(mut te_state) = egui::TextEdit::load_state(ctx, text_edit_id) {
        let ccursor = egui::text::CCursor::new(char_cursor);
        te_state
            .cursor
            .set_char_range(Some(egui::text::CCursorRange::one(ccursor)));
        egui::TextEdit::store_state(ctx, text_edit_id, te_state);
    }
    completion.cursor_idx = char_cursor;
    completion.close();
    true
}

/// Opens/refreshes the popup after typing and renders it. Call AFTER the
/// TextEdit. Returns `true` when a click accepted a completion.
pub fn handle_state_and_render(
    ui: &mut egui::Ui,
    output: &egui::text_edit::TextEditOutput,
    code: &mut String,
    completion: &mut CompletionState,
) -> bool {
    let response = &output.response;
    if !response.has_focus() {
        completion.close();
        return false;
    }

    if let Some(range) = output.cursor_range {
        completion.cursor_idx = range.primary.ccursor.index;
    }

    if response.changed() {
        let cursor = char_to_byte(code, completion.cursor_idx);
        completion.set = completions_at(code, cursor);
        completion.popup_open = completion.set.is_some();
        completion.selected_index = 0;
    }

    let Some(set) = completion.set.as_ref().filter(|_| completion.popup_open) else {
        return false;
    };

    // Anchor under the cursor
    let anchor = output
        .cursor_range
        .map(|range| {
            let rect = output.galley.pos_from_cursor(&range.primary);
            output.galley_pos + rect.left_bottom().to_vec2()
        })
        .unwrap_or(response.rect.min);

    let mut clicked = None;
    egui::Area::new(egui::Id::new("autocomplete_popup"))
        .fixed_pos(anchor + egui::vec2(0.0, 4.0))
        .order(egui::Order::Foreground)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style())
                .shadow(egui::epaint::Shadow {
                    offset: egui::Vec2::ZERO,
                    blur: 16.0,
                    spread: 8.0,
                    color: egui::Color32::from_black_alpha(96),
                })
                .show(ui, |ui| {
                    egui::ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                        for (i, item) in set.items.iter().enumerate() {
                            let selected = i == completion.selected_index;
                            let label = ui.selectable_label(selected, &item.label);
                            let label = match item.info {
                                Some(info) => label.on_hover_text(info),
                                None => label,
                            };
                            if selected {
                                label.scroll_to_me(None);
                            }
                            if label.clicked() {
                                clicked = Some(i);
                            }
                        }
                    });
                });
        });

    match clicked {
        Some(index) => {
            completion.selected_index = index;
            accept_selected(ui.ctx(), response.id, code, completion)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(set: &CompletionSet) -> Vec<&str> {
        set.items.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn at_sign_offers_every_at_rule() {
        let set = completions_at("a {\n  @", 7).expect("completions");
        assert_eq!(set.range, 6..7);
        assert_eq!(set.items.len(), AT_RULE_KEYWORDS.len());
        assert_eq!(set.items[0].insert, "@use ");
    }

    #[test]
    fn at_rule_prefix_filters() {
        let set = completions_at("@inc", 4).expect("completions");
        assert_eq!(labels(&set), vec!["@include"]);
        let (text, cursor) = apply_completion("@inc", set.range, &set.items[0]);
        assert_eq!(text, "@include ");
        assert_eq!(cursor, 9);
    }

    #[test]
    fn use_string_offers_builtin_modules() {
        let text = "@use \"sass:m\";";
        let set = completions_at(text, 12).expect("completions");
        assert_eq!(labels(&set), vec!["\"sass:map\"", "\"sass:math\"", "\"sass:meta\""]);
        let (text, _) = apply_completion(text, set.range, &set.items[1]);
        assert_eq!(text, "@use \"sass:math\";");
    }

    #[test]
    fn module_members_after_namespace() {
        let text = "a { b: math.f";
        let set = completions_at(text, text.len()).expect("completions");
        assert_eq!(labels(&set), vec!["math.floor"]);
        assert_eq!(set.range, 7..text.len());

        let vars = completions_at("math.$", 6).expect("variables");
        assert!(vars.items.iter().all(|c| c.kind == CompletionKind::Variable));
        assert!(labels(&vars).contains(&"math.$pi"));
    }

    #[test]
    fn nothing_to_offer() {
        assert_eq!(completions_at("a { color: red }", 10), None);
        assert_eq!(completions_at("@zzz", 4), None);
        // already complete
        assert_eq!(completions_at("math.floor", 10), None);
        // not a char boundary
        assert_eq!(completions_at("é", 1), None);
    }
}
