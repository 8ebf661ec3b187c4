//! Reply and inline keyboard builders.

use crate::callback::{CallbackAction, ExampleTopic, FormulaMenu, PageNav, QuickAction};
use crate::core::{Row, RowPage};
use crate::format::button_preview;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

/// At most this many row buttons are attached to one message.
pub const MAX_ROW_BUTTONS: usize = 10;

/// The persistent reply-keyboard entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuButton {
    Search,
    GetRow,
    AllRows,
    Columns,
    EditRow,
    NewRow,
    Formulas,
    Help,
    About,
}

impl MenuButton {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Search => "🔍 Search",
            Self::GetRow => "📊 Row by number",
            Self::AllRows => "📄 All rows",
            Self::Columns => "📋 Columns",
            Self::EditRow => "✏️ Edit row",
            Self::NewRow => "➕ New row",
            Self::Formulas => "🧮 Formulas",
            Self::Help => "📝 Help",
            Self::About => "ℹ️ About",
        }
    }

    /// Match incoming message text against the menu labels.
    pub fn from_label(text: &str) -> Option<Self> {
        [
            Self::Search,
            Self::GetRow,
            Self::AllRows,
            Self::Columns,
            Self::EditRow,
            Self::NewRow,
            Self::Formulas,
            Self::Help,
            Self::About,
        ]
        .into_iter()
        .find(|b| b.label() == text)
    }
}

fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.into(), action.encode())
}

/// The persistent main menu shown under the input field.
pub fn main_menu() -> KeyboardMarkup {
    let rows = vec![
        vec![
            KeyboardButton::new(MenuButton::Search.label()),
            KeyboardButton::new(MenuButton::GetRow.label()),
        ],
        vec![
            KeyboardButton::new(MenuButton::AllRows.label()),
            KeyboardButton::new(MenuButton::Columns.label()),
        ],
        vec![
            KeyboardButton::new(MenuButton::EditRow.label()),
            KeyboardButton::new(MenuButton::NewRow.label()),
        ],
        vec![KeyboardButton::new(MenuButton::Formulas.label())],
        vec![
            KeyboardButton::new(MenuButton::Help.label()),
            KeyboardButton::new(MenuButton::About.label()),
        ],
    ];
    let mut markup = KeyboardMarkup::new(rows);
    markup.resize_keyboard = true;
    markup
}

/// Inline shortcuts shown with the welcome message.
pub fn quick_actions() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("🔍 Search", CallbackAction::Quick(QuickAction::Search)),
            button("📊 Row", CallbackAction::Quick(QuickAction::GetRow)),
        ],
        vec![
            button("📄 All rows", CallbackAction::Quick(QuickAction::AllRows)),
            button(
                "📋 Columns",
                CallbackAction::Quick(QuickAction::ShowColumns),
            ),
        ],
        vec![button(
            "✏️ Edit row",
            CallbackAction::Quick(QuickAction::EditRow),
        )],
    ])
}

pub fn back_to_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "🏠 Main menu",
        CallbackAction::BackToMenu,
    )]])
}

pub fn cancel() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("❌ Cancel", CallbackAction::Cancel)]])
}

/// One select button per found row, capped at [`MAX_ROW_BUTTONS`].
pub fn row_selection(rows: &[Row]) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = rows
        .iter()
        .take(MAX_ROW_BUTTONS)
        .map(|row| {
            vec![button(
                format!("[{}] {}", row.number, button_preview(row, 2, 20)),
                CallbackAction::SelectRow(row.number),
            )]
        })
        .collect();
    keyboard.push(vec![
        button("❌ Cancel", CallbackAction::Cancel),
        button("🏠 Main menu", CallbackAction::BackToMenu),
    ]);
    InlineKeyboardMarkup::new(keyboard)
}

/// Actions attached to a single-row view.
pub fn row_actions(row: u32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("✏️ Edit", CallbackAction::EditRow(row)),
            button("🔄 Refresh", CallbackAction::RefreshRow(row)),
        ],
        vec![
            button("❌ Cancel", CallbackAction::Cancel),
            button("🏠 Main menu", CallbackAction::BackToMenu),
        ],
    ])
}

/// Field chooser for editing a row: one button per named column.
pub fn edit_fields(row: u32, columns: &[String]) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .take(MAX_ROW_BUTTONS)
        .map(|(i, name)| {
            vec![button(
                format!("✏️ {name}"),
                CallbackAction::EditField {
                    row,
                    column: i as u32 + 1,
                },
            )]
        })
        .collect();
    keyboard.push(vec![
        button("⬅️ Back to row", CallbackAction::BackToRow(row)),
        button("🏠 Main menu", CallbackAction::BackToMenu),
    ]);
    InlineKeyboardMarkup::new(keyboard)
}

/// Paging controls for the all-rows listing: select buttons for the page's
/// rows, then prev / indicator / next, then first/last shortcuts when the
/// listing is long.
pub fn pagination(page: &RowPage) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = page
        .rows
        .iter()
        .map(|row| {
            vec![button(
                format!("[{}] {}", row.number, button_preview(row, 2, 20)),
                CallbackAction::SelectRow(row.number),
            )]
        })
        .collect();

    let mut nav = Vec::new();
    if page.page > 1 {
        nav.push(button("⬅️", CallbackAction::Page(PageNav::Prev(page.page))));
    }
    nav.push(button(
        format!("📄 {}/{}", page.page, page.total_pages),
        CallbackAction::Page(PageNav::Info),
    ));
    if page.page < page.total_pages {
        nav.push(button("➡️", CallbackAction::Page(PageNav::Next(page.page))));
    }
    keyboard.push(nav);

    if page.total_pages > 3 {
        keyboard.push(vec![
            button("⏪ First", CallbackAction::Page(PageNav::Goto(1))),
            button(
                "⏩ Last",
                CallbackAction::Page(PageNav::Goto(page.total_pages)),
            ),
        ]);
    }

    keyboard.push(vec![button("🏠 Main menu", CallbackAction::BackToMenu)]);
    InlineKeyboardMarkup::new(keyboard)
}

/// The new-row interface: one fill button per named column plus save,
/// clear and cancel controls.
pub fn new_row_fields(columns: &[String]) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .map(|(i, name)| vec![button(format!("📝 {name}"), CallbackAction::FillField(i as u32 + 1))])
        .collect();
    keyboard.push(vec![
        button("💾 Save", CallbackAction::SaveNewRow),
        button("🗑 Clear", CallbackAction::ClearNewRow),
    ]);
    keyboard.push(vec![
        button("❌ Cancel", CallbackAction::CancelNewRow),
        button("🏠 Main menu", CallbackAction::BackToMenu),
    ]);
    InlineKeyboardMarkup::new(keyboard)
}

pub fn formulas_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("➕ Add formula", CallbackAction::Formula(FormulaMenu::Add)),
            button("👁 View formula", CallbackAction::Formula(FormulaMenu::View)),
        ],
        vec![
            button("📚 Reference", CallbackAction::Formula(FormulaMenu::Help)),
            button(
                "💡 Examples",
                CallbackAction::Formula(FormulaMenu::Examples),
            ),
        ],
        vec![button(
            "✅ Check formula",
            CallbackAction::Formula(FormulaMenu::Validate),
        )],
        vec![button("🏠 Main menu", CallbackAction::BackToMenu)],
    ])
}

pub fn back_to_formulas() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("⬅️ Back", CallbackAction::BackToFormulas)]])
}

pub fn formula_examples() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("➕ Sum", CallbackAction::Example(ExampleTopic::Sum)),
            button("📊 Average", CallbackAction::Example(ExampleTopic::Average)),
        ],
        vec![
            button("📈 Count", CallbackAction::Example(ExampleTopic::Count)),
            button("🔍 Lookup", CallbackAction::Example(ExampleTopic::Vlookup)),
        ],
        vec![
            button("📅 Dates", CallbackAction::Example(ExampleTopic::Date)),
            button("🔤 Text", CallbackAction::Example(ExampleTopic::Text)),
        ],
        vec![
            button("❓ Condition", CallbackAction::Example(ExampleTopic::If)),
            button("🔢 Rounding", CallbackAction::Example(ExampleTopic::Round)),
        ],
        vec![button("⬅️ Back", CallbackAction::BackToFormulas)],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paginate;
    use pretty_assertions::assert_eq;

    fn rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|i| Row {
                number: i as u32 + 2,
                cells: vec![format!("value {i}")],
            })
            .collect()
    }

    fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                    Some(data.clone())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn menu_labels_round_trip() {
        for b in [
            MenuButton::Search,
            MenuButton::NewRow,
            MenuButton::Formulas,
            MenuButton::About,
        ] {
            assert_eq!(MenuButton::from_label(b.label()), Some(b));
        }
        assert_eq!(MenuButton::from_label("not a button"), None);
    }

    #[test]
    fn row_selection_caps_at_ten_buttons() {
        let markup = row_selection(&rows(14));
        let data = callback_data(&markup);
        let selects = data.iter().filter(|d| d.starts_with("select_row:")).count();
        assert_eq!(selects, MAX_ROW_BUTTONS);
    }

    #[test]
    fn first_page_has_no_prev_button() {
        let page = paginate(rows(7), 1);
        let data = callback_data(&pagination(&page));
        assert!(!data.iter().any(|d| d.starts_with("page:prev")));
        assert!(data.contains(&"page:next:1".to_string()));
        assert!(data.contains(&"page:info".to_string()));
    }

    #[test]
    fn last_page_has_no_next_button() {
        let page = paginate(rows(7), 2);
        let data = callback_data(&pagination(&page));
        assert!(data.contains(&"page:prev:2".to_string()));
        assert!(!data.iter().any(|d| d.starts_with("page:next")));
    }

    #[test]
    fn long_listings_get_first_and_last_shortcuts() {
        let page = paginate(rows(25), 3);
        let data = callback_data(&pagination(&page));
        assert!(data.contains(&"page:goto:1".to_string()));
        assert!(data.contains(&"page:goto:5".to_string()));

        let short = paginate(rows(12), 2);
        let data = callback_data(&pagination(&short));
        assert!(!data.iter().any(|d| d.starts_with("page:goto")));
    }

    #[test]
    fn edit_fields_skips_unnamed_columns() {
        let columns = vec!["name".to_string(), String::new(), "city".to_string()];
        let data = callback_data(&edit_fields(5, &columns));
        assert!(data.contains(&"edit_field:5:1".to_string()));
        assert!(!data.contains(&"edit_field:5:2".to_string()));
        assert!(data.contains(&"edit_field:5:3".to_string()));
    }

    #[test]
    fn every_button_payload_is_decodable() {
        let page = paginate(rows(25), 2);
        for markup in [
            quick_actions(),
            row_selection(&rows(3)),
            row_actions(5),
            edit_fields(5, &["name".to_string()]),
            pagination(&page),
            new_row_fields(&["name".to_string(), "email".to_string()]),
            formulas_menu(),
            formula_examples(),
        ] {
            for data in callback_data(&markup) {
                assert!(
                    crate::callback::CallbackAction::parse(&data).is_some(),
                    "undecodable payload '{data}'"
                );
            }
        }
    }
}
