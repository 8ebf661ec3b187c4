//! Inline-button callback payloads.
//!
//! Every payload is decoded once at the dispatch boundary into
//! [`CallbackAction`] and exhaustively matched from there; handlers never
//! touch the raw strings.

use strum::Display;

/// Pagination controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
    /// Go to the page before the given current page; clamps at 1.
    Prev(u32),
    /// Go to the page after the given current page; deliberately unclamped,
    /// a page past the end renders as empty.
    Next(u32),
    /// Jump straight to a page.
    Goto(u32),
    /// The `page X/Y` indicator button; answers with a notice only.
    Info,
}

/// Entries of the inline quick-action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum QuickAction {
    Search,
    GetRow,
    ShowColumns,
    EditRow,
    AllRows,
}

/// Entries of the formulas submenu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FormulaMenu {
    Add,
    View,
    Help,
    Examples,
    Validate,
}

/// Formula example categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ExampleTopic {
    Sum,
    Average,
    Count,
    Vlookup,
    Date,
    Text,
    If,
    Round,
}

/// Everything an inline button can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    SelectRow(u32),
    EditRow(u32),
    EditField { row: u32, column: u32 },
    RefreshRow(u32),
    BackToRow(u32),
    Cancel,
    BackToMenu,
    Quick(QuickAction),
    Page(PageNav),
    /// Fill one field of the new-row draft.
    FillField(u32),
    SaveNewRow,
    ClearNewRow,
    CancelNewRow,
    Formula(FormulaMenu),
    Example(ExampleTopic),
    BackToFormulas,
}

impl CallbackAction {
    /// Wire form of the payload; `parse` is its inverse.
    pub fn encode(&self) -> String {
        match self {
            Self::SelectRow(n) => format!("select_row:{n}"),
            Self::EditRow(n) => format!("edit_row:{n}"),
            Self::EditField { row, column } => format!("edit_field:{row}:{column}"),
            Self::RefreshRow(n) => format!("refresh_row:{n}"),
            Self::BackToRow(n) => format!("back_to_row:{n}"),
            Self::Cancel => "cancel_action".to_string(),
            Self::BackToMenu => "back_to_menu".to_string(),
            Self::Quick(action) => format!("action:{action}"),
            Self::Page(PageNav::Prev(n)) => format!("page:prev:{n}"),
            Self::Page(PageNav::Next(n)) => format!("page:next:{n}"),
            Self::Page(PageNav::Goto(n)) => format!("page:goto:{n}"),
            Self::Page(PageNav::Info) => "page:info".to_string(),
            Self::FillField(n) => format!("fill_field:new:{n}"),
            Self::SaveNewRow => "save_new_row".to_string(),
            Self::ClearNewRow => "clear_new_row".to_string(),
            Self::CancelNewRow => "cancel_new_row".to_string(),
            Self::Formula(action) => format!("formula:{action}"),
            Self::Example(topic) => format!("example:{topic}"),
            Self::BackToFormulas => "back_to_formulas".to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "cancel_action" | "cancel_search" => return Some(Self::Cancel),
            "back_to_menu" => return Some(Self::BackToMenu),
            "page:info" => return Some(Self::Page(PageNav::Info)),
            "save_new_row" => return Some(Self::SaveNewRow),
            "clear_new_row" => return Some(Self::ClearNewRow),
            "cancel_new_row" => return Some(Self::CancelNewRow),
            "back_to_formulas" => return Some(Self::BackToFormulas),
            _ => {}
        }

        let (tag, rest) = data.split_once(':')?;
        match tag {
            "select_row" => Some(Self::SelectRow(rest.parse().ok()?)),
            "edit_row" => Some(Self::EditRow(rest.parse().ok()?)),
            "refresh_row" => Some(Self::RefreshRow(rest.parse().ok()?)),
            "back_to_row" => Some(Self::BackToRow(rest.parse().ok()?)),
            "edit_field" => {
                let (row, column) = rest.split_once(':')?;
                Some(Self::EditField {
                    row: row.parse().ok()?,
                    column: column.parse().ok()?,
                })
            }
            "action" => {
                let action = match rest {
                    "search" => QuickAction::Search,
                    "get_row" => QuickAction::GetRow,
                    "show_columns" => QuickAction::ShowColumns,
                    "edit_row" => QuickAction::EditRow,
                    "all_rows" => QuickAction::AllRows,
                    _ => return None,
                };
                Some(Self::Quick(action))
            }
            "page" => {
                let (nav, page) = rest.split_once(':')?;
                let page: u32 = page.parse().ok()?;
                let nav = match nav {
                    "prev" => PageNav::Prev(page),
                    "next" => PageNav::Next(page),
                    "goto" => PageNav::Goto(page),
                    _ => return None,
                };
                Some(Self::Page(nav))
            }
            "fill_field" => {
                let (kind, column) = rest.split_once(':')?;
                if kind != "new" {
                    return None;
                }
                Some(Self::FillField(column.parse().ok()?))
            }
            "formula" => {
                let action = match rest {
                    "add" => FormulaMenu::Add,
                    "view" => FormulaMenu::View,
                    "help" => FormulaMenu::Help,
                    "examples" => FormulaMenu::Examples,
                    "validate" => FormulaMenu::Validate,
                    _ => return None,
                };
                Some(Self::Formula(action))
            }
            "example" => {
                let topic = match rest {
                    "sum" => ExampleTopic::Sum,
                    "average" => ExampleTopic::Average,
                    "count" => ExampleTopic::Count,
                    "vlookup" => ExampleTopic::Vlookup,
                    "date" => ExampleTopic::Date,
                    "text" => ExampleTopic::Text,
                    "if" => ExampleTopic::If,
                    "round" => ExampleTopic::Round,
                    _ => return None,
                };
                Some(Self::Example(topic))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_parameterized_payloads() {
        assert_eq!(
            CallbackAction::parse("select_row:5"),
            Some(CallbackAction::SelectRow(5))
        );
        assert_eq!(
            CallbackAction::parse("edit_field:5:2"),
            Some(CallbackAction::EditField { row: 5, column: 2 })
        );
        assert_eq!(
            CallbackAction::parse("page:next:3"),
            Some(CallbackAction::Page(PageNav::Next(3)))
        );
        assert_eq!(
            CallbackAction::parse("fill_field:new:4"),
            Some(CallbackAction::FillField(4))
        );
        assert_eq!(
            CallbackAction::parse("formula:validate"),
            Some(CallbackAction::Formula(FormulaMenu::Validate))
        );
    }

    #[test]
    fn encode_is_parseable() {
        for action in [
            CallbackAction::SelectRow(12),
            CallbackAction::EditField { row: 7, column: 3 },
            CallbackAction::Page(PageNav::Goto(1)),
            CallbackAction::Quick(QuickAction::ShowColumns),
            CallbackAction::Example(ExampleTopic::Vlookup),
            CallbackAction::Cancel,
        ] {
            assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
        }
    }

    #[test]
    fn rejects_malformed_payloads() {
        for bad in [
            "",
            "select_row",
            "select_row:x",
            "edit_field:5",
            "page:sideways:2",
            "fill_field:old:2",
            "action:destroy",
            "something_else",
        ] {
            assert_eq!(CallbackAction::parse(bad), None, "accepted '{bad}'");
        }
    }
}
