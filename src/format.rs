//! Pure text formatting for outbound messages.
//!
//! Everything renders to the Telegram HTML subset; user-supplied data goes
//! through [`escape_html`] exactly once, here.

use crate::callback::ExampleTopic;
use crate::core::{Row, RowPage};

/// How many search matches are listed in one message.
pub const MAX_SEARCH_RESULTS: usize = 10;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Shorten to at most `max` characters, ellipsis included.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

/// Short `Name: value | Name: value` preview of a row's leading cells.
fn row_preview(row: &Row, columns: &[String], take: usize, value_width: usize) -> String {
    let parts: Vec<String> = row
        .cells
        .iter()
        .take(take)
        .enumerate()
        .filter(|(_, value)| !value.is_empty())
        .map(|(i, value)| {
            let value = escape_html(&truncate(value, value_width));
            match columns.get(i).filter(|name| !name.is_empty()) {
                Some(name) => format!("{}: {value}", escape_html(name)),
                None => value,
            }
        })
        .collect();
    if parts.is_empty() {
        "(blank row)".to_string()
    } else {
        parts.join(" | ")
    }
}

/// Unescaped preview for button labels; Telegram button text is plain.
pub fn button_preview(row: &Row, take: usize, value_width: usize) -> String {
    let parts: Vec<String> = row
        .cells
        .iter()
        .take(take)
        .filter(|value| !value.is_empty())
        .map(|value| truncate(value, value_width))
        .collect();
    parts.join(" - ")
}

/// Full row view: each named column paired with its value, blanks shown
/// as an em dash.
pub fn format_row(row: &Row, columns: &[String]) -> String {
    let mut lines = vec![format!("📋 <b>Row {}</b>", row.number), String::new()];
    for (i, name) in columns.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        let value = row.cells.get(i).map(String::as_str).unwrap_or("");
        let display = if value.is_empty() {
            "—".to_string()
        } else {
            escape_html(value)
        };
        lines.push(format!("<b>{}:</b> {display}", escape_html(name)));
    }
    lines.join("\n")
}

/// Search results: total count first, then up to [`MAX_SEARCH_RESULTS`]
/// numbered previews.
pub fn format_search_results(found: &[Row], columns: &[String], query: &str) -> String {
    if found.is_empty() {
        return format!(
            "🔍 Nothing found for '<b>{}</b>'.",
            escape_html(query)
        );
    }

    let mut lines = vec![format!(
        "🔍 Found {} row(s) for '<b>{}</b>':",
        found.len(),
        escape_html(query)
    )];
    lines.push(String::new());
    for (i, row) in found.iter().take(MAX_SEARCH_RESULTS).enumerate() {
        lines.push(format!(
            "{}. <b>[{}]</b> {}",
            i + 1,
            row.number,
            row_preview(row, columns, 3, 20)
        ));
    }
    if found.len() > MAX_SEARCH_RESULTS {
        lines.push(String::new());
        lines.push(format!(
            "… and {} more row(s)",
            found.len() - MAX_SEARCH_RESULTS
        ));
    }
    lines.push(String::new());
    lines.push("📌 Select a row to view it:".to_string());
    lines.join("\n")
}

/// Numbered column list; unnamed columns are called out as such.
pub fn format_columns(columns: &[String]) -> String {
    if columns.is_empty() {
        return "❌ No columns found.".to_string();
    }
    let mut lines = vec!["📊 <b>Worksheet columns:</b>".to_string(), String::new()];
    for (i, name) in columns.iter().enumerate() {
        if name.is_empty() {
            lines.push(format!("{}. <i>(unnamed column)</i>", i + 1));
        } else {
            lines.push(format!("{}. <b>{}</b>", i + 1, escape_html(name)));
        }
    }
    lines.join("\n")
}

/// One page of the all-rows listing.
pub fn format_rows_page(page: &RowPage, columns: &[String]) -> String {
    if page.rows.is_empty() {
        return "📄 <b>All rows</b>\n\n❌ No rows found, the worksheet is empty.".to_string();
    }
    let mut lines = vec![
        format!(
            "📄 <b>All rows</b> (page {}/{})",
            page.page, page.total_pages
        ),
        format!("📊 {} row(s) total", page.total_rows),
        String::new(),
    ];
    for row in &page.rows {
        lines.push(format!(
            "<b>[{}]</b> {}",
            row.number,
            row_preview(row, columns, 3, 20)
        ));
    }
    lines.push(String::new());
    lines.push("👆 Tap a row to view it, or pick an action:".to_string());
    lines.join("\n")
}

/// The new-row draft: every named column with its current value or a
/// "(not filled)" marker.
pub fn format_new_row_draft(columns: &[String], values: &[String]) -> String {
    let mut lines = vec!["➕ <b>New row</b>".to_string(), String::new()];
    for (i, name) in columns.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        let value = values.get(i).map(String::as_str).unwrap_or("");
        if value.is_empty() {
            lines.push(format!(
                "<b>{}. {}:</b> <i>(not filled)</i>",
                i + 1,
                escape_html(name)
            ));
        } else {
            lines.push(format!(
                "<b>{}. {}:</b> {}",
                i + 1,
                escape_html(name),
                escape_html(value)
            ));
        }
    }
    lines.push(String::new());
    lines.push("👆 Tap a field to fill it in:".to_string());
    lines.join("\n")
}

pub fn welcome_text(first_name: &str, user_id: u64) -> String {
    format!(
        "🤖 <b>Welcome to the worksheet bot!</b>\n\n\
         👋 Hi, {}!\n\n\
         Use the menu buttons below, or the commands:\n\n\
         /find <code>[text]</code> — search rows by value\n\
         /row <code>[number]</code> — fetch a row by number\n\
         /cols — list the worksheet columns\n\
         /edit <code>[number]</code> — edit a row\n\n\
         Examples:\n\
         <code>/find test@email.com</code>\n\
         <code>/row 5</code>\n\
         <code>/edit 10</code>\n\n\
         ✅ Access granted. Your id: {user_id}",
        escape_html(first_name)
    )
}

pub fn help_text() -> &'static str {
    "📝 <b>How to use this bot</b>\n\n\
     🔍 <b>Search</b> — find rows containing a value\n\
     📊 <b>Row by number</b> — show one row\n\
     📄 <b>All rows</b> — browse every row, five per page\n\
     📋 <b>Columns</b> — list the worksheet columns\n\
     ✏️ <b>Edit row</b> — change values in a row\n\
     ➕ <b>New row</b> — fill in and append a row\n\
     🧮 <b>Formulas</b> — add, view and check formulas\n\n\
     <b>Commands:</b>\n\
     /start — main menu\n\
     /find [text] — search by value\n\
     /row [number] — fetch a row\n\
     /cols — list columns\n\
     /edit [number] — edit a row\n\n\
     <b>Paging:</b> ⬅️ ➡️ move between pages, ⏪ ⏩ jump to the first or\n\
     last page, 📄 X/Y shows where you are."
}

pub fn about_text() -> &'static str {
    "ℹ️ <b>About</b>\n\n\
     A bot for working with a Google Sheets worksheet straight from\n\
     Telegram: search, browse with paging, edit cells, append rows and\n\
     manage formulas.\n\n\
     Access is limited to an allow-list and every action is logged."
}

pub fn formula_reference() -> &'static str {
    "📚 <b>Formula reference</b>\n\n\
     <b>🧮 Math:</b>\n\
     <code>=SUM(A1:A10)</code> — sum of a range\n\
     <code>=AVERAGE(A1:A10)</code> — average\n\
     <code>=COUNT(A1:A10)</code> — count numbers\n\
     <code>=MAX(A1:A10)</code> / <code>=MIN(A1:A10)</code>\n\
     <code>=ROUND(A1,2)</code> — round to 2 digits\n\n\
     <b>📝 Text:</b>\n\
     <code>=CONCATENATE(A1,B1)</code> — join text\n\
     <code>=LEN(A1)</code>, <code>=UPPER(A1)</code>, <code>=LOWER(A1)</code>\n\n\
     <b>📅 Dates:</b>\n\
     <code>=TODAY()</code>, <code>=NOW()</code>,\n\
     <code>=DATEDIF(A1,B1,\"D\")</code> — difference in days\n\n\
     <b>❓ Logic:</b>\n\
     <code>=IF(A1&gt;10,\"Yes\",\"No\")</code>,\n\
     <code>=AND(A1&gt;0,B1&lt;100)</code>, <code>=OR(A1=1,B1=2)</code>\n\n\
     <b>🔍 Lookup:</b>\n\
     <code>=VLOOKUP(A1,B:D,2,0)</code>,\n\
     <code>=INDEX(B:B,MATCH(A1,C:C,0))</code>"
}

pub fn formula_example(topic: ExampleTopic) -> &'static str {
    match topic {
        ExampleTopic::Sum => {
            "➕ <b>Sum (SUM)</b>\n\n\
             <code>=SUM(A1:A10)</code> — sum of the range A1:A10\n\
             <code>=SUM(A1,B1,C1)</code> — sum of individual cells\n\
             <code>=SUM(A:A)</code> — sum of the whole column A"
        }
        ExampleTopic::Average => {
            "📊 <b>Average (AVERAGE)</b>\n\n\
             <code>=AVERAGE(A1:A10)</code> — average of a range\n\
             <code>=AVERAGE(A1,B1,C1)</code> — average of individual cells\n\
             <code>=AVERAGEIF(A1:A10,\"&gt;10\")</code> — conditional average"
        }
        ExampleTopic::Count => {
            "📈 <b>Count (COUNT)</b>\n\n\
             <code>=COUNT(A1:A10)</code> — count numeric cells\n\
             <code>=COUNTA(A1:A10)</code> — count non-empty cells\n\
             <code>=COUNTIF(A1:A10,\"&gt;10\")</code> — conditional count"
        }
        ExampleTopic::Vlookup => {
            "🔍 <b>Lookup (VLOOKUP)</b>\n\n\
             <code>=VLOOKUP(A1,B:D,2,0)</code> — exact match\n\
             <code>=VLOOKUP(A1,B:D,3,1)</code> — approximate match\n\
             <code>=IFERROR(VLOOKUP(A1,B:D,2,0),\"Not found\")</code> — with a fallback"
        }
        ExampleTopic::Date => {
            "📅 <b>Dates (TODAY/NOW)</b>\n\n\
             <code>=TODAY()</code> — today's date\n\
             <code>=NOW()</code> — current date and time\n\
             <code>=DATEDIF(A1,TODAY(),\"D\")</code> — days until today"
        }
        ExampleTopic::Text => {
            "🔤 <b>Text (CONCATENATE)</b>\n\n\
             <code>=CONCATENATE(A1,\" \",B1)</code> — join with a space\n\
             <code>=A1&amp;\" \"&amp;B1</code> — same thing, shorter\n\
             <code>=UPPER(A1)</code> — to upper case"
        }
        ExampleTopic::If => {
            "❓ <b>Condition (IF)</b>\n\n\
             <code>=IF(A1&gt;10,\"More\",\"Less\")</code> — simple condition\n\
             <code>=IF(A1=\"\",\"Empty\",A1)</code> — blank check\n\
             <code>=IF(AND(A1&gt;0,B1&lt;100),\"OK\",\"Error\")</code> — with logic"
        }
        ExampleTopic::Round => {
            "🔢 <b>Rounding (ROUND)</b>\n\n\
             <code>=ROUND(A1,2)</code> — two decimal places\n\
             <code>=ROUNDUP(A1,0)</code> — round up\n\
             <code>=ROUNDDOWN(A1,0)</code> — round down"
        }
    }
}
