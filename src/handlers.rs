//! Update dispatch: commands, menu buttons, dialog replies and inline
//! button callbacks.
//!
//! Every handler runs the same gauntlet first: the sender must be on the
//! allow-list, and must be outside the per-user cooldown. Free text is
//! interpreted against the sender's active dialog, then against the menu
//! labels, and only then rejected as unknown.

use std::sync::Arc;

use color_eyre::Result;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use crate::callback::{CallbackAction, FormulaMenu, PageNav, QuickAction};
use crate::config::Config;
use crate::core::{CellAddr, formula};
use crate::error::SheetsError;
use crate::format;
use crate::guards::{AccessPolicy, RateLimiter};
use crate::keyboards::{self, MenuButton};
use crate::services::{SheetsClient, SheetsService};
use crate::session::{Dialog, FormulaIntent, SessionStore};

const ACCESS_DENIED: &str = "⛔ Access denied. This bot is private.";
const TOO_FAST: &str = "⏳ Too fast, give it a second.";
const GATEWAY_APOLOGY: &str = "😞 The spreadsheet did not respond. Try again in a moment.";
const MENU_TEXT: &str = "🏠 <b>Main menu</b>\n\nPick an action:";

/// Everything the handlers share, injected through dptree.
pub struct AppContext {
    pub service: SheetsService<SheetsClient>,
    pub sessions: SessionStore,
    pub access: AccessPolicy,
    pub message_limiter: RateLimiter,
    pub callback_limiter: RateLimiter,
}

impl AppContext {
    pub fn new(config: &Config, service: SheetsService<SheetsClient>) -> Self {
        Self {
            service,
            sessions: SessionStore::new(),
            access: AccessPolicy::new(&config.allowed_user_ids),
            message_limiter: RateLimiter::new(config.message_cooldown()),
            callback_limiter: RateLimiter::new(config.callback_cooldown()),
        }
    }
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "show the main menu")]
    Start,
    #[command(description = "how to use the bot")]
    Help,
    #[command(description = "search rows by value")]
    Find(String),
    #[command(description = "fetch a row by number")]
    Row(String),
    #[command(description = "list the worksheet columns")]
    Cols,
    #[command(description = "edit a row")]
    Edit(String),
}

pub fn schema() -> UpdateHandler<color_eyre::Report> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback))
}

async fn handle_command(
    bot: Bot,
    ctx: Arc<AppContext>,
    msg: Message,
    cmd: Command,
) -> Result<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    if !ctx.access.is_allowed(user.id) {
        warn!(user = user.id.0, "refused command from unlisted user");
        bot.send_message(msg.chat.id, ACCESS_DENIED).await?;
        return Ok(());
    }
    if !ctx.message_limiter.check(user.id) {
        bot.send_message(msg.chat.id, TOO_FAST).await?;
        return Ok(());
    }
    let chat = msg.chat.id;

    match cmd {
        Command::Start => {
            info!(user = user.id.0, "start");
            ctx.sessions.clear(user.id).await;
            bot.send_message(chat, format::welcome_text(&user.first_name, user.id.0))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::main_menu())
                .await?;
        }
        Command::Help => {
            bot.send_message(chat, format::help_text())
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Find(query) => {
            let query = query.trim().to_string();
            if query.is_empty() {
                bot.send_message(chat, "Usage: <code>/find [text]</code>")
                    .parse_mode(ParseMode::Html)
                    .await?;
            } else {
                run_search(&bot, &ctx, chat, &query).await?;
            }
        }
        Command::Row(arg) => match arg.trim().parse::<u32>() {
            Ok(number) => show_row(&bot, &ctx, chat, number).await?,
            Err(_) => {
                bot.send_message(chat, "Usage: <code>/row [number]</code>")
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
        },
        Command::Cols => {
            bot.send_message(chat, format::format_columns(ctx.service.columns()))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::back_to_menu())
                .await?;
        }
        Command::Edit(arg) => match arg.trim().parse::<u32>() {
            Ok(number) => show_edit_fields(&bot, &ctx, chat, number).await?,
            Err(_) => {
                bot.send_message(chat, "Usage: <code>/edit [number]</code>")
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
        },
    }
    Ok(())
}

async fn handle_message(bot: Bot, ctx: Arc<AppContext>, msg: Message) -> Result<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    if !ctx.access.is_allowed(user.id) {
        warn!(user = user.id.0, "refused message from unlisted user");
        bot.send_message(msg.chat.id, ACCESS_DENIED).await?;
        return Ok(());
    }
    if !ctx.message_limiter.check(user.id) {
        bot.send_message(msg.chat.id, TOO_FAST).await?;
        return Ok(());
    }
    let chat = msg.chat.id;
    let Some(text) = msg.text() else {
        bot.send_message(chat, "🤔 I only understand text messages.")
            .await?;
        return Ok(());
    };

    if let Some(dialog) = ctx.sessions.take_dialog(user.id).await {
        return handle_dialog_input(&bot, &ctx, chat, user.id, dialog, text).await;
    }

    if let Some(button) = MenuButton::from_label(text) {
        return handle_menu_button(&bot, &ctx, chat, user.id, button).await;
    }

    bot.send_message(chat, "🤔 Use the menu buttons or /help.")
        .reply_markup(keyboards::main_menu())
        .await?;
    Ok(())
}

async fn handle_menu_button(
    bot: &Bot,
    ctx: &AppContext,
    chat: ChatId,
    user: UserId,
    button: MenuButton,
) -> Result<()> {
    info!(user = user.0, button = button.label(), "menu button");
    match button {
        MenuButton::Search => {
            ctx.sessions.set_dialog(user, Dialog::AwaitingSearchText).await;
            bot.send_message(chat, "🔍 Send the text to search for:")
                .reply_markup(keyboards::cancel())
                .await?;
        }
        MenuButton::GetRow => {
            ctx.sessions.set_dialog(user, Dialog::AwaitingRowNumber).await;
            bot.send_message(chat, "📊 Send the row number (2 or higher):")
                .reply_markup(keyboards::cancel())
                .await?;
        }
        MenuButton::AllRows => {
            send_rows_page(bot, ctx, chat, 1).await?;
        }
        MenuButton::Columns => {
            bot.send_message(chat, format::format_columns(ctx.service.columns()))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::back_to_menu())
                .await?;
        }
        MenuButton::EditRow => {
            ctx.sessions
                .set_dialog(user, Dialog::AwaitingEditRowNumber)
                .await;
            bot.send_message(chat, "✏️ Send the number of the row to edit:")
                .reply_markup(keyboards::cancel())
                .await?;
        }
        MenuButton::NewRow => {
            let columns = ctx.service.columns().to_vec();
            let draft = vec![String::new(); columns.len()];
            ctx.sessions.set_draft_row(user, draft.clone()).await;
            bot.send_message(chat, format::format_new_row_draft(&columns, &draft))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::new_row_fields(&columns))
                .await?;
        }
        MenuButton::Formulas => {
            bot.send_message(chat, "🧮 <b>Formulas</b>\n\nPick an action:")
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::formulas_menu())
                .await?;
        }
        MenuButton::Help => {
            bot.send_message(chat, format::help_text())
                .parse_mode(ParseMode::Html)
                .await?;
        }
        MenuButton::About => {
            bot.send_message(chat, format::about_text())
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }
    Ok(())
}

async fn handle_dialog_input(
    bot: &Bot,
    ctx: &AppContext,
    chat: ChatId,
    user: UserId,
    dialog: Dialog,
    text: &str,
) -> Result<()> {
    match dialog {
        Dialog::AwaitingSearchText => {
            run_search(bot, ctx, chat, text.trim()).await?;
        }
        Dialog::AwaitingRowNumber => match text.trim().parse::<u32>() {
            Ok(number) => show_row(bot, ctx, chat, number).await?,
            Err(_) => {
                ctx.sessions.set_dialog(user, Dialog::AwaitingRowNumber).await;
                bot.send_message(chat, "❌ That is not a number. Send the row number:")
                    .reply_markup(keyboards::cancel())
                    .await?;
            }
        },
        Dialog::AwaitingEditRowNumber => match text.trim().parse::<u32>() {
            Ok(number) => show_edit_fields(bot, ctx, chat, number).await?,
            Err(_) => {
                ctx.sessions
                    .set_dialog(user, Dialog::AwaitingEditRowNumber)
                    .await;
                bot.send_message(chat, "❌ That is not a number. Send the row number:")
                    .reply_markup(keyboards::cancel())
                    .await?;
            }
        },
        Dialog::AwaitingNewCellValue {
            row,
            column,
            column_name,
        } => {
            info!(user = user.0, row, column, "cell edit");
            match ctx.service.set_cell(row, column, text).await {
                Ok(()) => {
                    bot.send_message(
                        chat,
                        format!(
                            "✅ <b>{}</b> in row {row} updated.",
                            format::escape_html(&column_name)
                        ),
                    )
                    .parse_mode(ParseMode::Html)
                    .await?;
                    show_row(bot, ctx, chat, row).await?;
                }
                Err(error) => report_failure(bot, chat, error).await?,
            }
        }
        Dialog::AwaitingNewRowField {
            column,
            column_name,
        } => {
            let columns = ctx.service.columns().to_vec();
            let mut draft = ctx.sessions.draft_row(user, columns.len()).await;
            if let Some(slot) = draft.get_mut(column as usize - 1) {
                *slot = text.to_string();
            }
            ctx.sessions.set_draft_row(user, draft.clone()).await;
            info!(user = user.0, column = %column_name, "draft field filled");
            bot.send_message(chat, format::format_new_row_draft(&columns, &draft))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::new_row_fields(&columns))
                .await?;
        }
        Dialog::AwaitingCellPosition { intent } => match text.parse::<CellAddr>() {
            Ok(addr) if addr.row >= 2 => match intent {
                FormulaIntent::Add => {
                    ctx.sessions
                        .set_dialog(user, Dialog::AwaitingFormulaText { addr })
                        .await;
                    bot.send_message(
                        chat,
                        format!(
                            "🧮 Send the formula for cell <b>{addr}</b>, for example \
                             <code>=SUM(A1:A10)</code>:"
                        ),
                    )
                    .parse_mode(ParseMode::Html)
                    .reply_markup(keyboards::cancel())
                    .await?;
                }
                FormulaIntent::View => {
                    match ctx.service.cell_formula(addr.row, addr.col).await {
                        Ok(Some(formula)) => {
                            bot.send_message(
                                chat,
                                format!(
                                    "👁 Formula in <b>{addr}</b>:\n<code>{}</code>",
                                    format::escape_html(&formula)
                                ),
                            )
                            .parse_mode(ParseMode::Html)
                            .reply_markup(keyboards::back_to_menu())
                            .await?;
                        }
                        Ok(None) => {
                            bot.send_message(
                                chat,
                                format!("ℹ️ Cell <b>{addr}</b> holds no formula."),
                            )
                            .parse_mode(ParseMode::Html)
                            .reply_markup(keyboards::back_to_menu())
                            .await?;
                        }
                        Err(error) => report_failure(bot, chat, error).await?,
                    }
                }
            },
            _ => {
                ctx.sessions
                    .set_dialog(user, Dialog::AwaitingCellPosition { intent })
                    .await;
                bot.send_message(
                    chat,
                    "❌ Send a cell like <code>B5</code> or <code>5,2</code>. \
                     Row 1 holds the headers and cannot be picked.",
                )
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::cancel())
                .await?;
            }
        },
        Dialog::AwaitingFormulaText { addr } => match formula::validate(text) {
            Ok(validated) => {
                info!(user = user.0, cell = %addr, "formula write");
                match ctx.service.set_cell_formula(addr.row, addr.col, &validated).await {
                    Ok(written) => {
                        bot.send_message(
                            chat,
                            format!(
                                "✅ Formula written to <b>{addr}</b>:\n<code>{}</code>",
                                format::escape_html(&written)
                            ),
                        )
                        .parse_mode(ParseMode::Html)
                        .reply_markup(keyboards::back_to_menu())
                        .await?;
                    }
                    Err(error) => report_failure(bot, chat, error).await?,
                }
            }
            Err(reason) => {
                ctx.sessions
                    .set_dialog(user, Dialog::AwaitingFormulaText { addr })
                    .await;
                bot.send_message(chat, format!("❌ Formula rejected: {reason}. Try again:"))
                    .reply_markup(keyboards::cancel())
                    .await?;
            }
        },
        Dialog::AwaitingFormulaValidationText => {
            let verdict = match formula::validate(text) {
                Ok(normalized) => format!(
                    "✅ Looks valid:\n<code>{}</code>",
                    format::escape_html(&normalized)
                ),
                Err(reason) => format!("❌ Invalid: {reason}"),
            };
            bot.send_message(chat, verdict)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::back_to_menu())
                .await?;
        }
    }
    Ok(())
}

async fn handle_callback(bot: Bot, ctx: Arc<AppContext>, q: CallbackQuery) -> Result<()> {
    let user = q.from.id;
    let query_id = q.id.clone();

    if !ctx.access.is_allowed(user) {
        warn!(user = user.0, "refused callback from unlisted user");
        bot.answer_callback_query(query_id)
            .text(ACCESS_DENIED)
            .show_alert(true)
            .await?;
        return Ok(());
    }
    if !ctx.callback_limiter.check(user) {
        bot.answer_callback_query(query_id).text(TOO_FAST).await?;
        return Ok(());
    }

    let (Some(data), Some(message)) = (q.data.as_deref(), q.regular_message()) else {
        bot.answer_callback_query(query_id).await?;
        return Ok(());
    };
    let Some(action) = CallbackAction::parse(data) else {
        warn!(user = user.0, data, "undecodable callback payload");
        bot.answer_callback_query(query_id).await?;
        return Ok(());
    };
    let chat = message.chat.id;
    let message_id = message.id;
    info!(user = user.0, ?action, "callback");

    match action {
        CallbackAction::SelectRow(number)
        | CallbackAction::RefreshRow(number)
        | CallbackAction::BackToRow(number) => {
            edit_to_row(&bot, &ctx, chat, message_id, number).await?;
        }
        CallbackAction::EditRow(number) => {
            let columns = ctx.service.columns();
            bot.edit_message_text(
                chat,
                message_id,
                format!("✏️ <b>Row {number}</b>\n\nPick a field to change:"),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::edit_fields(number, columns))
            .await?;
        }
        CallbackAction::EditField { row, column } => {
            let Some(name) = column_name(&ctx, column) else {
                bot.answer_callback_query(query_id)
                    .text("❌ Unknown column")
                    .show_alert(true)
                    .await?;
                return Ok(());
            };
            let current = match ctx.service.get_row(row).await {
                Ok(found) => found
                    .and_then(|r| r.cells.get(column as usize - 1).cloned())
                    .unwrap_or_default(),
                Err(error) => {
                    report_failure(&bot, chat, error).await?;
                    bot.answer_callback_query(query_id).await?;
                    return Ok(());
                }
            };
            ctx.sessions
                .set_dialog(
                    user,
                    Dialog::AwaitingNewCellValue {
                        row,
                        column,
                        column_name: name.clone(),
                    },
                )
                .await;
            let hint = if current.is_empty() {
                "The cell is currently empty.".to_string()
            } else {
                format!("Current value: <code>{}</code>", format::escape_html(&current))
            };
            bot.send_message(
                chat,
                format!(
                    "✏️ Send the new value for <b>{}</b> in row {row}.\n{hint}",
                    format::escape_html(&name)
                ),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::cancel())
            .await?;
        }
        CallbackAction::Cancel => {
            ctx.sessions.clear(user).await;
            bot.edit_message_text(chat, message_id, "❌ Action cancelled.")
                .await?;
        }
        CallbackAction::BackToMenu => {
            ctx.sessions.clear(user).await;
            bot.edit_message_text(chat, message_id, MENU_TEXT)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::quick_actions())
                .await?;
        }
        CallbackAction::Quick(quick) => {
            handle_quick_action(&bot, &ctx, chat, user, quick).await?;
        }
        CallbackAction::Page(PageNav::Info) => {
            bot.answer_callback_query(query_id)
                .text("📄 Use ⬅️ and ➡️ to change pages")
                .await?;
            return Ok(());
        }
        CallbackAction::Page(nav) => {
            let target = match nav {
                PageNav::Prev(current) => current.saturating_sub(1).max(1),
                // deliberately unclamped; a page past the end shows as empty
                PageNav::Next(current) => current + 1,
                PageNav::Goto(page) => page.max(1),
                PageNav::Info => unreachable!(),
            };
            match ctx.service.page(target).await {
                Ok(page) => {
                    bot.edit_message_text(
                        chat,
                        message_id,
                        format::format_rows_page(&page, ctx.service.columns()),
                    )
                    .parse_mode(ParseMode::Html)
                    .reply_markup(keyboards::pagination(&page))
                    .await?;
                }
                Err(error) => report_failure(&bot, chat, error).await?,
            }
        }
        CallbackAction::FillField(column) => {
            let Some(name) = column_name(&ctx, column) else {
                bot.answer_callback_query(query_id)
                    .text("❌ Unknown column")
                    .show_alert(true)
                    .await?;
                return Ok(());
            };
            let columns = ctx.service.columns().len();
            let draft = ctx.sessions.draft_row(user, columns).await;
            let current = draft
                .get(column as usize - 1)
                .cloned()
                .unwrap_or_default();
            ctx.sessions
                .set_dialog(
                    user,
                    Dialog::AwaitingNewRowField {
                        column,
                        column_name: name.clone(),
                    },
                )
                .await;
            let hint = if current.is_empty() {
                String::new()
            } else {
                format!(
                    "\nCurrent value: <code>{}</code>",
                    format::escape_html(&current)
                )
            };
            bot.send_message(
                chat,
                format!(
                    "📝 Send the value for <b>{}</b>:{hint}",
                    format::escape_html(&name)
                ),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::cancel())
            .await?;
        }
        CallbackAction::SaveNewRow => {
            let columns = ctx.service.columns().to_vec();
            let draft = ctx.sessions.draft_row(user, columns.len()).await;
            let filled = draft.iter().filter(|v| !v.is_empty()).count();
            if filled == 0 {
                bot.answer_callback_query(query_id)
                    .text("❌ Fill in at least one field first")
                    .show_alert(true)
                    .await?;
                return Ok(());
            }
            match ctx.service.append_row(draft).await {
                Ok(number) => {
                    ctx.sessions.clear(user).await;
                    bot.edit_message_text(
                        chat,
                        message_id,
                        format!(
                            "✅ Row saved as <b>#{number}</b> ({filled} of {} fields filled).",
                            columns.len()
                        ),
                    )
                    .parse_mode(ParseMode::Html)
                    .reply_markup(keyboards::back_to_menu())
                    .await?;
                }
                Err(error) => report_failure(&bot, chat, error).await?,
            }
        }
        CallbackAction::ClearNewRow => {
            let columns = ctx.service.columns().to_vec();
            let draft = vec![String::new(); columns.len()];
            ctx.sessions.set_draft_row(user, draft.clone()).await;
            bot.edit_message_text(
                chat,
                message_id,
                format::format_new_row_draft(&columns, &draft),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::new_row_fields(&columns))
            .await?;
        }
        CallbackAction::CancelNewRow => {
            ctx.sessions.clear(user).await;
            bot.edit_message_text(chat, message_id, "❌ New row discarded.")
                .await?;
        }
        CallbackAction::Formula(item) => {
            handle_formula_menu(&bot, &ctx, chat, message_id, user, item).await?;
        }
        CallbackAction::Example(topic) => {
            bot.edit_message_text(chat, message_id, format::formula_example(topic))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::formula_examples())
                .await?;
        }
        CallbackAction::BackToFormulas => {
            bot.edit_message_text(chat, message_id, "🧮 <b>Formulas</b>\n\nPick an action:")
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::formulas_menu())
                .await?;
        }
    }

    bot.answer_callback_query(query_id).await?;
    Ok(())
}

async fn handle_quick_action(
    bot: &Bot,
    ctx: &AppContext,
    chat: ChatId,
    user: UserId,
    quick: QuickAction,
) -> Result<()> {
    match quick {
        QuickAction::Search => {
            ctx.sessions.set_dialog(user, Dialog::AwaitingSearchText).await;
            bot.send_message(chat, "🔍 Send the text to search for:")
                .reply_markup(keyboards::cancel())
                .await?;
        }
        QuickAction::GetRow => {
            ctx.sessions.set_dialog(user, Dialog::AwaitingRowNumber).await;
            bot.send_message(chat, "📊 Send the row number (2 or higher):")
                .reply_markup(keyboards::cancel())
                .await?;
        }
        QuickAction::ShowColumns => {
            bot.send_message(chat, format::format_columns(ctx.service.columns()))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::back_to_menu())
                .await?;
        }
        QuickAction::EditRow => {
            ctx.sessions
                .set_dialog(user, Dialog::AwaitingEditRowNumber)
                .await;
            bot.send_message(chat, "✏️ Send the number of the row to edit:")
                .reply_markup(keyboards::cancel())
                .await?;
        }
        QuickAction::AllRows => {
            send_rows_page(bot, ctx, chat, 1).await?;
        }
    }
    Ok(())
}

async fn handle_formula_menu(
    bot: &Bot,
    ctx: &AppContext,
    chat: ChatId,
    message_id: MessageId,
    user: UserId,
    item: FormulaMenu,
) -> Result<()> {
    match item {
        FormulaMenu::Add => {
            ctx.sessions
                .set_dialog(
                    user,
                    Dialog::AwaitingCellPosition {
                        intent: FormulaIntent::Add,
                    },
                )
                .await;
            bot.send_message(
                chat,
                "➕ Send the cell to put the formula in, like <code>B5</code> or \
                 <code>5,2</code>:",
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::cancel())
            .await?;
        }
        FormulaMenu::View => {
            ctx.sessions
                .set_dialog(
                    user,
                    Dialog::AwaitingCellPosition {
                        intent: FormulaIntent::View,
                    },
                )
                .await;
            bot.send_message(
                chat,
                "👁 Send the cell to inspect, like <code>B5</code> or <code>5,2</code>:",
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::cancel())
            .await?;
        }
        FormulaMenu::Help => {
            bot.edit_message_text(chat, message_id, format::formula_reference())
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::back_to_formulas())
                .await?;
        }
        FormulaMenu::Examples => {
            bot.edit_message_text(chat, message_id, "💡 <b>Examples</b>\n\nPick a topic:")
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::formula_examples())
                .await?;
        }
        FormulaMenu::Validate => {
            ctx.sessions
                .set_dialog(user, Dialog::AwaitingFormulaValidationText)
                .await;
            bot.send_message(chat, "✅ Send the formula to check:")
                .reply_markup(keyboards::cancel())
                .await?;
        }
    }
    Ok(())
}

fn column_name(ctx: &AppContext, column: u32) -> Option<String> {
    ctx.service
        .columns()
        .get(column as usize - 1)
        .filter(|name| !name.is_empty())
        .cloned()
}

async fn run_search(bot: &Bot, ctx: &AppContext, chat: ChatId, query: &str) -> Result<()> {
    let notice = bot.send_message(chat, "⏳ Searching…").await?;
    match ctx.service.search(query).await {
        Ok(found) => {
            let text = format::format_search_results(&found, ctx.service.columns(), query);
            let mut edit = bot
                .edit_message_text(chat, notice.id, text)
                .parse_mode(ParseMode::Html);
            if found.is_empty() {
                edit = edit.reply_markup(keyboards::back_to_menu());
            } else {
                edit = edit.reply_markup(keyboards::row_selection(&found));
            }
            edit.await?;
        }
        Err(error) => {
            report_failure(bot, chat, error).await?;
        }
    }
    Ok(())
}

async fn show_row(bot: &Bot, ctx: &AppContext, chat: ChatId, number: u32) -> Result<()> {
    let notice = bot.send_message(chat, "⏳ Fetching row…").await?;
    match ctx.service.get_row(number).await {
        Ok(Some(row)) => {
            bot.edit_message_text(
                chat,
                notice.id,
                format::format_row(&row, ctx.service.columns()),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::row_actions(number))
            .await?;
        }
        Ok(None) => {
            bot.edit_message_text(chat, notice.id, row_absent_text(number))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::back_to_menu())
                .await?;
        }
        Err(error) => report_failure(bot, chat, error).await?,
    }
    Ok(())
}

async fn edit_to_row(
    bot: &Bot,
    ctx: &AppContext,
    chat: ChatId,
    message_id: MessageId,
    number: u32,
) -> Result<()> {
    match ctx.service.get_row(number).await {
        Ok(Some(row)) => {
            bot.edit_message_text(
                chat,
                message_id,
                format::format_row(&row, ctx.service.columns()),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::row_actions(number))
            .await?;
        }
        Ok(None) => {
            bot.edit_message_text(chat, message_id, row_absent_text(number))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::back_to_menu())
                .await?;
        }
        Err(error) => report_failure(bot, chat, error).await?,
    }
    Ok(())
}

async fn show_edit_fields(bot: &Bot, ctx: &AppContext, chat: ChatId, number: u32) -> Result<()> {
    match ctx.service.get_row(number).await {
        Ok(Some(row)) => {
            let columns = ctx.service.columns();
            let text = format!(
                "{}\n\n✏️ Pick a field to change:",
                format::format_row(&row, columns)
            );
            bot.send_message(chat, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::edit_fields(number, columns))
                .await?;
        }
        Ok(None) => {
            bot.send_message(chat, row_absent_text(number))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::back_to_menu())
                .await?;
        }
        Err(error) => report_failure(bot, chat, error).await?,
    }
    Ok(())
}

async fn send_rows_page(bot: &Bot, ctx: &AppContext, chat: ChatId, number: u32) -> Result<()> {
    let notice = bot.send_message(chat, "⏳ Loading rows…").await?;
    match ctx.service.page(number).await {
        Ok(page) => {
            bot.edit_message_text(
                chat,
                notice.id,
                format::format_rows_page(&page, ctx.service.columns()),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::pagination(&page))
            .await?;
        }
        Err(error) => report_failure(bot, chat, error).await?,
    }
    Ok(())
}

fn row_absent_text(number: u32) -> String {
    if number < 2 {
        "❌ Row 1 holds the column headers; data rows start at 2.".to_string()
    } else {
        format!("❌ Row {number} not found or empty.")
    }
}

async fn report_failure(bot: &Bot, chat: ChatId, error: SheetsError) -> Result<()> {
    error!(%error, "sheets request failed");
    bot.send_message(chat, GATEWAY_APOLOGY).await?;
    Ok(())
}
