//! Per-user conversation state.
//!
//! One dialog may be active per user at a time; free text is interpreted
//! against it. Input-validation failures keep the dialog alive and
//! re-prompt; completion and explicit cancellation always clear it. There
//! is no timeout expiry: a stale dialog lives until consumed or cancelled.

use crate::core::CellAddr;
use std::collections::HashMap;
use teloxide::types::UserId;
use tokio::sync::Mutex;

/// What the user wants to do with the cell position they are about to type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaIntent {
    Add,
    View,
}

/// The step a user is currently in within a multi-turn interaction, with
/// the minimal context needed to finish it.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    AwaitingSearchText,
    AwaitingRowNumber,
    AwaitingEditRowNumber,
    AwaitingNewCellValue {
        row: u32,
        column: u32,
        column_name: String,
    },
    AwaitingNewRowField {
        column: u32,
        column_name: String,
    },
    AwaitingCellPosition {
        intent: FormulaIntent,
    },
    AwaitingFormulaText {
        addr: CellAddr,
    },
    AwaitingFormulaValidationText,
}

#[derive(Debug, Default)]
struct Session {
    dialog: Option<Dialog>,
    /// Partially filled new-row values; survives between field fills.
    draft_row: Option<Vec<String>>,
}

/// Session state keyed by Telegram user id. Access is last-write-wins
/// behind one mutex; one user's state is never visible to another.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<UserId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a dialog, replacing whatever was active.
    pub async fn set_dialog(&self, user: UserId, dialog: Dialog) {
        let mut sessions = self.inner.lock().await;
        sessions.entry(user).or_default().dialog = Some(dialog);
    }

    /// Consume the active dialog, leaving any new-row draft in place.
    pub async fn take_dialog(&self, user: UserId) -> Option<Dialog> {
        let mut sessions = self.inner.lock().await;
        sessions.get_mut(&user).and_then(|s| s.dialog.take())
    }

    /// Clear the dialog and the draft: completion, cancellation, or error.
    pub async fn clear(&self, user: UserId) {
        self.inner.lock().await.remove(&user);
    }

    /// The user's new-row draft, created with one empty value per column on
    /// first access.
    pub async fn draft_row(&self, user: UserId, columns: usize) -> Vec<String> {
        let mut sessions = self.inner.lock().await;
        sessions
            .entry(user)
            .or_default()
            .draft_row
            .get_or_insert_with(|| vec![String::new(); columns])
            .clone()
    }

    pub async fn set_draft_row(&self, user: UserId, values: Vec<String>) {
        let mut sessions = self.inner.lock().await;
        sessions.entry(user).or_default().draft_row = Some(values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    #[tokio::test]
    async fn dialog_is_consumed_once() {
        let store = SessionStore::new();
        store.set_dialog(ALICE, Dialog::AwaitingSearchText).await;
        assert_eq!(
            store.take_dialog(ALICE).await,
            Some(Dialog::AwaitingSearchText)
        );
        assert_eq!(store.take_dialog(ALICE).await, None);
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_user() {
        let store = SessionStore::new();
        store.set_dialog(ALICE, Dialog::AwaitingRowNumber).await;
        assert_eq!(store.take_dialog(BOB).await, None);
        assert_eq!(
            store.take_dialog(ALICE).await,
            Some(Dialog::AwaitingRowNumber)
        );
    }

    #[tokio::test]
    async fn entering_a_dialog_replaces_the_previous_one() {
        let store = SessionStore::new();
        store.set_dialog(ALICE, Dialog::AwaitingSearchText).await;
        store.set_dialog(ALICE, Dialog::AwaitingEditRowNumber).await;
        assert_eq!(
            store.take_dialog(ALICE).await,
            Some(Dialog::AwaitingEditRowNumber)
        );
    }

    #[tokio::test]
    async fn draft_survives_dialog_consumption() {
        let store = SessionStore::new();
        let draft = store.draft_row(ALICE, 3).await;
        assert_eq!(draft, vec!["", "", ""]);

        store
            .set_draft_row(ALICE, vec!["x".into(), "".into(), "".into()])
            .await;
        store
            .set_dialog(
                ALICE,
                Dialog::AwaitingNewRowField {
                    column: 2,
                    column_name: "email".into(),
                },
            )
            .await;
        store.take_dialog(ALICE).await;
        assert_eq!(store.draft_row(ALICE, 3).await[0], "x");
    }

    #[tokio::test]
    async fn clear_removes_dialog_and_draft() {
        let store = SessionStore::new();
        store.set_dialog(ALICE, Dialog::AwaitingSearchText).await;
        store.set_draft_row(ALICE, vec!["x".into()]).await;
        store.clear(ALICE).await;
        assert_eq!(store.take_dialog(ALICE).await, None);
        assert_eq!(store.draft_row(ALICE, 1).await, vec![""]);
    }
}
