//! End-to-end flows over an in-memory spreadsheet: the service, session
//! store and formatters wired together the way the handlers use them.

use pretty_assertions::assert_eq;
use std::sync::Mutex;
use teloxide::types::UserId;

use sheetbot::core::{PAGE_SIZE, formula};
use sheetbot::services::{SheetsApi, SheetsService};
use sheetbot::session::SessionStore;
use sheetbot::{SheetsError, format};

/// In-memory worksheet; row 1 is the header row.
struct StubApi {
    grid: Mutex<Vec<Vec<String>>>,
}

impl StubApi {
    fn new(rows: Vec<Vec<&str>>) -> Self {
        Self {
            grid: Mutex::new(
                rows.into_iter()
                    .map(|r| r.into_iter().map(str::to_string).collect())
                    .collect(),
            ),
        }
    }

    fn contacts() -> Self {
        Self::new(vec![
            vec!["name", "email", "phone", "city", "notes"],
            vec!["Alice", "alice@example.com", "111", "Oslo", ""],
            vec!["Bob", "bob@test.com", "222", "Lund", "vip"],
            vec!["Carol", "carol@example.com", "333", "Oslo", ""],
        ])
    }
}

impl SheetsApi for StubApi {
    async fn fetch_all(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        Ok(self.grid.lock().unwrap().clone())
    }

    async fn fetch_row(&self, number: u32) -> Result<Vec<String>, SheetsError> {
        let grid = self.grid.lock().unwrap();
        Ok(grid.get(number as usize - 1).cloned().unwrap_or_default())
    }

    async fn write_cell(&self, row: u32, col: u32, value: &str) -> Result<(), SheetsError> {
        let mut grid = self.grid.lock().unwrap();
        let cells = &mut grid[row as usize - 1];
        if cells.len() < col as usize {
            cells.resize(col as usize, String::new());
        }
        cells[col as usize - 1] = value.to_string();
        Ok(())
    }

    async fn append(&self, cells: &[String]) -> Result<(), SheetsError> {
        self.grid.lock().unwrap().push(cells.to_vec());
        Ok(())
    }

    async fn insert(&self, number: u32, cells: &[String]) -> Result<(), SheetsError> {
        self.grid
            .lock()
            .unwrap()
            .insert(number as usize - 1, cells.to_vec());
        Ok(())
    }

    async fn fetch_formula(&self, row: u32, col: u32) -> Result<Option<String>, SheetsError> {
        let grid = self.grid.lock().unwrap();
        Ok(grid
            .get(row as usize - 1)
            .and_then(|r| r.get(col as usize - 1))
            .filter(|c| !c.is_empty())
            .cloned())
    }
}

#[tokio::test]
async fn row_view_pairs_every_column_with_its_value() {
    let service = SheetsService::connect(StubApi::contacts()).await.unwrap();
    let row = service.get_row(3).await.unwrap().unwrap();
    let text = format::format_row(&row, service.columns());

    assert!(text.contains("Row 3"));
    assert!(text.contains("<b>name:</b> Bob"));
    assert!(text.contains("<b>email:</b> bob@test.com"));
    assert!(text.contains("<b>notes:</b> vip"));
    // blank cell renders as a dash, not as an omission
    let alice = service.get_row(2).await.unwrap().unwrap();
    let text = format::format_row(&alice, service.columns());
    assert!(text.contains("<b>notes:</b> —"));
}

#[tokio::test]
async fn header_row_is_never_served_as_data() {
    let service = SheetsService::connect(StubApi::contacts()).await.unwrap();
    assert_eq!(service.get_row(1).await.unwrap(), None);
    // searching for a header value finds nothing
    assert!(service.search("phone").await.unwrap().is_empty());
}

#[tokio::test]
async fn search_is_case_insensitive_and_substring() {
    let service = SheetsService::connect(StubApi::contacts()).await.unwrap();
    let found = service.search("OSLO").await.unwrap();
    assert_eq!(
        found.iter().map(|r| r.number).collect::<Vec<_>>(),
        vec![2, 4]
    );

    let text = format::format_search_results(&found, service.columns(), "OSLO");
    assert!(text.contains("Found 2 row(s)"));
}

#[tokio::test]
async fn draft_row_with_partial_fields_is_saved_padded_in_column_order() {
    let user = UserId(7);
    let service = SheetsService::connect(StubApi::contacts()).await.unwrap();
    let sessions = SessionStore::new();

    // fill three of the five fields, out of order
    let mut draft = sessions.draft_row(user, service.columns().len()).await;
    draft[3] = "Bergen".to_string();
    draft[0] = "Dave".to_string();
    draft[1] = "dave@example.com".to_string();
    sessions.set_draft_row(user, draft.clone()).await;

    let draft = sessions.draft_row(user, service.columns().len()).await;
    let number = service.append_row(draft).await.unwrap();
    assert_eq!(number, 5);

    let saved = service.get_row(5).await.unwrap().unwrap();
    assert_eq!(
        saved.cells,
        vec!["Dave", "dave@example.com", "", "Bergen", ""]
    );
}

#[tokio::test]
async fn pages_concatenate_to_the_full_listing() {
    let mut rows = vec![vec!["name", "email"]];
    let names: Vec<String> = (0..13).map(|i| format!("user{i}")).collect();
    for name in &names {
        rows.push(vec![name.as_str(), ""]);
    }
    let service = SheetsService::connect(StubApi::new(rows)).await.unwrap();

    let mut seen = Vec::new();
    let mut page_number = 1;
    loop {
        let page = service.page(page_number).await.unwrap();
        assert!(page.rows.len() <= PAGE_SIZE);
        seen.extend(page.rows.iter().map(|r| r.cells[0].clone()));
        if page_number >= page.total_pages {
            // one past the end is empty, not an error
            let past = service.page(page.total_pages + 1).await.unwrap();
            assert!(past.rows.is_empty());
            break;
        }
        page_number += 1;
    }
    assert_eq!(seen, names);
}

#[tokio::test]
async fn inserted_row_is_padded_and_shifts_later_rows_down() {
    let service = SheetsService::connect(StubApi::contacts()).await.unwrap();
    service.insert_row(3, vec!["Zed".to_string()]).await.unwrap();

    let inserted = service.get_row(3).await.unwrap().unwrap();
    assert_eq!(inserted.cells.len(), service.columns().len());
    assert_eq!(inserted.cells[0], "Zed");

    let shifted = service.get_row(4).await.unwrap().unwrap();
    assert_eq!(shifted.cells[0], "Bob");
}

#[tokio::test]
async fn cell_edit_is_visible_on_refetch() {
    let service = SheetsService::connect(StubApi::contacts()).await.unwrap();
    service.set_cell(2, 4, "Troms\u{f8}").await.unwrap();
    let row = service.get_row(2).await.unwrap().unwrap();
    assert_eq!(row.cells[3], "Tromsø");
}

#[tokio::test]
async fn formula_round_trip_through_the_worksheet() {
    let service = SheetsService::connect(StubApi::contacts()).await.unwrap();

    let validated = formula::validate("SUM(C2:C4)").unwrap();
    let written = service.set_cell_formula(2, 5, &validated).await.unwrap();
    assert_eq!(written, "=SUM(C2:C4)");
    assert_eq!(
        service.cell_formula(2, 5).await.unwrap(),
        Some("=SUM(C2:C4)".to_string())
    );

    // a plain value is not reported as a formula
    assert_eq!(service.cell_formula(3, 1).await.unwrap(), None);
}
