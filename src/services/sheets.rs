//! Spreadsheet gateway: a thin transport over the Google Sheets v4 values
//! API plus a service layer holding the one-time column-header cache.

use crate::config::Config;
use crate::core::formula;
use crate::core::{CellAddr, Row, RowPage, data_rows, non_empty_rows, paginate};
use crate::error::SheetsError;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Raw value-level operations against one worksheet.
///
/// Rows and columns are 1-based; row 1 is the header row. Implementations
/// perform no padding or filtering, the service layer owns that.
#[allow(async_fn_in_trait)]
pub trait SheetsApi {
    /// Every row of the worksheet, in order, as formatted strings.
    async fn fetch_all(&self) -> Result<Vec<Vec<String>>, SheetsError>;
    /// One row; empty when the row has no values.
    async fn fetch_row(&self, number: u32) -> Result<Vec<String>, SheetsError>;
    /// Overwrite a single cell. Formulas pass through as user-entered input.
    async fn write_cell(&self, row: u32, col: u32, value: &str) -> Result<(), SheetsError>;
    /// Append a row after the last row with content.
    async fn append(&self, cells: &[String]) -> Result<(), SheetsError>;
    /// Insert a row at the given position, shifting rows down.
    async fn insert(&self, number: u32, cells: &[String]) -> Result<(), SheetsError>;
    /// A cell rendered as its formula, or `None` when the cell is empty.
    async fn fetch_formula(&self, row: u32, col: u32) -> Result<Option<String>, SheetsError>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// HTTP implementation of [`SheetsApi`] using a ready OAuth bearer token.
pub struct SheetsClient {
    http: reqwest::Client,
    base: String,
    spreadsheet_id: String,
    worksheet: String,
    token: String,
    /// Numeric sheet id, resolved lazily; only row insertion needs it.
    sheet_id: OnceCell<i64>,
}

impl SheetsClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: config.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            worksheet: config.worksheet_name.clone(),
            token: config.api_token.clone(),
            sheet_id: OnceCell::new(),
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base, self.spreadsheet_id, range
        )
    }

    fn row_range(&self, number: u32) -> String {
        format!("{}!{number}:{number}", self.worksheet)
    }

    fn cell_range(&self, row: u32, col: u32) -> String {
        format!("{}!{}", self.worksheet, CellAddr { row, col })
    }

    async fn check(response: reqwest::Response) -> Result<Value, SheetsError> {
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    async fn get_values(
        &self,
        range: &str,
        render_option: Option<&str>,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let mut request = self
            .http
            .get(self.values_url(range))
            .bearer_auth(&self.token);
        if let Some(option) = render_option {
            request = request.query(&[("valueRenderOption", option)]);
        }
        let body = Self::check(request.send().await?).await?;
        let range: ValueRange = serde_json::from_value(body)
            .map_err(|e| SheetsError::Malformed(e.to_string()))?;
        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    async fn put_values(&self, range: &str, values: Value) -> Result<(), SheetsError> {
        let response = self
            .http
            .put(self.values_url(range))
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": values }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Resolve the numeric sheet id of the configured worksheet from the
    /// spreadsheet metadata.
    async fn sheet_id(&self) -> Result<i64, SheetsError> {
        self.sheet_id
            .get_or_try_init(|| async {
                let url = format!("{}/v4/spreadsheets/{}", self.base, self.spreadsheet_id);
                let response = self
                    .http
                    .get(url)
                    .bearer_auth(&self.token)
                    .query(&[("fields", "sheets.properties")])
                    .send()
                    .await?;
                let body = Self::check(response).await?;
                let sheets = body["sheets"]
                    .as_array()
                    .ok_or_else(|| SheetsError::Malformed("missing sheets list".into()))?;
                for sheet in sheets {
                    let props = &sheet["properties"];
                    if props["title"].as_str() == Some(self.worksheet.as_str()) {
                        return props["sheetId"].as_i64().ok_or_else(|| {
                            SheetsError::Malformed("sheet without numeric id".into())
                        });
                    }
                }
                Err(SheetsError::WorksheetNotFound(self.worksheet.clone()))
            })
            .await
            .copied()
    }
}

impl SheetsApi for SheetsClient {
    async fn fetch_all(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        self.get_values(&self.worksheet, None).await
    }

    async fn fetch_row(&self, number: u32) -> Result<Vec<String>, SheetsError> {
        let values = self.get_values(&self.row_range(number), None).await?;
        Ok(values.into_iter().next().unwrap_or_default())
    }

    async fn write_cell(&self, row: u32, col: u32, value: &str) -> Result<(), SheetsError> {
        self.put_values(&self.cell_range(row, col), json!([[value]]))
            .await
    }

    async fn append(&self, cells: &[String]) -> Result<(), SheetsError> {
        let url = format!("{}:append", self.values_url(&self.worksheet));
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": [cells] }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn insert(&self, number: u32, cells: &[String]) -> Result<(), SheetsError> {
        let sheet_id = self.sheet_id().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            self.base, self.spreadsheet_id
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({
                "requests": [{
                    "insertDimension": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "ROWS",
                            "startIndex": number - 1,
                            "endIndex": number,
                        },
                        "inheritFromBefore": false,
                    }
                }]
            }))
            .send()
            .await?;
        Self::check(response).await?;

        let range = format!("{}!A{number}", self.worksheet);
        self.put_values(&range, json!([cells])).await
    }

    async fn fetch_formula(&self, row: u32, col: u32) -> Result<Option<String>, SheetsError> {
        let values = self
            .get_values(&self.cell_range(row, col), Some("FORMULA"))
            .await?;
        Ok(values
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .filter(|cell| !cell.is_empty()))
    }
}

/// Gateway service: caches the header row once at connect time and exposes
/// the row/cell operations the handlers need. No other caching; every call
/// goes straight to the API.
pub struct SheetsService<T> {
    api: T,
    columns: Vec<String>,
}

impl<T: SheetsApi> SheetsService<T> {
    /// Fetch and cache the column headers. Failure here is fatal to startup.
    pub async fn connect(api: T) -> Result<Self, SheetsError> {
        let columns = api.fetch_row(1).await?;
        info!(columns = columns.len(), "connected to worksheet");
        Ok(Self { api, columns })
    }

    /// Column names cached at connect time, in sheet order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fetch a data row. Row 1 is headers and is reported as absent, as is
    /// any row without values.
    pub async fn get_row(&self, number: u32) -> Result<Option<Row>, SheetsError> {
        if number < 2 {
            return Ok(None);
        }
        let cells = self.api.fetch_row(number).await?;
        if cells.is_empty() {
            Ok(None)
        } else {
            debug!(number, "fetched row");
            Ok(Some(Row { number, cells }))
        }
    }

    /// Linear scan of all data rows for a case-insensitive substring match.
    pub async fn search(&self, query: &str) -> Result<Vec<Row>, SheetsError> {
        let values = self.api.fetch_all().await?;
        let found: Vec<Row> = data_rows(&values)
            .into_iter()
            .filter(|row| row.matches(query))
            .collect();
        info!(query, matches = found.len(), "search finished");
        Ok(found)
    }

    /// One page of non-empty rows.
    pub async fn page(&self, page: u32) -> Result<RowPage, SheetsError> {
        let values = self.api.fetch_all().await?;
        Ok(paginate(non_empty_rows(&values), page))
    }

    /// Append a row, padded or truncated to the column count, and return
    /// the new row's number.
    pub async fn append_row(&self, cells: Vec<String>) -> Result<u32, SheetsError> {
        let cells = self.fit_columns(cells);
        self.api.append(&cells).await?;
        let values = self.api.fetch_all().await?;
        let number = values.len() as u32;
        info!(number, "appended row");
        Ok(number)
    }

    /// Insert a row at a position, padded or truncated to the column count.
    pub async fn insert_row(&self, number: u32, cells: Vec<String>) -> Result<(), SheetsError> {
        let cells = self.fit_columns(cells);
        self.api.insert(number, &cells).await?;
        info!(number, "inserted row");
        Ok(())
    }

    /// Overwrite one cell with a plain value.
    pub async fn set_cell(&self, row: u32, col: u32, value: &str) -> Result<(), SheetsError> {
        self.api.write_cell(row, col, value).await?;
        info!(row, col, "updated cell");
        Ok(())
    }

    /// Write a formula into a cell, normalizing the leading `=`. Returns the
    /// formula as written.
    pub async fn set_cell_formula(
        &self,
        row: u32,
        col: u32,
        formula: &str,
    ) -> Result<String, SheetsError> {
        let formula = formula::normalize(formula);
        self.api.write_cell(row, col, &formula).await?;
        info!(row, col, "wrote formula");
        Ok(formula)
    }

    /// The formula stored in a cell, if any. Cells holding plain values
    /// count as having no formula.
    pub async fn cell_formula(&self, row: u32, col: u32) -> Result<Option<String>, SheetsError> {
        let content = self.api.fetch_formula(row, col).await?;
        Ok(content.filter(|c| c.starts_with('=')))
    }

    fn fit_columns(&self, mut cells: Vec<String>) -> Vec<String> {
        let width = self.columns.len();
        cells.truncate(width);
        cells.resize(width, String::new());
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// In-memory transport over a plain value grid.
    struct FakeApi {
        grid: Mutex<Vec<Vec<String>>>,
        formulas: Mutex<Vec<((u32, u32), String)>>,
    }

    impl FakeApi {
        fn with_grid(rows: &[&[&str]]) -> Self {
            Self {
                grid: Mutex::new(
                    rows.iter()
                        .map(|r| r.iter().map(|c| c.to_string()).collect())
                        .collect(),
                ),
                formulas: Mutex::new(Vec::new()),
            }
        }
    }

    impl SheetsApi for FakeApi {
        async fn fetch_all(&self) -> Result<Vec<Vec<String>>, SheetsError> {
            Ok(self.grid.lock().unwrap().clone())
        }

        async fn fetch_row(&self, number: u32) -> Result<Vec<String>, SheetsError> {
            let grid = self.grid.lock().unwrap();
            Ok(grid.get(number as usize - 1).cloned().unwrap_or_default())
        }

        async fn write_cell(&self, row: u32, col: u32, value: &str) -> Result<(), SheetsError> {
            if value.starts_with('=') {
                self.formulas
                    .lock()
                    .unwrap()
                    .push(((row, col), value.to_string()));
                return Ok(());
            }
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
            let formulas = self.formulas.lock().unwrap();
            Ok(formulas
                .iter()
                .rev()
                .find(|((r, c), _)| (*r, *c) == (row, col))
                .map(|(_, f)| f.clone()))
        }
    }

    fn sample_api() -> FakeApi {
        FakeApi::with_grid(&[
            &["name", "email", "city"],
            &["Alice", "alice@example.com", "Oslo"],
            &["", "", ""],
            &["Bob", "bob@test.com", "Lund"],
        ])
    }

    #[tokio::test]
    async fn connect_caches_the_header_row() {
        let service = SheetsService::connect(sample_api()).await.unwrap();
        assert_eq!(service.columns(), ["name", "email", "city"]);
    }

    #[tokio::test]
    async fn row_one_is_absent() {
        let service = SheetsService::connect(sample_api()).await.unwrap();
        assert_eq!(service.get_row(1).await.unwrap(), None);
        assert_eq!(service.get_row(0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_row_returns_numbered_cells() {
        let service = SheetsService::connect(sample_api()).await.unwrap();
        let row = service.get_row(4).await.unwrap().unwrap();
        assert_eq!(row.number, 4);
        assert_eq!(row.cells[0], "Bob");
    }

    #[tokio::test]
    async fn search_skips_the_header_row() {
        let service = SheetsService::connect(sample_api()).await.unwrap();
        // "name" appears only in the header
        let found = service.search("name").await.unwrap();
        assert!(found.is_empty());

        let found = service.search("TEST").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].number, 4);
    }

    #[tokio::test]
    async fn page_filters_blank_rows() {
        let service = SheetsService::connect(sample_api()).await.unwrap();
        let page = service.page(1).await.unwrap();
        assert_eq!(page.total_rows, 2);
        assert_eq!(
            page.rows.iter().map(|r| r.number).collect::<Vec<_>>(),
            vec![2, 4]
        );
    }

    #[tokio::test]
    async fn append_pads_to_column_count_and_reports_row_number() {
        let api = sample_api();
        let service = SheetsService::connect(api).await.unwrap();
        let number = service
            .append_row(vec!["Carol".into(), "carol@x.com".into()])
            .await
            .unwrap();
        assert_eq!(number, 5);
        let row = service.get_row(5).await.unwrap().unwrap();
        assert_eq!(row.cells, vec!["Carol", "carol@x.com", ""]);
    }

    #[tokio::test]
    async fn append_truncates_extra_cells() {
        let service = SheetsService::connect(sample_api()).await.unwrap();
        service
            .append_row(vec!["a".into(), "b".into(), "c".into(), "d".into()])
            .await
            .unwrap();
        let row = service.get_row(5).await.unwrap().unwrap();
        assert_eq!(row.cells.len(), 3);
    }

    #[tokio::test]
    async fn formulas_are_normalized_and_read_back() {
        let service = SheetsService::connect(sample_api()).await.unwrap();
        let written = service
            .set_cell_formula(2, 3, "SUM(A1:A10)")
            .await
            .unwrap();
        assert_eq!(written, "=SUM(A1:A10)");
        assert_eq!(
            service.cell_formula(2, 3).await.unwrap(),
            Some("=SUM(A1:A10)".to_string())
        );
        assert_eq!(service.cell_formula(4, 1).await.unwrap(), None);
    }
}
