use thiserror::Error;

/// Errors produced by the spreadsheet gateway.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The Sheets API answered with a non-success status.
    #[error("sheets api returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected sheets api response: {0}")]
    Malformed(String),

    /// The configured worksheet does not exist in the spreadsheet.
    #[error("worksheet '{0}' not found")]
    WorksheetNotFound(String),
}
