pub mod sheets;

pub use sheets::{SheetsApi, SheetsClient, SheetsService};
