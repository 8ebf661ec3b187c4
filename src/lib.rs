pub mod callback;
pub mod config;
pub mod core;
pub mod error;
pub mod format;
pub mod guards;
pub mod handlers;
pub mod keyboards;
pub mod logging;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use core::{CellAddr, Row, RowPage};
pub use error::SheetsError;
pub use handlers::AppContext;
pub use services::{SheetsApi, SheetsClient, SheetsService};
pub use session::SessionStore;
