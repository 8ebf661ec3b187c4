pub mod addr;
pub mod formula;
pub mod types;

pub use addr::{CellAddr, column_letters};
pub use types::{PAGE_SIZE, Row, RowPage, data_rows, non_empty_rows, paginate};
