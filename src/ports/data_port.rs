//! Market data port.

use crate::domain::error::StockDslError;
use crate::domain::row::Row;

pub trait DataPort {
    /// Rows for one symbol in chronological order. An empty vector means the
    /// symbol has no data and is skipped.
    fn load_rows(&self, symbol: &str) -> Result<Vec<Row>, StockDslError>;
}
