use crate::connector::Connector;
use crate::errors::{ConnectionError, SourceError};
use crate::materializer::RowCursor;
use crate::types::ColumnValue;

pub mod firebird;
pub mod memory;
pub mod mssql;
pub mod mysql;

/// SQL source, whatever the dialect
pub trait Source: Connector {
    fn list_tables(&mut self) -> Result<Vec<String>, SourceError>;

    /// statement dumping a whole table; `table` comes from `list_tables`
    fn table_query(&self, table: &str) -> String {
        format!("SELECT * FROM {}", table)
    }

    /// run `sql` with positional bind parameters
    fn query<'a>(
        &'a mut self,
        sql: &str,
        params: &[ColumnValue],
    ) -> Result<Box<dyn RowCursor + 'a>, SourceError>;

    fn ping(&mut self) -> Result<(), ConnectionError>;
}
