use std::collections::{HashMap, HashSet};

use crate::connector::Connector;
use crate::errors::{ConnectionError, SourceError};
use crate::materializer::RowCursor;
use crate::source::Source;
use crate::types::ColumnValue;

/// Result set kept in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<ColumnValue>>,
    fail_at_row: Option<usize>,
}

impl MemoryTable {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        MemoryTable {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: vec![],
            fail_at_row: None,
        }
    }

    pub fn row(mut self, values: Vec<ColumnValue>) -> Self {
        self.rows.push(values);
        self
    }

    /// reading row `index` (0 based) raises a driver error
    pub fn fail_at_row(mut self, index: usize) -> Self {
        self.fail_at_row = Some(index);
        self
    }

    pub fn cursor(&self) -> MemoryCursor {
        MemoryCursor {
            columns: self.columns.clone(),
            rows: self.rows.clone().into_iter(),
            position: 0,
            fail_at_row: self.fail_at_row,
        }
    }
}

pub struct MemoryCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<ColumnValue>>,
    position: usize,
    fail_at_row: Option<usize>,
}

impl RowCursor for MemoryCursor {
    fn columns(&self) -> &[String] {
        self.columns.as_slice()
    }

    fn next_row(&mut self) -> Option<Result<Vec<ColumnValue>, SourceError>> {
        if self.fail_at_row == Some(self.position) {
            self.fail_at_row = None;
            return Some(Err(SourceError::Driver(format!(
                "connection lost while reading row {}",
                self.position
            ))));
        }

        let row = self.rows.next()?;
        self.position += 1;
        Some(Ok(row))
    }
}

/// In-memory SQL source, answering statements it has been given up front
#[derive(Default)]
pub struct MemorySource {
    tables: Vec<(String, MemoryTable)>,
    queries: HashMap<String, MemoryTable>,
    failing_queries: HashSet<String>,
    fail_listing: bool,
    fail_connection: bool,
    connected: bool,
    close_calls: usize,
    executed: Vec<(String, Vec<ColumnValue>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// tables are listed in insertion order
    pub fn with_table<S: Into<String>>(mut self, name: S, table: MemoryTable) -> Self {
        let name = name.into();
        let sql = self.table_query(name.as_str());
        let _ = self.queries.insert(sql, table.clone());
        self.tables.push((name, table));
        self
    }

    pub fn with_query<S: Into<String>>(mut self, sql: S, table: MemoryTable) -> Self {
        let _ = self.queries.insert(sql.into(), table);
        self
    }

    pub fn with_failing_query<S: Into<String>>(mut self, sql: S) -> Self {
        let _ = self.failing_queries.insert(sql.into());
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn with_failing_connection(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    /// statements run so far, with their bound parameters
    pub fn executed(&self) -> &[(String, Vec<ColumnValue>)] {
        self.executed.as_slice()
    }
}

impl Connector for MemorySource {
    fn init(&mut self) -> Result<(), ConnectionError> {
        if self.fail_connection {
            return Err(ConnectionError::Driver(
                "memory source refused the connection".to_string(),
            ));
        }

        self.connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        self.connected = false;
        self.close_calls += 1;
        Ok(())
    }
}

impl Source for MemorySource {
    fn list_tables(&mut self) -> Result<Vec<String>, SourceError> {
        if !self.connected {
            return Err(SourceError::NotConnected);
        }

        if self.fail_listing {
            return Err(SourceError::Driver("SHOW TABLES denied".to_string()));
        }

        Ok(self.tables.iter().map(|(name, _)| name.clone()).collect())
    }

    fn query<'a>(
        &'a mut self,
        sql: &str,
        params: &[ColumnValue],
    ) -> Result<Box<dyn RowCursor + 'a>, SourceError> {
        if !self.connected {
            return Err(SourceError::NotConnected);
        }

        self.executed.push((sql.to_string(), params.to_vec()));

        if self.failing_queries.contains(sql) {
            return Err(SourceError::Driver(format!(
                "syntax error near '{}'",
                sql
            )));
        }

        match self.queries.get(sql) {
            Some(table) => Ok(Box::new(table.cursor())),
            None => Err(SourceError::Driver(format!("unknown statement '{}'", sql))),
        }
    }

    fn ping(&mut self) -> Result<(), ConnectionError> {
        match self.connected {
            true => Ok(()),
            false => Err(ConnectionError::NotConnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::connector::Connector;
    use crate::errors::SourceError;
    use crate::source::memory::{MemorySource, MemoryTable};
    use crate::source::Source;
    use crate::types::ColumnValue;

    #[test]
    fn requires_init() {
        let mut source = MemorySource::new().with_table("loja", MemoryTable::new(vec!["id"]));

        assert!(matches!(
            source.list_tables(),
            Err(SourceError::NotConnected)
        ));
        assert!(source.ping().is_err());

        source.init().unwrap();
        assert_eq!(source.list_tables().unwrap(), vec!["loja".to_string()]);
        assert!(source.ping().is_ok());
    }

    #[test]
    fn answers_table_dumps_and_records_params() {
        let mut source = MemorySource::new().with_table(
            "loja",
            MemoryTable::new(vec!["id"]).row(vec![ColumnValue::Integer(1)]),
        );
        source.init().unwrap();

        {
            let mut cursor = source
                .query("SELECT * FROM loja", &[ColumnValue::Integer(7)])
                .unwrap();
            assert_eq!(cursor.columns(), &["id".to_string()]);
            assert!(cursor.next_row().is_some());
            assert!(cursor.next_row().is_none());
        }

        assert!(source.query("SELECT * FROM missing", &[]).is_err());
        assert_eq!(source.executed().len(), 2);
        assert_eq!(source.executed()[0].1, vec![ColumnValue::Integer(7)]);
    }
}
