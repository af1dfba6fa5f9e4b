use crate::errors::SourceError;
use crate::normalizer::normalize;
use crate::types::{ColumnValue, Document};

/// Forward-only, single-pass handle over a result set
pub trait RowCursor {
    fn columns(&self) -> &[String];
    /// `None` once the result set is exhausted
    fn next_row(&mut self) -> Option<Result<Vec<ColumnValue>, SourceError>>;
}

/// Lazy sequence of documents, one per cursor row.
///
/// The first cursor failure is yielded once, then the sequence ends.
pub struct Materializer<'a> {
    columns: Vec<String>,
    cursor: Box<dyn RowCursor + 'a>,
    exhausted: bool,
}

pub fn materialize<'a>(columns: Vec<String>, cursor: Box<dyn RowCursor + 'a>) -> Materializer<'a> {
    Materializer {
        columns,
        cursor,
        exhausted: false,
    }
}

impl<'a> Materializer<'a> {
    pub fn columns(&self) -> &[String] {
        self.columns.as_slice()
    }

    fn to_document(&self, values: Vec<ColumnValue>) -> Result<Document, SourceError> {
        if values.len() != self.columns.len() {
            return Err(SourceError::ColumnMismatch {
                expected: self.columns.len(),
                got: values.len(),
            });
        }

        let mut document = Document::with_capacity(values.len());
        for (column, value) in self.columns.iter().zip(values) {
            document.insert(column.as_str(), normalize(value));
        }

        Ok(document)
    }
}

impl<'a> Iterator for Materializer<'a> {
    type Item = Result<Document, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let row = match self.cursor.next_row() {
            Some(Ok(values)) => self.to_document(values),
            Some(Err(err)) => Err(err),
            None => {
                self.exhausted = true;
                return None;
            }
        };

        if row.is_err() {
            self.exhausted = true;
        }

        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::SourceError;
    use crate::materializer::{materialize, RowCursor};
    use crate::source::memory::MemoryTable;
    use crate::types::{ColumnValue, NormalizedValue};

    #[test]
    fn one_document_per_row() {
        let table = MemoryTable::new(vec!["id", "nome"])
            .row(vec![
                ColumnValue::Integer(1),
                ColumnValue::RawBytes(b"Acme".to_vec()),
            ])
            .row(vec![ColumnValue::Integer(2), ColumnValue::Null])
            .row(vec![
                ColumnValue::Integer(3),
                ColumnValue::Text("Gama".to_string()),
            ]);

        let cursor = table.cursor();
        let columns = cursor.columns().to_vec();
        let documents = materialize(columns, Box::new(cursor))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(documents.len(), 3);
        for document in &documents {
            assert_eq!(document.keys().collect::<Vec<_>>(), vec!["id", "nome"]);
        }
        assert_eq!(
            documents[0].get("nome"),
            Some(&NormalizedValue::String("Acme".to_string()))
        );
        assert_eq!(documents[1].get("nome"), Some(&NormalizedValue::Null));
    }

    #[test]
    fn empty_cursor_gives_no_document() {
        let table = MemoryTable::new(vec!["id"]);
        let mut documents = materialize(vec!["id".to_string()], Box::new(table.cursor()));

        assert!(documents.next().is_none());
        assert!(documents.next().is_none());
    }

    #[test]
    fn cursor_failure_ends_the_sequence() {
        let table = MemoryTable::new(vec!["id"])
            .row(vec![ColumnValue::Integer(1)])
            .row(vec![ColumnValue::Integer(2)])
            .fail_at_row(1);

        let mut documents = materialize(vec!["id".to_string()], Box::new(table.cursor()));

        assert!(documents.next().unwrap().is_ok());
        assert!(matches!(
            documents.next(),
            Some(Err(SourceError::Driver(_)))
        ));
        assert!(documents.next().is_none());
    }

    #[test]
    fn short_row_is_a_read_failure() {
        let table = MemoryTable::new(vec!["id", "nome"]).row(vec![ColumnValue::Integer(1)]);
        let mut documents = materialize(
            vec!["id".to_string(), "nome".to_string()],
            Box::new(table.cursor()),
        );

        assert!(matches!(
            documents.next(),
            Some(Err(SourceError::ColumnMismatch {
                expected: 2,
                got: 1
            }))
        ));
        assert!(documents.next().is_none());
    }
}
