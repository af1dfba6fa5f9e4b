use log::debug;

use crate::errors::{SinkError, SourceError, TransferError};
use crate::types::{Document, WriteCount};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Document store receiving inserts. Writes are append only.
pub trait DocumentSink {
    /// insert `documents` in order; on failure the error tells how many were committed
    fn insert_many(
        &mut self,
        collection: &str,
        documents: &[Document],
    ) -> Result<WriteCount, SinkError>;
}

/// Drain `documents` into `collection` in batches of `batch_size`.
///
/// Returns the number of documents written. On a sink failure the error carries the total
/// committed across all batches; on a cursor failure the pending batch is dropped and the
/// error carries what was already written.
pub fn write<D, I>(
    sink: &mut D,
    collection: &str,
    documents: I,
    batch_size: usize,
) -> Result<WriteCount, TransferError>
where
    D: DocumentSink + ?Sized,
    I: IntoIterator<Item = Result<Document, SourceError>>,
{
    let batch_size = batch_size.max(1);
    let mut batch = Vec::with_capacity(batch_size);
    let mut written: WriteCount = 0;

    for document in documents {
        match document {
            Ok(document) => batch.push(document),
            Err(err) => {
                return Err(TransferError::CursorReadFailed {
                    source: err,
                    written,
                })
            }
        }

        if batch.len() >= batch_size {
            written += flush(sink, collection, &mut batch, written)?;
        }
    }

    if !batch.is_empty() {
        written += flush(sink, collection, &mut batch, written)?;
    }

    Ok(written)
}

fn flush<D: DocumentSink + ?Sized>(
    sink: &mut D,
    collection: &str,
    batch: &mut Vec<Document>,
    already_written: WriteCount,
) -> Result<WriteCount, TransferError> {
    debug!("inserting {} document(s) into '{}'", batch.len(), collection);

    match sink.insert_many(collection, batch.as_slice()) {
        Ok(count) => {
            batch.clear();
            Ok(count)
        }
        Err(err) => Err(TransferError::Write(SinkError::new(
            already_written + err.written,
            err.message,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::destination::memory::MemoryDestination;
    use crate::errors::{SourceError, TransferError};
    use crate::sink::write;
    use crate::types::{Document, NormalizedValue};

    fn documents(count: usize) -> Vec<Result<Document, SourceError>> {
        (0..count)
            .map(|i| {
                let mut document = Document::default();
                document.insert("id", NormalizedValue::Integer(i as i64));
                Ok(document)
            })
            .collect()
    }

    #[test]
    fn write_in_batches() {
        let mut destination = MemoryDestination::new();

        let written = write(&mut destination, "LOJAS", documents(25), 10).unwrap();

        assert_eq!(written, 25);
        assert_eq!(destination.documents("LOJAS").len(), 25);
        assert_eq!(destination.batch_sizes(), &[10, 10, 5]);
    }

    #[test]
    fn nothing_to_write() {
        let mut destination = MemoryDestination::new();

        assert_eq!(write(&mut destination, "LOJAS", documents(0), 10).unwrap(), 0);
        assert!(destination.batch_sizes().is_empty());
    }

    #[test]
    fn partial_write_is_counted() {
        let mut destination = MemoryDestination::new().fail_after(4);

        let err = write(&mut destination, "LOJAS", documents(10), 10).unwrap_err();

        assert!(matches!(err, TransferError::Write(_)));
        assert_eq!(err.written(), 4);
        assert_eq!(destination.documents("LOJAS").len(), 4);
    }

    #[test]
    fn partial_write_counts_previous_batches() {
        let mut destination = MemoryDestination::new().fail_after(7);

        let err = write(&mut destination, "LOJAS", documents(10), 5).unwrap_err();

        assert_eq!(err.written(), 7);
    }

    #[test]
    fn cursor_failure_stops_the_write() {
        let mut destination = MemoryDestination::new();
        let mut input = documents(3);
        input.push(Err(SourceError::Driver("lost connection".to_string())));
        input.extend(documents(3));

        let err = write(&mut destination, "LOJAS", input, 2).unwrap_err();

        assert!(matches!(err, TransferError::CursorReadFailed { .. }));
        assert_eq!(err.written(), 2);
        assert_eq!(destination.documents("LOJAS").len(), 2);
    }
}
