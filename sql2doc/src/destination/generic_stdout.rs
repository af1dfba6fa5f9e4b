use std::io::{stdout, Stdout, Write};

use serde_json::json;

use crate::connector::Connector;
use crate::destination::Destination;
use crate::errors::{ConnectionError, SinkError};
use crate::sink::DocumentSink;
use crate::types::{Document, WriteCount};

/// Stream documents as JSON lines on stdout (or any writer)
pub struct GenericStdout<W: Write = Stdout> {
    writer: W,
}

impl GenericStdout {
    pub fn new() -> Self {
        GenericStdout { writer: stdout() }
    }
}

impl Default for GenericStdout {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> GenericStdout<W> {
    pub fn with_writer(writer: W) -> Self {
        GenericStdout { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Connector for GenericStdout<W> {
    fn init(&mut self) -> Result<(), ConnectionError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        Ok(self.writer.flush()?)
    }
}

impl<W: Write> DocumentSink for GenericStdout<W> {
    fn insert_many(
        &mut self,
        collection: &str,
        documents: &[Document],
    ) -> Result<WriteCount, SinkError> {
        for (written, document) in documents.iter().enumerate() {
            let line = json!({ "collection": collection, "document": document.to_json() });

            writeln!(self.writer, "{}", line)
                .map_err(|err| SinkError::new(written, err.to_string()))?;
        }

        Ok(documents.len())
    }
}

impl<W: Write> Destination for GenericStdout<W> {}
