use std::collections::BTreeMap;

use crate::connector::Connector;
use crate::destination::Destination;
use crate::errors::{ConnectionError, SinkError};
use crate::sink::DocumentSink;
use crate::types::{Document, WriteCount};

/// Keeps inserted documents per collection
#[derive(Default)]
pub struct MemoryDestination {
    collections: BTreeMap<String, Vec<Document>>,
    batch_sizes: Vec<usize>,
    fail_after: Option<usize>,
    connected: bool,
    close_calls: usize,
}

impl MemoryDestination {
    pub fn new() -> Self {
        MemoryDestination::default()
    }

    /// accept `count` documents in total, then reject the next insert once
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn documents(&self, collection: &str) -> &[Document] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_documents(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn batch_sizes(&self) -> &[usize] {
        self.batch_sizes.as_slice()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }
}

impl Connector for MemoryDestination {
    fn init(&mut self) -> Result<(), ConnectionError> {
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        self.connected = false;
        self.close_calls += 1;
        Ok(())
    }
}

impl DocumentSink for MemoryDestination {
    fn insert_many(
        &mut self,
        collection: &str,
        documents: &[Document],
    ) -> Result<WriteCount, SinkError> {
        self.batch_sizes.push(documents.len());
        let mut total = self.total_documents();
        let stored = self.collections.entry(collection.to_string()).or_default();

        for (written, document) in documents.iter().enumerate() {
            if self.fail_after.map_or(false, |limit| total >= limit) {
                self.fail_after = None;
                return Err(SinkError::new(written, "E11000 duplicate key error"));
            }

            stored.push(document.clone());
            total += 1;
        }

        Ok(documents.len())
    }
}

impl Destination for MemoryDestination {}
