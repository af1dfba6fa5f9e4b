use std::fmt;

use crate::types::WriteCount;

/// Failure to open, verify or close a connection. Fatal for a run.
#[derive(Debug)]
pub enum ConnectionError {
    Io(std::io::Error),
    Driver(String),
    NotConnected,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Io(err) => write!(f, "connection i/o error: {}", err),
            ConnectionError::Driver(err) => write!(f, "connection error: {}", err),
            ConnectionError::NotConnected => write!(f, "connection is not initialized"),
        }
    }
}

impl std::error::Error for ConnectionError {}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        ConnectionError::Io(err)
    }
}

/// Error raised by a SQL source while listing tables, running a statement or reading rows
#[derive(Debug)]
pub enum SourceError {
    Driver(String),
    NotConnected,
    ColumnMismatch { expected: usize, got: usize },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Driver(err) => write!(f, "{}", err),
            SourceError::NotConnected => write!(f, "source is not connected"),
            SourceError::ColumnMismatch { expected, got } => write!(
                f,
                "row has {} values but the result set has {} columns",
                got, expected
            ),
        }
    }
}

impl std::error::Error for SourceError {}

/// Error raised by a document destination; `written` documents were committed before it
#[derive(Debug)]
pub struct SinkError {
    pub written: WriteCount,
    pub message: String,
}

impl SinkError {
    pub fn new<S: Into<String>>(written: WriteCount, message: S) -> Self {
        SinkError {
            written,
            message: message.into(),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} document(s) written before failure)",
            self.message, self.written
        )
    }
}

impl std::error::Error for SinkError {}

#[derive(Debug)]
pub enum TransferError {
    /// cannot list tables or load the query catalog; nothing can run
    CatalogUnavailable(SourceError),
    Connection(ConnectionError),
    Query(SourceError),
    CursorReadFailed {
        source: SourceError,
        written: WriteCount,
    },
    Write(SinkError),
}

impl TransferError {
    /// only catalog and connection failures stop a run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransferError::CatalogUnavailable(_) | TransferError::Connection(_)
        )
    }

    pub fn written(&self) -> WriteCount {
        match self {
            TransferError::CursorReadFailed { written, .. } => *written,
            TransferError::Write(err) => err.written,
            _ => 0,
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::CatalogUnavailable(err) => write!(f, "catalog unavailable: {}", err),
            TransferError::Connection(err) => write!(f, "{}", err),
            TransferError::Query(err) => write!(f, "query error: {}", err),
            TransferError::CursorReadFailed { source, written } => write!(
                f,
                "cursor read failed after {} document(s): {}",
                written, source
            ),
            TransferError::Write(err) => write!(f, "write error: {}", err),
        }
    }
}

impl std::error::Error for TransferError {}

impl From<ConnectionError> for TransferError {
    fn from(err: ConnectionError) -> Self {
        TransferError::Connection(err)
    }
}
