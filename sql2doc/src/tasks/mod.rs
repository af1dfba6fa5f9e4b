use crate::errors::{SinkError, TransferError};
use crate::types::WriteCount;

pub mod transfer;

pub type UnitsDone = usize;
pub type UnitsTotal = usize;

pub trait Task {
    fn run<F: FnMut(UnitsDone, UnitsTotal)>(
        &mut self,
        progress_callback: F,
    ) -> Result<TransferReport, TransferError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    ResolvingUnits,
    ExecutingUnit,
    Normalizing,
    Writing,
    UnitSucceeded,
    UnitFailed,
    Done,
}

/// Outcome of one work unit
#[derive(Debug)]
pub enum TransferResult {
    Success(WriteCount),
    /// statement or cursor failure
    SourceQueryFailed(TransferError),
    SinkWriteFailed(SinkError, WriteCount),
}

impl TransferResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferResult::Success(_))
    }

    pub fn written(&self) -> WriteCount {
        match self {
            TransferResult::Success(count) => *count,
            TransferResult::SourceQueryFailed(err) => err.written(),
            TransferResult::SinkWriteFailed(_, count) => *count,
        }
    }
}

impl From<Result<WriteCount, TransferError>> for TransferResult {
    fn from(result: Result<WriteCount, TransferError>) -> Self {
        match result {
            Ok(count) => TransferResult::Success(count),
            Err(TransferError::Write(err)) => {
                let written = err.written;
                TransferResult::SinkWriteFailed(err, written)
            }
            Err(err) => TransferResult::SourceQueryFailed(err),
        }
    }
}

/// Per unit results of a run, in execution order
#[derive(Debug, Default)]
pub struct TransferReport {
    pub units: Vec<(String, TransferResult)>,
}

impl TransferReport {
    pub fn successes(&self) -> usize {
        self.units
            .iter()
            .filter(|(_, result)| result.is_success())
            .count()
    }

    pub fn failures(&self) -> usize {
        self.units.len() - self.successes()
    }

    pub fn documents_written(&self) -> WriteCount {
        self.units.iter().map(|(_, result)| result.written()).sum()
    }
}
