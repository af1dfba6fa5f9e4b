use log::{debug, error, info, warn};

use crate::destination::Destination;
use crate::errors::TransferError;
use crate::executor::execute;
use crate::resolver::{resolve, WorkMode};
use crate::sink::{write, DEFAULT_BATCH_SIZE};
use crate::source::Source;
use crate::tasks::{Task, TransferReport, TransferResult, TransferState, UnitsDone, UnitsTotal};
use crate::types::WorkUnit;

#[derive(Debug, Clone, PartialEq)]
pub struct TransferOptions {
    /// destination collection, unless a catalog entry overrides it
    pub collection: String,
    pub batch_size: usize,
}

impl TransferOptions {
    pub fn new<S: Into<String>>(collection: S) -> Self {
        TransferOptions {
            collection: collection.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// TransferTask moves every work unit of a *Source* into a *Destination*, one unit at a time
pub struct TransferTask<S, D>
where
    S: Source,
    D: Destination,
{
    source: S,
    destination: D,
    mode: WorkMode,
    options: TransferOptions,
    state: TransferState,
}

impl<S, D> TransferTask<S, D>
where
    S: Source,
    D: Destination,
{
    pub fn new(source: S, destination: D, mode: WorkMode, options: TransferOptions) -> Self {
        TransferTask {
            source,
            destination,
            mode,
            options,
            state: TransferState::Idle,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    fn connect(&mut self) -> Result<(), TransferError> {
        self.source.init()?;
        self.destination.init()?;
        Ok(())
    }

    fn release(&mut self) {
        if let Err(err) = self.source.close() {
            warn!("cannot close the source connection: {}", err);
        }

        if let Err(err) = self.destination.close() {
            warn!("cannot close the destination connection: {}", err);
        }
    }

    fn transfer<F: FnMut(UnitsDone, UnitsTotal)>(
        &mut self,
        progress_callback: &mut F,
    ) -> Result<TransferReport, TransferError> {
        transition(&mut self.state, TransferState::ResolvingUnits);
        let units = resolve(&self.mode, &mut self.source)?;

        let total = units.len();
        let mut report = TransferReport::default();
        progress_callback(0, total);

        for (index, unit) in units.iter().enumerate() {
            let collection = unit
                .collection()
                .unwrap_or(self.options.collection.as_str())
                .to_string();

            let result = self.transfer_unit(unit, collection.as_str());

            match &result {
                TransferResult::Success(count) => {
                    transition(&mut self.state, TransferState::UnitSucceeded);
                    info!(
                        "{} '{}': {} document(s) written to '{}'",
                        unit.kind(),
                        unit.name(),
                        count,
                        collection
                    );
                }
                TransferResult::SourceQueryFailed(err) => {
                    transition(&mut self.state, TransferState::UnitFailed);
                    error!("{} '{}' failed: {}", unit.kind(), unit.name(), err);
                }
                TransferResult::SinkWriteFailed(err, _) => {
                    transition(&mut self.state, TransferState::UnitFailed);
                    error!(
                        "{} '{}' failed writing to '{}': {}",
                        unit.kind(),
                        unit.name(),
                        collection,
                        err
                    );
                }
            }

            report.units.push((unit.name().to_string(), result));
            progress_callback(index + 1, total);
        }

        info!(
            "{} unit(s) succeeded, {} failed, {} document(s) written",
            report.successes(),
            report.failures(),
            report.documents_written()
        );

        Ok(report)
    }

    fn transfer_unit(&mut self, unit: &WorkUnit, collection: &str) -> TransferResult {
        transition(&mut self.state, TransferState::ExecutingUnit);
        let documents = match execute(&mut self.source, unit) {
            Ok(documents) => documents,
            Err(err) => return TransferResult::from(Err(err)),
        };

        transition(&mut self.state, TransferState::Normalizing);
        debug!("columns of '{}': {:?}", unit.name(), documents.columns());

        transition(&mut self.state, TransferState::Writing);
        let result = write(
            &mut self.destination,
            collection,
            documents,
            self.options.batch_size,
        );

        TransferResult::from(result)
    }
}

impl<S, D> Task for TransferTask<S, D>
where
    S: Source,
    D: Destination,
{
    fn run<F: FnMut(UnitsDone, UnitsTotal)>(
        &mut self,
        mut progress_callback: F,
    ) -> Result<TransferReport, TransferError> {
        let result = self
            .connect()
            .and_then(|_| self.transfer(&mut progress_callback));

        // both connections are released on every exit path
        self.release();
        transition(&mut self.state, TransferState::Done);

        if let Err(err) = &result {
            error!("transfer aborted: {}", err);
        }

        result
    }
}

fn transition(state: &mut TransferState, next: TransferState) {
    debug!("{:?} -> {:?}", state, next);
    *state = next;
}
