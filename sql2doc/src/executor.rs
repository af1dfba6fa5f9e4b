use log::debug;

use crate::errors::TransferError;
use crate::materializer::{materialize, Materializer};
use crate::source::Source;
use crate::types::{bind_params, WorkUnit};

/// Open a cursor for `unit` and return its lazy document sequence.
///
/// Parameters are handed to the driver as bind values, never spliced into the SQL text.
pub fn execute<'a, S: Source + ?Sized>(
    source: &'a mut S,
    unit: &WorkUnit,
) -> Result<Materializer<'a>, TransferError> {
    let params = bind_params(unit.params());
    debug!(
        "executing '{}' with {} parameter(s): {}",
        unit.name(),
        params.len(),
        unit.sql()
    );

    let cursor = source
        .query(unit.sql(), params.as_slice())
        .map_err(TransferError::Query)?;
    let columns = cursor.columns().to_vec();

    Ok(materialize(columns, cursor))
}
