use crate::errors::ConnectionError;

/// Connection lifecycle shared by sources and destinations.
///
/// `close` must be safe to call on a connector that was never initialized.
pub trait Connector {
    fn init(&mut self) -> Result<(), ConnectionError>;
    fn close(&mut self) -> Result<(), ConnectionError>;
}
