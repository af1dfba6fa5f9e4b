use crate::connector::Connector;
use crate::sink::DocumentSink;

pub mod generic_stdout;
pub mod memory;
pub mod mongodb;

pub trait Destination: Connector + DocumentSink {}
