pub mod config;
pub mod connector;
pub mod destination;
pub mod errors;
pub mod executor;
pub mod materializer;
pub mod normalizer;
pub mod resolver;
pub mod runtime;
pub mod sink;
pub mod source;
pub mod tasks;
pub mod types;
pub mod utils;
