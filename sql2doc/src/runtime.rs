use std::future::Future;
use std::io::Error;

use tokio::runtime::{Builder, Runtime};

/// Single threaded runtime owned by one connector; async drivers are driven through it
/// so that the whole transfer stays blocking and sequential.
pub fn new_runtime(thread_name: &str) -> Result<Runtime, Error> {
    Builder::new_current_thread()
        .thread_name(thread_name)
        .enable_all()
        .build()
}

pub fn block_on<F: Future>(future: F, runtime: &Runtime) -> F::Output {
    runtime.block_on(future)
}
