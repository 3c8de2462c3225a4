//! Background execution of blocking operations.
//!
//! [`spawn`] runs any blocking operation on a dedicated worker thread and
//! delivers its result through a completion callback. With the `async-io`
//! feature, [`run_blocking`] offers the same on the Tokio blocking pool.
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use tgzkit_archive::{facade, task};
//!
//! let source = PathBuf::from("project");
//! let destination = PathBuf::from("project.tar.gz");
//! let handle = task::spawn(
//!     move || facade::tar_gzip_file(&source, &destination),
//!     |result| println!("finished: {:?}", result),
//! )
//! .unwrap();
//! handle.join().unwrap();
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tgzkit_core::error::{Result, TgzError};
use tracing::{debug, error};

/// Name given to worker threads.
pub const WORKER_NAME: &str = "tgzkit-worker";

/// Run `op` on a new worker thread, then pass its result to `callback` on
/// that same thread.
///
/// A panic inside `op` is reported to the callback as [`TgzError::Join`].
pub fn spawn<T, F, C>(op: F, callback: C) -> Result<JoinHandle<()>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
    C: FnOnce(Result<T>) + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(WORKER_NAME.to_string())
        .spawn(move || {
            debug!("background operation started");
            let result = match panic::catch_unwind(AssertUnwindSafe(op)) {
                Ok(result) => result,
                Err(_) => {
                    error!("background operation panicked");
                    Err(TgzError::Join)
                }
            };
            callback(result);
        })?;
    Ok(handle)
}

/// Run `op` on the Tokio blocking thread pool and await its result.
#[cfg(feature = "async-io")]
pub async fn run_blocking<T, F>(op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "blocking task failed to complete");
            Err(TgzError::Join)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_spawn_delivers_result() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn(|| Ok(42u32), move |result| tx.send(result).unwrap()).unwrap();
        handle.join().unwrap();

        assert_eq!(rx.recv().unwrap().unwrap(), 42);
    }

    #[test]
    fn test_spawn_runs_on_named_worker() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn(
            || Ok(thread::current().name().map(str::to_string)),
            move |result| tx.send(result).unwrap(),
        )
        .unwrap();
        handle.join().unwrap();

        assert_eq!(rx.recv().unwrap().unwrap().as_deref(), Some(WORKER_NAME));
    }

    #[test]
    fn test_spawn_delivers_error() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn(
            || Err::<(), _>(TgzError::unexpected_state("boom")),
            move |result| tx.send(result).unwrap(),
        )
        .unwrap();
        handle.join().unwrap();

        assert!(matches!(rx.recv().unwrap(), Err(TgzError::UnexpectedState { .. })));
    }

    #[test]
    fn test_spawn_reports_panic_as_join() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn(
            || -> Result<()> { panic!("worker exploded") },
            move |result| tx.send(result).unwrap(),
        )
        .unwrap();
        handle.join().unwrap();

        assert!(matches!(rx.recv().unwrap(), Err(TgzError::Join)));
    }

    #[cfg(feature = "async-io")]
    #[tokio::test]
    async fn test_run_blocking() {
        let value = run_blocking(|| Ok(7u8)).await.unwrap();
        assert_eq!(value, 7);

        let err = run_blocking(|| Err::<(), _>(TgzError::compression_failed("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, TgzError::CompressionFailed { .. }));
    }
}
