//! Process runtime for sitetopic: one multi-threaded Tokio runtime and a shared
//! cancellation token that the HTTP server and one-shot commands watch.

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cloneable view of the runtime for spawning work and observing shutdown.
#[derive(Clone)]
pub struct SiteTopicHandle {
    inner: Handle,
    cancel: Arc<CancellationToken>,
}

/// Multi-threaded Tokio runtime plus the process-wide shutdown token.
pub struct SiteTopicRuntime {
    runtime: Runtime,
    cancel: Arc<CancellationToken>,
}

impl SiteTopicRuntime {
    /// Build the runtime the service runs on.
    ///
    /// ```
    /// use sitetopic_runtime::SiteTopicRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = SiteTopicRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder.build()?;
        let cancel = Arc::new(CancellationToken::new());
        Ok(Self { runtime, cancel })
    }

    /// A handle sharing this runtime's executor and cancellation token.
    ///
    /// ```
    /// use sitetopic_runtime::SiteTopicRuntime;
    ///
    /// let runtime = SiteTopicRuntime::build("handle-example", Some(1)).unwrap();
    /// assert!(!runtime.handle().cancellation().is_cancelled());
    /// ```
    pub fn handle(&self) -> SiteTopicHandle {
        SiteTopicHandle {
            inner: self.runtime.handle().clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Drive `fut` to completion on the runtime from synchronous code.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel outstanding work and give in-flight tasks `graceful` to finish.
    ///
    /// ```
    /// use sitetopic_runtime::SiteTopicRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = SiteTopicRuntime::build("shutdown-example", Some(1)).unwrap();
    /// let token = runtime.handle().cancellation();
    /// runtime.shutdown(Duration::from_millis(5));
    /// assert!(token.is_cancelled());
    /// ```
    pub fn shutdown(self, graceful: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

impl SiteTopicHandle {
    /// Spawn a task onto the runtime's worker pool.
    ///
    /// ```
    /// use sitetopic_runtime::SiteTopicRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = SiteTopicRuntime::build("spawn-doctest", Some(1)).unwrap();
    /// let task = runtime.handle().spawn(async { 21 * 2 });
    /// let result = runtime.block_on(async move { task.await.unwrap() });
    /// assert_eq!(result, 42);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    /// The process-wide token; cancelled on shutdown or Ctrl-C.
    pub fn cancellation(&self) -> Arc<CancellationToken> {
        self.cancel.clone()
    }

    /// Resolves on Ctrl-C or once the shared token is cancelled, whichever
    /// comes first. Ctrl-C also cancels the token so other tasks see it.
    ///
    /// ```
    /// use sitetopic_runtime::SiteTopicRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = SiteTopicRuntime::build("signal-doctest", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// handle.cancellation().cancel();
    /// runtime.block_on(handle.shutdown_signal());
    /// runtime.shutdown(Duration::from_millis(5));
    /// ```
    pub async fn shutdown_signal(self) {
        let cancel = self.cancel.clone();
        tokio::select! {
            _ = cancel.cancelled() => {}
            res = tokio::signal::ctrl_c() => {
                match res {
                    Ok(()) => {
                        tracing::info!("shutdown.ctrl_c");
                        cancel.cancel();
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "shutdown.signal_unavailable");
                        cancel.cancelled().await;
                    }
                }
            }
        }
    }
}
