//! Tokio runtime spawner implementation.

use std::future::Future;
use std::sync::Arc;

use crate::core::Spawn;

/// Tokio-based spawner that runs background loops such as the sweeper.
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Arc<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Create a spawner from a tokio runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Spawner bound to the runtime the caller is running on.
    ///
    /// Returns `None` outside a tokio runtime.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }

    /// Build a dedicated multi-threaded runtime with one worker per CPU and
    /// return it with a spawner bound to it.
    ///
    /// The runtime must be kept alive for as long as spawned work should run.
    pub fn dedicated() -> Result<(tokio::runtime::Runtime, Self), std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(num_cpus::get().max(1))
            .thread_name("parking-background")
            .enable_all()
            .build()?;
        let spawner = Self::new(runtime.handle().clone());
        Ok((runtime, spawner))
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
