use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::pipeline::process;

/// Bounded CPU pool for running independent pipeline invocations.
///
/// Invocations share nothing; one input failing never affects the others.
pub struct Workers {
    pool: rayon::ThreadPool,
}

impl Workers {
    /// `None` sizes the pool to the available cores.
    pub fn new(threads: Option<usize>) -> BackdropResult<Self> {
        Ok(Self {
            pool: build_thread_pool(threads)?,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn process(&self, bytes: &[u8], config: &PipelineConfig) -> BackdropResult<Vec<u8>> {
        self.pool.install(|| process(bytes, config))
    }

    /// One result per input, in input order.
    pub fn process_all<B>(
        &self,
        inputs: &[B],
        config: &PipelineConfig,
    ) -> Vec<BackdropResult<Vec<u8>>>
    where
        B: AsRef<[u8]> + Sync,
    {
        self.pool.install(|| {
            inputs
                .par_iter()
                .enumerate()
                .map(|(idx, input)| {
                    let res = process(input.as_ref(), config);
                    if let Err(e) = &res {
                        tracing::warn!(input = idx, kind = ?e.kind(), "pipeline failed: {e}");
                    }
                    res
                })
                .collect()
        })
    }

    /// Run `job` once per item on the pool and return the results in item order.
    ///
    /// Callers that do their own I/O around [`process`] use this so each item's
    /// read and write stay inside its own task.
    pub fn run_all<T, R, F>(&self, items: &[T], job: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        self.pool.install(|| items.par_iter().map(&job).collect())
    }
}

fn build_thread_pool(threads: Option<usize>) -> BackdropResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(BackdropError::invalid_config(
            "worker 'threads' must be >= 1 when set",
        ));
    }

    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("backdrop-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        BackdropError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}
