use crate::{JsonDbError, Result, ThreadPool};
use crossbeam::sync::WaitGroup;
use tracing::debug;

/// A thread pool that uses a work stealing strategy as implemented by the [`Rayon`] library.
///
/// Dropping a rayon pool does not wait for its jobs, so each job carries a clone of a
/// [`WaitGroup`] that [`join`] waits on.
///
/// [`Rayon`]: https://docs.rs/rayon/latest/rayon/index.html
/// [`join`]: ../trait.ThreadPool.html#tymethod.join
pub struct RayonThreadPool {
    pool: rayon::ThreadPool,
    pending: WaitGroup,
}

impl ThreadPool for RayonThreadPool {
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads as usize)
            .thread_name(|i| format!("jsondb-rayon-{}", i))
            .build()
            .map_err(|e| JsonDbError::StringErr(format!("could not build thread pool: {:?}", &e)))?;
        debug!("created rayon thread pool with {} threads", &threads);

        Ok(Self {
            pool,
            pending: WaitGroup::new(),
        })
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let done = self.pending.clone();
        // `spawn` queues the job, `install` would block the accept loop until it finished
        self.pool.spawn(move || {
            let _done = done;
            job();
        });
    }

    fn join(self) {
        let RayonThreadPool { pool, pending } = self;
        pending.wait();
        drop(pool);
        debug!("rayon thread pool drained");
    }
}
