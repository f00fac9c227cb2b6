//! Bounded pools of worker threads that run one job per accepted connection.
//!
//! Two implementations are provided: [`SharedQueueThreadPool`], a fixed set of threads
//! pulling jobs off a crossbeam channel, and [`RayonThreadPool`], which hands jobs to a
//! work-stealing rayon pool.
use crate::Result;

mod rayon_pool;
mod shared_queue;

pub use self::rayon_pool::RayonThreadPool;
pub use self::shared_queue::SharedQueueThreadPool;

/// A pool of threads that jobs can be spawned onto.
pub trait ThreadPool {
    /// creates a new pool that runs jobs on `threads` threads
    ///
    /// # Errors
    /// returns an error if any of the threads could not be started
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized;

    /// queues `job` to run on one of the pool's threads.
    ///
    /// This never blocks waiting for a free thread, jobs wait in the pool's queue instead.
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static;

    /// stops taking jobs and blocks until every job already spawned has finished,
    /// including jobs that panicked
    fn join(self)
    where
        Self: Sized;
}
