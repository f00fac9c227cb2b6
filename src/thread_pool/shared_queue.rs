use crate::{Result, ThreadPool};
use crossbeam::channel;
use crossbeam::channel::{Receiver, Sender};
use crossbeam::sync::WaitGroup;
use std::thread;
use tracing::{debug, error, instrument};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A thread pool implemented with a shared job queue (i.e. channel).
///
/// This implementation uses the MPMC [`channel`] provided by the crossbeam crate.
/// Specifically, we are using it as a single producer, multiple consumer. The single producer
/// is this type itself, and the threads in the pool are the consumers.
///
/// If a job panics, its thread is replaced by a new one so the pool keeps its size. Failing
/// to start a replacement thread is logged and the pool shrinks by one.
///
/// Every queued job holds a clone of the pool's [`WaitGroup`], so [`join`] can wait for the
/// queue to drain. Dropping the pool without joining closes the channel; workers still finish
/// the jobs already queued and then exit, but nobody waits for them.
///
/// [`join`]: ../trait.ThreadPool.html#tymethod.join
/// [`channel`]: https://docs.rs/crossbeam/0.8.1/crossbeam/channel/index.html
pub struct SharedQueueThreadPool {
    /// the sending part of the channel
    tx: Sender<Job>,
    /// cloned into every job, released when the job is done
    pending: WaitGroup,
}

impl ThreadPool for SharedQueueThreadPool {
    /// create a new thread pool with the given number of `threads`.
    /// Every thread created will have a handle to the receiving end of the channel
    fn new(threads: u32) -> Result<Self> {
        let (tx, rx) = channel::unbounded::<Job>();
        for i in 0..threads {
            let task_rx = TaskReceiver(rx.clone());
            thread::Builder::new()
                .name(format!("jsondb-worker-{}", i))
                .spawn(move || run_tasks(task_rx))?;
        }
        debug!("created shared queue thread pool with {} threads", threads);
        Ok(SharedQueueThreadPool {
            tx,
            pending: WaitGroup::new(),
        })
    }

    /// Queues a job for the pool's threads.
    ///
    /// A job sent after every worker has died is dropped and logged.
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let done = self.pending.clone();
        let job = Box::new(move || {
            // released on return and on unwind alike
            let _done = done;
            job();
        });
        if self.tx.send(job).is_err() {
            error!("there are no threads left in the pool, dropping job");
        }
    }

    /// Closes the queue and waits for the workers to run everything already in it.
    fn join(self) {
        let SharedQueueThreadPool { tx, pending } = self;
        drop(tx);
        pending.wait();
        debug!("shared queue thread pool drained");
    }
}

/// A type that can receive jobs from a channel and run them.
/// Additionally, this type is responsible for restarting any threads that panicked
#[derive(Clone, Debug)]
struct TaskReceiver(Receiver<Job>);

impl Drop for TaskReceiver {
    fn drop(&mut self) {
        if thread::panicking() {
            debug!("worker panicked, starting a new thread");
            let task_rx = self.clone();
            if let Err(e) = thread::Builder::new().spawn(move || run_tasks(task_rx)) {
                error!("Failed to spawn a thread: {}", e);
            }
        }
    }
}

/// waits for jobs to arrive on the (wrapped) receiver and runs them, until the pool is dropped
#[instrument(skip(rx))]
fn run_tasks(rx: TaskReceiver) {
    while let Ok(job) = rx.0.recv() {
        job();
    }
    debug!("Thread exited because the thread pool was destroyed.");
}
