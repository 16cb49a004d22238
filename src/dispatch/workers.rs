//! Fixed-size worker pool running asynchronous calls.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::common::error::{CoreError, CoreResult};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct Pool {
    tx: Option<Sender<Job>>,
    rx: Receiver<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl Pool {
    pub fn new(size: usize, name: &str) -> CoreResult<Self> {
        let (tx, rx) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(size);

        for idx in 0..size.max(1) {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("{name}-{idx}"))
                .spawn(move || {
                    for job in rx.iter() {
                        run_job(job);
                    }
                })
                .map_err(|err| CoreError::internal(format!("spawning worker: {err}")))?;
            workers.push(handle);
        }

        Ok(Self {
            tx: Some(tx),
            rx,
            workers,
        })
    }

    /// Queue a job. The job is handed back when the pool no longer accepts work.
    pub fn submit(&self, job: Job) -> Result<(), Job> {
        match &self.tx {
            Some(tx) => tx.send(job).map_err(|err| err.into_inner()),
            None => Err(job),
        }
    }

    /// Run every job still waiting in the queue on the calling thread.
    ///
    /// Used when the owner shuts down from inside one of its own jobs, where
    /// the queue may otherwise wait on the very worker that is shutting down.
    pub fn run_queued(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            run_job(job);
            ran += 1;
        }
        ran
    }

    /// Close the queue and join every worker except the calling thread.
    ///
    /// Queued jobs still run before their worker exits.
    pub fn shutdown(&mut self) {
        self.tx.take();
        let me = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() == me {
                // Shutdown requested from inside one of our own jobs; that worker
                // exits by itself once the queue is drained.
                continue;
            }
            if handle.join().is_err() {
                log::error!(target: "bridge_core::dispatch", "worker exited by panic");
            }
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

fn run_job(job: Job) {
    // Jobs guard themselves; this keeps the worker alive if one slips through.
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        log::error!(target: "bridge_core::dispatch", "worker job panicked");
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
