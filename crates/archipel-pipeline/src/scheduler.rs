//! Priority-ordered job scheduler with an elastic worker pool.
//!
//! The scheduler is owned by a single driver that calls [`JobScheduler::tick`]
//! once per cycle. All queue and pool state lives behind `&mut self`; workers
//! talk back only through the ready channel, so no lock is needed.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};
use rustc_hash::FxHashMap;

use crate::worker::{WorkerExecutor, WorkerHandle, WorkerId};
use crate::{Job, JobError, JobState};

/// Default pool size: leave two cores for the driver and renderer.
pub fn default_worker_count() -> usize {
    let cpus = num_cpus::get().max(2);
    (cpus - 2).max(1)
}

/// Snapshot of scheduler counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub pending: usize,
    pub workers: usize,
    pub idle: usize,
    pub dispatched: u64,
    pub retired: u64,
}

pub struct JobScheduler {
    pending: VecDeque<Weak<Job>>,
    idle: VecDeque<WorkerId>,
    workers: FxHashMap<WorkerId, WorkerHandle>,
    retired: Vec<JoinHandle<()>>,
    ready_tx: Sender<WorkerId>,
    ready_rx: Receiver<WorkerId>,
    max_workers: usize,
    next_worker_id: WorkerId,
    next_dispatch_seq: u64,
    retired_total: u64,
    shut_down: bool,
}

impl JobScheduler {
    /// Create a scheduler. `max_workers == 0` uses [`default_worker_count`].
    pub fn new(max_workers: usize) -> Self {
        let max_workers = if max_workers == 0 {
            default_worker_count()
        } else {
            max_workers
        };
        let (ready_tx, ready_rx) = unbounded();
        Self {
            pending: VecDeque::new(),
            idle: VecDeque::new(),
            workers: FxHashMap::default(),
            retired: Vec::new(),
            ready_tx,
            ready_rx,
            max_workers,
            next_worker_id: 0,
            next_dispatch_seq: 0,
            retired_total: 0,
            shut_down: false,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn set_max_workers(&mut self, max_workers: usize) {
        self.max_workers = max_workers.max(1);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Queue a job at the back of the pending queue.
    ///
    /// # Errors
    ///
    /// Jobs with an invalid descriptor are logged and dropped. After
    /// [`shutdown`](Self::shutdown) every submission is refused.
    pub fn submit(&mut self, job: &Arc<Job>) -> Result<(), JobError> {
        if self.shut_down {
            return Err(JobError::SchedulerShutDown);
        }
        if let Err(e) = job.validate() {
            tracing::warn!("Dropping job: {e}");
            return Err(e);
        }
        self.pending.push_back(Arc::downgrade(job));
        Ok(())
    }

    /// One scheduling cycle. Never blocks.
    pub fn tick(&mut self) {
        if self.shut_down {
            return;
        }
        self.reap_retired();

        while let Ok(id) = self.ready_rx.try_recv() {
            if self.workers.contains_key(&id) {
                self.idle.push_back(id);
            }
        }

        // Dropped jobs must not count toward worker growth.
        self.pending.retain(|weak| weak.strong_count() > 0);
        if self.pending.is_empty() {
            self.retire_idle();
            return;
        }

        let pending = self.pending.len();
        if self.workers.len() < self.max_workers && pending > self.idle.len() {
            let wanted = (self.max_workers - self.workers.len()).min(pending - self.idle.len());
            for _ in 0..wanted {
                if let Err(e) = self.spawn_worker() {
                    tracing::error!("{e}");
                    break;
                }
            }
        }

        self.dispatch();
    }

    /// Re-sort pending jobs by their current priority. Ties keep queue order.
    pub fn reprioritize(&mut self) {
        let mut live: Vec<(f32, Arc<Job>)> = self
            .pending
            .drain(..)
            .filter_map(|weak| weak.upgrade())
            .filter(|job| job.state() == JobState::Pending)
            .map(|job| (job.priority(), job))
            .collect();
        live.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.pending = live.iter().map(|(_, job)| Arc::downgrade(job)).collect();
    }

    /// Refuse further work, let in-flight jobs finish, and join every worker.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.pending.clear();
        self.idle.clear();

        let mut threads: Vec<JoinHandle<()>> = self.retired.drain(..).collect();
        threads.extend(self.workers.drain().map(|(_, handle)| handle.stop()));
        let count = threads.len();
        for thread in threads {
            if thread.join().is_err() {
                tracing::error!("Terrain worker panicked during shutdown");
            }
        }
        tracing::info!("Job scheduler shut down, joined {count} workers");
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            pending: self.pending.len(),
            workers: self.workers.len(),
            idle: self.idle.len(),
            dispatched: self.next_dispatch_seq,
            retired: self.retired_total,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn spawn_worker(&mut self) -> Result<(), JobError> {
        let id = self.next_worker_id;
        let handle = WorkerExecutor::spawn(id, self.ready_tx.clone())?;
        self.next_worker_id += 1;
        self.workers.insert(id, handle);
        self.idle.push_back(id);
        Ok(())
    }

    /// Hand jobs from the front of the queue to idle workers in idle order.
    fn dispatch(&mut self) {
        while !self.idle.is_empty() {
            let Some(weak) = self.pending.pop_front() else {
                break;
            };
            let Some(job) = weak.upgrade() else {
                continue;
            };
            if !job.claim(self.next_dispatch_seq) {
                continue;
            }
            self.next_dispatch_seq += 1;

            let Some(id) = self.idle.pop_front() else {
                job.abandon();
                break;
            };
            let assigned = match self.workers.get(&id) {
                Some(worker) => worker.assign(job),
                None => Err(job),
            };
            if let Err(job) = assigned {
                tracing::error!("Terrain worker {id} is gone, abandoning job");
                if let Some(handle) = self.workers.remove(&id) {
                    self.retired.push(handle.stop());
                }
                job.abandon();
            }
        }
    }

    fn retire_idle(&mut self) {
        while let Some(id) = self.idle.pop_front() {
            if let Some(handle) = self.workers.remove(&id) {
                self.retired.push(handle.stop());
                self.retired_total += 1;
                tracing::debug!("Retired idle terrain worker {id}");
            }
        }
    }

    fn reap_retired(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) =
            self.retired.drain(..).partition(|thread| thread.is_finished());
        self.retired = running;
        for thread in finished {
            if thread.join().is_err() {
                tracing::error!("Retired terrain worker panicked");
            }
        }
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
