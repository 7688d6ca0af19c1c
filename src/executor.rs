//! Named worker pools (§5): `service`, `keep_alive`, `upgrade`, `encoder`,
//! `closer`, each a `threadpool::ThreadPool` with a prefixed thread name for
//! observability, mirroring the teacher's per-worker thread spawning in
//! `worker.rs`. Promoted from a dev-dependency to a runtime one here (see
//! DESIGN.md) because the executor substrate needs it unconditionally.

use threadpool::ThreadPool;

/// The fixed set of pools a server owns for its whole lifetime (§5 table).
pub struct Executor {
    pub service: ThreadPool,
    pub keep_alive: ThreadPool,
    pub upgrade: ThreadPool,
    pub encoder: ThreadPool,
    pub closer: ThreadPool,
}

impl Executor {
    /// `pool_size` is the `service` pool's core size; the dynamic pools
    /// scale to `pool_size * factor` (§5).
    pub fn new(pool_size: usize, factor: usize) -> Self {
        Executor {
            service: ThreadPool::with_name("webhatch-service".to_string(), pool_size),
            keep_alive: ThreadPool::with_name("webhatch-keep-alive".to_string(), pool_size * factor),
            upgrade: ThreadPool::with_name("webhatch-upgrade".to_string(), pool_size * factor),
            encoder: ThreadPool::with_name("webhatch-encoder".to_string(), pool_size * factor),
            closer: ThreadPool::with_name("webhatch-closer".to_string(), pool_size),
        }
    }

    /// Submits `task` to the `service` pool, applying the rejection policy
    /// (§4.5.2): if the pool's queue is already at `queue_size`, `task` is
    /// not submitted and the caller is told to run the rejection handler
    /// itself (synthesizing `503 Service Unavailable`).
    pub fn try_submit_service(&self, queue_size: usize, task: impl FnOnce() + Send + 'static) -> bool {
        if self.service.queued_count() >= queue_size {
            return false;
        }
        self.service.execute(task);
        true
    }

    /// Peeks the `service` pool's queue depth so a caller holding a resource
    /// it can't hand into the task closure (e.g. a socket it must answer
    /// itself on rejection) can decide before committing to either path.
    pub fn service_queue_depth(&self) -> usize {
        self.service.queued_count()
    }

    pub fn submit_keep_alive(&self, task: impl FnOnce() + Send + 'static) {
        self.keep_alive.execute(task);
    }

    pub fn submit_upgrade(&self, task: impl FnOnce() + Send + 'static) {
        self.upgrade.execute(task);
    }

    pub fn submit_encoder(&self, task: impl FnOnce() + Send + 'static) {
        self.encoder.execute(task);
    }

    pub fn submit_closer(&self, task: impl FnOnce() + Send + 'static) {
        self.closer.execute(task);
    }

    /// Blocks until every queued and in-flight task across all pools
    /// completes (used by `Server::join`/shutdown).
    pub fn join_all(&self) {
        self.service.join();
        self.keep_alive.join();
        self.upgrade.join();
        self.encoder.join();
        self.closer.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn rejection_policy_honors_queue_size() {
        let executor = Executor::new(1, 1);
        let counter = Arc::new(AtomicUsize::new(0));

        // queue_size 0 means nothing beyond the single running task may queue
        let blocker_counter = counter.clone();
        executor.service.execute(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            blocker_counter.fetch_add(1, Ordering::SeqCst);
        });

        // give the blocking task a moment to start occupying the only thread
        std::thread::sleep(std::time::Duration::from_millis(10));
        let accepted = executor.try_submit_service(0, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!accepted);

        executor.service.join();
    }
}
