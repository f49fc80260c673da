//! Recovery cleanup scheduling.
//!
//! One scheduler is shared per index provider and handed to every accessor,
//! so post-crash cleanup of files that were never cleanly shut down is
//! collected in one place and run when the caller decides, rather than
//! inline on every open.

use parking_lot::Mutex;

type Work = Box<dyn FnOnce() + Send + 'static>;

struct CleanupJob {
    label: String,
    work: Work,
}

/// Collects cleanup jobs for deferred execution.
#[derive(Default)]
pub struct CleanupScheduler {
    jobs: Mutex<Vec<CleanupJob>>,
}

impl CleanupScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job. `label` names what is being cleaned, for logging.
    pub fn schedule(&self, label: impl Into<String>, work: impl FnOnce() + Send + 'static) {
        let label = label.into();
        tracing::debug!(job = %label, "cleanup job scheduled");
        self.jobs.lock().push(CleanupJob {
            label,
            work: Box::new(work),
        });
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Drain and run every queued job in scheduling order.
    pub fn run_all(&self) {
        let jobs = std::mem::take(&mut *self.jobs.lock());
        for job in jobs {
            tracing::debug!(job = %job.label, "running cleanup job");
            (job.work)();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn run_all_drains_in_order() {
        let scheduler = CleanupScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            scheduler.schedule("job", move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(scheduler.pending(), 3);
        scheduler.run_all();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.pending(), 0);
    }
}
