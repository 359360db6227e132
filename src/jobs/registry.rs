/*!
 * In-memory job registry.
 *
 * The map is private to the orchestrator; callers only ever see clones of
 * job records. Each entry owns the cancellation token of its job.
 */

use chrono::Utc;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::models::{JobId, JobStatus, ProcessingJob};

/// Counts per status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    /// Jobs waiting for a worker
    pub queue_depth: usize,
}

#[derive(Debug)]
struct JobEntry {
    job: ProcessingJob,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
pub(crate) struct JobRegistry {
    jobs: Mutex<HashMap<JobId, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless `capacity` jobs are already Pending. Cancelled jobs are
    /// Failed and no longer count.
    pub fn insert_if_room(&self, job: ProcessingJob, cancel: CancellationToken, capacity: usize) -> bool {
        let mut jobs = self.jobs.lock();
        let pending = jobs.values().filter(|entry| entry.job.status == JobStatus::Pending).count();
        if pending >= capacity {
            return false;
        }
        jobs.insert(job.id, JobEntry { job, cancel });
        true
    }

    pub fn remove(&self, id: &JobId) -> Option<ProcessingJob> {
        self.jobs.lock().remove(id).map(|entry| entry.job)
    }

    pub fn get(&self, id: &JobId) -> Option<ProcessingJob> {
        self.jobs.lock().get(id).map(|entry| entry.job.clone())
    }

    pub fn token(&self, id: &JobId) -> Option<CancellationToken> {
        self.jobs.lock().get(id).map(|entry| entry.cancel.clone())
    }

    /// Apply a transition; `None` when the job is unknown
    pub fn update<F>(&self, id: &JobId, transition: F) -> Option<bool>
    where
        F: FnOnce(&mut ProcessingJob) -> bool,
    {
        self.jobs.lock().get_mut(id).map(|entry| transition(&mut entry.job))
    }

    /// Fail a non-terminal job and trip its token
    pub fn fail_and_cancel(&self, id: &JobId, message: &str) -> bool {
        let mut jobs = self.jobs.lock();
        match jobs.get_mut(id) {
            Some(entry) => {
                if entry.job.fail(message, false) {
                    entry.cancel.cancel();
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// All jobs ordered by creation time
    pub fn list(&self) -> Vec<ProcessingJob> {
        let mut jobs: Vec<ProcessingJob> = self.jobs.lock().values().map(|entry| entry.job.clone()).collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }

    pub fn stats(&self) -> JobStats {
        let jobs = self.jobs.lock();
        let mut stats = JobStats {
            total: jobs.len(),
            ..JobStats::default()
        };
        for entry in jobs.values() {
            match entry.job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats.queue_depth = stats.pending;
        stats
    }

    /// Drop terminal jobs last updated at least `retention` ago
    pub fn evict_expired(&self, retention: Duration) -> usize {
        let retention = chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::days(36_500));
        let now = Utc::now();
        let mut jobs = self.jobs.lock();
        let before = jobs.len();
        jobs.retain(|_, entry| !(entry.job.is_terminal() && now - entry.job.updated_at >= retention));
        let evicted = before - jobs.len();
        if evicted > 0 {
            debug!("Evicted {} expired job(s)", evicted);
        }
        evicted
    }

    /// Fail every non-terminal job with `message` and return the final snapshot
    pub fn fail_all_active(&self, message: &str) -> Vec<ProcessingJob> {
        let mut jobs = self.jobs.lock();
        for entry in jobs.values_mut() {
            if entry.job.fail(message, false) {
                entry.cancel.cancel();
            }
        }
        let mut snapshot: Vec<ProcessingJob> = jobs.values().map(|entry| entry.job.clone()).collect();
        snapshot.sort_by_key(|job| job.created_at);
        snapshot
    }

    pub fn clear(&self) {
        self.jobs.lock().clear();
    }
}
