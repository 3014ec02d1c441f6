//! File-backed job store.
//!
//! The whole collection lives in one JSON file. Every operation reads the
//! file fresh, and every mutation rewrites it in full. A missing or corrupt
//! file reads as an empty collection.
//!
//! The mutation rules are plain functions over `Vec<JobRecord>` so they can
//! be exercised without a file or a clock; `JobStore` wraps each one in a
//! locked load → mutate → save cycle.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::model::{AddOutcome, ApplyOutcome, JobFilter, JobRecord, NewJob};
use crate::error::StoreError;

/// Next id to assign: one past the current maximum, or 1 when empty.
///
/// Deleting the highest id and adding again hands that id out a second
/// time; ids below a surviving maximum are never reused. `None` once the
/// maximum is `u64::MAX`.
pub fn next_id(jobs: &[JobRecord]) -> Option<u64> {
    match jobs.iter().map(|j| j.id).max() {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}

/// Order-preserving view of the records matching `predicate`.
pub fn filter<'a, P>(
    jobs: &'a [JobRecord],
    predicate: P,
) -> impl Iterator<Item = &'a JobRecord> + 'a
where
    P: Fn(&JobRecord) -> bool + 'a,
{
    jobs.iter().filter(move |j| predicate(*j))
}

/// Validate `new` and append it with a fresh id.
pub fn add_job(
    jobs: &mut Vec<JobRecord>,
    new: &NewJob,
    now: NaiveDateTime,
) -> Result<AddOutcome, StoreError> {
    let new = match new.normalize() {
        Ok(n) => n,
        Err(e) => return Ok(AddOutcome::Invalid(e)),
    };

    let id = next_id(jobs).ok_or(StoreError::IdsExhausted)?;
    let mut job = JobRecord::new(id, new.title, new.company, now);
    job.link = new.link;
    job.notes = new.notes;
    jobs.push(job.clone());
    Ok(AddOutcome::Created(job))
}

/// Mark the record with `id` as applied on `today`.
pub fn mark_applied(jobs: &mut [JobRecord], id: u64, today: NaiveDate) -> ApplyOutcome {
    match jobs.iter_mut().find(|j| j.id == id) {
        Some(job) => {
            if job.mark_applied(today) {
                ApplyOutcome::Applied(job.clone())
            } else {
                ApplyOutcome::AlreadyApplied(job.clone())
            }
        }
        None => ApplyOutcome::NotFound,
    }
}

/// Describe every record that breaks the collection rules: duplicate ids,
/// and `date_applied` not matching `applied`.
pub fn integrity_problems(jobs: &[JobRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut problems = Vec::new();
    for job in jobs {
        if !seen.insert(job.id) {
            problems.push(format!("duplicate id {}", job.id));
        }
        match (job.applied, job.date_applied) {
            (true, None) => problems.push(format!("job {} is applied without a date", job.id)),
            (false, Some(_)) => {
                problems.push(format!("job {} has a date but is not applied", job.id))
            }
            _ => {}
        }
    }
    problems
}

/// Remove the record with `id`. Returns whether one was removed.
pub fn remove_job(jobs: &mut Vec<JobRecord>, id: u64) -> bool {
    let before = jobs.len();
    jobs.retain(|j| j.id != id);
    jobs.len() != before
}

/// The job collection persisted as a single JSON file.
///
/// Each read-modify-write cycle holds an internal lock, so concurrent HTTP
/// requests sharing one `JobStore` cannot lose updates. Separate processes
/// writing the same file are not coordinated.
pub struct JobStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JobStore {
    /// Create a store backed by `path`. Nothing is read until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full collection. Missing or unparseable files yield an empty
    /// collection; only genuine read failures are errors.
    pub async fn load(&self) -> Result<Vec<JobRecord>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No job file yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Job file is not UTF-8, starting empty"
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        match serde_json::from_str::<Vec<JobRecord>>(&raw) {
            Ok(jobs) => {
                for problem in integrity_problems(&jobs) {
                    warn!(path = %self.path.display(), %problem, "Job file is inconsistent");
                }
                debug!(path = %self.path.display(), count = jobs.len(), "Jobs loaded");
                Ok(jobs)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Job file is corrupt, starting empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Overwrite the file with `jobs` as indented JSON.
    pub async fn save(&self, jobs: &[JobRecord]) -> Result<(), StoreError> {
        let mut json = serde_json::to_string_pretty(jobs)?;
        json.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        fs::write(&self.path, json)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        debug!(path = %self.path.display(), count = jobs.len(), "Jobs saved");
        Ok(())
    }

    /// List jobs in insertion order.
    pub async fn list(&self, which: JobFilter) -> Result<Vec<JobRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let jobs = self.load().await?;
        Ok(filter(&jobs, move |j| which.matches(j)).cloned().collect())
    }

    pub async fn get(&self, id: u64) -> Result<Option<JobRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let jobs = self.load().await?;
        Ok(jobs.into_iter().find(|j| j.id == id))
    }

    /// Add a job stamped with the current local time.
    pub async fn add(&self, new: &NewJob) -> Result<AddOutcome, StoreError> {
        self.add_at(new, Local::now().naive_local()).await
    }

    /// Add a job stamped with `now`.
    pub async fn add_at(
        &self,
        new: &NewJob,
        now: NaiveDateTime,
    ) -> Result<AddOutcome, StoreError> {
        let _guard = self.lock.lock().await;
        let mut jobs = self.load().await?;

        let outcome = add_job(&mut jobs, new, now)?;
        match &outcome {
            AddOutcome::Created(job) => {
                self.save(&jobs).await?;
                info!(id = job.id, title = %job.title, company = %job.company, "Job added");
            }
            AddOutcome::Invalid(e) => {
                warn!(error = %e, "Job rejected");
            }
        }
        Ok(outcome)
    }

    /// Mark a job as applied today (local date).
    pub async fn mark_applied(&self, id: u64) -> Result<ApplyOutcome, StoreError> {
        self.mark_applied_on(id, Local::now().date_naive()).await
    }

    /// Mark a job as applied on `date`.
    pub async fn mark_applied_on(
        &self,
        id: u64,
        date: NaiveDate,
    ) -> Result<ApplyOutcome, StoreError> {
        let _guard = self.lock.lock().await;
        let mut jobs = self.load().await?;

        let outcome = mark_applied(&mut jobs, id, date);
        match &outcome {
            ApplyOutcome::Applied(job) => {
                self.save(&jobs).await?;
                info!(id, date = %date, title = %job.title, "Job marked as applied");
            }
            ApplyOutcome::AlreadyApplied(_) => debug!(id, "Job already applied"),
            ApplyOutcome::NotFound => debug!(id, "Apply: no job with this id"),
        }
        Ok(outcome)
    }

    /// Delete a job. Unknown ids are a no-op; the file is rewritten either way.
    pub async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut jobs = self.load().await?;

        let removed = remove_job(&mut jobs, id);
        self.save(&jobs).await?;
        if removed {
            info!(id, "Job deleted");
        } else {
            debug!(id, "Delete: no job with this id");
        }
        Ok(removed)
    }
}
