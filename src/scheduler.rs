use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

use crate::error::ScheduleError;

/// Delivers a fired job to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str) -> Result<(), String>;
}

/// Desktop banner through the platform notification service.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_owned(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), String> {
        notify_rust::Notification::new()
            .summary(title)
            .body(message)
            .appname(&self.app_name)
            .show()
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[derive(Clone)]
struct Job {
    fire_at: DateTime<Utc>,
    title: String,
    message: String,
}

struct Entry {
    job: Job,
    /// Bumped on every schedule so a replaced task cannot remove its successor.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Jobs {
    entries: HashMap<String, Entry>,
    handle: Option<Handle>,
    next_generation: u64,
    next_anonymous: u64,
}

type SharedJobs = Arc<Mutex<Jobs>>;

fn lock(jobs: &Mutex<Jobs>) -> MutexGuard<'_, Jobs> {
    jobs.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One-shot notification jobs, each a tokio task sleeping until its fire
/// time on a runtime owned by the scheduler.
///
/// Jobs may be added before `start`; they are spawned once the runtime runs.
pub struct Scheduler {
    jobs: SharedJobs,
    notifier: Arc<dyn Notifier>,
    runtime: Mutex<Option<Runtime>>,
}

impl Scheduler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(Jobs::default())),
            notifier,
            runtime: Mutex::new(None),
        }
    }

    pub fn start(&self) -> std::io::Result<()> {
        let mut runtime = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        if runtime.is_some() {
            return Ok(());
        }
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("notification-scheduler")
            .enable_time()
            .build()?;

        let mut jobs = lock(&self.jobs);
        let handle = rt.handle().clone();
        let pending: Vec<(String, u64, Job)> = jobs
            .entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.generation, entry.job.clone()))
            .collect();
        for (id, generation, job) in pending {
            let task = handle.spawn(fire_when_due(
                id.clone(),
                generation,
                job,
                Arc::clone(&self.jobs),
                Arc::clone(&self.notifier),
            ));
            if let Some(entry) = jobs.entries.get_mut(&id) {
                entry.task = Some(task);
            }
        }
        jobs.handle = Some(handle);
        drop(jobs);

        *runtime = Some(rt);
        log::info!("Notification scheduler started");
        Ok(())
    }

    /// Aborts every running job task and shuts the runtime down. Pending jobs
    /// are kept and respawned by the next `start`.
    pub fn stop(&self) {
        let Some(rt) = self.runtime.lock().unwrap_or_else(PoisonError::into_inner).take() else {
            return;
        };
        {
            let mut jobs = lock(&self.jobs);
            jobs.handle = None;
            for entry in jobs.entries.values_mut() {
                if let Some(task) = entry.task.take() {
                    task.abort();
                }
            }
        }
        rt.shutdown_background();
        log::info!("Notification scheduler stopped");
    }

    /// Registers a one-shot job and returns its id. A job already pending
    /// under the same id is replaced. Without an id the job gets an internal
    /// key and is effectively fire-and-forget.
    pub fn schedule<Z: TimeZone>(
        &self,
        job_id: Option<&str>,
        fire_at: DateTime<Z>,
        title: &str,
        message: &str,
    ) -> String {
        let job = Job {
            fire_at: fire_at.with_timezone(&Utc),
            title: title.to_owned(),
            message: message.to_owned(),
        };
        let mut jobs = lock(&self.jobs);
        let id = match job_id {
            Some(id) => id.to_owned(),
            None => {
                jobs.next_anonymous += 1;
                format!("adhoc_{}", jobs.next_anonymous)
            }
        };
        jobs.next_generation += 1;
        let generation = jobs.next_generation;

        let task = jobs.handle.as_ref().map(|handle| {
            handle.spawn(fire_when_due(
                id.clone(),
                generation,
                job.clone(),
                Arc::clone(&self.jobs),
                Arc::clone(&self.notifier),
            ))
        });
        let fire_at = job.fire_at;
        let replaced = jobs.entries.insert(id.clone(), Entry { job, generation, task });
        if let Some(task) = replaced.and_then(|old| old.task) {
            task.abort();
            log::debug!("Replaced pending job {}", id);
        }

        log::info!("Scheduled job {} at {}", id, fire_at);
        id
    }

    pub fn try_cancel(&self, job_id: &str) -> Result<(), ScheduleError> {
        let removed = lock(&self.jobs).entries.remove(job_id);
        match removed {
            Some(entry) => {
                if let Some(task) = entry.task {
                    task.abort();
                }
                log::info!("Cancelled job {}", job_id);
                Ok(())
            }
            None => Err(ScheduleError::JobNotFound(job_id.to_owned())),
        }
    }

    /// Like `try_cancel`, but a missing job (already fired, never scheduled)
    /// is only logged.
    pub fn cancel(&self, job_id: &str) {
        if let Err(e) = self.try_cancel(job_id) {
            log::warn!("Error canceling notification: {}", e);
        }
    }

    pub fn is_scheduled(&self, job_id: &str) -> bool {
        lock(&self.jobs).entries.contains_key(job_id)
    }

    pub fn pending_jobs(&self) -> usize {
        lock(&self.jobs).entries.len()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn fire_when_due(
    id: String,
    generation: u64,
    job: Job,
    jobs: SharedJobs,
    notifier: Arc<dyn Notifier>,
) {
    let wait = (job.fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    tokio::time::sleep(wait).await;

    {
        let mut guard = lock(&jobs);
        match guard.entries.get(&id) {
            Some(entry) if entry.generation == generation => {
                guard.entries.remove(&id);
            }
            _ => return,
        }
    }

    log::info!("Firing job {}", id);
    if let Err(e) = notifier.notify(&job.title, &job.message) {
        log::warn!("Notification for job {} was not delivered: {}", id, e);
    }
}

/// Parses `YYYY-MM-DD` and `HH:MM` as a local time in `tz`. Whitespace is
/// only accepted between the two parts. Ambiguous local times resolve to the
/// earlier instant; times skipped by a DST jump are rejected.
pub fn parse_fire_time(date: &str, time: &str, tz: Tz) -> Result<DateTime<Tz>, ScheduleError> {
    let text = format!("{} {}", date, time);
    let time = time.trim_start();
    if date.contains(char::is_whitespace) || time.contains(char::is_whitespace) {
        return Err(ScheduleError::InvalidDateTime(text));
    }
    let naive = NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M")
        .map_err(|_| ScheduleError::InvalidDateTime(text.clone()))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or(ScheduleError::InvalidDateTime(text))
}
