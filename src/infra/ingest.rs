//! Knowledge-base ingestion job control and the background status poller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use dc_base::constants::KB_INGEST_PATH;
use dc_base::types::IngestJob;

use super::api::{post_json, service_client};
use super::error::ApiError;
use super::settings::Settings;

/// How often the poller wakes to check for a stop request
const WATCH_TICK_MS: u64 = 100;

/// Start / check / list operations on ingestion jobs.
pub trait IngestControl: Send + Sync {
    fn start(&self) -> Result<IngestJob, ApiError>;
    fn status(&self, job_id: &str) -> Result<IngestJob, ApiError>;
    /// Most recent job first.
    fn list(&self) -> Result<Vec<IngestJob>, ApiError>;
}

pub struct IngestClient {
    url: String,
    client: Client,
}

impl IngestClient {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        Ok(Self { url: settings.backend_endpoint(KB_INGEST_PATH), client: service_client()? })
    }
}

#[derive(Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<IngestJob>,
}

impl IngestControl for IngestClient {
    fn start(&self) -> Result<IngestJob, ApiError> {
        let value = post_json(&self.client, &self.url, &json!({ "action": "start_ingestion" }))?;
        Ok(serde_json::from_value(value)?)
    }

    fn status(&self, job_id: &str) -> Result<IngestJob, ApiError> {
        let value = post_json(&self.client, &self.url, &json!({ "action": "check_status", "job_id": job_id }))?;
        Ok(serde_json::from_value(value)?)
    }

    fn list(&self) -> Result<Vec<IngestJob>, ApiError> {
        let value = post_json(&self.client, &self.url, &json!({ "action": "list_jobs" }))?;
        Ok(serde_json::from_value::<JobList>(value)?.jobs)
    }
}

/// Message from the poller to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestUpdate {
    Job(IngestJob),
    PollFailed { job_id: String, error: String },
    /// A start or list request failed before any job was known.
    RequestFailed(String),
}

/// Start a new job off the event loop and report it.
pub fn spawn_start(control: Arc<dyn IngestControl>, tx: Sender<IngestUpdate>) {
    thread::spawn(move || {
        let update = match control.start() {
            Ok(job) => {
                tracing::info!(job = %job.job_id, "ingestion started");
                IngestUpdate::Job(job)
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not start ingestion");
                IngestUpdate::RequestFailed(e.to_string())
            }
        };
        let _ = tx.send(update);
    });
}

/// Report the most recent job, if any, so polling can resume.
pub fn spawn_latest(control: Arc<dyn IngestControl>, tx: Sender<IngestUpdate>) {
    thread::spawn(move || match control.list() {
        Ok(jobs) => {
            if let Some(job) = jobs.into_iter().next() {
                let _ = tx.send(IngestUpdate::Job(job));
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "could not list ingestion jobs");
        }
    });
}

/// Background thread polling one job until it reaches a terminal status.
pub struct JobWatcher {
    job_id: String,
    stop: Arc<AtomicBool>,
    _thread: JoinHandle<()>,
}

impl JobWatcher {
    pub fn spawn(
        control: Arc<dyn IngestControl>,
        job_id: String,
        interval: Duration,
        tx: Sender<IngestUpdate>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let id = job_id.clone();
        let thread = thread::spawn(move || poll_loop(control.as_ref(), &id, interval, &stop_flag, &tx));
        Self { job_id, stop, _thread: thread }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for JobWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(
    control: &dyn IngestControl,
    job_id: &str,
    interval: Duration,
    stop: &AtomicBool,
    tx: &Sender<IngestUpdate>,
) {
    loop {
        if !sleep_unless_stopped(interval, stop) {
            return;
        }
        match control.status(job_id) {
            Ok(job) => {
                let terminal = job.status.is_terminal();
                tracing::debug!(job = %job_id, status = job.status.label(), "ingestion poll");
                if tx.send(IngestUpdate::Job(job)).is_err() || terminal {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(job = %job_id, error = %e, "ingestion poll failed");
                let update = IngestUpdate::PollFailed { job_id: job_id.to_string(), error: e.to_string() };
                if tx.send(update).is_err() {
                    return;
                }
            }
        }
    }
}

/// Returns false if a stop was requested while sleeping.
fn sleep_unless_stopped(interval: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(Duration::from_millis(WATCH_TICK_MS)));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::mpsc;

    use dc_base::types::{JobStatistics, JobStatus};

    use super::*;

    struct ScriptedJobs {
        statuses: Mutex<Vec<Result<JobStatus, String>>>,
    }

    fn job(status: JobStatus) -> IngestJob {
        IngestJob {
            job_id: "job-1".into(),
            status,
            started_at: None,
            updated_at: None,
            statistics: JobStatistics::default(),
            error: None,
        }
    }

    impl IngestControl for ScriptedJobs {
        fn start(&self) -> Result<IngestJob, ApiError> {
            Ok(job(JobStatus::Starting))
        }
        fn status(&self, _job_id: &str) -> Result<IngestJob, ApiError> {
            let next = self.statuses.lock().unwrap().remove(0);
            next.map(job).map_err(ApiError::Network)
        }
        fn list(&self) -> Result<Vec<IngestJob>, ApiError> {
            Ok(vec![job(JobStatus::InProgress), job(JobStatus::Complete)])
        }
    }

    #[test]
    fn latest_job_is_the_first_listed() {
        let control = Arc::new(ScriptedJobs { statuses: Mutex::new(vec![]) });
        let (tx, rx) = mpsc::channel();
        spawn_latest(control, tx);
        let updates: Vec<IngestUpdate> = rx.iter().collect();
        assert_eq!(updates, vec![IngestUpdate::Job(job(JobStatus::InProgress))]);
    }

    #[test]
    fn start_reports_the_new_job() {
        let control = Arc::new(ScriptedJobs { statuses: Mutex::new(vec![]) });
        let (tx, rx) = mpsc::channel();
        spawn_start(control, tx);
        assert!(matches!(rx.recv_timeout(Duration::from_secs(5)), Ok(IngestUpdate::Job(j)) if j.status == JobStatus::Starting));
    }

    #[test]
    fn polls_until_terminal_status() {
        let control = Arc::new(ScriptedJobs {
            statuses: Mutex::new(vec![
                Ok(JobStatus::InProgress),
                Err("timeout".into()),
                Ok(JobStatus::Complete),
                Ok(JobStatus::InProgress),
            ]),
        });
        let (tx, rx) = mpsc::channel();
        let watcher = JobWatcher::spawn(control, "job-1".into(), Duration::from_millis(5), tx);
        assert_eq!(watcher.job_id(), "job-1");

        let updates: Vec<IngestUpdate> = rx.iter().collect();
        assert_eq!(updates.len(), 3);
        assert!(matches!(&updates[0], IngestUpdate::Job(j) if j.status == JobStatus::InProgress));
        assert!(matches!(&updates[1], IngestUpdate::PollFailed { error, .. } if error.contains("timeout")));
        assert!(matches!(&updates[2], IngestUpdate::Job(j) if j.status == JobStatus::Complete));
    }

    #[test]
    fn stop_ends_the_thread_without_polling() {
        let control = Arc::new(ScriptedJobs { statuses: Mutex::new(vec![]) });
        let (tx, rx) = mpsc::channel();
        let watcher = JobWatcher::spawn(control, "job-1".into(), Duration::from_secs(60), tx);
        watcher.stop();
        drop(watcher);
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_err());
    }
}
