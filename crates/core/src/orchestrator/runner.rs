//! Publish orchestrator implementation.
//!
//! Drives publish jobs through the per-channel state machine:
//! - Validation: synchronous against the channel registry, all-or-nothing
//! - Launch: immediate or deferred to a scheduled instant
//! - Upload: one independent task per target channel, staggered by index

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::audit::{AuditEvent, AuditHandle};
use crate::channel::{Channel, ChannelRegistry};
use crate::metrics;
use crate::publish::{
    PublishJob, PublishRequest, PublishStatus, ScheduleMode, ValidationError,
};
use crate::transport::{PublishTransport, TransportError, UploadRequest};

use super::config::OrchestratorConfig;
use super::types::{OrchestratorError, OrchestratorStatus};

/// An in-flight job and its cancellation channel.
struct JobHandle {
    job: Arc<RwLock<PublishJob>>,
    cancel_tx: broadcast::Sender<()>,
}

/// The publish orchestrator - fans one asset out to a set of channels.
///
/// Jobs are held in memory only; there is no durable job ledger. A job
/// leaves the map when the user resets it or when a scheduled job is
/// cancelled before launch.
pub struct PublishOrchestrator {
    config: OrchestratorConfig,
    registry: Arc<dyn ChannelRegistry>,
    transport: Arc<dyn PublishTransport>,
    audit: Option<AuditHandle>,

    // Runtime state
    running: Arc<AtomicBool>,
    jobs: Arc<RwLock<HashMap<String, JobHandle>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl PublishOrchestrator {
    /// Create a new orchestrator. It accepts jobs immediately; there is no
    /// polling loop to start, each job drives its own tasks.
    pub fn new(
        config: OrchestratorConfig,
        registry: Arc<dyn ChannelRegistry>,
        transport: Arc<dyn PublishTransport>,
        audit: Option<AuditHandle>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            registry,
            transport,
            audit,
            running: Arc::new(AtomicBool::new(true)),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            shutdown_tx,
        }
    }

    /// Submit a publish request.
    ///
    /// The request is validated against the channel registry before any
    /// state is created; a rejected request leaves no trace. On success the
    /// job id is returned and the job runs in the background.
    pub async fn submit(&self, request: PublishRequest) -> Result<String, OrchestratorError> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(OrchestratorError::ShuttingDown);
        }

        let targets = match self.validate(&request) {
            Ok(targets) => targets,
            Err(e) => {
                metrics::JOBS_REJECTED.inc();
                return Err(e);
            }
        };

        let job_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let schedule_label = match request.schedule {
            ScheduleMode::Now => "now",
            ScheduleMode::Later { .. } => "later",
        };

        let job = PublishJob {
            id: job_id.clone(),
            asset: request.asset.clone(),
            title: request.title.clone(),
            caption: request.caption.clone(),
            schedule: request.schedule,
            requested_by: request.requested_by.clone(),
            per_channel: targets
                .iter()
                .map(|c| (c.id.clone(), PublishStatus::Ready))
                .collect(),
            created_at: now,
            launched_at: None,
            completed_at: None,
        };

        let job = Arc::new(RwLock::new(job));
        let (cancel_tx, _) = broadcast::channel(1);
        self.jobs.write().await.insert(
            job_id.clone(),
            JobHandle {
                job: Arc::clone(&job),
                cancel_tx: cancel_tx.clone(),
            },
        );

        metrics::JOBS_SUBMITTED
            .with_label_values(&[schedule_label])
            .inc();

        if let Some(ref audit) = self.audit {
            audit
                .emit(AuditEvent::JobSubmitted {
                    job_id: job_id.clone(),
                    requested_by: request.requested_by.clone(),
                    asset_name: request.asset.file_name.clone(),
                    channel_count: targets.len(),
                    schedule: schedule_label.to_string(),
                })
                .await;

            if let ScheduleMode::Later { scheduled_for } = request.schedule {
                audit
                    .emit(AuditEvent::JobScheduled {
                        job_id: job_id.clone(),
                        scheduled_for,
                        delay_secs: (scheduled_for - now).num_seconds(),
                    })
                    .await;
            }
        }

        info!(
            "Job {} submitted by {} ({} targets, schedule: {})",
            job_id,
            request.requested_by,
            targets.len(),
            schedule_label
        );

        self.spawn_supervisor(job, cancel_tx, targets);

        Ok(job_id)
    }

    /// Cancel a job. In-flight channels are failed with a retryable
    /// "cancelled" error; a scheduled job that has not launched yet is
    /// dropped entirely, its targets untouched. Returns the number of
    /// channels that were still in flight.
    pub async fn cancel(
        &self,
        job_id: &str,
        cancelled_by: &str,
    ) -> Result<usize, OrchestratorError> {
        let (cancel_tx, in_flight) = {
            let jobs = self.jobs.read().await;
            let handle = jobs
                .get(job_id)
                .ok_or_else(|| OrchestratorError::JobNotFound(job_id.to_string()))?;
            let job = handle.job.read().await;
            if job.is_complete() {
                return Err(OrchestratorError::InvalidState {
                    expected: "scheduled or publishing".to_string(),
                    actual: "complete".to_string(),
                });
            }
            let in_flight = job
                .per_channel
                .values()
                .filter(|s| !s.is_terminal())
                .count();
            (handle.cancel_tx.clone(), in_flight)
        };

        // Receiver count can be zero if the supervisor has not subscribed
        // yet; the send error is not actionable either way.
        let _ = cancel_tx.send(());

        metrics::JOBS_CANCELLED.inc();

        if let Some(ref audit) = self.audit {
            audit
                .emit(AuditEvent::JobCancelled {
                    job_id: job_id.to_string(),
                    cancelled_by: cancelled_by.to_string(),
                    channels_cancelled: in_flight,
                })
                .await;
        }

        info!(
            "Job {} cancelled by {} ({} channels in flight)",
            job_id, cancelled_by, in_flight
        );

        Ok(in_flight)
    }

    /// Discard a completed job. After reset, `channel_status` for every
    /// previously-targeted channel reads `Ready` again. Resetting a job
    /// that is still scheduled or publishing is an error; reset never
    /// aborts an upload.
    pub async fn reset(&self, job_id: &str, reset_by: &str) -> Result<(), OrchestratorError> {
        let channels_reset = {
            let mut jobs = self.jobs.write().await;
            let handle = jobs
                .get(job_id)
                .ok_or_else(|| OrchestratorError::JobNotFound(job_id.to_string()))?;
            {
                let job = handle.job.read().await;
                if !job.is_complete() {
                    let actual = if job.launched_at.is_some() {
                        "publishing"
                    } else {
                        "scheduled"
                    };
                    return Err(OrchestratorError::InvalidState {
                        expected: "complete".to_string(),
                        actual: actual.to_string(),
                    });
                }
            }
            let channels = handle.job.read().await.per_channel.len();
            jobs.remove(job_id);
            channels
        };

        if let Some(ref audit) = self.audit {
            audit
                .emit(AuditEvent::JobReset {
                    job_id: job_id.to_string(),
                    reset_by: reset_by.to_string(),
                    channels_reset,
                })
                .await;
        }

        info!(
            "Job {} reset by {} ({} channels back to ready)",
            job_id, reset_by, channels_reset
        );

        Ok(())
    }

    /// Snapshot of one job, if it exists.
    pub async fn job(&self, job_id: &str) -> Option<PublishJob> {
        let jobs = self.jobs.read().await;
        match jobs.get(job_id) {
            Some(handle) => Some(handle.job.read().await.clone()),
            None => None,
        }
    }

    /// Snapshots of all jobs, newest first.
    pub async fn jobs(&self) -> Vec<PublishJob> {
        let jobs = self.jobs.read().await;
        let mut out = Vec::with_capacity(jobs.len());
        for handle in jobs.values() {
            out.push(handle.job.read().await.clone());
        }
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// True while any channel of any job is uploading. This is the gating
    /// flag clients use to disable a second submission.
    pub async fn is_publishing(&self) -> bool {
        let jobs = self.jobs.read().await;
        for handle in jobs.values() {
            let job = handle.job.read().await;
            if job
                .per_channel
                .values()
                .any(|s| matches!(s, PublishStatus::Uploading { .. }))
            {
                return true;
            }
        }
        false
    }

    /// Publish status of a channel as seen by the most recent job that
    /// targets it. Channels not targeted by any live job are `Ready`.
    pub async fn channel_status(&self, channel_id: &str) -> PublishStatus {
        let jobs = self.jobs.read().await;
        let mut latest: Option<(chrono::DateTime<Utc>, PublishStatus)> = None;
        for handle in jobs.values() {
            let job = handle.job.read().await;
            if let Some(status) = job.per_channel.get(channel_id) {
                let newer = latest
                    .as_ref()
                    .map(|(t, _)| job.created_at > *t)
                    .unwrap_or(true);
                if newer {
                    latest = Some((job.created_at, status.clone()));
                }
            }
        }
        latest.map(|(_, s)| s).unwrap_or(PublishStatus::Ready)
    }

    /// Get current orchestrator status.
    pub async fn status(&self) -> OrchestratorStatus {
        let jobs = self.jobs.read().await;
        let mut active_jobs = 0;
        let mut scheduled_jobs = 0;
        let mut completed_jobs = 0;
        let mut uploading_channels = 0;

        for handle in jobs.values() {
            let job = handle.job.read().await;
            uploading_channels += job
                .per_channel
                .values()
                .filter(|s| matches!(s, PublishStatus::Uploading { .. }))
                .count();
            if job.is_complete() {
                completed_jobs += 1;
            } else if job.launched_at.is_some() {
                active_jobs += 1;
            } else {
                scheduled_jobs += 1;
            }
        }

        OrchestratorStatus {
            running: self.running.load(Ordering::Relaxed),
            active_jobs,
            scheduled_jobs,
            completed_jobs,
            uploading_channels,
        }
    }

    /// Stop accepting jobs and signal every supervisor and upload task.
    /// Channels still in flight are failed with a retryable error.
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator already shut down");
            return;
        }

        info!("Shutting down publish orchestrator");
        let _ = self.shutdown_tx.send(());
    }

    /// Validate a request against the channel registry. Returns the
    /// resolved target channels in submission order (duplicates dropped).
    /// Nothing is mutated on any failure path.
    fn validate(&self, request: &PublishRequest) -> Result<Vec<Channel>, OrchestratorError> {
        if request.asset.file_name.is_empty() {
            return Err(ValidationError::MissingAsset.into());
        }
        if request.asset.kind().is_none() {
            return Err(
                ValidationError::UnsupportedMediaType(request.asset.mime_type.clone()).into(),
            );
        }
        if request.channel_ids.is_empty() {
            return Err(ValidationError::NoTargets.into());
        }

        let mut targets = Vec::with_capacity(request.channel_ids.len());
        for channel_id in &request.channel_ids {
            if targets.iter().any(|c: &Channel| &c.id == channel_id) {
                continue;
            }
            let channel = self
                .registry
                .get(channel_id)?
                .ok_or_else(|| ValidationError::UnknownChannel(channel_id.clone()))?;
            if !channel.is_publishable() {
                return Err(ValidationError::ChannelDisconnected(channel_id.clone()).into());
            }
            targets.push(channel);
        }

        if let ScheduleMode::Later { scheduled_for } = request.schedule {
            if scheduled_for < Utc::now() {
                return Err(ValidationError::ScheduleTimeInPast { scheduled_for }.into());
            }
        }

        Ok(targets)
    }

    /// Spawn the supervisor task for one job. It waits out the schedule,
    /// then launches one upload task per target.
    fn spawn_supervisor(
        &self,
        job: Arc<RwLock<PublishJob>>,
        cancel_tx: broadcast::Sender<()>,
        targets: Vec<Channel>,
    ) {
        let config = self.config.clone();
        let transport = Arc::clone(&self.transport);
        let audit = self.audit.clone();
        let jobs = Arc::clone(&self.jobs);
        let shutdown_tx = self.shutdown_tx.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut cancel_rx = cancel_tx.subscribe();

        tokio::spawn(async move {
            let (job_id, schedule) = {
                let j = job.read().await;
                (j.id.clone(), j.schedule)
            };

            if let ScheduleMode::Later { scheduled_for } = schedule {
                let delay = (scheduled_for - Utc::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                debug!("Job {} waiting {:?} until scheduled launch", job_id, delay);

                tokio::select! {
                    _ = cancel_rx.recv() => {
                        // Cancelled before launch: no channel ever left
                        // Ready, so the job is simply dropped.
                        jobs.write().await.remove(&job_id);
                        info!("Scheduled job {} cancelled before launch", job_id);
                        return;
                    }
                    _ = shutdown_rx.recv() => {
                        jobs.write().await.remove(&job_id);
                        info!("Scheduled job {} dropped at shutdown", job_id);
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            Self::launch(
                job, targets, config, transport, audit, cancel_tx, shutdown_tx,
            )
            .await;
        });
    }

    /// Mark every target as uploading, then fan out one upload task per
    /// target. All targets flip to `Uploading` together; the stagger only
    /// delays when each task actually calls the transport.
    async fn launch(
        job: Arc<RwLock<PublishJob>>,
        targets: Vec<Channel>,
        config: OrchestratorConfig,
        transport: Arc<dyn PublishTransport>,
        audit: Option<AuditHandle>,
        cancel_tx: broadcast::Sender<()>,
        shutdown_tx: broadcast::Sender<()>,
    ) {
        let launched_at = Utc::now();
        let (job_id, asset, title, caption) = {
            let mut j = job.write().await;
            j.launched_at = Some(launched_at);
            for channel in &targets {
                j.per_channel.insert(
                    channel.id.clone(),
                    PublishStatus::Uploading {
                        started_at: launched_at,
                    },
                );
            }
            (j.id.clone(), j.asset.clone(), j.title.clone(), j.caption.clone())
        };

        if let Some(ref audit) = audit {
            for channel in &targets {
                audit
                    .emit(AuditEvent::PublishStateChanged {
                        job_id: job_id.clone(),
                        channel_id: channel.id.clone(),
                        from_status: "ready".to_string(),
                        to_status: "uploading".to_string(),
                        error: None,
                    })
                    .await;
            }
        }

        info!("Job {} launched with {} targets", job_id, targets.len());

        for (index, channel) in targets.into_iter().enumerate() {
            let job = Arc::clone(&job);
            let config = config.clone();
            let transport = Arc::clone(&transport);
            let audit = audit.clone();
            let cancel_rx = cancel_tx.subscribe();
            let shutdown_rx = shutdown_tx.subscribe();
            let request = UploadRequest {
                channel_id: channel.id.clone(),
                platform: channel.platform,
                asset: asset.clone(),
                title: title.clone(),
                caption: caption.clone(),
            };

            tokio::spawn(async move {
                Self::run_upload(
                    job, channel, index, request, config, transport, audit, cancel_rx,
                    shutdown_rx,
                )
                .await;
            });
        }
    }

    /// Drive one channel from `Uploading` to a terminal status: staggered
    /// start, per-attempt timeout, bounded retries with exponential backoff
    /// for retryable errors only.
    #[allow(clippy::too_many_arguments)]
    async fn run_upload(
        job: Arc<RwLock<PublishJob>>,
        channel: Channel,
        index: usize,
        request: UploadRequest,
        config: OrchestratorConfig,
        transport: Arc<dyn PublishTransport>,
        audit: Option<AuditHandle>,
        mut cancel_rx: broadcast::Receiver<()>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let stagger = Duration::from_millis(config.stagger_ms * index as u64);
        if !stagger.is_zero() {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    Self::finish_channel(
                        &job,
                        &channel.id,
                        PublishStatus::Failed {
                            error: "cancelled".to_string(),
                            retryable: true,
                            attempts: 0,
                            failed_at: Utc::now(),
                        },
                        &audit,
                    )
                    .await;
                    return;
                }
                _ = shutdown_rx.recv() => {
                    Self::finish_channel(
                        &job,
                        &channel.id,
                        PublishStatus::Failed {
                            error: "shutting down".to_string(),
                            retryable: true,
                            attempts: 0,
                            failed_at: Utc::now(),
                        },
                        &audit,
                    )
                    .await;
                    return;
                }
                _ = tokio::time::sleep(stagger) => {}
            }
        }

        let platform = channel.platform.as_str();
        let timeout = Duration::from_millis(config.upload_timeout_ms);
        let mut attempt: u32 = 1;

        let terminal = loop {
            debug!(
                "Uploading to channel {} ({}), attempt {}/{}",
                channel.id, platform, attempt, config.max_upload_attempts
            );

            let started = std::time::Instant::now();
            let result = tokio::select! {
                _ = cancel_rx.recv() => {
                    break PublishStatus::Failed {
                        error: "cancelled".to_string(),
                        retryable: true,
                        attempts: attempt - 1,
                        failed_at: Utc::now(),
                    };
                }
                _ = shutdown_rx.recv() => {
                    break PublishStatus::Failed {
                        error: "shutting down".to_string(),
                        retryable: true,
                        attempts: attempt - 1,
                        failed_at: Utc::now(),
                    };
                }
                res = tokio::time::timeout(timeout, transport.upload(request.clone())) => {
                    res.unwrap_or(Err(TransportError::Timeout))
                }
            };

            metrics::UPLOAD_DURATION
                .with_label_values(&[platform])
                .observe(started.elapsed().as_secs_f64());

            match result {
                Ok(receipt) => {
                    metrics::UPLOAD_ATTEMPTS
                        .with_label_values(&[platform, "success"])
                        .inc();
                    break PublishStatus::Published {
                        published_at: receipt.accepted_at,
                        post_url: receipt.post_url,
                    };
                }
                Err(e) if e.is_retryable() && attempt < config.max_upload_attempts => {
                    metrics::UPLOAD_ATTEMPTS
                        .with_label_values(&[platform, "retryable_error"])
                        .inc();
                    metrics::UPLOAD_RETRIES.with_label_values(&[platform]).inc();

                    let backoff = Duration::from_millis(
                        config.retry_backoff_ms.saturating_mul(1 << (attempt - 1)),
                    );
                    warn!(
                        "Upload to channel {} failed (attempt {}/{}): {}, retrying in {:?}",
                        channel.id, attempt, config.max_upload_attempts, e, backoff
                    );

                    tokio::select! {
                        _ = cancel_rx.recv() => {
                            break PublishStatus::Failed {
                                error: "cancelled".to_string(),
                                retryable: true,
                                attempts: attempt,
                                failed_at: Utc::now(),
                            };
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    attempt += 1;
                }
                Err(e) => {
                    let label = if e.is_retryable() {
                        "retryable_error"
                    } else {
                        "permanent_error"
                    };
                    metrics::UPLOAD_ATTEMPTS
                        .with_label_values(&[platform, label])
                        .inc();
                    warn!(
                        "Upload to channel {} failed permanently after {} attempt(s): {}",
                        channel.id, attempt, e
                    );
                    break PublishStatus::Failed {
                        error: e.to_string(),
                        retryable: e.is_retryable(),
                        attempts: attempt,
                        failed_at: Utc::now(),
                    };
                }
            }
        };

        Self::finish_channel(&job, &channel.id, terminal, &audit).await;
    }

    /// Record a terminal status for one channel, respecting the monotonic
    /// transition order, and close out the job when it was the last one.
    async fn finish_channel(
        job: &Arc<RwLock<PublishJob>>,
        channel_id: &str,
        status: PublishStatus,
        audit: &Option<AuditHandle>,
    ) {
        let error = match &status {
            PublishStatus::Failed { error, .. } => Some(error.clone()),
            _ => None,
        };

        let (job_id, from_status, job_done) = {
            let mut j = job.write().await;
            let current = match j.per_channel.get(channel_id) {
                Some(s) => s.clone(),
                None => return,
            };
            if !current.can_transition_to(&status) {
                debug!(
                    "Ignoring late {} transition for channel {} (already {})",
                    status.status_type(),
                    channel_id,
                    current.status_type()
                );
                return;
            }
            j.per_channel.insert(channel_id.to_string(), status.clone());

            let job_done = if j.is_complete() {
                j.completed_at = Some(Utc::now());
                true
            } else {
                false
            };
            (j.id.clone(), current.status_type(), job_done)
        };

        if let Some(ref audit) = audit {
            audit
                .emit(AuditEvent::PublishStateChanged {
                    job_id: job_id.clone(),
                    channel_id: channel_id.to_string(),
                    from_status: from_status.to_string(),
                    to_status: status.status_type().to_string(),
                    error,
                })
                .await;
        }

        if job_done {
            let j = job.read().await;
            let duration_ms = match (j.launched_at, j.completed_at) {
                (Some(launched), Some(completed)) => {
                    (completed - launched).num_milliseconds().max(0) as u64
                }
                _ => 0,
            };

            metrics::JOBS_COMPLETED.inc();
            metrics::JOB_DURATION
                .with_label_values(&[])
                .observe(duration_ms as f64 / 1000.0);

            if let Some(ref audit) = audit {
                audit
                    .emit(AuditEvent::JobCompleted {
                        job_id: job_id.clone(),
                        published: j.published_count(),
                        failed: j.failed_count(),
                        duration_ms,
                    })
                    .await;
            }

            info!(
                "Job {} complete: {} published, {} failed in {}ms",
                job_id,
                j.published_count(),
                j.failed_count(),
                duration_ms
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Platform, SqliteChannelRegistry};
    use crate::publish::Asset;
    use crate::testing::{fixtures, MockTransport};

    fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig {
            base_latency_ms: 0,
            stagger_ms: 10,
            max_upload_attempts: 3,
            retry_backoff_ms: 10,
            upload_timeout_ms: 1000,
        }
    }

    fn setup(config: OrchestratorConfig) -> (PublishOrchestrator, Arc<MockTransport>) {
        let registry = SqliteChannelRegistry::in_memory().unwrap();
        registry
            .connect(&fixtures::active_channel("ch-a", Platform::Youtube))
            .unwrap();
        registry
            .connect(&fixtures::active_channel("ch-b", Platform::Tiktok))
            .unwrap();
        registry
            .connect(&fixtures::disconnected_channel("ch-d", Platform::Instagram))
            .unwrap();

        let transport = Arc::new(MockTransport::new());
        let orchestrator = PublishOrchestrator::new(
            config,
            Arc::new(registry),
            Arc::clone(&transport) as Arc<dyn PublishTransport>,
            None,
        );
        (orchestrator, transport)
    }

    async fn wait_complete(orchestrator: &PublishOrchestrator, job_id: &str) -> PublishJob {
        for _ in 0..500 {
            let job = orchestrator
                .job(job_id)
                .await
                .expect("job disappeared while waiting");
            if job.is_complete() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job {} did not complete in time", job_id);
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_targets() {
        let (orchestrator, transport) = setup(fast_config());
        let request = fixtures::publish_request(&[]);

        let err = orchestrator.submit(request).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Validation(ValidationError::NoTargets)
        ));
        assert!(orchestrator.jobs().await.is_empty());
        assert!(transport.uploads().await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_channel() {
        let (orchestrator, _) = setup(fast_config());
        let request = fixtures::publish_request(&["ch-a", "ch-nope"]);

        let err = orchestrator.submit(request).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Validation(ValidationError::UnknownChannel(ref id)) if id == "ch-nope"
        ));
        // One bad target rejects the whole request, no job exists
        assert!(orchestrator.jobs().await.is_empty());
        assert_eq!(
            orchestrator.channel_status("ch-a").await,
            PublishStatus::Ready
        );
    }

    #[tokio::test]
    async fn test_submit_rejects_disconnected_channel() {
        let (orchestrator, _) = setup(fast_config());
        let request = fixtures::publish_request(&["ch-a", "ch-d"]);

        let err = orchestrator.submit(request).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Validation(ValidationError::ChannelDisconnected(ref id)) if id == "ch-d"
        ));
        assert!(orchestrator.jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_unsupported_media() {
        let (orchestrator, _) = setup(fast_config());
        let mut request = fixtures::publish_request(&["ch-a"]);
        request.asset = Asset {
            id: "asset-bad".to_string(),
            file_name: "notes.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 1024,
            duration_secs: None,
        };

        let err = orchestrator.submit(request).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Validation(ValidationError::UnsupportedMediaType(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_rejects_past_schedule() {
        let (orchestrator, _) = setup(fast_config());
        let mut request = fixtures::publish_request(&["ch-a"]);
        request.schedule = ScheduleMode::Later {
            scheduled_for: Utc::now() - chrono::Duration::hours(1),
        };

        let err = orchestrator.submit(request).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Validation(ValidationError::ScheduleTimeInPast { .. })
        ));
        assert!(orchestrator.jobs().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_publishes_all_channels() {
        let (orchestrator, transport) = setup(fast_config());
        let request = fixtures::publish_request(&["ch-a", "ch-b"]);

        let job_id = orchestrator.submit(request).await.unwrap();
        let job = wait_complete(&orchestrator, &job_id).await;

        assert_eq!(job.published_count(), 2);
        assert_eq!(job.failed_count(), 0);
        assert!(job.launched_at.is_some());
        assert!(job.completed_at.is_some());
        assert!(matches!(
            job.channel_status("ch-a"),
            Some(PublishStatus::Published { .. })
        ));
        assert!(matches!(
            job.channel_status("ch-b"),
            Some(PublishStatus::Published { .. })
        ));
        assert_eq!(transport.upload_count("ch-a").await, 1);
        assert_eq!(transport.upload_count("ch-b").await, 1);
        assert!(!orchestrator.is_publishing().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uploads_carry_title_and_caption() {
        let (orchestrator, transport) = setup(fast_config());
        let mut request = fixtures::publish_request(&["ch-a"]);
        request.title = "Launch Day".to_string();
        request.caption = "We are live #launch".to_string();

        let job_id = orchestrator.submit(request).await.unwrap();
        let job = wait_complete(&orchestrator, &job_id).await;
        assert_eq!(job.title, "Launch Day");

        let uploads = transport.uploads().await;
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].request.title, "Launch Day");
        assert_eq!(uploads[0].request.caption, "We are live #launch");
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_channel_keys_match_target_set() {
        let (orchestrator, _) = setup(fast_config());
        let request = fixtures::publish_request(&["ch-a", "ch-b", "ch-a"]);

        let job_id = orchestrator.submit(request).await.unwrap();
        let job = orchestrator.job(&job_id).await.unwrap();

        // Duplicates collapse; the key set never changes for the job's life
        assert_eq!(job.per_channel.len(), 2);
        assert!(job.per_channel.contains_key("ch-a"));
        assert!(job.per_channel.contains_key("ch-b"));

        let done = wait_complete(&orchestrator, &job_id).await;
        assert_eq!(done.per_channel.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_not_retried() {
        let (orchestrator, transport) = setup(fast_config());
        transport
            .fail_next("ch-a", TransportError::Rejected("content policy".to_string()))
            .await;

        let job_id = orchestrator
            .submit(fixtures::publish_request(&["ch-a"]))
            .await
            .unwrap();
        let job = wait_complete(&orchestrator, &job_id).await;

        match job.channel_status("ch-a") {
            Some(PublishStatus::Failed {
                retryable,
                attempts,
                ..
            }) => {
                assert!(!retryable);
                assert_eq!(*attempts, 1);
            }
            other => panic!("expected failed status, got {:?}", other),
        }
        assert_eq!(transport.upload_count("ch-a").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_error_retried_until_success() {
        let (orchestrator, transport) = setup(fast_config());
        transport
            .fail_next("ch-a", TransportError::Timeout)
            .await;

        let job_id = orchestrator
            .submit(fixtures::publish_request(&["ch-a"]))
            .await
            .unwrap();
        let job = wait_complete(&orchestrator, &job_id).await;

        assert!(matches!(
            job.channel_status("ch-a"),
            Some(PublishStatus::Published { .. })
        ));
        assert_eq!(transport.upload_count("ch-a").await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_fails_retryable() {
        let (orchestrator, transport) = setup(fast_config());
        transport
            .fail_times(
                "ch-a",
                TransportError::ConnectionFailed("reset".to_string()),
                3,
            )
            .await;

        let job_id = orchestrator
            .submit(fixtures::publish_request(&["ch-a"]))
            .await
            .unwrap();
        let job = wait_complete(&orchestrator, &job_id).await;

        match job.channel_status("ch-a") {
            Some(PublishStatus::Failed {
                retryable,
                attempts,
                ..
            }) => {
                assert!(*retryable);
                assert_eq!(*attempts, 3);
            }
            other => panic!("expected failed status, got {:?}", other),
        }
        assert_eq!(transport.upload_count("ch-a").await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failed_channel_does_not_block_others() {
        let (orchestrator, transport) = setup(fast_config());
        transport
            .fail_next("ch-a", TransportError::AuthExpired("ch-a".to_string()))
            .await;

        let job_id = orchestrator
            .submit(fixtures::publish_request(&["ch-a", "ch-b"]))
            .await
            .unwrap();
        let job = wait_complete(&orchestrator, &job_id).await;

        assert_eq!(job.published_count(), 1);
        assert_eq!(job.failed_count(), 1);
        assert!(matches!(
            job.channel_status("ch-b"),
            Some(PublishStatus::Published { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_fails_in_flight_channels() {
        let (orchestrator, transport) = setup(fast_config());
        // Uploads would take an hour; cancel lands long before
        transport.set_latency(Duration::from_secs(3600)).await;

        let job_id = orchestrator
            .submit(fixtures::publish_request(&["ch-a", "ch-b"]))
            .await
            .unwrap();

        // Let the supervisor launch and flip targets to uploading
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(orchestrator.is_publishing().await);

        let cancelled = orchestrator.cancel(&job_id, "test-user").await.unwrap();
        assert_eq!(cancelled, 2);

        let job = wait_complete(&orchestrator, &job_id).await;
        for channel_id in ["ch-a", "ch-b"] {
            match job.channel_status(channel_id) {
                Some(PublishStatus::Failed {
                    error, retryable, ..
                }) => {
                    assert_eq!(error, "cancelled");
                    assert!(*retryable);
                }
                other => panic!("expected cancelled status, got {:?}", other),
            }
        }

        // A completed (cancelled) job cannot be cancelled again
        let err = orchestrator.cancel(&job_id, "test-user").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidState { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_scheduled_job_drops_it() {
        let (orchestrator, transport) = setup(fast_config());
        let mut request = fixtures::publish_request(&["ch-a", "ch-b"]);
        request.schedule = ScheduleMode::Later {
            scheduled_for: Utc::now() + chrono::Duration::hours(1),
        };

        let job_id = orchestrator.submit(request).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let job = orchestrator.job(&job_id).await.unwrap();
        assert!(job.launched_at.is_none());

        let cancelled = orchestrator.cancel(&job_id, "test-user").await.unwrap();
        assert_eq!(cancelled, 2);

        // Supervisor drops the job; nothing was ever uploaded
        for _ in 0..100 {
            if orchestrator.job(&job_id).await.is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(orchestrator.job(&job_id).await.is_none());
        assert!(transport.uploads().await.is_empty());
        assert_eq!(
            orchestrator.channel_status("ch-a").await,
            PublishStatus::Ready
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_job_launches_at_time() {
        let (orchestrator, transport) = setup(fast_config());
        let mut request = fixtures::publish_request(&["ch-a"]);
        request.schedule = ScheduleMode::Later {
            scheduled_for: Utc::now() + chrono::Duration::hours(1),
        };

        let job_id = orchestrator.submit(request).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Still waiting: no launch, no uploads, targets ready
        let job = orchestrator.job(&job_id).await.unwrap();
        assert!(job.launched_at.is_none());
        assert!(matches!(
            job.channel_status("ch-a"),
            Some(PublishStatus::Ready)
        ));
        assert!(transport.uploads().await.is_empty());
        assert_eq!(orchestrator.status().await.scheduled_jobs, 1);

        // Jump past the scheduled instant
        tokio::time::advance(Duration::from_secs(3601)).await;

        let job = wait_complete(&orchestrator, &job_id).await;
        assert!(job.launched_at.is_some());
        assert_eq!(job.published_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_requires_complete_job() {
        let (orchestrator, transport) = setup(fast_config());
        transport.set_latency(Duration::from_secs(3600)).await;

        let job_id = orchestrator
            .submit(fixtures::publish_request(&["ch-a"]))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = orchestrator.reset(&job_id, "test-user").await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::InvalidState { ref actual, .. } if actual == "publishing"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_returns_channels_to_ready() {
        let (orchestrator, _) = setup(fast_config());
        let job_id = orchestrator
            .submit(fixtures::publish_request(&["ch-a", "ch-b"]))
            .await
            .unwrap();
        wait_complete(&orchestrator, &job_id).await;

        assert!(matches!(
            orchestrator.channel_status("ch-a").await,
            PublishStatus::Published { .. }
        ));

        orchestrator.reset(&job_id, "test-user").await.unwrap();

        assert!(orchestrator.job(&job_id).await.is_none());
        assert_eq!(
            orchestrator.channel_status("ch-a").await,
            PublishStatus::Ready
        );
        assert_eq!(
            orchestrator.channel_status("ch-b").await,
            PublishStatus::Ready
        );

        let err = orchestrator.reset(&job_id, "test-user").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::JobNotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_status_follows_latest_job() {
        let (orchestrator, transport) = setup(fast_config());

        let first = orchestrator
            .submit(fixtures::publish_request(&["ch-a"]))
            .await
            .unwrap();
        wait_complete(&orchestrator, &first).await;

        // Second job against the same channel fails
        transport
            .fail_next("ch-a", TransportError::QuotaExceeded("daily limit".to_string()))
            .await;
        let second = orchestrator
            .submit(fixtures::publish_request(&["ch-a"]))
            .await
            .unwrap();
        wait_complete(&orchestrator, &second).await;

        assert!(matches!(
            orchestrator.channel_status("ch-a").await,
            PublishStatus::Failed { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_counts() {
        let (orchestrator, _) = setup(fast_config());

        let status = orchestrator.status().await;
        assert!(status.running);
        assert_eq!(status.active_jobs, 0);

        let job_id = orchestrator
            .submit(fixtures::publish_request(&["ch-a", "ch-b"]))
            .await
            .unwrap();
        wait_complete(&orchestrator, &job_id).await;

        let status = orchestrator.status().await;
        assert_eq!(status.completed_jobs, 1);
        assert_eq!(status.uploading_channels, 0);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_jobs() {
        let (orchestrator, _) = setup(fast_config());
        orchestrator.shutdown().await;

        let err = orchestrator
            .submit(fixtures::publish_request(&["ch-a"]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ShuttingDown));
        assert!(!orchestrator.status().await.running);
    }
}
