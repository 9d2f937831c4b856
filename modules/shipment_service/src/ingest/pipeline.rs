//! Polling pipeline for survey form submissions
//!
//! Two periodic tasks pull new submissions from the survey server: package
//! tracking scans, and device-id verifications. Both are idempotent across
//! overlapping or repeated runs: a submission uuid that was already stored
//! is skipped, and the uuid column carries a unique constraint so a lost
//! race degrades to a no-op insert.
//!
//! Nothing here surfaces errors to end users. Data-quality problems are
//! logged per record and the batch continues; connection problems abort the
//! run and the next scheduled run retries from the checkpoint; anything
//! unexpected is logged and the task returns cleanly so the scheduler is
//! never destabilized.

use crate::config::SurveyConfig;
use crate::contract::{FormSubmission, TrackingError};
use crate::domain::Service;
use crate::ingest::api::{SurveyApi, SurveyApiError};
use crate::ingest::submission::{
    status_from_location_code, DeviceSubmission, FormDefinition, ScanSubmission,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
enum TaskError {
    #[error(transparent)]
    Survey(#[from] SurveyApiError),
    #[error(transparent)]
    Tracking(#[from] TrackingError),
}

/// Counters for one polling run, mostly useful in tests and debug logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Submissions downloaded from the server
    pub fetched: usize,
    /// FormSubmission records created
    pub created: usize,
    /// Submissions skipped because their uuid was already stored
    pub duplicates: usize,
    /// Submissions dropped for data-quality reasons (malformed payload,
    /// unknown user code)
    pub skipped: usize,
}

/// The ingestion pipeline. One instance per process; the bad-form-id memo
/// lives here rather than in global state so tests can reset it.
pub struct IngestPipeline {
    service: Arc<Service>,
    client: Arc<dyn SurveyApi>,
    config: SurveyConfig,
    /// Form ids whose definition lookup came back empty. Never retried
    /// until the process restarts (or a test resets them); this keeps a
    /// misconfigured form id from flooding the logs on every poll.
    bad_form_ids: Mutex<HashSet<i64>>,
}

impl IngestPipeline {
    pub fn new(service: Arc<Service>, client: Arc<dyn SurveyApi>, config: SurveyConfig) -> Self {
        Self {
            service,
            client,
            config,
            bad_form_ids: Mutex::new(HashSet::new()),
        }
    }

    /// Forget every memorized bad form id
    pub fn reset_bad_form_ids(&self) {
        self.bad_form_ids.lock().clear();
    }

    fn is_bad_form(&self, form_id: i64) -> bool {
        self.bad_form_ids.lock().contains(&form_id)
    }

    fn remember_bad_form(&self, form_id: i64) {
        self.bad_form_ids.lock().insert(form_id);
    }

    /// Pull new package tracking scans and apply them.
    pub async fn process_new_package_scans(&self) -> IngestSummary {
        tracing::debug!("package scan ingestion starting");
        match self.ingest_package_scans().await {
            Ok(summary) => {
                tracing::debug!(?summary, "package scan ingestion done");
                summary
            }
            Err(TaskError::Survey(e)) if e.is_connection() => {
                tracing::error!(error = %e, "error connecting to survey server");
                IngestSummary::default()
            }
            Err(e) => {
                tracing::error!(error = %e, "package scan ingestion failed");
                IngestSummary::default()
            }
        }
    }

    async fn ingest_package_scans(&self) -> Result<IngestSummary, TaskError> {
        let form_id = self.config.package_form_id;
        let mut summary = IngestSummary::default();
        if self.is_bad_form(form_id) {
            return Ok(summary);
        }

        let definition_value = self.client.get_form_definition(form_id).await?;
        if FormDefinition::is_empty_definition(&definition_value) {
            // This error is meant to reach operators; the form id stays on
            // the bad list until the settings are fixed and the process
            // restarts.
            tracing::error!(form_id, "bad package form id");
            self.remember_bad_form(form_id);
            return Ok(summary);
        }
        let definition = FormDefinition::parse(&definition_value);

        let since = self.service.latest_submission_time(form_id).await?;
        match since {
            Some(since) => tracing::debug!(%since, "fetching submissions newer than checkpoint"),
            None => tracing::debug!(form_id, "no submissions stored yet"),
        }
        let raw = self.client.get_form_submissions(form_id, since).await?;
        summary.fetched = raw.len();
        tracing::debug!(count = raw.len(), "downloaded submitted forms");

        let mut submissions = Vec::with_capacity(raw.len());
        for payload in raw {
            match ScanSubmission::parse(form_id, payload) {
                Ok(submission) => submissions.push(submission),
                Err(e) => {
                    tracing::error!(error = %e, "scan submission not imported");
                    summary.skipped += 1;
                }
            }
        }
        submissions.sort_by_key(|s| s.submission_time);

        for submission in submissions {
            if self.service.submission_exists(submission.uuid).await? {
                tracing::debug!(uuid = %submission.uuid, "submission already stored");
                summary.duplicates += 1;
                continue;
            }
            let record = FormSubmission {
                id: 0,
                form_id,
                uuid: submission.uuid,
                data: submission.payload.clone(),
                submission_time: submission.submission_time,
            };
            if !self.service.record_form_submission(&record).await? {
                summary.duplicates += 1;
                continue;
            }
            summary.created += 1;
            self.apply_scan(&submission, &definition).await;
        }
        Ok(summary)
    }

    /// Apply one scan submission to every package it references. Data
    /// problems are logged and never abort the batch.
    async fn apply_scan(&self, submission: &ScanSubmission, definition: &FormDefinition) {
        let status = match submission.location_code.as_deref() {
            Some(code) => {
                let status = status_from_location_code(code);
                if status.is_none() {
                    // The app and the survey form are out of sync
                    tracing::error!(
                        uuid = %submission.uuid,
                        code,
                        "submission has invalid package status"
                    );
                }
                status
            }
            None => None,
        };
        let label = submission
            .location_code
            .as_deref()
            .map(|code| definition.location_label(code));

        for code in submission.qr_codes() {
            let result = self
                .service
                .record_package_scan(
                    code,
                    submission.submission_time,
                    submission.gps_point(),
                    label.clone(),
                    status,
                )
                .await;
            match result {
                Ok(()) => tracing::debug!(%code, "recorded package scan"),
                Err(TrackingError::NotFound { .. }) => {
                    tracing::error!(%code, "scanned package not found");
                }
                Err(e) => {
                    tracing::error!(%code, error = %e, "failed to record package scan");
                }
            }
        }
    }

    /// Pull device-id verification submissions and re-bind devices.
    pub async fn verify_device_bindings(&self) -> IngestSummary {
        match self.ingest_device_bindings().await {
            Ok(summary) => summary,
            Err(TaskError::Survey(e)) if e.is_connection() => {
                tracing::error!(error = %e, "error connecting to survey server");
                IngestSummary::default()
            }
            Err(e) => {
                tracing::error!(error = %e, "device binding ingestion failed");
                IngestSummary::default()
            }
        }
    }

    async fn ingest_device_bindings(&self) -> Result<IngestSummary, TaskError> {
        let form_id = self.config.device_form_id;
        let mut summary = IngestSummary::default();
        if self.is_bad_form(form_id) {
            return Ok(summary);
        }

        let definition_value = self.client.get_form_definition(form_id).await?;
        if FormDefinition::is_empty_definition(&definition_value) {
            tracing::error!(form_id, "bad device verification form id");
            self.remember_bad_form(form_id);
            return Ok(summary);
        }

        let mut checkpoint = self.service.checkpoint(form_id).await?;
        let raw = match self
            .client
            .get_form_submissions(form_id, Some(checkpoint.timestamp))
            .await
        {
            Ok(raw) => raw,
            Err(SurveyApiError::Api { status: 404, .. }) => {
                tracing::error!(form_id, "form not found on survey server");
                return Ok(summary);
            }
            Err(e) => return Err(e.into()),
        };
        summary.fetched = raw.len();

        let mut submissions = Vec::with_capacity(raw.len());
        for payload in raw {
            match DeviceSubmission::parse(form_id, payload) {
                Ok(submission) => submissions.push(submission),
                Err(e) => {
                    tracing::error!(error = %e, "device submission not imported");
                    summary.skipped += 1;
                }
            }
        }
        submissions.sort_by_key(|s| s.submission_time);

        // The watermark is saved no matter how the batch ends, so progress
        // already made is never lost to a late failure.
        let result = self
            .apply_device_batch(&mut checkpoint, submissions, &mut summary)
            .await;
        if let Err(e) = self.service.save_checkpoint(&checkpoint).await {
            tracing::error!(error = %e, form_id, "failed to save retrieval checkpoint");
        }
        result.map(|()| summary)
    }

    async fn apply_device_batch(
        &self,
        checkpoint: &mut crate::contract::FormRetrievalCheckpoint,
        submissions: Vec<DeviceSubmission>,
        summary: &mut IngestSummary,
    ) -> Result<(), TaskError> {
        for submission in submissions {
            // Advance past failed submissions too; a bad record is skipped
            // forever rather than refetched on every poll
            if submission.submission_time > checkpoint.timestamp {
                checkpoint.timestamp = submission.submission_time;
            }
            let user = self.service.find_user_by_code(&submission.qr_code).await?;
            if user.is_none() {
                tracing::error!(
                    form_id = submission.form_id,
                    qr_code = %submission.qr_code,
                    "device submission has invalid user QR code"
                );
                summary.skipped += 1;
                continue;
            }
            let record = FormSubmission {
                id: 0,
                form_id: submission.form_id,
                uuid: submission.uuid,
                data: submission.payload.clone(),
                submission_time: submission.submission_time,
            };
            if !self.service.record_form_submission(&record).await? {
                summary.duplicates += 1;
                continue;
            }
            summary.created += 1;
            self.service
                .bind_device(&submission.qr_code, &submission.device_id)
                .await?;
        }
        Ok(())
    }
}
