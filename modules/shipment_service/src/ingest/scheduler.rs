//! Periodic driver for the ingestion tasks and background jobs

use crate::contract::TrackingError;
use crate::domain::Service;
use crate::ingest::pipeline::IngestPipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Runs the two polling tasks on a fixed interval until cancelled.
///
/// Task invocations are sequential within one scheduler, and the pipeline
/// tolerates overlapping runs anyway (submission uuids de-duplicate), so a
/// second scheduler pointed at the same database is wasteful but safe.
pub struct IngestScheduler {
    pipeline: Arc<IngestPipeline>,
    interval: Duration,
}

impl IngestScheduler {
    pub fn new(pipeline: Arc<IngestPipeline>, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("ingest scheduler stopping");
                    return;
                }
                _ = ticker.tick() => {
                    self.pipeline.process_new_package_scans().await;
                    self.pipeline.verify_device_bindings().await;
                }
            }
        }
    }
}

/// Delete a shipment on a background task.
///
/// Shipment deletion cascades over every package, item and scan and can
/// take longer than any request timeout, so it never runs inline.
pub fn spawn_delete_shipment(
    service: Arc<Service>,
    shipment_id: i64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match service.delete_shipment(shipment_id).await {
            Ok(()) => tracing::info!(shipment_id, "shipment deleted"),
            Err(TrackingError::NotFound { .. }) => {
                tracing::error!(shipment_id, "no shipment with that id to delete");
            }
            Err(e) => {
                tracing::error!(shipment_id, error = %e, "unexpected error deleting shipment");
            }
        }
    })
}
