//! Background campaign runner.
//!
//! Triggered promotions are queued here and each is delivered on its own
//! task, independent of the request that created it. Campaigns for different
//! promotions run concurrently.
//!
//! The queue lives in memory, so the database stays authoritative: on start
//! the runner fails campaigns an earlier process left in `sending` and picks
//! up every `pending` promotion, then periodically sweeps for pending rows
//! the queue never accepted.

use std::time::Duration;

use jiff::Timestamp;
use mockall::automock;
use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info, warn};

use crate::domain::email_promotions::{
    campaign::{Campaign, CampaignOutcome},
    records::EmailPromotionUuid,
};

/// Queued campaigns beyond this are refused rather than buffered.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// How often pending promotions are swept up.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Pending promotions started per sweep; the rest wait for the next one.
const SWEEP_BATCH: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("campaign queue is full")]
    QueueFull,

    #[error("campaign runner has shut down")]
    Closed,
}

/// Accepts promotions for asynchronous delivery.
#[automock]
pub trait CampaignScheduler: Send + Sync {
    /// Queue `promotion` for delivery without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the runner cannot accept more work.
    fn schedule(&self, promotion: EmailPromotionUuid) -> Result<(), ScheduleError>;
}

/// Supervises campaign delivery tasks.
#[derive(Debug, Clone)]
pub struct CampaignRunner {
    queue: mpsc::Sender<EmailPromotionUuid>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl CampaignRunner {
    /// Start the supervisor on the current Tokio runtime.
    ///
    /// Pending promotions older than `sweep_interval` are started even if
    /// they were never scheduled.
    #[must_use]
    pub fn start(campaign: Campaign, capacity: usize, sweep_interval: Duration) -> Self {
        let (queue, jobs) = mpsc::channel(capacity.max(1));
        let tracker = TaskTracker::new();
        let shutdown = CancellationToken::new();

        tracker.spawn(supervise(
            campaign,
            jobs,
            tracker.clone(),
            shutdown.clone(),
            sweep_interval.max(MIN_SWEEP_INTERVAL),
        ));

        Self {
            queue,
            tracker,
            shutdown,
        }
    }

    /// Whether new campaigns are still being accepted.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Stop accepting campaigns and wait up to `grace` for running ones.
    ///
    /// Returns `false` if campaigns were still running when `grace` elapsed.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.shutdown.cancel();
        self.tracker.close();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            info!("campaign runner stopped");

            true
        } else {
            warn!(
                running = self.tracker.len(),
                "campaign runner shutdown timed out with campaigns still sending"
            );

            false
        }
    }
}

impl CampaignScheduler for CampaignRunner {
    fn schedule(&self, promotion: EmailPromotionUuid) -> Result<(), ScheduleError> {
        if self.shutdown.is_cancelled() {
            return Err(ScheduleError::Closed);
        }

        self.queue.try_send(promotion).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => ScheduleError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => ScheduleError::Closed,
        })
    }
}

async fn supervise(
    campaign: Campaign,
    mut jobs: mpsc::Receiver<EmailPromotionUuid>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    sweep_interval: Duration,
) {
    match campaign.fail_interrupted().await {
        Ok(0) => {}
        Ok(failed) => warn!(failed, "failed campaigns interrupted by a previous shutdown"),
        Err(source) => error!("failed to close interrupted campaigns: {source}"),
    }

    // Nothing is queued yet, so every pending promotion is an orphan.
    resume_pending(&tracker, &campaign, Timestamp::now()).await;

    let mut sweep = interval_at(Instant::now() + sweep_interval, sweep_interval);

    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            job = jobs.recv() => match job {
                Some(promotion) => spawn_campaign(&tracker, &campaign, promotion),
                None => break,
            },
            () = shutdown.cancelled() => break,
            _ = sweep.tick() => {
                // Younger rows may still be sitting in the queue.
                let created_before = Timestamp::now()
                    .checked_sub(sweep_interval)
                    .unwrap_or(Timestamp::MIN);

                resume_pending(&tracker, &campaign, created_before).await;
            }
        }
    }

    jobs.close();

    // Already accepted campaigns still run; the caller bounds the wait.
    while let Ok(promotion) = jobs.try_recv() {
        spawn_campaign(&tracker, &campaign, promotion);
    }
}

async fn resume_pending(tracker: &TaskTracker, campaign: &Campaign, created_before: Timestamp) {
    match campaign.pending(created_before, SWEEP_BATCH).await {
        Ok(pending) => {
            if !pending.is_empty() {
                info!(count = pending.len(), "resuming pending campaigns");
            }

            for promotion in pending {
                spawn_campaign(tracker, campaign, promotion);
            }
        }
        Err(source) => error!("failed to load pending campaigns: {source}"),
    }
}

fn spawn_campaign(tracker: &TaskTracker, campaign: &Campaign, promotion: EmailPromotionUuid) {
    debug!(email_promotion_uuid = %promotion, "starting campaign");

    let campaign = campaign.clone();

    tracker.spawn(async move {
        match campaign.run(promotion).await {
            Ok(CampaignOutcome::Completed { total_sent }) => {
                debug!(email_promotion_uuid = %promotion, total_sent, "campaign finished");
            }
            Ok(CampaignOutcome::Failed(reason)) => {
                warn!(email_promotion_uuid = %promotion, reason = %reason, "campaign failed");
            }
            Ok(CampaignOutcome::Skipped) => {}
            Err(source) => {
                error!(
                    email_promotion_uuid = %promotion,
                    "campaign status could not be recorded: {source}"
                );
            }
        }
    });
}
