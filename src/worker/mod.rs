//! Cron-driven Bovespa monitor.
//!
//! Polls the index on a schedule, compares the value against the
//! previous tick, and publishes a status message when it moved.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use apalis::prelude::*;
use apalis_cron::{CronStream, Schedule};
use chrono::{DateTime, Local, Utc};
use tokio::sync::Mutex;
use tower::load_shed::LoadShedLayer;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::market::QuoteClient;
use crate::notify::{Notifier, TwitterNotifier};


/// A cron tick, carrying the scheduled fire time.
#[derive(Default, Debug, Clone)]
pub struct MarketJob(pub DateTime<Utc>);

impl From<DateTime<Utc>> for MarketJob {
    fn from(t: DateTime<Utc>) -> Self {
        MarketJob(t)
    }
}

/// How the index moved between two consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Rose,
    Fell,
    Flat,
}

impl Movement {
    pub fn classify(previous: f64, current: f64) -> Self {
        if (current - previous).abs() < f64::EPSILON {
            Movement::Flat
        } else if current > previous {
            Movement::Rose
        } else {
            Movement::Fell
        }
    }
}

/// Format the status message for a movement, or `None` when the index
/// did not move and nothing should be published.
pub fn status_message(movement: Movement, value: f64, time: &DateTime<Local>) -> Option<String> {
    let clock = time.format("%I:%M %p");
    match movement {
        Movement::Flat => None,
        Movement::Rose => Some(format!("A Bovespa subiu :) - {:.2} às {}", value, clock)),
        Movement::Fell => Some(format!("A Bovespa caiu :( - {:.2} às {}", value, clock)),
    }
}

#[derive(Clone)]
pub struct MonitorService {
    last_value: Arc<Mutex<Option<f64>>>,
    quotes: QuoteClient,
    notifier: Arc<dyn Notifier>,
}

impl MonitorService {
    pub fn new(quotes: QuoteClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            last_value: Arc::new(Mutex::new(None)),
            quotes,
            notifier,
        }
    }

    /// Handle one cron tick. The stored value is updated before any
    /// notification is attempted, so a failed publish never replays a
    /// movement on the next tick.
    pub async fn tick(&self, job: MarketJob) -> Result<()> {
        debug!("Tick scheduled at {}", job.0);

        let new_value = self.quotes.fetch_index().await?;
        let mut guard = self.last_value.lock().await;
        // The first tick has nothing to compare against and counts as flat.
        let last_value = guard.unwrap_or(new_value);
        *guard = Some(new_value);
        drop(guard);

        let movement = Movement::classify(last_value, new_value);
        let now = Local::now();
        match status_message(movement, new_value, &now) {
            None => {
                info!(
                    "A Bovespa não mudou :| - {:.2} às {}",
                    new_value,
                    now.format("%I:%M %p")
                );
            }
            Some(msg) => {
                info!("{}", msg);
                self.notifier.publish(&msg).await;
            }
        }
        Ok(())
    }
}

async fn execute(job: MarketJob, svc: Data<MonitorService>) {
    match svc.tick(job).await {
        Ok(_) => info!("Job executed successfully"),
        Err(e) => error!("Failed to execute job: {}", e),
    }
}

/// Run the monitor worker until shutdown.
pub async fn run(config: &Config) -> Result<()> {
    let schedule = Schedule::from_str(&config.cron)
        .map_err(|e| anyhow::anyhow!("Invalid cron expression {:?}: {}", config.cron, e))?;
    let notifier: Arc<dyn Notifier> = Arc::new(TwitterNotifier::from_env()?);
    let quotes = QuoteClient::new()?;

    info!("Starting SMSB worker with cronjob: {}", config.cron);

    let worker = WorkerBuilder::new("smsb")
        .enable_tracing()
        // Shed overlapping ticks instead of queueing them
        .layer(LoadShedLayer::new())
        .data(MonitorService::new(quotes, notifier))
        .backend(CronStream::new(schedule))
        .build_fn(execute);

    Monitor::new()
        .register(worker)
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Monitor failed: {}", e))?;

    Ok(())
}
