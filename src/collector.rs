//! Collector loop: gate check, fetch, classify, persist, sleep.
//!
//! Runs strictly sequentially on one task. Every per-cycle failure is
//! reduced to a log line; the only way out of [`Collector::run`] is the
//! process ending.

use std::time::Duration;

use chrono::{NaiveDateTime, Timelike, Utc};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::config::CollectorConfig;
use crate::error::CollectError;
use crate::gate::{self, GateDecision};
use crate::models::CycleRecord;
use crate::store;
use crate::upstream::WeatherClient;

// ---

/// What one iteration of the loop did and how long to sleep afterwards.
#[derive(Debug)]
pub enum Tick {
    /// Two rows were committed.
    Collected { record: CycleRecord, next: Duration },
    /// The attempt failed; nothing was written.
    Failed { error: CollectError, next: Duration },
    /// Too early; no attempt was made.
    NotDue { next: Duration },
}

impl Tick {
    pub fn next_sleep(&self) -> Duration {
        match self {
            Tick::Collected { next, .. } | Tick::Failed { next, .. } | Tick::NotDue { next } => {
                *next
            }
        }
    }
}

pub struct Collector {
    // ---
    client: WeatherClient,
    pool: SqlitePool,
    interval: Duration,
    margin: Duration,
}

impl Collector {
    // ---
    /// Build a collector that fetches with `cfg` and writes into `pool`.
    ///
    /// The pool must already carry the schema; see
    /// [`crate::schema::create_schema`].
    ///
    /// # Returns
    /// The collector, or the [`reqwest::Error`] raised while building the
    /// HTTP client (TLS backend initialisation).
    pub fn new(cfg: &CollectorConfig, pool: SqlitePool) -> Result<Self, reqwest::Error> {
        // ---
        Ok(Self {
            client: WeatherClient::new(cfg)?,
            pool,
            interval: cfg.interval,
            margin: cfg.margin,
        })
    }

    /// Loop forever, one [`tick`](Self::tick) per wake-up.
    pub async fn run(&self) {
        // ---
        info!(
            "Weather collector for {} running, interval {}",
            self.client.city(),
            gate::format_duration(self.interval)
        );

        loop {
            let tick = self.tick(Utc::now().naive_utc()).await;
            tokio::time::sleep(tick.next_sleep()).await;
        }
    }

    /// One gate check, and a collection when due.
    ///
    /// After a wait the gate is simply checked again, so the schedule stays
    /// one interval per sample instead of drifting by an extra interval.
    pub async fn tick(&self, now: NaiveDateTime) -> Tick {
        // ---
        let last = match store::last_reading_at(&self.pool).await {
            Ok(last) => last,
            Err(e) => {
                let error = CollectError::Storage(e);
                error!(kind = error.kind(), "Could not read last reading time: {}", error);
                return Tick::Failed {
                    error,
                    next: self.interval,
                };
            }
        };

        if let GateDecision::Wait(next) = gate::evaluate(last, now, self.interval, self.margin) {
            info!(
                "Waiting. {} left until the next permitted collection",
                gate::format_duration(next)
            );
            return Tick::NotDue { next };
        }

        match self.collect_once().await {
            Ok(record) => {
                info!(
                    city = self.client.city(),
                    "Weather OK: temp={}°C ({}), humidity={}%",
                    record.temperature.value,
                    record.temperature.status,
                    record.humidity.value
                );
                Tick::Collected {
                    record,
                    next: self.interval,
                }
            }
            Err(error) => {
                match &error {
                    CollectError::UpstreamData(_) => {
                        warn!(kind = error.kind(), "Extraction failed: {}", error)
                    }
                    _ => error!(kind = error.kind(), "Collection failed: {}", error),
                }
                Tick::Failed {
                    error,
                    next: self.interval,
                }
            }
        }
    }

    /// Fetch, classify and persist a single sample.
    ///
    /// The timestamp is taken after the fetch returns, as wall-clock UTC.
    pub async fn collect_once(&self) -> Result<CycleRecord, CollectError> {
        // ---
        let observation = self.client.fetch().await?;
        let record = observation.to_cycle_record(now_seconds());
        store::insert_cycle(&self.pool, &record).await?;
        Ok(record)
    }
}

/// Current UTC time truncated to whole seconds, the stored resolution.
fn now_seconds() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
