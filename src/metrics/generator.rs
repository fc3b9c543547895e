//! Synthetic metric producer.
//!
//! Simulates a set of devices that each report a fixed list of metrics on every tick. Keys are
//! `disp<N>:<metric>`, values are uniform in `[0, 100)`.

use super::ingest::LocalIngest;
use crate::diagnostics::report::log_state;

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_GENERATE_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_DEVICES: usize = 10;
pub const DEFAULT_METRICS: [&str; 2] = ["temperatura", "vibracao"];

pub struct MetricGenerator {
    ingest: Arc<LocalIngest>,
    devices: usize,
    metrics: Vec<String>,
    interval: Duration,
}

impl MetricGenerator {
    pub fn new(ingest: Arc<LocalIngest>, devices: usize, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            ingest,
            devices,
            metrics: DEFAULT_METRICS.iter().map(|m| m.to_string()).collect(),
            interval,
        })
    }

    pub fn device_key(device: usize, metric: &str) -> String {
        format!("disp{}:{}", device, metric)
    }

    /// Writes one value for every device/metric pair. Returns the number of writes.
    pub fn generate_once(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut written = 0;
        for device in 0..self.devices {
            for metric in &self.metrics {
                let value: f64 = rng.gen_range(0.0..100.0);
                self.ingest.record(Self::device_key(device, metric), value);
                written += 1;
            }
        }
        written
    }

    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        tracing::info!(
            "Metric generator started: {} device(s) x {} metric(s) every {:?}",
            self.devices,
            self.metrics.len(),
            self.interval
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.generate_once();
                    log_state(self.ingest.store(), "after local generation");
                }
            }
        }

        tracing::info!("Metric generator stopped");
    }
}
