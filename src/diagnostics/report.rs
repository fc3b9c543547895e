use crate::crdt::store::LwwStore;
use crate::crdt::types::{ReplicaId, Snapshot};

/// Metric name used for keys without a `:` separator.
pub const DEFAULT_METRIC: &str = "value";

/// One metric of a device, as shown in a state report.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReading {
    pub metric: String,
    pub value: f64,
    pub timestamp: i64,
    pub replica_id: ReplicaId,
}

/// Splits `<device>:<metric>` at the first `:`.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.split_once(':') {
        Some((device, metric)) => (device, metric),
        None => (key, DEFAULT_METRIC),
    }
}

/// Sort key for device names: `disp<N>` numerically first, everything else after, by name.
pub fn device_order(device: &str) -> (u8, i64, String) {
    if let Some(rest) = device.strip_prefix("disp")
        && let Ok(n) = rest.parse::<i64>()
    {
        return (0, n, device.to_string());
    }
    (1, i64::MAX, device.to_string())
}

/// Groups a snapshot by device. Devices and metrics come back sorted.
pub fn group_by_device(snapshot: &Snapshot) -> Vec<(String, Vec<MetricReading>)> {
    let mut grouped: Vec<(String, Vec<MetricReading>)> = Vec::new();

    let mut keys: Vec<&String> = snapshot.keys().collect();
    keys.sort_by_key(|key| {
        let (device, metric) = split_key(key);
        (device_order(device), metric.to_string())
    });

    for key in keys {
        let record = &snapshot[key];
        let (device, metric) = split_key(key);
        let reading = MetricReading {
            metric: metric.to_string(),
            value: record.value,
            timestamp: record.timestamp,
            replica_id: record.replica_id,
        };
        match grouped.last_mut() {
            Some((last, readings)) if last == device => readings.push(reading),
            _ => grouped.push((device.to_string(), vec![reading])),
        }
    }

    grouped
}

/// `metric=value@ts nid=replica, ...`
pub fn format_readings(readings: &[MetricReading]) -> String {
    readings
        .iter()
        .map(|r| {
            format!(
                "{}={:.2}@{} nid={}",
                r.metric, r.value, r.timestamp, r.replica_id
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Logs a grouped report of the store. Skips the snapshot entirely when info logging is off.
pub fn log_state(store: &LwwStore, title: &str) {
    if !tracing::enabled!(tracing::Level::INFO) {
        return;
    }
    log_snapshot(&store.snapshot(), title);
}

pub fn log_snapshot(snapshot: &Snapshot, title: &str) {
    let grouped = group_by_device(snapshot);
    tracing::info!("[state] {}: {} device(s)", title, grouped.len());
    for (device, readings) in grouped {
        tracing::info!("[state] {}: {}", device, format_readings(&readings));
    }
}
