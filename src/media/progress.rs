use crate::utils::format_speed;
use rand::Rng;
use std::{
    fmt,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

const MAX_SIMULATED_CHUNK: usize = 64 * 1024;
const SIMULATED_CHUNKS: usize = 20;
const SPEED_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    Connecting,
    Downloading,
    Finalizing,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Preparing => "preparing",
            Stage::Connecting => "connecting",
            Stage::Downloading => "downloading",
            Stage::Finalizing => "finalizing",
            Stage::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub percent: f64,
    pub stage: Stage,
    pub speed: Option<String>,
}

pub type ProgressSender = mpsc::Sender<ProgressUpdate>;

/// Sends an update. A dropped receiver only means nobody is watching.
pub async fn report(tx: &ProgressSender, percent: f64, stage: Stage, speed: Option<String>) {
    let _ = tx
        .send(ProgressUpdate {
            percent,
            stage,
            speed,
        })
        .await;
}

pub fn simulated_chunk_size(total: usize) -> usize {
    (total / SIMULATED_CHUNKS).clamp(1, MAX_SIMULATED_CHUNK)
}

/// 5..95 while a synthetic buffer is being "transferred".
pub fn simulated_percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 95.0;
    }
    (done as f64 / total as f64 * 90.0 + 5.0).min(95.0)
}

/// 15..90 while a real response body streams in.
pub fn streamed_percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 15.0;
    }
    (done as f64 / total as f64 * 85.0 + 15.0).min(90.0)
}

/// Walks `total` bytes in fixed chunks on a timer, reporting percentages and
/// a speed derived from the chunk size. No I/O happens here.
pub async fn simulate(total: usize, tx: &ProgressSender) {
    let chunk = simulated_chunk_size(total);
    let mut done = 0;

    while done < total {
        let len = chunk.min(total - done);
        done += len;

        let speed = format_speed(len as f64 / 1024.0 / 0.1);
        report(
            tx,
            simulated_percent(done, total),
            Stage::Downloading,
            Some(speed),
        )
        .await;

        let delay = rand::rng().random_range(50..=100);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

/// Throughput over the last sampling window of a real transfer.
pub struct SpeedMeter {
    last_sample: Instant,
    last_bytes: u64,
}

impl SpeedMeter {
    pub fn new() -> Self {
        Self {
            last_sample: Instant::now(),
            last_bytes: 0,
        }
    }

    /// Returns a formatted speed at most once per sampling window.
    pub fn sample(&mut self, done: u64) -> Option<String> {
        let elapsed = self.last_sample.elapsed();
        if elapsed < SPEED_SAMPLE_INTERVAL {
            return None;
        }

        let bytes = done.saturating_sub(self.last_bytes);
        let mb_per_sec = bytes as f64 / elapsed.as_secs_f64() / 1024.0 / 1024.0;
        self.last_sample = Instant::now();
        self.last_bytes = done;
        Some(format!("{mb_per_sec:.1} MB/s"))
    }
}
