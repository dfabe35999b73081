use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default sliding window for speed calculation.
const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Maximum retained samples.
const MAX_SAMPLES: usize = 128;

struct Sample {
    bytes: u64,
    at: Instant,
}

/// Transfer speed over a sliding window of byte-count samples.
///
/// Thread-safe so a streaming body can record samples from its chunk
/// callback while the owner reads the current rate.
pub struct SpeedCalculator {
    inner: Mutex<VecDeque<Sample>>,
    window: Duration,
}

impl SpeedCalculator {
    pub fn new(window: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            window: window.unwrap_or(DEFAULT_WINDOW),
        }
    }

    /// Records `bytes` transferred at the current instant.
    pub fn add_sample(&self, bytes: u64) {
        let mut samples = self.inner.lock().unwrap();
        let now = Instant::now();
        samples.push_back(Sample { bytes, at: now });

        if let Some(cutoff) = now.checked_sub(self.window) {
            while samples.front().is_some_and(|s| s.at < cutoff) {
                samples.pop_front();
            }
        }
        while samples.len() > MAX_SAMPLES {
            samples.pop_front();
        }
    }

    /// Average speed in bytes/second within the window.
    ///
    /// Returns 0.0 with fewer than two samples.
    pub fn bytes_per_second(&self) -> f64 {
        let samples = self.inner.lock().unwrap();
        let (Some(first), Some(last)) = (samples.front(), samples.back()) else {
            return 0.0;
        };
        let elapsed = last.at.duration_since(first.at);
        if samples.len() < 2 || elapsed.is_zero() {
            return 0.0;
        }
        let total: u64 = samples.iter().map(|s| s.bytes).sum();
        total as f64 / elapsed.as_secs_f64()
    }

    /// Estimated time to move `remaining_bytes` at the current rate.
    pub fn eta(&self, remaining_bytes: u64) -> Option<Duration> {
        let speed = self.bytes_per_second();
        if speed <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining_bytes as f64 / speed))
    }

    /// Drops all recorded samples.
    pub fn reset(&self) {
        self.inner.lock().unwrap().clear();
    }
}
