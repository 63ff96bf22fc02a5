use std::time::{Duration, Instant};

const SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Frame rate over the last completed sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSample {
    pub fps: f32,
    pub frame_ms: f32,
}

/// Counts rendered frames and publishes a sample once per second.
#[derive(Debug)]
pub struct FrameStats {
    window_start: Instant,
    frames: u32,
}

impl FrameStats {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
        }
    }

    /// Records one frame; returns a fresh sample when a window closes.
    pub fn record_frame(&mut self, now: Instant) -> Option<StatsSample> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < SAMPLE_WINDOW {
            return None;
        }
        let seconds = elapsed.as_secs_f32();
        let sample = StatsSample {
            fps: self.frames as f32 / seconds,
            frame_ms: seconds * 1000.0 / self.frames as f32,
        };
        self.window_start = now;
        self.frames = 0;
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_once_per_window() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        for frame in 1..60 {
            let now = start + Duration::from_millis(frame * 16);
            assert!(stats.record_frame(now).is_none());
        }
        let sample = stats
            .record_frame(start + Duration::from_millis(1000))
            .expect("window closed");
        assert!((sample.fps - 60.0).abs() < 1e-3);
        assert!((sample.frame_ms - 1000.0 / 60.0).abs() < 1e-3);
        assert!(stats
            .record_frame(start + Duration::from_millis(1016))
            .is_none());
    }
}
