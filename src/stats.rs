use std::{
    fmt,
    time::{Duration, Instant},
};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Frame counters, reported and reset once per interval.
#[derive(Debug)]
pub struct FrameStats {
    period_start: Instant,
    frames: u32,
    composed: u32,
    skipped: u32,
    views_rendered: u64,
    pass_time: Duration,
    peak_pass_time: Duration,
    total_composed: u64,
    total_skipped: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub fps: f64,
    pub mspf: f64,
    pub composed: u32,
    pub skipped: u32,
    pub views_rendered: u64,
    pub avg_pass_ms: f64,
    pub peak_pass_ms: f64,
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} mspf = {:.1} fps", self.mspf, self.fps)?;
        if self.composed > 0 || self.skipped > 0 {
            write!(
                f,
                ", quilts {} ({} skipped, {} views), pass avg {:.2} ms peak {:.2} ms",
                self.composed, self.skipped, self.views_rendered, self.avg_pass_ms, self.peak_pass_ms
            )?;
        }
        Ok(())
    }
}

impl FrameStats {
    pub fn new(now: Instant) -> Self {
        Self {
            period_start: now,
            frames: 0,
            composed: 0,
            skipped: 0,
            views_rendered: 0,
            pass_time: Duration::default(),
            peak_pass_time: Duration::default(),
            total_composed: 0,
            total_skipped: 0,
        }
    }

    /// A window frame was drawn.
    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    /// A quilt was composed and presented.
    pub fn record_composed(&mut self, views_rendered: u32, pass_time: Duration) {
        self.composed += 1;
        self.total_composed += 1;
        self.views_rendered += u64::from(views_rendered);
        self.pass_time += pass_time;
        self.peak_pass_time = self.peak_pass_time.max(pass_time);
    }

    /// A quilt was not presented because composition or presentation failed.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
        self.total_skipped += 1;
    }

    pub fn total_composed(&self) -> u64 {
        self.total_composed
    }

    pub fn total_skipped(&self) -> u64 {
        self.total_skipped
    }

    /// Returns a report once a full interval has passed since the last one, and starts a new
    /// interval.
    pub fn take_report(&mut self, now: Instant) -> Option<FrameReport> {
        let elapsed = now.saturating_duration_since(self.period_start);
        if elapsed < REPORT_INTERVAL {
            return None;
        }

        let secs = elapsed.as_secs_f64();
        let avg_pass_ms = if self.composed > 0 {
            self.pass_time.as_secs_f64() * 1000.0 / f64::from(self.composed)
        } else {
            0.0
        };
        let report = FrameReport {
            fps: f64::from(self.frames) / secs,
            mspf: if self.frames > 0 {
                secs * 1000.0 / f64::from(self.frames)
            } else {
                0.0
            },
            composed: self.composed,
            skipped: self.skipped,
            views_rendered: self.views_rendered,
            avg_pass_ms,
            peak_pass_ms: self.peak_pass_time.as_secs_f64() * 1000.0,
        };

        self.period_start = now;
        self.frames = 0;
        self.composed = 0;
        self.skipped = 0;
        self.views_rendered = 0;
        self.pass_time = Duration::default();
        self.peak_pass_time = Duration::default();

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn no_report_before_interval() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        stats.record_frame();
        assert_eq!(stats.take_report(start + Duration::from_millis(500)), None);
    }

    #[test]
    fn report_averages_pass_times() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        for millis in &[4, 8, 6] {
            stats.record_frame();
            stats.record_composed(45, Duration::from_millis(*millis));
        }
        stats.record_frame();
        stats.record_skipped();

        let report = stats
            .take_report(start + Duration::from_secs(2))
            .expect("interval elapsed");
        assert_relative_eq!(report.fps, 2.0);
        assert_relative_eq!(report.mspf, 500.0);
        assert_eq!(report.composed, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.views_rendered, 135);
        assert_relative_eq!(report.avg_pass_ms, 6.0, epsilon = 1e-9);
        assert_relative_eq!(report.peak_pass_ms, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn report_starts_a_new_interval() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        stats.record_composed(45, Duration::from_millis(5));
        stats.record_skipped();

        let first = start + Duration::from_secs(1);
        assert!(stats.take_report(first).is_some());
        assert_eq!(stats.take_report(first + Duration::from_millis(10)), None);

        let report = stats
            .take_report(first + Duration::from_secs(1))
            .expect("second interval elapsed");
        assert_eq!(report.composed, 0);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.peak_pass_ms, 0.0);
        assert_eq!(stats.total_composed(), 1);
        assert_eq!(stats.total_skipped(), 1);
    }

    #[test]
    fn report_without_quilts_only_shows_frame_rate() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        for _ in 0..60 {
            stats.record_frame();
        }
        let report = stats
            .take_report(start + Duration::from_secs(1))
            .expect("interval elapsed");
        assert_eq!(report.to_string(), "16.67 mspf = 60.0 fps");
    }
}
