use std::collections::HashMap;
use std::time::Instant;

/// Observer for capture-loop events.
///
/// The loop reports per-stage timings and metrics through this trait so
/// front ends can choose how much of it to surface.
pub trait CaptureLogger: Send {
    /// Called once per captured frame with the running frame count.
    fn frame(&mut self, count: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces found).
    fn metric(&mut self, name: &str, value: f64);

    /// Emit an end-of-loop summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullCaptureLogger;

impl CaptureLogger for NullCaptureLogger {
    fn frame(&mut self, _count: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Running {
    count: usize,
    total: f64,
}

impl Running {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Aggregates timings and metrics and reports them through `log`.
///
/// The loop is unbounded, so only running totals are kept. A progress line
/// goes out every `throttle_frames` frames.
pub struct LogCaptureLogger {
    throttle_frames: usize,
    timings: HashMap<String, Running>,
    metrics: HashMap<String, Running>,
    start_time: Instant,
    frames: usize,
}

impl LogCaptureLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames;
        let mut lines = vec![format!(
            "Capture summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, running) in stages {
            let pct = if elapsed_ms > 0.0 {
                running.total / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {:6.1}ms  total {:7.0}ms  ({pct:4.1}%)",
                running.mean(),
                running.total
            ));
        }

        let mut metrics: Vec<_> = self.metrics.iter().collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));
        for (name, running) in metrics {
            lines.push(format!("  {name}: avg {:.2}", running.mean()));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn mean_timing(&self, stage: &str) -> Option<f64> {
        self.timings.get(stage).map(Running::mean)
    }

    pub fn mean_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(Running::mean)
    }
}

impl Default for LogCaptureLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl CaptureLogger for LogCaptureLogger {
    fn frame(&mut self, count: usize) {
        self.frames = count;
        if count % self.throttle_frames == 0 {
            let secs = self.start_time.elapsed().as_secs_f64();
            let fps = if secs > 0.0 { count as f64 / secs } else { 0.0 };
            log::info!("Captured {count} frames ({fps:.1} fps)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullCaptureLogger;
        logger.frame(1);
        logger.timing("estimate", 5.0);
        logger.metric("faces", 1.0);
        logger.summary();
    }

    #[test]
    fn test_timing_keeps_running_mean() {
        let mut logger = LogCaptureLogger::new(10);
        logger.timing("estimate", 20.0);
        logger.timing("estimate", 30.0);
        logger.timing("read", 5.0);

        assert_relative_eq!(logger.mean_timing("estimate").unwrap(), 25.0);
        assert_relative_eq!(logger.mean_timing("read").unwrap(), 5.0);
        assert!(logger.mean_timing("resize").is_none());
    }

    #[test]
    fn test_metric_keeps_running_mean() {
        let mut logger = LogCaptureLogger::new(10);
        logger.metric("faces", 0.0);
        logger.metric("faces", 1.0);
        assert_relative_eq!(logger.mean_metric("faces").unwrap(), 0.5);
    }

    #[test]
    fn test_summary_none_when_empty() {
        assert!(LogCaptureLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_summary_lists_stages_sorted() {
        let mut logger = LogCaptureLogger::new(10);
        logger.frame(1);
        logger.timing("read", 2.0);
        logger.timing("estimate", 8.0);
        logger.metric("faces", 1.0);

        let text = logger.summary_string().unwrap();
        assert!(text.starts_with("Capture summary (1 frames"));
        let estimate_at = text.find("estimate").unwrap();
        let read_at = text.find("read").unwrap();
        assert!(estimate_at < read_at);
        assert!(text.contains("faces: avg 1.00"));
    }

    #[test]
    fn test_throttle_floor_is_one() {
        let mut logger = LogCaptureLogger::new(0);
        logger.frame(3);
        assert_eq!(logger.throttle_frames, 1);
    }
}
