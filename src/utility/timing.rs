// ============================================
// TIMING UTILITY
// ============================================
// Usage:
//   let timer = Timer::start("OI pipeline"); ... timer.stop();
//   Timer::section("LTP pipeline");
// ============================================

use colored::Colorize;
use std::time::{Duration, Instant};

/// Wall-clock timer for a pipeline stage. Reports on `stop`, or on drop if
/// never stopped.
pub struct Timer {
    name: String,
    start: Instant,
    stopped: bool,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            stopped: false,
        }
    }

    /// Stop and report
    pub fn stop(mut self) -> Duration {
        let duration = self.start.elapsed();
        self.report(duration);
        self.stopped = true;
        duration
    }

    fn report(&self, duration: Duration) {
        let ms = duration.as_millis();
        let label = Self::label(ms);
        if ms < 1000 {
            println!("{} {} - {}ms", label, self.name.as_str().cyan(), ms);
        } else {
            println!("{} {} - {:.2}s", label, self.name.as_str().cyan(), duration.as_secs_f64());
        }
    }

    fn label(ms: u128) -> &'static str {
        match ms {
            0..=100 => "⚡",
            101..=1000 => "✅",
            1001..=10000 => "⏱",
            _ => "🐌",
        }
    }

    /// Banner used to group the output of one pipeline
    pub fn section(name: impl Into<String>) {
        let name = name.into();
        println!("\n{}", "=".repeat(60).blue());
        println!("{}", name.green().bold());
        println!("{}", "=".repeat(60).blue());
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if !self.stopped {
            self.report(self.start.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reports_elapsed() {
        let timer = Timer::start("sleep");
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.stop() >= Duration::from_millis(5));
    }

    #[test]
    fn test_labels_by_duration() {
        assert_eq!(Timer::label(20), "⚡");
        assert_eq!(Timer::label(400), "✅");
        assert_eq!(Timer::label(2500), "⏱");
        assert_eq!(Timer::label(60_000), "🐌");
    }
}
