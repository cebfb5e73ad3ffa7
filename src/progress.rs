use std::time::{Duration, Instant};

/// Throttled progress reporting for the long loops: at most one line per
/// second on stderr. A `total` of zero means the loop is open-ended and no
/// percentage is shown.
pub(crate) struct Progress {
    task_name: &'static str,
    unit: &'static str,
    total: usize,
    ticks: usize,
    started: Instant,
    last_message: Instant,
    enabled: bool,
}

impl Progress {
    pub(crate) fn new(task_name: &'static str, unit: &'static str, total: usize, enabled: bool) -> Self {
        let now = Instant::now();
        Progress { task_name, unit, total, ticks: 0, started: now, last_message: now, enabled }
    }

    pub(crate) fn tick(&mut self, score: f64) {
        self.ticks += 1;
        if !self.enabled {
            return;
        }
        if self.last_message.elapsed() > Duration::from_secs(1) {
            self.last_message = Instant::now();
            self.message(score);
        }
    }

    pub(crate) fn done(&mut self, score: f64) {
        if self.enabled {
            self.message(score);
        }
    }

    fn message(&self, score: f64) {
        let elapsed = self.started.elapsed().as_secs_f64().max(f64::EPSILON);
        let per_second = self.ticks as f64 / elapsed;
        if self.total > 0 {
            let percent = (100.0 * self.ticks as f64 / self.total as f64) as usize;
            let remaining = self.total.saturating_sub(self.ticks) as f64 / per_second;
            eprintln!(
                "[progress] {}{:>3}%, {:.1} {}/sec, remaining: {:.0} sec: {}",
                self.task_name, percent, per_second, self.unit, remaining, score
            );
        } else {
            eprintln!(
                "[progress] {}{:.1} {}/sec, total {:.0} sec: {}",
                self.task_name,
                per_second,
                self.unit,
                elapsed.ceil(),
                score
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_accumulate_silently_when_disabled() {
        let mut progress = Progress::new("Testing ", "units", 10, false);
        for _ in 0..10 {
            progress.tick(1.0);
        }
        assert_eq!(progress.ticks, 10);
        progress.done(1.0);
    }
}
