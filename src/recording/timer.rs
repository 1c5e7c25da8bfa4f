//! Workout stopwatch with pause/resume.

/// Elapsed-time tracker for a workout.
///
/// Times are wall-clock milliseconds passed in by the caller, so the timer
/// itself never reads a clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkoutTimer {
    running: bool,
    start_time: Option<i64>,
    end_time: Option<i64>,
}

impl WorkoutTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start a fresh workout, or resume a stopped one.
    ///
    /// Resuming shifts the start time forward by the paused duration so
    /// the pause does not count as elapsed time.
    pub fn start(&mut self, now: i64) {
        if self.running {
            return;
        }
        match (self.start_time, self.end_time.take()) {
            (Some(start), Some(end)) => self.start_time = Some(start + (now - end)),
            _ => self.start_time = Some(now),
        }
        self.running = true;
    }

    /// Stop (pause) the workout without resetting it.
    pub fn stop(&mut self, now: i64) {
        if !self.running {
            return;
        }
        self.running = false;
        self.end_time = Some(now);
    }

    /// Start when stopped, stop when running.
    pub fn toggle(&mut self, now: i64) {
        if self.running {
            self.stop(now);
        } else {
            self.start(now);
        }
    }

    /// Forget the workout entirely.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Active time in milliseconds.
    pub fn elapsed_ms(&self, now: i64) -> i64 {
        match (self.start_time, self.end_time) {
            (Some(start), _) if self.running => now - start,
            (Some(start), Some(end)) => end - start,
            _ => 0,
        }
    }
}

/// Render milliseconds as `HH:MM:SS`.
pub fn format_elapsed(milliseconds: i64) -> String {
    let total_seconds = milliseconds.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
