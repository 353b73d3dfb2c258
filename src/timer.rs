//! Wall-clock stopwatch on top of `environment::time()`
use crate::environment::time;

/// Measures the span between `start()` and `stop()` as observed by the calling worker.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: f64,
}

impl Stopwatch {
    /// Start measuring.
    pub fn start() -> Stopwatch {
        Stopwatch { started: time() }
    }

    /// Elapsed seconds since `start()`. Never negative.
    pub fn stop(&self) -> f64 {
        (time() - self.started).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_finite_and_non_negative() {
        let watch = Stopwatch::start();
        let elapsed = watch.stop();
        assert!(elapsed.is_finite());
        assert!(elapsed >= 0.0);
        assert!(watch.stop() >= elapsed);
    }
}
