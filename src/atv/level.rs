use crate::types::{IqSample, SignalFloat};
use super::MAG_SQ_AVERAGE_LEN;

/// Receives the periodic level reports of the generator.
pub trait LevelObserver: Send {
    /// `rms` and `peak` are magnitudes in [0, 1], measured over `sample_count` samples.
    fn level_changed(&mut self, rms: SignalFloat, peak: SignalFloat, sample_count: u32);
}

impl<F> LevelObserver for F
where
    F: FnMut(SignalFloat, SignalFloat, u32) + Send,
{
    fn level_changed(&mut self, rms: SignalFloat, peak: SignalFloat, sample_count: u32) {
        self(rms, peak, sample_count)
    }
}

/// Moving average over the last `N` values, O(1) per value.
#[derive(Debug, Clone)]
pub struct MovingAverage<const N: usize> {
    buffer: [SignalFloat; N],
    index: usize,
    sum: f64,
}

impl<const N: usize> MovingAverage<N> {
    pub fn new() -> Self {
        Self {
            buffer: [0.0; N],
            index: 0,
            sum: 0.0,
        }
    }

    pub fn feed(&mut self, value: SignalFloat) {
        self.sum += value as f64 - self.buffer[self.index] as f64;
        self.buffer[self.index] = value;
        self.index = (self.index + 1) % N;
    }

    pub fn average(&self) -> SignalFloat {
        (self.sum / N as f64) as SignalFloat
    }
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Measures the output level: RMS and peak over fixed windows, reported to an observer, and a
/// short moving average of the magnitude squared that can be read at any time.
pub struct LevelMonitor {
    window: u32,
    count: u32,
    sum_squares: f64,
    peak: SignalFloat,
    mag_sq: MovingAverage<MAG_SQ_AVERAGE_LEN>,
    observer: Option<Box<dyn LevelObserver>>,
}

impl LevelMonitor {
    /// Create a monitor reporting every `window` samples.
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            count: 0,
            sum_squares: 0.0,
            peak: 0.0,
            mag_sq: MovingAverage::new(),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Option<Box<dyn LevelObserver>>) {
        self.observer = observer;
    }

    /// Account for one output sample.
    pub fn feed(&mut self, sample: IqSample) {
        let mag_sq = sample.norm_sqr();
        self.mag_sq.feed(mag_sq);
        self.sum_squares += mag_sq as f64;
        self.peak = self.peak.max(mag_sq.sqrt());
        self.count += 1;

        if self.count == self.window {
            let rms = (self.sum_squares / self.window as f64).sqrt() as SignalFloat;
            if let Some(observer) = self.observer.as_mut() {
                observer.level_changed(rms.min(1.0), self.peak.min(1.0), self.window);
            }
            self.count = 0;
            self.sum_squares = 0.0;
            self.peak = 0.0;
        }
    }

    /// The recent average of the magnitude squared.
    pub fn mag_sq(&self) -> SignalFloat {
        self.mag_sq.average()
    }
}

impl std::fmt::Debug for LevelMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelMonitor")
            .field("window", &self.window)
            .field("count", &self.count)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Reports = Arc<Mutex<Vec<(SignalFloat, SignalFloat, u32)>>>;

    fn observed_monitor(window: u32) -> (LevelMonitor, Reports) {
        let reports = Reports::default();
        let sink = reports.clone();
        let mut monitor = LevelMonitor::new(window);
        monitor.set_observer(Some(Box::new(move |rms: SignalFloat, peak: SignalFloat, count: u32| {
            sink.lock().unwrap().push((rms, peak, count));
        })));
        (monitor, reports)
    }

    #[test]
    fn test_constant_magnitude_reports_itself() {
        let (mut monitor, reports) = observed_monitor(1000);
        for step in 0..1000 {
            // Constant magnitude 0.6, rotating phase.
            monitor.feed(IqSample::from_polar(0.6, step as SignalFloat * 0.1));
        }
        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        let (rms, peak, count) = reports[0];
        assert!((rms - 0.6).abs() < 1e-5);
        assert!((peak - 0.6).abs() < 1e-5);
        assert_eq!(count, 1000);
    }

    #[test]
    fn test_windows_do_not_carry_over() {
        let (mut monitor, reports) = observed_monitor(100);
        for _ in 0..100 {
            monitor.feed(IqSample::new(0.9, 0.0));
        }
        for _ in 0..100 {
            monitor.feed(IqSample::new(0.1, 0.0));
        }
        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 2);
        assert!((reports[1].0 - 0.1).abs() < 1e-5);
        assert!((reports[1].1 - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_mag_sq_follows_recent_samples() {
        let mut monitor = LevelMonitor::new(10_000);
        for _ in 0..100 {
            monitor.feed(IqSample::new(1.0, 0.0));
        }
        assert!((monitor.mag_sq() - 1.0).abs() < 1e-6);
        for _ in 0..MAG_SQ_AVERAGE_LEN {
            monitor.feed(IqSample::new(0.0, 0.5));
        }
        assert!((monitor.mag_sq() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_moving_average_warm_up() {
        let mut average = MovingAverage::<4>::new();
        average.feed(4.0);
        assert_eq!(average.average(), 1.0);
        for _ in 0..4 {
            average.feed(2.0);
        }
        assert_eq!(average.average(), 2.0);
    }
}
