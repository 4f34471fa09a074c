use std::sync::atomic::Ordering;
use std::sync::Arc;
use log::{debug, info};
use crate::types::{IqSample, SignalFloat, VideoLevel, IQ_ZERO};
use super::control::Shared;
use super::{
    AtvControl, CarrierModulator, Config, ImageSource, IntensityGrid, LevelMonitor, LevelObserver,
    Nco, Resampler, StandardGeometry, TimingCursor, VideoTimer, LEVEL_WINDOW_SAMPLES,
};

/// The analog TV signal generator: the data path producing one complex sample per call.
///
/// Configuration reaches it through the `AtvControl` handles returned by `control`, and is
/// applied as a whole at the next frame boundary. Nothing on the per sample path blocks,
/// allocates or fails.
#[derive(Debug)]
pub struct AtvGenerator {
    shared: Arc<Shared>,
    /// The configuration the signal is currently generated with.
    running: Config,
    timer: VideoTimer,
    source: ImageSource,
    image: Option<Arc<IntensityGrid>>,
    video: Option<Arc<IntensityGrid>>,
    modulator: CarrierModulator,
    resampler: Resampler,
    level: LevelMonitor,
}

impl AtvGenerator {
    /// Create a generator running the given configuration from the start of a frame.
    pub fn new(config: Config) -> Self {
        let config = config.validated(&Config::default());
        let geometry = config.geometry();

        let mut generator = Self {
            shared: Arc::new(Shared::new(config.clone())),
            source: ImageSource::new(config.input, config.uniform_level, &geometry, None, None),
            timer: VideoTimer::new(geometry),
            image: None,
            video: None,
            modulator: CarrierModulator::new(config.modulation, Nco::new(0.0, config.output_sample_rate)),
            resampler: Resampler::new(config.internal_rate(), config.output_sample_rate),
            level: LevelMonitor::new(LEVEL_WINDOW_SAMPLES),
            running: config,
        };
        generator.apply(true);
        generator
    }

    /// A handle to configure this generator, from any thread.
    pub fn control(&self) -> AtvControl {
        AtvControl::new(self.shared.clone())
    }

    /// Install the observer of the periodic output level reports.
    pub fn set_level_observer(&mut self, observer: impl LevelObserver + 'static) {
        self.level.set_observer(Some(Box::new(observer)));
    }

    /// The configuration the signal is currently generated with.
    pub fn running_config(&self) -> &Config {
        &self.running
    }

    pub fn geometry(&self) -> &StandardGeometry {
        self.timer.geometry()
    }

    pub fn cursor(&self) -> TimingCursor {
        self.timer.cursor()
    }

    /// Whether the image or video input has a usable picture.
    pub fn image_ok(&self) -> bool {
        self.source.image_ok()
    }

    /// The recent average of the output magnitude squared.
    pub fn mag_sq(&self) -> SignalFloat {
        self.level.mag_sq()
    }

    /// Apply what the control side has staged. Without `force` this only happens at the
    /// start of a frame, and is deferred to the next frame if the control side holds the
    /// pending slot. With `force` the configuration is applied now and the frame restarts
    /// when the standard changes. Returns whether anything was applied.
    pub fn apply(&mut self, force: bool) -> bool {
        if !force && !(self.timer.at_frame_start() && self.shared.pending.load(Ordering::Acquire)) {
            return false;
        }

        let shared = self.shared.clone();
        let mut slot = match shared.slot.try_lock() {
            Some(slot) => slot,
            None if force => shared.slot.lock(),
            None => {
                debug!("pending configuration busy, retrying next frame");
                return false;
            }
        };
        self.shared.pending.store(false, Ordering::Release);

        if slot.image_changed {
            slot.image_changed = false;
            let replaced = std::mem::replace(&mut self.image, slot.image.clone());
            slot.retired[0] = replaced;
        }
        if let Some(video) = slot.video.take() {
            let replaced = self.video.replace(video);
            slot.retired[1] = replaced;
        }

        let config = if slot.config_changed || force {
            slot.config_changed = false;
            Some(slot.config.clone())
        } else {
            None
        };
        drop(slot);

        match config {
            Some(config) => self.apply_config(config, force),
            None => self.rebuild_source(),
        }
        true
    }

    fn apply_config(&mut self, config: Config, force: bool) {
        let previous = &self.running;
        let standard_changed = config.standard != previous.standard;

        if force || standard_changed || config.internal_rate() != self.timer.geometry().internal_rate {
            self.timer.set_geometry(config.geometry(), force || standard_changed);
        }

        self.resampler.set_rates(config.internal_rate(), config.output_sample_rate);
        self.modulator.set_carrier(config.carrier_offset, config.output_sample_rate);
        self.modulator.set_modulation(config.modulation);
        self.modulator
            .set_deviation(config.fm_excursion, config.bandwidth, config.internal_rate());

        if force {
            let geometry = self.timer.geometry();
            info!(
                "running {:?} at {} S/s internal, {} S/s output: {} lines of {} points",
                config.standard,
                geometry.internal_rate,
                config.output_sample_rate,
                geometry.line_count,
                geometry.horizontal_points
            );
        }

        self.running = config;
        self.rebuild_source();
    }

    fn rebuild_source(&mut self) {
        self.source = ImageSource::new(
            self.running.input,
            self.running.uniform_level,
            self.timer.geometry(),
            self.image.as_ref(),
            self.video.as_ref(),
        );
    }

    /// Produce the next modulated sample at the internal rate.
    fn next_tick(&mut self) -> IqSample {
        let tick = self.timer.tick(&self.source);
        if tick.frame_boundary {
            self.apply(false);
        }
        self.modulator.modulate(tick.level)
    }

    /// Produce the next output sample.
    pub fn pull(&mut self) -> IqSample {
        for _ in 0..self.resampler.advance() {
            let sample = self.next_tick();
            self.resampler.push(sample);
        }

        let sample = self.modulator.shift(self.resampler.interpolate());
        let sample = if self.running.muted { IQ_ZERO } else { sample };
        self.level.feed(sample);
        sample
    }

    /// Fill a buffer with consecutive output samples.
    pub fn pull_block(&mut self, samples: &mut [IqSample]) {
        for sample in samples.iter_mut() {
            *sample = self.pull();
        }
    }

    /// Fill a buffer with consecutive video levels at the internal rate, without modulation.
    /// This advances the same timing as `pull`.
    pub fn pull_video(&mut self, levels: &mut [VideoLevel]) {
        for level in levels.iter_mut() {
            let tick = self.timer.tick(&self.source);
            if tick.frame_boundary {
                self.apply(false);
            }
            *level = tick.level;
        }
    }
}

impl Default for AtvGenerator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atv::{InputSource, Modulation, Standard, BLACK_LEVEL};

    #[test]
    fn test_new_applies_config() {
        let config = Config {
            standard: Standard::Pal525,
            output_sample_rate: 2_000_000,
            ..Config::default()
        };
        let generator = AtvGenerator::new(config.clone());
        assert_eq!(generator.running_config(), &config);
        assert_eq!(generator.geometry().internal_rate, 1_008_000);
        assert_eq!(generator.cursor(), TimingCursor::START);
    }

    #[test]
    fn test_staged_change_waits_for_frame_boundary() {
        let mut generator = AtvGenerator::default();
        let control = generator.control();
        let mut levels = vec![0.0; 1000];
        generator.pull_video(&mut levels);

        control.configure(1e6, Standard::Pal625, InputSource::Uniform, 0.2, Modulation::Am, false);
        assert!(!generator.apply(false));
        assert_eq!(generator.running_config().input, InputSource::HorizontalBars);

        let rest = generator.geometry().ticks_per_frame() as usize - 1000;
        let mut levels = vec![0.0; rest];
        generator.pull_video(&mut levels);
        assert_eq!(generator.running_config().input, InputSource::Uniform);
        assert_eq!(generator.running_config().uniform_level, 0.2);
    }

    #[test]
    fn test_busy_slot_defers_apply() {
        let mut generator = AtvGenerator::default();
        let control = generator.control();
        control.configure_fm_excursion(0.25);

        let shared = generator.shared.clone();
        let guard = shared.slot.lock();
        assert!(!generator.apply(false));
        drop(guard);

        assert!(generator.apply(false));
        assert_eq!(generator.running_config().fm_excursion, 0.25);
    }

    #[test]
    fn test_muted_output_is_silent_but_keeps_time() {
        let mut generator = AtvGenerator::new(Config {
            muted: true,
            ..Config::default()
        });
        for _ in 0..500 {
            assert_eq!(generator.pull(), IQ_ZERO);
        }
        assert_eq!(generator.cursor().horizontal, 500 % 64);
    }

    #[test]
    fn test_first_samples_are_sync() {
        let mut generator = AtvGenerator::default();
        let mut levels = vec![1.0; 30];
        generator.pull_video(&mut levels);
        assert!(levels[..27].iter().all(|&level| level == 0.0));
        assert!(levels[27..].iter().all(|&level| level == BLACK_LEVEL));
    }
}
