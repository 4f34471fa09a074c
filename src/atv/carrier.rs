use crate::types::{IqSample, SignalFloat, VideoLevel, TAU};
use super::{Modulation, FM_CENTER_LEVEL};

/// Keep a phase within one cycle, [0, 2π).
fn wrap_phase(phase: SignalFloat) -> SignalFloat {
    let wrapped = phase.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Numerically controlled oscillator: a phase accumulator advanced by a fixed increment per
/// sample.
#[derive(Debug, Clone)]
pub struct Nco {
    phase: SignalFloat,
    phase_inc: SignalFloat,
}

impl Nco {
    /// Create an oscillator at the given frequency for the given sample rate.
    pub fn new(frequency: f64, sample_rate: u32) -> Self {
        let mut nco = Self { phase: 0.0, phase_inc: 0.0 };
        nco.set_frequency(frequency, sample_rate);
        nco
    }

    /// Change the frequency, keeping the phase continuous.
    pub fn set_frequency(&mut self, frequency: f64, sample_rate: u32) {
        let cycles_per_sample = frequency / sample_rate.max(1) as f64;
        self.phase_inc = wrap_phase((std::f64::consts::TAU * cycles_per_sample) as SignalFloat);
    }

    pub fn phase(&self) -> SignalFloat {
        self.phase
    }

    /// Phase increment per sample, in [0, 2π).
    pub fn phase_inc(&self) -> SignalFloat {
        self.phase_inc
    }

    /// The next unit phasor of the oscillator.
    pub fn next_iq(&mut self) -> IqSample {
        let (sin, cos) = self.phase.sin_cos();
        self.phase = wrap_phase(self.phase + self.phase_inc);
        IqSample::new(cos, sin)
    }
}

/// Turns video levels into complex samples. Modulation runs at the internal video rate and
/// produces a zero frequency carrier; the carrier oscillator then shifts the resampled signal
/// to the carrier offset at the output rate.
#[derive(Debug, Clone)]
pub struct CarrierModulator {
    modulation: Modulation,
    /// FM phase increment per unit of level away from the center level.
    deviation_per_level: SignalFloat,
    /// The integrated FM deviation phase.
    fm_phase: SignalFloat,
    carrier: Nco,
}

impl CarrierModulator {
    pub fn new(modulation: Modulation, carrier: Nco) -> Self {
        Self {
            modulation,
            deviation_per_level: 0.0,
            fm_phase: 0.0,
            carrier,
        }
    }

    pub fn modulation(&self) -> Modulation {
        self.modulation
    }

    pub fn set_modulation(&mut self, modulation: Modulation) {
        self.modulation = modulation;
    }

    /// Set the FM deviation. At the extreme levels (0 and 1) the instantaneous frequency is
    /// `excursion * bandwidth / 2` away from the carrier.
    pub fn set_deviation(&mut self, excursion: f32, bandwidth: f32, internal_rate: u32) {
        let peak_deviation_hz = excursion as f64 * bandwidth as f64;
        self.deviation_per_level =
            (std::f64::consts::TAU * peak_deviation_hz / internal_rate.max(1) as f64) as SignalFloat;
    }

    /// Retune the carrier oscillator, which runs at the output rate.
    pub fn set_carrier(&mut self, offset: i64, output_sample_rate: u32) {
        self.carrier.set_frequency(offset as f64, output_sample_rate);
    }

    pub fn carrier(&self) -> &Nco {
        &self.carrier
    }

    /// The FM phase advance for a level, affine in the level and zero at the center level.
    pub fn fm_phase_increment(&self, level: VideoLevel) -> SignalFloat {
        (level - FM_CENTER_LEVEL) * self.deviation_per_level
    }

    /// The integrated FM deviation phase.
    pub fn fm_phase(&self) -> SignalFloat {
        self.fm_phase
    }

    /// Modulate one video level into a zero frequency carrier sample.
    pub fn modulate(&mut self, level: VideoLevel) -> IqSample {
        match self.modulation {
            Modulation::Am => IqSample::new(level, 0.0),
            Modulation::Fm => {
                self.fm_phase = wrap_phase(self.fm_phase + self.fm_phase_increment(level));
                IqSample::from_polar(1.0, self.fm_phase)
            }
        }
    }

    /// Shift a zero frequency sample to the carrier offset, advancing the carrier oscillator.
    pub fn shift(&mut self, baseband: IqSample) -> IqSample {
        baseband * self.carrier.next_iq()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PI;

    #[test]
    fn test_nco_unit_amplitude_and_wrapped_phase() {
        let mut nco = Nco::new(123_456.0, 1_000_000);
        for _ in 0..10_000 {
            let sample = nco.next_iq();
            assert!((sample.norm() - 1.0).abs() < 1e-5);
            assert!((0.0..TAU).contains(&nco.phase()));
        }
    }

    #[test]
    fn test_nco_negative_frequency() {
        let mut nco = Nco::new(-250_000.0, 1_000_000);
        assert!((nco.phase_inc() - 1.5 * PI).abs() < 1e-5);
        nco.next_iq();
        let quarter = nco.next_iq();
        assert!((quarter.re - 0.0).abs() < 1e-5 && (quarter.im + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_offset_is_dc() {
        let mut modulator = CarrierModulator::new(Modulation::Am, Nco::new(0.0, 1_000_000));
        let baseband = modulator.modulate(0.65);
        let shifted = modulator.shift(baseband);
        assert!((shifted.re - 0.65).abs() < 1e-6 && shifted.im.abs() < 1e-6);
    }

    #[test]
    fn test_am_magnitude_is_monotonic_in_level() {
        let mut previous = -1.0;
        for step in 0..=100 {
            let level = step as SignalFloat / 100.0;
            // A fresh oscillator for every level keeps the carrier phase fixed.
            let mut modulator = CarrierModulator::new(Modulation::Am, Nco::new(200_000.0, 1_000_000));
            let baseband = modulator.modulate(level);
            let sample = modulator.shift(baseband);
            assert!(sample.norm() >= previous);
            previous = sample.norm();
        }
    }

    #[test]
    fn test_fm_increment_is_affine() {
        let mut modulator = CarrierModulator::new(Modulation::Fm, Nco::new(0.0, 1_000_000));
        modulator.set_deviation(0.5, 1_000_000.0, 1_000_000);
        let at = |level| modulator.fm_phase_increment(level);
        assert!((at(1.0) - PI / 2.0).abs() < 1e-5);
        assert!((at(0.0) + PI / 2.0).abs() < 1e-5);
        let slope = at(0.8) - at(0.7);
        assert!(((at(0.3) - at(0.2)) - slope).abs() < 1e-5);
    }

    #[test]
    fn test_fm_center_level_keeps_unmodulated_phase() {
        let mut modulator = CarrierModulator::new(Modulation::Fm, Nco::new(100_000.0, 1_000_000));
        modulator.set_deviation(0.5, 1_000_000.0, 1_000_000);
        let start = modulator.fm_phase();
        for _ in 0..64 {
            let sample = modulator.modulate(FM_CENTER_LEVEL);
            assert!((sample.norm() - 1.0).abs() < 1e-5);
        }
        assert!((modulator.fm_phase() - start).abs() < 1e-6);
    }

    #[test]
    fn test_fm_has_constant_envelope() {
        let mut modulator = CarrierModulator::new(Modulation::Fm, Nco::new(100_000.0, 1_000_000));
        modulator.set_deviation(0.5, 1_000_000.0, 1_000_000);
        for step in 0..1000 {
            let level = (step % 100) as SignalFloat / 100.0;
            let baseband = modulator.modulate(level);
            let sample = modulator.shift(baseband);
            assert!((sample.norm() - 1.0).abs() < 1e-4);
        }
    }
}
