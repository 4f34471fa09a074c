use crate::types::{IqSample, IQ_ZERO};

/// Fractional rate converter from the internal video rate to the output rate.
///
/// The caller drives it in two steps per output sample: `advance` says how many new internal
/// samples are needed, the caller `push`es them, then `interpolate` produces the output sample.
/// Interpolation is cubic (Hermite) over the last four internal samples.
#[derive(Debug, Clone)]
pub struct Resampler {
    /// Internal samples per output sample.
    distance: f64,
    /// Fractional position between the two middle samples of the history, in [0, 1).
    remain: f64,
    history: [IqSample; 4],
    passthrough: bool,
}

impl Resampler {
    pub fn new(internal_rate: u32, output_rate: u32) -> Self {
        let mut resampler = Self {
            distance: 1.0,
            remain: 0.0,
            history: [IQ_ZERO; 4],
            passthrough: true,
        };
        resampler.set_rates(internal_rate, output_rate);
        resampler
    }

    /// Change the conversion ratio. The history is kept so the signal stays continuous, and
    /// the fractional position too unless the ratio actually changes.
    pub fn set_rates(&mut self, internal_rate: u32, output_rate: u32) {
        let passthrough = internal_rate == output_rate;
        let distance = internal_rate.max(1) as f64 / output_rate.max(1) as f64;
        if passthrough != self.passthrough || distance != self.distance {
            self.remain = 0.0;
        }
        self.passthrough = passthrough;
        self.distance = distance;
    }

    /// Internal samples consumed per output sample.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// The fractional distance to the next internal sample.
    pub fn remain(&self) -> f64 {
        self.remain
    }

    /// Step one output sample forward. Returns how many internal samples must be pushed
    /// before calling `interpolate`.
    pub fn advance(&mut self) -> u32 {
        if self.passthrough {
            return 1;
        }

        self.remain += self.distance;
        let whole = self.remain.floor();
        self.remain -= whole;
        debug_assert!((0.0..1.0).contains(&self.remain));
        whole as u32
    }

    /// Feed the next internal sample.
    pub fn push(&mut self, sample: IqSample) {
        self.history.copy_within(1.., 0);
        self.history[3] = sample;
    }

    /// The output sample at the current fractional position.
    pub fn interpolate(&self) -> IqSample {
        if self.passthrough {
            return self.history[3];
        }

        let h = &self.history;
        let mu = self.remain as f32;
        let a0 = -0.5 * h[0] + 1.5 * h[1] - 1.5 * h[2] + 0.5 * h[3];
        let a1 = h[0] - 2.5 * h[1] + 2.0 * h[2] - 0.5 * h[3];
        let a2 = -0.5 * h[0] + 0.5 * h[2];
        let a3 = h[1];

        ((a0 * mu + a1) * mu + a2) * mu + a3
    }
}
