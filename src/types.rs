use num_complex::Complex;

/// The floating point type to use for signal calculations. Video levels are normalized to
/// [0, 1] and every oscillator keeps its phase wrapped to one cycle, so f32 is precise enough
/// for the whole data path.
pub type SignalFloat = f32;

/// Not really a type, but the PI constant to use with SignalFloat.
pub const PI: SignalFloat = std::f64::consts::PI as SignalFloat;

/// One full cycle in radians.
pub const TAU: SignalFloat = 2.0 * PI;

/// A complex baseband (I/Q) sample.
pub type IqSample = Complex<SignalFloat>;

/// The value of a video signal sample, between ultra-black (0) and white.
pub type VideoLevel = SignalFloat;

/// A normalized image intensity, 0 for black and 1 for white.
pub type Intensity = SignalFloat;

/// The I/Q sample used for silence.
pub const IQ_ZERO: IqSample = Complex { re: 0.0, im: 0.0 };
