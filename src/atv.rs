mod carrier;
mod config;
mod control;
mod generator;
mod level;
mod resampler;
mod source;
mod standard;
mod timing;

pub use carrier::*;
pub use config::*;
pub use control::*;
pub use generator::*;
pub use level::*;
pub use resampler::*;
pub use source::*;
pub use standard::*;
pub use timing::*;

use crate::types::{SignalFloat, VideoLevel};

/// The level of sync pulses, below black.
pub const ULTRA_BLACK_LEVEL: VideoLevel = 0.0;

/// The level of black, used by the porches and by blanked lines.
pub const BLACK_LEVEL: VideoLevel = 0.3;

/// The distance between black and white. White is `BLACK_LEVEL + SPAN_LEVEL`.
pub const SPAN_LEVEL: VideoLevel = 0.7;

/// The highest level the video signal can take.
pub const WHITE_LEVEL: VideoLevel = BLACK_LEVEL + SPAN_LEVEL;

/// The video level around which the FM deviation is zero.
pub const FM_CENTER_LEVEL: VideoLevel = 0.5;

/// The number of bars in the bar and chessboard test patterns.
pub const BAR_COUNT: u32 = 6;

/// The number of output samples between two level reports (10ms at 1 MS/s).
pub const LEVEL_WINDOW_SAMPLES: u32 = 10_000;

/// The length of the moving average behind the always available magnitude reading.
pub const MAG_SQ_AVERAGE_LEN: usize = 16;

/// The length of a line in timing units. A timing unit is 1µs for 625 line standards and
/// 1/1.008µs for 525 line standards, which makes both 64 units long.
pub const LINE_TIME_UNITS: u32 = 64;

/// Map a normalized intensity to a video level between black and white.
pub fn intensity_to_level(intensity: SignalFloat) -> VideoLevel {
    BLACK_LEVEL + SPAN_LEVEL * intensity
}
