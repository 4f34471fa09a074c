use std::str::FromStr;
use serde::{Deserialize, Serialize};
use super::{Standard, StandardGeometry};

/// Error parsing one of the configuration selectors from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown standard {0:?}, expected pal625, pal525 or pal312p")]
    Standard(String),

    #[error("unknown input source {0:?}, expected uniform, hbars, vbars, chessboard, hgradient, vgradient, image or video")]
    InputSource(String),

    #[error("unknown modulation {0:?}, expected am or fm")]
    Modulation(String),
}

/// Where the image part of the lines comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InputSource {
    /// A uniform field at the configured uniform level.
    Uniform,
    /// Vertical stripes of increasing level from left to right.
    #[default]
    HorizontalBars,
    /// Horizontal stripes of increasing level from top to bottom.
    VerticalBars,
    Chessboard,
    HorizontalGradient,
    VerticalGradient,
    /// A static image loaded from a file.
    Image,
    /// Live video frames pushed by the collaborator.
    Video,
}

impl FromStr for InputSource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(InputSource::Uniform),
            "hbars" => Ok(InputSource::HorizontalBars),
            "vbars" => Ok(InputSource::VerticalBars),
            "chessboard" => Ok(InputSource::Chessboard),
            "hgradient" => Ok(InputSource::HorizontalGradient),
            "vgradient" => Ok(InputSource::VerticalGradient),
            "image" => Ok(InputSource::Image),
            "video" => Ok(InputSource::Video),
            _ => Err(ParseError::InputSource(s.to_string())),
        }
    }
}

/// How the video signal is impressed on the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Modulation {
    #[default]
    Am,
    Fm,
}

impl FromStr for Modulation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "am" => Ok(Modulation::Am),
            "fm" => Ok(Modulation::Fm),
            _ => Err(ParseError::Modulation(s.to_string())),
        }
    }
}

/// The generator configuration. The control side edits a pending copy, the data path runs
/// from its own copy which is replaced as a whole at a frame boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sample rate requested by the channelizer, in samples per second.
    pub output_sample_rate: u32,
    /// Carrier offset from the baseband center frequency, in Hz.
    pub carrier_offset: i64,
    /// Bandwidth of the modulated signal, in Hz.
    pub bandwidth: f32,
    pub standard: Standard,
    pub input: InputSource,
    /// Level between black (0) and white (1) of the uniform field, also the fallback level of
    /// the image sources.
    pub uniform_level: f32,
    pub modulation: Modulation,
    /// Output silence while still running the signal.
    pub muted: bool,
    /// FM frequency swing between levels 0 and 1, as a fraction of the bandwidth.
    pub fm_excursion: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_sample_rate: 1_000_000,
            carrier_offset: 0,
            bandwidth: 1_000_000.0,
            standard: Standard::Pal625,
            input: InputSource::HorizontalBars,
            uniform_level: 0.5,
            modulation: Modulation::Am,
            muted: false,
            fm_excursion: 0.5,
        }
    }
}

impl Config {
    /// Bring every field back in range. Levels are clamped; values that cannot be clamped to
    /// anything meaningful (a zero rate, a non finite number) keep their previous value.
    pub fn validated(mut self, previous: &Config) -> Self {
        if self.output_sample_rate == 0 {
            self.output_sample_rate = previous.output_sample_rate;
        }

        let nyquist = (self.output_sample_rate / 2) as i64;
        self.carrier_offset = self.carrier_offset.clamp(-nyquist, nyquist);

        if !self.bandwidth.is_finite() || self.bandwidth <= 0.0 {
            self.bandwidth = previous.bandwidth;
        }

        self.uniform_level = clamp_unit(self.uniform_level, previous.uniform_level);
        self.fm_excursion = clamp_unit(self.fm_excursion, previous.fm_excursion);
        self
    }

    /// The internal video rate this configuration runs at.
    pub fn internal_rate(&self) -> u32 {
        self.standard.internal_rate(self.output_sample_rate)
    }

    /// The geometry this configuration runs with.
    pub fn geometry(&self) -> StandardGeometry {
        StandardGeometry::new(self.standard, self.internal_rate())
    }
}

fn clamp_unit(value: f32, previous: f32) -> f32 {
    if value.is_nan() {
        previous
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_clamps_levels() {
        let previous = Config::default();
        let config = Config {
            uniform_level: 1.7,
            fm_excursion: -0.2,
            ..Config::default()
        }
        .validated(&previous);
        assert_eq!(config.uniform_level, 1.0);
        assert_eq!(config.fm_excursion, 0.0);
    }

    #[test]
    fn test_validation_keeps_previous_on_nonsense() {
        let previous = Config {
            output_sample_rate: 2_000_000,
            bandwidth: 1.5e6,
            uniform_level: 0.25,
            ..Config::default()
        };
        let config = Config {
            output_sample_rate: 0,
            bandwidth: f32::NAN,
            uniform_level: f32::NAN,
            ..Config::default()
        }
        .validated(&previous);
        assert_eq!(config.output_sample_rate, 2_000_000);
        assert_eq!(config.bandwidth, 1.5e6);
        assert_eq!(config.uniform_level, 0.25);
    }

    #[test]
    fn test_validation_limits_carrier_offset() {
        let config = Config {
            carrier_offset: 3_000_000,
            ..Config::default()
        }
        .validated(&Config::default());
        assert_eq!(config.carrier_offset, 500_000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "standard": "Pal525", "input": "Chessboard" }"#)
            .expect("valid config");
        assert_eq!(config.standard, Standard::Pal525);
        assert_eq!(config.input, InputSource::Chessboard);
        assert_eq!(config.output_sample_rate, Config::default().output_sample_rate);
    }

    #[test]
    fn test_parse_selectors() {
        assert_eq!("VGradient".parse::<InputSource>().ok(), Some(InputSource::VerticalGradient));
        assert_eq!("fm".parse::<Modulation>().ok(), Some(Modulation::Fm));
        assert_eq!(
            "vsb".parse::<Modulation>(),
            Err(ParseError::Modulation("vsb".to_string()))
        );
    }
}
