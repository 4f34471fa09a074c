//! Analog television baseband signal generator.
//!
//! [`atv::AtvGenerator`] produces a composite video signal (line and field sync, blanking and
//! an image from a test pattern, a picture or live frames) amplitude or frequency modulated on
//! a carrier, one complex sample at a time, at whatever rate the channelizer asks for.
//! [`atv::AtvControl`] reconfigures it from other threads.

pub mod atv;
pub mod picture;
pub mod types;

pub use atv::{AtvControl, AtvGenerator, Config, InputSource, Modulation, Standard};
