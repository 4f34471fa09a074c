use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use clap::Parser;
use log::info;
use atv_mod::types::{IqSample, SignalFloat, IQ_ZERO};
use atv_mod::{AtvGenerator, Config, InputSource, Modulation, Standard};

/// The number of samples generated per write.
const BLOCK_SIZE: usize = 4096;

#[derive(Parser, Debug)]
#[command(author, version, about = "Analog TV baseband generator, writes interleaved f32 I/Q")]
struct Args {
    /// JSON configuration file. Takes precedence over the signal options below.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output sample rate in samples per second.
    #[arg(long, default_value_t = 2_000_000)]
    sample_rate: u32,

    /// Carrier offset from the center frequency, in Hz.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    carrier_offset: i64,

    /// Bandwidth of the modulated signal, in Hz.
    #[arg(long, default_value_t = 1_000_000.0)]
    bandwidth: f32,

    /// pal625, pal525 or pal312p.
    #[arg(long, default_value = "pal625")]
    standard: Standard,

    /// uniform, hbars, vbars, chessboard, hgradient, vgradient or image. The video input needs
    /// frames pushed by a host application and is not available here.
    #[arg(long, default_value = "hbars")]
    input: InputSource,

    /// am or fm.
    #[arg(long, default_value = "am")]
    modulation: Modulation,

    /// Level of the uniform input, from black (0) to white (1).
    #[arg(long, default_value_t = 0.5)]
    uniform_level: f32,

    /// FM frequency swing between levels 0 and 1, as a fraction of the bandwidth.
    #[arg(long, default_value_t = 0.5)]
    fm_excursion: f32,

    /// Picture for the image input.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Number of frames to generate.
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Output file, standard output if absent.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl Args {
    /// The generator configuration described by the arguments.
    fn config(&self) -> Result<Config, Box<dyn Error>> {
        let config = match &self.config {
            Some(path) => serde_json::from_reader(File::open(path)?)?,
            None => self.signal_config(),
        };

        if config.input == InputSource::Video {
            return Err("the video input has no frame source on the command line".into());
        }
        Ok(config)
    }

    fn signal_config(&self) -> Config {
        Config {
            output_sample_rate: self.sample_rate,
            carrier_offset: self.carrier_offset,
            bandwidth: self.bandwidth,
            standard: self.standard,
            input: self.input,
            uniform_level: self.uniform_level,
            modulation: self.modulation,
            muted: false,
            fm_excursion: self.fm_excursion,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging.
    env_logger::init();

    let args = Args::parse();
    let config = args.config()?;

    // Create the generator and load the picture.
    let mut generator = AtvGenerator::new(config);
    if let Some(path) = &args.image {
        generator.control().configure_image_file(path);
        generator.apply(true);
    }
    generator.set_level_observer(|rms: SignalFloat, peak: SignalFloat, count: u32| {
        info!("level over {} samples: rms {:.3}, peak {:.3}", count, rms, peak);
    });

    // Work out how many output samples the requested frames take.
    let config = generator.running_config().clone();
    let geometry = generator.geometry();
    let frame_samples = geometry.ticks_per_frame() as f64 * config.output_sample_rate as f64
        / geometry.internal_rate as f64;
    let total = (frame_samples * args.frames as f64).ceil() as u64;
    info!(
        "generating {} frames, {} samples at {} S/s",
        args.frames, total, config.output_sample_rate
    );

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(sink);

    let mut block = vec![IQ_ZERO; BLOCK_SIZE];
    let mut remaining = total;
    while remaining > 0 {
        let count = remaining.min(BLOCK_SIZE as u64) as usize;
        generator.pull_block(&mut block[..count]);
        write_iq(&mut writer, &block[..count])?;
        remaining -= count as u64;
    }
    writer.flush()?;

    Ok(())
}

/// Write samples as interleaved little endian f32 I/Q.
fn write_iq(writer: &mut impl Write, samples: &[IqSample]) -> io::Result<()> {
    for sample in samples {
        writer.write_all(&sample.re.to_le_bytes())?;
        writer.write_all(&sample.im.to_le_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_options() {
        let args = Args::try_parse_from(["atv-mod", "--standard", "pal525", "--input", "vgradient", "--carrier-offset", "-250000"])
            .expect("valid arguments");
        let config = args.config().expect("valid config");
        assert_eq!(config.standard, Standard::Pal525);
        assert_eq!(config.input, InputSource::VerticalGradient);
        assert_eq!(config.carrier_offset, -250_000);
    }

    #[test]
    fn test_video_input_is_rejected() {
        let args = Args::try_parse_from(["atv-mod", "--input", "video"]).expect("valid arguments");
        assert!(args.config().is_err());
    }

    #[test]
    fn test_unknown_input_is_rejected() {
        assert!(Args::try_parse_from(["atv-mod", "--input", "snow"]).is_err());
    }
}
