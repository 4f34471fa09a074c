use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::{info, warn};
use parking_lot::Mutex;
use crate::picture;
use super::{Config, InputSource, IntensityGrid, Modulation, Standard};

/// Everything the control side has staged for the data path.
#[derive(Debug, Default)]
pub(crate) struct PendingSlot {
    pub config: Config,
    pub config_changed: bool,
    /// The picture as loaded, kept to refit it when the geometry changes.
    pub picture: Option<Arc<IntensityGrid>>,
    /// The picture fitted to the pending geometry, `None` when loading failed.
    pub image: Option<Arc<IntensityGrid>>,
    pub image_changed: bool,
    /// The latest live video frame, fitted to the pending geometry.
    pub video: Option<Arc<IntensityGrid>>,
    /// Grids the data path has replaced. They are dropped on the control side.
    pub retired: [Option<Arc<IntensityGrid>>; 2],
}

/// State shared by the control handles and the generator.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    /// Set when the slot holds something the data path has not applied yet.
    pub pending: AtomicBool,
    pub slot: Mutex<PendingSlot>,
}

impl Shared {
    pub fn new(config: Config) -> Self {
        Self {
            pending: AtomicBool::new(true),
            slot: Mutex::new(PendingSlot {
                config,
                config_changed: true,
                ..PendingSlot::default()
            }),
        }
    }
}

/// The control side of a generator. Cheap to clone and safe to use from any thread; changes
/// are staged and reach the signal at the next frame boundary.
#[derive(Debug, Clone)]
pub struct AtvControl {
    shared: Arc<Shared>,
}

impl AtvControl {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Stage the main signal parameters.
    pub fn configure(
        &self,
        bandwidth: f32,
        standard: Standard,
        input: InputSource,
        uniform_level: f32,
        modulation: Modulation,
        muted: bool,
    ) {
        self.stage(|config| {
            config.bandwidth = bandwidth;
            config.standard = standard;
            config.input = input;
            config.uniform_level = uniform_level;
            config.modulation = modulation;
            config.muted = muted;
        });
    }

    /// Stage the parameters coming from the channelizer.
    pub fn configure_channel(&self, output_sample_rate: u32, carrier_offset: i64) {
        self.stage(|config| {
            config.output_sample_rate = output_sample_rate;
            config.carrier_offset = carrier_offset;
        });
    }

    /// Stage the FM frequency swing, as a fraction of the bandwidth.
    pub fn configure_fm_excursion(&self, fm_excursion: f32) {
        self.stage(|config| config.fm_excursion = fm_excursion);
    }

    /// Stage a whole configuration.
    pub fn configure_config(&self, new_config: Config) {
        self.stage(|config| *config = new_config);
    }

    /// Load the picture used by the image input. Never fails: on error the picture is
    /// cleared, the image input falls back to the uniform level and `false` is returned.
    pub fn configure_image_file(&self, path: impl AsRef<Path>) -> bool {
        // Decode outside the lock, it can take a while.
        match picture::load_intensity(path.as_ref()) {
            Ok(grid) => {
                info!(
                    "loaded picture {} ({} x {})",
                    path.as_ref().display(),
                    grid.width(),
                    grid.height()
                );
                self.configure_image(Some(grid));
                true
            }
            Err(err) => {
                warn!("{}, falling back to the uniform level", err);
                self.configure_image(None);
                false
            }
        }
    }

    /// Set (or clear) the picture of the image input from an already decoded grid.
    pub fn configure_image(&self, grid: Option<IntensityGrid>) {
        let picture = grid.map(Arc::new);

        // Fitting holds the lock; the data path skips a frame rather than wait for it.
        let mut slot = self.shared.slot.lock();
        slot.retired = Default::default();
        let geometry = slot.config.geometry();
        slot.image = picture
            .as_ref()
            .map(|grid| Arc::new(picture::fit_to_geometry(grid, &geometry)));
        slot.picture = picture;
        slot.image_changed = true;
        self.shared.pending.store(true, Ordering::Release);
    }

    /// Publish a live video frame for the video input. It is shown from the next frame on.
    pub fn push_video_frame(&self, frame: IntensityGrid) {
        let mut slot = self.shared.slot.lock();
        slot.retired = Default::default();
        let geometry = slot.config.geometry();
        slot.video = Some(Arc::new(picture::fit_to_geometry(&frame, &geometry)));
        self.shared.pending.store(true, Ordering::Release);
    }

    /// The configuration that will be running after the next frame boundary.
    pub fn pending_config(&self) -> Config {
        self.shared.slot.lock().config.clone()
    }

    fn stage(&self, edit: impl FnOnce(&mut Config)) {
        let mut slot = self.shared.slot.lock();
        slot.retired = Default::default();

        let previous = slot.config.clone();
        let mut config = previous.clone();
        edit(&mut config);
        let config = config.validated(&previous);
        if config == previous {
            return;
        }

        let geometry = config.geometry();
        if geometry != previous.geometry() {
            if let Some(picture) = slot.picture.clone() {
                slot.image = Some(Arc::new(picture::fit_to_geometry(&picture, &geometry)));
                slot.image_changed = true;
            }
            // A frame of the old size cannot be shown anymore.
            slot.video = None;
        }

        info!(
            "staged {:?} {:?} {:?} at {} S/s, carrier offset {} Hz",
            config.standard,
            config.input,
            config.modulation,
            config.output_sample_rate,
            config.carrier_offset
        );
        slot.config = config;
        slot.config_changed = true;
        self.shared.pending.store(true, Ordering::Release);
    }
}
