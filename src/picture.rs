//! Turning picture files into intensity grids sized for a standard. This runs on the control
//! side only; the generator itself never sees an image library type.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use image::{imageops::FilterType, GrayImage, Luma};
use log::debug;
use crate::atv::{IntensityGrid, StandardGeometry};

/// Error loading a picture.
#[derive(Debug, thiserror::Error)]
pub enum PictureError {
    #[error("cannot read image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has no pixels")]
    Empty,
}

/// Load an image file as a grayscale intensity grid at its own resolution.
pub fn load_intensity(path: impl AsRef<Path>) -> Result<IntensityGrid, PictureError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| PictureError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    to_grid(image.into_luma8())
}

/// Decode an in-memory image (e.g. obtained from include_bytes!) as a grayscale intensity grid.
pub fn decode_intensity(buf: &[u8]) -> Result<IntensityGrid, PictureError> {
    let image = image::io::Reader::new(Cursor::new(buf))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;

    to_grid(image.into_luma8())
}

/// Resize a grid to the image part of a frame of the given geometry: one pixel per image
/// sample of a line, one row per image line of the full frame.
pub fn fit_to_geometry(grid: &IntensityGrid, geometry: &StandardGeometry) -> IntensityGrid {
    resize(grid, geometry.image_line_width, geometry.image_line_count)
}

/// Resize a grid with a triangle (bilinear) filter.
pub fn resize(grid: &IntensityGrid, width: u32, height: u32) -> IntensityGrid {
    let (width, height) = (width.max(1), height.max(1));
    if grid.width() == width as usize && grid.height() == height as usize {
        return grid.clone();
    }

    let original = GrayImage::from_fn(grid.width() as u32, grid.height() as u32, |x, y| {
        Luma([grid.get(y as usize, x as usize).unwrap_or(0)])
    });
    let resized = image::imageops::resize(&original, width, height, FilterType::Triangle);
    debug!(
        "resized picture {} x {} -> {} x {}",
        grid.width(),
        grid.height(),
        width,
        height
    );

    IntensityGrid::from_fn(width as usize, height as usize, |row, column| {
        resized.get_pixel(column as u32, row as u32).0[0]
    })
}

fn to_grid(image: GrayImage) -> Result<IntensityGrid, PictureError> {
    let (width, height) = image.dimensions();
    IntensityGrid::from_raw(width as usize, height as usize, image.into_raw()).ok_or(PictureError::Empty)
}
