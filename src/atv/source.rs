use std::sync::Arc;
use crate::types::{Intensity, SignalFloat};
use super::{Field, InputSource, StandardGeometry, BAR_COUNT};

/// A rectangular grid of 8 bit intensities, row major. This is all the generator knows about
/// pictures: decoding them is somebody else's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityGrid {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl IntensityGrid {
    /// Wrap a pixel buffer. Returns `None` if the buffer does not hold exactly
    /// `width * height` pixels or if the grid would be empty.
    pub fn from_raw(width: usize, height: usize, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return None;
        }

        Some(Self { width, height, pixels })
    }

    /// Create a grid from a function of (row, column). Zero sizes are raised to 1.
    pub fn from_fn(width: usize, height: usize, mut pixel: impl FnMut(usize, usize) -> u8) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = Vec::with_capacity(width * height);
        for row in 0..height {
            for column in 0..width {
                pixels.push(pixel(row, column));
            }
        }

        Self { width, height, pixels }
    }

    /// Create a grid with every pixel set to the same value.
    pub fn filled(width: usize, height: usize, value: u8) -> Option<Self> {
        Self::from_raw(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The pixel at the given row and column, if inside the grid.
    pub fn get(&self, row: usize, column: usize) -> Option<u8> {
        if row < self.height && column < self.width {
            Some(self.pixels[row * self.width + column])
        } else {
            None
        }
    }
}

/// A position inside the image part of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePosition {
    pub field: Field,
    /// Image row within the field.
    pub row: u32,
    /// Sample index within the image part of the line.
    pub column: u32,
}

/// The provider of the image content, built for one geometry. Each variant carries what it
/// needs to answer `intensity_at` without looking anything else up.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Uniform {
        level: Intensity,
    },
    HorizontalBars {
        bar_width: u32,
    },
    VerticalBars {
        bar_lines: u32,
    },
    Chessboard {
        bar_width: u32,
        bar_lines: u32,
        level: Intensity,
    },
    HorizontalGradient {
        line_width: u32,
    },
    VerticalGradient {
        rows: u32,
    },
    /// A static image or a live video frame, already resized to the geometry.
    Picture {
        grid: Option<Arc<IntensityGrid>>,
        interlaced: bool,
        fallback: Intensity,
    },
}

impl ImageSource {
    /// Build the source for an input kind. `image` and `video` are the latest resized grids;
    /// a grid that does not match the geometry's image size is ignored, which makes the source
    /// fall back to the uniform level.
    pub fn new(
        input: InputSource,
        uniform_level: Intensity,
        geometry: &StandardGeometry,
        image: Option<&Arc<IntensityGrid>>,
        video: Option<&Arc<IntensityGrid>>,
    ) -> Self {
        match input {
            InputSource::Uniform => ImageSource::Uniform { level: uniform_level },
            InputSource::HorizontalBars => ImageSource::HorizontalBars {
                bar_width: geometry.horizontal_bar_width,
            },
            InputSource::VerticalBars => ImageSource::VerticalBars {
                bar_lines: geometry.vertical_bar_lines,
            },
            InputSource::Chessboard => ImageSource::Chessboard {
                bar_width: geometry.horizontal_bar_width,
                bar_lines: geometry.vertical_bar_lines,
                level: uniform_level,
            },
            InputSource::HorizontalGradient => ImageSource::HorizontalGradient {
                line_width: geometry.image_line_width,
            },
            InputSource::VerticalGradient => ImageSource::VerticalGradient {
                rows: geometry.field_image_lines,
            },
            InputSource::Image | InputSource::Video => {
                let grid = if input == InputSource::Image { image } else { video };
                let grid = grid
                    .filter(|grid| {
                        grid.width() == geometry.image_line_width as usize
                            && grid.height() == geometry.image_line_count as usize
                    })
                    .cloned();

                ImageSource::Picture {
                    grid,
                    interlaced: geometry.interlaced,
                    fallback: uniform_level,
                }
            }
        }
    }

    /// Whether a picture backed source has a usable picture. Always false for the patterns.
    pub fn image_ok(&self) -> bool {
        matches!(self, ImageSource::Picture { grid: Some(_), .. })
    }

    /// The intensity at a position of the image part of a field, in [0, 1].
    pub fn intensity_at(&self, position: ImagePosition) -> Intensity {
        let ImagePosition { field, row, column } = position;

        match *self {
            ImageSource::Uniform { level } => level,
            ImageSource::HorizontalBars { bar_width } => bar_step(column / bar_width),
            ImageSource::VerticalBars { bar_lines } => bar_step(row / bar_lines),
            ImageSource::Chessboard { bar_width, bar_lines, level } => {
                if (row / bar_lines + column / bar_width) % 2 == 0 {
                    0.0
                } else {
                    level
                }
            }
            ImageSource::HorizontalGradient { line_width } => {
                column as SignalFloat / line_width as SignalFloat
            }
            ImageSource::VerticalGradient { rows } => row as SignalFloat / rows as SignalFloat,
            ImageSource::Picture { ref grid, interlaced, fallback } => {
                // Interlaced fields take every other row of the full frame.
                let frame_row = if interlaced { 2 * row + field.frame_row_offset() } else { row };

                grid.as_ref()
                    .and_then(|grid| grid.get(frame_row as usize, column as usize))
                    .map_or(fallback, |pixel| pixel as SignalFloat / 255.0)
            }
        }
    }
}

/// The intensity of the bar with the given index, the last bar being white.
fn bar_step(bar: u32) -> Intensity {
    bar.min(BAR_COUNT) as SignalFloat / BAR_COUNT as SignalFloat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atv::Standard;

    fn geometry() -> StandardGeometry {
        StandardGeometry::new(Standard::Pal625, 1_000_000)
    }

    fn at(field: Field, row: u32, column: u32) -> ImagePosition {
        ImagePosition { field, row, column }
    }

    #[test]
    fn test_grid_rejects_mismatched_buffer() {
        assert!(IntensityGrid::from_raw(3, 2, vec![0; 5]).is_none());
        assert!(IntensityGrid::from_raw(0, 0, vec![]).is_none());
        let grid = IntensityGrid::from_raw(3, 2, vec![1, 2, 3, 4, 5, 6]).expect("valid grid");
        assert_eq!(grid.get(1, 2), Some(6));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn test_uniform() {
        let source = ImageSource::new(InputSource::Uniform, 0.25, &geometry(), None, None);
        assert_eq!(source.intensity_at(at(Field::Odd, 100, 17)), 0.25);
        assert!(!source.image_ok());
    }

    #[test]
    fn test_horizontal_bars_rise_to_white() {
        let geometry = geometry();
        let source = ImageSource::new(InputSource::HorizontalBars, 0.5, &geometry, None, None);
        assert_eq!(source.intensity_at(at(Field::Even, 0, 0)), 0.0);
        let mut previous = 0.0;
        for column in 0..geometry.image_line_width {
            let intensity = source.intensity_at(at(Field::Even, 0, column));
            assert!(intensity >= previous && intensity <= 1.0);
            previous = intensity;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn test_chessboard_alternates() {
        let geometry = geometry();
        let source = ImageSource::new(InputSource::Chessboard, 0.8, &geometry, None, None);
        let width = geometry.horizontal_bar_width;
        let lines = geometry.vertical_bar_lines;
        assert_eq!(source.intensity_at(at(Field::Even, 0, 0)), 0.0);
        assert_eq!(source.intensity_at(at(Field::Even, 0, width)), 0.8);
        assert_eq!(source.intensity_at(at(Field::Even, lines, 0)), 0.8);
        assert_eq!(source.intensity_at(at(Field::Even, lines, width)), 0.0);
    }

    #[test]
    fn test_gradients_stay_in_range() {
        let geometry = geometry();
        let horizontal = ImageSource::new(InputSource::HorizontalGradient, 0.5, &geometry, None, None);
        let vertical = ImageSource::new(InputSource::VerticalGradient, 0.5, &geometry, None, None);
        let last_column = geometry.image_line_width - 1;
        let last_row = geometry.field_image_lines - 1;
        assert_eq!(horizontal.intensity_at(at(Field::Even, 0, 0)), 0.0);
        assert!(horizontal.intensity_at(at(Field::Even, 0, last_column)) < 1.0);
        assert_eq!(vertical.intensity_at(at(Field::Even, 0, 0)), 0.0);
        assert!(vertical.intensity_at(at(Field::Even, last_row, 0)) < 1.0);
    }

    #[test]
    fn test_picture_without_grid_falls_back_to_uniform() {
        let source = ImageSource::new(InputSource::Image, 0.4, &geometry(), None, None);
        assert!(!source.image_ok());
        assert_eq!(source.intensity_at(at(Field::Even, 3, 3)), 0.4);
    }

    #[test]
    fn test_picture_of_wrong_size_is_ignored() {
        let grid = Arc::new(IntensityGrid::filled(10, 10, 255).expect("valid grid"));
        let source = ImageSource::new(InputSource::Image, 0.4, &geometry(), Some(&grid), None);
        assert!(!source.image_ok());
    }

    #[test]
    fn test_interlaced_fields_read_alternate_rows() {
        let geometry = geometry();
        let width = geometry.image_line_width as usize;
        let height = geometry.image_line_count as usize;
        let pixels = (0..height).flat_map(|row| vec![if row % 2 == 0 { 0 } else { 255 }; width]).collect();
        let grid = Arc::new(IntensityGrid::from_raw(width, height, pixels).expect("valid grid"));

        let source = ImageSource::new(InputSource::Video, 0.5, &geometry, None, Some(&grid));
        assert!(source.image_ok());
        // The odd field is the top field.
        assert_eq!(source.intensity_at(at(Field::Odd, 7, 5)), 0.0);
        assert_eq!(source.intensity_at(at(Field::Even, 7, 5)), 1.0);

        // The image input does not see video frames.
        let image = ImageSource::new(InputSource::Image, 0.5, &geometry, None, Some(&grid));
        assert!(!image.image_ok());
    }
}
