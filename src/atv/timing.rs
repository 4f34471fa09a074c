use crate::types::VideoLevel;
use super::{
    intensity_to_level, Field, ImagePosition, ImageSource, LineKind, LineZone, StandardGeometry,
    SyncLine, BLACK_LEVEL, ULTRA_BLACK_LEVEL,
};

/// The position of the generator in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingCursor {
    /// Sample index in the line.
    pub horizontal: u32,
    /// Line index in the frame.
    pub line: u32,
    /// The field the current line belongs to.
    pub field: Field,
}

impl TimingCursor {
    /// The start of a frame.
    pub const START: TimingCursor = TimingCursor { horizontal: 0, line: 0, field: Field::Even };
}

/// The result of one internal tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub level: VideoLevel,
    /// True when this tick was the last one of a frame: the cursor is back at the start and
    /// configuration changes can be applied.
    pub frame_boundary: bool,
}

/// The line and field timing state machine: produces one video level per internal tick.
#[derive(Debug, Clone)]
pub struct VideoTimer {
    geometry: StandardGeometry,
    cursor: TimingCursor,
}

impl VideoTimer {
    /// Create a timer at the start of a frame.
    pub fn new(geometry: StandardGeometry) -> Self {
        Self {
            geometry,
            cursor: TimingCursor::START,
        }
    }

    pub fn geometry(&self) -> &StandardGeometry {
        &self.geometry
    }

    pub fn cursor(&self) -> TimingCursor {
        self.cursor
    }

    /// Whether the cursor is at the start of a frame.
    pub fn at_frame_start(&self) -> bool {
        self.cursor.horizontal == 0 && self.cursor.line == 0
    }

    /// Replace the geometry. With `reset` the cursor goes back to the start of a frame,
    /// otherwise it is kept, folded into the new line and frame sizes.
    pub fn set_geometry(&mut self, geometry: StandardGeometry, reset: bool) {
        debug_assert!(geometry.is_partitioned());
        self.geometry = geometry;

        if reset {
            self.cursor = TimingCursor::START;
        } else {
            let horizontal = self.cursor.horizontal % self.geometry.horizontal_points;
            let line = self.cursor.line % self.geometry.line_count;
            let (field, _) = self.geometry.field_of_line(line);
            self.cursor = TimingCursor { horizontal, line, field };
        }
    }

    /// Produce the level at the cursor, then advance it by one sample.
    pub fn tick(&mut self, source: &ImageSource) -> Tick {
        let level = self.level(source);
        let frame_boundary = self.advance();
        Tick { level, frame_boundary }
    }

    /// The level at the cursor.
    pub fn level(&self, source: &ImageSource) -> VideoLevel {
        let geometry = &self.geometry;
        let horizontal = self.cursor.horizontal;
        let field = self.cursor.field;
        let field_line = match field {
            Field::Even => self.cursor.line,
            Field::Odd => self.cursor.line - geometry.even_field_lines,
        };

        match geometry.line_kind(field, field_line) {
            LineKind::Sync(pattern) => self.sync_line_level(pattern),
            LineKind::Blank => {
                if horizontal < geometry.sync_width {
                    ULTRA_BLACK_LEVEL
                } else {
                    BLACK_LEVEL
                }
            }
            LineKind::Image(row) => match geometry.zone(horizontal) {
                LineZone::Sync => ULTRA_BLACK_LEVEL,
                LineZone::BackPorch | LineZone::FrontPorch => BLACK_LEVEL,
                LineZone::Image => {
                    let column = horizontal - geometry.sync_width - geometry.back_porch_width;
                    let intensity = source.intensity_at(ImagePosition { field, row, column });
                    intensity_to_level(intensity)
                }
            },
        }
    }

    /// The level of a vertical sync line. Long pulses stay low for a half line minus a sync
    /// width, equalizing pulses for the field sync width, both twice per line.
    fn sync_line_level(&self, pattern: SyncLine) -> VideoLevel {
        let geometry = &self.geometry;
        let horizontal = self.cursor.horizontal;
        let half_line = geometry.half_line();
        let long_end = half_line - geometry.sync_width;
        let equalizing_end = geometry.field_sync_width;

        let low = match pattern {
            SyncLine::Long => horizontal % half_line < long_end,
            SyncLine::Equalizing => horizontal % half_line < equalizing_end,
            SyncLine::LongThenEqualizing => {
                if horizontal < half_line {
                    horizontal < long_end
                } else {
                    horizontal - half_line < equalizing_end
                }
            }
            SyncLine::EqualizingThenLong => {
                if horizontal < half_line {
                    horizontal < equalizing_end
                } else {
                    horizontal < geometry.horizontal_points - geometry.sync_width
                }
            }
            SyncLine::EqualizingThenBlank => horizontal < equalizing_end,
            SyncLine::BlankThenEqualizing => {
                if horizontal < half_line {
                    horizontal < geometry.sync_width
                } else {
                    horizontal - half_line < equalizing_end
                }
            }
        };

        if low {
            ULTRA_BLACK_LEVEL
        } else {
            BLACK_LEVEL
        }
    }

    /// Move the cursor one sample forward. Returns true when the frame wrapped.
    fn advance(&mut self) -> bool {
        let geometry = &self.geometry;
        let cursor = &mut self.cursor;

        cursor.horizontal += 1;
        if cursor.horizontal < geometry.horizontal_points {
            return false;
        }

        cursor.horizontal = 0;
        cursor.line += 1;

        if cursor.line < geometry.line_count {
            if geometry.interlaced && cursor.line == geometry.even_field_lines {
                cursor.field = Field::Odd;
            }
            false
        } else {
            cursor.line = 0;
            cursor.field = Field::Even;
            true
        }
    }
}
