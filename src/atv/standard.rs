use std::str::FromStr;
use serde::{Deserialize, Serialize};
use super::{ParseError, BAR_COUNT, LINE_TIME_UNITS};

/// A broadcast standard, selecting the line structure and the synchronization timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Standard {
    /// 625 lines, 25 interlaced frames per second (PAL B/G/H timings).
    #[default]
    Pal625,
    /// 525 lines, 30 interlaced frames per second (PAL-M timings).
    Pal525,
    /// 312 lines, 50 progressive frames per second, as output by home computers and game
    /// consoles on 625 line sets: every frame is an even field.
    Pal312p,
}

impl Standard {
    /// All supported standards.
    pub const ALL: [Standard; 3] = [Standard::Pal625, Standard::Pal525, Standard::Pal312p];

    /// The sample rate granularity of the standard in samples per second: one sample per timing
    /// unit. The internal video rate is always a multiple of this, so the host must size its
    /// pipeline to produce at least this rate to render the standard without distortion.
    pub fn sample_rate_units(self) -> u32 {
        match self {
            Standard::Pal525 => 1_008_000,
            Standard::Pal625 | Standard::Pal312p => 1_000_000,
        }
    }

    /// The internal video rate used to generate the standard for a given output rate: the
    /// largest multiple of the rate units not above the output rate, but at least one unit.
    pub fn internal_rate(self, output_sample_rate: u32) -> u32 {
        let units = self.sample_rate_units();
        ((output_sample_rate / units) * units).max(units)
    }
}

impl FromStr for Standard {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pal625" | "625" => Ok(Standard::Pal625),
            "pal525" | "525" => Ok(Standard::Pal525),
            "pal312p" | "312p" => Ok(Standard::Pal312p),
            _ => Err(ParseError::Standard(s.to_string())),
        }
    }
}

/// One of the two half-frames of an interlaced frame. Progressive frames only have an even
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Even,
    Odd,
}

impl Field {
    /// The field index, 0 for even and 1 for odd.
    pub fn index(self) -> u32 {
        match self {
            Field::Even => 0,
            Field::Odd => 1,
        }
    }

    /// The offset of the field's image rows in the full frame. The odd field starts its image
    /// half a line closer to its vertical sync than the even field, so it is the top field.
    pub fn frame_row_offset(self) -> u32 {
        match self {
            Field::Odd => 0,
            Field::Even => 1,
        }
    }
}

/// The zones of a line, from left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineZone {
    Sync,
    BackPorch,
    Image,
    FrontPorch,
}

/// The pulse pattern of a vertical synchronization line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncLine {
    /// Two long (broad) pulses, each low for a half line minus a sync width.
    Long,
    /// A long pulse in the first half line, an equalizing pulse in the second.
    LongThenEqualizing,
    /// An equalizing pulse in the first half line, a long pulse in the second.
    EqualizingThenLong,
    /// Two short equalizing pulses.
    Equalizing,
    /// An equalizing pulse in the first half line, black in the second.
    EqualizingThenBlank,
    /// A normal horizontal sync and black in the first half line, an equalizing pulse in the
    /// second.
    BlankThenEqualizing,
}

/// What a line of a field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// A vertical synchronization line.
    Sync(SyncLine),
    /// A black line with a normal horizontal sync pulse.
    Blank,
    /// An image line, with its row index within the field's image.
    Image(u32),
}

/// The vertical synchronization layout of a field: the pulse lines starting the field and the
/// ones ending it. Every field has five equalizing pulses before and after its five long
/// pulses; the odd field of an interlaced frame starts them half a line late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSyncLayout {
    pub head: &'static [SyncLine],
    pub tail: &'static [SyncLine],
}

impl FieldSyncLayout {
    /// The number of sync lines at both ends of the field.
    pub fn line_count(&self) -> u32 {
        (self.head.len() + self.tail.len()) as u32
    }
}

/// Even field: 2.5 lines of long pulses, then 2.5 lines of equalizing pulses. The two trailing
/// lines and the first half of the odd field complete the equalizing pulses before the odd
/// field's long pulses.
pub const EVEN_FIELD_SYNC: FieldSyncLayout = FieldSyncLayout {
    head: &[
        SyncLine::Long,
        SyncLine::Long,
        SyncLine::LongThenEqualizing,
        SyncLine::Equalizing,
        SyncLine::Equalizing,
    ],
    tail: &[SyncLine::Equalizing, SyncLine::Equalizing],
};

/// Odd field: starts half a line late with an equalizing pulse, then 2.5 lines of long pulses
/// and 2.5 lines of equalizing pulses.
pub const ODD_FIELD_SYNC: FieldSyncLayout = FieldSyncLayout {
    head: &[
        SyncLine::EqualizingThenLong,
        SyncLine::Long,
        SyncLine::Long,
        SyncLine::Equalizing,
        SyncLine::Equalizing,
        SyncLine::EqualizingThenBlank,
    ],
    tail: &[
        SyncLine::BlankThenEqualizing,
        SyncLine::Equalizing,
        SyncLine::Equalizing,
    ],
};

/// Progressive frame: one field, with the even field head and the odd field tail.
pub const PROGRESSIVE_FIELD_SYNC: FieldSyncLayout = FieldSyncLayout {
    head: EVEN_FIELD_SYNC.head,
    tail: ODD_FIELD_SYNC.tail,
};

/// The geometry of a standard at a given internal video rate: line counts, line partition in
/// samples and the derived pattern sizes. Derived as a whole, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardGeometry {
    /// The internal video rate the sample counts were derived for.
    pub internal_rate: u32,
    /// Number of samples per timing unit.
    pub points_per_unit: u32,
    /// Number of lines in a complete frame.
    pub line_count: u32,
    /// Number of lines in the even field (all of them if progressive).
    pub even_field_lines: u32,
    /// Number of image carrying lines in a complete frame, i.e. the image buffer height.
    pub image_line_count: u32,
    /// Number of image carrying lines per field.
    pub field_image_lines: u32,
    /// Number of vertical sync lines at the start of the even field.
    pub sync_line_count: u32,
    pub interlaced: bool,
    /// Number of samples in a line.
    pub horizontal_points: u32,
    pub sync_width: u32,
    pub back_porch_width: u32,
    /// Number of samples of the image part of a line, i.e. the image buffer width.
    pub image_line_width: u32,
    pub front_porch_width: u32,
    /// Width of an equalizing pulse.
    pub field_sync_width: u32,
    /// Width of a bar in the horizontal bar pattern.
    pub horizontal_bar_width: u32,
    /// Number of lines of a bar in the vertical bar pattern.
    pub vertical_bar_lines: u32,
    /// Vertical sync layout of the even and odd field.
    pub field_sync: [FieldSyncLayout; 2],
}

impl StandardGeometry {
    /// Derive the geometry of a standard. The internal rate should come from
    /// `Standard::internal_rate`; it is rounded down to whole timing units.
    pub fn new(standard: Standard, internal_rate: u32) -> Self {
        let points_per_unit = (internal_rate / standard.sample_rate_units()).max(1);

        let (line_count, field_image_lines, interlaced) = match standard {
            Standard::Pal625 => (625, 288, true),
            Standard::Pal525 => (525, 240, true),
            Standard::Pal312p => (312, 288, false),
        };
        // The odd field takes the extra line of an odd line count.
        let even_field_lines = if interlaced { line_count / 2 } else { line_count };
        let field_sync = if interlaced {
            [EVEN_FIELD_SYNC, ODD_FIELD_SYNC]
        } else {
            [PROGRESSIVE_FIELD_SYNC; 2]
        };

        // Pulse widths in tenths of a timing unit.
        let sync_width = tenths_to_points(47, points_per_unit);
        let back_porch_width = tenths_to_points(47, points_per_unit);
        let front_porch_width = tenths_to_points(15, points_per_unit);
        let field_sync_width = tenths_to_points(23, points_per_unit);
        let horizontal_points = LINE_TIME_UNITS * points_per_unit;

        // What is left of the line is for the image.
        let image_line_width = horizontal_points - sync_width - back_porch_width - front_porch_width;
        let fields = if interlaced { 2 } else { 1 };

        let geometry = Self {
            internal_rate: standard.sample_rate_units() * points_per_unit,
            points_per_unit,
            line_count,
            even_field_lines,
            image_line_count: field_image_lines * fields,
            field_image_lines,
            sync_line_count: field_sync[0].head.len() as u32,
            interlaced,
            horizontal_points,
            sync_width,
            back_porch_width,
            image_line_width,
            front_porch_width,
            field_sync_width,
            horizontal_bar_width: (image_line_width / BAR_COUNT).max(1),
            vertical_bar_lines: (field_image_lines / BAR_COUNT).max(1),
            field_sync,
        };

        debug_assert!(geometry.is_partitioned());
        geometry
    }

    /// Whether sync, back porch, image and front porch exactly fill a line.
    pub fn is_partitioned(&self) -> bool {
        self.sync_width + self.back_porch_width + self.image_line_width + self.front_porch_width
            == self.horizontal_points
    }

    /// The number of samples in half a line.
    pub fn half_line(&self) -> u32 {
        self.horizontal_points / 2
    }

    /// The number of internal ticks in a complete frame.
    pub fn ticks_per_frame(&self) -> u64 {
        self.line_count as u64 * self.horizontal_points as u64
    }

    /// The number of lines in a field.
    pub fn field_lines(&self, field: Field) -> u32 {
        match field {
            Field::Even => self.even_field_lines,
            Field::Odd => self.line_count - self.even_field_lines,
        }
    }

    /// The field a frame line belongs to, and the line index within that field.
    pub fn field_of_line(&self, line: u32) -> (Field, u32) {
        if self.interlaced && line >= self.even_field_lines {
            (Field::Odd, line - self.even_field_lines)
        } else {
            (Field::Even, line)
        }
    }

    /// The zone of a horizontal position. Positions past the line end count as front porch.
    pub fn zone(&self, horizontal: u32) -> LineZone {
        if horizontal < self.sync_width {
            LineZone::Sync
        } else if horizontal < self.sync_width + self.back_porch_width {
            LineZone::BackPorch
        } else if horizontal < self.sync_width + self.back_porch_width + self.image_line_width {
            LineZone::Image
        } else {
            LineZone::FrontPorch
        }
    }

    /// The first image line of a field. The image ends right before the tail sync lines, the
    /// lines between the head sync lines and the image are blank.
    pub fn image_start(&self, field: Field) -> u32 {
        let layout = &self.field_sync[field.index() as usize];
        self.field_lines(field) - layout.tail.len() as u32 - self.field_image_lines
    }

    /// The number of blank lines between the head sync lines and the image of a field.
    pub fn blank_lines(&self, field: Field) -> u32 {
        let layout = &self.field_sync[field.index() as usize];
        self.image_start(field) - layout.head.len() as u32
    }

    /// What a line of a field carries.
    pub fn line_kind(&self, field: Field, field_line: u32) -> LineKind {
        let layout = &self.field_sync[field.index() as usize];
        let head = layout.head.len() as u32;
        let tail_start = self.field_lines(field) - layout.tail.len() as u32;
        let image_start = self.image_start(field);

        if field_line < head {
            LineKind::Sync(layout.head[field_line as usize])
        } else if field_line >= tail_start {
            LineKind::Sync(layout.tail[(field_line - tail_start) as usize])
        } else if field_line < image_start {
            LineKind::Blank
        } else {
            LineKind::Image(field_line - image_start)
        }
    }
}

/// Round a duration in tenths of a timing unit to a number of samples.
fn tenths_to_points(tenths: u32, points_per_unit: u32) -> u32 {
    (tenths * points_per_unit + 5) / 10
}
