/// English Metric Units per inch. All DrawingML coordinates are in EMU.
pub const EMU_PER_INCH: i64 = 914_400;

fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH as f64).round() as i64
}

/// A rectangle on a slide: offset from the top-left corner plus extent, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Rect {
    pub fn from_inches(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: inches_to_emu(x),
            y: inches_to_emu(y),
            cx: inches_to_emu(width),
            cy: inches_to_emu(height),
        }
    }

    /// True if the rectangle lies entirely within a slide of the given size.
    pub fn fits_within(&self, size: SlideSize) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.cx > 0
            && self.cy > 0
            && self.x + self.cx <= size.cx
            && self.y + self.cy <= size.cy
    }
}

/// Slide dimensions in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideSize {
    pub cx: i64,
    pub cy: i64,
}

impl SlideSize {
    /// 10in x 7.5in, the classic 4:3 on-screen show size.
    pub const SCREEN_4X3: SlideSize = SlideSize {
        cx: 10 * EMU_PER_INCH,
        cy: 7 * EMU_PER_INCH + EMU_PER_INCH / 2,
    };

    pub(crate) fn type_attr(&self) -> Option<&'static str> {
        if *self == Self::SCREEN_4X3 {
            Some("screen4x3")
        } else {
            None
        }
    }
}

impl Default for SlideSize {
    fn default() -> Self {
        Self::SCREEN_4X3
    }
}
