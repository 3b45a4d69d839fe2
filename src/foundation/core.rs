use crate::foundation::error::{ComposeError, ComposeResult};

pub use kurbo::{Rect, Size};

/// Half-open playback interval in seconds of source media time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    /// In-point, inclusive.
    pub start: f64,
    /// Out-point, exclusive.
    pub end: f64,
}

impl TimeRange {
    /// A finite range with `0 <= start < end`.
    pub fn new(start: f64, end: f64) -> ComposeResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(ComposeError::validation("TimeRange bounds must be finite"));
        }
        if start < 0.0 {
            return Err(ComposeError::validation("TimeRange start must be >= 0"));
        }
        if start >= end {
            return Err(ComposeError::validation("TimeRange start must be < end"));
        }
        Ok(Self { start, end })
    }

    /// Re-check a range that came in through deserialization or a struct literal.
    pub fn validate(self) -> ComposeResult<Self> {
        Self::new(self.start, self.end)
    }

    /// Length in seconds, never negative.
    pub fn duration(self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// `start <= t < end`.
    pub fn contains(self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// Clip the end to the media duration. Fails when nothing is left to play.
    pub fn clip_to(self, duration: f64) -> ComposeResult<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ComposeError::setup(format!(
                "media duration {duration} is not playable"
            )));
        }
        let end = self.end.min(duration);
        if self.start >= end {
            return Err(ComposeError::setup(format!(
                "range start {:.3}s is past media duration {:.3}s",
                self.start, duration
            )));
        }
        Ok(Self {
            start: self.start,
            end,
        })
    }

    /// Fraction of the range covered at `t`, clamped to `[0, 1]`.
    pub fn progress_at(self, t: f64) -> f64 {
        let d = self.duration();
        if d <= 0.0 {
            return 1.0;
        }
        ((t - self.start) / d).clamp(0.0, 1.0)
    }
}

/// Pixel dimensions of a canvas or a piece of source media.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Both sides must be non-zero.
    pub fn new(width: u32, height: u32) -> ComposeResult<Self> {
        if width == 0 || height == 0 {
            return Err(ComposeError::validation("dimensions must be non-zero"));
        }
        Ok(Self { width, height })
    }

    /// Width over height.
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }

    /// As a `kurbo` size.
    pub fn as_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Box covering the whole canvas, anchored at the origin.
    pub fn full_box(self) -> LayoutBox {
        LayoutBox::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Resolved pixel rectangle for one visual layer, in output space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl LayoutBox {
    /// Box from its top-left corner and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    /// Same box as a `kurbo::Rect`.
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.right(), self.bottom())
    }

    /// Inverse of [`to_rect`](Self::to_rect).
    pub fn from_rect(r: Rect) -> Self {
        Self::new(r.x0, r.y0, r.width(), r.height())
    }

    /// Sub-box addressed in percentages of this box.
    pub fn percent(self, x_pct: f64, y_pct: f64, w_pct: f64, h_pct: f64) -> Self {
        Self::new(
            self.x + self.width * x_pct / 100.0,
            self.y + self.height * y_pct / 100.0,
            self.width * w_pct / 100.0,
            self.height * h_pct / 100.0,
        )
    }

    /// Intersection with another box, if it has a positive area.
    pub fn intersect(self, other: LayoutBox) -> Option<LayoutBox> {
        let r = self.to_rect().intersect(other.to_rect());
        if r.width() <= 0.0 || r.height() <= 0.0 {
            return None;
        }
        Some(Self::from_rect(r))
    }
}

/// Straight-alpha RGBA8 color, written as `#rrggbb` or `#rrggbbaa` in JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha, 255 is opaque.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    /// Color from its four channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`; the `#` is optional.
    pub fn from_hex(s: &str) -> ComposeResult<Self> {
        let hex = s.trim().trim_start_matches('#');
        let byte = |i: usize| -> ComposeResult<u8> {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| ComposeError::validation(format!("invalid color '{s}'")))
        };
        match hex.len() {
            6 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(ComposeError::validation(format!(
                "invalid color '{s}': expected #rrggbb or #rrggbbaa"
            ))),
        }
    }

    /// Shortest hex form: the alpha pair is omitted when opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = ComposeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgba8> for String {
    fn from(value: Rgba8) -> Self {
        value.to_hex()
    }
}

/// Explicit corner anchors for watermarks and badges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    #[default]
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
