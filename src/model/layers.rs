use std::fmt;

use crate::foundation::{
    core::{Corner, LayoutBox, Rgba8},
    error::{ComposeError, ComposeResult},
};

/// Opaque reference to a decodable resource (file path, URL, generated asset key).
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct MediaRef(pub String);

impl MediaRef {
    /// Wrap a reference string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// How a source rectangle is mapped into its target box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Fill the box, center-cropping the overflowing axis.
    #[default]
    Cover,
    /// Fit inside the box, letterboxing the other axis.
    Contain,
    /// Ignore the source aspect ratio.
    Stretch,
}

/// Rectangle expressed in percentages of the canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PercentBox {
    /// Left edge, % of the outer width.
    pub x: f64,
    /// Top edge, % of the outer height.
    pub y: f64,
    /// % of the outer width.
    pub width: f64,
    /// % of the outer height.
    pub height: f64,
}

impl PercentBox {
    /// The whole outer box.
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        }
    }

    /// Resolve against `outer` in pixels.
    pub fn within(self, outer: LayoutBox) -> LayoutBox {
        outer.percent(self.x, self.y, self.width, self.height)
    }

    fn validate(self, what: &str) -> ComposeResult<()> {
        let all_finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(ComposeError::validation(format!(
                "{what} area must have finite, positive width/height"
            )));
        }
        Ok(())
    }
}

/// Declarative per-job layout: background, how the video fills the canvas, and the ordered
/// visual layers painted above it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutConfig {
    /// Canvas fill; black by default.
    #[serde(default = "default_background")]
    pub background: Rgba8,
    /// How the video frame maps onto the canvas.
    #[serde(default)]
    pub video_fit: FitMode,
    /// Visual layers, bottom to top within each paint tier.
    #[serde(default)]
    pub layers: Vec<VisualLayer>,
}

fn default_background() -> Rgba8 {
    Rgba8::BLACK
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            video_fit: FitMode::Cover,
            layers: Vec::new(),
        }
    }
}

impl LayoutConfig {
    /// Check every layer; the error names the offending index.
    pub fn validate(&self) -> ComposeResult<()> {
        for (idx, layer) in self.layers.iter().enumerate() {
            layer
                .validate()
                .map_err(|e| ComposeError::validation(format!("layer {idx}: {e}")))?;
        }
        Ok(())
    }
}

/// One entry of the visual stack.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualLayer {
    /// Static graphic above the video.
    ImageOverlay(ImageOverlay),
    /// Timed subtitles.
    Captions(CaptionTrack),
    /// Corner logo or badge.
    Watermark(Watermark),
    /// Shrink-to-fit text.
    TextPanel(TextPanel),
}

impl VisualLayer {
    /// The serde tag of this layer.
    pub fn kind_name(&self) -> &'static str {
        match self {
            VisualLayer::ImageOverlay(_) => "image_overlay",
            VisualLayer::Captions(_) => "captions",
            VisualLayer::Watermark(_) => "watermark",
            VisualLayer::TextPanel(_) => "text_panel",
        }
    }

    /// Image assets this layer needs natural dimensions for, with their `required` flag.
    pub fn image_assets(&self) -> Vec<(&MediaRef, bool)> {
        match self {
            VisualLayer::ImageOverlay(o) => vec![(&o.source, o.required)],
            VisualLayer::Watermark(Watermark {
                content: WatermarkContent::Image { source, required },
                ..
            }) => vec![(source, *required)],
            _ => Vec::new(),
        }
    }

    fn validate(&self) -> ComposeResult<()> {
        match self {
            VisualLayer::ImageOverlay(o) => {
                check_opacity(o.opacity)?;
                if let Some(area) = o.area {
                    area.validate("image overlay")?;
                }
                Ok(())
            }
            VisualLayer::Captions(c) => {
                check_font(c.style.font_px)?;
                for e in &c.entries {
                    e.validate()?;
                }
                Ok(())
            }
            VisualLayer::Watermark(w) => {
                check_opacity(w.opacity)?;
                if !(w.width_pct > 0.0 && w.width_pct <= 100.0) {
                    return Err(ComposeError::validation(
                        "watermark width_pct must be in (0, 100]",
                    ));
                }
                if let WatermarkContent::Text { font_px, .. } = &w.content {
                    check_font(*font_px)?;
                }
                if let Some(p) = w.pulse
                    && (!p.omega.is_finite() || p.omega <= 0.0)
                {
                    return Err(ComposeError::validation("pulse omega must be > 0"));
                }
                Ok(())
            }
            VisualLayer::TextPanel(p) => {
                p.area.validate("text panel")?;
                for b in &p.blocks {
                    check_font(b.font_px)?;
                }
                Ok(())
            }
        }
    }
}

fn check_opacity(v: f32) -> ComposeResult<()> {
    if !(0.0..=1.0).contains(&v) {
        return Err(ComposeError::validation("opacity must be in [0, 1]"));
    }
    Ok(())
}

fn check_font(px: f64) -> ComposeResult<()> {
    if !px.is_finite() || px <= 0.0 {
        return Err(ComposeError::validation("font_px must be finite and > 0"));
    }
    Ok(())
}

fn one() -> f32 {
    1.0
}

fn stretch() -> FitMode {
    FitMode::Stretch
}

/// Static decorative graphic (news frame, border) above the video.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageOverlay {
    /// Image asset.
    pub source: MediaRef,
    /// `None` covers the whole canvas.
    #[serde(default)]
    pub area: Option<PercentBox>,
    /// Stretch by default, as frames are drawn for the canvas.
    #[serde(default = "stretch")]
    pub fit: FitMode,
    /// In `[0, 1]`.
    #[serde(default = "one")]
    pub opacity: f32,
    /// A required overlay that fails to load fails the job; an optional one is skipped.
    #[serde(default)]
    pub required: bool,
}

/// Which clock caption entry times are measured on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionClock {
    /// Source media time (the playback clock).
    #[default]
    Source,
    /// Seconds since the start of the job's time range.
    Range,
}

/// One subtitle and the half-open interval it is shown in.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptionEntry {
    /// Subtitle text; wrapped to the caption width.
    pub text: String,
    /// Shown from here, inclusive.
    pub start: f64,
    /// Hidden from here.
    pub end: f64,
}

impl CaptionEntry {
    /// Entry shown over `[start, end)`.
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// `start <= t < end`.
    pub fn is_active(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    fn validate(&self) -> ComposeResult<()> {
        if !self.start.is_finite() || !self.end.is_finite() || self.start >= self.end {
            return Err(ComposeError::validation(format!(
                "caption '{}' must satisfy start < end",
                self.text
            )));
        }
        Ok(())
    }
}

/// First entry in list order whose `[start, end)` contains `t`.
pub fn active_caption(entries: &[CaptionEntry], t: f64) -> Option<(usize, &CaptionEntry)> {
    entries.iter().enumerate().find(|(_, e)| e.is_active(t))
}

/// Look of a caption track.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    /// Font size.
    pub font_px: f64,
    /// Text color.
    pub color: Rgba8,
    /// Plate behind each line.
    pub plate: Rgba8,
    /// Plate padding.
    pub padding_px: f64,
    /// Distance of the last line's bottom edge from the canvas bottom, in % of canvas height.
    pub bottom_pct: f64,
    /// Wrap width, in % of canvas width.
    pub max_width_pct: f64,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_px: 48.0,
            color: Rgba8::WHITE,
            plate: Rgba8::rgba(0, 0, 0, 180),
            padding_px: 12.0,
            bottom_pct: 15.0,
            max_width_pct: 90.0,
        }
    }
}

/// Timed subtitles sharing one style.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptionTrack {
    /// When entries overlap, the first one in list order wins.
    pub entries: Vec<CaptionEntry>,
    /// Shared style.
    #[serde(default)]
    pub style: CaptionStyle,
    /// Clock the entry times refer to.
    #[serde(default)]
    pub clock: CaptionClock,
}

/// Time-based alpha oscillation for "live" badges, sampled from wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pulse {
    /// Angular frequency in radians per second.
    pub omega: f64,
}

impl Pulse {
    /// `0.5 + 0.5 * sin(t * omega)`, in `[0, 1]`.
    pub fn alpha_at(self, wall_secs: f64) -> f64 {
        0.5 + 0.5 * (wall_secs * self.omega).sin()
    }
}

/// What a watermark shows.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatermarkContent {
    /// A logo image, sized by `width_pct`.
    Image {
        /// Logo asset.
        source: MediaRef,
        /// Fail the job when the logo cannot be loaded.
        #[serde(default)]
        required: bool,
    },
    /// A text badge, sized by its text.
    Text {
        /// Badge text, kept on one line.
        text: String,
        /// Font size.
        font_px: f64,
        /// Text color.
        #[serde(default = "white")]
        color: Rgba8,
        /// Badge background.
        #[serde(default = "badge_plate")]
        plate: Rgba8,
    },
}

fn white() -> Rgba8 {
    Rgba8::WHITE
}

fn badge_plate() -> Rgba8 {
    Rgba8::rgba(220, 20, 60, 255)
}

fn watermark_width_pct() -> f64 {
    20.0
}

fn watermark_margin_pct() -> f64 {
    2.0
}

fn watermark_padding_px() -> f64 {
    16.0
}

/// Logo, watermark or badge pinned to one corner.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Watermark {
    /// Logo or badge.
    pub content: WatermarkContent,
    /// Anchor corner.
    #[serde(default)]
    pub corner: Corner,
    /// Image width as % of canvas width (height follows the aspect ratio).
    #[serde(default = "watermark_width_pct")]
    pub width_pct: f64,
    /// Offset from both canvas edges, as % of the canvas dimension on that axis.
    #[serde(default = "watermark_margin_pct")]
    pub margin_pct: f64,
    /// Badge padding around its text.
    #[serde(default = "watermark_padding_px")]
    pub padding_px: f64,
    /// In `[0, 1]`.
    #[serde(default = "one")]
    pub opacity: f32,
    /// Makes the badge blink.
    #[serde(default)]
    pub pulse: Option<Pulse>,
}

/// Horizontal alignment of text panel lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    /// Flush left.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Flush right.
    Right,
}

/// One block of a text panel.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextBlock {
    /// Text; `\n` forces a break.
    pub text: String,
    /// Requested font size, before shrinking.
    pub font_px: f64,
    /// Text color.
    #[serde(default = "white")]
    pub color: Rgba8,
    /// Optional plate behind each line.
    #[serde(default)]
    pub plate: Option<Rgba8>,
}

fn panel_gap_px() -> f64 {
    12.0
}

fn panel_padding_px() -> f64 {
    8.0
}

/// Stacked text blocks (title, body, footer) shrunk together to fit their area.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextPanel {
    /// Blocks, top to bottom.
    pub blocks: Vec<TextBlock>,
    /// Panel area on the canvas.
    pub area: PercentBox,
    /// Gap between blocks, before shrinking.
    #[serde(default = "panel_gap_px")]
    pub gap_px: f64,
    /// Inset from the area edges.
    #[serde(default = "panel_padding_px")]
    pub padding_px: f64,
    /// Line alignment.
    #[serde(default)]
    pub align: TextAlign,
}

/// One input of the audio mix.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioLayer {
    /// The source video's own track.
    SourceAudio {
        /// Mixed at zero gain.
        #[serde(default)]
        muted: bool,
    },
    /// Background music played from its beginning.
    Music {
        /// Audio asset.
        source: MediaRef,
        /// Mixed at zero gain.
        #[serde(default)]
        muted: bool,
    },
}

impl AudioLayer {
    /// Whether this input is mixed at zero gain.
    pub fn is_muted(&self) -> bool {
        match self {
            AudioLayer::SourceAudio { muted } | AudioLayer::Music { muted, .. } => *muted,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/layers.rs"]
mod tests;
