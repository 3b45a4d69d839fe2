use crate::{
    foundation::{
        core::{Dimensions, LayoutBox, Rgba8},
        error::ComposeResult,
    },
    layout::{resolver::TextLine, text::TextMeasure},
    model::layers::MediaRef,
};

/// Image content a surface can draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageRef<'a> {
    /// The frame currently decoded by the playing source, at its playback time.
    VideoFrame {
        /// Playing source.
        source: &'a MediaRef,
        /// Playback position sampled for this tick.
        time: f64,
    },
    /// A static image asset.
    Asset(&'a MediaRef),
}

/// Drop shadow applied to subsequent text draws.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shadow {
    /// Shadow color.
    pub color: Rgba8,
    /// Blur radius.
    pub blur_px: f64,
    /// Horizontal offset.
    pub offset_x: f64,
    /// Vertical offset, positive is down.
    pub offset_y: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: Rgba8::rgba(0, 0, 0, 160),
            blur_px: 4.0,
            offset_x: 0.0,
            offset_y: 2.0,
        }
    }
}

/// 2D drawing target for the frame renderer.
///
/// Alpha and shadow are sticky state, like a canvas context: they apply to every draw until
/// changed.
pub trait Surface: TextMeasure {
    /// Canvas size.
    fn size(&self) -> Dimensions;

    /// Fill `rect` with a solid color.
    fn fill_rect(&mut self, rect: LayoutBox, color: Rgba8);

    /// Draw `image` scaled into `rect`, optionally clipped.
    fn draw_image(&mut self, image: ImageRef<'_>, rect: LayoutBox, clip: Option<LayoutBox>);

    /// Draw one positioned line.
    fn fill_text(&mut self, line: &TextLine, color: Rgba8);

    /// Global alpha for later draws.
    fn set_alpha(&mut self, alpha: f32);

    /// Shadow for later text draws; `None` clears it.
    fn set_shadow(&mut self, shadow: Option<Shadow>);
}

/// Creates one capture surface per session, sized to the job's output.
pub trait SurfaceFactory {
    /// A fresh surface of `size`.
    fn create(&self, size: Dimensions) -> ComposeResult<Box<dyn CaptureSurface>>;
}

/// A surface that can be captured as a live stream, one encoded chunk per frame.
pub trait CaptureSurface: Surface {
    /// Reset the surface for a new frame.
    fn begin_frame(&mut self);

    /// Encode what was drawn since [`begin_frame`](Self::begin_frame).
    fn capture(&mut self) -> ComposeResult<Vec<u8>>;
}
