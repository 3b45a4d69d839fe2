use crate::{
    foundation::{
        core::{Dimensions, LayoutBox, Rgba8},
        error::ComposeResult,
    },
    layout::{
        resolver::TextLine,
        text::{MonospaceMeasure, TextMeasure},
    },
    model::layers::MediaRef,
    render::surface::{CaptureSurface, ImageRef, Shadow, Surface, SurfaceFactory},
};

/// What an [`DrawOp::Image`] drew.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// A decoded video frame.
    Video {
        /// Source video.
        source: MediaRef,
        /// Playback position of the frame.
        time: f64,
    },
    /// A still image asset.
    Asset {
        /// Image asset.
        source: MediaRef,
    },
}

/// One recorded draw call, with the surface state it was issued under.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// Solid rectangle.
    FillRect {
        /// Area filled.
        rect: LayoutBox,
        /// Fill color.
        color: Rgba8,
        /// Surface alpha at the time.
        alpha: f32,
    },
    /// Image or video frame.
    Image {
        /// What was drawn.
        image: ImageSource,
        /// Destination rect.
        rect: LayoutBox,
        /// Clip applied, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        clip: Option<LayoutBox>,
        /// Surface alpha at the time.
        alpha: f32,
    },
    /// One line of text.
    Text {
        /// Line content.
        text: String,
        /// Left edge.
        x: f64,
        /// Top of the line box.
        y: f64,
        /// Font size.
        font_px: f64,
        /// Text color.
        color: Rgba8,
        /// Surface alpha at the time.
        alpha: f32,
        /// Shadow in effect, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shadow: Option<Shadow>,
    },
}

/// Recording surface: draw calls become serializable [`DrawOp`]s.
///
/// As a [`CaptureSurface`] each captured frame is one JSON line.
#[derive(Clone, Debug)]
pub struct DisplayList<M: TextMeasure = MonospaceMeasure> {
    size: Dimensions,
    measure: M,
    alpha: f32,
    shadow: Option<Shadow>,
    ops: Vec<DrawOp>,
}

impl DisplayList<MonospaceMeasure> {
    /// Empty list measuring text with [`MonospaceMeasure`].
    pub fn new(size: Dimensions) -> Self {
        Self::with_measure(size, MonospaceMeasure::default())
    }
}

impl<M: TextMeasure> DisplayList<M> {
    /// Empty list measuring text with `measure`.
    pub fn with_measure(size: Dimensions, measure: M) -> Self {
        Self {
            size,
            measure,
            alpha: 1.0,
            shadow: None,
            ops: Vec::new(),
        }
    }

    /// Ops recorded since the last frame began.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Consume the list, keeping its ops.
    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    /// Texts drawn so far, in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// The current ops as one JSON array.
    pub fn to_json(&self) -> ComposeResult<String> {
        Ok(serde_json::to_string(&self.ops)?)
    }
}

impl<M: TextMeasure> TextMeasure for DisplayList<M> {
    fn measure(&self, text: &str, font_px: f64) -> f64 {
        self.measure.measure(text, font_px)
    }
}

impl<M: TextMeasure> Surface for DisplayList<M> {
    fn size(&self) -> Dimensions {
        self.size
    }

    fn fill_rect(&mut self, rect: LayoutBox, color: Rgba8) {
        self.ops.push(DrawOp::FillRect {
            rect,
            color,
            alpha: self.alpha,
        });
    }

    fn draw_image(&mut self, image: ImageRef<'_>, rect: LayoutBox, clip: Option<LayoutBox>) {
        let image = match image {
            ImageRef::VideoFrame { source, time } => ImageSource::Video {
                source: source.clone(),
                time,
            },
            ImageRef::Asset(source) => ImageSource::Asset {
                source: source.clone(),
            },
        };
        self.ops.push(DrawOp::Image {
            image,
            rect,
            clip,
            alpha: self.alpha,
        });
    }

    fn fill_text(&mut self, line: &TextLine, color: Rgba8) {
        self.ops.push(DrawOp::Text {
            text: line.text.clone(),
            x: line.x,
            y: line.y,
            font_px: line.font_px,
            color,
            alpha: self.alpha,
            shadow: self.shadow,
        });
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.shadow = shadow;
    }
}

impl<M: TextMeasure> CaptureSurface for DisplayList<M> {
    fn begin_frame(&mut self) {
        self.ops.clear();
        self.alpha = 1.0;
        self.shadow = None;
    }

    fn capture(&mut self) -> ComposeResult<Vec<u8>> {
        let mut line = serde_json::to_vec(&self.ops)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// Hands out [`DisplayList`] surfaces sharing one text measurer.
#[derive(Clone, Debug, Default)]
pub struct DisplayListFactory<M: TextMeasure + Clone = MonospaceMeasure> {
    measure: M,
}

impl<M: TextMeasure + Clone> DisplayListFactory<M> {
    /// Factory whose lists measure with clones of `measure`.
    pub fn new(measure: M) -> Self {
        Self { measure }
    }
}

impl<M: TextMeasure + Clone + 'static> SurfaceFactory for DisplayListFactory<M> {
    fn create(&self, size: Dimensions) -> ComposeResult<Box<dyn CaptureSurface>> {
        Ok(Box::new(DisplayList::with_measure(
            size,
            self.measure.clone(),
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/display_list.rs"]
mod tests;
