use std::collections::HashMap;

use crate::{
    config::pipeline::PipelineConfig,
    foundation::{
        core::{Corner, Dimensions, LayoutBox, Rgba8},
        error::{ComposeError, ComposeResult},
    },
    layout::{
        fit::fit_into,
        text::{FitParams, TextBlockSpec, TextMeasure, fit_text_blocks, wrap_text},
    },
    model::layers::{
        CaptionClock, CaptionTrack, ImageOverlay, LayoutConfig, MediaRef, PercentBox, Pulse,
        TextAlign, TextPanel, VisualLayer, Watermark, WatermarkContent,
    },
};

/// Natural sizes of the media a layout refers to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaDimensions {
    /// Natural size of the source video, when known.
    pub video: Option<Dimensions>,
    /// Natural size of each image that could be probed.
    pub images: HashMap<MediaRef, Dimensions>,
}

impl MediaDimensions {
    /// Known video size, no images yet.
    pub fn new(video: Dimensions) -> Self {
        Self {
            video: Some(video),
            images: HashMap::new(),
        }
    }

    /// Record the size of one image.
    pub fn with_image(mut self, source: impl Into<MediaRef>, dims: Dimensions) -> Self {
        self.images.insert(source.into(), dims);
        self
    }
}

/// One line of laid-out text, positioned in canvas space.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TextLine {
    /// Line content, without the break.
    pub text: String,
    /// Left edge of the glyph run.
    pub x: f64,
    /// Top of the line box.
    pub y: f64,
    /// Measured advance width.
    pub width: f64,
    /// Line box height.
    pub height: f64,
    /// Font size the line was wrapped at.
    pub font_px: f64,
}

impl TextLine {
    /// Legibility plate behind this line: measured width plus `padding` on each side.
    pub fn plate(&self, padding: f64) -> LayoutBox {
        LayoutBox::new(
            self.x - padding,
            self.y - padding,
            self.width + 2.0 * padding,
            self.height + 2.0 * padding,
        )
    }
}

/// A caption entry with its lines laid out near the bottom of the canvas.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CaptionCue {
    /// Shown from here, inclusive.
    pub start: f64,
    /// Hidden from here.
    pub end: f64,
    /// Wrapped, centered lines.
    pub lines: Vec<TextLine>,
}

/// A caption track ready to paint.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedCaptions {
    /// Which clock cue times are measured against.
    pub clock: CaptionClock,
    /// Text color.
    pub color: Rgba8,
    /// Plate color behind each line.
    pub plate: Rgba8,
    /// Plate padding around the text.
    pub padding_px: f64,
    /// Index-aligned with the track's entries.
    pub cues: Vec<CaptionCue>,
}

impl ResolvedCaptions {
    /// First cue in list order whose `[start, end)` contains `t`.
    pub fn active_cue(&self, t: f64) -> Option<&CaptionCue> {
        self.cues.iter().find(|c| c.start <= t && t < c.end)
    }
}

/// What a watermark draws inside its rect.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatermarkBody {
    /// A logo stretched over the rect.
    Image {
        /// Logo asset.
        source: MediaRef,
    },
    /// A text badge on a plate filling the rect.
    Text {
        /// The single badge line.
        line: TextLine,
        /// Text color.
        color: Rgba8,
        /// Badge background.
        plate: Rgba8,
    },
}

/// A corner watermark with its final position.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedWatermark {
    /// Anchored, padded rect.
    pub rect: LayoutBox,
    /// Base opacity before any pulse.
    pub opacity: f32,
    /// Optional wall-clock pulsation.
    pub pulse: Option<Pulse>,
    /// Logo or text badge.
    pub body: WatermarkBody,
}

impl ResolvedWatermark {
    /// Effective alpha at a wall-clock instant.
    pub fn alpha_at(&self, wall_secs: f64) -> f32 {
        match self.pulse {
            Some(p) => self.opacity * p.alpha_at(wall_secs) as f32,
            None => self.opacity,
        }
    }
}

/// One text block after shrinking and wrapping.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedTextBlock {
    /// Final font size, never below the configured floor.
    pub font_px: f64,
    /// Text color.
    pub color: Rgba8,
    /// Optional per-line plate.
    pub plate: Option<Rgba8>,
    /// Positioned lines.
    pub lines: Vec<TextLine>,
}

/// A text panel whose blocks fit its area, or hit the font floor trying.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedTextPanel {
    /// Panel area in canvas space.
    pub area: LayoutBox,
    /// Shrink ratio applied to every block, `1.0` when nothing shrank.
    pub scale: f64,
    /// Inset between the area and the text.
    pub padding_px: f64,
    /// Blocks, top to bottom.
    pub blocks: Vec<ResolvedTextBlock>,
}

/// A visual layer resolved to pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedLayer {
    /// An image overlay.
    Image {
        /// Overlay asset.
        source: MediaRef,
        /// Where the image is drawn after fitting; may exceed `clip`.
        rect: LayoutBox,
        /// The overlay's area; drawing is clipped to it.
        clip: LayoutBox,
        /// Layer opacity.
        opacity: f32,
    },
    /// Timed captions.
    Captions(ResolvedCaptions),
    /// A corner badge.
    Watermark(ResolvedWatermark),
    /// Shrink-to-fit text blocks.
    TextPanel(ResolvedTextPanel),
    /// Optional layer left out because its asset was unavailable.
    Skipped {
        /// Layer kind, as in the config.
        layer: &'static str,
        /// Why it was skipped.
        reason: String,
    },
}

/// Concrete pixel geometry for one job; recomputed whenever config or media change.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedLayout {
    /// Output size.
    pub canvas: Dimensions,
    /// Fill painted under everything.
    pub background: Rgba8,
    /// Where the decoded video frame is drawn. May extend past the canvas under cover fit.
    pub video: LayoutBox,
    /// Index-aligned with `LayoutConfig::layers`.
    pub layers: Vec<ResolvedLayer>,
}

impl ResolvedLayout {
    /// The whole canvas as a box.
    pub fn canvas_box(&self) -> LayoutBox {
        self.canvas.full_box()
    }
}

/// Resolve a layout configuration into pixel rectangles and pre-wrapped text.
///
/// A required image without known dimensions fails with [`ComposeError::Setup`]; an optional
/// one resolves to [`ResolvedLayer::Skipped`]. Without a known video size the video box covers
/// the canvas.
#[tracing::instrument(
    skip(config, media, pipeline, measure),
    fields(w = canvas.width, h = canvas.height)
)]
pub fn resolve_layout<M: TextMeasure + ?Sized>(
    config: &LayoutConfig,
    media: &MediaDimensions,
    canvas: Dimensions,
    pipeline: &PipelineConfig,
    measure: &M,
) -> ComposeResult<ResolvedLayout> {
    config.validate()?;
    let canvas_box = canvas.full_box();
    let video = match media.video {
        Some(dims) => fit_into(config.video_fit, dims, canvas_box),
        None => canvas_box,
    };

    let mut layers = Vec::with_capacity(config.layers.len());
    for (idx, layer) in config.layers.iter().enumerate() {
        let resolved = match layer {
            VisualLayer::ImageOverlay(o) => resolve_overlay(o, media, canvas_box)?,
            VisualLayer::Captions(c) => {
                ResolvedLayer::Captions(resolve_captions(c, canvas, pipeline, measure))
            }
            VisualLayer::Watermark(w) => resolve_watermark(w, media, canvas, pipeline, measure)?,
            VisualLayer::TextPanel(p) => {
                ResolvedLayer::TextPanel(resolve_panel(p, canvas_box, pipeline, measure))
            }
        };
        if let ResolvedLayer::Skipped { reason, .. } = &resolved {
            tracing::warn!(layer = idx, kind = layer.kind_name(), %reason, "optional layer skipped");
        }
        layers.push(resolved);
    }

    Ok(ResolvedLayout {
        canvas,
        background: config.background,
        video,
        layers,
    })
}

fn missing_asset(
    source: &MediaRef,
    required: bool,
    layer: &'static str,
) -> ComposeResult<ResolvedLayer> {
    if required {
        return Err(ComposeError::setup(format!(
            "required {layer} asset '{source}' is unavailable"
        )));
    }
    Ok(ResolvedLayer::Skipped {
        layer,
        reason: format!("asset '{source}' is unavailable"),
    })
}

fn resolve_overlay(
    o: &ImageOverlay,
    media: &MediaDimensions,
    canvas_box: LayoutBox,
) -> ComposeResult<ResolvedLayer> {
    let Some(dims) = media.images.get(&o.source) else {
        return missing_asset(&o.source, o.required, "image_overlay");
    };
    let area = o.area.unwrap_or_else(PercentBox::full).within(canvas_box);
    Ok(ResolvedLayer::Image {
        source: o.source.clone(),
        rect: fit_into(o.fit, *dims, area),
        clip: area,
        opacity: o.opacity,
    })
}

fn resolve_captions<M: TextMeasure + ?Sized>(
    track: &CaptionTrack,
    canvas: Dimensions,
    pipeline: &PipelineConfig,
    measure: &M,
) -> ResolvedCaptions {
    let style = &track.style;
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let max_width = (cw * style.max_width_pct / 100.0 - 2.0 * style.padding_px).max(1.0);
    let line_px = style.font_px * pipeline.line_height;
    let bottom = ch * (1.0 - style.bottom_pct / 100.0);

    let cues = track
        .entries
        .iter()
        .map(|entry| {
            let wrapped = wrap_text(&entry.text, style.font_px, max_width, measure);
            let top = bottom - wrapped.len() as f64 * line_px;
            let lines = wrapped
                .into_iter()
                .enumerate()
                .map(|(i, text)| {
                    let width = measure.measure(&text, style.font_px);
                    TextLine {
                        x: (cw - width) * 0.5,
                        y: top + i as f64 * line_px,
                        width,
                        height: line_px,
                        font_px: style.font_px,
                        text,
                    }
                })
                .collect();
            CaptionCue {
                start: entry.start,
                end: entry.end,
                lines,
            }
        })
        .collect();

    ResolvedCaptions {
        clock: track.clock,
        color: style.color,
        plate: style.plate,
        padding_px: style.padding_px,
        cues,
    }
}

/// Anchor a `width x height` box in one of the four corners, `inset` pixels from the edges.
pub fn place_corner(
    corner: Corner,
    width: f64,
    height: f64,
    canvas: Dimensions,
    inset: (f64, f64),
) -> LayoutBox {
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let (ix, iy) = inset;
    let (x, y) = match corner {
        Corner::TopLeft => (ix, iy),
        Corner::TopRight => (cw - ix - width, iy),
        Corner::BottomLeft => (ix, ch - iy - height),
        Corner::BottomRight => (cw - ix - width, ch - iy - height),
    };
    LayoutBox::new(x, y, width, height)
}

fn resolve_watermark<M: TextMeasure + ?Sized>(
    w: &Watermark,
    media: &MediaDimensions,
    canvas: Dimensions,
    pipeline: &PipelineConfig,
    measure: &M,
) -> ComposeResult<ResolvedLayer> {
    let inset = (
        f64::from(canvas.width) * w.margin_pct / 100.0 + w.padding_px,
        f64::from(canvas.height) * w.margin_pct / 100.0 + w.padding_px,
    );

    let (rect, body) = match &w.content {
        WatermarkContent::Image { source, required } => {
            let Some(dims) = media.images.get(source) else {
                return missing_asset(source, *required, "watermark");
            };
            let width = f64::from(canvas.width) * w.width_pct / 100.0;
            let height = width / dims.aspect();
            (
                place_corner(w.corner, width, height, canvas, inset),
                WatermarkBody::Image {
                    source: source.clone(),
                },
            )
        }
        WatermarkContent::Text {
            text,
            font_px,
            color,
            plate,
        } => {
            // Badge: 0.5em horizontal and 0.25em vertical inset around one line.
            let text_w = measure.measure(text, *font_px);
            let line_px = font_px * pipeline.line_height;
            let rect = place_corner(
                w.corner,
                text_w + font_px,
                line_px + 0.5 * font_px,
                canvas,
                inset,
            );
            let line = TextLine {
                text: text.clone(),
                x: rect.x + 0.5 * font_px,
                y: rect.y + 0.25 * font_px,
                width: text_w,
                height: line_px,
                font_px: *font_px,
            };
            (
                rect,
                WatermarkBody::Text {
                    line,
                    color: *color,
                    plate: *plate,
                },
            )
        }
    };

    Ok(ResolvedLayer::Watermark(ResolvedWatermark {
        rect,
        opacity: w.opacity,
        pulse: w.pulse,
        body,
    }))
}

fn resolve_panel<M: TextMeasure + ?Sized>(
    panel: &TextPanel,
    canvas_box: LayoutBox,
    pipeline: &PipelineConfig,
    measure: &M,
) -> ResolvedTextPanel {
    let area = panel.area.within(canvas_box);
    let inner = LayoutBox::new(
        area.x + panel.padding_px,
        area.y + panel.padding_px,
        (area.width - 2.0 * panel.padding_px).max(1.0),
        (area.height - 2.0 * panel.padding_px).max(1.0),
    );

    let specs: Vec<TextBlockSpec<'_>> = panel
        .blocks
        .iter()
        .map(|b| TextBlockSpec {
            text: &b.text,
            font_px: b.font_px,
        })
        .collect();
    let fitted = fit_text_blocks(
        &specs,
        &FitParams {
            max_width: inner.width,
            available_height: inner.height,
            min_font_px: pipeline.min_font_px,
            gap_px: panel.gap_px,
            line_height: pipeline.line_height,
            max_passes: pipeline.max_shrink_passes,
        },
        measure,
    );

    // Vertically centered; an overflowing stack (font floor reached) starts at the top.
    let mut y = inner.y + ((inner.height - fitted.total_height) * 0.5).max(0.0);
    let mut blocks = Vec::with_capacity(fitted.blocks.len());
    for (idx, (src, fb)) in panel.blocks.iter().zip(&fitted.blocks).enumerate() {
        if idx > 0 {
            y += fitted.gap_px;
        }
        let line_px = fitted.line_px(fb);
        let mut lines = Vec::with_capacity(fb.lines.len());
        for text in &fb.lines {
            let width = measure.measure(text, fb.font_px);
            let x = match panel.align {
                TextAlign::Left => inner.x,
                TextAlign::Center => inner.x + (inner.width - width) * 0.5,
                TextAlign::Right => inner.right() - width,
            };
            lines.push(TextLine {
                text: text.clone(),
                x,
                y,
                width,
                height: line_px,
                font_px: fb.font_px,
            });
            y += line_px;
        }
        blocks.push(ResolvedTextBlock {
            font_px: fb.font_px,
            color: src.color,
            plate: src.plate,
            lines,
        });
    }

    ResolvedTextPanel {
        area,
        scale: fitted.scale,
        padding_px: panel.padding_px,
        blocks,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/resolver.rs"]
mod tests;
