use crate::{
    foundation::core::TimeRange,
    layout::resolver::{
        ResolvedCaptions, ResolvedLayer, ResolvedLayout, ResolvedTextPanel, ResolvedWatermark,
        WatermarkBody,
    },
    model::layers::{CaptionClock, MediaRef},
    render::surface::{ImageRef, Shadow, Surface},
};

/// Clocks sampled for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Playback position of the source video.
    pub video_time: f64,
    /// Range being recorded.
    pub range: TimeRange,
    /// Seconds since the session started recording. Drives pulse animations.
    pub wall_time: f64,
    /// False while the decoder has no frame to show; the background stays visible.
    pub video_ready: bool,
}

impl FrameContext {
    /// Time to look captions up at on `clock`.
    pub fn caption_time(&self, clock: CaptionClock) -> f64 {
        match clock {
            CaptionClock::Source => self.video_time,
            CaptionClock::Range => self.video_time - self.range.start,
        }
    }
}

/// Fixed paint tiers. Inside a tier, layers keep list order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Canvas fill.
    Background,
    /// The video frame.
    Video,
    /// Image overlays.
    Overlay,
    /// Caption plates and text.
    Captions,
    /// Watermarks and text panels.
    Badges,
}

impl Tier {
    /// Tier a resolved layer paints in; skipped layers paint nowhere.
    pub fn of(layer: &ResolvedLayer) -> Option<Tier> {
        match layer {
            ResolvedLayer::Image { .. } => Some(Tier::Overlay),
            ResolvedLayer::Captions(_) => Some(Tier::Captions),
            ResolvedLayer::Watermark(_) | ResolvedLayer::TextPanel(_) => Some(Tier::Badges),
            ResolvedLayer::Skipped { .. } => None,
        }
    }
}

/// Layer indices in paint order.
pub fn paint_order(layout: &ResolvedLayout) -> Vec<usize> {
    let mut keyed: Vec<((Tier, usize), usize)> = layout
        .layers
        .iter()
        .enumerate()
        .filter_map(|(idx, l)| Tier::of(l).map(|t| ((t, idx), idx)))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, idx)| idx).collect()
}

/// Draw one composite frame. Never mutates the layout.
pub fn render_frame<S: Surface + ?Sized>(
    surface: &mut S,
    layout: &ResolvedLayout,
    source: &MediaRef,
    ctx: &FrameContext,
) {
    surface.set_alpha(1.0);
    surface.set_shadow(None);
    surface.fill_rect(layout.canvas_box(), layout.background);

    if ctx.video_ready {
        surface.draw_image(
            ImageRef::VideoFrame {
                source,
                time: ctx.video_time,
            },
            layout.video,
            Some(layout.canvas_box()),
        );
    }

    for idx in paint_order(layout) {
        match &layout.layers[idx] {
            ResolvedLayer::Image {
                source,
                rect,
                clip,
                opacity,
            } => {
                surface.set_alpha(*opacity);
                surface.draw_image(ImageRef::Asset(source), *rect, Some(*clip));
                surface.set_alpha(1.0);
            }
            ResolvedLayer::Captions(c) => draw_captions(surface, c, ctx),
            ResolvedLayer::Watermark(w) => draw_watermark(surface, w, ctx.wall_time),
            ResolvedLayer::TextPanel(p) => draw_panel(surface, p),
            ResolvedLayer::Skipped { .. } => {}
        }
    }
}

fn draw_captions<S: Surface + ?Sized>(surface: &mut S, c: &ResolvedCaptions, ctx: &FrameContext) {
    let Some(cue) = c.active_cue(ctx.caption_time(c.clock)) else {
        return;
    };
    for line in &cue.lines {
        surface.set_shadow(None);
        surface.fill_rect(line.plate(c.padding_px), c.plate);
        surface.set_shadow(Some(Shadow::default()));
        surface.fill_text(line, c.color);
    }
    surface.set_shadow(None);
}

fn draw_watermark<S: Surface + ?Sized>(surface: &mut S, w: &ResolvedWatermark, wall_time: f64) {
    surface.set_alpha(w.alpha_at(wall_time));
    match &w.body {
        WatermarkBody::Image { source } => {
            surface.draw_image(ImageRef::Asset(source), w.rect, None);
        }
        WatermarkBody::Text { line, color, plate } => {
            surface.fill_rect(w.rect, *plate);
            surface.fill_text(line, *color);
        }
    }
    surface.set_alpha(1.0);
}

fn draw_panel<S: Surface + ?Sized>(surface: &mut S, p: &ResolvedTextPanel) {
    for block in &p.blocks {
        for line in &block.lines {
            if let Some(plate) = block.plate {
                surface.fill_rect(line.plate(p.padding_px), plate);
            }
            surface.fill_text(line, block.color);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
