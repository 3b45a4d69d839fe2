use std::{borrow::Cow, cell::RefCell, path::Path};

use crate::{
    foundation::error::{ComposeError, ComposeResult},
    layout::text::{MonospaceMeasure, TextMeasure},
};

/// Measures text by shaping it with Parley against one registered font.
///
/// Shaping needs mutable Parley contexts, so they live behind a `RefCell`; the measurer is
/// meant for the single-threaded render loop. Anything that cannot be shaped falls back to
/// [`MonospaceMeasure`].
pub struct ParleyMeasure {
    engine: RefCell<Engine>,
    family_name: String,
    fallback: MonospaceMeasure,
}

struct Engine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
}

impl std::fmt::Debug for ParleyMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParleyMeasure")
            .field("family_name", &self.family_name)
            .finish_non_exhaustive()
    }
}

impl ParleyMeasure {
    /// Register raw TTF/OTF bytes and measure with the first family they define.
    pub fn from_font_bytes(font_bytes: Vec<u8>) -> ComposeResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| ComposeError::asset("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ComposeError::asset("registered font family has no name"))?
            .to_string();

        tracing::debug!(family = %family_name, "font registered for text measurement");
        Ok(Self {
            engine: RefCell::new(Engine {
                font_ctx,
                layout_ctx: parley::LayoutContext::new(),
            }),
            family_name,
            fallback: MonospaceMeasure::default(),
        })
    }

    /// Load a font file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> ComposeResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ComposeError::asset(format!("read font '{}': {e}", path.display())))?;
        Self::from_font_bytes(bytes)
    }

    /// Family every string is shaped with.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn shaped_width(&self, text: &str, font_px: f64) -> Option<f64> {
        let mut engine = self.engine.try_borrow_mut().ok()?;
        let Engine {
            font_ctx,
            layout_ctx,
        } = &mut *engine;

        let mut builder = layout_ctx.ranged_builder(font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font_px as f32));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        let width = layout
            .lines()
            .map(|line| line.metrics().advance)
            .fold(0.0f32, f32::max);
        Some(f64::from(width))
    }
}

impl TextMeasure for ParleyMeasure {
    fn measure(&self, text: &str, font_px: f64) -> f64 {
        if text.is_empty() || !font_px.is_finite() || font_px <= 0.0 {
            return 0.0;
        }
        match self.shaped_width(text, font_px) {
            Some(w) => w,
            None => {
                tracing::warn!("text shaping unavailable, using monospace estimate");
                self.fallback.measure(text, font_px)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/font.rs"]
mod tests;
