/// Text width measurement, the one raster-surface primitive layout needs.
pub trait TextMeasure {
    /// Advance width of `text` rendered on a single line at `font_px`.
    fn measure(&self, text: &str, font_px: f64) -> f64;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn measure(&self, text: &str, font_px: f64) -> f64 {
        (**self).measure(text, font_px)
    }
}

impl<T: TextMeasure + ?Sized> TextMeasure for std::rc::Rc<T> {
    fn measure(&self, text: &str, font_px: f64) -> f64 {
        (**self).measure(text, font_px)
    }
}

/// Fixed advance per character, in ems. Deterministic; used for previews and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasure {
    /// Advance of every character, as a fraction of the font size.
    pub advance_em: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { advance_em: 0.6 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, font_px: f64) -> f64 {
        text.chars().count() as f64 * font_px * self.advance_em
    }
}

/// Greedy word wrap.
///
/// `\n` is a hard break. Every line holds at least one word, even when that word alone is
/// wider than `max_width`. Words are re-joined with single spaces, so wrapping the joined
/// output again with the same width reproduces the same lines.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    text: &str,
    font_px: f64,
    max_width: f64,
    measure: &M,
) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::<String>::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure.measure(&candidate, font_px) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

/// One text block before fitting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBlockSpec<'a> {
    /// Text to wrap; `\n` forces a break.
    pub text: &'a str,
    /// Requested font size.
    pub font_px: f64,
}

/// Constraints for [`fit_text_blocks`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitParams {
    /// Wrap width.
    pub max_width: f64,
    /// Height the stacked blocks should fit in.
    pub available_height: f64,
    /// Shrinking never goes below this font size.
    pub min_font_px: f64,
    /// Vertical gap between blocks, before scaling.
    pub gap_px: f64,
    /// Line box height as a multiple of the font size.
    pub line_height: f64,
    /// Upper bound on shrink-then-rewrap passes.
    pub max_passes: u32,
}

/// A block after fitting.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FittedBlock {
    /// Final font size.
    pub font_px: f64,
    /// Wrapped lines at that size.
    pub lines: Vec<String>,
}

/// Result of [`fit_text_blocks`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FittedText {
    /// Blocks in input order.
    pub blocks: Vec<FittedBlock>,
    /// Global ratio applied to the requested font sizes and gaps.
    pub scale: f64,
    /// Scaled gap between blocks.
    pub gap_px: f64,
    /// Height of every line plus the gaps.
    pub total_height: f64,
    /// Line height multiplier used for `total_height`.
    pub line_height: f64,
}

impl FittedText {
    /// Height of one line of `block`.
    pub fn line_px(&self, block: &FittedBlock) -> f64 {
        block.font_px * self.line_height
    }
}

/// Wrap every block, then shrink all of them by one global ratio if they overflow.
///
/// The ratio is `available_height / total_height`, applied to font sizes and gaps alike, with
/// fonts floor-clamped to `min_font_px`. Each shrink is followed by a full re-wrap at the new
/// sizes; further passes only run when a non-linear measure still overflows.
pub fn fit_text_blocks<M: TextMeasure + ?Sized>(
    blocks: &[TextBlockSpec<'_>],
    params: &FitParams,
    measure: &M,
) -> FittedText {
    let mut scale = 1.0;
    let mut fitted = layout_at(blocks, params, scale, measure);
    let mut passes = 0u32;

    while fitted.total_height > params.available_height + 1e-9 && passes < params.max_passes {
        let ratio = (params.available_height / fitted.total_height).max(0.0);
        let next = scale * ratio;
        if at_floor(blocks, params, scale) || (next - scale).abs() < 1e-12 {
            break;
        }
        scale = next;
        fitted = layout_at(blocks, params, scale, measure);
        passes += 1;
    }
    tracing::trace!(passes, scale, total = fitted.total_height, "text fitted");
    fitted
}

fn scaled_font(base: f64, scale: f64, min_font_px: f64) -> f64 {
    // Blocks requested below the floor keep their own size.
    (base * scale).max(min_font_px.min(base))
}

fn at_floor(blocks: &[TextBlockSpec<'_>], params: &FitParams, scale: f64) -> bool {
    blocks
        .iter()
        .all(|b| scaled_font(b.font_px, scale, params.min_font_px) <= params.min_font_px.min(b.font_px))
}

fn layout_at<M: TextMeasure + ?Sized>(
    blocks: &[TextBlockSpec<'_>],
    params: &FitParams,
    scale: f64,
    measure: &M,
) -> FittedText {
    let gap_px = params.gap_px * scale;
    let mut total_height = 0.0;
    let mut out = Vec::with_capacity(blocks.len());
    for (idx, b) in blocks.iter().enumerate() {
        let font_px = scaled_font(b.font_px, scale, params.min_font_px);
        let lines = wrap_text(b.text, font_px, params.max_width, measure);
        if idx > 0 {
            total_height += gap_px;
        }
        total_height += lines.len() as f64 * font_px * params.line_height;
        out.push(FittedBlock { font_px, lines });
    }
    FittedText {
        blocks: out,
        scale,
        gap_px,
        total_height,
        line_height: params.line_height,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/text.rs"]
mod tests;
