use crate::{
    foundation::core::{Dimensions, LayoutBox},
    model::layers::FitMode,
};

/// Scale `src` so it fully covers `target`, centering the overflowing axis.
///
/// The returned box may extend past `target`; the part outside is the center crop.
pub fn cover_fit(src: Dimensions, target: LayoutBox) -> LayoutBox {
    let (sw, sh) = (f64::from(src.width), f64::from(src.height));
    if sw <= 0.0 || sh <= 0.0 {
        return target;
    }
    let scale = (target.width / sw).max(target.height / sh);
    centered(sw * scale, sh * scale, target)
}

/// Scale `src` to fit inside `target`, letterboxing the non-overflowing axis.
pub fn contain_fit(src: Dimensions, target: LayoutBox) -> LayoutBox {
    let (sw, sh) = (f64::from(src.width), f64::from(src.height));
    if sw <= 0.0 || sh <= 0.0 {
        return target;
    }
    let scale = (target.width / sw).min(target.height / sh);
    centered(sw * scale, sh * scale, target)
}

/// Place `src` in `target` according to `mode`. Stretch returns `target` itself.
pub fn fit_into(mode: FitMode, src: Dimensions, target: LayoutBox) -> LayoutBox {
    match mode {
        FitMode::Cover => cover_fit(src, target),
        FitMode::Contain => contain_fit(src, target),
        FitMode::Stretch => target,
    }
}

fn centered(w: f64, h: f64, target: LayoutBox) -> LayoutBox {
    LayoutBox::new(
        target.x + (target.width - w) * 0.5,
        target.y + (target.height - h) * 0.5,
        w,
        h,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/layout/fit.rs"]
mod tests;
