use crate::foundation::{
    core::TimeRange,
    error::{ComposeError, ComposeResult},
};

const EPS: f64 = 1e-9;

/// Cut `range` into consecutive segments of `segment_secs`.
///
/// A trailing remainder shorter than `min_tail_secs` is merged into the previous segment, so
/// no segment except a lone one is ever shorter than the tail threshold.
pub fn split_range(
    range: TimeRange,
    segment_secs: f64,
    min_tail_secs: f64,
) -> ComposeResult<Vec<TimeRange>> {
    let range = range.validate()?;
    if !segment_secs.is_finite() || segment_secs <= 0.0 {
        return Err(ComposeError::validation("segment_secs must be finite and > 0"));
    }
    if !min_tail_secs.is_finite() || min_tail_secs < 0.0 {
        return Err(ComposeError::validation("min_tail_secs must be finite and >= 0"));
    }

    let mut out = Vec::<TimeRange>::new();
    let mut i = 0u64;
    loop {
        // Index-based boundaries keep segments contiguous without float drift.
        let start = range.start + (i as f64) * segment_secs;
        if start >= range.end - EPS {
            break;
        }
        let next = range.start + ((i + 1) as f64) * segment_secs;
        let end = if next >= range.end - EPS {
            range.end
        } else {
            next
        };
        out.push(TimeRange { start, end });
        i += 1;
    }

    if out.len() >= 2
        && let Some(last) = out.last().copied()
        && last.duration() < min_tail_secs
    {
        out.pop();
        if let Some(prev) = out.last_mut() {
            prev.end = last.end;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/batch/split.rs"]
mod tests;
