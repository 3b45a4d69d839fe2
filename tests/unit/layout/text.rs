use super::*;

fn mono() -> MonospaceMeasure {
    // 10 px per character at 10 px font.
    MonospaceMeasure { advance_em: 1.0 }
}

#[test]
fn greedy_wrap_fills_lines_up_to_width() {
    let lines = wrap_text("aaa bbb ccc dddd", 10.0, 70.0, &mono());
    assert_eq!(lines, vec!["aaa bbb", "ccc", "dddd"]);
}

#[test]
fn overlong_word_gets_its_own_line() {
    let lines = wrap_text("hi extraordinarily ok", 10.0, 50.0, &mono());
    assert_eq!(lines, vec!["hi", "extraordinarily", "ok"]);
}

#[test]
fn newline_is_a_hard_break_and_blank_text_is_empty() {
    let lines = wrap_text("one\ntwo three", 10.0, 1000.0, &mono());
    assert_eq!(lines, vec!["one", "two three"]);
    assert!(wrap_text("", 10.0, 100.0, &mono()).is_empty());
    assert!(wrap_text("  \n ", 10.0, 100.0, &mono()).is_empty());
}

#[test]
fn wrapping_is_idempotent() {
    let m = mono();
    let text = "the quick brown fox jumps over the lazy dog";
    let first = wrap_text(text, 10.0, 120.0, &m);
    let again = wrap_text(&first.join(" "), 10.0, 120.0, &m);
    assert_eq!(first, again);
}

fn params(available_height: f64) -> FitParams {
    FitParams {
        max_width: 200.0,
        available_height,
        min_font_px: 12.0,
        gap_px: 10.0,
        line_height: 1.0,
        max_passes: 3,
    }
}

#[test]
fn fitting_blocks_are_left_alone() {
    let blocks = [
        TextBlockSpec { text: "Title", font_px: 40.0 },
        TextBlockSpec { text: "body", font_px: 20.0 },
    ];
    let fitted = fit_text_blocks(&blocks, &params(500.0), &mono());
    assert_eq!(fitted.scale, 1.0);
    assert_eq!(fitted.blocks[0].font_px, 40.0);
    assert_eq!(fitted.total_height, 40.0 + 10.0 + 20.0);
}

#[test]
fn overflow_shrinks_all_blocks_by_one_ratio() {
    let blocks = [
        TextBlockSpec { text: "Title", font_px: 40.0 },
        TextBlockSpec { text: "body", font_px: 30.0 },
    ];
    // 80 px tall at scale 1, 40 available: one pass at 0.5 fits exactly.
    let fitted = fit_text_blocks(&blocks, &params(40.0), &mono());
    assert!((fitted.scale - 0.5).abs() < 1e-9);
    assert!((fitted.blocks[0].font_px - 20.0).abs() < 1e-9);
    assert!((fitted.blocks[1].font_px - 15.0).abs() < 1e-9);
    assert!((fitted.gap_px - 5.0).abs() < 1e-9);
    assert!(fitted.total_height <= 40.0 + 1e-9);
}

#[test]
fn shrink_rewraps_at_the_new_size() {
    let blocks = [TextBlockSpec {
        text: "aaaa bbbb cccc dddd",
        font_px: 20.0,
    }];
    // At 20 px each word is 80 px wide, so a 200 px line holds two words.
    let before = fit_text_blocks(&blocks, &params(1000.0), &mono());
    assert_eq!(before.blocks[0].lines.len(), 2);

    let fitted = fit_text_blocks(&blocks, &params(20.0), &mono());
    assert!((fitted.blocks[0].font_px - 10.0).abs() < 1e-9);
    assert_eq!(fitted.blocks[0].lines.len(), 1);
    assert!(fitted.total_height <= 20.0 + 1e-9);
}

#[test]
fn shrinking_stops_at_the_minimum_font() {
    let blocks = [TextBlockSpec {
        text: "one\ntwo\nthree\nfour\nfive",
        font_px: 24.0,
    }];
    let fitted = fit_text_blocks(&blocks, &params(10.0), &mono());
    assert_eq!(fitted.blocks[0].font_px, 12.0);
    assert!(fitted.total_height > 10.0);
}

#[test]
fn blocks_below_the_floor_keep_their_size() {
    let blocks = [TextBlockSpec { text: "tiny", font_px: 8.0 }];
    let fitted = fit_text_blocks(&blocks, &params(1.0), &mono());
    assert_eq!(fitted.blocks[0].font_px, 8.0);
}
