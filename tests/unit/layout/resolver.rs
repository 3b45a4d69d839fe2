use super::*;
use crate::{
    layout::text::MonospaceMeasure,
    model::layers::{CaptionEntry, CaptionStyle, FitMode, TextBlock},
};

fn canvas() -> Dimensions {
    Dimensions::new(720, 1280).unwrap()
}

fn media() -> MediaDimensions {
    MediaDimensions::new(Dimensions::new(1920, 1080).unwrap())
        .with_image("logo.png", Dimensions::new(400, 200).unwrap())
        .with_image("frame.png", Dimensions::new(720, 1280).unwrap())
}

fn mono() -> MonospaceMeasure {
    MonospaceMeasure { advance_em: 0.5 }
}

fn resolve(config: &LayoutConfig) -> ComposeResult<ResolvedLayout> {
    resolve_layout(config, &media(), canvas(), &PipelineConfig::default(), &mono())
}

#[test]
fn landscape_video_covers_portrait_canvas() {
    let out = resolve(&LayoutConfig::default()).unwrap();
    let v = out.video;
    assert!(v.x < 0.0 && v.right() > 720.0, "horizontal axis is cropped");
    assert!((v.y - 0.0).abs() < 1e-9 && (v.height - 1280.0).abs() < 1e-9);
    assert!(((v.x + v.right()) * 0.5 - 360.0).abs() < 1e-9, "crop is centered");
}

#[test]
fn contain_video_letterboxes() {
    let cfg = LayoutConfig {
        video_fit: FitMode::Contain,
        ..LayoutConfig::default()
    };
    let v = resolve(&cfg).unwrap().video;
    assert!((v.width - 720.0).abs() < 1e-9);
    assert!(v.height < 1280.0 && v.y > 0.0);
}

#[test]
fn watermark_corners_are_explicit_placements() {
    let make = |corner| {
        VisualLayer::Watermark(Watermark {
            content: WatermarkContent::Image {
                source: MediaRef::from("logo.png"),
                required: true,
            },
            corner,
            width_pct: 20.0,
            margin_pct: 0.0,
            padding_px: 10.0,
            opacity: 0.8,
            pulse: None,
        })
    };
    let cfg = LayoutConfig {
        layers: vec![
            make(Corner::TopLeft),
            make(Corner::TopRight),
            make(Corner::BottomLeft),
            make(Corner::BottomRight),
        ],
        ..LayoutConfig::default()
    };
    let out = resolve(&cfg).unwrap();
    let rects: Vec<LayoutBox> = out
        .layers
        .iter()
        .map(|l| match l {
            ResolvedLayer::Watermark(w) => w.rect,
            other => panic!("unexpected {other:?}"),
        })
        .collect();

    // 20% of 720 = 144 wide; 2:1 logo -> 72 tall.
    assert_eq!(rects[0], LayoutBox::new(10.0, 10.0, 144.0, 72.0));
    assert_eq!(rects[1], LayoutBox::new(720.0 - 10.0 - 144.0, 10.0, 144.0, 72.0));
    assert_eq!(rects[2], LayoutBox::new(10.0, 1280.0 - 10.0 - 72.0, 144.0, 72.0));
    assert_eq!(
        rects[3],
        LayoutBox::new(720.0 - 10.0 - 144.0, 1280.0 - 10.0 - 72.0, 144.0, 72.0)
    );
}

#[test]
fn missing_optional_overlay_is_skipped_and_required_one_fails() {
    let overlay = |required| {
        VisualLayer::ImageOverlay(ImageOverlay {
            source: MediaRef::from("missing.png"),
            area: None,
            fit: FitMode::Stretch,
            opacity: 1.0,
            required,
        })
    };
    let optional = LayoutConfig {
        layers: vec![overlay(false)],
        ..LayoutConfig::default()
    };
    let out = resolve(&optional).unwrap();
    assert!(matches!(out.layers[0], ResolvedLayer::Skipped { layer: "image_overlay", .. }));

    let required = LayoutConfig {
        layers: vec![overlay(true)],
        ..LayoutConfig::default()
    };
    let err = resolve(&required).unwrap_err();
    assert!(matches!(err, ComposeError::Setup(_)));
}

#[test]
fn overlay_sub_box_uses_percentages() {
    let cfg = LayoutConfig {
        layers: vec![VisualLayer::ImageOverlay(ImageOverlay {
            source: MediaRef::from("frame.png"),
            area: Some(PercentBox {
                x: 10.0,
                y: 50.0,
                width: 50.0,
                height: 25.0,
            }),
            fit: FitMode::Stretch,
            opacity: 0.5,
            required: true,
        })],
        ..LayoutConfig::default()
    };
    let out = resolve(&cfg).unwrap();
    let ResolvedLayer::Image { rect, clip, opacity, .. } = &out.layers[0] else {
        panic!("expected image");
    };
    assert_eq!(*rect, LayoutBox::new(72.0, 640.0, 360.0, 320.0));
    assert_eq!(rect, clip);
    assert_eq!(*opacity, 0.5);
}

#[test]
fn captions_are_centered_and_bottom_anchored() {
    let cfg = LayoutConfig {
        layers: vec![VisualLayer::Captions(CaptionTrack {
            entries: vec![CaptionEntry::new("HELLO", 3.0, 5.0)],
            style: CaptionStyle::default(),
            clock: CaptionClock::Source,
        })],
        ..LayoutConfig::default()
    };
    let out = resolve(&cfg).unwrap();
    let ResolvedLayer::Captions(c) = &out.layers[0] else {
        panic!("expected captions");
    };
    let line = &c.cues[0].lines[0];
    // 5 chars * 48px * 0.5em.
    assert_eq!(line.width, 120.0);
    assert_eq!(line.x, 300.0);
    let bottom = 1280.0 * 0.85;
    assert!((line.y + line.height - bottom).abs() < 1e-9);

    assert!(c.active_cue(2.99).is_none());
    assert!(c.active_cue(3.0).is_some());
    assert!(c.active_cue(5.0).is_none());

    let plate = line.plate(12.0);
    assert_eq!(plate.width, 120.0 + 24.0);
}

#[test]
fn text_badge_grows_with_its_text() {
    let badge = |text: &str| {
        VisualLayer::Watermark(Watermark {
            content: WatermarkContent::Text {
                text: text.to_string(),
                font_px: 20.0,
                color: Rgba8::WHITE,
                plate: Rgba8::BLACK,
            },
            corner: Corner::TopLeft,
            width_pct: 20.0,
            margin_pct: 0.0,
            padding_px: 0.0,
            opacity: 1.0,
            pulse: Some(Pulse { omega: 3.0 }),
        })
    };
    let cfg = LayoutConfig {
        layers: vec![badge("LIVE"), badge("LIVE NOW")],
        ..LayoutConfig::default()
    };
    let out = resolve(&cfg).unwrap();
    let widths: Vec<f64> = out
        .layers
        .iter()
        .map(|l| match l {
            ResolvedLayer::Watermark(w) => w.rect.width,
            _ => 0.0,
        })
        .collect();
    // 4 chars * 10px + 1em of inset.
    assert_eq!(widths[0], 60.0);
    assert!(widths[1] > widths[0]);
    let ResolvedLayer::Watermark(w) = &out.layers[0] else {
        unreachable!()
    };
    assert!((w.alpha_at(0.0) - 0.5).abs() < 1e-6);
}

#[test]
fn overflowing_panel_shrinks_to_its_area() {
    let long = "word ".repeat(60);
    let cfg = LayoutConfig {
        layers: vec![VisualLayer::TextPanel(TextPanel {
            blocks: vec![
                TextBlock {
                    text: "Breaking headline".to_string(),
                    font_px: 64.0,
                    color: Rgba8::WHITE,
                    plate: Some(Rgba8::BLACK),
                },
                TextBlock {
                    text: long,
                    font_px: 40.0,
                    color: Rgba8::WHITE,
                    plate: None,
                },
            ],
            area: PercentBox {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 25.0,
            },
            gap_px: 12.0,
            padding_px: 8.0,
            align: TextAlign::Left,
        })],
        ..LayoutConfig::default()
    };
    let out = resolve(&cfg).unwrap();
    let ResolvedLayer::TextPanel(p) = &out.layers[0] else {
        panic!("expected panel");
    };
    assert!(p.scale < 1.0);
    let last = p.blocks[1].lines.last().unwrap();
    assert!(last.y + last.height <= p.area.bottom() - 8.0 + 1e-6);
    for block in &p.blocks {
        for line in &block.lines {
            assert_eq!(line.x, 8.0, "left aligned inside padding");
            assert!(line.width <= 720.0 - 16.0 || !line.text.contains(' '));
        }
    }
}
