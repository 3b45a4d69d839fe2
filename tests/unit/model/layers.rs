use super::*;

#[test]
fn overlapping_captions_pick_first_in_list_order() {
    let entries = vec![
        CaptionEntry::new("first", 0.0, 5.0),
        CaptionEntry::new("second", 3.0, 8.0),
    ];
    let (idx, entry) = active_caption(&entries, 4.0).unwrap();
    assert_eq!(idx, 0);
    assert_eq!(entry.text, "first");

    let (idx, _) = active_caption(&entries, 6.0).unwrap();
    assert_eq!(idx, 1);
    assert!(active_caption(&entries, 8.0).is_none());
}

#[test]
fn pulse_alpha_oscillates_between_zero_and_one() {
    let p = Pulse { omega: 2.0 };
    assert!((p.alpha_at(0.0) - 0.5).abs() < 1e-12);
    let peak = std::f64::consts::FRAC_PI_2 / 2.0;
    assert!((p.alpha_at(peak) - 1.0).abs() < 1e-12);
    for i in 0..100 {
        let a = p.alpha_at(f64::from(i) * 0.37);
        assert!((0.0..=1.0).contains(&a));
    }
}

#[test]
fn layer_json_uses_kind_tags_and_defaults() {
    let json = r##"[
        {"kind": "image_overlay", "source": "frame.png"},
        {"kind": "captions", "entries": [{"text": "HELLO", "start": 3, "end": 5}]},
        {"kind": "watermark", "content": {"type": "text", "text": "LIVE", "font_px": 28},
         "corner": "top_left", "pulse": {"omega": 4.0}},
        {"kind": "text_panel", "area": {"x": 5, "y": 5, "width": 90, "height": 30},
         "blocks": [{"text": "Title", "font_px": 64, "plate": "#00000099"}]}
    ]"##;
    let layers: Vec<VisualLayer> = serde_json::from_str(json).unwrap();
    assert_eq!(layers.len(), 4);

    let VisualLayer::ImageOverlay(o) = &layers[0] else {
        panic!("expected image overlay");
    };
    assert_eq!(o.fit, FitMode::Stretch);
    assert_eq!(o.opacity, 1.0);
    assert!(!o.required);
    assert!(o.area.is_none());

    let VisualLayer::Captions(c) = &layers[1] else {
        panic!("expected captions");
    };
    assert_eq!(c.clock, CaptionClock::Source);
    assert_eq!(c.style, CaptionStyle::default());

    let VisualLayer::Watermark(w) = &layers[2] else {
        panic!("expected watermark");
    };
    assert_eq!(w.corner, Corner::TopLeft);
    assert_eq!(w.width_pct, 20.0);
    assert!(matches!(w.content, WatermarkContent::Text { .. }));

    assert_eq!(layers[3].kind_name(), "text_panel");
    let cfg = LayoutConfig {
        layers,
        ..LayoutConfig::default()
    };
    cfg.validate().unwrap();
}

#[test]
fn image_assets_reports_required_flags() {
    let overlay = VisualLayer::ImageOverlay(ImageOverlay {
        source: MediaRef::from("frame.png"),
        area: None,
        fit: FitMode::Stretch,
        opacity: 1.0,
        required: true,
    });
    assert_eq!(
        overlay.image_assets(),
        vec![(&MediaRef::from("frame.png"), true)]
    );
    let captions = VisualLayer::Captions(CaptionTrack {
        entries: vec![],
        style: CaptionStyle::default(),
        clock: CaptionClock::Source,
    });
    assert!(captions.image_assets().is_empty());
}

#[test]
fn validation_catches_bad_layers() {
    let bad_caption = LayoutConfig {
        layers: vec![VisualLayer::Captions(CaptionTrack {
            entries: vec![CaptionEntry::new("x", 5.0, 5.0)],
            style: CaptionStyle::default(),
            clock: CaptionClock::Source,
        })],
        ..LayoutConfig::default()
    };
    let err = bad_caption.validate().unwrap_err();
    assert!(err.to_string().contains("layer 0"));

    let bad_opacity = LayoutConfig {
        layers: vec![VisualLayer::ImageOverlay(ImageOverlay {
            source: MediaRef::from("a.png"),
            area: None,
            fit: FitMode::Cover,
            opacity: 1.5,
            required: false,
        })],
        ..LayoutConfig::default()
    };
    assert!(bad_opacity.validate().is_err());
}

#[test]
fn audio_layers_parse_and_report_mute() {
    let layers: Vec<AudioLayer> = serde_json::from_str(
        r#"[{"kind": "source_audio"}, {"kind": "music", "source": "bed.mp3", "muted": true}]"#,
    )
    .unwrap();
    assert!(!layers[0].is_muted());
    assert!(layers[1].is_muted());
}
