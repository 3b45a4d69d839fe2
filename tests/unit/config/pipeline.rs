use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = PipelineConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(cfg, PipelineConfig::default());
    assert_eq!(cfg.tick_interval(), Duration::from_secs_f64(1.0 / 30.0));
}

#[test]
fn partial_watchdog_section_keeps_other_defaults() {
    let cfg =
        PipelineConfig::from_reader(r#"{"fps": 60, "watchdog": {"grace_secs": 1.5}}"#.as_bytes())
            .unwrap();
    assert_eq!(cfg.fps, 60);
    assert!(cfg.watchdog.enabled);
    assert_eq!(cfg.watchdog.factor, 2.0);
    assert_eq!(cfg.watchdog.grace_secs, 1.5);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(PipelineConfig::from_reader(r#"{"fps": 0}"#.as_bytes()).is_err());
    assert!(PipelineConfig::from_reader(r#"{"min_font_px": -2}"#.as_bytes()).is_err());
    assert!(PipelineConfig::from_reader(r#"{"watchdog": {"factor": 0.5}}"#.as_bytes()).is_err());
    assert!(PipelineConfig::from_reader(r#"{"bogus": 1}"#.as_bytes()).is_err());
}

#[test]
fn watchdog_values_beyond_the_bounds_are_rejected() {
    for json in [
        r#"{"watchdog": {"grace_secs": 1e19}}"#,
        r#"{"watchdog": {"grace_secs": 86401}}"#,
        r#"{"watchdog": {"factor": 1e300}}"#,
        r#"{"watchdog": {"factor": 101}}"#,
    ] {
        let err = PipelineConfig::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, ComposeError::Validation(_)), "{json}: {err}");
    }
    let max = PipelineConfig::from_reader(
        r#"{"watchdog": {"factor": 100, "grace_secs": 86400}}"#.as_bytes(),
    )
    .unwrap();
    assert!(max.watchdog.budget_for(3600.0).is_some());
}

#[test]
fn unrepresentable_budget_is_no_deadline() {
    let wd = WatchdogConfig {
        enabled: true,
        factor: 2.0,
        grace_secs: 1e20,
    };
    assert_eq!(wd.budget_for(7.0), None);
    assert_eq!(WatchdogConfig::default().budget_for(f64::MAX), None);
}

#[test]
fn env_overrides_apply_and_ignore_garbage() {
    let cfg = PipelineConfig::default().with_env_overrides(|k| match k {
        "REELCAST_FPS" => Some("24".to_string()),
        "REELCAST_MIN_FONT_PX" => Some("not-a-number".to_string()),
        "REELCAST_WATCHDOG" => Some("off".to_string()),
        _ => None,
    });
    assert_eq!(cfg.fps, 24);
    assert_eq!(cfg.min_font_px, 12.0);
    assert!(!cfg.watchdog.enabled);
    assert_eq!(cfg.watchdog.budget_for(7.0), None);
}

#[test]
fn watchdog_budget_scales_with_range() {
    let wd = WatchdogConfig::default();
    assert_eq!(wd.budget_for(7.0), Some(Duration::from_secs(24)));
}
