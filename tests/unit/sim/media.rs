use super::*;

fn clip() -> SyntheticMedia {
    SyntheticMedia::new(EventLog::new()).with_element(
        "clip.mp4",
        ElementSpec::video(12.0, Dimensions::new(1920, 1080).unwrap()),
    )
}

#[tokio::test(start_paused = true)]
async fn playhead_follows_the_tokio_clock() {
    let media = clip();
    let mut el = media.open_video(&MediaRef::from("clip.mp4")).await.unwrap();
    assert!(el.is_paused());
    assert!(!el.frame_ready());

    el.seek(2.0).await.unwrap();
    assert_eq!(el.current_time(), 2.0);
    assert!(el.frame_ready());

    el.play().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!((el.current_time() - 3.5).abs() < 1e-6);
    assert!(!el.is_paused());

    el.pause();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!((el.current_time() - 3.5).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn playback_ends_at_duration() {
    let media = clip();
    let mut el = media.open_video(&MediaRef::from("clip.mp4")).await.unwrap();
    el.seek(11.0).await.unwrap();
    el.play().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(el.current_time(), 12.0);
    assert!(el.is_ended());
}

#[tokio::test(start_paused = true)]
async fn stalled_element_keeps_playing_without_advancing() {
    let mut spec = ElementSpec::video(12.0, Dimensions::new(640, 360).unwrap());
    spec.stall_at = Some(4.0);
    spec.pause_at = None;
    let media = SyntheticMedia::new(EventLog::new()).with_element("stall.mp4", spec);
    let mut el = media.open_video(&MediaRef::from("stall.mp4")).await.unwrap();
    el.play().await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(el.current_time(), 4.0);
    assert!(!el.is_paused());
    assert!(!el.is_ended());
}

#[tokio::test(start_paused = true)]
async fn element_can_pause_on_its_own() {
    let mut spec = ElementSpec::video(12.0, Dimensions::new(640, 360).unwrap());
    spec.pause_at = Some(1.0);
    let media = SyntheticMedia::new(EventLog::new()).with_element("p.mp4", spec);
    let mut el = media.open_video(&MediaRef::from("p.mp4")).await.unwrap();
    el.play().await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(el.is_paused());
    assert!(!el.is_ended());
}

#[tokio::test]
async fn provider_errors_follow_asset_policy() {
    let media = clip()
        .with_element("bed.mp3", ElementSpec::audio(60.0))
        .with_broken("bad.mp4")
        .with_image("logo.png", Dimensions::new(10, 10).unwrap());

    let err = media.open_video(&MediaRef::from("bad.mp4")).await.err().unwrap();
    assert!(matches!(err, ComposeError::Setup(_)));
    assert!(media.open_video(&MediaRef::from("bed.mp3")).await.is_err());
    assert!(media.open_audio(&MediaRef::from("bed.mp3")).await.is_ok());

    let err = media.open_audio(&MediaRef::from("nope.mp3")).await.err().unwrap();
    assert!(matches!(err, ComposeError::Asset(_)));
    assert!(media.image_size(&MediaRef::from("logo.png")).await.is_ok());
    assert!(media.image_size(&MediaRef::from("other.png")).await.is_err());
}

#[test]
fn probe_table_builds_elements_and_images() {
    let mut probes = BTreeMap::new();
    probes.insert(
        MediaRef::from("clip.mp4"),
        MediaProbe::Video {
            duration: 12.0,
            width: 1920,
            height: 1080,
            has_audio: false,
        },
    );
    probes.insert(
        MediaRef::from("logo.png"),
        MediaProbe::Image {
            width: 200,
            height: 100,
        },
    );
    let media = SyntheticMedia::from_probes(&probes, EventLog::new());
    assert!(!media.elements[&MediaRef::from("clip.mp4")].has_audio);
    assert_eq!(
        media.images[&MediaRef::from("logo.png")],
        Dimensions::new(200, 100).unwrap()
    );
}
