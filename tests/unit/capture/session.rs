use super::*;
use crate::{
    foundation::core::Dimensions,
    render::display_list::DisplayListFactory,
    sim::{
        CountingAudioBackend, ElementSpec, EventLog, MemoryRecorderFactory, SimEvent,
        SyntheticMedia,
    },
    capture::progress::NoProgress,
    model::job::JobStatus,
};

fn size() -> Dimensions {
    Dimensions::new(720, 1280).unwrap()
}

fn config() -> PipelineConfig {
    PipelineConfig {
        fps: 10,
        ..PipelineConfig::default()
    }
}

#[test]
fn terminal_states() {
    assert!(CaptureState::Done.is_terminal());
    assert!(CaptureState::Error.is_terminal());
    assert!(!CaptureState::Finalizing.is_terminal());
    assert_eq!(CaptureState::Seeking.to_string(), "seeking");
}

#[test]
fn dropped_guard_aborts_the_recorder() {
    let log = EventLog::new();
    let factory = MemoryRecorderFactory::new(log.clone());
    let mut rec = factory
        .create(CaptureStream {
            size: size(),
            fps: 10,
            audio: None,
        })
        .unwrap();
    rec.start().unwrap();
    drop(RecorderGuard { inner: Some(rec) });
    assert_eq!(factory.live(), 0);
    assert_eq!(log.count(|e| *e == SimEvent::RecorderAborted), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_playback_pauses_its_elements() {
    let log = EventLog::new();
    let media = SyntheticMedia::new(log.clone())
        .with_element("clip.mp4", ElementSpec::video(5.0, size()));
    let mut video = media.open_video(&"clip.mp4".into()).await.unwrap();
    video.play().await.unwrap();
    drop(Playback {
        video,
        music: Vec::new(),
    });
    assert_eq!(
        log.events().last(),
        Some(&SimEvent::Paused("clip.mp4".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn short_session_visits_every_state_in_order() {
    let log = EventLog::new();
    let media = SyntheticMedia::new(log.clone())
        .with_element("clip.mp4", ElementSpec::video(5.0, size()));
    let audio = CountingAudioBackend::new(log.clone());
    let recorders = MemoryRecorderFactory::new(log.clone());
    let surfaces: DisplayListFactory = DisplayListFactory::default();
    let controller = CaptureController::new(&media, &audio, &recorders, &surfaces, config());

    let mut job = CompositionJob::new("a", "clip.mp4", TimeRange::new(0.0, 1.0).unwrap(), size())
        .with_audio(vec![AudioLayer::SourceAudio { muted: false }]);
    let report = controller
        .run(&mut job, &CancelToken::new(), &NoProgress)
        .await
        .unwrap();

    assert_eq!(
        report.states,
        vec![
            CaptureState::Idle,
            CaptureState::Seeking,
            CaptureState::Recording,
            CaptureState::Finalizing,
            CaptureState::Done,
        ]
    );
    assert_eq!(report.stop_reason, StopReason::RangeEnd);
    assert!((9..=11).contains(&report.frames), "frames = {}", report.frames);
    assert_eq!(report.ticks, report.frames + 1);
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(
        job.artifact.as_ref().map(|a| a.frames),
        Some(report.frames)
    );
    assert_eq!(audio.open_contexts(), 0);
    assert_eq!(recorders.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn range_past_the_media_end_is_clipped() {
    let log = EventLog::new();
    let media = SyntheticMedia::new(log.clone())
        .with_element("clip.mp4", ElementSpec::video(2.0, size()));
    let audio = CountingAudioBackend::new(log.clone());
    let recorders = MemoryRecorderFactory::new(log.clone());
    let surfaces: DisplayListFactory = DisplayListFactory::default();
    let controller = CaptureController::new(&media, &audio, &recorders, &surfaces, config());

    let mut job =
        CompositionJob::new("a", "clip.mp4", TimeRange::new(1.0, 60.0).unwrap(), size());
    let report = controller
        .run(&mut job, &CancelToken::new(), &NoProgress)
        .await
        .unwrap();
    assert_eq!(report.range, TimeRange::new(1.0, 2.0).unwrap());
    assert!(report.frame_times.iter().all(|t| *t >= 1.0 && *t < 2.0));
}

#[tokio::test(start_paused = true)]
async fn failing_recorder_start_is_a_setup_failure() {
    let log = EventLog::new();
    let media = SyntheticMedia::new(log.clone())
        .with_element("clip.mp4", ElementSpec::video(5.0, size()));
    let audio = CountingAudioBackend::new(log.clone());
    let recorders = MemoryRecorderFactory::new(log.clone()).failing_start();
    let surfaces: DisplayListFactory = DisplayListFactory::default();
    let controller = CaptureController::new(&media, &audio, &recorders, &surfaces, config());

    let mut job = CompositionJob::new("a", "clip.mp4", TimeRange::new(0.0, 1.0).unwrap(), size());
    let err = controller
        .run(&mut job, &CancelToken::new(), &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, ComposeError::Setup(_)));
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(recorders.live(), 0);
    assert_eq!(audio.open_contexts(), 0);
    assert_eq!(log.count(|e| matches!(e, SimEvent::Played(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn job_left_processing_is_marked_failed() {
    let log = EventLog::new();
    let media = SyntheticMedia::new(log.clone())
        .with_element("clip.mp4", ElementSpec::video(5.0, size()));
    let audio = CountingAudioBackend::new(log.clone());
    let recorders = MemoryRecorderFactory::new(log.clone());
    let surfaces: DisplayListFactory = DisplayListFactory::default();
    let controller = CaptureController::new(&media, &audio, &recorders, &surfaces, config());

    let mut job = CompositionJob::new("a", "clip.mp4", TimeRange::new(0.0, 1.0).unwrap(), size());
    job.status = JobStatus::Processing;
    let err = controller
        .run(&mut job, &CancelToken::new(), &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, ComposeError::Validation(_)));
    assert_eq!(job.status, JobStatus::Error);
    assert!(job.failure.as_ref().unwrap().reason.contains("processing"));
    assert_eq!(log.count(|e| matches!(e, SimEvent::Opened(_))), 0);

    // Now in `error`, so the next run is a normal retry.
    controller
        .run(&mut job, &CancelToken::new(), &NoProgress)
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Done);
}
