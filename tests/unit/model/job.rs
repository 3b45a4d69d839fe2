use super::*;

fn job() -> CompositionJob {
    CompositionJob::new(
        "a",
        "clip.mp4",
        TimeRange::new(2.0, 9.0).unwrap(),
        Dimensions::new(720, 1280).unwrap(),
    )
}

fn artifact() -> Artifact {
    Artifact {
        mime: "application/x-ndjson".to_string(),
        bytes: vec![1, 2, 3],
        frames: 3,
        duration_secs: 0.1,
    }
}

#[test]
fn happy_path_transitions() {
    let mut j = job();
    assert_eq!(j.status, JobStatus::Idle);
    j.begin_processing().unwrap();
    assert_eq!(j.status, JobStatus::Processing);
    j.complete(artifact()).unwrap();
    assert_eq!(j.status, JobStatus::Done);
    assert!(j.status.is_terminal());
    assert_eq!(j.take_artifact().unwrap().extension(), "ndjson");
    assert!(j.artifact.is_none());
}

#[test]
fn done_jobs_cannot_restart_and_idle_jobs_cannot_finish() {
    let mut j = job();
    assert!(j.complete(artifact()).is_err());
    assert!(j.fail(JobFailure::from(&ComposeError::setup("x"))).is_err());

    j.begin_processing().unwrap();
    assert!(j.begin_processing().is_err());
    j.complete(artifact()).unwrap();
    assert!(j.begin_processing().is_err());
}

#[test]
fn failed_job_can_be_retried_explicitly() {
    let mut j = job();
    j.begin_processing().unwrap();
    j.fail(JobFailure::from(&ComposeError::recording("recorder died")))
        .unwrap();
    assert_eq!(j.status, JobStatus::Error);
    assert_eq!(j.failure.as_ref().unwrap().kind, FailureKind::Recording);

    j.begin_processing().unwrap();
    assert_eq!(j.status, JobStatus::Processing);
    assert!(j.failure.is_none());
}

#[test]
fn failure_kinds_follow_error_taxonomy() {
    let cases = [
        (ComposeError::setup("x"), FailureKind::Setup),
        (ComposeError::validation("x"), FailureKind::Setup),
        (ComposeError::recording("x"), FailureKind::Recording),
        (ComposeError::cancelled("x"), FailureKind::Cancelled),
    ];
    for (err, kind) in cases {
        let f = JobFailure::from(&err);
        assert_eq!(f.kind, kind);
        assert_eq!(f.reason, err.to_string());
    }
    assert!(JobFailure::from(&ComposeError::cancelled("stop")).is_cancelled());
}

#[test]
fn job_json_roundtrip_skips_artifact() {
    let mut j = job();
    j.begin_processing().unwrap();
    j.complete(artifact()).unwrap();
    let json = serde_json::to_string(&j).unwrap();
    assert!(json.contains("\"status\":\"done\""));
    let back: CompositionJob = serde_json::from_str(&json).unwrap();
    assert_eq!(back.status, JobStatus::Done);
    assert!(back.artifact.is_none());
}
