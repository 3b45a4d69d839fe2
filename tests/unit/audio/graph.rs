use super::*;
use crate::sim::{CountingAudioBackend, EventLog, SimEvent};

fn inputs() -> Vec<MixInput> {
    vec![
        MixInput {
            tap: AudioTap("clip.mp4".to_string()),
            muted: false,
            required: true,
        },
        MixInput {
            tap: AudioTap("bed.mp3".to_string()),
            muted: true,
            required: false,
        },
    ]
}

#[test]
fn muted_inputs_are_zero_gained_not_dropped() {
    let log = EventLog::new();
    let backend = CountingAudioBackend::new(log.clone());
    let graph = MixGraph::build(&backend, &inputs()).unwrap();

    assert_eq!(graph.branch_count(), 2);
    assert_eq!(graph.is_muted(1), Some(true));
    assert!(log.events().contains(&SimEvent::Gain {
        tap: "bed.mp3".to_string(),
        gain: 0.0
    }));
    assert_eq!(backend.open_contexts(), 1);
}

#[test]
fn set_muted_toggles_gain() {
    let log = EventLog::new();
    let backend = CountingAudioBackend::new(log.clone());
    let mut graph = MixGraph::build(&backend, &inputs()).unwrap();

    graph.set_muted(1, false).unwrap();
    assert_eq!(graph.is_muted(1), Some(false));
    assert_eq!(
        log.events().last(),
        Some(&SimEvent::Gain {
            tap: "bed.mp3".to_string(),
            gain: 1.0
        })
    );
    assert!(graph.set_muted(7, true).is_err());
}

#[test]
fn teardown_is_idempotent_and_runs_on_drop() {
    let log = EventLog::new();
    let backend = CountingAudioBackend::new(log.clone());
    let mut graph = MixGraph::build(&backend, &inputs()).unwrap();
    graph.teardown();
    graph.teardown();
    assert!(!graph.is_open());
    assert_eq!(backend.open_contexts(), 0);
    assert!(graph.set_muted(0, true).is_err());
    drop(graph);
    assert_eq!(log.count(|e| *e == SimEvent::ContextClosed), 1);

    {
        let _graph = MixGraph::build(&backend, &inputs()).unwrap();
        assert_eq!(backend.open_contexts(), 1);
    }
    assert_eq!(backend.open_contexts(), 0);
}

#[test]
fn failed_required_connect_closes_the_context() {
    let backend = CountingAudioBackend::new(EventLog::new()).failing_tap("clip.mp4");
    let err = MixGraph::build(&backend, &inputs()).unwrap_err();
    assert!(err.to_string().contains("clip.mp4"));
    assert_eq!(backend.contexts_created(), 1);
    assert_eq!(backend.open_contexts(), 0);
}

#[test]
fn empty_mix_still_has_a_destination() {
    let backend = CountingAudioBackend::new(EventLog::new());
    let graph = MixGraph::build(&backend, &[]).unwrap();
    assert_eq!(graph.branch_count(), 0);
    assert!(graph.output().label.starts_with("mix-"));
}

#[test]
fn failed_optional_connect_is_skipped() {
    let log = EventLog::new();
    let backend = CountingAudioBackend::new(log.clone()).failing_tap("bed.mp3");
    let mut graph = MixGraph::build(&backend, &inputs()).unwrap();

    assert!(graph.is_open());
    assert_eq!(graph.branch_count(), 1);
    assert_eq!(graph.is_muted(0), Some(false));
    assert_eq!(graph.is_muted(1), None);
    assert!(!log.events().iter().any(|e| matches!(e, SimEvent::Gain { tap, .. } if tap == "bed.mp3")));
    assert_eq!(backend.open_contexts(), 1);

    graph.teardown();
    assert_eq!(backend.open_contexts(), 0);
}
