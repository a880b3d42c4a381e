//! Cross-frame walker behavior: crossing enumeration across skipped loops,
//! reverse playback, interval gating, and completion ordering.

use marionette_test_fixtures::{ActionFrame, ClipSpec, SetBuilder};
use marionette_timeline_core::{
    ActionKind, Config, CoreEvent, Engine, EventKind, Inputs, PlayConfig, PlayState, SetId,
};

/// Four one-tick frames at 30 fps, a Frame action on each keyframe.
fn four_frame_engine(play_times: u32) -> (Engine, SetId) {
    let mut builder = SetBuilder::new("events", 30);
    let f0 = builder.action(ActionKind::Frame, "f0");
    let f1 = builder.action(ActionKind::Frame, "f1");
    let f2 = builder.action(ActionKind::Frame, "f2");
    let f3 = builder.action(ActionKind::Frame, "f3");
    builder.clip(ClipSpec::new("cycle", 4, play_times).with_action_frames(vec![
        ActionFrame { tick: 0, actions: vec![f0] },
        ActionFrame { tick: 1, actions: vec![f1] },
        ActionFrame { tick: 2, actions: vec![f2] },
        ActionFrame { tick: 3, actions: vec![f3] },
    ]));
    let mut engine = Engine::new(Config::default());
    let set = engine.load_set(builder.build()).expect("valid set");
    engine.listen_all();
    (engine, set)
}

fn frame_names(events: &[CoreEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::Frame { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

fn count_kind(events: &[CoreEvent], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind() == kind).count()
}

/// it should fire every crossed frame in order across two skipped loops and
/// exactly one loop-complete per closed loop
#[test]
fn forward_walk_enumerates_skipped_loops() {
    let (mut engine, set) = four_frame_engine(0);
    let _clip = engine.play(set, "cycle", PlayConfig::default()).unwrap();

    let out = engine.update(0.0, Inputs::default());
    assert_eq!(count_kind(&out.events, EventKind::Start), 1);
    assert_eq!(frame_names(&out.events), ["f0"]);

    // One tick from frame 0 to two full loops plus frame 2.
    let out = engine.update(10.5 / 30.0, Inputs::default());
    assert_eq!(
        frame_names(&out.events),
        ["f1", "f2", "f3", "f0", "f1", "f2", "f3", "f0", "f1", "f2"]
    );
    assert_eq!(count_kind(&out.events, EventKind::LoopComplete), 2);

    // Loop-complete lands right after each frame-0 crossing.
    use EventKind::{Frame, LoopComplete};
    let kinds: Vec<EventKind> = out.events.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            Frame,
            Frame,
            Frame,
            Frame,
            LoopComplete,
            Frame,
            Frame,
            Frame,
            Frame,
            LoopComplete,
            Frame,
            Frame
        ]
    );
}

/// it should visit frames in decreasing-with-wrap order in reverse and fire
/// the same loop-complete count as forward for equal loops
#[test]
fn reverse_walk_mirrors_forward() {
    let (mut engine, set) = four_frame_engine(0);
    let clip = engine
        .play(
            set,
            "cycle",
            PlayConfig {
                time_scale: -1.0,
                ..Default::default()
            },
        )
        .unwrap();
    engine.seek(clip, 2.0 / 30.0);

    // Start just below the frame-2 boundary: only that boundary crossed.
    let out = engine.update(0.25 / 30.0, Inputs::default());
    assert_eq!(count_kind(&out.events, EventKind::Start), 1);
    assert_eq!(frame_names(&out.events), ["f2"]);

    // Two full loops back, landing inside frame 0.
    let out = engine.update(9.25 / 30.0, Inputs::default());
    assert_eq!(
        frame_names(&out.events),
        ["f1", "f0", "f3", "f2", "f1", "f0", "f3", "f2", "f1"]
    );
    assert_eq!(count_kind(&out.events, EventKind::LoopComplete), 2);
}

/// it should flush loop-complete then complete when a finite clip ends
#[test]
fn finite_clip_fires_loop_then_complete() {
    let (mut engine, set) = four_frame_engine(1);
    let clip = engine.play(set, "cycle", PlayConfig::default()).unwrap();
    engine.update(0.0, Inputs::default());

    let out = engine.update(4.5 / 30.0, Inputs::default());
    assert_eq!(frame_names(&out.events), ["f1", "f2", "f3"]);
    let tail: Vec<EventKind> = out.events[out.events.len() - 2..]
        .iter()
        .map(|e| e.kind())
        .collect();
    assert_eq!(tail, vec![EventKind::LoopComplete, EventKind::Complete]);
    assert_eq!(
        engine.clip_state(clip).unwrap().play_state(),
        PlayState::Finished
    );

    // Terminal: a further tick produces nothing.
    let out = engine.update(1.0 / 30.0, Inputs::default());
    assert!(out.events.is_empty());
}

/// it should not re-fire the frame the playhead starts inside of
#[test]
fn start_mid_frame_does_not_refire_current_frame() {
    let (mut engine, set) = four_frame_engine(0);
    let clip = engine.play(set, "cycle", PlayConfig::default()).unwrap();
    engine.seek(clip, 1.5 / 30.0);

    let out = engine.update(0.25 / 30.0, Inputs::default());
    assert_eq!(count_kind(&out.events, EventKind::Start), 1);
    assert!(frame_names(&out.events).is_empty());

    let out = engine.update(0.5 / 30.0, Inputs::default());
    assert_eq!(frame_names(&out.events), ["f2"]);
}

/// it should fire only frames whose position falls inside the played interval
#[test]
fn interval_playback_gates_crossings() {
    let (mut engine, set) = four_frame_engine(0);
    let _clip = engine
        .play(
            set,
            "cycle",
            PlayConfig {
                position: 1.0 / 30.0,
                duration: Some(2.0 / 30.0),
                ..Default::default()
            },
        )
        .unwrap();

    let out = engine.update(0.0, Inputs::default());
    assert_eq!(frame_names(&out.events), ["f1"]);

    // One interval loop plus half a tick: f0 sits outside [1, 3] ticks and
    // stays silent, the loop event still fires at the seam.
    let out = engine.update(2.5 / 30.0, Inputs::default());
    assert_eq!(frame_names(&out.events), ["f2", "f3", "f1"]);
    assert_eq!(count_kind(&out.events, EventKind::LoopComplete), 1);
}

/// it should re-fire per-loop events without listeners only for sound
#[test]
fn listener_gating_passes_sound_only() {
    let mut builder = SetBuilder::new("sound", 30);
    let ding = builder.action(ActionKind::Sound, "ding");
    let ev = builder.action(ActionKind::Frame, "ev");
    builder.clip(ClipSpec::new("cycle", 2, 0).with_action_frames(vec![ActionFrame {
        tick: 0,
        actions: vec![ding, ev],
    }]));
    let mut engine = Engine::new(Config::default());
    let set = engine.load_set(builder.build()).unwrap();
    // No listeners registered at all.
    let _clip = engine.play(set, "cycle", PlayConfig::default()).unwrap();
    let out = engine.update(0.0, Inputs::default());
    assert_eq!(count_kind(&out.events, EventKind::Sound), 1);
    assert_eq!(count_kind(&out.events, EventKind::Frame), 0);
    assert_eq!(count_kind(&out.events, EventKind::Start), 0);
}
