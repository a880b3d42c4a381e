//! Engine surface: loading, playback lifecycle, discrete timelines, serde.

use marionette_test_fixtures::{cycle_set, ClipSpec, SetBuilder, TimelineSpec, ValueFrame};
use marionette_timeline_core::{
    ColorTransform, Config, CoreEvent, Engine, EventKind, Inputs, LoadError, PlayConfig,
    PlayError, PlayState, TimelineKind,
};

fn count_kind(events: &[CoreEvent], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind() == kind).count()
}

/// it should round-trip a baked set and the config through serde
#[test]
fn serde_roundtrip_set_and_config() {
    let set = cycle_set();
    let json = serde_json::to_string(set).unwrap();
    let back: marionette_timeline_core::AnimationSetData = serde_json::from_str(&json).unwrap();
    assert_eq!(*set, back);

    let cfg = Config::default();
    let json = serde_json::to_string(&cfg).unwrap();
    let cfg2: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg2.max_events_per_tick, cfg.max_events_per_tick);
}

/// it should reject malformed sets at load and unknown names at play
#[test]
fn load_and_play_errors() {
    let mut engine = Engine::new(Config::default());
    let empty = SetBuilder::new("empty", 30).build();
    assert!(matches!(engine.load_set(empty), Err(LoadError::NoClips(_))));

    let set = engine.load_set(cycle_set().clone()).unwrap();
    assert!(matches!(
        engine.play(set, "missing", PlayConfig::default()),
        Err(PlayError::UnknownClip(_))
    ));
    assert!(matches!(
        engine.play(marionette_timeline_core::SetId(99), "walk", PlayConfig::default()),
        Err(PlayError::UnknownSet(_))
    ));
}

/// it should switch display indices on arrival and skip unchanged values
#[test]
fn display_timeline_switches_on_arrival() {
    let mut builder = SetBuilder::new("faces", 30);
    builder.clip(
        ClipSpec::new("faces", 4, 0).with_timeline(TimelineSpec::Display {
            target: "face".into(),
            frames: vec![(0, 1), (2, 0)],
        }),
    );
    let mut engine = Engine::new(Config::default());
    let set = engine.load_set(builder.build()).unwrap();
    let face = engine.register_slot("face", ColorTransform::default(), 0, vec![]);
    engine.play(set, "faces", PlayConfig::default()).unwrap();

    engine.update(0.0, Inputs::default());
    let slot = engine.target(face).unwrap().as_slot().unwrap();
    assert_eq!(slot.display_index, 1);
    assert!(slot.display_dirty);

    if let Some(target) = engine.target_mut(face) {
        if let marionette_timeline_core::TargetPose::Slot(s) = &mut target.pose {
            s.display_dirty = false;
        }
    }
    // Still inside frame 0: no arrival, no change.
    engine.update(0.5 / 30.0, Inputs::default());
    let slot = engine.target(face).unwrap().as_slot().unwrap();
    assert_eq!(slot.display_index, 1);
    assert!(!slot.display_dirty);

    engine.update(2.0 / 30.0, Inputs::default());
    let slot = engine.target(face).unwrap().as_slot().unwrap();
    assert_eq!(slot.display_index, 0);
    assert!(slot.display_dirty);
}

/// it should apply z-order permutations and reset to authored order
#[test]
fn zorder_timeline_permutes_and_resets() {
    let mut builder = SetBuilder::new("order", 30);
    builder.clip(
        ClipSpec::new("order", 4, 0).with_timeline(TimelineSpec::ZOrder {
            frames: vec![(0, Some(vec![2, 0, 1])), (2, None)],
        }),
    );
    let mut engine = Engine::new(Config::default());
    let set = engine.load_set(builder.build()).unwrap();
    engine.play(set, "order", PlayConfig::default()).unwrap();

    engine.update(0.0, Inputs::default());
    assert_eq!(engine.slot_order().order.as_deref(), Some(&[2u32, 0, 1][..]));
    assert!(engine.slot_order().dirty);

    engine.slot_order_mut().dirty = false;
    engine.update(2.5 / 30.0, Inputs::default());
    assert!(engine.slot_order().order.is_none());
    assert!(engine.slot_order().dirty);
}

/// it should not re-fire start after a seek
#[test]
fn seek_does_not_refire_start() {
    let mut engine = Engine::new(Config::default());
    let set = engine.load_set(cycle_set().clone()).unwrap();
    engine.listen_all();
    engine.register_bone("root");
    engine.register_slot("body", ColorTransform::default(), 0, vec![]);
    let clip = engine.play(set, "walk", PlayConfig::default()).unwrap();

    let out = engine.update(0.0, Inputs::default());
    assert_eq!(count_kind(&out.events, EventKind::Start), 1);

    engine.seek(clip, 2.0 / 30.0);
    let out = engine.update(0.5 / 30.0, Inputs::default());
    assert_eq!(count_kind(&out.events, EventKind::Start), 0);
    assert_eq!(engine.clip_state(clip).unwrap().play_state(), PlayState::Playing);
}

/// it should stop clips through inputs and reuse their evaluator slots
#[test]
fn stop_releases_and_replays() {
    let mut engine = Engine::new(Config::default());
    let set = engine.load_set(cycle_set().clone()).unwrap();
    engine.register_bone("root");
    engine.register_slot("body", ColorTransform::default(), 0, vec![]);
    let clip = engine.play(set, "walk", PlayConfig::default()).unwrap();
    engine.update(0.0, Inputs::default());

    let inputs = Inputs {
        clip_cmds: vec![marionette_timeline_core::ClipCommand::Stop { clip }],
    };
    let out = engine.update(1.0 / 60.0, inputs);
    assert!(out.events.is_empty());
    assert!(engine.clip_state(clip).is_none());

    // Freed slots are reused for the next playback.
    let again = engine.play(set, "walk", PlayConfig::default()).unwrap();
    engine.update(0.0, Inputs::default());
    assert_eq!(engine.clip_state(again).unwrap().play_state(), PlayState::Playing);
}

/// it should emit fade lifecycle events when listened for
#[test]
fn fade_out_emits_lifecycle_events() {
    let mut engine = Engine::new(Config::default());
    let set = engine.load_set(cycle_set().clone()).unwrap();
    engine.listen_all();
    engine.register_bone("root");
    engine.register_slot("body", ColorTransform::default(), 0, vec![]);
    let clip = engine.play(set, "walk", PlayConfig::default()).unwrap();
    engine.update(0.0, Inputs::default());

    engine.fade_out(clip, 0.1);
    let out = engine.update(0.05, Inputs::default());
    assert_eq!(count_kind(&out.events, EventKind::FadeOut), 1);
    let out = engine.update(0.1, Inputs::default());
    assert_eq!(count_kind(&out.events, EventKind::FadeOutComplete), 1);
    assert!(engine.clip_state(clip).is_none());
}

/// it should drop events past the configured per-tick cap
#[test]
fn event_cap_applies_backpressure() {
    let mut builder = SetBuilder::new("noisy", 30);
    let ding = builder.action(marionette_timeline_core::ActionKind::Sound, "ding");
    builder.clip(ClipSpec::new("noisy", 4, 0).with_action_frames(
        (0..4)
            .map(|tick| marionette_test_fixtures::ActionFrame { tick, actions: vec![ding] })
            .collect(),
    ));
    let mut engine = Engine::new(Config {
        max_events_per_tick: 4,
        ..Default::default()
    });
    let set = engine.load_set(builder.build()).unwrap();
    engine.play(set, "noisy", PlayConfig::default()).unwrap();
    engine.update(0.0, Inputs::default());

    // Dozens of crossings in one tick, but only four queued.
    let out = engine.update(40.5 / 30.0, Inputs::default());
    assert_eq!(out.events.len(), 4);
    assert!(out.dropped_events > 0);
}

/// it should expose registered targets by name
#[test]
fn find_target_by_name() {
    let mut engine = Engine::new(Config::default());
    let id = engine.register_bone("spine");
    assert_eq!(engine.find_target("spine"), Some(id));
    assert!(engine.find_target("tail").is_none());
    assert_eq!(engine.target(id).unwrap().name, "spine");
}

/// it should keep timelines with unregistered targets from breaking playback
#[test]
fn unresolved_target_is_skipped() {
    let mut builder = SetBuilder::new("ghost", 30);
    builder.clip(
        ClipSpec::new("ghost", 4, 0).with_timeline(TimelineSpec::Value {
            kind: TimelineKind::BoneTranslate,
            target: "nobody".into(),
            frames: vec![ValueFrame::tween(0, &[1.0, 1.0]), ValueFrame::tween(2, &[2.0, 2.0])],
        }),
    );
    let mut engine = Engine::new(Config::default());
    let set = engine.load_set(builder.build()).unwrap();
    engine.play(set, "ghost", PlayConfig::default()).unwrap();
    engine.update(1.0 / 60.0, Inputs::default());
}
