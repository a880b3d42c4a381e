//! Blend accumulator behavior across simultaneously active clips.

use marionette_test_fixtures::{ClipSpec, SetBuilder, TimelineSpec, ValueFrame};
use marionette_timeline_core::{
    Config, Engine, Inputs, PlayConfig, SetId, TimelineKind,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn two_clip_engine(kind: TimelineKind, v1: &[f32], v2: &[f32]) -> (Engine, SetId) {
    let mut builder = SetBuilder::new("blend", 30);
    builder.clip(ClipSpec::new("a", 4, 0).with_timeline(TimelineSpec::Value {
        kind,
        target: "root".into(),
        frames: vec![ValueFrame::step(0, v1)],
    }));
    builder.clip(ClipSpec::new("b", 4, 0).with_timeline(TimelineSpec::Value {
        kind,
        target: "root".into(),
        frames: vec![ValueFrame::step(0, v2)],
    }));
    let mut engine = Engine::new(Config::default());
    let set = engine.load_set(builder.build()).expect("valid set");
    (engine, set)
}

/// it should accumulate scale around the multiplicative identity, not as a
/// plain weighted average
#[test]
fn additive_scale_keeps_identity() {
    let (mut engine, set) = two_clip_engine(TimelineKind::BoneScale, &[1.5, 1.0], &[0.5, 1.0]);
    let root = engine.register_bone("root");
    engine
        .play(set, "a", PlayConfig { weight: 0.7, exclusive: false, ..Default::default() })
        .unwrap();
    engine
        .play(set, "b", PlayConfig { weight: 0.3, exclusive: false, ..Default::default() })
        .unwrap();
    engine.update(0.0, Inputs::default());

    let bone = *engine.target(root).unwrap().as_bone().unwrap();
    // 1.0 + 0.7*(1.5-1.0) + 0.3*(0.5-1.0), not 0.7*1.5 + 0.3*0.5.
    approx(bone.scale_x, 1.2, 1e-5);
    approx(bone.scale_y, 1.0, 1e-5);
}

/// it should blend translations as a weighted sum
#[test]
fn additive_translate_weighted_sum() {
    let (mut engine, set) = two_clip_engine(TimelineKind::BoneTranslate, &[10.0, 0.0], &[20.0, 0.0]);
    let root = engine.register_bone("root");
    engine
        .play(set, "a", PlayConfig { weight: 0.5, exclusive: false, ..Default::default() })
        .unwrap();
    engine
        .play(set, "b", PlayConfig { weight: 0.5, exclusive: false, ..Default::default() })
        .unwrap();
    engine.update(0.0, Inputs::default());
    let bone = *engine.target(root).unwrap().as_bone().unwrap();
    approx(bone.x, 15.0, 1e-5);
}

/// it should scale a lone non-unit-weight clip against the identity
#[test]
fn single_weighted_scale_identity() {
    let (mut engine, set) = two_clip_engine(TimelineKind::BoneScale, &[2.0, 1.0], &[1.0, 1.0]);
    let root = engine.register_bone("root");
    engine
        .play(set, "a", PlayConfig { weight: 0.5, ..Default::default() })
        .unwrap();
    engine.update(0.0, Inputs::default());
    let bone = *engine.target(root).unwrap().as_bone().unwrap();
    approx(bone.scale_x, 1.5, 1e-5);
}

/// it should starve lower layers once a higher layer consumes the budget
#[test]
fn lower_layer_starved_by_saturated_budget() {
    let (mut engine, set) = two_clip_engine(TimelineKind::BoneTranslate, &[10.0, 0.0], &[99.0, 0.0]);
    let root = engine.register_bone("root");
    engine
        .play(set, "a", PlayConfig { layer: 1, exclusive: false, ..Default::default() })
        .unwrap();
    engine
        .play(set, "b", PlayConfig { layer: 0, exclusive: false, ..Default::default() })
        .unwrap();
    engine.update(0.0, Inputs::default());
    let bone = *engine.target(root).unwrap().as_bone().unwrap();
    approx(bone.x, 10.0, 1e-5);
}

/// it should cross-fade same-layer clips and retire the yielding one
#[test]
fn exclusive_play_cross_fades() {
    let (mut engine, set) = two_clip_engine(TimelineKind::BoneTranslate, &[10.0, 0.0], &[20.0, 0.0]);
    let root = engine.register_bone("root");
    let first = engine.play(set, "a", PlayConfig::default()).unwrap();
    engine.update(0.0, Inputs::default());

    let _second = engine
        .play(set, "b", PlayConfig { fade_in_time: 0.5, ..Default::default() })
        .unwrap();

    // Mid-fade both contribute their fade-weighted share.
    engine.update(0.25, Inputs::default());
    let bone = *engine.target(root).unwrap().as_bone().unwrap();
    approx(bone.x, 0.5 * 10.0 + 0.5 * 20.0, 1e-4);

    // Fade finishes: the old clip is gone and the new one owns the pose.
    engine.update(0.30, Inputs::default());
    assert!(engine.clip_state(first).is_none());
    let bone = *engine.target(root).unwrap().as_bone().unwrap();
    approx(bone.x, 20.0, 1e-4);
}

/// it should propagate the target dirty flag only when values change
#[test]
fn dirty_propagates_only_on_change() {
    let (mut engine, set) = two_clip_engine(TimelineKind::BoneTranslate, &[10.0, 0.0], &[20.0, 0.0]);
    let root = engine.register_bone("root");
    engine.play(set, "a", PlayConfig::default()).unwrap();
    engine.update(0.0, Inputs::default());
    assert!(engine.target(root).unwrap().as_bone().unwrap().transform_dirty);

    // Host consumes the flag; a static step timeline does not re-set it.
    if let Some(target) = engine.target_mut(root) {
        if let marionette_timeline_core::TargetPose::Bone(bone) = &mut target.pose {
            bone.transform_dirty = false;
        }
    }
    engine.update(1.0 / 60.0, Inputs::default());
    assert!(!engine.target(root).unwrap().as_bone().unwrap().transform_dirty);
}
