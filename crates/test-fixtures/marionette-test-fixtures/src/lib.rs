//! Hand-baked animation sets for tests and benches.
//!
//! The builder plays the role of the external baking step: it lays out
//! frame records, timeline headers, frame-index segments and value pools in
//! the exact binary shape the core consumes, from a readable per-clip spec.

use marionette_timeline_core::{
    ActionData, ActionKind, AnimationSetData, ClipData, FrameStore, TimelineBinding,
    TimelineHeader, TimelineKind, TWEEN_TYPE_LINE, TWEEN_TYPE_NONE,
};
use once_cell::sync::Lazy;

/// One keyframe of a value timeline.
#[derive(Clone, Debug)]
pub struct ValueFrame {
    /// Frame position in ticks of the set frame rate.
    pub tick: u32,
    /// Interpolate toward the next frame (false = step).
    pub tween: bool,
    /// One entry per channel; cast to the int pool for int-backed kinds.
    pub values: Vec<f32>,
}

impl ValueFrame {
    pub fn tween(tick: u32, values: &[f32]) -> Self {
        Self { tick, tween: true, values: values.to_vec() }
    }

    pub fn step(tick: u32, values: &[f32]) -> Self {
        Self { tick, tween: false, values: values.to_vec() }
    }
}

/// One keyframe of a color timeline: ARGB multipliers (percent) then
/// offsets, as baked octets.
#[derive(Clone, Debug)]
pub struct ColorFrame {
    pub tick: u32,
    pub tween: bool,
    pub color: [i32; 8],
}

/// One keyframe of the action timeline: indices into the set's action table.
#[derive(Clone, Debug)]
pub struct ActionFrame {
    pub tick: u32,
    pub actions: Vec<usize>,
}

#[derive(Clone, Debug)]
pub enum TimelineSpec {
    /// Bone, surface-less scalar kinds: per-frame channel values.
    Value {
        kind: TimelineKind,
        target: String,
        frames: Vec<ValueFrame>,
    },
    Color {
        target: String,
        frames: Vec<ColorFrame>,
    },
    /// Surface or slot deform with same-value compression.
    Deform {
        kind: TimelineKind,
        target: String,
        /// Raw geometry identifier; negative values exercise the 16-bit
        /// wraparound correction.
        geometry_offset: i32,
        deform_count: usize,
        /// First channel carried per-frame; earlier ones come from the
        /// same-value pool.
        deform_offset: usize,
        same_values: Vec<f32>,
        frames: Vec<ValueFrame>,
    },
    Display {
        target: String,
        frames: Vec<(u32, i32)>,
    },
    /// `None` resets to the authored order.
    ZOrder { frames: Vec<(u32, Option<Vec<i32>>)> },
}

#[derive(Clone, Debug)]
pub struct ClipSpec {
    pub name: String,
    /// Clip length in ticks; duration = frames / frame_rate.
    pub frames: u32,
    pub play_times: u32,
    pub action_frames: Vec<ActionFrame>,
    pub timelines: Vec<TimelineSpec>,
}

impl ClipSpec {
    pub fn new(name: &str, frames: u32, play_times: u32) -> Self {
        Self {
            name: name.to_string(),
            frames,
            play_times,
            action_frames: Vec::new(),
            timelines: Vec::new(),
        }
    }

    pub fn with_action_frames(mut self, frames: Vec<ActionFrame>) -> Self {
        self.action_frames = frames;
        self
    }

    pub fn with_timeline(mut self, timeline: TimelineSpec) -> Self {
        self.timelines.push(timeline);
        self
    }
}

pub struct SetBuilder {
    name: String,
    frame_rate: u32,
    scale: f32,
    store: FrameStore,
    actions: Vec<ActionData>,
    clips: Vec<ClipData>,
}

impl SetBuilder {
    pub fn new(name: &str, frame_rate: u32) -> Self {
        Self {
            name: name.to_string(),
            frame_rate,
            scale: 1.0,
            store: FrameStore::default(),
            actions: Vec::new(),
            clips: Vec::new(),
        }
    }

    pub fn position_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Register an action and return its index for action frames.
    pub fn action(&mut self, kind: ActionKind, name: &str) -> usize {
        self.actions.push(ActionData { kind, name: name.to_string() });
        self.actions.len() - 1
    }

    pub fn clip(&mut self, spec: ClipSpec) -> &mut Self {
        self.bake_clip(spec);
        self
    }

    pub fn build(self) -> AnimationSetData {
        AnimationSetData {
            name: self.name,
            frame_rate: self.frame_rate,
            scale: self.scale,
            store: self.store,
            actions: self.actions,
            clips: self.clips,
        }
    }

    fn bake_clip(&mut self, spec: ClipSpec) {
        let frame_offset = self.store.frame_array.len();
        let int_offset = self.store.int_array.len();
        let float_offset = self.store.float_array.len();
        let mut clip = ClipData {
            name: spec.name.clone(),
            duration: spec.frames as f32 / self.frame_rate as f32,
            play_times: spec.play_times,
            frame_offset,
            int_offset,
            float_offset,
            action_timeline: None,
            timelines: Vec::new(),
        };

        if !spec.action_frames.is_empty() {
            let ticks: Vec<u32> = spec.action_frames.iter().map(|f| f.tick).collect();
            let mut rel_frames = Vec::with_capacity(spec.action_frames.len());
            for frame in &spec.action_frames {
                rel_frames.push((self.store.frame_array.len() - frame_offset) as u32);
                self.store.frame_array.push(frame.tick as i32);
                self.store.frame_array.push(frame.actions.len() as i32);
                for &index in &frame.actions {
                    self.store.frame_array.push(index as i32);
                }
            }
            clip.action_timeline = Some(self.write_header(0, 0, &rel_frames, &ticks, spec.frames));
        }

        for timeline in spec.timelines {
            match timeline {
                TimelineSpec::Value { kind, target, frames } => {
                    let channel_count = frames[0].values.len();
                    let int_backed = matches!(
                        kind,
                        TimelineKind::IkConstraint
                            | TimelineKind::ClipProgress
                            | TimelineKind::ClipWeight
                            | TimelineKind::ClipParameters
                    );
                    let value_base = if int_backed {
                        self.store.int_array.len() - int_offset
                    } else {
                        self.store.float_array.len() - float_offset
                    };
                    for frame in &frames {
                        assert_eq!(frame.values.len(), channel_count, "ragged value frames");
                        for &v in &frame.values {
                            if int_backed {
                                self.store.int_array.push(v as i32);
                            } else {
                                self.store.float_array.push(v);
                            }
                        }
                    }
                    let (ticks, rel_frames) = self.bake_value_frames(frame_offset, &frames);
                    let header =
                        self.write_header(channel_count, value_base, &rel_frames, &ticks, spec.frames);
                    clip.timelines.push(TimelineBinding { kind, target, header });
                }
                TimelineSpec::Color { target, frames } => {
                    let value_base = self.store.int_array.len() - int_offset;
                    let slot_start = self.store.int_array.len();
                    for _ in &frames {
                        self.store.int_array.push(0);
                    }
                    for (i, frame) in frames.iter().enumerate() {
                        let octets = self.store.int_array.len() as i32;
                        self.store.int_array.extend_from_slice(&frame.color);
                        self.store.int_array[slot_start + i] = octets;
                    }
                    let value_frames: Vec<ValueFrame> = frames
                        .iter()
                        .map(|f| ValueFrame { tick: f.tick, tween: f.tween, values: Vec::new() })
                        .collect();
                    let (ticks, rel_frames) = self.bake_value_frames(frame_offset, &value_frames);
                    let header = self.write_header(1, value_base, &rel_frames, &ticks, spec.frames);
                    clip.timelines.push(TimelineBinding {
                        kind: TimelineKind::SlotColor,
                        target,
                        header,
                    });
                }
                TimelineSpec::Deform {
                    kind,
                    target,
                    geometry_offset,
                    deform_count,
                    deform_offset,
                    same_values,
                    frames,
                } => {
                    let value_count = frames[0].values.len();
                    let same_rel = self.store.float_array.len() - float_offset;
                    self.store.float_array.extend_from_slice(&same_values);
                    let header_rel = self.store.int_array.len() - int_offset;
                    self.store.int_array.push(geometry_offset);
                    self.store.int_array.push(deform_count as i32);
                    self.store.int_array.push(value_count as i32);
                    self.store.int_array.push(deform_offset as i32);
                    self.store.int_array.push(same_rel as i32);
                    let value_base = self.store.float_array.len() - float_offset;
                    for frame in &frames {
                        assert_eq!(frame.values.len(), value_count, "ragged deform frames");
                        self.store.float_array.extend_from_slice(&frame.values);
                    }
                    let (ticks, rel_frames) = self.bake_value_frames(frame_offset, &frames);
                    let header =
                        self.write_header(header_rel, value_base, &rel_frames, &ticks, spec.frames);
                    clip.timelines.push(TimelineBinding { kind, target, header });
                }
                TimelineSpec::Display { target, frames } => {
                    let ticks: Vec<u32> = frames.iter().map(|f| f.0).collect();
                    let mut rel_frames = Vec::with_capacity(frames.len());
                    for (tick, display_index) in &frames {
                        rel_frames.push((self.store.frame_array.len() - frame_offset) as u32);
                        self.store.frame_array.push(*tick as i32);
                        self.store.frame_array.push(*display_index);
                    }
                    let header = self.write_header(0, 0, &rel_frames, &ticks, spec.frames);
                    clip.timelines.push(TimelineBinding {
                        kind: TimelineKind::SlotDisplay,
                        target,
                        header,
                    });
                }
                TimelineSpec::ZOrder { frames } => {
                    let ticks: Vec<u32> = frames.iter().map(|f| f.0).collect();
                    let mut rel_frames = Vec::with_capacity(frames.len());
                    for (tick, order) in &frames {
                        rel_frames.push((self.store.frame_array.len() - frame_offset) as u32);
                        self.store.frame_array.push(*tick as i32);
                        match order {
                            Some(order) => {
                                self.store.frame_array.push(order.len() as i32);
                                self.store.frame_array.extend_from_slice(order);
                            }
                            None => self.store.frame_array.push(0),
                        }
                    }
                    let header = self.write_header(0, 0, &rel_frames, &ticks, spec.frames);
                    clip.timelines.push(TimelineBinding {
                        kind: TimelineKind::ZOrder,
                        target: String::new(),
                        header,
                    });
                }
            }
        }

        self.clips.push(clip);
    }

    fn bake_value_frames(
        &mut self,
        frame_offset: usize,
        frames: &[ValueFrame],
    ) -> (Vec<u32>, Vec<u32>) {
        let ticks: Vec<u32> = frames.iter().map(|f| f.tick).collect();
        let mut rel_frames = Vec::with_capacity(frames.len());
        for frame in frames {
            rel_frames.push((self.store.frame_array.len() - frame_offset) as u32);
            self.store.frame_array.push(frame.tick as i32);
            self.store.frame_array.push(if frame.tween {
                TWEEN_TYPE_LINE
            } else {
                TWEEN_TYPE_NONE
            });
        }
        (ticks, rel_frames)
    }

    /// Append a timeline header plus its frame-index segment covering
    /// `total_ticks + 1` buckets (the extra bucket absorbs end overshoot).
    fn write_header(
        &mut self,
        frame_value_count: usize,
        frame_value_offset: usize,
        rel_frames: &[u32],
        ticks: &[u32],
        total_ticks: u32,
    ) -> TimelineHeader {
        let offset = self.store.timeline_array.len() as u32;
        self.store.timeline_array.push(rel_frames.len() as u32);
        self.store.timeline_array.push(frame_value_count as u32);
        self.store.timeline_array.push(frame_value_offset as u32);
        self.store.timeline_array.extend_from_slice(rel_frames);

        let frame_indices_offset = self.store.frame_indices.len() as u32;
        let mut active = 0usize;
        for bucket in 0..=total_ticks as usize {
            while active + 1 < ticks.len() && ticks[active + 1] as usize <= bucket {
                active += 1;
            }
            self.store.frame_indices.push(active as u32);
        }
        TimelineHeader { offset, frame_indices_offset }
    }
}

/// A looping four-frame cycle at 30 fps with bone, color and event
/// timelines; shared by benches and smoke tests.
pub fn cycle_set() -> &'static AnimationSetData {
    static SET: Lazy<AnimationSetData> = Lazy::new(|| {
        let mut builder = SetBuilder::new("cycle", 30);
        let step = builder.action(ActionKind::Frame, "step");
        let thud = builder.action(ActionKind::Sound, "thud");
        builder.clip(
            ClipSpec::new("walk", 4, 0)
                .with_action_frames(vec![
                    ActionFrame { tick: 0, actions: vec![step] },
                    ActionFrame { tick: 2, actions: vec![step, thud] },
                ])
                .with_timeline(TimelineSpec::Value {
                    kind: TimelineKind::BoneTranslate,
                    target: "root".into(),
                    frames: vec![
                        ValueFrame::tween(0, &[0.0, 0.0]),
                        ValueFrame::tween(2, &[8.0, 2.0]),
                    ],
                })
                .with_timeline(TimelineSpec::Value {
                    kind: TimelineKind::BoneRotate,
                    target: "root".into(),
                    frames: vec![
                        ValueFrame::tween(0, &[0.0, 0.0]),
                        ValueFrame::tween(2, &[0.5, 0.0]),
                    ],
                })
                .with_timeline(TimelineSpec::Color {
                    target: "body".into(),
                    frames: vec![
                        ColorFrame { tick: 0, tween: true, color: [100, 100, 100, 100, 0, 0, 0, 0] },
                        ColorFrame { tick: 2, tween: true, color: [50, 100, 100, 100, 0, 0, 0, 0] },
                    ],
                }),
        );
        builder.build()
    });
    &SET
}
