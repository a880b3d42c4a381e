//! Timeline evaluators: one state machine per (clip, property, target).
//!
//! The clip's action timeline owns the authoritative clock and walks every
//! frame boundary crossed since the previous tick, firing embedded actions
//! and loop events exactly once per crossing. Value timelines copy that
//! clock, detect frame arrival through the frame-index table, and keep
//! current/difference buffers interpolated by tween progress. Discrete
//! timelines (display index, z-order) react on arrival only.

use crate::blend::BLEND_STATE_ADDITIVE;
use crate::clock::{ClockSpec, PlayState, TimelineClock};
use crate::ids::{ClipId, TargetId};
use crate::outputs::{CoreEvent, EventKind, Listeners, Outputs};
use crate::store::{
    correct_offset, offsets, ActionKind, AnimationSetData, ClipData, FrameStore, TimelineHeader,
    TimelineKind, TimelineView, TWEEN_TYPE_NONE,
};
use crate::targets::{SlotOrder, Target, TargetPose};
use crate::values::{normalize_radian, ChannelTween, ColorTween, ValuePool};

/// Per-tick view of the owning clip, assembled by the engine before its
/// timelines run.
pub(crate) struct ClipContext<'a> {
    pub set: &'a AnimationSetData,
    pub data: &'a ClipData,
    pub id: ClipId,
    /// Master clock computed by the action timeline this tick.
    pub clock: TimelineClock,
    pub accumulated: f32,
    pub position: f32,
    pub duration: f32,
    pub play_times: u32,
    pub time_scale: f32,
    pub playhead_active: bool,
    pub fading: bool,
    pub fade_progress: f32,
    pub action_enabled: bool,
    pub reset_to_pose: bool,
    pub display_control: bool,
}

/// Decoded value storage, chosen by timeline kind at init.
#[derive(Clone, Debug)]
pub(crate) enum Payload {
    /// Action, z-order and display timelines carry no tween values.
    Discrete,
    Tween(ChannelTween),
    Color(ColorTween),
    Deform(DeformTween),
}

/// Deform payload: tweened channels plus the same-value pool window that
/// reconstructs channels constant across the whole clip.
#[derive(Clone, Debug)]
pub(crate) struct DeformTween {
    pub tween: ChannelTween,
    pub deform_count: usize,
    pub deform_offset: usize,
    pub same_value_offset: usize,
    /// Slot display frame this timeline deforms; `None` for surfaces.
    pub display_frame: Option<usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct TimelineState {
    pub kind: TimelineKind,
    pub target: Option<TargetId>,
    pub header: Option<TimelineHeader>,
    pub clock: TimelineClock,
    pub frame_count: usize,
    /// -1 until the evaluator first arrives at a frame.
    pub frame_index: i32,
    frame_offset: usize,
    frame_value_offset: usize,
    pub dirty: bool,
    pub is_tween: bool,
    tween_progress: f32,
    frame_position: f32,
    frame_duration_r: f32,
    pub payload: Payload,
}

impl TimelineState {
    /// Build an evaluator for one timeline binding, or a pose evaluator
    /// when `header` is `None`. Returns `None` when a deform timeline's
    /// geometry cannot be matched to any display frame of the slot; the
    /// caller drops the evaluator and the target keeps its previous value.
    pub fn init(
        kind: TimelineKind,
        target: Option<TargetId>,
        header: Option<TimelineHeader>,
        set: &AnimationSetData,
        clip: &ClipData,
        target_pose: Option<&TargetPose>,
    ) -> Option<Self> {
        let (frame_count, frame_value_offset) = match header {
            Some(h) => {
                let view = TimelineView { set, clip, header: h };
                (view.frame_count(), view.frame_value_offset())
            }
            None => (0, 0),
        };

        let payload = match kind {
            TimelineKind::Action | TimelineKind::ZOrder | TimelineKind::SlotDisplay => {
                Payload::Discrete
            }
            TimelineKind::BoneAll => Payload::Tween(ChannelTween::new(
                6,
                1.0,
                ValuePool::Float,
                clip.float_offset,
            )),
            TimelineKind::BoneTranslate => Payload::Tween(ChannelTween::new(
                2,
                set.scale,
                ValuePool::Float,
                clip.float_offset,
            )),
            TimelineKind::BoneRotate | TimelineKind::BoneScale => Payload::Tween(
                ChannelTween::new(2, 1.0, ValuePool::Float, clip.float_offset),
            ),
            TimelineKind::SlotColor => Payload::Color(ColorTween::new(clip.int_offset)),
            TimelineKind::IkConstraint => Payload::Tween(ChannelTween::new(
                2,
                0.01,
                ValuePool::Int,
                clip.int_offset,
            )),
            TimelineKind::ClipProgress | TimelineKind::ClipWeight => Payload::Tween(
                ChannelTween::new(1, 0.0001, ValuePool::Int, clip.int_offset),
            ),
            TimelineKind::ClipParameters => Payload::Tween(ChannelTween::new(
                2,
                0.0001,
                ValuePool::Int,
                clip.int_offset,
            )),
            TimelineKind::Surface | TimelineKind::SlotDeform => match header {
                Some(_) => {
                    let ints = &set.store.int_array;
                    // For deform timelines the frame-value-count slot holds
                    // the deform header's offset in the clip's int region.
                    let header_int = clip.int_offset + deform_header_offset(set, clip, header);
                    let value_count = ints[header_int + offsets::DEFORM_VALUE_COUNT] as usize;
                    let deform_count = ints[header_int + offsets::DEFORM_COUNT] as usize;
                    let deform_offset = ints[header_int + offsets::DEFORM_VALUE_OFFSET] as usize;
                    let same_value_offset =
                        ints[header_int + offsets::DEFORM_FLOAT_OFFSET] as usize + clip.float_offset;
                    let display_frame = if kind == TimelineKind::SlotDeform {
                        let geometry_offset =
                            correct_offset(ints[header_int + offsets::DEFORM_VERTEX_OFFSET]);
                        let Some(TargetPose::Slot(slot)) = target_pose else {
                            return None;
                        };
                        match slot
                            .display_frames
                            .iter()
                            .position(|f| f.geometry_offset as usize == geometry_offset)
                        {
                            Some(index) => Some(index),
                            None => {
                                log::warn!(
                                    "deform timeline geometry {geometry_offset} matches no display frame; disabling"
                                );
                                return None;
                            }
                        }
                    } else {
                        None
                    };
                    Payload::Deform(DeformTween {
                        tween: ChannelTween::new(
                            value_count,
                            set.scale,
                            ValuePool::Float,
                            clip.float_offset,
                        ),
                        deform_count,
                        deform_offset,
                        same_value_offset,
                        display_frame,
                    })
                }
                None => {
                    let deform_count = match target_pose {
                        Some(TargetPose::Surface(s)) => s.deform.len(),
                        _ => 0,
                    };
                    Payload::Deform(DeformTween {
                        tween: ChannelTween::new(0, 1.0, ValuePool::Float, clip.float_offset),
                        deform_count,
                        deform_offset: 0,
                        same_value_offset: 0,
                        display_frame: None,
                    })
                }
            },
        };

        Some(Self {
            kind,
            target,
            header,
            clock: TimelineClock::default(),
            frame_count,
            frame_index: -1,
            frame_offset: 0,
            frame_value_offset,
            dirty: false,
            is_tween: false,
            tween_progress: 0.0,
            frame_position: 0.0,
            frame_duration_r: 0.0,
            payload,
        })
    }

    fn view<'a>(&self, ctx: &ClipContext<'a>) -> Option<TimelineView<'a>> {
        self.header.map(|header| TimelineView {
            set: ctx.set,
            clip: ctx.data,
            header,
        })
    }

    /// Force re-arrival detection on the next tick (seek semantics; the
    /// start event is not re-fired because play state is untouched).
    #[inline]
    pub fn seek_reset(&mut self) {
        self.frame_index = -1;
    }

    /// Copy the master clock. Single-frame timelines collapse play state to
    /// started/not-started. Returns false when the playhead did not move.
    fn sync_clock(&mut self, master: &TimelineClock) -> bool {
        let prev_state = self.clock.play_state;
        let prev_play_times = self.clock.play_times_completed;
        let prev_time = self.clock.time;

        if self.frame_count <= 1 {
            self.clock.play_state = if master.play_state == PlayState::NotStarted {
                PlayState::NotStarted
            } else {
                PlayState::Finished
            };
            self.clock.play_times_completed = 1;
            self.clock.time = master.time;
        } else {
            self.clock = *master;
        }

        if self.clock.play_times_completed == prev_play_times && self.clock.time == prev_time {
            return false;
        }
        // Re-arm arrival detection on start and on every loop seam.
        if (prev_state == PlayState::NotStarted && self.clock.play_state != prev_state)
            || (self.clock.play_state != PlayState::Finished
                && self.clock.play_times_completed != prev_play_times)
        {
            self.frame_index = -1;
        }
        true
    }

    /// Per-tick update for every timeline kind except `Action`.
    pub fn update_value(
        &mut self,
        ctx: &ClipContext,
        mut target: Option<&mut Target>,
        slot_order: &mut SlotOrder,
    ) {
        if !self.sync_clock(&ctx.clock) {
            return;
        }

        if self.frame_count > 1 {
            let view = self.view(ctx).expect("multi-frame timeline has baked data");
            let frame_index = view.locate_frame(self.clock.time) as i32;
            if self.frame_index != frame_index {
                self.frame_index = frame_index;
                self.frame_offset = view.frame_offset(frame_index as usize);
                self.on_arrive(ctx, target.as_deref_mut(), slot_order);
            }
        } else if self.frame_index < 0 {
            self.frame_index = 0;
            if let Some(view) = self.view(ctx) {
                self.frame_offset = view.frame_offset(0);
            }
            self.on_arrive(ctx, target.as_deref_mut(), slot_order);
        }

        self.on_update(ctx, target);
    }

    fn on_arrive(
        &mut self,
        ctx: &ClipContext,
        target: Option<&mut Target>,
        slot_order: &mut SlotOrder,
    ) {
        match self.kind {
            TimelineKind::SlotDisplay => {
                if self.clock.play_state == PlayState::NotStarted {
                    return;
                }
                let Some(Target {
                    pose: TargetPose::Slot(slot),
                    ..
                }) = target
                else {
                    return;
                };
                let display_index = if self.header.is_some() {
                    ctx.set.store.frame_array[self.frame_offset + offsets::DISPLAY_FRAME_VALUE]
                } else {
                    slot.rest_display_index
                };
                if slot.display_index != display_index {
                    slot.display_index = display_index;
                    slot.display_dirty = true;
                }
            }
            TimelineKind::ZOrder => {
                if self.clock.play_state == PlayState::NotStarted {
                    return;
                }
                if self.header.is_some() {
                    let fa = &ctx.set.store.frame_array;
                    let count = fa[self.frame_offset + offsets::ZORDER_FRAME_COUNT].max(0) as usize;
                    if count > 0 {
                        let start = self.frame_offset + offsets::ZORDER_FRAME_ORDER;
                        slot_order.apply(Some(&fa[start..start + count]));
                    } else {
                        slot_order.apply(None);
                    }
                } else {
                    slot_order.apply(None);
                }
            }
            TimelineKind::Action => {}
            _ => self.tween_arrive(ctx, target),
        }
    }

    fn tween_arrive(&mut self, ctx: &ClipContext, target: Option<&mut Target>) {
        self.dirty = true;

        // Tween is live unless this is the final arrival of a finite clip;
        // a looping last frame interpolates across the seam to frame 0.
        if self.header.is_some()
            && self.frame_count > 1
            && (self.frame_index != self.frame_count as i32 - 1
                || ctx.play_times == 0
                || self.clock.play_times_completed < ctx.play_times - 1)
        {
            let view = self.view(ctx).expect("checked above");
            let fa = &ctx.set.store.frame_array;
            self.is_tween =
                fa[self.frame_offset + offsets::FRAME_TWEEN_TYPE] != TWEEN_TYPE_NONE;
            self.frame_position = fa[self.frame_offset + offsets::FRAME_POSITION] as f32
                / ctx.set.frame_rate as f32;
            let span = if self.frame_index == self.frame_count as i32 - 1 {
                ctx.data.duration - self.frame_position
            } else {
                view.frame_position(self.frame_index as usize + 1) - self.frame_position
            };
            self.frame_duration_r = if span > 0.0 { 1.0 / span } else { 0.0 };
        } else {
            self.is_tween = false;
        }

        let last_frame = self.frame_count > 0 && self.frame_index == self.frame_count as i32 - 1;
        let store = &ctx.set.store;
        match &mut self.payload {
            Payload::Tween(tween) => {
                if self.header.is_some() {
                    tween.arrive(
                        store,
                        self.frame_value_offset,
                        self.frame_index as usize,
                        self.frame_count,
                        self.is_tween,
                    );
                } else {
                    tween.reset_result(0.0);
                }
                match self.kind {
                    TimelineKind::BoneRotate => {
                        if self.is_tween && last_frame {
                            tween.difference[0] = normalize_radian(tween.difference[0]);
                            tween.difference[1] = normalize_radian(tween.difference[1]);
                        }
                    }
                    TimelineKind::BoneAll => {
                        if self.is_tween && last_frame {
                            tween.difference[2] = normalize_radian(tween.difference[2]);
                            tween.difference[3] = normalize_radian(tween.difference[3]);
                        }
                        if self.header.is_none() {
                            tween.result[4] = 1.0;
                            tween.result[5] = 1.0;
                        }
                    }
                    TimelineKind::BoneScale => {
                        if self.header.is_none() {
                            tween.reset_result(1.0);
                        }
                    }
                    _ => {}
                }
            }
            Payload::Color(color) => {
                if self.header.is_some() {
                    color.arrive(
                        store,
                        self.frame_value_offset,
                        self.frame_index as usize,
                        self.frame_count,
                        self.is_tween,
                    );
                } else if let Some(Target {
                    pose: TargetPose::Slot(slot),
                    ..
                }) = target
                {
                    color.result = slot.rest_color.to_array();
                }
            }
            Payload::Deform(deform) => {
                if self.header.is_some() {
                    deform.tween.arrive(
                        store,
                        self.frame_value_offset,
                        self.frame_index as usize,
                        self.frame_count,
                        self.is_tween,
                    );
                }
            }
            Payload::Discrete => {}
        }
    }

    fn on_update(&mut self, ctx: &ClipContext, target: Option<&mut Target>) {
        if self.is_tween {
            self.dirty = true;
            self.tween_progress = (self.clock.time - self.frame_position) * self.frame_duration_r;
            let progress = self.tween_progress;
            match &mut self.payload {
                Payload::Tween(t) => t.update(progress),
                Payload::Color(c) => c.update(progress),
                Payload::Deform(d) => d.tween.update(progress),
                Payload::Discrete => {}
            }
        }

        match self.kind {
            TimelineKind::SlotColor => self.commit_color(ctx, target),
            TimelineKind::IkConstraint => self.commit_constraint(target),
            TimelineKind::ClipProgress
            | TimelineKind::ClipWeight
            | TimelineKind::ClipParameters => self.commit_clip_control(target),
            _ => {}
        }
    }

    /// Color commits directly (last writer wins across clips) and eases
    /// toward the animated value while the owning clip fades.
    fn commit_color(&mut self, ctx: &ClipContext, target: Option<&mut Target>) {
        if !(self.is_tween || self.dirty) {
            return;
        }
        let Some(Target {
            pose: TargetPose::Slot(slot),
            ..
        }) = target
        else {
            return;
        };
        let result = match &self.payload {
            Payload::Color(c) => c.result,
            _ => return,
        };
        if ctx.fading {
            let mut applied = slot.color.to_array();
            if applied != result {
                let fade_progress = ctx.fade_progress.powi(4);
                for (a, r) in applied.iter_mut().zip(result.iter()) {
                    *a += (*r - *a) * fade_progress;
                }
                slot.color.set_from_array(applied);
                slot.color_dirty = true;
            }
        } else if self.dirty {
            self.dirty = false;
            if slot.color.to_array() != result {
                slot.color.set_from_array(result);
                slot.color_dirty = true;
            }
        }
    }

    fn commit_constraint(&mut self, target: Option<&mut Target>) {
        let Some(Target {
            pose: TargetPose::Constraint(constraint),
            ..
        }) = target
        else {
            return;
        };
        let Payload::Tween(tween) = &self.payload else {
            return;
        };
        if self.header.is_some() {
            constraint.bend_positive = tween.result[0] != 0.0;
            constraint.weight = tween.result[1];
        } else {
            constraint.bend_positive = constraint.rest_bend_positive;
            constraint.weight = constraint.rest_weight;
        }
        constraint.needs_update = true;
        self.dirty = false;
    }

    fn commit_clip_control(&mut self, target: Option<&mut Target>) {
        let Some(Target {
            pose: TargetPose::Clip(control),
            ..
        }) = target
        else {
            return;
        };
        let Payload::Tween(tween) = &self.payload else {
            return;
        };
        match self.kind {
            TimelineKind::ClipProgress => control.progress = Some(tween.result[0]),
            TimelineKind::ClipWeight => control.weight = Some(tween.result[0]),
            TimelineKind::ClipParameters => {
                control.parameters = Some((tween.result[0], tween.result[1]))
            }
            _ => {}
        }
        self.dirty = false;
    }

    /// Fold this evaluator's result into the target pose under the given
    /// composition state. Only bone, surface and slot-deform kinds blend;
    /// the rest commit in `on_update`.
    pub fn blend(
        &mut self,
        pose: &mut TargetPose,
        store: &FrameStore,
        state: i32,
        blend_weight: f32,
        force_dirty: bool,
        position_scale: f32,
    ) {
        let bw = blend_weight;
        match (&self.payload, pose) {
            (Payload::Tween(t), TargetPose::Bone(bone)) => {
                let rd = &t.result;
                match self.kind {
                    TimelineKind::BoneAll => {
                        if state == BLEND_STATE_ADDITIVE {
                            bone.x += rd[0] * bw * position_scale;
                            bone.y += rd[1] * bw * position_scale;
                            bone.rotation += rd[2] * bw;
                            bone.skew += rd[3] * bw;
                            bone.scale_x += (rd[4] - 1.0) * bw;
                            bone.scale_y += (rd[5] - 1.0) * bw;
                        } else if bw != 1.0 {
                            bone.x = rd[0] * bw * position_scale;
                            bone.y = rd[1] * bw * position_scale;
                            bone.rotation = rd[2] * bw;
                            bone.skew = rd[3] * bw;
                            bone.scale_x = (rd[4] - 1.0) * bw + 1.0;
                            bone.scale_y = (rd[5] - 1.0) * bw + 1.0;
                        } else {
                            bone.x = rd[0] * position_scale;
                            bone.y = rd[1] * position_scale;
                            bone.rotation = rd[2];
                            bone.skew = rd[3];
                            bone.scale_x = rd[4];
                            bone.scale_y = rd[5];
                        }
                    }
                    TimelineKind::BoneTranslate => {
                        if state == BLEND_STATE_ADDITIVE {
                            bone.x += rd[0] * bw;
                            bone.y += rd[1] * bw;
                        } else if bw != 1.0 {
                            bone.x = rd[0] * bw;
                            bone.y = rd[1] * bw;
                        } else {
                            bone.x = rd[0];
                            bone.y = rd[1];
                        }
                    }
                    TimelineKind::BoneRotate => {
                        if state == BLEND_STATE_ADDITIVE {
                            bone.rotation += rd[0] * bw;
                            bone.skew += rd[1] * bw;
                        } else if bw != 1.0 {
                            bone.rotation = rd[0] * bw;
                            bone.skew = rd[1] * bw;
                        } else {
                            bone.rotation = rd[0];
                            bone.skew = rd[1];
                        }
                    }
                    TimelineKind::BoneScale => {
                        if state == BLEND_STATE_ADDITIVE {
                            bone.scale_x += (rd[0] - 1.0) * bw;
                            bone.scale_y += (rd[1] - 1.0) * bw;
                        } else if bw != 1.0 {
                            bone.scale_x = (rd[0] - 1.0) * bw + 1.0;
                            bone.scale_y = (rd[1] - 1.0) * bw + 1.0;
                        } else {
                            bone.scale_x = rd[0];
                            bone.scale_y = rd[1];
                        }
                    }
                    _ => return,
                }
                if force_dirty || self.dirty {
                    self.dirty = false;
                    bone.transform_dirty = true;
                }
            }
            (Payload::Deform(d), TargetPose::Surface(surface)) => {
                fold_deform(d, self.is_tween, store, state, bw, &mut surface.deform);
                if force_dirty || self.dirty {
                    self.dirty = false;
                    surface.transform_dirty = true;
                }
            }
            (Payload::Deform(d), TargetPose::Slot(slot)) => {
                let Some(frame) = d.display_frame else { return };
                fold_deform(
                    d,
                    self.is_tween,
                    store,
                    state,
                    bw,
                    &mut slot.display_frames[frame].deform,
                );
                if force_dirty || self.dirty {
                    self.dirty = false;
                    // Only the displayed geometry invalidates the mesh.
                    if slot.display_index >= 0 && slot.display_index as usize == frame {
                        slot.vertices_dirty = true;
                    }
                }
            }
            _ => {}
        }
    }

    /// Called when the owning clip starts fading out: rotation results are
    /// normalized so the cross-fade interpolates the short way, and color
    /// stops tweening.
    pub fn fade_out(&mut self) {
        match (self.kind, &mut self.payload) {
            (TimelineKind::BoneRotate, Payload::Tween(t)) => {
                t.result[0] = normalize_radian(t.result[0]);
                t.result[1] = normalize_radian(t.result[1]);
            }
            (TimelineKind::BoneAll, Payload::Tween(t)) => {
                t.result[2] = normalize_radian(t.result[2]);
                t.result[3] = normalize_radian(t.result[3]);
            }
            (TimelineKind::SlotColor, Payload::Color(_)) => {
                self.is_tween = false;
            }
            _ => {}
        }
    }

    /// Full action-timeline step: advance the master clock, handle start
    /// and completion, and enumerate every crossed frame boundary in
    /// temporal order, across multiple skipped loops and in either
    /// direction.
    pub fn update_action(
        &mut self,
        ctx: &ClipContext,
        outputs: &mut Outputs,
        listeners: &Listeners,
        slot_order: &mut SlotOrder,
    ) {
        let prev_state = self.clock.play_state;
        let mut prev_play_times = self.clock.play_times_completed;
        let prev_time = self.clock.time;
        let spec = ClockSpec {
            position: ctx.position,
            duration: ctx.duration,
            play_times: ctx.play_times,
        };
        if !self.clock.update(ctx.accumulated, &spec, ctx.playhead_active) {
            return;
        }

        if prev_state == PlayState::NotStarted {
            if self.clock.play_state == prev_state {
                return;
            }
            if ctx.display_control && ctx.reset_to_pose {
                slot_order.apply(None);
            }
            // The start tick never reports loop closures.
            prev_play_times = self.clock.play_times_completed;
            if listeners.has(EventKind::Start) {
                outputs.push_event(CoreEvent::Start { clip: ctx.id });
            }
        }

        let is_reverse = ctx.time_scale < 0.0;
        let loops_closed = self.clock.play_times_completed.abs_diff(prev_play_times);
        let mut pending_loop_events = if listeners.has(EventKind::LoopComplete) {
            loops_closed
        } else {
            0
        };
        // A finite clip's final completion clamps at the seam without
        // crossing it, so the walk wraps one time fewer.
        let mut remaining_wraps = loops_closed;
        if loops_closed > 0 && self.clock.play_state == PlayState::Finished {
            remaining_wraps -= 1;
        }
        let complete = loops_closed > 0
            && self.clock.play_state == PlayState::Finished
            && listeners.has(EventKind::Complete);

        if self.frame_count > 1 {
            let view = self.view(ctx).expect("multi-frame action timeline has data");
            let frame_index = view.locate_frame(self.clock.time) as i32;
            if self.frame_index != frame_index || remaining_wraps > 0 {
                let mut crossed = self.frame_index;
                self.frame_index = frame_index;
                self.frame_offset = view.frame_offset(frame_index as usize);

                if is_reverse {
                    if crossed < 0 {
                        crossed = view.locate_frame(prev_time) as i32;
                        if self.clock.play_times_completed == prev_play_times
                            && crossed == frame_index
                        {
                            crossed = -1; // Uncrossed on the first tick.
                        }
                    }
                    while crossed >= 0 {
                        let frame_position = view.frame_position(crossed as usize);
                        if ctx.position <= frame_position
                            && frame_position <= ctx.position + ctx.duration
                        {
                            self.cross_frame(&view, crossed as usize, ctx, outputs, listeners);
                        }
                        if crossed == 0 && remaining_wraps > 0 {
                            remaining_wraps -= 1;
                            if pending_loop_events > 0 {
                                pending_loop_events -= 1;
                                outputs.push_event(CoreEvent::LoopComplete { clip: ctx.id });
                            }
                        }
                        crossed = if crossed > 0 {
                            crossed - 1
                        } else {
                            self.frame_count as i32 - 1
                        };
                        if remaining_wraps == 0 && crossed == frame_index {
                            break;
                        }
                    }
                } else {
                    if crossed < 0 {
                        crossed = view.locate_frame(prev_time) as i32;
                        let frame_position = view.frame_position(crossed as usize);
                        if self.clock.play_times_completed == prev_play_times {
                            if prev_time <= frame_position {
                                // Crossed: back up one so the from-frame
                                // itself fires on this tick.
                                crossed = if crossed > 0 {
                                    crossed - 1
                                } else {
                                    self.frame_count as i32 - 1
                                };
                            } else if crossed == frame_index {
                                crossed = -1; // Uncrossed on the first tick.
                            }
                        }
                    }
                    while crossed >= 0 {
                        crossed = if (crossed as usize) < self.frame_count - 1 {
                            crossed + 1
                        } else {
                            0
                        };
                        let frame_position = view.frame_position(crossed as usize);
                        if ctx.position <= frame_position
                            && frame_position <= ctx.position + ctx.duration
                        {
                            self.cross_frame(&view, crossed as usize, ctx, outputs, listeners);
                        }
                        if crossed == 0 && remaining_wraps > 0 {
                            remaining_wraps -= 1;
                            if pending_loop_events > 0 {
                                pending_loop_events -= 1;
                                outputs.push_event(CoreEvent::LoopComplete { clip: ctx.id });
                            }
                        }
                        if remaining_wraps == 0 && crossed == frame_index {
                            break;
                        }
                    }
                }
            }
        } else if self.frame_index < 0 {
            self.frame_index = 0;
            if let Some(view) = self.view(ctx) {
                self.frame_offset = view.frame_offset(0);
                let frame_position = view.frame_position(0);
                if self.clock.play_times_completed == prev_play_times {
                    if prev_time <= frame_position {
                        self.cross_frame(&view, 0, ctx, outputs, listeners);
                    }
                } else if ctx.position <= frame_position {
                    if !is_reverse && pending_loop_events > 0 {
                        pending_loop_events -= 1;
                        outputs.push_event(CoreEvent::LoopComplete { clip: ctx.id });
                    }
                    self.cross_frame(&view, 0, ctx, outputs, listeners);
                }
            }
        }

        // Loop closures the walk could not attribute to a seam crossing
        // (single-frame clips, final completion) still fire.
        while pending_loop_events > 0 {
            pending_loop_events -= 1;
            outputs.push_event(CoreEvent::LoopComplete { clip: ctx.id });
        }
        if complete {
            outputs.push_event(CoreEvent::Complete { clip: ctx.id });
        }
    }

    fn cross_frame(
        &self,
        view: &TimelineView,
        frame_index: usize,
        ctx: &ClipContext,
        outputs: &mut Outputs,
        listeners: &Listeners,
    ) {
        if !ctx.action_enabled {
            return;
        }
        let fa = &ctx.set.store.frame_array;
        let frame_offset = view.frame_offset(frame_index);
        let action_count = fa[frame_offset + offsets::ACTION_FRAME_COUNT].max(0) as usize;
        if action_count == 0 {
            return;
        }
        let time = fa[frame_offset + offsets::FRAME_POSITION] as f32 / ctx.set.frame_rate as f32;
        for i in 0..action_count {
            let action_index = fa[frame_offset + offsets::ACTION_FRAME_ACTIONS + i] as usize;
            let action = &ctx.set.actions[action_index];
            match action.kind {
                ActionKind::Play => outputs.push_event(CoreEvent::Play {
                    clip: ctx.id,
                    animation: action.name.clone(),
                    time,
                }),
                ActionKind::Frame => {
                    if listeners.has(EventKind::Frame) {
                        outputs.push_event(CoreEvent::Frame {
                            clip: ctx.id,
                            name: action.name.clone(),
                            time,
                        });
                    }
                }
                ActionKind::Sound => outputs.push_event(CoreEvent::Sound {
                    clip: ctx.id,
                    name: action.name.clone(),
                    time,
                }),
            }
        }
    }
}

fn fold_deform(
    d: &DeformTween,
    is_tween: bool,
    store: &FrameStore,
    state: i32,
    blend_weight: f32,
    result: &mut [f32],
) {
    if is_tween {
        let value_count = d.tween.count;
        for i in 0..d.deform_count.min(result.len()) {
            let value = if i < d.deform_offset {
                store.float_array[d.same_value_offset + i]
            } else if i < d.deform_offset + value_count {
                d.tween.result[i - d.deform_offset]
            } else {
                store.float_array[d.same_value_offset + i - value_count]
            };
            if state == BLEND_STATE_ADDITIVE {
                result[i] += value * blend_weight;
            } else if blend_weight != 1.0 {
                result[i] = value * blend_weight;
            } else {
                result[i] = value;
            }
        }
    } else if state != BLEND_STATE_ADDITIVE {
        for r in result.iter_mut().take(d.deform_count) {
            *r = 0.0;
        }
    }
}

fn deform_header_offset(
    set: &AnimationSetData,
    clip: &ClipData,
    header: Option<TimelineHeader>,
) -> usize {
    match header {
        Some(h) => {
            TimelineView {
                set,
                clip,
                header: h,
            }
            .frame_value_count()
        }
        None => 0,
    }
}
