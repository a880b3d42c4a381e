//! Engine: data ownership and the per-tick control flow.
//!
//! Single-threaded and tick-driven: the host calls update(dt, inputs) once
//! per frame. Commands apply first, then every active clip advances its
//! action timeline (events, frame crossings) and folds its value timelines
//! into the target poses. Targets are valid for consumption only after
//! update returns.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{ClockSpec, PlayState, TimelineClock};
use crate::config::Config;
use crate::ids::{ClipId, IdAllocator, SetId, TargetId};
use crate::inputs::{ClipCommand, Inputs};
use crate::outputs::{CoreEvent, EventKind, Listeners, Outputs};
use crate::store::{AnimationSetData, LoadError, TimelineKind};
use crate::targets::{
    BonePose, ClipControlPose, ColorTransform, ConstraintPose, DisplayFrame, SlotOrder, SlotPose,
    SurfacePose, Target, TargetPose,
};
use crate::timeline::{ClipContext, TimelineState};

#[derive(Debug, Error)]
pub enum PlayError {
    #[error("unknown animation set {0:?}")]
    UnknownSet(SetId),
    #[error("animation set has no clip named '{0}'")]
    UnknownClip(String),
}

/// Options for starting a clip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayConfig {
    /// Loop count override; `None` uses the baked default. 0 loops forever.
    pub play_times: Option<u32>,
    pub layer: i32,
    pub weight: f32,
    /// Signed; negative plays in reverse.
    pub time_scale: f32,
    pub fade_in_time: f32,
    /// Interval playback: start offset within the clip, seconds.
    pub position: f32,
    /// Interval playback: played length; `None` plays to the clip end.
    pub duration: Option<f32>,
    /// Fade out other clips on the same layer (cross-fade). Disable to
    /// layer clips additively.
    pub exclusive: bool,
    pub action_enabled: bool,
    /// Create pose evaluators that force untouched targets back to rest.
    pub reset_to_pose: bool,
    /// Whether this clip drives display indices and draw order.
    pub display_control: bool,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            play_times: None,
            layer: 0,
            weight: 1.0,
            time_scale: 1.0,
            fade_in_time: 0.0,
            position: 0.0,
            duration: None,
            exclusive: true,
            action_enabled: true,
            reset_to_pose: true,
            display_control: true,
        }
    }
}

/// One active animation instance.
#[derive(Clone, Debug)]
pub struct ClipState {
    pub id: ClipId,
    pub name: String,
    set_index: usize,
    clip_index: usize,
    pub layer: i32,
    pub weight: f32,
    pub time_scale: f32,
    pub play_times: u32,
    pub position: f32,
    pub duration: f32,
    /// Blend-tree parameters written by nested-clip parameter timelines.
    pub parameter_x: f32,
    pub parameter_y: f32,
    /// Signed accumulated playhead, seconds.
    accumulated: f32,
    playhead_active: bool,
    pub action_enabled: bool,
    pub reset_to_pose: bool,
    pub display_control: bool,
    /// -1 fading in, 0 active, 1 fading out.
    fade_state: i8,
    /// -1 fade pending its start event, 0 fading, 1 fade complete.
    sub_fade_state: i8,
    fade_time: f32,
    fade_total_time: f32,
    pub fade_progress: f32,
    weight_result: f32,
    pub clock: TimelineClock,
    action_slot: usize,
    timeline_slots: Vec<usize>,
}

impl ClipState {
    #[inline]
    pub fn play_state(&self) -> PlayState {
        self.clock.play_state
    }

    #[inline]
    pub fn current_time(&self) -> f32 {
        self.clock.time
    }

    #[inline]
    pub fn loops_completed(&self) -> u32 {
        self.clock.play_times_completed
    }

    #[inline]
    pub fn is_fading(&self) -> bool {
        self.fade_state != 0
    }

    /// Wall-clock span of the whole playback, used to map progress values.
    pub fn total_time(&self) -> f32 {
        if self.play_times > 0 {
            self.play_times as f32 * self.duration
        } else {
            self.duration
        }
    }

    fn advance_fade(&mut self, mut passed: f32, outputs: &mut Outputs, listeners: &Listeners) {
        let is_fade_out = self.fade_state > 0;
        if self.sub_fade_state < 0 {
            self.sub_fade_state = 0;
            let event = if is_fade_out {
                CoreEvent::FadeOut { clip: self.id }
            } else {
                CoreEvent::FadeIn { clip: self.id }
            };
            if listeners.has(event.kind()) {
                outputs.push_event(event);
            }
        }
        if passed < 0.0 {
            passed = -passed;
        }
        self.fade_time += passed;
        let mut completed = false;
        if self.fade_time >= self.fade_total_time {
            if self.sub_fade_state == 0 {
                completed = true;
            }
            self.sub_fade_state = 1;
            self.fade_progress = if is_fade_out { 0.0 } else { 1.0 };
        } else if self.fade_time > 0.0 {
            self.fade_progress = if is_fade_out {
                1.0 - self.fade_time / self.fade_total_time
            } else {
                self.fade_time / self.fade_total_time
            };
        } else {
            self.fade_progress = if is_fade_out { 1.0 } else { 0.0 };
        }
        if completed {
            if !is_fade_out {
                self.fade_state = 0;
            }
            let event = if is_fade_out {
                CoreEvent::FadeOutComplete { clip: self.id }
            } else {
                CoreEvent::FadeInComplete { clip: self.id }
            };
            if listeners.has(event.kind()) {
                outputs.push_event(event);
            }
        }
    }

    /// Move the playhead to `value` seconds within the current loop,
    /// preserving the completed loop count so no loop events fire.
    fn seek(&mut self, mut value: f32) {
        if self.duration > 0.0 {
            value %= self.duration;
            if value < 0.0 {
                value += self.duration;
            }
        }
        let base = self.clock.play_times_completed as f32 * self.duration;
        self.accumulated = if self.time_scale < 0.0 {
            -(base + (self.duration - value))
        } else {
            base + value
        };
    }
}

/// Evaluator slots reused across clip lifetimes through a free list.
/// Evaluators never outlive their clip, so indices are stable handles.
#[derive(Debug, Default)]
struct EvaluatorArena {
    slots: Vec<Option<TimelineState>>,
    free: Vec<usize>,
}

impl EvaluatorArena {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    fn alloc(&mut self, state: TimelineState) -> usize {
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(state);
            index
        } else {
            self.slots.push(Some(state));
            self.slots.len() - 1
        }
    }

    fn release(&mut self, index: usize) {
        if self.slots[index].take().is_some() {
            self.free.push(index);
        }
    }

    #[inline]
    fn get_mut(&mut self, index: usize) -> &mut TimelineState {
        self.slots[index].as_mut().expect("live evaluator slot")
    }
}

pub struct Engine {
    cfg: Config,
    ids: IdAllocator,
    sets: Vec<(SetId, AnimationSetData)>,
    targets: Vec<Target>,
    binding: HashMap<String, TargetId>,
    clips: Vec<ClipState>,
    evaluators: EvaluatorArena,
    outputs: Outputs,
    listeners: Listeners,
    slot_order: SlotOrder,
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        Self {
            evaluators: EvaluatorArena::with_capacity(cfg.evaluator_capacity),
            outputs: Outputs::with_cap(cfg.max_events_per_tick),
            cfg,
            ids: IdAllocator::new(),
            sets: Vec::new(),
            targets: Vec::new(),
            binding: HashMap::new(),
            clips: Vec::new(),
            listeners: Listeners::default(),
            slot_order: SlotOrder::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Load a validated baked set.
    pub fn load_set(&mut self, data: AnimationSetData) -> Result<SetId, LoadError> {
        data.validate()?;
        let id = self.ids.alloc_set();
        self.sets.push((id, data));
        Ok(id)
    }

    fn register(&mut self, name: &str, pose: TargetPose) -> TargetId {
        if let Some(&existing) = self.binding.get(name) {
            self.targets[existing.0 as usize] = Target::new(name.to_string(), pose);
            return existing;
        }
        let id = TargetId(self.targets.len() as u32);
        self.targets.push(Target::new(name.to_string(), pose));
        self.binding.insert(name.to_string(), id);
        id
    }

    pub fn register_bone(&mut self, name: &str) -> TargetId {
        self.register(name, TargetPose::Bone(BonePose::default()))
    }

    pub fn register_slot(
        &mut self,
        name: &str,
        rest_color: ColorTransform,
        rest_display_index: i32,
        display_frames: Vec<DisplayFrame>,
    ) -> TargetId {
        let pose = SlotPose {
            rest_color,
            color: rest_color,
            rest_display_index,
            display_index: rest_display_index,
            display_frames,
            ..Default::default()
        };
        self.register(name, TargetPose::Slot(pose))
    }

    pub fn register_surface(&mut self, name: &str, vertex_count: usize) -> TargetId {
        self.register(
            name,
            TargetPose::Surface(SurfacePose {
                deform: vec![0.0; vertex_count],
                transform_dirty: false,
            }),
        )
    }

    pub fn register_constraint(&mut self, name: &str, bend_positive: bool, weight: f32) -> TargetId {
        self.register(
            name,
            TargetPose::Constraint(ConstraintPose {
                rest_bend_positive: bend_positive,
                rest_weight: weight,
                bend_positive,
                weight,
                needs_update: false,
            }),
        )
    }

    /// Register a nested-clip parameter target. Bind it to a playing clip
    /// with [`Engine::bind_clip_control`].
    pub fn register_clip_control(&mut self, name: &str) -> TargetId {
        self.register(name, TargetPose::Clip(ClipControlPose::default()))
    }

    pub fn bind_clip_control(&mut self, target: TargetId, clip: ClipId) {
        if let Some(Target {
            pose: TargetPose::Clip(control),
            ..
        }) = self.targets.get_mut(target.0 as usize)
        {
            control.control = Some(clip);
        }
    }

    pub fn set_listening(&mut self, kind: EventKind, enabled: bool) {
        self.listeners.listen(kind, enabled);
    }

    pub fn listen_all(&mut self) {
        self.listeners = Listeners::all();
    }

    pub fn find_target(&self, name: &str) -> Option<TargetId> {
        self.binding.get(name).copied()
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0 as usize)
    }

    /// Mutable access for the consuming host, e.g. to clear dirty flags.
    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.get_mut(id.0 as usize)
    }

    pub fn slot_order(&self) -> &SlotOrder {
        &self.slot_order
    }

    pub fn slot_order_mut(&mut self) -> &mut SlotOrder {
        &mut self.slot_order
    }

    pub fn clip_state(&self, id: ClipId) -> Option<&ClipState> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn clips(&self) -> impl Iterator<Item = &ClipState> {
        self.clips.iter()
    }

    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Start playing a clip. Same-layer clips cross-fade out unless the
    /// config opts out of exclusivity.
    pub fn play(&mut self, set: SetId, clip_name: &str, cfg: PlayConfig) -> Result<ClipId, PlayError> {
        let set_index = self
            .sets
            .iter()
            .position(|(id, _)| *id == set)
            .ok_or(PlayError::UnknownSet(set))?;
        let clip_index = self.sets[set_index]
            .1
            .clips
            .iter()
            .position(|c| c.name == clip_name)
            .ok_or_else(|| PlayError::UnknownClip(clip_name.to_string()))?;

        if cfg.exclusive {
            let fade = cfg.fade_in_time.max(0.0);
            let yielding: Vec<ClipId> = self
                .clips
                .iter()
                .filter(|c| c.layer == cfg.layer)
                .map(|c| c.id)
                .collect();
            for id in yielding {
                self.fade_out(id, fade);
            }
        }

        let id = self.ids.alloc_clip();
        let data = &self.sets[set_index].1;
        let clip_data = &data.clips[clip_index];
        let position = cfg.position.clamp(0.0, clip_data.duration);
        let max_duration = clip_data.duration - position;
        let duration = cfg
            .duration
            .unwrap_or(max_duration)
            .min(max_duration)
            .max(0.000_001);

        let mut state = ClipState {
            id,
            name: clip_data.name.clone(),
            set_index,
            clip_index,
            layer: cfg.layer,
            weight: cfg.weight,
            time_scale: cfg.time_scale,
            play_times: cfg.play_times.unwrap_or(clip_data.play_times),
            position,
            duration,
            parameter_x: 0.0,
            parameter_y: 0.0,
            accumulated: 0.0,
            playhead_active: true,
            action_enabled: cfg.action_enabled,
            reset_to_pose: cfg.reset_to_pose,
            display_control: cfg.display_control,
            fade_state: -1,
            sub_fade_state: -1,
            fade_time: 0.0,
            fade_total_time: cfg.fade_in_time.max(0.0),
            fade_progress: 0.0,
            weight_result: 0.0,
            clock: TimelineClock::default(),
            action_slot: 0,
            timeline_slots: Vec::new(),
        };

        let action = TimelineState::init(
            TimelineKind::Action,
            None,
            clip_data.action_timeline,
            data,
            clip_data,
            None,
        )
        .expect("action evaluator never fails to init");
        state.action_slot = self.evaluators.alloc(action);

        // Targets already covered by a baked timeline; the rest get pose
        // evaluators below when the clip resets to pose.
        let mut bone_covered: Vec<TargetId> = Vec::new();
        let mut color_covered: Vec<TargetId> = Vec::new();
        let mut display_covered: Vec<TargetId> = Vec::new();
        let mut constraint_covered: Vec<TargetId> = Vec::new();

        for binding in &clip_data.timelines {
            let target_id = if binding.kind == TimelineKind::ZOrder {
                if !cfg.display_control {
                    continue;
                }
                None
            } else {
                match self.binding.get(binding.target.as_str()) {
                    Some(&tid) => {
                        if binding.kind == TimelineKind::SlotDisplay && !cfg.display_control {
                            continue;
                        }
                        Some(tid)
                    }
                    None => {
                        log::warn!(
                            "timeline target '{}' is not registered; skipping",
                            binding.target
                        );
                        continue;
                    }
                }
            };
            let target_pose = match target_id {
                Some(tid) => Some(&self.targets[tid.0 as usize].pose),
                None => None,
            };
            let Some(evaluator) = TimelineState::init(
                binding.kind,
                target_id,
                Some(binding.header),
                data,
                clip_data,
                target_pose,
            ) else {
                // Deform geometry miss; already logged.
                continue;
            };
            if let Some(tid) = target_id {
                match binding.kind {
                    TimelineKind::BoneAll
                    | TimelineKind::BoneTranslate
                    | TimelineKind::BoneRotate
                    | TimelineKind::BoneScale => bone_covered.push(tid),
                    TimelineKind::SlotColor => color_covered.push(tid),
                    TimelineKind::SlotDisplay => display_covered.push(tid),
                    TimelineKind::IkConstraint => constraint_covered.push(tid),
                    _ => {}
                }
            }
            state.timeline_slots.push(self.evaluators.alloc(evaluator));
        }

        if cfg.reset_to_pose {
            for index in 0..self.targets.len() {
                let tid = TargetId(index as u32);
                let pose_kinds: &[TimelineKind] = match &self.targets[index].pose {
                    TargetPose::Bone(_) if !bone_covered.contains(&tid) => {
                        &[TimelineKind::BoneAll]
                    }
                    TargetPose::Slot(_) => {
                        let color = !color_covered.contains(&tid);
                        let display = cfg.display_control && !display_covered.contains(&tid);
                        match (color, display) {
                            (true, true) => &[TimelineKind::SlotColor, TimelineKind::SlotDisplay],
                            (true, false) => &[TimelineKind::SlotColor],
                            (false, true) => &[TimelineKind::SlotDisplay],
                            (false, false) => &[],
                        }
                    }
                    TargetPose::Constraint(_) if !constraint_covered.contains(&tid) => {
                        &[TimelineKind::IkConstraint]
                    }
                    _ => &[],
                };
                for &kind in pose_kinds {
                    if let Some(evaluator) = TimelineState::init(
                        kind,
                        Some(tid),
                        None,
                        data,
                        clip_data,
                        Some(&self.targets[index].pose),
                    ) {
                        state.timeline_slots.push(self.evaluators.alloc(evaluator));
                    }
                }
            }
        }

        self.clips.push(state);
        Ok(id)
    }

    /// Remove a clip immediately, returning its evaluators to the pool.
    pub fn stop(&mut self, clip: ClipId) {
        if let Some(index) = self.clips.iter().position(|c| c.id == clip) {
            let state = self.clips.remove(index);
            self.release_clip(&state);
        }
    }

    /// Begin fading a clip out; it is retired once the fade completes. A
    /// fade-out already faster than the requested one is left alone, and an
    /// interrupted fade-in resumes from its current progress.
    pub fn fade_out(&mut self, clip: ClipId, fade_out_time: f32) {
        let Some(state) = self.clips.iter_mut().find(|c| c.id == clip) else {
            return;
        };
        let fade_out_time = fade_out_time.max(0.0);
        state.playhead_active = false;
        if state.fade_state > 0 {
            if fade_out_time > state.fade_total_time - state.fade_time {
                return;
            }
        } else {
            state.fade_state = 1;
            state.sub_fade_state = -1;
            if fade_out_time <= 0.0 || state.fade_progress <= 0.0 {
                state.fade_progress = 0.000_001;
            }
            self.evaluators.get_mut(state.action_slot).fade_out();
            for &slot in &state.timeline_slots {
                self.evaluators.get_mut(slot).fade_out();
            }
        }
        state.fade_total_time = if state.fade_progress > 0.000_001 {
            fade_out_time / state.fade_progress
        } else {
            0.0
        };
        state.fade_time = state.fade_total_time * (1.0 - state.fade_progress);
    }

    /// Jump a clip's playhead. Evaluators re-arm arrival detection; start
    /// is not re-fired. The master clock moves immediately so the next
    /// tick's crossings are computed from the seeked position.
    pub fn seek(&mut self, clip: ClipId, time: f32) {
        let Some(state) = self.clips.iter_mut().find(|c| c.id == clip) else {
            return;
        };
        state.seek(time);
        let spec = ClockSpec {
            position: state.position,
            duration: state.duration,
            play_times: state.play_times,
        };
        let action = self.evaluators.get_mut(state.action_slot);
        action.clock.update(state.accumulated, &spec, false);
        action.seek_reset();
        state.clock = action.clock;
        for &slot in &state.timeline_slots {
            self.evaluators.get_mut(slot).seek_reset();
        }
    }

    fn release_clip(&mut self, state: &ClipState) {
        self.evaluators.release(state.action_slot);
        for &slot in &state.timeline_slots {
            self.evaluators.release(slot);
        }
    }

    fn apply_inputs(&mut self, inputs: Inputs) {
        for cmd in inputs.clip_cmds {
            match cmd {
                ClipCommand::Stop { clip } => self.stop(clip),
                ClipCommand::FadeOut { clip, duration } => self.fade_out(clip, duration),
                ClipCommand::Seek { clip, time } => self.seek(clip, time),
                ClipCommand::SetTimeScale { clip, value } => {
                    if let Some(state) = self.clips.iter_mut().find(|c| c.id == clip) {
                        state.time_scale = value;
                    }
                }
                ClipCommand::SetWeight { clip, value } => {
                    if let Some(state) = self.clips.iter_mut().find(|c| c.id == clip) {
                        state.weight = value;
                    }
                }
            }
        }
    }

    /// Step the simulation by dt seconds with the given inputs.
    pub fn update(&mut self, dt: f32, inputs: Inputs) -> &Outputs {
        self.outputs.clear();
        self.apply_inputs(inputs);
        for target in &mut self.targets {
            target.blend.clear();
            target.deform_blend.clear();
        }

        let mut order: Vec<usize> = (0..self.clips.len()).collect();
        // Higher layers run first and consume blend budget before lower
        // ones; insertion order breaks ties (stable sort).
        order.sort_by_key(|&i| std::cmp::Reverse(self.clips[i].layer));
        for &clip_index in &order {
            self.advance_clip(clip_index, dt);
        }

        let mut index = 0;
        while index < self.clips.len() {
            if self.clips[index].fade_state > 0 && self.clips[index].fade_progress <= 0.0 {
                let state = self.clips.remove(index);
                self.release_clip(&state);
            } else {
                index += 1;
            }
        }

        self.apply_clip_controls();
        &self.outputs
    }

    fn advance_clip(&mut self, clip_index: usize, dt: f32) {
        let Engine {
            sets,
            targets,
            clips,
            evaluators,
            outputs,
            listeners,
            slot_order,
            ..
        } = self;
        let clip = &mut clips[clip_index];
        let set_data = &sets[clip.set_index].1;
        let clip_data = &set_data.clips[clip.clip_index];

        if clip.fade_state != 0 {
            clip.advance_fade(dt, outputs, listeners);
        }
        clip.weight_result = clip.weight * clip.fade_progress;
        // A paused playhead (fade-out) holds its pose; only the fade moves.
        if clip.playhead_active {
            clip.accumulated += dt * clip.time_scale;
        }

        let mut ctx = ClipContext {
            set: set_data,
            data: clip_data,
            id: clip.id,
            clock: clip.clock,
            accumulated: clip.accumulated,
            position: clip.position,
            duration: clip.duration,
            play_times: clip.play_times,
            time_scale: clip.time_scale,
            playhead_active: clip.playhead_active,
            fading: clip.fade_state != 0,
            fade_progress: clip.fade_progress,
            action_enabled: clip.action_enabled,
            reset_to_pose: clip.reset_to_pose,
            display_control: clip.display_control,
        };

        let action = evaluators.get_mut(clip.action_slot);
        action.update_action(&ctx, outputs, listeners, slot_order);
        clip.clock = action.clock;
        ctx.clock = action.clock;

        if clip.weight_result == 0.0 {
            return;
        }
        let force_dirty = clip.fade_state != 0;

        for &slot in &clip.timeline_slots {
            let evaluator = evaluators.get_mut(slot);
            let target = match evaluator.target {
                Some(tid) => Some(&mut targets[tid.0 as usize]),
                None => None,
            };
            evaluator.update_value(&ctx, target, slot_order);

            if evaluator.kind.uses_blend() {
                let Some(tid) = evaluator.target else { continue };
                let target = &mut targets[tid.0 as usize];
                let blend_state = if evaluator.kind == TimelineKind::SlotDeform {
                    &mut target.deform_blend
                } else {
                    &mut target.blend
                };
                if blend_state.update(clip.layer, clip.weight_result) {
                    let state_code = blend_state.state_code();
                    let blend_weight = blend_state.blend_weight;
                    evaluator.blend(
                        &mut target.pose,
                        &set_data.store,
                        state_code,
                        blend_weight,
                        force_dirty,
                        set_data.scale,
                    );
                }
            }
        }
    }

    /// Forward parameters written onto nested-clip targets to their bound
    /// clip instances. Runs after all clips evaluated, so a driven clip
    /// picks the values up on its own next pass.
    fn apply_clip_controls(&mut self) {
        let mut updates: Vec<(ClipId, Option<f32>, Option<f32>, Option<(f32, f32)>)> = Vec::new();
        for target in &mut self.targets {
            if let TargetPose::Clip(control) = &mut target.pose {
                if control.progress.is_none()
                    && control.weight.is_none()
                    && control.parameters.is_none()
                {
                    continue;
                }
                let written = (
                    control.progress.take(),
                    control.weight.take(),
                    control.parameters.take(),
                );
                if let Some(child) = control.control {
                    updates.push((child, written.0, written.1, written.2));
                }
            }
        }

        let Engine {
            clips, evaluators, ..
        } = self;
        for (child, progress, weight, parameters) in updates {
            let Some(clip) = clips.iter_mut().find(|c| c.id == child) else {
                continue;
            };
            if let Some(p) = progress {
                let time = p * clip.total_time();
                if clip.accumulated != time {
                    clip.accumulated = time;
                    evaluators.get_mut(clip.action_slot).seek_reset();
                    for &slot in &clip.timeline_slots {
                        evaluators.get_mut(slot).seek_reset();
                    }
                }
            }
            if let Some(w) = weight {
                clip.weight = w;
            }
            if let Some((x, y)) = parameters {
                clip.parameter_x = x;
                clip.parameter_y = y;
            }
        }
    }
}
