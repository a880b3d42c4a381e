//! Read-only baked buffers consumed by the evaluators.
//!
//! An external baking step flattens every clip of an animation set into five
//! parallel arrays: an int pool, a float pool, a frame array, a timeline
//! array, and a frame-index lookup table. The engine addresses them only
//! through the per-timeline headers below and never mutates them. The serde
//! representation of [`AnimationSetData`] is the at-rest form of a baked set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slot layout of the baked arrays. Offsets are relative to a timeline
/// header (`TIMELINE_*`), a frame record (`FRAME_*` and the per-kind frame
/// slots), or a deform header in the int pool (`DEFORM_*`).
pub mod offsets {
    pub const TIMELINE_KEYFRAME_COUNT: usize = 0;
    pub const TIMELINE_FRAME_VALUE_COUNT: usize = 1;
    pub const TIMELINE_FRAME_VALUE_OFFSET: usize = 2;
    pub const TIMELINE_FRAME_OFFSET: usize = 3;

    pub const FRAME_POSITION: usize = 0;
    pub const FRAME_TWEEN_TYPE: usize = 1;

    pub const ACTION_FRAME_COUNT: usize = 1;
    pub const ACTION_FRAME_ACTIONS: usize = 2;

    pub const ZORDER_FRAME_COUNT: usize = 1;
    pub const ZORDER_FRAME_ORDER: usize = 2;

    pub const DISPLAY_FRAME_VALUE: usize = 1;

    pub const DEFORM_VERTEX_OFFSET: usize = 0;
    pub const DEFORM_COUNT: usize = 1;
    pub const DEFORM_VALUE_COUNT: usize = 2;
    pub const DEFORM_VALUE_OFFSET: usize = 3;
    pub const DEFORM_FLOAT_OFFSET: usize = 4;
}

/// Tween marker stored at [`offsets::FRAME_TWEEN_TYPE`]: hold the frame value.
pub const TWEEN_TYPE_NONE: i32 = 0;
/// Tween marker stored at [`offsets::FRAME_TWEEN_TYPE`]: interpolate linearly
/// toward the next frame.
pub const TWEEN_TYPE_LINE: i32 = 1;

/// Offsets in the int pool are baked as 16-bit words; a raw value read back
/// as negative is the unsigned offset that overflowed the i16 range. The
/// `+ 65536` correction is part of the binary format contract and must be
/// applied wherever an offset is read from the pool. `-1` resolves to 65535.
#[inline]
pub fn correct_offset(raw: i32) -> usize {
    if raw < 0 {
        (raw + 65536) as usize
    } else {
        raw as usize
    }
}

/// The five flat buffers shared by every clip of one animation set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameStore {
    /// Int pool: per-frame int-encoded channel values, color octet runs,
    /// deform headers.
    pub int_array: Vec<i32>,
    /// Float pool: per-frame float channel values, deform deltas, same-value
    /// runs.
    pub float_array: Vec<f32>,
    /// Frame records: `[position, ...payload]` per keyframe, addressed via
    /// the timeline array.
    pub frame_array: Vec<i32>,
    /// Per-timeline headers followed by per-frame offsets into `frame_array`
    /// (relative to the owning clip's `frame_offset`).
    pub timeline_array: Vec<u32>,
    /// Coarse time bucket -> active frame index, one segment per timeline.
    pub frame_indices: Vec<u32>,
}

/// Property family a timeline animates. One evaluator kind per variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineKind {
    Action,
    ZOrder,
    BoneAll,
    BoneTranslate,
    BoneRotate,
    BoneScale,
    Surface,
    SlotDisplay,
    SlotColor,
    SlotDeform,
    IkConstraint,
    ClipProgress,
    ClipWeight,
    ClipParameters,
}

impl TimelineKind {
    /// Kinds folded into the shared target pose through [`crate::blend::BlendState`].
    /// The remaining kinds are discrete or commit their value directly.
    #[inline]
    pub(crate) fn uses_blend(self) -> bool {
        matches!(
            self,
            TimelineKind::BoneAll
                | TimelineKind::BoneTranslate
                | TimelineKind::BoneRotate
                | TimelineKind::BoneScale
                | TimelineKind::Surface
                | TimelineKind::SlotDeform
        )
    }
}

/// Location of one timeline's header and frame-index segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineHeader {
    /// Offset of the header in `timeline_array`.
    pub offset: u32,
    /// Offset of this timeline's bucket segment in `frame_indices`.
    pub frame_indices_offset: u32,
}

/// A timeline entry of a clip: which property of which target it animates,
/// and where its baked data lives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineBinding {
    pub kind: TimelineKind,
    /// Target path, resolved against the engine's registered targets when
    /// the clip starts. Empty for stage-level timelines (z-order).
    #[serde(default)]
    pub target: String,
    pub header: TimelineHeader,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Start a sub-animation; always queued.
    Play,
    /// Typed frame event; queued only when listened for.
    Frame,
    /// Sound trigger; always queued.
    Sound,
}

/// An embedded action referenced by index from action frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    pub kind: ActionKind,
    pub name: String,
}

/// One playable clip of a set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipData {
    pub name: String,
    /// Full clip length in seconds.
    pub duration: f32,
    /// Default loop count; 0 loops forever.
    #[serde(default)]
    pub play_times: u32,
    /// Base of this clip's frame records in `frame_array`.
    pub frame_offset: usize,
    /// Base of this clip's per-frame values in the int pool.
    pub int_offset: usize,
    /// Base of this clip's per-frame values in the float pool.
    pub float_offset: usize,
    /// Drives the clip clock and dispatches embedded actions. `None` for
    /// clips without action frames; the clock still runs.
    #[serde(default)]
    pub action_timeline: Option<TimelineHeader>,
    pub timelines: Vec<TimelineBinding>,
}

fn default_scale() -> f32 {
    1.0
}

/// A baked animation set: the shared store plus per-clip metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationSetData {
    pub name: String,
    /// Keyframe grid rate; frame positions in `frame_array` are expressed in
    /// ticks of this rate.
    pub frame_rate: u32,
    /// Authored position scale applied to translation channels.
    #[serde(default = "default_scale")]
    pub scale: f32,
    pub store: FrameStore,
    #[serde(default)]
    pub actions: Vec<ActionData>,
    pub clips: Vec<ClipData>,
}

/// A malformed baked set, rejected at load. Runtime evaluation trusts data
/// that passed this check: out-of-range access past the documented
/// wraparound correction is a data-integrity defect, not a runtime error.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("animation set '{0}' has no clips")]
    NoClips(String),
    #[error("clip '{clip}': duration must be positive, got {duration}")]
    NonPositiveDuration { clip: String, duration: f32 },
    #[error("clip '{clip}': timeline header at {offset} exceeds timeline array ({len})")]
    TimelineHeaderOutOfBounds { clip: String, offset: usize, len: usize },
    #[error("clip '{clip}': frame record at {offset} exceeds frame array ({len})")]
    FrameOutOfBounds { clip: String, offset: usize, len: usize },
    #[error("clip '{clip}': frame index segment at {offset} needs {need} buckets, array holds {len}")]
    FrameIndexSegmentTooShort { clip: String, offset: usize, need: usize, len: usize },
    #[error("clip '{clip}': action index {index} out of range ({len} actions)")]
    ActionOutOfRange { clip: String, index: usize, len: usize },
}

impl AnimationSetData {
    /// Number of coarse buckets a clip's frame-index segments must cover.
    /// One extra bucket absorbs the end-of-clip overshoot the clock emits
    /// when a finite clip completes.
    #[inline]
    pub fn bucket_count(&self, clip: &ClipData) -> usize {
        (clip.duration * self.frame_rate as f32).ceil() as usize + 1
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if self.clips.is_empty() {
            return Err(LoadError::NoClips(self.name.clone()));
        }
        for clip in &self.clips {
            if clip.duration <= 0.0 {
                return Err(LoadError::NonPositiveDuration {
                    clip: clip.name.clone(),
                    duration: clip.duration,
                });
            }
            if let Some(header) = clip.action_timeline {
                self.validate_timeline(clip, header, true)?;
            }
            for binding in &clip.timelines {
                self.validate_timeline(clip, binding.header, false)?;
            }
        }
        Ok(())
    }

    fn validate_timeline(
        &self,
        clip: &ClipData,
        header: TimelineHeader,
        is_action: bool,
    ) -> Result<(), LoadError> {
        let tl = &self.store.timeline_array;
        let header_offset = header.offset as usize;
        let err = |offset| LoadError::TimelineHeaderOutOfBounds {
            clip: clip.name.clone(),
            offset,
            len: tl.len(),
        };
        if header_offset + offsets::TIMELINE_FRAME_OFFSET > tl.len() {
            return Err(err(header_offset));
        }
        let frame_count = tl[header_offset + offsets::TIMELINE_KEYFRAME_COUNT] as usize;
        let frames_end = header_offset + offsets::TIMELINE_FRAME_OFFSET + frame_count;
        if frames_end > tl.len() {
            return Err(err(frames_end));
        }
        let frames = &self.store.frame_array;
        for i in 0..frame_count {
            let frame_offset =
                clip.frame_offset + tl[header_offset + offsets::TIMELINE_FRAME_OFFSET + i] as usize;
            let frame_err = |offset| LoadError::FrameOutOfBounds {
                clip: clip.name.clone(),
                offset,
                len: frames.len(),
            };
            // Every frame record carries at least position + one payload word.
            if frame_offset + 1 >= frames.len() {
                return Err(frame_err(frame_offset));
            }
            if is_action {
                let action_count = frames[frame_offset + offsets::ACTION_FRAME_COUNT].max(0) as usize;
                let actions_end = frame_offset + offsets::ACTION_FRAME_ACTIONS + action_count;
                if actions_end > frames.len() {
                    return Err(frame_err(actions_end));
                }
                for a in 0..action_count {
                    let index = frames[frame_offset + offsets::ACTION_FRAME_ACTIONS + a];
                    if index < 0 || index as usize >= self.actions.len() {
                        return Err(LoadError::ActionOutOfRange {
                            clip: clip.name.clone(),
                            index: index.max(0) as usize,
                            len: self.actions.len(),
                        });
                    }
                }
            }
        }
        if frame_count > 1 {
            let need = self.bucket_count(clip);
            let seg = header.frame_indices_offset as usize;
            if seg + need > self.store.frame_indices.len() {
                return Err(LoadError::FrameIndexSegmentTooShort {
                    clip: clip.name.clone(),
                    offset: seg,
                    need,
                    len: self.store.frame_indices.len(),
                });
            }
        }
        Ok(())
    }
}

/// Resolved view over one timeline's baked data. Cheap to copy; built per
/// update from the owning clip and set.
#[derive(Copy, Clone)]
pub(crate) struct TimelineView<'a> {
    pub set: &'a AnimationSetData,
    pub clip: &'a ClipData,
    pub header: TimelineHeader,
}

impl<'a> TimelineView<'a> {
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.set.store.timeline_array
            [self.header.offset as usize + offsets::TIMELINE_KEYFRAME_COUNT] as usize
    }

    #[inline]
    pub fn frame_value_count(&self) -> usize {
        self.set.store.timeline_array
            [self.header.offset as usize + offsets::TIMELINE_FRAME_VALUE_COUNT] as usize
    }

    #[inline]
    pub fn frame_value_offset(&self) -> usize {
        self.set.store.timeline_array
            [self.header.offset as usize + offsets::TIMELINE_FRAME_VALUE_OFFSET] as usize
    }

    /// Absolute offset of a frame record in the frame array.
    #[inline]
    pub fn frame_offset(&self, frame_index: usize) -> usize {
        self.clip.frame_offset
            + self.set.store.timeline_array
                [self.header.offset as usize + offsets::TIMELINE_FRAME_OFFSET + frame_index]
                as usize
    }

    /// Frame start time in seconds.
    #[inline]
    pub fn frame_position(&self, frame_index: usize) -> f32 {
        self.set.store.frame_array[self.frame_offset(frame_index) + offsets::FRAME_POSITION] as f32
            / self.set.frame_rate as f32
    }

    /// O(1) bucket lookup of the frame in effect at `time`. The table is
    /// prebuilt by the baking step, so no search happens here.
    #[inline]
    pub fn locate_frame(&self, time: f32) -> usize {
        let bucket = (time.max(0.0) * self.set.frame_rate as f32) as usize;
        self.set.store.frame_indices[self.header.frame_indices_offset as usize + bucket] as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// it should apply the documented 16-bit wraparound to negative offsets
    #[test]
    fn offset_correction_wraps_negatives() {
        assert_eq!(correct_offset(-1), 65535);
        assert_eq!(correct_offset(-32768), 32768);
        assert_eq!(correct_offset(0), 0);
        assert_eq!(correct_offset(1234), 1234);
    }

    #[test]
    fn validate_rejects_empty_set() {
        let set = AnimationSetData {
            name: "empty".into(),
            frame_rate: 30,
            scale: 1.0,
            store: FrameStore::default(),
            actions: vec![],
            clips: vec![],
        };
        assert!(matches!(set.validate(), Err(LoadError::NoClips(_))));
    }

    #[test]
    fn validate_rejects_truncated_timeline_header() {
        let set = AnimationSetData {
            name: "bad".into(),
            frame_rate: 30,
            scale: 1.0,
            store: FrameStore {
                timeline_array: vec![2, 0, 0], // claims 2 frames, no frame offsets
                ..Default::default()
            },
            actions: vec![],
            clips: vec![ClipData {
                name: "clip".into(),
                duration: 1.0,
                play_times: 1,
                frame_offset: 0,
                int_offset: 0,
                float_offset: 0,
                action_timeline: None,
                timelines: vec![TimelineBinding {
                    kind: TimelineKind::BoneTranslate,
                    target: "bone".into(),
                    header: TimelineHeader { offset: 0, frame_indices_offset: 0 },
                }],
            }],
        };
        assert!(matches!(
            set.validate(),
            Err(LoadError::TimelineHeaderOutOfBounds { .. })
        ));
    }
}
