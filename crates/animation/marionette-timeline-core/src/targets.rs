//! Registered scene targets and their pose accumulators.
//!
//! Each target exposes the settable pose fields this engine writes plus
//! dirty flags the engine sets and never clears; clearing is the consuming
//! host's side of the contract. Bone poses are deltas over the host's rest
//! transform; slots and constraints carry their authored rest values so
//! pose-mode evaluators can restore them.

use serde::{Deserialize, Serialize};

use crate::blend::BlendState;
use crate::ids::ClipId;

/// Bone animation pose: a delta folded onto the host's rest transform.
/// Identity is all-zero with unit scale.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BonePose {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub skew: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Set when any pose field changed this tick; cleared by the host.
    pub transform_dirty: bool,
}

impl Default for BonePose {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            skew: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            transform_dirty: false,
        }
    }
}

/// Color channels in evaluator order: alpha/red/green/blue multipliers,
/// then the same four offsets.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorTransform {
    pub alpha_multiplier: f32,
    pub red_multiplier: f32,
    pub green_multiplier: f32,
    pub blue_multiplier: f32,
    pub alpha_offset: f32,
    pub red_offset: f32,
    pub green_offset: f32,
    pub blue_offset: f32,
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self {
            alpha_multiplier: 1.0,
            red_multiplier: 1.0,
            green_multiplier: 1.0,
            blue_multiplier: 1.0,
            alpha_offset: 0.0,
            red_offset: 0.0,
            green_offset: 0.0,
            blue_offset: 0.0,
        }
    }
}

impl ColorTransform {
    #[inline]
    pub(crate) fn to_array(self) -> [f32; 8] {
        [
            self.alpha_multiplier,
            self.red_multiplier,
            self.green_multiplier,
            self.blue_multiplier,
            self.alpha_offset,
            self.red_offset,
            self.green_offset,
            self.blue_offset,
        ]
    }

    #[inline]
    pub(crate) fn set_from_array(&mut self, v: [f32; 8]) {
        self.alpha_multiplier = v[0];
        self.red_multiplier = v[1];
        self.green_multiplier = v[2];
        self.blue_multiplier = v[3];
        self.alpha_offset = v[4];
        self.red_offset = v[5];
        self.green_offset = v[6];
        self.blue_offset = v[7];
    }
}

/// One selectable display of a slot, with its deformable vertex buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayFrame {
    /// Geometry identifier deform timelines bind against (already in
    /// corrected, non-negative form).
    pub geometry_offset: u32,
    pub deform: Vec<f32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SlotPose {
    pub rest_color: ColorTransform,
    pub color: ColorTransform,
    pub color_dirty: bool,
    pub rest_display_index: i32,
    pub display_index: i32,
    pub display_dirty: bool,
    pub display_frames: Vec<DisplayFrame>,
    /// Set when the displayed geometry's deform vertices changed.
    pub vertices_dirty: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SurfacePose {
    pub deform: Vec<f32>,
    pub transform_dirty: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConstraintPose {
    pub rest_bend_positive: bool,
    pub rest_weight: f32,
    pub bend_positive: bool,
    pub weight: f32,
    /// The solver must re-run; set on every animated write.
    pub needs_update: bool,
}

/// Parameters written onto a nested animation instance. Written as Options
/// and taken by the engine when it forwards them to the bound clip.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClipControlPose {
    pub control: Option<ClipId>,
    pub progress: Option<f32>,
    pub weight: Option<f32>,
    pub parameters: Option<(f32, f32)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TargetPose {
    Bone(BonePose),
    Slot(SlotPose),
    Surface(SurfacePose),
    Constraint(ConstraintPose),
    Clip(ClipControlPose),
}

/// A registered target: pose storage plus per-concern blend bookkeeping.
/// Slots keep a second blend state because deform vertices blend
/// independently of the bone-style transform concern.
#[derive(Clone, Debug)]
pub struct Target {
    pub name: String,
    pub pose: TargetPose,
    pub blend: BlendState,
    pub deform_blend: BlendState,
}

impl Target {
    pub(crate) fn new(name: String, pose: TargetPose) -> Self {
        Self {
            name,
            pose,
            blend: BlendState::default(),
            deform_blend: BlendState::default(),
        }
    }

    pub fn as_bone(&self) -> Option<&BonePose> {
        match &self.pose {
            TargetPose::Bone(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_slot(&self) -> Option<&SlotPose> {
        match &self.pose {
            TargetPose::Slot(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_surface(&self) -> Option<&SurfacePose> {
        match &self.pose {
            TargetPose::Surface(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_constraint(&self) -> Option<&ConstraintPose> {
        match &self.pose {
            TargetPose::Constraint(c) => Some(c),
            _ => None,
        }
    }
}

/// Stage-level slot draw order. `None` means the authored order is in
/// effect; a permutation replaces it wholesale.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SlotOrder {
    pub order: Option<Vec<u32>>,
    /// Set whenever the effective order changes; cleared by the host.
    pub dirty: bool,
}

impl SlotOrder {
    pub(crate) fn apply(&mut self, permutation: Option<&[i32]>) {
        match permutation {
            None => {
                if self.order.is_some() {
                    self.order = None;
                    self.dirty = true;
                }
            }
            Some(p) => {
                let next: Vec<u32> = p.iter().map(|v| (*v).max(0) as u32).collect();
                if self.order.as_deref() != Some(next.as_slice()) {
                    self.order = Some(next);
                    self.dirty = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// it should treat re-applying the same order as a no-op
    #[test]
    fn slot_order_noop_when_unchanged() {
        let mut order = SlotOrder::default();
        order.apply(Some(&[2, 0, 1]));
        assert!(order.dirty);
        order.dirty = false;
        order.apply(Some(&[2, 0, 1]));
        assert!(!order.dirty);
        order.apply(None);
        assert!(order.dirty);
        assert!(order.order.is_none());
    }

    #[test]
    fn bone_pose_identity_default() {
        let pose = BonePose::default();
        assert_eq!(pose.scale_x, 1.0);
        assert_eq!(pose.x, 0.0);
        assert!(!pose.transform_dirty);
    }
}
