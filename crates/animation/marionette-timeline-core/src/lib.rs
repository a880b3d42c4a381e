//! Marionette timeline core (engine-agnostic)
//!
//! A per-tick evaluation and blend engine for baked skeletal animation.
//! Given the flat binary buffers produced by an external baking step, it
//! locates the active keyframe for every animated property, interpolates
//! continuous values, walks every discrete frame boundary crossed since the
//! previous tick (across loops and in reverse), and folds the contributions
//! of simultaneously active clips into the registered target poses.
//!
//! Rendering, asset parsing, the scene graph and event delivery live in the
//! host; this crate only consumes the baked buffers and writes poses and a
//! per-tick event queue.

pub mod blend;
pub mod clock;
pub mod config;
pub mod engine;
pub mod ids;
pub mod inputs;
pub mod outputs;
pub mod store;
pub mod targets;
mod timeline;
pub mod values;

// Re-exports for consumers (adapters)
pub use blend::BlendState;
pub use clock::{PlayState, TimelineClock};
pub use config::Config;
pub use engine::{ClipState, Engine, PlayConfig, PlayError};
pub use ids::{ClipId, IdAllocator, SetId, TargetId};
pub use inputs::{ClipCommand, Inputs};
pub use outputs::{CoreEvent, EventKind, Listeners, Outputs};
pub use store::{
    correct_offset, ActionData, ActionKind, AnimationSetData, ClipData, FrameStore, LoadError,
    TimelineBinding, TimelineHeader, TimelineKind, TWEEN_TYPE_LINE, TWEEN_TYPE_NONE,
};
pub use targets::{
    BonePose, ClipControlPose, ColorTransform, ConstraintPose, DisplayFrame, SlotOrder, SlotPose,
    SurfacePose, Target, TargetPose,
};
pub use values::normalize_radian;
