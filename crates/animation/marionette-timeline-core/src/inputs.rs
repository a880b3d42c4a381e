//! Input contracts for the core engine.
//!
//! Hosts batch per-clip commands and pass them into Engine::update() each
//! tick. Commands apply before any timeline is evaluated, so a stop or seek
//! never preempts a tick mid-update.

use serde::{Deserialize, Serialize};

use crate::ids::ClipId;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Inputs {
    #[serde(default)]
    pub clip_cmds: Vec<ClipCommand>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ClipCommand {
    /// Remove the clip immediately; its evaluators return to the pool.
    Stop { clip: ClipId },
    /// Begin fading the clip out over `duration` seconds, then remove it.
    FadeOut { clip: ClipId, duration: f32 },
    /// Jump the playhead to `time` seconds within the current loop. Forces
    /// re-arrival detection on every timeline without re-firing start.
    Seek { clip: ClipId, time: f32 },
    SetTimeScale { clip: ClipId, value: f32 },
    SetWeight { clip: ClipId, value: f32 },
}
