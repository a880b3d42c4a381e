//! Output contracts from the core engine.
//!
//! Events are queued during the tick and drained by the host after
//! Engine::update() returns; nothing is dispatched synchronously. Pose
//! values are not part of Outputs; they land on the registered targets.

use serde::{Deserialize, Serialize};

use crate::ids::ClipId;

/// Event families, used for listener gating. `Sound` and `Play` are always
/// queued; every other kind is queued only while a listener is registered.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Start,
    LoopComplete,
    Complete,
    FadeIn,
    FadeInComplete,
    FadeOut,
    FadeOutComplete,
    Frame,
    Sound,
    Play,
}

/// Discrete signals produced while stepping. Typed events carry the
/// clip-relative trigger time and the identifier decoded from the action
/// record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreEvent {
    Start { clip: ClipId },
    LoopComplete { clip: ClipId },
    Complete { clip: ClipId },
    FadeIn { clip: ClipId },
    FadeInComplete { clip: ClipId },
    FadeOut { clip: ClipId },
    FadeOutComplete { clip: ClipId },
    Frame { clip: ClipId, name: String, time: f32 },
    Sound { clip: ClipId, name: String, time: f32 },
    /// Request to start a sub-animation; delivery is the host's job.
    Play { clip: ClipId, animation: String, time: f32 },
}

impl CoreEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CoreEvent::Start { .. } => EventKind::Start,
            CoreEvent::LoopComplete { .. } => EventKind::LoopComplete,
            CoreEvent::Complete { .. } => EventKind::Complete,
            CoreEvent::FadeIn { .. } => EventKind::FadeIn,
            CoreEvent::FadeInComplete { .. } => EventKind::FadeInComplete,
            CoreEvent::FadeOut { .. } => EventKind::FadeOut,
            CoreEvent::FadeOutComplete { .. } => EventKind::FadeOutComplete,
            CoreEvent::Frame { .. } => EventKind::Frame,
            CoreEvent::Sound { .. } => EventKind::Sound,
            CoreEvent::Play { .. } => EventKind::Play,
        }
    }
}

/// Which event kinds the host is listening for. Producing an event nobody
/// consumes is wasted allocation, so evaluators check this before queueing.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Listeners {
    pub start: bool,
    pub loop_complete: bool,
    pub complete: bool,
    pub fade: bool,
    pub frame: bool,
}

impl Listeners {
    /// Listen for everything; convenient for tests and simple hosts.
    pub fn all() -> Self {
        Self {
            start: true,
            loop_complete: true,
            complete: true,
            fade: true,
            frame: true,
        }
    }

    pub fn listen(&mut self, kind: EventKind, enabled: bool) {
        match kind {
            EventKind::Start => self.start = enabled,
            EventKind::LoopComplete => self.loop_complete = enabled,
            EventKind::Complete => self.complete = enabled,
            EventKind::FadeIn
            | EventKind::FadeInComplete
            | EventKind::FadeOut
            | EventKind::FadeOutComplete => self.fade = enabled,
            EventKind::Frame => self.frame = enabled,
            // Always delivered.
            EventKind::Sound | EventKind::Play => {}
        }
    }

    #[inline]
    pub fn has(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Start => self.start,
            EventKind::LoopComplete => self.loop_complete,
            EventKind::Complete => self.complete,
            EventKind::FadeIn
            | EventKind::FadeInComplete
            | EventKind::FadeOut
            | EventKind::FadeOutComplete => self.fade,
            EventKind::Frame => self.frame,
            EventKind::Sound | EventKind::Play => true,
        }
    }
}

/// Outputs returned by Engine::update().
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<CoreEvent>,
    /// Events discarded this tick because the per-tick cap was hit.
    #[serde(default)]
    pub dropped_events: usize,
    #[serde(skip)]
    cap: usize,
}

impl Outputs {
    pub(crate) fn with_cap(cap: usize) -> Self {
        Self {
            cap,
            ..Default::default()
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped_events = 0;
    }

    pub(crate) fn push_event(&mut self, event: CoreEvent) {
        if self.cap > 0 && self.events.len() >= self.cap {
            if self.dropped_events == 0 {
                log::warn!("event queue cap ({}) reached, dropping events", self.cap);
            }
            self.dropped_events += 1;
            return;
        }
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// it should drop events past the cap and count them
    #[test]
    fn cap_drops_and_counts() {
        let mut out = Outputs::with_cap(2);
        for _ in 0..3 {
            out.push_event(CoreEvent::Start { clip: ClipId(0) });
        }
        assert_eq!(out.events.len(), 2);
        assert_eq!(out.dropped_events, 1);
        out.clear();
        assert!(out.is_empty());
        assert_eq!(out.dropped_events, 0);
    }

    /// it should always pass sound and play through listener gating
    #[test]
    fn listeners_gate_except_sound_and_play() {
        let off = Listeners::default();
        assert!(!off.has(EventKind::Start));
        assert!(!off.has(EventKind::Frame));
        assert!(off.has(EventKind::Sound));
        assert!(off.has(EventKind::Play));
        let mut on = off;
        on.listen(EventKind::LoopComplete, true);
        assert!(on.has(EventKind::LoopComplete));
    }
}
