//! Per-timeline playhead state: wrapping, loop counting, play-state
//! transitions.
//!
//! The clip's action timeline owns the authoritative clock; value timelines
//! copy it each tick (see `TimelineState::sync_clock`). Time fed in is the
//! clip's accumulated signed playhead, so reverse playback arrives here as a
//! negative value.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayState {
    /// Frame index is still -1; nothing has been evaluated.
    NotStarted,
    Playing,
    /// A finite clip reached its end. Terminal unless the clip is seeked.
    Finished,
}

/// Static inputs to the clock for one clip playback.
#[derive(Copy, Clone, Debug)]
pub struct ClockSpec {
    /// Start of the played interval within the clip, seconds.
    pub position: f32,
    /// Length of the played interval, seconds. Must be positive.
    pub duration: f32,
    /// Loop count; 0 loops forever.
    pub play_times: u32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimelineClock {
    pub play_state: PlayState,
    /// Completed loop count. Monotonic under uniform playback direction.
    pub play_times_completed: u32,
    /// Current time within `[position, position + duration]`, seconds.
    pub time: f32,
}

impl Default for TimelineClock {
    fn default() -> Self {
        Self {
            play_state: PlayState::NotStarted,
            play_times_completed: 0,
            // Sentinel: "before any evaluated time", so the very first tick
            // registers as a change and first-frame crossings resolve.
            time: -1.0,
        }
    }
}

impl TimelineClock {
    /// Map the accumulated playhead onto the clip interval. Returns false
    /// when neither time nor loop count moved (callers skip the tick).
    ///
    /// `playhead_active` gates play-state transitions: a paused clip keeps
    /// its state even though commands may move its time.
    pub fn update(&mut self, passed_time: f32, spec: &ClockSpec, playhead_active: bool) -> bool {
        let prev_play_times = self.play_times_completed;
        let prev_time = self.time;
        let mut passed = passed_time;

        if spec.play_times > 0 {
            let total = spec.play_times as f32 * spec.duration;
            if passed >= total || -passed >= total {
                if self.play_state != PlayState::Finished && playhead_active {
                    self.play_state = PlayState::Finished;
                }
                self.play_times_completed = spec.play_times;
                self.time = if passed < 0.0 {
                    0.0
                } else if self.play_state == PlayState::Finished {
                    // Land one bucket past the last frame so the locator
                    // resolves the final keyframe, not the first.
                    spec.duration + 0.000_001
                } else {
                    spec.duration
                };
                self.time += spec.position;
                return self.play_times_completed != prev_play_times || self.time != prev_time;
            }
        }

        if self.play_state != PlayState::Playing && playhead_active {
            self.play_state = PlayState::Playing;
        }
        if passed < 0.0 {
            passed = -passed;
            self.play_times_completed = (passed / spec.duration) as u32;
            self.time = spec.duration - (passed % spec.duration);
        } else {
            self.play_times_completed = (passed / spec.duration) as u32;
            self.time = passed % spec.duration;
        }
        self.time += spec.position;
        self.play_times_completed != prev_play_times || self.time != prev_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(duration: f32, play_times: u32) -> ClockSpec {
        ClockSpec { position: 0.0, duration, play_times }
    }

    /// it should wrap looping time and count completed loops
    #[test]
    fn wraps_and_counts_loops() {
        let mut clock = TimelineClock::default();
        assert!(clock.update(2.5, &spec(1.0, 0), true));
        assert_eq!(clock.play_times_completed, 2);
        assert!((clock.time - 0.5).abs() < 1e-6);
        assert_eq!(clock.play_state, PlayState::Playing);
    }

    /// it should mirror negative accumulated time for reverse playback
    #[test]
    fn reverse_maps_from_clip_end() {
        let mut clock = TimelineClock::default();
        assert!(clock.update(-0.25, &spec(1.0, 0), true));
        assert_eq!(clock.play_times_completed, 0);
        assert!((clock.time - 0.75).abs() < 1e-6);

        assert!(clock.update(-1.25, &spec(1.0, 0), true));
        assert_eq!(clock.play_times_completed, 1);
        assert!((clock.time - 0.75).abs() < 1e-6);
    }

    /// it should clamp a finite clip at its end and report Finished
    #[test]
    fn finite_clip_finishes_with_overshoot() {
        let mut clock = TimelineClock::default();
        assert!(clock.update(3.0, &spec(1.0, 2), true));
        assert_eq!(clock.play_state, PlayState::Finished);
        assert_eq!(clock.play_times_completed, 2);
        assert!(clock.time > 1.0 && clock.time < 1.001);
    }

    /// it should hold play-state while the playhead is inactive
    #[test]
    fn paused_playhead_keeps_state() {
        let mut clock = TimelineClock::default();
        clock.update(0.5, &spec(1.0, 0), false);
        assert_eq!(clock.play_state, PlayState::NotStarted);
        clock.update(0.5, &spec(1.0, 0), true);
        assert_eq!(clock.play_state, PlayState::Playing);
    }

    /// it should report no change for an identical playhead
    #[test]
    fn unchanged_time_reports_false() {
        let mut clock = TimelineClock::default();
        assert!(clock.update(0.25, &spec(1.0, 0), true));
        assert!(!clock.update(0.25, &spec(1.0, 0), true));
    }

    /// it should offset times by the interval position
    #[test]
    fn interval_position_offsets_time() {
        let mut clock = TimelineClock::default();
        let spec = ClockSpec { position: 0.5, duration: 1.0, play_times: 0 };
        clock.update(0.25, &spec, true);
        assert!((clock.time - 0.75).abs() < 1e-6);
    }
}
