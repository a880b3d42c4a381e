//! Per-target blend bookkeeping across simultaneously active clips.
//!
//! Within one tick, the first clip touching a target writes its value
//! outright (weighted when its blend weight is not 1); every later clip
//! accumulates additively. Layers consume blend budget top-down: once the
//! weight of higher layers saturates, lower layers contribute nothing.

/// One target concern's blend bookkeeping for the current tick. `dirty`
/// counts contributions; it doubles as the integer state code handed to the
/// evaluators (1 = first write, 2+ = additive).
#[derive(Copy, Clone, Debug, Default)]
pub struct BlendState {
    pub dirty: u32,
    pub layer: i32,
    pub left_weight: f32,
    pub layer_weight: f32,
    pub blend_weight: f32,
}

/// First-write composition: the evaluator assigns (weighted) values.
pub const BLEND_STATE_FIRST: i32 = 1;
/// Additive composition: the evaluator accumulates onto the first write.
pub const BLEND_STATE_ADDITIVE: i32 = 2;

impl BlendState {
    /// Reset at the start of each tick, before any clip runs.
    #[inline]
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Register a contribution from a clip on `layer` with effective
    /// `weight`. Returns false when the layer budget is exhausted; the
    /// caller must then skip the evaluator's blend entirely.
    pub fn update(&mut self, layer: i32, weight: f32) -> bool {
        let mut weight = weight;
        if self.dirty > 0 {
            if self.left_weight > 0.0 {
                if self.layer != layer {
                    if self.layer_weight >= self.left_weight {
                        self.dirty += 1;
                        self.layer = layer;
                        self.left_weight = 0.0;
                        self.blend_weight = 0.0;
                        return false;
                    }
                    self.layer = layer;
                    self.left_weight -= self.layer_weight;
                    self.layer_weight = 0.0;
                }
                weight *= self.left_weight;
                self.dirty += 1;
                self.blend_weight = weight;
                self.layer_weight += self.blend_weight;
                return true;
            }
            return false;
        }
        self.dirty += 1;
        self.layer = layer;
        self.left_weight = 1.0;
        self.layer_weight = weight;
        self.blend_weight = weight;
        true
    }

    /// Composition mode for the contribution just registered.
    #[inline]
    pub fn state_code(&self) -> i32 {
        if self.dirty > 1 {
            BLEND_STATE_ADDITIVE
        } else {
            BLEND_STATE_FIRST
        }
    }
}
