//! Animated price motion.
//!
//! The displayed price never jumps to a new tick. It is pulled toward the
//! latest tick by a damped spring integrated once per render frame, with
//! time normalized to a 60 Hz frame so the motion looks the same at any
//! refresh rate.

use pulse_config::MotionSettings;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Duration of one reference frame.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

/// Frames folded into a single step at most. A stalled host (tab in the
/// background, debugger pause) resumes smoothly instead of leaping.
pub const MAX_STEP_FRAMES: f64 = 4.0;

/// Jitter never exceeds this fraction of the remaining distance.
const JITTER_DISTANCE_CAP: f64 = 0.1;

/// Tuning for [`PriceMotion`].
#[derive(Debug, Clone, PartialEq)]
pub struct MotionParams {
    pub acceleration: f64,
    pub jitter: f64,
    pub friction: f64,
    pub far_gain: f64,
    pub near_gain: f64,
    pub far_threshold: f64,
    pub near_threshold: f64,
    pub stale_tick_ms: i64,
    pub inertia_blend: f64,
    pub jitter_enabled: bool,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::from(&MotionSettings::default())
    }
}

impl From<&MotionSettings> for MotionParams {
    fn from(s: &MotionSettings) -> Self {
        Self {
            acceleration: s.acceleration,
            jitter: s.jitter,
            friction: s.friction,
            far_gain: s.far_gain,
            near_gain: s.near_gain,
            far_threshold: s.far_threshold,
            near_threshold: s.near_threshold,
            stale_tick_ms: s.stale_tick_ms,
            inertia_blend: s.inertia_blend,
            jitter_enabled: s.jitter_enabled,
        }
    }
}

/// Spring/damper integrator driving the visual price toward the last tick.
#[derive(Debug, Clone)]
pub struct PriceMotion {
    params: MotionParams,
    target: Option<f64>,
    visual: f64,
    velocity: f64,
    inertia: f64,
    last_tick_at: Option<i64>,
    warm: bool,
    rng: StdRng,
}

impl PriceMotion {
    /// `seed` drives the micro-jitter so runs are reproducible.
    pub fn new(params: MotionParams, seed: u64) -> Self {
        Self {
            params,
            target: None,
            visual: 0.0,
            velocity: 0.0,
            inertia: 0.0,
            last_tick_at: None,
            warm: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    /// Swap tuning, e.g. on a timeframe change. Callers reset afterwards.
    pub fn set_params(&mut self, params: MotionParams) {
        self.params = params;
    }

    /// Allow or suspend animation. While cold, `step` is a no-op.
    pub fn set_warm(&mut self, warm: bool) {
        self.warm = warm;
    }

    pub fn is_warm(&self) -> bool {
        self.warm
    }

    /// Aim at a new tick price. The first target snaps.
    pub fn set_target(&mut self, price: f64, now_ms: i64) {
        if !price.is_finite() {
            return;
        }
        if self.target.is_none() {
            self.reset(price);
        }
        self.target = Some(price);
        self.last_tick_at = Some(now_ms);
    }

    /// Snap to `price` with no residual motion.
    pub fn reset(&mut self, price: f64) {
        if !price.is_finite() {
            self.clear();
            return;
        }
        self.target = Some(price);
        self.visual = price;
        self.velocity = 0.0;
        self.inertia = 0.0;
    }

    /// Forget the target entirely (history reload, symbol change).
    pub fn clear(&mut self) {
        self.target = None;
        self.visual = 0.0;
        self.velocity = 0.0;
        self.inertia = 0.0;
        self.last_tick_at = None;
    }

    pub fn target(&self) -> Option<f64> {
        self.target
    }

    /// Current animated price, once a target exists.
    pub fn visual_price(&self) -> Option<f64> {
        self.target.map(|_| self.visual)
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Advance by `dt_ms` of wall time. Returns the new visual price, or
    /// `None` when there is nothing to animate.
    pub fn step(&mut self, dt_ms: f64, now_ms: i64) -> Option<f64> {
        let target = self.target?;
        if !self.warm {
            return None;
        }
        let dt = if dt_ms.is_finite() {
            (dt_ms / FRAME_MS).clamp(0.0, MAX_STEP_FRAMES)
        } else {
            0.0
        };
        if dt == 0.0 {
            return Some(self.visual);
        }

        let p = &self.params;
        let diff = target - self.visual;
        let distance = diff.abs();
        let scale = target.abs();

        let gain = if distance > p.far_threshold * scale {
            p.acceleration * p.far_gain
        } else if distance < p.near_threshold * scale {
            p.acceleration * p.near_gain
        } else {
            p.acceleration
        };
        let attraction = diff * gain * dt;

        let mut jitter = 0.0;
        if p.jitter_enabled && p.jitter > 0.0 && distance < p.near_threshold * scale {
            let raw = self.rng.random_range(-1.0..=1.0) * p.jitter * scale * dt;
            let cap = distance * JITTER_DISTANCE_CAP;
            jitter = raw.clamp(-cap, cap);
        }

        let mut velocity = self.velocity;
        if let Some(tick_at) = self.last_tick_at {
            if now_ms.saturating_sub(tick_at) > p.stale_tick_ms {
                velocity += self.inertia * p.inertia_blend * dt;
            }
        }
        velocity = (velocity + attraction + jitter) * p.friction.powf(dt);

        let visual = self.visual + velocity * dt;
        if !visual.is_finite() || !velocity.is_finite() {
            log::warn!("Price motion produced a non-finite value, snapping to {target}");
            self.reset(target);
            return Some(target);
        }

        self.visual = visual;
        self.velocity = velocity;
        self.inertia = velocity;
        Some(visual)
    }
}
