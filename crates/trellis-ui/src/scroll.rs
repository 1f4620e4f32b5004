//! Scroll offset math for collection views: clamped and elastic modes,
//! drag-release inertia and overscroll springback, all ticked from the
//! frame tick so tests can drive it deterministically.

use trellis_core::geometry::{Size, Vec2};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollMode {
    #[default]
    Clamped,
    Elastic,
}

/// Springback/position snap threshold, in pixels.
const POSITION_EPS: f32 = 0.05;
/// Below this speed (px/s) inertia is considered stopped.
const VELOCITY_EPS: f32 = 1.0;

pub struct ScrollState {
    mode: ScrollMode,
    offset: Vec2,
    viewport: Size,
    content: Size,
    velocity: Vec2,
    /// Unprojected drag offset; only meaningful while a drag is active.
    raw: Vec2,
    dragging: bool,
    last_sample: Option<(u64, Vec2)>,
    /// Springback time constant, seconds.
    pub elasticity: f32,
    /// Asymptotic overscroll distance, pixels.
    pub overscroll_scale: f32,
    /// Per-second inertia velocity retention factor.
    pub decay_rate: f32,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new(ScrollMode::Clamped)
    }
}

impl ScrollState {
    pub fn new(mode: ScrollMode) -> Self {
        Self {
            mode,
            offset: Vec2::ZERO,
            viewport: Size::new(0.0, 0.0),
            content: Size::new(0.0, 0.0),
            velocity: Vec2::ZERO,
            raw: Vec2::ZERO,
            dragging: false,
            last_sample: None,
            elasticity: 0.1,
            overscroll_scale: 150.0,
            decay_rate: 0.135,
        }
    }

    pub fn mode(&self) -> ScrollMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ScrollMode) {
        self.mode = mode;
        if mode == ScrollMode::Clamped {
            self.offset = self.clamped(self.offset);
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        // Pre-layout sizes can be NaN or negative; keep the old extent
        // until a real one arrives.
        if viewport.is_valid() {
            self.viewport = viewport;
        }
    }

    pub fn set_content(&mut self, content: Size) {
        if content.is_valid() {
            self.content = content;
            if !self.dragging && self.velocity == Vec2::ZERO {
                self.offset = self.clamped(self.offset);
            }
        }
    }

    /// Maximum in-bounds offset per axis, never negative.
    pub fn max_offset(&self) -> Vec2 {
        Vec2::new(
            (self.content.width - self.viewport.width).max(0.0),
            (self.content.height - self.viewport.height).max(0.0),
        )
    }

    fn clamped(&self, v: Vec2) -> Vec2 {
        let max = self.max_offset();
        Vec2::new(v.x.clamp(0.0, max.x), v.y.clamp(0.0, max.y))
    }

    /// Project an unclamped axis position into the visible range, with
    /// diminishing overscroll past either bound.
    fn project(&self, raw: f32, max: f32) -> f32 {
        let scale = self.overscroll_scale;
        if raw < 0.0 {
            let d = -raw;
            -(scale * d / (d + scale))
        } else if raw > max {
            let d = raw - max;
            max + scale * d / (d + scale)
        } else {
            raw
        }
    }

    /// Jump to an offset, clamped. Kills any running animation.
    pub fn scroll_to(&mut self, target: Vec2) {
        self.velocity = Vec2::ZERO;
        self.offset = self.clamped(target);
    }

    /// Wheel input: immediate clamped step, cancels inertia.
    pub fn scroll_by(&mut self, delta: Vec2) {
        self.velocity = Vec2::ZERO;
        self.offset = self.clamped(Vec2::new(self.offset.x + delta.x, self.offset.y + delta.y));
    }

    pub fn begin_drag(&mut self, now_ms: u64) {
        self.dragging = true;
        self.velocity = Vec2::ZERO;
        self.raw = self.offset;
        self.last_sample = Some((now_ms, self.offset));
    }

    /// Move the content by a pointer delta during a drag. Elastic mode lets
    /// the offset run past the bounds with asymptotic resistance; clamped
    /// mode pins it.
    pub fn drag_by(&mut self, delta: Vec2, now_ms: u64) {
        if !self.dragging {
            return;
        }
        self.raw = Vec2::new(self.raw.x + delta.x, self.raw.y + delta.y);
        let max = self.max_offset();
        self.offset = match self.mode {
            ScrollMode::Clamped => self.clamped(self.raw),
            ScrollMode::Elastic => Vec2::new(
                self.project(self.raw.x, max.x),
                self.project(self.raw.y, max.y),
            ),
        };
        if let Some((t0, p0)) = self.last_sample {
            let dt = (now_ms.saturating_sub(t0)) as f32 / 1000.0;
            if dt > 1e-3 {
                self.velocity = Vec2::new(
                    (self.offset.x - p0.x) / dt,
                    (self.offset.y - p0.y) / dt,
                );
                self.last_sample = Some((now_ms, self.offset));
            }
        }
    }

    /// End the drag; the last sampled velocity carries into inertia.
    pub fn end_drag(&mut self) {
        self.dragging = false;
        self.last_sample = None;
    }

    pub fn is_overscrolled(&self) -> bool {
        let c = self.clamped(self.offset);
        (self.offset.x - c.x).abs() > POSITION_EPS || (self.offset.y - c.y).abs() > POSITION_EPS
    }

    /// Advance inertia and springback. Returns true while motion continues;
    /// once it returns false the offset sits exactly on a bound or at rest.
    pub fn tick(&mut self, dt_ms: u64) -> bool {
        if self.dragging || dt_ms == 0 {
            return self.dragging;
        }
        let dt = dt_ms as f32 / 1000.0;
        let max = self.max_offset();
        let (x, vx) = self.tick_axis(self.offset.x, self.velocity.x, max.x, dt);
        let (y, vy) = self.tick_axis(self.offset.y, self.velocity.y, max.y, dt);
        self.offset = Vec2::new(x, y);
        self.velocity = Vec2::new(vx, vy);
        self.velocity != Vec2::ZERO || self.is_overscrolled()
    }

    fn tick_axis(&self, pos: f32, vel: f32, max: f32, dt: f32) -> (f32, f32) {
        let bound = pos.clamp(0.0, max);
        let over = pos - bound;
        if over.abs() > 0.0 {
            // Out of bounds: exponential springback toward the bound, then
            // snap exactly onto it.
            let decay = (-dt / self.elasticity).exp();
            let over = over * decay;
            let vel = vel * decay;
            if over.abs() < POSITION_EPS && vel.abs() < VELOCITY_EPS {
                (bound, 0.0)
            } else {
                (bound + over, vel)
            }
        } else if vel.abs() >= VELOCITY_EPS {
            let mut pos = pos + vel * dt;
            let mut vel = vel * self.decay_rate.powf(dt);
            if self.mode == ScrollMode::Clamped && (pos < 0.0 || pos > max) {
                pos = pos.clamp(0.0, max);
                vel = 0.0;
            }
            if vel.abs() < VELOCITY_EPS {
                vel = 0.0;
            }
            (pos, vel)
        } else {
            (pos, 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(mode: ScrollMode) -> ScrollState {
        let mut s = ScrollState::new(mode);
        s.set_viewport(Size::new(100.0, 200.0));
        s.set_content(Size::new(100.0, 1000.0));
        s
    }

    #[test]
    fn clamped_drag_never_leaves_bounds() {
        let mut s = state(ScrollMode::Clamped);
        s.begin_drag(0);
        s.drag_by(Vec2::new(0.0, -50.0), 16);
        assert_eq!(s.offset().y, 0.0);
        s.drag_by(Vec2::new(0.0, 2000.0), 32);
        assert_eq!(s.offset().y, 800.0);
    }

    #[test]
    fn elastic_overscroll_diminishes_and_stays_under_scale() {
        let mut s = state(ScrollMode::Elastic);
        s.begin_drag(0);
        s.drag_by(Vec2::new(0.0, -100.0), 16);
        let first = -s.offset().y;
        s.drag_by(Vec2::new(0.0, -100.0), 32);
        let second = -s.offset().y - first;
        assert!(first > 0.0);
        assert!(second < first);
        s.drag_by(Vec2::new(0.0, -100_000.0), 48);
        assert!(-s.offset().y < s.overscroll_scale);
    }

    #[test]
    fn springback_lands_exactly_on_bound() {
        let mut s = state(ScrollMode::Elastic);
        s.begin_drag(0);
        s.drag_by(Vec2::new(0.0, -120.0), 16);
        s.end_drag();
        assert!(s.offset().y < 0.0);

        let mut ticks = 0;
        while s.tick(16) {
            ticks += 1;
            assert!(ticks < 1000, "springback never settled");
        }
        assert_eq!(s.offset().y, 0.0);
    }

    #[test]
    fn springback_from_bottom_lands_on_max() {
        let mut s = state(ScrollMode::Elastic);
        s.scroll_to(Vec2::new(0.0, 800.0));
        s.begin_drag(0);
        s.drag_by(Vec2::new(0.0, 150.0), 16);
        s.end_drag();
        assert!(s.offset().y > 800.0);
        while s.tick(16) {}
        assert_eq!(s.offset().y, 800.0);
    }

    #[test]
    fn inertia_decays_and_stops() {
        let mut s = state(ScrollMode::Clamped);
        s.begin_drag(0);
        s.drag_by(Vec2::new(0.0, 40.0), 16);
        s.end_drag();
        assert!(s.velocity.y > 0.0);

        let before = s.offset().y;
        let mut ticks = 0;
        while s.tick(16) {
            ticks += 1;
            assert!(ticks < 1000, "inertia never settled");
        }
        assert!(s.offset().y > before);
        assert_eq!(s.velocity, Vec2::ZERO);
    }

    #[test]
    fn clamped_inertia_stops_at_bound() {
        let mut s = state(ScrollMode::Clamped);
        s.scroll_to(Vec2::new(0.0, 790.0));
        s.begin_drag(0);
        s.drag_by(Vec2::new(0.0, 8.0), 16);
        s.end_drag();
        while s.tick(16) {}
        assert_eq!(s.offset().y, 800.0);
    }

    #[test]
    fn wheel_cancels_inertia_and_clamps() {
        let mut s = state(ScrollMode::Clamped);
        s.begin_drag(0);
        s.drag_by(Vec2::new(0.0, 40.0), 16);
        s.end_drag();
        s.scroll_by(Vec2::new(0.0, 10_000.0));
        assert_eq!(s.offset().y, 800.0);
        assert!(!s.tick(16));
    }

    #[test]
    fn invalid_sizes_are_ignored() {
        let mut s = state(ScrollMode::Clamped);
        s.set_viewport(Size::new(f32::NAN, -1.0));
        assert_eq!(s.max_offset().y, 800.0);
    }
}
