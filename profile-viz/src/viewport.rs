//! The shared time window `[start, end] ⊂ [0, 1]`, its zoom/pan arithmetic,
//! animated transitions, and the back/forward breadcrumb stacks.

const MIN_SPAN: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub start: f64,
    pub end: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { start: 0.0, end: 1.0 }
    }
}

impl Viewport {
    pub fn new(start: f64, end: f64) -> Self {
        debug_assert!(start < end, "viewport start must be strictly less than end");
        Self { start, end }
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Converts a pixel delta to a fractional delta and clamps so
    /// `start ∈ [0, 1 - span]`.
    pub fn scroll_by(&self, dx_pixels: f64, canvas_width: f64) -> Viewport {
        let span = self.span();
        let delta = (dx_pixels / canvas_width) * span;
        let new_start = (self.start + delta).clamp(0.0, 1.0 - span);
        Viewport::new(new_start, new_start + span)
    }

    /// Keeps the point under `focal_px` stationary while scaling the span by
    /// `1/factor` (factor > 1 zooms in).
    pub fn zoom_at(&self, factor: f64, focal_px: f64, canvas_width: f64) -> Viewport {
        let span = self.span();
        let focal_frac = focal_px / canvas_width;
        let focal_time = self.start + focal_frac * span;
        let new_span = (span / factor).clamp(MIN_SPAN, 1.0);
        let new_start = (focal_time - focal_frac * new_span).clamp(0.0, 1.0 - new_span);
        Viewport::new(new_start, new_start + new_span)
    }
}

/// A cubic ease-out interpolation between two viewports, advanced by the
/// host supplying elapsed time — never a callback closure, per spec.md §9's
/// "encode as a pending animation value" redesign note.
#[derive(Debug, Clone, Copy)]
pub struct Animation {
    from: Viewport,
    to: Viewport,
    elapsed_ms: f64,
    duration_ms: f64,
}

impl Animation {
    pub fn new(from: Viewport, to: Viewport, duration_ms: f64) -> Self {
        Self {
            from,
            to,
            elapsed_ms: 0.0,
            duration_ms: duration_ms.max(1.0),
        }
    }

    /// Advances the animation by `dt_ms` and returns the interpolated
    /// viewport. `None` once the animation has completed.
    pub fn tick(&mut self, dt_ms: f64) -> Option<Viewport> {
        self.elapsed_ms += dt_ms;
        if self.elapsed_ms >= self.duration_ms {
            return None;
        }
        let t = (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - t).powi(3);
        Some(Viewport::new(
            lerp(self.from.start, self.to.start, eased),
            lerp(self.from.end, self.to.end, eased),
        ))
    }

    pub fn target(&self) -> Viewport {
        self.to
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Bounded zoom-history breadcrumbs. `push` truncates the forward stack, so
/// the "back then navigate elsewhere" pattern never leaves a stale forward
/// trail, matching browser history semantics.
pub struct ViewportHistory {
    back_stack: Vec<Viewport>,
    forward_stack: Vec<Viewport>,
    depth: usize,
}

impl ViewportHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            back_stack: Vec::new(),
            forward_stack: Vec::new(),
            depth,
        }
    }

    pub fn push(&mut self, current: Viewport) {
        self.back_stack.push(current);
        if self.back_stack.len() > self.depth {
            self.back_stack.remove(0);
        }
        self.forward_stack.clear();
    }

    pub fn back(&mut self, current: Viewport) -> Option<Viewport> {
        let previous = self.back_stack.pop()?;
        self.forward_stack.push(current);
        Some(previous)
    }

    pub fn forward(&mut self, current: Viewport) -> Option<Viewport> {
        let next = self.forward_stack.pop()?;
        self.back_stack.push(current);
        Some(next)
    }

    pub fn can_back(&self) -> bool {
        !self.back_stack.is_empty()
    }

    pub fn can_forward(&self) -> bool {
        !self.forward_stack.is_empty()
    }
}

/// A spring-integrated WASD pan/zoom smoothing layer on top of the viewport
/// contracts. Cosmetic only: it never bypasses `scroll_by`/`zoom_at`, it
/// just decides how much of each to apply per tick from held keys.
pub struct KeyboardPanZoom {
    velocity_x: f64,
    velocity_zoom: f64,
}

impl Default for KeyboardPanZoom {
    fn default() -> Self {
        Self {
            velocity_x: 0.0,
            velocity_zoom: 0.0,
        }
    }
}

impl KeyboardPanZoom {
    /// `pan_input`/`zoom_input` ∈ [-1, 1] (e.g. -1 for 'A' held, +1 for 'D').
    /// Returns the pixel pan delta and zoom factor to apply this tick.
    pub fn tick(
        &mut self,
        pan_input: f64,
        zoom_input: f64,
        dt_s: f64,
        config: &crate::config::ViewerConfig,
    ) -> (f64, f64) {
        self.velocity_x += pan_input * config.wasd_pan_acceleration as f64 * dt_s;
        self.velocity_zoom += zoom_input * dt_s;

        self.velocity_x *= config.wasd_friction as f64;
        self.velocity_zoom *= config.wasd_friction as f64;

        if self.velocity_x.abs() < config.wasd_snap_threshold as f64 {
            self.velocity_x = 0.0;
        }
        if self.velocity_zoom.abs() < config.wasd_snap_threshold as f64 {
            self.velocity_zoom = 0.0;
        }

        let pan_px = self.velocity_x * dt_s;
        let zoom_factor = 1.0 + self.velocity_zoom * dt_s;
        (pan_px, zoom_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_at_focal_matches_scenario_2() {
        let viewport = Viewport::default();
        let zoomed = viewport.zoom_at(2.0, 500.0, 1000.0);
        assert!((zoomed.start - 0.25).abs() < 1e-9);
        assert!((zoomed.end - 0.75).abs() < 1e-9);
    }

    #[test]
    fn zoom_then_unzoom_returns_to_start_within_ulp() {
        let viewport = Viewport::default();
        let zoomed = viewport.zoom_at(3.0, 200.0, 1000.0);
        let back = zoomed.zoom_at(1.0 / 3.0, 200.0, 1000.0);
        assert!((back.start - viewport.start).abs() < 1e-9);
        assert!((back.end - viewport.end).abs() < 1e-9);
    }

    #[test]
    fn scroll_clamps_at_bounds() {
        let viewport = Viewport::new(0.0, 0.2);
        let scrolled = viewport.scroll_by(-100_000.0, 1000.0);
        assert_eq!(scrolled.start, 0.0);
    }

    #[test]
    fn history_push_back_forward_round_trips() {
        let mut history = ViewportHistory::new(8);
        let start = Viewport::default();
        let zoomed = Viewport::new(0.25, 0.75);

        history.push(start);
        let back_to = history.back(zoomed).unwrap();
        assert_eq!(back_to, start);

        let forward_to = history.forward(back_to).unwrap();
        assert_eq!(forward_to, zoomed);
    }

    #[test]
    fn push_after_back_truncates_forward_stack() {
        let mut history = ViewportHistory::new(8);
        history.push(Viewport::default());
        let back_to = history.back(Viewport::new(0.25, 0.75)).unwrap();
        history.push(back_to);
        assert!(!history.can_forward());
    }

    #[test]
    fn animation_completes_and_reaches_target() {
        let mut anim = Animation::new(Viewport::default(), Viewport::new(0.5, 1.0), 100.0);
        assert!(anim.tick(50.0).is_some());
        assert!(anim.tick(60.0).is_none());
        assert_eq!(anim.target(), Viewport::new(0.5, 1.0));
    }
}
