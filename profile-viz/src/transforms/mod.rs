//! Pure layout functions: `(profile, lane, viewport, width_px, height_px,
//! selection, search) -> Vec<RenderCommand>`. Every transform shares the
//! same preamble (compute the visible window, compute pixels-per-microsecond,
//! cull) before doing its own arrangement of rects.

pub mod async_track;
pub mod counter_track;
pub mod flow_arrows;
pub mod frame_track;
pub mod icicle;
pub mod left_heavy;
pub mod marker_track;
pub mod minimap;
pub mod ranked;
pub mod sandwich;
pub mod time_axis;
pub mod time_order;

use crate::color::ColorMapper;
use crate::config::ViewerConfig;
use crate::model::{FrameId, Profile, Span};
use crate::search::SearchState;
use crate::theme::ThemeToken;
use crate::viewport::Viewport;

/// Common arguments every transform in this module takes. Grouping them
/// avoids an eight-parameter function signature on every transform while
/// keeping each transform a pure function of its fields (no interior
/// mutability, no hidden globals).
pub struct TransformInputs<'a> {
    pub profile: &'a Profile,
    pub viewport: Viewport,
    pub width_px: f32,
    pub height_px: f32,
    pub config: &'a ViewerConfig,
    pub color_mapper: &'a ColorMapper,
    pub selected: Option<FrameId>,
    pub search: Option<&'a SearchState>,
}

/// Step 1 of the shared preamble: the visible absolute time window.
pub fn visible_window(profile: &Profile, viewport: Viewport) -> (i64, i64) {
    let duration = profile.duration_us() as f64;
    let t0 = profile.start_time_us as f64 + viewport.start * duration;
    let t1 = profile.start_time_us as f64 + viewport.end * duration;
    (t0.round() as i64, t1.round() as i64)
}

/// Step 2: pixels per microsecond for the current window.
pub fn pixels_per_us(width_px: f32, t0: i64, t1: i64) -> f64 {
    let span_us = (t1 - t0).max(1) as f64;
    width_px as f64 / span_us
}

/// Step 3: does `[start, end]` intersect `[t0, t1]`?
pub fn intersects_window(start: i64, end: i64, t0: i64, t1: i64) -> bool {
    start < t1 && end > t0
}

/// Maps an absolute microsecond timestamp to an X pixel within the current
/// window, snapping to the nearest device pixel the way time-order does for
/// crisp vertical edges. Shared by every transform that draws along time.
pub fn x_of(t_us: i64, t0: i64, ppu: f64) -> f32 {
    (((t_us - t0) as f64) * ppu).round() as f32
}

/// Picks the fill token for a span, honoring the color mapper, then
/// overriding for search dim/highlight state per spec.md §4.8: matches keep
/// their color, non-matches are recolored `FlameNeutral`. A selected span
/// always keeps its color, even if search is active and it isn't a match.
pub fn fill_token_for(
    inputs: &TransformInputs,
    span: &Span,
) -> ThemeToken {
    let is_search_active = inputs.search.is_some_and(SearchState::is_active);
    if !is_search_active {
        return inputs.color_mapper.token_for(inputs.profile, span);
    }
    let is_selected = inputs.selected == Some(span.frame_id);
    let is_match = inputs
        .search
        .map(|s| s.is_match(span.frame_id))
        .unwrap_or(false);
    if is_match || is_selected {
        inputs.color_mapper.token_for(inputs.profile, span)
    } else {
        ThemeToken::FlameNeutral
    }
}

/// Whether a span should draw a highlight border: `SelectionHighlight` wins
/// over search state, since selecting a span that doesn't match the current
/// query should still be visible. Otherwise, during active search,
/// matches get `SearchHighlight` and non-matches lose their border per
/// spec.md §4.8.
pub fn border_token_for(inputs: &TransformInputs, span: &Span) -> Option<ThemeToken> {
    if inputs.selected == Some(span.frame_id) {
        return Some(ThemeToken::SelectionHighlight);
    }
    let is_search_active = inputs.search.is_some_and(SearchState::is_active);
    if !is_search_active {
        return None;
    }
    let is_match = inputs
        .search
        .map(|s| s.is_match(span.frame_id))
        .unwrap_or(false);
    if is_match {
        Some(ThemeToken::SearchHighlight)
    } else {
        None
    }
}
