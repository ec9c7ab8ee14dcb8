//! Case-insensitive substring search over span names, across all visible
//! lanes, with an ordered match list and a centering viewport animation.

use crate::lanes::{LaneId, LaneManager};
use crate::model::FrameId;
use crate::session::{ProfileHandle, Session};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchMatch {
    pub profile_handle: ProfileHandle,
    pub lane_id: LaneId,
    pub frame_id: FrameId,
}

#[derive(Default)]
pub struct SearchState {
    query: String,
    matches: Vec<SearchMatch>,
    total_count: usize,
    active_index: usize,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn is_match(&self, frame_id: FrameId) -> bool {
        self.is_active() && self.matches.iter().any(|m| m.frame_id == frame_id)
    }

    /// Empty `query` clears highlights and match counts. Otherwise runs a
    /// case-insensitive substring scan over `span.name` for every span bound
    /// to a visible lane.
    pub fn set_query(&mut self, query: &str, lanes: &LaneManager, session: &Session) {
        self.query = query.to_string();
        self.matches.clear();
        self.total_count = 0;
        self.active_index = 0;

        if query.is_empty() {
            return;
        }
        let needle = query.to_lowercase();

        for lane in lanes.visible_lanes() {
            let Ok(profile) = session.profile(lane.profile_handle) else {
                continue;
            };
            for span in &profile.span_arena {
                self.total_count += 1;
                if profile.name_of(span).to_lowercase().contains(&needle) {
                    self.matches.push(SearchMatch {
                        profile_handle: lane.profile_handle,
                        lane_id: lane.id,
                        frame_id: span.frame_id,
                    });
                }
            }
        }
    }

    pub fn next_match(&mut self) -> Option<SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        self.active_index = (self.active_index + 1) % self.matches.len();
        Some(self.matches[self.active_index])
    }

    pub fn prev_match(&mut self) -> Option<SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        self.active_index = (self.active_index + self.matches.len() - 1) % self.matches.len();
        Some(self.matches[self.active_index])
    }
}

/// Centers `target` in a viewport with `padding` fraction of slack on each
/// side, clamped to the profile bounds. Used by `nextMatch`/`prevMatch` and
/// by zoom-to-fit for a single-span profile.
pub fn center_on(
    target_start_frac: f64,
    target_end_frac: f64,
    padding_frac: f64,
) -> Viewport {
    let span = (target_end_frac - target_start_frac).max(0.0001);
    let padded_span = (span * (1.0 + 2.0 * padding_frac)).min(1.0);
    let center = (target_start_frac + target_end_frac) / 2.0;
    let start = (center - padded_span / 2.0).clamp(0.0, 1.0 - padded_span);
    Viewport::new(start, start + padded_span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_clears_state() {
        let mut state = SearchState::new();
        let session = Session::new();
        state.set_query("B", &LaneManager::new(), &session);
        state.set_query("", &LaneManager::new(), &session);
        assert!(!state.is_active());
        assert_eq!(state.match_count(), 0);
    }

    #[test]
    fn center_on_respects_padding() {
        let vp = center_on(0.4, 0.5, 0.5);
        assert!(vp.start <= 0.4);
        assert!(vp.end >= 0.5);
    }

    #[test]
    fn next_and_prev_wrap_around() {
        let mut state = SearchState::new();
        state.matches = vec![
            SearchMatch {
                profile_handle: ProfileHandle(0),
                lane_id: LaneId(0),
                frame_id: FrameId(1),
            },
            SearchMatch {
                profile_handle: ProfileHandle(0),
                lane_id: LaneId(0),
                frame_id: FrameId(2),
            },
        ];
        state.active_index = 1;
        let next = state.next_match().unwrap();
        assert_eq!(next.frame_id, FrameId(1));
        let prev = state.prev_match().unwrap();
        assert_eq!(prev.frame_id, FrameId(2));
    }
}
