//! Hit testing and span selection. Hit testing never re-runs layout: it
//! scans the rect list a view transform produced for the last frame.

use std::collections::HashMap;

use crate::geometry::{Point, Rect};
use crate::lanes::{LaneId, LaneManager};
use crate::model::{FrameId, Profile};
use crate::protocol::RenderCommand;
use crate::session::ProfileHandle;

/// The subset of a frame's render commands relevant to hit testing: rect +
/// frame id, in the order they were drawn.
#[derive(Debug, Clone, Copy)]
struct HitRect {
    rect: Rect,
    frame_id: FrameId,
}

/// Caches the last layout produced per lane, so hit testing is O(visible
/// rects in one lane) instead of re-running a view transform.
#[derive(Default)]
pub struct LayoutCache {
    per_lane: HashMap<LaneId, Vec<HitRect>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one lane's render commands for later hit testing. Called by
    /// the viewer right after it runs a view transform for that lane.
    pub fn record(&mut self, lane: LaneId, commands: &[RenderCommand]) {
        let rects = commands
            .iter()
            .filter_map(|cmd| match cmd {
                RenderCommand::DrawRect {
                    rect,
                    frame_id: Some(frame_id),
                    ..
                } => Some(HitRect {
                    rect: *rect,
                    frame_id: *frame_id,
                }),
                _ => None,
            })
            .collect();
        self.per_lane.insert(lane, rects);
    }

    pub fn clear_lane(&mut self, lane: LaneId) {
        self.per_lane.remove(&lane);
    }

    /// Scans a lane's cached rects in last-drawn-first order so the topmost
    /// span wins on overlap (e.g. a search-highlight overlay drawn after the
    /// span it highlights).
    fn hit_in_lane(&self, lane: LaneId, local: Point) -> Option<FrameId> {
        let rects = self.per_lane.get(&lane)?;
        rects
            .iter()
            .rev()
            .find(|r| r.rect.contains(local))
            .map(|r| r.frame_id)
    }
}

/// Hit-tests `(mx, my)` against the lane at that Y, translating to
/// lane-local coordinates first.
pub fn hit_test(
    lanes: &LaneManager,
    cache: &LayoutCache,
    mx: f32,
    my: f32,
) -> Option<(LaneId, FrameId)> {
    let lane = lanes.lane_at_y(my)?;
    let lane_top = my - local_y_within_lane(lanes, lane.id, my)?;
    let local = Point::new(mx, my - lane_top);
    cache.hit_in_lane(lane.id, local).map(|fid| (lane.id, fid))
}

fn local_y_within_lane(lanes: &LaneManager, lane_id: LaneId, y: f32) -> Option<f32> {
    let mut cursor = -lanes.global_scroll_y();
    for lane in lanes.visible_lanes() {
        let header = 28.0;
        let bottom = cursor + header + lane.height_px;
        if lane.id == lane_id && y >= cursor && y < bottom {
            return Some(y - (cursor + header));
        }
        cursor = bottom;
    }
    None
}

/// A user's current selection: enough to redraw a highlight without
/// re-resolving the span every frame, plus the handle needed to navigate.
#[derive(Debug, Clone)]
pub struct SelectedSpan {
    pub profile_handle: ProfileHandle,
    pub frame_id: FrameId,
    pub lane_id: LaneId,
    pub start_us: i64,
    pub end_us: i64,
    pub name: String,
}

impl SelectedSpan {
    pub fn from_profile(
        profile: &Profile,
        profile_handle: ProfileHandle,
        lane_id: LaneId,
        frame_id: FrameId,
    ) -> Option<Self> {
        let span = profile.span(frame_id)?;
        Some(Self {
            profile_handle,
            frame_id,
            lane_id,
            start_us: span.start_us,
            end_us: span.end_us,
            name: profile.name_of(span).to_string(),
        })
    }
}

/// Hierarchy navigation from a selected span, using the arena links —
/// O(1) per step, no re-traversal of the whole tree.
pub enum NavigationTarget {
    Parent,
    FirstChild,
    NextSibling,
    PrevSibling,
}

pub fn navigate(
    profile: &Profile,
    current: FrameId,
    target: NavigationTarget,
) -> Option<FrameId> {
    let span = profile.span(current)?;
    match target {
        NavigationTarget::Parent => span.parent.map(|idx| profile.frame_id_of(idx)),
        NavigationTarget::FirstChild => span.first_child.map(|idx| profile.frame_id_of(idx)),
        NavigationTarget::NextSibling => span.next_sibling.map(|idx| profile.frame_id_of(idx)),
        NavigationTarget::PrevSibling => {
            let parent = profile.parent(span)?;
            let mut prev = None;
            for child in profile.children(parent) {
                if child.frame_id == current {
                    return prev;
                }
                prev = Some(child.frame_id);
            }
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSelection {
    pub start: f64,
    pub end: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lanes::LaneKind;
    use crate::model::{FrameId, Span, SpanFlags, SpanIndex, StringTable, ThreadId};
    use crate::protocol::RenderCommand;
    use crate::theme::ThemeToken;

    fn three_span_profile() -> Profile {
        let mut strings = StringTable::default();
        let a = strings.intern("A");
        let b = strings.intern("B");
        let c = strings.intern("C");
        Profile {
            name: None,
            format: crate::model::ProfileFormat::ChromeTrace,
            start_time_us: 0,
            end_time_us: 1000,
            threads: vec![],
            counters: vec![],
            markers: vec![],
            async_spans: vec![],
            frames: vec![],
            flow_edges: vec![],
            span_arena: vec![
                Span {
                    frame_id: FrameId(1),
                    parent: None,
                    first_child: Some(SpanIndex(1)),
                    next_sibling: None,
                    name: a,
                    category: None,
                    thread_id: ThreadId(0),
                    depth: 0,
                    start_us: 0,
                    end_us: 1000,
                    self_time_us: 300,
                    flags: SpanFlags::EMPTY,
                },
                Span {
                    frame_id: FrameId(2),
                    parent: Some(SpanIndex(0)),
                    first_child: None,
                    next_sibling: Some(SpanIndex(2)),
                    name: b,
                    category: None,
                    thread_id: ThreadId(0),
                    depth: 1,
                    start_us: 100,
                    end_us: 400,
                    self_time_us: 300,
                    flags: SpanFlags::EMPTY,
                },
                Span {
                    frame_id: FrameId(3),
                    parent: Some(SpanIndex(0)),
                    first_child: None,
                    next_sibling: None,
                    name: c,
                    category: None,
                    thread_id: ThreadId(0),
                    depth: 1,
                    start_us: 500,
                    end_us: 900,
                    self_time_us: 400,
                    flags: SpanFlags::EMPTY,
                },
            ],
            strings,
        }
    }

    #[test]
    fn navigation_follows_arena_links() {
        let profile = three_span_profile();
        let a = FrameId(1);
        let b = FrameId(2);
        let c = FrameId(3);
        assert_eq!(
            navigate(&profile, a, NavigationTarget::FirstChild),
            Some(b)
        );
        assert_eq!(navigate(&profile, b, NavigationTarget::NextSibling), Some(c));
        assert_eq!(navigate(&profile, c, NavigationTarget::PrevSibling), Some(b));
        assert_eq!(navigate(&profile, b, NavigationTarget::Parent), Some(a));
    }

    #[test]
    fn hit_test_picks_topmost_on_overlap() {
        let mut lanes = LaneManager::new();
        let lane_id = lanes.add_lane(ProfileHandle(0), LaneKind::Thread);
        let mut cache = LayoutCache::new();
        let commands = vec![
            RenderCommand::DrawRect {
                rect: Rect::new(0.0, 0.0, 100.0, 20.0),
                fill_token: ThemeToken::FlameHot,
                border_token: None,
                label: None,
                frame_id: Some(FrameId(1)),
            },
            RenderCommand::DrawRect {
                rect: Rect::new(0.0, 0.0, 100.0, 20.0),
                fill_token: ThemeToken::FlameWarm,
                border_token: None,
                label: None,
                frame_id: Some(FrameId(2)),
            },
        ];
        cache.record(lane_id, &commands);
        let hit = hit_test(&lanes, &cache, 10.0, 10.0);
        assert_eq!(hit, Some((lane_id, FrameId(2))));
    }

    #[test]
    fn hit_test_misses_return_none() {
        let lanes = LaneManager::new();
        let cache = LayoutCache::new();
        assert_eq!(hit_test(&lanes, &cache, 10.0, 10.0), None);
    }
}
