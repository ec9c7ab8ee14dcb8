//! Ordered display lanes: thread tracks plus auxiliary tracks (counter,
//! marker, async, frame). Vertical layout only — the time axis is shared
//! across lanes and owned by [`crate::viewport::Viewport`].

use crate::model::ThreadId;
use crate::protocol::{RenderCommand, TextAlign};
use crate::session::ProfileHandle;
use crate::theme::ThemeToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    TimeOrder,
    LeftHeavy,
    Icicle,
    Sandwich,
    Ranked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneKind {
    Thread,
    Counter(String),
    Marker,
    Async,
    Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId(pub u32);

#[derive(Debug, Clone)]
pub struct Lane {
    pub id: LaneId,
    pub profile_handle: ProfileHandle,
    pub kind: LaneKind,
    pub thread_id: Option<ThreadId>,
    pub height_px: f32,
    pub scroll_y: f32,
    pub visible: bool,
    pub view_type: ViewType,
    pub selected_frame: Option<crate::model::FrameId>,
}

impl Lane {
    pub fn new(id: LaneId, profile_handle: ProfileHandle, kind: LaneKind) -> Self {
        let thread_id_kind_is_thread = matches!(kind, LaneKind::Thread);
        Self {
            id,
            profile_handle,
            kind,
            thread_id: None,
            height_px: if thread_id_kind_is_thread { 120.0 } else { 48.0 },
            scroll_y: 0.0,
            visible: true,
            view_type: ViewType::TimeOrder,
            selected_frame: None,
        }
    }
}

/// Owns the ordered `Vec<Lane>` and all vertical-layout arithmetic.
/// Grounded on the teacher's index-based ownership style (`LaneManager`
/// plays the role `FullStateReader` plays for state: the single place that
/// owns a collection and answers positional queries against it).
#[derive(Default)]
pub struct LaneManager {
    lanes: Vec<Lane>,
    next_id: u32,
    global_scroll_y: f32,
}

const HEADER_HEIGHT_PX: f32 = 28.0;

impl LaneManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lane(&mut self, profile_handle: ProfileHandle, kind: LaneKind) -> LaneId {
        let id = LaneId(self.next_id);
        self.next_id += 1;
        self.lanes.push(Lane::new(id, profile_handle, kind));
        id
    }

    pub fn remove_lanes_for_profile(&mut self, profile_handle: ProfileHandle) {
        self.lanes.retain(|l| l.profile_handle != profile_handle);
    }

    pub fn lane(&self, id: LaneId) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.id == id)
    }

    pub fn lane_mut(&mut self, id: LaneId) -> Option<&mut Lane> {
        self.lanes.iter_mut().find(|l| l.id == id)
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn visible_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.iter().filter(|l| l.visible)
    }

    pub fn set_visibility(&mut self, id: LaneId, visible: bool) {
        if let Some(lane) = self.lane_mut(id) {
            lane.visible = visible;
        }
    }

    pub fn set_height(&mut self, id: LaneId, height_px: f32, min: f32, max: f32) {
        if let Some(lane) = self.lane_mut(id) {
            lane.height_px = height_px.clamp(min, max);
        }
    }

    /// Cumulative pixel offset above the i-th visible lane's content,
    /// header heights included, honoring `globalScrollY`.
    pub fn lane_y(&self, visible_index: usize) -> f32 {
        let mut y = -self.global_scroll_y;
        for lane in self.visible_lanes().take(visible_index) {
            y += HEADER_HEIGHT_PX + lane.height_px;
        }
        y
    }

    pub fn total_height(&self) -> f32 {
        self.visible_lanes()
            .map(|l| HEADER_HEIGHT_PX + l.height_px)
            .sum()
    }

    /// Reverse lookup: which lane (if any) a given pixel `y` falls within.
    pub fn lane_at_y(&self, y: f32) -> Option<&Lane> {
        let mut cursor = -self.global_scroll_y;
        for lane in self.visible_lanes() {
            let lane_bottom = cursor + HEADER_HEIGHT_PX + lane.height_px;
            if y >= cursor && y < lane_bottom {
                return Some(lane);
            }
            cursor = lane_bottom;
        }
        None
    }

    /// Whether `y` falls on the draggable resize handle at the bottom edge
    /// of a lane (a thin strip, `handle_px` tall).
    pub fn drag_handle_at_y(&self, y: f32, handle_px: f32) -> Option<LaneId> {
        let mut cursor = -self.global_scroll_y;
        for lane in self.visible_lanes() {
            let lane_bottom = cursor + HEADER_HEIGHT_PX + lane.height_px;
            if y >= lane_bottom - handle_px && y < lane_bottom {
                return Some(lane.id);
            }
            cursor = lane_bottom;
        }
        None
    }

    pub fn move_lane(&mut self, from: usize, to: usize) {
        if from >= self.lanes.len() || to >= self.lanes.len() {
            return;
        }
        let lane = self.lanes.remove(from);
        self.lanes.insert(to, lane);
    }

    pub fn scroll_global(&mut self, dy: f32, viewport_height: f32) {
        let max_scroll = (self.total_height() - viewport_height).max(0.0);
        self.global_scroll_y = (self.global_scroll_y + dy).clamp(0.0, max_scroll);
    }

    pub fn global_scroll_y(&self) -> f32 {
        self.global_scroll_y
    }

    /// One header strip per visible lane, drawn at a fixed height.
    pub fn render_headers(&self, width: f32, y_offset: f32) -> Vec<RenderCommand> {
        let mut commands = Vec::new();
        let mut y = y_offset - self.global_scroll_y;
        for lane in self.visible_lanes() {
            commands.push(RenderCommand::DrawRect {
                rect: crate::geometry::Rect::new(0.0, y, width, HEADER_HEIGHT_PX),
                fill_token: ThemeToken::LaneHeaderBackground,
                border_token: Some(ThemeToken::LaneBorder),
                label: None,
                frame_id: None,
            });
            commands.push(RenderCommand::DrawText {
                pos: crate::geometry::Point::new(8.0, y + HEADER_HEIGHT_PX / 2.0),
                text: lane_label(lane),
                token: ThemeToken::LaneHeaderText,
                font_size: 12.0,
                align: TextAlign::Left,
            });
            y += HEADER_HEIGHT_PX + lane.height_px;
        }
        commands
    }
}

fn lane_label(lane: &Lane) -> String {
    match &lane.kind {
        LaneKind::Thread => format!("thread {:?}", lane.thread_id),
        LaneKind::Counter(name) => name.clone(),
        LaneKind::Marker => "Markers".to_string(),
        LaneKind::Async => "Async".to_string(),
        LaneKind::Frame => "Frames".to_string(),
    }
}
