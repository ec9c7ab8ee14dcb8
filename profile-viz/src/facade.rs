//! The narrow command surface spec.md §4.10 calls for: every state mutation
//! a host (GUI or `viz-cli`) triggers goes through one `Facade` method, each
//! followed by a change notification, mirroring the teacher's
//! `FullStateReader` as the single owner callers route every query and
//! mutation through rather than reaching into `Session`/`LaneManager`
//! directly.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, info_span};

use crate::color::{ColorMapper, ColorMode};
use crate::config::ViewerConfig;
use crate::error::{ExportError, ParseError};
use crate::interaction::{navigate, LayoutCache, NavigationTarget, SelectedSpan};
use crate::lanes::{Lane, LaneId, LaneKind, LaneManager, ViewType};
use crate::model::{FrameId, ThreadId};
use crate::parsers;
use crate::protocol::RenderCommand;
use crate::search::{self, SearchState};
use crate::session::{ProfileHandle, Session};
use crate::theme::Theme;
use crate::transforms::{self, TransformInputs};
use crate::viewport::{Viewport, ViewportHistory};
use crate::export;

const SEARCH_CENTER_PADDING: f64 = 0.2;
const ZOOM_TO_SELECTION_PADDING: f64 = 0.1;

#[derive(Debug, Clone, Serialize)]
pub struct LaneSnapshot {
    pub lane_id: u32,
    pub profile_handle: u32,
    pub kind: String,
    pub visible: bool,
    pub height_px: f32,
    pub view_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSnapshot {
    pub handle: u32,
    pub label: String,
    pub offset_us: i64,
}

/// A flat, JSON-serializable snapshot for external consumers (spec.md
/// §4.10's `getStateSnapshot`). Intentionally denormalized: a consumer reads
/// this once per change notification rather than polling every subsystem.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub profiles: Vec<ProfileSnapshot>,
    pub lanes: Vec<LaneSnapshot>,
    pub viewport_start: f64,
    pub viewport_end: f64,
    pub selected_lane_id: Option<u32>,
    pub selected_frame_id: Option<u64>,
    pub selected_span_name: Option<String>,
    pub search_query: String,
    pub search_match_count: usize,
    pub search_active_index: usize,
    pub theme_name: String,
    pub color_mode: String,
    pub can_navigate_back: bool,
    pub can_navigate_forward: bool,
}

pub struct Facade {
    session: Session,
    lanes: LaneManager,
    layout_cache: LayoutCache,
    viewport: Viewport,
    history: ViewportHistory,
    config: ViewerConfig,
    theme: Theme,
    color_mapper: ColorMapper,
    search: SearchState,
    selection: Option<SelectedSpan>,
    listeners: Vec<Box<dyn FnMut()>>,
}

impl Facade {
    pub fn new(config: ViewerConfig) -> Self {
        let history = ViewportHistory::new(config.zoom_history_depth);
        Self {
            session: Session::new(),
            lanes: LaneManager::new(),
            layout_cache: LayoutCache::new(),
            viewport: Viewport::default(),
            history,
            config,
            theme: Theme::dark(),
            color_mapper: ColorMapper::new(ColorMode::ByName),
            search: SearchState::new(),
            selection: None,
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Registers a callback fired after every command that mutates state
    /// touched by a subscriber-visible field. There is no unsubscribe: hosts
    /// are expected to build one long-lived `Facade` per session, matching
    /// the teacher's single-subscriber reload pattern.
    pub fn on_state_change(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        for listener in &mut self.listeners {
            listener();
        }
    }

    // -- loading ---------------------------------------------------------

    pub fn load_profile(&mut self, bytes: &[u8]) -> Result<ProfileHandle, ParseError> {
        let span = info_span!("load_profile", bytes = bytes.len());
        let _enter = span.enter();
        let profile = parsers::parse(bytes)?;
        info!(format = ?profile.format, threads = profile.threads.len(), "profile parsed");
        let handle = self.session.add_profile(profile);
        self.spawn_lanes_for(handle);
        self.notify();
        Ok(handle)
    }

    fn spawn_lanes_for(&mut self, handle: ProfileHandle) {
        let Ok(profile) = self.session.profile(handle) else {
            return;
        };
        let thread_ids: Vec<ThreadId> = profile.threads.iter().map(|t| t.id).collect();
        let has_markers = !profile.markers.is_empty();
        let has_async = !profile.async_spans.is_empty();
        let has_frames = !profile.frames.is_empty();
        let counter_names: Vec<String> = profile.counters.iter().map(|c| c.name.clone()).collect();

        for thread_id in thread_ids {
            let lane_id = self.lanes.add_lane(handle, LaneKind::Thread);
            if let Some(lane) = self.lanes.lane_mut(lane_id) {
                lane.thread_id = Some(thread_id);
            }
        }
        for name in counter_names {
            self.lanes.add_lane(handle, LaneKind::Counter(name));
        }
        if has_markers {
            self.lanes.add_lane(handle, LaneKind::Marker);
        }
        if has_async {
            self.lanes.add_lane(handle, LaneKind::Async);
        }
        if has_frames {
            self.lanes.add_lane(handle, LaneKind::Frame);
        }
    }

    pub fn clear_session(&mut self) {
        self.session.clear();
        self.lanes = LaneManager::new();
        self.layout_cache = LayoutCache::new();
        self.selection = None;
        self.search = SearchState::new();
        self.notify();
    }

    pub fn set_profile_offset(&mut self, handle: ProfileHandle, offset_us: i64) {
        let _ = self.session.set_offset(handle, offset_us);
        self.notify();
    }

    // -- appearance --------------------------------------------------------

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.notify();
    }

    pub fn set_view_type(&mut self, lane_id: LaneId, view_type: ViewType) {
        if let Some(lane) = self.lanes.lane_mut(lane_id) {
            lane.view_type = view_type;
        }
        self.notify();
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mapper.set_mode(mode);
        self.notify();
    }

    // -- search --------------------------------------------------------

    pub fn set_search(&mut self, query: &str) {
        self.search.set_query(query, &self.lanes, &self.session);
        self.notify();
    }

    pub fn next_search_result(&mut self) {
        if let Some(m) = self.search.next_match() {
            self.center_on_frame(m.profile_handle, m.frame_id);
        }
        self.notify();
    }

    pub fn prev_search_result(&mut self) {
        if let Some(m) = self.search.prev_match() {
            self.center_on_frame(m.profile_handle, m.frame_id);
        }
        self.notify();
    }

    fn center_on_frame(&mut self, handle: ProfileHandle, frame_id: FrameId) {
        let Ok(profile) = self.session.profile(handle) else {
            return;
        };
        let Some(span) = profile.span(frame_id) else {
            return;
        };
        let duration = profile.duration_us().max(1) as f64;
        let start_frac = (span.start_us - profile.start_time_us) as f64 / duration;
        let end_frac = (span.end_us - profile.start_time_us) as f64 / duration;
        self.history.push(self.viewport);
        self.viewport = search::center_on(start_frac, end_frac, SEARCH_CENTER_PADDING);
    }

    // -- selection & navigation --------------------------------------------

    pub fn select_span(&mut self, lane_id: LaneId, frame_id: FrameId) {
        if let Some(lane) = self.lanes.lane(lane_id) {
            if let Ok(profile) = self.session.profile(lane.profile_handle) {
                self.selection = SelectedSpan::from_profile(profile, lane.profile_handle, lane_id, frame_id);
            }
        }
        self.notify();
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.notify();
    }

    pub fn navigate_to_parent(&mut self) {
        self.navigate(NavigationTarget::Parent);
    }

    pub fn navigate_to_child(&mut self) {
        self.navigate(NavigationTarget::FirstChild);
    }

    pub fn navigate_to_next_sibling(&mut self) {
        self.navigate(NavigationTarget::NextSibling);
    }

    pub fn navigate_to_prev_sibling(&mut self) {
        self.navigate(NavigationTarget::PrevSibling);
    }

    fn navigate(&mut self, target: NavigationTarget) {
        if let Some(selection) = self.selection.clone() {
            if let Ok(profile) = self.session.profile(selection.profile_handle) {
                if let Some(next) = navigate(profile, selection.frame_id, target) {
                    self.selection =
                        SelectedSpan::from_profile(profile, selection.profile_handle, selection.lane_id, next);
                }
            }
        }
        self.notify();
    }

    pub fn selection(&self) -> Option<&SelectedSpan> {
        self.selection.as_ref()
    }

    // -- lanes --------------------------------------------------------

    pub fn set_lane_visibility(&mut self, lane_id: LaneId, visible: bool) {
        self.lanes.set_visibility(lane_id, visible);
        self.notify();
    }

    pub fn set_lane_height(&mut self, lane_id: LaneId, height_px: f32) {
        self.lanes
            .set_height(lane_id, height_px, self.config.min_lane_height_px, self.config.max_lane_height_px);
        self.notify();
    }

    pub fn reorder_lanes(&mut self, from: usize, to: usize) {
        self.lanes.move_lane(from, to);
        self.notify();
    }

    pub fn lanes(&self) -> &LaneManager {
        &self.lanes
    }

    // -- viewport --------------------------------------------------------

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.history.push(self.viewport);
        self.viewport = viewport;
        self.notify();
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn reset_zoom(&mut self) {
        self.history.push(self.viewport);
        self.viewport = Viewport::default();
        self.notify();
    }

    pub fn zoom_to_selection(&mut self) {
        if let Some(selection) = self.selection.clone() {
            if let Ok(profile) = self.session.profile(selection.profile_handle) {
                let duration = profile.duration_us().max(1) as f64;
                let start_frac = (selection.start_us - profile.start_time_us) as f64 / duration;
                let end_frac = (selection.end_us - profile.start_time_us) as f64 / duration;
                self.history.push(self.viewport);
                self.viewport = search::center_on(start_frac, end_frac, ZOOM_TO_SELECTION_PADDING);
            }
        }
        self.notify();
    }

    pub fn navigate_back(&mut self) {
        if let Some(v) = self.history.back(self.viewport) {
            self.viewport = v;
        }
        self.notify();
    }

    pub fn navigate_forward(&mut self) {
        if let Some(v) = self.history.forward(self.viewport) {
            self.viewport = v;
        }
        self.notify();
    }

    // -- rendering --------------------------------------------------------

    /// Runs the view transform a lane's `kind`/`view_type` selects, and
    /// records the result into the hit-test cache. This is the one place
    /// rendering and hit testing share a result, per spec.md §4.7.
    pub fn render_lane(&mut self, lane_id: LaneId, width_px: f32, height_px: f32) -> Vec<RenderCommand> {
        let Some(lane) = self.lanes.lane(lane_id).cloned() else {
            return Vec::new();
        };
        let commands = self.layout_for_lane(&lane, width_px, height_px);
        self.layout_cache.record(lane_id, &commands);
        commands
    }

    fn layout_for_lane(&self, lane: &Lane, width_px: f32, height_px: f32) -> Vec<RenderCommand> {
        let Ok(profile) = self.session.profile(lane.profile_handle) else {
            return Vec::new();
        };
        let inputs = TransformInputs {
            profile,
            viewport: self.viewport,
            width_px,
            height_px,
            config: &self.config,
            color_mapper: &self.color_mapper,
            selected: self.selection.as_ref().map(|s| s.frame_id),
            search: Some(&self.search),
        };
        match &lane.kind {
            LaneKind::Thread => {
                let Some(thread_id) = lane.thread_id else {
                    return Vec::new();
                };
                match lane.view_type {
                    ViewType::TimeOrder => transforms::time_order::layout(&inputs, thread_id),
                    ViewType::LeftHeavy => transforms::left_heavy::layout(&inputs, thread_id),
                    ViewType::Icicle => transforms::icicle::layout(&inputs, thread_id),
                    ViewType::Sandwich => {
                        let selected = lane.selected_frame.or(inputs.selected);
                        transforms::sandwich::layout(&inputs, selected).unwrap_or_default()
                    }
                    ViewType::Ranked => transforms::ranked::layout(
                        &inputs,
                        transforms::ranked::RankMetric::TotalTime,
                        transforms::ranked::SortDirection::Descending,
                    ),
                }
            }
            LaneKind::Counter(name) => match profile.counters.iter().find(|c| &c.name == name) {
                Some(counter) => transforms::counter_track::layout(&inputs, counter),
                None => Vec::new(),
            },
            LaneKind::Marker => transforms::marker_track::layout(&inputs, &profile.markers),
            LaneKind::Async => transforms::async_track::layout(&inputs, &profile.async_spans),
            LaneKind::Frame => transforms::frame_track::layout(&inputs, &profile.frames),
        }
    }

    pub fn render_time_axis(&self, handle: ProfileHandle, width_px: f32, gridlines: bool) -> Vec<RenderCommand> {
        let Ok(profile) = self.session.profile(handle) else {
            return Vec::new();
        };
        let inputs = TransformInputs {
            profile,
            viewport: self.viewport,
            width_px,
            height_px: self.config.lane_header_height_px,
            config: &self.config,
            color_mapper: &self.color_mapper,
            selected: None,
            search: None,
        };
        transforms::time_axis::layout(&inputs, gridlines)
    }

    pub fn render_minimap(&self, handle: ProfileHandle, width_px: f32, height_px: f32) -> Vec<RenderCommand> {
        let Ok(profile) = self.session.profile(handle) else {
            return Vec::new();
        };
        let inputs = TransformInputs {
            profile,
            viewport: self.viewport,
            width_px,
            height_px,
            config: &self.config,
            color_mapper: &self.color_mapper,
            selected: None,
            search: None,
        };
        transforms::minimap::layout(&inputs)
    }

    pub fn render_flow_arrows(&self, handle: ProfileHandle, width_px: f32) -> Vec<RenderCommand> {
        let Ok(profile) = self.session.profile(handle) else {
            return Vec::new();
        };
        let mut lane_y = HashMap::new();
        let mut y = 0.0f32;
        for lane in self.lanes.visible_lanes() {
            if lane.profile_handle == handle {
                if let (LaneKind::Thread, Some(thread_id)) = (&lane.kind, lane.thread_id) {
                    lane_y.insert(thread_id, y + self.config.lane_header_height_px);
                }
            }
            y += self.config.lane_header_height_px + lane.height_px;
        }
        let inputs = TransformInputs {
            profile,
            viewport: self.viewport,
            width_px,
            height_px: y,
            config: &self.config,
            color_mapper: &self.color_mapper,
            selected: None,
            search: None,
        };
        transforms::flow_arrows::layout(&inputs, &profile.flow_edges, &lane_y)
    }

    pub fn render_lane_headers(&self, width_px: f32) -> Vec<RenderCommand> {
        self.lanes.render_headers(width_px, 0.0)
    }

    // -- export --------------------------------------------------------

    pub fn export_json(&self) -> Result<String, ExportError> {
        export::json::export_session(&self.session)
    }

    pub fn export_svg(&mut self, lane_id: LaneId, width_px: f32, height_px: f32) -> Result<String, ExportError> {
        let commands = self.render_lane(lane_id, width_px, height_px);
        Ok(export::svg::render_svg(&commands, width_px, height_px, &self.theme))
    }

    // -- state snapshot --------------------------------------------------------

    pub fn get_state(&self) -> StateSnapshot {
        let profiles = self
            .session
            .summaries()
            .into_iter()
            .map(|s| ProfileSnapshot {
                handle: s.handle.0,
                label: s.label,
                offset_us: s.offset_us,
            })
            .collect();
        let lanes = self
            .lanes
            .lanes()
            .iter()
            .map(|lane| LaneSnapshot {
                lane_id: lane.id.0,
                profile_handle: lane.profile_handle.0,
                kind: lane_kind_label(&lane.kind),
                visible: lane.visible,
                height_px: lane.height_px,
                view_type: view_type_label(lane.view_type),
            })
            .collect();
        StateSnapshot {
            profiles,
            lanes,
            viewport_start: self.viewport.start,
            viewport_end: self.viewport.end,
            selected_lane_id: self.selection.as_ref().map(|s| s.lane_id.0),
            selected_frame_id: self.selection.as_ref().map(|s| s.frame_id.0),
            selected_span_name: self.selection.as_ref().map(|s| s.name.clone()),
            search_query: self.search.query().to_string(),
            search_match_count: self.search.match_count(),
            search_active_index: self.search.active_index(),
            theme_name: self.theme.name().to_string(),
            color_mode: format!("{:?}", self.color_mapper.mode()),
            can_navigate_back: self.history.can_back(),
            can_navigate_forward: self.history.can_forward(),
        }
    }
}

fn lane_kind_label(kind: &LaneKind) -> String {
    match kind {
        LaneKind::Thread => "thread".to_string(),
        LaneKind::Counter(name) => format!("counter:{name}"),
        LaneKind::Marker => "marker".to_string(),
        LaneKind::Async => "async".to_string(),
        LaneKind::Frame => "frame".to_string(),
    }
}

fn view_type_label(view_type: ViewType) -> String {
    match view_type {
        ViewType::TimeOrder => "time_order".to_string(),
        ViewType::LeftHeavy => "left_heavy".to_string(),
        ViewType::Icicle => "icicle".to_string(),
        ViewType::Sandwich => "sandwich".to_string(),
        ViewType::Ranked => "ranked".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLAPSED_FIXTURE: &[u8] = b"main;foo;bar 3\nmain;baz 1\n";

    #[test]
    fn loading_a_profile_spawns_a_thread_lane() {
        let mut facade = Facade::new(ViewerConfig::default());
        let handle = facade.load_profile(COLLAPSED_FIXTURE).unwrap();
        let lanes: Vec<_> = facade.lanes().lanes().iter().filter(|l| l.profile_handle == handle).collect();
        assert_eq!(lanes.len(), 1);
        assert_eq!(lanes[0].kind, LaneKind::Thread);
    }

    #[test]
    fn state_change_listener_fires_on_load() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut facade = Facade::new(ViewerConfig::default());
        let fired = Rc::new(Cell::new(false));
        let fired_clone = fired.clone();
        facade.on_state_change(move || fired_clone.set(true));
        facade.load_profile(COLLAPSED_FIXTURE).unwrap();
        assert!(fired.get());
    }

    #[test]
    fn selecting_then_navigating_to_parent_follows_arena_links() {
        let mut facade = Facade::new(ViewerConfig::default());
        facade.load_profile(COLLAPSED_FIXTURE).unwrap();
        let lane_id = facade.lanes().lanes()[0].id;
        facade.render_lane(lane_id, 800.0, 120.0);
        facade.select_span(lane_id, FrameId(2));
        facade.navigate_to_parent();
        let selection = facade.selection().unwrap();
        assert_eq!(selection.frame_id, FrameId(1));
    }

    #[test]
    fn export_json_round_trips_through_session() {
        let mut facade = Facade::new(ViewerConfig::default());
        facade.load_profile(COLLAPSED_FIXTURE).unwrap();
        let json = facade.export_json().unwrap();
        assert!(json.contains("\"profiles\""));
    }

    #[test]
    fn clearing_session_drops_lanes_and_selection() {
        let mut facade = Facade::new(ViewerConfig::default());
        facade.load_profile(COLLAPSED_FIXTURE).unwrap();
        facade.clear_session();
        assert!(facade.lanes().lanes().is_empty());
        assert!(facade.selection().is_none());
    }
}
