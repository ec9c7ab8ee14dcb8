//! Flow arrows: connect a timestamp in one thread lane to a timestamp in
//! another, approximating a cubic Bézier as a short chain of line segments
//! plus a two-line arrowhead. Skipped entirely if either endpoint's thread
//! lane is hidden.

use std::collections::HashMap;

use crate::geometry::Point;
use crate::model::{FlowEdge, ThreadId};
use crate::protocol::RenderCommand;
use crate::theme::ThemeToken;

use super::{intersects_window, pixels_per_us, visible_window, TransformInputs};

const SEGMENTS: u32 = 12;
const ARROWHEAD_LEN_PX: f32 = 6.0;

/// `lane_y` gives the Y (pixel, within the composite canvas) of a visible
/// thread lane's top edge; a thread absent from the map is treated as
/// hidden and its edges are skipped.
pub fn layout(
    inputs: &TransformInputs,
    edges: &[FlowEdge],
    lane_y: &HashMap<ThreadId, f32>,
) -> Vec<RenderCommand> {
    let (t0, t1) = visible_window(inputs.profile, inputs.viewport);
    let ppu = pixels_per_us(inputs.width_px, t0, t1);

    let mut commands = Vec::new();
    for edge in edges {
        let (Some(&from_y), Some(&to_y)) = (lane_y.get(&edge.from_tid), lane_y.get(&edge.to_tid)) else {
            continue;
        };
        if !intersects_window(edge.from_ts, edge.to_ts, t0, t1) {
            continue;
        }
        let from = Point::new((((edge.from_ts - t0) as f64) * ppu) as f32, from_y);
        let to = Point::new((((edge.to_ts - t0) as f64) * ppu) as f32, to_y);
        commands.extend(bezier_segments(from, to));
        commands.extend(arrowhead(from, to));
    }
    commands
}

/// A cubic Bézier with control points offset halfway between the endpoints
/// vertically, approximated with `SEGMENTS` straight `DrawLine`s.
fn bezier_segments(from: Point, to: Point) -> Vec<RenderCommand> {
    let c1 = Point::new(from.x, (from.y + to.y) / 2.0);
    let c2 = Point::new(to.x, (from.y + to.y) / 2.0);

    let mut commands = Vec::with_capacity(SEGMENTS as usize);
    let mut prev = from;
    for i in 1..=SEGMENTS {
        let t = i as f32 / SEGMENTS as f32;
        let point = cubic_bezier(from, c1, c2, to, t);
        commands.push(RenderCommand::DrawLine {
            from: prev,
            to: point,
            token: ThemeToken::FlowArrow,
            width: 1.0,
        });
        prev = point;
    }
    commands
}

fn cubic_bezier(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let mt = 1.0 - t;
    let x = mt * mt * mt * p0.x + 3.0 * mt * mt * t * p1.x + 3.0 * mt * t * t * p2.x + t * t * t * p3.x;
    let y = mt * mt * mt * p0.y + 3.0 * mt * mt * t * p1.y + 3.0 * mt * t * t * p2.y + t * t * t * p3.y;
    Point::new(x, y)
}

/// A two-line arrowhead pointing along the final segment's direction.
fn arrowhead(from: Point, to: Point) -> Vec<RenderCommand> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt().max(1.0);
    let (ux, uy) = (dx / len, dy / len);
    // Perpendicular-ish wings at +/- ~25 degrees from the reversed direction.
    let (wx, wy) = (-ux, -uy);
    let wing1 = Point::new(
        to.x + (wx * 0.9 - wy * 0.45) * ARROWHEAD_LEN_PX,
        to.y + (wy * 0.9 + wx * 0.45) * ARROWHEAD_LEN_PX,
    );
    let wing2 = Point::new(
        to.x + (wx * 0.9 + wy * 0.45) * ARROWHEAD_LEN_PX,
        to.y + (wy * 0.9 - wx * 0.45) * ARROWHEAD_LEN_PX,
    );
    vec![
        RenderCommand::DrawLine { from: to, to: wing1, token: ThemeToken::FlowArrow, width: 1.0 },
        RenderCommand::DrawLine { from: to, to: wing2, token: ThemeToken::FlowArrow, width: 1.0 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorMapper, ColorMode};
    use crate::config::ViewerConfig;
    use crate::model::{Profile, ProfileFormat, StringTable};
    use crate::viewport::Viewport;

    fn profile() -> Profile {
        Profile {
            name: None,
            format: ProfileFormat::ChromeTrace,
            start_time_us: 0,
            end_time_us: 1000,
            threads: vec![],
            counters: vec![],
            markers: vec![],
            async_spans: vec![],
            frames: vec![],
            flow_edges: vec![],
            span_arena: vec![],
            strings: StringTable::default(),
        }
    }

    #[test]
    fn edge_with_hidden_lane_is_skipped() {
        let profile = profile();
        let config = ViewerConfig::default();
        let mapper = ColorMapper::new(ColorMode::ByName);
        let inputs = TransformInputs {
            profile: &profile,
            viewport: Viewport::default(),
            width_px: 1000.0,
            height_px: 60.0,
            config: &config,
            color_mapper: &mapper,
            selected: None,
            search: None,
        };
        let edges = vec![FlowEdge {
            name: "post-message".into(),
            from_ts: 100,
            from_tid: ThreadId(1),
            to_ts: 200,
            to_tid: ThreadId(2),
        }];
        let mut lane_y = HashMap::new();
        lane_y.insert(ThreadId(1), 0.0);
        // ThreadId(2) is deliberately absent: its lane is hidden.
        assert!(layout(&inputs, &edges, &lane_y).is_empty());
    }

    #[test]
    fn visible_edge_emits_bezier_segments_and_arrowhead() {
        let profile = profile();
        let config = ViewerConfig::default();
        let mapper = ColorMapper::new(ColorMode::ByName);
        let inputs = TransformInputs {
            profile: &profile,
            viewport: Viewport::default(),
            width_px: 1000.0,
            height_px: 60.0,
            config: &config,
            color_mapper: &mapper,
            selected: None,
            search: None,
        };
        let edges = vec![FlowEdge {
            name: "post-message".into(),
            from_ts: 100,
            from_tid: ThreadId(1),
            to_ts: 200,
            to_tid: ThreadId(2),
        }];
        let mut lane_y = HashMap::new();
        lane_y.insert(ThreadId(1), 0.0);
        lane_y.insert(ThreadId(2), 40.0);
        let commands = layout(&inputs, &edges, &lane_y);
        assert_eq!(commands.len(), SEGMENTS as usize + 2);
    }
}
