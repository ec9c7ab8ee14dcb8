//! Time-order view: spans drawn at their literal timestamps and depth.
//! Scenario 1 in spec.md §8 is this transform's canonical example.

use crate::geometry::Rect;
use crate::model::{Span, ThreadId};
use crate::protocol::RenderCommand;
use crate::theme::ThemeToken;

use super::{border_token_for, fill_token_for, intersects_window, pixels_per_us, visible_window, TransformInputs};

pub fn layout(inputs: &TransformInputs, thread_id: ThreadId) -> Vec<RenderCommand> {
    let profile = inputs.profile;
    let Some(thread) = profile.threads.iter().find(|t| t.id == thread_id) else {
        return Vec::new();
    };

    let (t0, t1) = visible_window(profile, inputs.viewport);
    let ppu = pixels_per_us(inputs.width_px, t0, t1);
    let row_h = inputs.config.row_height_px;

    let mut commands = Vec::new();
    // Iterative DFS over the arena's first_child/next_sibling links: avoids
    // recursion depth blowing up on pathologically deep call stacks from
    // sampled-format reconstruction.
    let mut stack: Vec<_> = thread.span_root_ids.iter().rev().cloned().collect();

    while let Some(idx) = stack.pop() {
        let span = profile.span_by_index(idx);

        if intersects_window(span.start_us, span.end_us, t0, t1) {
            if let Some(cmd) = rect_for_span(inputs, span, t0, ppu, row_h) {
                commands.push(cmd);
            }
        }

        let mut kids = Vec::new();
        let mut next = span.first_child;
        while let Some(i) = next {
            kids.push(i);
            next = profile.span_by_index(i).next_sibling;
        }
        // Reverse so popping the stack visits children in start-time order.
        kids.reverse();
        stack.extend(kids);
    }

    commands
}

fn rect_for_span(
    inputs: &TransformInputs,
    span: &Span,
    t0: i64,
    ppu: f64,
    row_h: f32,
) -> Option<RenderCommand> {
    let x0 = (((span.start_us - t0) as f64) * ppu) as f32;
    let x1 = (((span.end_us - t0) as f64) * ppu) as f32;
    let w = x1 - x0;
    if w < inputs.config.min_span_width_px {
        return None;
    }
    let rect = Rect::new(x0, span.depth as f32 * row_h, w, row_h - 1.0).snapped_x();

    let label = if w > inputs.config.label_min_width_px {
        Some(inputs.profile.name_of(span).to_string())
    } else {
        None
    };

    Some(RenderCommand::DrawRect {
        rect,
        fill_token: fill_token_for(inputs, span),
        border_token: border_token_for(inputs, span),
        label,
        frame_id: Some(span.frame_id),
    })
}

/// A search-highlight overlay rect drawn after (so it wins hit-testing
/// ordering) the base span rect, for every matching span in the lane.
pub fn search_overlays(inputs: &TransformInputs, thread_id: ThreadId) -> Vec<RenderCommand> {
    let Some(search) = inputs.search.filter(|s| s.is_active()) else {
        return Vec::new();
    };
    let profile = inputs.profile;
    let (t0, t1) = visible_window(profile, inputs.viewport);
    let ppu = pixels_per_us(inputs.width_px, t0, t1);
    let row_h = inputs.config.row_height_px;

    let mut commands = Vec::new();
    for m in search.matches() {
        let Some(span) = profile.span(m.frame_id) else {
            continue;
        };
        if span.thread_id != thread_id || !intersects_window(span.start_us, span.end_us, t0, t1) {
            continue;
        }
        let x0 = (((span.start_us - t0) as f64) * ppu) as f32;
        let x1 = (((span.end_us - t0) as f64) * ppu) as f32;
        let w = x1 - x0;
        if w < inputs.config.min_span_width_px {
            continue;
        }
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x0, span.depth as f32 * row_h, w, row_h - 1.0).snapped_x(),
            fill_token: ThemeToken::SearchHighlight,
            border_token: None,
            label: None,
            frame_id: None,
        });
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorMapper, ColorMode};
    use crate::config::ViewerConfig;
    use crate::model::{FrameId, ProfileFormat, SpanFlags, SpanIndex, StringTable, Thread};
    use crate::viewport::Viewport;

    fn three_span_profile() -> crate::model::Profile {
        let mut strings = StringTable::default();
        let a = strings.intern("A");
        let b = strings.intern("B");
        let c = strings.intern("C");
        crate::model::Profile {
            name: None,
            format: ProfileFormat::ChromeTrace,
            start_time_us: 0,
            end_time_us: 1000,
            threads: vec![Thread {
                id: ThreadId(1),
                name: "main".into(),
                sort_key: ("main".into(), 1),
                span_root_ids: vec![SpanIndex(0)],
                span_count: 3,
                max_depth: 1,
            }],
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
                    thread_id: ThreadId(1),
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
                    thread_id: ThreadId(1),
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
                    thread_id: ThreadId(1),
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
    fn matches_scenario_1_exactly() {
        let profile = three_span_profile();
        let config = ViewerConfig {
            row_height_px: 20.0,
            ..Default::default()
        };
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
        let commands = layout(&inputs, ThreadId(1));
        let rects: Vec<Rect> = commands
            .into_iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { rect, .. } => Some(rect),
                _ => None,
            })
            .collect();
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0], Rect::new(0.0, 0.0, 1000.0, 19.0));
        assert!(rects.contains(&Rect::new(100.0, 20.0, 300.0, 19.0)));
        assert!(rects.contains(&Rect::new(500.0, 20.0, 400.0, 19.0)));
    }

    #[test]
    fn unknown_thread_yields_empty_layout() {
        let profile = three_span_profile();
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
        assert!(layout(&inputs, ThreadId(999)).is_empty());
    }
}
