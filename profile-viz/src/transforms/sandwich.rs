//! Sandwich view: caller flame above a pinned root frame `F`, callee flame
//! below. Both halves merge occurrences of the same span name the way a
//! flame graph merges stacks, rather than drawing one row per occurrence.

use std::collections::HashMap;

use crate::error::ViewError;
use crate::geometry::Rect;
use crate::model::{FrameId, Profile, SpanIndex, StringId};
use crate::protocol::RenderCommand;
use crate::theme::ThemeToken;

use super::{border_token_for, TransformInputs};

/// One merged node in a caller or callee tree: every occurrence with the
/// same name at the same distance from `F` is folded into one node.
struct CallNode {
    name: StringId,
    total_us: i64,
    children: Vec<CallNode>,
}

pub fn layout(
    inputs: &TransformInputs,
    selected: Option<FrameId>,
) -> Result<Vec<RenderCommand>, ViewError> {
    let selected = selected.ok_or(ViewError::SandwichRequiresSelection)?;
    let profile = inputs.profile;
    let root_span = profile.span(selected).ok_or(ViewError::SandwichRequiresSelection)?;

    let occurrences: Vec<SpanIndex> = profile
        .span_arena
        .iter()
        .enumerate()
        .filter(|(_, s)| s.name == root_span.name)
        .map(|(i, _)| SpanIndex(i))
        .collect();

    let total_us: i64 = occurrences.iter().map(|i| profile.span_by_index(*i).duration_us()).sum();
    let row_h = inputs.config.row_height_px;
    let ppu = if total_us > 0 {
        inputs.width_px as f64 / total_us as f64
    } else {
        0.0
    };

    let parents: Vec<SpanIndex> = occurrences
        .iter()
        .filter_map(|i| profile.span_by_index(*i).parent)
        .collect();
    let callers = merge_level(profile, parents, |p, idx| p.span_by_index(idx).parent.into_iter().collect());

    let callee_starts: Vec<SpanIndex> = occurrences
        .iter()
        .flat_map(|i| children_of(profile, *i))
        .collect();
    let callees = merge_level(profile, callee_starts, |p, idx| children_of(p, idx));

    let caller_rows = max_depth(&callers);

    let mut commands = Vec::new();
    layout_levels(&callers, 0.0, caller_rows, -1, row_h, ppu, profile, inputs, &mut commands);

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, caller_rows as f32 * row_h, inputs.width_px, row_h - 1.0).snapped_x(),
        fill_token: ThemeToken::FlameHot,
        border_token: border_token_for(inputs, root_span),
        label: Some(profile.name_of(root_span).to_string()),
        frame_id: Some(selected),
    });

    layout_levels(&callees, 0.0, caller_rows, 1, row_h, ppu, profile, inputs, &mut commands);

    Ok(commands)
}

/// Lays out one merged tree left-heavy (children sorted by duration
/// descending, x as cumulative sums). `direction` is +1 for the callee
/// flame (growing down from `f_row`) and -1 for the caller flame (growing
/// up); each recursive level moves one more row in that direction.
#[allow(clippy::too_many_arguments)]
fn layout_levels(
    nodes: &[CallNode],
    left: f32,
    f_row: i32,
    direction: i32,
    row_h: f32,
    ppu: f64,
    profile: &Profile,
    inputs: &TransformInputs,
    out: &mut Vec<RenderCommand>,
) {
    layout_level_at(nodes, left, f_row + direction, direction, row_h, ppu, profile, inputs, out)
}

#[allow(clippy::too_many_arguments)]
fn layout_level_at(
    nodes: &[CallNode],
    left: f32,
    row: i32,
    direction: i32,
    row_h: f32,
    ppu: f64,
    profile: &Profile,
    inputs: &TransformInputs,
    out: &mut Vec<RenderCommand>,
) {
    let mut cursor = left;
    for node in nodes {
        let width = (node.total_us as f64 * ppu) as f32;
        if width >= inputs.config.min_span_width_px {
            let rect = Rect::new(cursor, row as f32 * row_h, width, row_h - 1.0).snapped_x();
            let label = if width > inputs.config.label_min_width_px {
                Some(profile.strings.resolve(node.name).to_string())
            } else {
                None
            };
            out.push(RenderCommand::DrawRect {
                rect,
                fill_token: ThemeToken::FlameWarm,
                border_token: None,
                label,
                frame_id: None,
            });
            layout_level_at(&node.children, cursor, row + direction, direction, row_h, ppu, profile, inputs, out);
        }
        cursor += width;
    }
}

/// Merges `level` (a set of spans that are all `direction` away from `F`)
/// by name, then recurses one more step via `next`. `next` returns the
/// caller (0 or 1 span) or the callees (0..N spans) of a given span.
fn merge_level(
    profile: &Profile,
    level: Vec<SpanIndex>,
    next: impl Fn(&Profile, SpanIndex) -> Vec<SpanIndex> + Copy,
) -> Vec<CallNode> {
    let mut groups: HashMap<StringId, Vec<SpanIndex>> = HashMap::new();
    for idx in level {
        groups.entry(profile.span_by_index(idx).name).or_default().push(idx);
    }

    let mut nodes: Vec<CallNode> = groups
        .into_iter()
        .map(|(name, members)| {
            let total_us = members.iter().map(|i| profile.span_by_index(*i).duration_us()).sum();
            let next_level: Vec<SpanIndex> = members.iter().flat_map(|i| next(profile, *i)).collect();
            let children = if next_level.is_empty() {
                Vec::new()
            } else {
                merge_level(profile, next_level, next)
            };
            CallNode { name, total_us, children }
        })
        .collect();
    nodes.sort_by_key(|n| std::cmp::Reverse(n.total_us));
    nodes
}

fn children_of(profile: &Profile, idx: SpanIndex) -> Vec<SpanIndex> {
    let mut out = Vec::new();
    let mut next = profile.span_by_index(idx).first_child;
    while let Some(i) = next {
        out.push(i);
        next = profile.span_by_index(i).next_sibling;
    }
    out
}

fn max_depth(nodes: &[CallNode]) -> i32 {
    nodes.iter().map(|n| 1 + max_depth(&n.children)).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorMapper, ColorMode};
    use crate::config::ViewerConfig;
    use crate::model::{ProfileFormat, Span, SpanFlags, StringTable, Thread, ThreadId};
    use crate::viewport::Viewport;

    fn profile_b_has_one_caller_no_callees() -> Profile {
        let mut strings = StringTable::default();
        let a = strings.intern("A");
        let b = strings.intern("B");
        let c = strings.intern("C");
        Profile {
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
    fn sandwich_of_b_has_one_caller_and_no_callees() {
        let profile = profile_b_has_one_caller_no_callees();
        let config = ViewerConfig {
            row_height_px: 20.0,
            ..Default::default()
        };
        let mapper = ColorMapper::new(ColorMode::ByName);
        let inputs = TransformInputs {
            profile: &profile,
            viewport: Viewport::default(),
            width_px: 300.0,
            height_px: 100.0,
            config: &config,
            color_mapper: &mapper,
            selected: Some(FrameId(2)),
            search: None,
        };
        let commands = layout(&inputs, Some(FrameId(2))).unwrap();
        let rects: Vec<Rect> = commands
            .into_iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { rect, .. } => Some(rect),
                _ => None,
            })
            .collect();
        // F's row plus exactly one caller row (A); no callee rows.
        assert_eq!(rects.len(), 2);
    }

    #[test]
    fn no_selection_is_an_error() {
        let profile = profile_b_has_one_caller_no_callees();
        let config = ViewerConfig::default();
        let mapper = ColorMapper::new(ColorMode::ByName);
        let inputs = TransformInputs {
            profile: &profile,
            viewport: Viewport::default(),
            width_px: 300.0,
            height_px: 100.0,
            config: &config,
            color_mapper: &mapper,
            selected: None,
            search: None,
        };
        assert!(matches!(layout(&inputs, None), Err(ViewError::SandwichRequiresSelection)));
    }
}
