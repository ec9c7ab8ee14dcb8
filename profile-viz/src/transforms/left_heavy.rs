//! Left-heavy view: within each parent, children are sorted by total
//! duration descending, then packed left-to-right as cumulative sums. X
//! positions no longer correspond to wall-clock time; depth and color
//! contract are identical to time-order.

use crate::geometry::Rect;
use crate::model::{SpanIndex, ThreadId};
use crate::protocol::RenderCommand;

use super::{border_token_for, fill_token_for, TransformInputs};

pub fn layout(inputs: &TransformInputs, thread_id: ThreadId) -> Vec<RenderCommand> {
    let profile = inputs.profile;
    let Some(thread) = profile.threads.iter().find(|t| t.id == thread_id) else {
        return Vec::new();
    };

    let row_h = inputs.config.row_height_px;
    let total_us: i64 = thread
        .span_root_ids
        .iter()
        .map(|idx| {
            let span = profile.span_by_index(*idx);
            span.end_us - span.start_us
        })
        .sum();
    let total_us = total_us.max(1) as f64;
    let ppu = inputs.width_px as f64 / total_us;

    let mut commands = Vec::new();
    // Each stack frame carries the left edge (in px) its subtree starts at.
    let mut roots: Vec<SpanIndex> = thread.span_root_ids.clone();
    sort_by_duration_desc(profile, &mut roots);

    let mut left = 0.0;
    let mut placed_roots = Vec::with_capacity(roots.len());
    for idx in roots {
        placed_roots.push((idx, left));
        left += duration_us(profile, idx) as f64 * ppu;
    }
    let mut dfs: Vec<(SpanIndex, f64)> = placed_roots.into_iter().rev().collect();

    while let Some((idx, left_px)) = dfs.pop() {
        let span = profile.span_by_index(idx);
        let width = (duration_us(profile, idx) as f64 * ppu) as f32;
        if width >= inputs.config.min_span_width_px {
            let rect = Rect::new(left_px as f32, span.depth as f32 * row_h, width, row_h - 1.0)
                .snapped_x();
            let label = if width > inputs.config.label_min_width_px {
                Some(profile.name_of(span).to_string())
            } else {
                None
            };
            commands.push(RenderCommand::DrawRect {
                rect,
                fill_token: fill_token_for(inputs, span),
                border_token: border_token_for(inputs, span),
                label,
                frame_id: Some(span.frame_id),
            });
        }

        let mut kids = children_of(profile, idx);
        sort_by_duration_desc(profile, &mut kids);
        let mut child_left = left_px;
        let mut placed = Vec::with_capacity(kids.len());
        for kid in kids {
            placed.push((kid, child_left));
            child_left += duration_us(profile, kid) as f64 * ppu;
        }
        dfs.extend(placed.into_iter().rev());
    }

    commands
}

fn duration_us(profile: &crate::model::Profile, idx: SpanIndex) -> i64 {
    let span = profile.span_by_index(idx);
    span.end_us - span.start_us
}

fn children_of(profile: &crate::model::Profile, idx: SpanIndex) -> Vec<SpanIndex> {
    let mut out = Vec::new();
    let mut next = profile.span_by_index(idx).first_child;
    while let Some(i) = next {
        out.push(i);
        next = profile.span_by_index(i).next_sibling;
    }
    out
}

fn sort_by_duration_desc(profile: &crate::model::Profile, ids: &mut [SpanIndex]) {
    ids.sort_by_key(|idx| std::cmp::Reverse(duration_us(profile, *idx)));
}
