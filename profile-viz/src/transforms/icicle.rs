//! Icicle view: identical X/width math to time-order, but Y inverted so
//! depth is counted downward from the root instead of upward from leaves.

use crate::geometry::Rect;
use crate::model::{Span, ThreadId};
use crate::protocol::RenderCommand;

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
    // Root at the top of the lane; each additional depth grows downward.
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
