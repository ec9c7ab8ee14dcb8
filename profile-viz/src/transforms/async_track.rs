//! Async track: async spans packed into 1..N rows by greedy stacking (place
//! in the lowest row whose last occupant ends at or before the new span's
//! start), then drawn at literal timestamps like time-order.

use crate::geometry::Rect;
use crate::model::AsyncSpan;
use crate::protocol::RenderCommand;
use crate::theme::ThemeToken;

use super::{intersects_window, pixels_per_us, visible_window, TransformInputs};

pub fn layout(inputs: &TransformInputs, spans: &[AsyncSpan]) -> Vec<RenderCommand> {
    let (t0, t1) = visible_window(inputs.profile, inputs.viewport);
    let ppu = pixels_per_us(inputs.width_px, t0, t1);
    let row_h = inputs.config.row_height_px;

    let mut ordered: Vec<&AsyncSpan> = spans.iter().collect();
    ordered.sort_by_key(|s| s.start_us);

    let rows = stack_rows(&ordered);

    let mut commands = Vec::new();
    for (span, row) in ordered.iter().zip(rows) {
        if !intersects_window(span.start_us, span.end_us, t0, t1) {
            continue;
        }
        let x0 = (((span.start_us - t0) as f64) * ppu) as f32;
        let x1 = (((span.end_us - t0) as f64) * ppu) as f32;
        let width = x1 - x0;
        if width < inputs.config.min_span_width_px {
            continue;
        }
        let label = if width > inputs.config.label_min_width_px {
            Some(span.name.clone())
        } else {
            None
        };
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x0, row as f32 * row_h, width, row_h - 1.0).snapped_x(),
            fill_token: ThemeToken::AsyncSpanFill,
            border_token: Some(ThemeToken::AsyncSpanBorder),
            label,
            frame_id: None,
        });
    }
    commands
}

/// Greedy interval-graph row assignment. `ordered` must already be sorted
/// by `start_us`. Returns the row index for each span in the same order.
fn stack_rows(ordered: &[&AsyncSpan]) -> Vec<usize> {
    let mut row_ends: Vec<i64> = Vec::new();
    let mut rows = Vec::with_capacity(ordered.len());
    for span in ordered {
        let row = row_ends
            .iter()
            .position(|&end| end <= span.start_us)
            .unwrap_or(row_ends.len());
        if row == row_ends.len() {
            row_ends.push(span.end_us);
        } else {
            row_ends[row] = span.end_us;
        }
        rows.push(row);
    }
    rows
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
    fn overlapping_spans_land_in_different_rows() {
        let profile = profile();
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
        let spans = vec![
            AsyncSpan { id: 1, name: "fetch-a".into(), start_us: 0, end_us: 500, origin_thread: None, target_thread: None },
            AsyncSpan { id: 2, name: "fetch-b".into(), start_us: 100, end_us: 300, origin_thread: None, target_thread: None },
            AsyncSpan { id: 3, name: "fetch-c".into(), start_us: 600, end_us: 900, origin_thread: None, target_thread: None },
        ];
        let commands = layout(&inputs, &spans);
        let ys: Vec<f32> = commands
            .into_iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { rect, .. } => Some(rect.y),
                _ => None,
            })
            .collect();
        assert_eq!(ys.len(), 3);
        assert_ne!(ys[0], ys[1]);
        // `fetch-c` starts after `fetch-a` ends, so it reuses row 0.
        assert_eq!(ys[0], ys[2]);
    }
}
