//! Ranked view: one row per unique `(name, category)`, sorted by an
//! aggregate time metric. Not time-windowed: unlike the other views it
//! summarizes the whole profile, so the viewport only controls scroll.

use crate::model::{Profile, StringId};
use crate::protocol::RenderCommand;
use crate::theme::ThemeToken;
use crate::geometry::Rect;

use super::TransformInputs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    SelfTime,
    TotalTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Descending,
    Ascending,
}

struct Row {
    name: StringId,
    category: Option<StringId>,
    self_us: i64,
    total_us: i64,
}

pub fn layout(
    inputs: &TransformInputs,
    metric: RankMetric,
    direction: SortDirection,
) -> Vec<RenderCommand> {
    let profile = inputs.profile;
    let mut rows = aggregate(profile);

    let metric_of = |r: &Row| match metric {
        RankMetric::SelfTime => r.self_us,
        RankMetric::TotalTime => r.total_us,
    };
    rows.sort_by(|a, b| {
        let ord = metric_of(b).cmp(&metric_of(a));
        let ord = if direction == SortDirection::Ascending { ord.reverse() } else { ord };
        ord.then_with(|| profile.strings.resolve(a.name).cmp(profile.strings.resolve(b.name)))
    });

    let max_metric = rows.iter().map(metric_of).max().unwrap_or(1).max(1) as f64;
    let row_h = inputs.config.row_height_px;
    let scroll_rows = (inputs.viewport.start * rows.len() as f64).floor() as usize;

    let mut commands = Vec::new();
    for (visible_row, row) in rows.iter().enumerate().skip(scroll_rows) {
        let y = (visible_row - scroll_rows) as f32 * row_h;
        if y > inputs.height_px {
            break;
        }
        let value = metric_of(row) as f64;
        let width = (value / max_metric * inputs.width_px as f64) as f32;
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(0.0, y, width, row_h - 1.0).snapped_x(),
            fill_token: ThemeToken::BarFill,
            border_token: None,
            label: Some(profile.strings.resolve(row.name).to_string()),
            frame_id: None,
        });
    }
    commands
}

fn aggregate(profile: &Profile) -> Vec<Row> {
    let mut rows: Vec<Row> = Vec::new();
    for span in &profile.span_arena {
        if let Some(row) = rows.iter_mut().find(|r: &&mut Row| r.name == span.name && r.category == span.category) {
            row.self_us += span.self_time_us;
            row.total_us += span.duration_us();
        } else {
            rows.push(Row {
                name: span.name,
                category: span.category,
                self_us: span.self_time_us,
                total_us: span.duration_us(),
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorMapper, ColorMode};
    use crate::config::ViewerConfig;
    use crate::model::{FrameId, ProfileFormat, SpanFlags, SpanIndex, StringTable, Thread, ThreadId};
    use crate::viewport::Viewport;

    fn profile() -> Profile {
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
    fn sorted_descending_by_self_time_puts_c_first() {
        let profile = profile();
        let config = ViewerConfig {
            row_height_px: 20.0,
            ..Default::default()
        };
        let mapper = ColorMapper::new(ColorMode::ByName);
        let inputs = TransformInputs {
            profile: &profile,
            viewport: Viewport::default(),
            width_px: 300.0,
            height_px: 200.0,
            config: &config,
            color_mapper: &mapper,
            selected: None,
            search: None,
        };
        let commands = layout(&inputs, RankMetric::SelfTime, SortDirection::Descending);
        let labels: Vec<String> = commands
            .into_iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { label, .. } => label,
                _ => None,
            })
            .collect();
        assert_eq!(labels[0], "C");
    }
}
