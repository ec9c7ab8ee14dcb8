//! Counter track: samples in the visible window projected to pixel X, value
//! normalized to the counter's own observed min/max, drawn as a filled
//! polyline approximated with thin rects between adjacent samples.

use crate::geometry::{Point, Rect};
use crate::model::Counter;
use crate::protocol::RenderCommand;
use crate::theme::ThemeToken;

use super::{pixels_per_us, visible_window, TransformInputs};

pub fn layout(inputs: &TransformInputs, counter: &Counter) -> Vec<RenderCommand> {
    let (t0, t1) = visible_window(inputs.profile, inputs.viewport);
    let ppu = pixels_per_us(inputs.width_px, t0, t1);
    let (track_min, track_max) = track_range(counter);
    let value_range = (track_max - track_min).max(f64::EPSILON);

    let visible: Vec<_> = counter
        .samples
        .iter()
        .filter(|s| s.timestamp_us >= t0 && s.timestamp_us <= t1)
        .collect();

    let height_of = |value: f64| (((value - track_min) / value_range) * inputs.height_px as f64) as f32;

    let mut commands = Vec::new();
    for pair in visible.windows(2) {
        let [a, b] = [pair[0], pair[1]];
        let x0 = (((a.timestamp_us - t0) as f64) * ppu) as f32;
        let x1 = (((b.timestamp_us - t0) as f64) * ppu) as f32;
        let h = height_of(a.value);
        let width = (x1 - x0).max(1.0);
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x0, inputs.height_px - h, width, h).snapped_x(),
            fill_token: ThemeToken::CounterFill,
            border_token: None,
            label: None,
            frame_id: None,
        });
    }

    for sample in &visible {
        let x = (((sample.timestamp_us - t0) as f64) * ppu) as f32;
        let h = height_of(sample.value);
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, inputs.height_px),
            to: Point::new(x, inputs.height_px - h),
            token: ThemeToken::CounterLine,
            width: 1.0,
        });
    }

    commands
}

fn track_range(counter: &Counter) -> (f64, f64) {
    let min = counter.samples.iter().map(|s| s.value).fold(f64::INFINITY, f64::min);
    let max = counter.samples.iter().map(|s| s.value).fold(f64::NEG_INFINITY, f64::max);
    if min.is_finite() && max.is_finite() {
        (min, max)
    } else {
        (0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorMapper, ColorMode};
    use crate::config::ViewerConfig;
    use crate::model::{CounterSample, Profile, ProfileFormat, StringTable};
    use crate::viewport::Viewport;

    fn profile_and_counter() -> (Profile, Counter) {
        let profile = Profile {
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
        };
        let counter = Counter {
            name: "heap".to_string(),
            unit: Some("bytes".to_string()),
            samples: vec![
                CounterSample { timestamp_us: 0, value: 10.0 },
                CounterSample { timestamp_us: 500, value: 80.0 },
                CounterSample { timestamp_us: 900, value: 40.0 },
            ],
        };
        (profile, counter)
    }

    #[test]
    fn emits_one_rect_per_adjacent_sample_pair() {
        let (profile, counter) = profile_and_counter();
        let config = ViewerConfig::default();
        let mapper = ColorMapper::new(ColorMode::ByName);
        let inputs = TransformInputs {
            profile: &profile,
            viewport: Viewport::default(),
            width_px: 1000.0,
            height_px: 50.0,
            config: &config,
            color_mapper: &mapper,
            selected: None,
            search: None,
        };
        let commands = layout(&inputs, &counter);
        let rects = commands.iter().filter(|c| matches!(c, RenderCommand::DrawRect { .. })).count();
        assert_eq!(rects, 2);
    }
}
