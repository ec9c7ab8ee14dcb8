//! Time axis: picks a "nice" tick interval (1/2/5·10^k microseconds) that
//! yields roughly 6-10 labeled ticks across the visible window, and emits a
//! gridline + label per tick.

use crate::geometry::Point;
use crate::protocol::{RenderCommand, TextAlign};
use crate::theme::ThemeToken;

use super::{visible_window, TransformInputs};

const TARGET_TICKS_MIN: u32 = 6;
const TARGET_TICKS_MAX: u32 = 10;

pub fn layout(inputs: &TransformInputs, gridlines: bool) -> Vec<RenderCommand> {
    let (t0, t1) = visible_window(inputs.profile, inputs.viewport);
    let span_us = (t1 - t0).max(1);
    let interval = nice_interval_us(span_us);

    let mut commands = Vec::new();
    let ppu = inputs.width_px as f64 / span_us as f64;

    let first_tick = (t0 as f64 / interval as f64).ceil() as i64 * interval;
    let mut tick = first_tick;
    while tick <= t1 {
        let x = (((tick - t0) as f64) * ppu) as f32;
        if gridlines {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(x, 0.0),
                to: Point::new(x, inputs.height_px),
                token: ThemeToken::Border,
                width: 1.0,
            });
        }
        commands.push(RenderCommand::DrawText {
            pos: Point::new(x + 2.0, 12.0),
            text: format_duration(tick - t0),
            token: ThemeToken::TextSecondary,
            font_size: 10.0,
            align: TextAlign::Left,
        });
        tick += interval;
    }

    commands
}

/// Picks the smallest `1 * 10^k`, `2 * 10^k`, or `5 * 10^k` microsecond
/// interval such that the visible span divided by it falls within
/// `[TARGET_TICKS_MIN, TARGET_TICKS_MAX]`, preferring fewer, rounder ticks.
fn nice_interval_us(span_us: i64) -> i64 {
    let rough = span_us as f64 / TARGET_TICKS_MAX as f64;
    let magnitude = 10f64.powi(rough.log10().floor() as i32);
    for multiple in [1.0, 2.0, 5.0, 10.0] {
        let candidate = magnitude * multiple;
        let tick_count = span_us as f64 / candidate;
        if tick_count <= TARGET_TICKS_MAX as f64 && tick_count >= TARGET_TICKS_MIN as f64 / 2.0 {
            return candidate.round().max(1.0) as i64;
        }
    }
    magnitude.round().max(1.0) as i64
}

/// Formats a microsecond duration using the coarsest unit that keeps at
/// least one significant digit: `ns`, `µs`, `ms`, or `s`.
fn format_duration(us: i64) -> String {
    if us == 0 {
        return "0".to_string();
    }
    let abs = us.unsigned_abs();
    if abs < 1 {
        format!("{}ns", us * 1000)
    } else if abs < 1_000 {
        format!("{}µs", us)
    } else if abs < 1_000_000 {
        format!("{:.2}ms", us as f64 / 1_000.0)
    } else {
        format!("{:.2}s", us as f64 / 1_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorMapper, ColorMode};
    use crate::config::ViewerConfig;
    use crate::model::{Profile, ProfileFormat, StringTable};
    use crate::viewport::Viewport;

    fn profile(duration_us: i64) -> Profile {
        Profile {
            name: None,
            format: ProfileFormat::ChromeTrace,
            start_time_us: 0,
            end_time_us: duration_us,
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
    fn tick_count_stays_within_target_band() {
        let profile = profile(1_000_000);
        let config = ViewerConfig::default();
        let mapper = ColorMapper::new(ColorMode::ByName);
        let inputs = TransformInputs {
            profile: &profile,
            viewport: Viewport::default(),
            width_px: 1000.0,
            height_px: 30.0,
            config: &config,
            color_mapper: &mapper,
            selected: None,
            search: None,
        };
        let commands = layout(&inputs, false);
        let tick_count = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawText { .. }))
            .count();
        assert!((3..=12).contains(&tick_count), "got {tick_count} ticks");
    }

    #[test]
    fn formats_microseconds_and_milliseconds() {
        assert_eq!(format_duration(500), "500µs");
        assert_eq!(format_duration(2_500), "2.50ms");
    }
}
