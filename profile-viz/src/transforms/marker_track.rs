//! Marker track: each marker emits a vertical line plus a clipped label at
//! its timestamp.

use crate::geometry::{Point, Rect};
use crate::model::Marker;
use crate::protocol::{RenderCommand, TextAlign};
use crate::theme::ThemeToken;

use super::{intersects_window, pixels_per_us, visible_window, TransformInputs};

pub fn layout(inputs: &TransformInputs, markers: &[Marker]) -> Vec<RenderCommand> {
    let (t0, t1) = visible_window(inputs.profile, inputs.viewport);
    let ppu = pixels_per_us(inputs.width_px, t0, t1);

    let mut commands = Vec::new();
    for marker in markers {
        if !intersects_window(marker.timestamp_us, marker.timestamp_us, t0, t1) {
            continue;
        }
        let x = (((marker.timestamp_us - t0) as f64) * ppu) as f32;
        commands.push(RenderCommand::SetClip {
            rect: Rect::new(x, 0.0, inputs.width_px - x, inputs.height_px),
        });
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, 0.0),
            to: Point::new(x, inputs.height_px),
            token: ThemeToken::MarkerLine,
            width: 1.0,
        });
        commands.push(RenderCommand::DrawText {
            pos: Point::new(x + 2.0, inputs.height_px - 2.0),
            text: marker.name.clone(),
            token: ThemeToken::MarkerText,
            font_size: 10.0,
            align: TextAlign::Left,
        });
        commands.push(RenderCommand::ClearClip);
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorMapper, ColorMode};
    use crate::config::ViewerConfig;
    use crate::model::{Profile, ProfileFormat, StringTable};
    use crate::protocol::stacks_balanced;
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
    fn out_of_window_markers_are_skipped_and_stacks_stay_balanced() {
        let profile = profile();
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
        let markers = vec![
            Marker { timestamp_us: 500, name: "gc-start".into(), category: None },
            Marker { timestamp_us: 5000, name: "out-of-range".into(), category: None },
        ];
        let commands = layout(&inputs, &markers);
        assert!(stacks_balanced(&commands));
        assert_eq!(commands.iter().filter(|c| matches!(c, RenderCommand::DrawText { .. })).count(), 1);
    }
}
