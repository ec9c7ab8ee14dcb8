//! Minimap: a fixed-height density heatmap of the whole `[0,1]` timeline,
//! with the current viewport overlaid as a translucent, draggable window.

use crate::geometry::{Point, Rect};
use crate::model::Profile;
use crate::protocol::RenderCommand;
use crate::theme::ThemeToken;
use crate::viewport::Viewport;

use super::TransformInputs;

pub fn layout(inputs: &TransformInputs) -> Vec<RenderCommand> {
    let profile = inputs.profile;
    let width = inputs.width_px.max(1.0) as usize;
    let density = span_density(profile, width);
    let max_count = density.iter().copied().max().unwrap_or(0).max(1) as f64;

    let mut commands = Vec::new();
    commands.push(RenderCommand::rect(
        Rect::new(0.0, 0.0, inputs.width_px, inputs.height_px),
        ThemeToken::MinimapBackground,
    ));

    for (px, count) in density.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let opacity = ((*count as f64 + 1.0).ln() / (max_count + 1.0).ln()).clamp(0.0, 1.0);
        commands.push(RenderCommand::DrawLine {
            from: Point::new(px as f32, inputs.height_px),
            to: Point::new(px as f32, inputs.height_px * (1.0 - opacity as f32)),
            token: ThemeToken::BarFill,
            width: 1.0,
        });
    }

    let viewport_rect = Rect::new(
        (inputs.viewport.start * inputs.width_px as f64) as f32,
        0.0,
        (inputs.viewport.span() * inputs.width_px as f64) as f32,
        inputs.height_px,
    );
    commands.push(RenderCommand::rect(viewport_rect, ThemeToken::MinimapViewport));

    commands
}

/// Samples per-pixel span counts across `[0, 1]` of the profile's own
/// duration (not the current viewport — the minimap always shows the whole
/// timeline).
fn span_density(profile: &Profile, width_px: usize) -> Vec<u32> {
    let mut density = vec![0u32; width_px];
    let duration = profile.duration_us().max(1) as f64;
    for span in &profile.span_arena {
        let start_frac = (span.start_us - profile.start_time_us) as f64 / duration;
        let end_frac = (span.end_us - profile.start_time_us) as f64 / duration;
        let px0 = (start_frac * width_px as f64).floor().clamp(0.0, width_px as f64 - 1.0) as usize;
        let px1 = (end_frac * width_px as f64).ceil().clamp(0.0, width_px as f64) as usize;
        for px in px0..px1.max(px0 + 1).min(width_px) {
            density[px] += 1;
        }
    }
    density
}

/// Maps a drag-handle interaction at `drag_start_frac`/`drag_end_frac`
/// straight to a new viewport, per spec.md scenario 6.
pub fn viewport_from_drag(drag_start_frac: f64, drag_end_frac: f64) -> Viewport {
    let (start, end) = if drag_start_frac <= drag_end_frac {
        (drag_start_frac, drag_end_frac)
    } else {
        (drag_end_frac, drag_start_frac)
    };
    Viewport::new(start.clamp(0.0, 1.0), end.clamp(0.0, 1.0).max(start + 0.0001))
}
