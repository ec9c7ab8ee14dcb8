//! Frame track: each vsync/display frame emits a fixed-height rect
//! tokenized by its classification (good/warning/dropped).

use crate::geometry::Rect;
use crate::model::{FrameClassification, RenderFrame};
use crate::protocol::RenderCommand;
use crate::theme::ThemeToken;

use super::{intersects_window, pixels_per_us, visible_window, TransformInputs};

pub fn layout(inputs: &TransformInputs, frames: &[RenderFrame]) -> Vec<RenderCommand> {
    let (t0, t1) = visible_window(inputs.profile, inputs.viewport);
    let ppu = pixels_per_us(inputs.width_px, t0, t1);

    let mut commands = Vec::new();
    for frame in frames {
        if !intersects_window(frame.start_us, frame.end_us, t0, t1) {
            continue;
        }
        let x0 = (((frame.start_us - t0) as f64) * ppu) as f32;
        let x1 = (((frame.end_us - t0) as f64) * ppu) as f32;
        let width = (x1 - x0).max(1.0);
        commands.push(RenderCommand::rect(
            Rect::new(x0, 0.0, width, inputs.height_px).snapped_x(),
            classification_token(frame.classification),
        ));
    }
    commands
}

fn classification_token(classification: FrameClassification) -> ThemeToken {
    match classification {
        FrameClassification::Good => ThemeToken::FrameGood,
        FrameClassification::Warning => ThemeToken::FrameWarning,
        FrameClassification::Dropped => ThemeToken::FrameDropped,
    }
}
