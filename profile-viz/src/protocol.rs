//! The render-command protocol: the intermediate language between [`crate::transforms`]
//! and a [`crate::renderer::Renderer`] collaborator.
//!
//! Commands are a closed sum type so invalid sequences (e.g. a dangling
//! `SetClip` with no matching `ClearClip`) are representable only as a bug in
//! the producer, never as a distinct variant a consumer has to guard against.
//! Every variant is stateless: nothing here carries a handle back into GPU or
//! DOM resources, which is what keeps [`crate::transforms`] pure.

use crate::geometry::{Point, Rect};
use crate::model::FrameId;
use crate::theme::ThemeToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One instruction in the renderer-agnostic protocol. A full frame is
/// `Vec<RenderCommand>`, built fresh by a view transform and consumed once.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    DrawRect {
        rect: Rect,
        fill_token: ThemeToken,
        border_token: Option<ThemeToken>,
        label: Option<String>,
        frame_id: Option<FrameId>,
    },
    DrawText {
        pos: Point,
        text: String,
        token: ThemeToken,
        font_size: f32,
        align: TextAlign,
    },
    DrawLine {
        from: Point,
        to: Point,
        token: ThemeToken,
        width: f32,
    },
    SetClip {
        rect: Rect,
    },
    ClearClip,
    PushTransform {
        translate: Point,
        scale: Point,
    },
    PopTransform,
    BeginGroup {
        id: String,
        label: Option<String>,
    },
    EndGroup,
}

impl RenderCommand {
    /// Convenience constructor used throughout `transforms` for the common
    /// case: a plain filled rect with neither a border nor a hit-test id.
    pub fn rect(rect: Rect, fill_token: ThemeToken) -> Self {
        RenderCommand::DrawRect {
            rect,
            fill_token,
            border_token: None,
            label: None,
            frame_id: None,
        }
    }
}

/// Validates LIFO balance of the scissor and transform stacks within a
/// single command list. Transforms are pure, so this should always hold;
/// kept as a cheap assertion usable from tests and from `debug_assert!`
/// call sites in transforms that build nested clips.
pub fn stacks_balanced(commands: &[RenderCommand]) -> bool {
    let mut clip_depth = 0i32;
    let mut transform_depth = 0i32;
    for cmd in commands {
        match cmd {
            RenderCommand::SetClip { .. } => clip_depth += 1,
            RenderCommand::ClearClip => clip_depth -= 1,
            RenderCommand::PushTransform { .. } => transform_depth += 1,
            RenderCommand::PopTransform => transform_depth -= 1,
            _ => {}
        }
        if clip_depth < 0 || transform_depth < 0 {
            return false;
        }
    }
    clip_depth == 0 && transform_depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_stacks_pass() {
        let cmds = vec![
            RenderCommand::SetClip {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            },
            RenderCommand::PushTransform {
                translate: Point::ZERO,
                scale: Point::new(1.0, 1.0),
            },
            RenderCommand::PopTransform,
            RenderCommand::ClearClip,
        ];
        assert!(stacks_balanced(&cmds));
    }

    #[test]
    fn unbalanced_stack_fails() {
        let cmds = vec![RenderCommand::SetClip {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        }];
        assert!(!stacks_balanced(&cmds));
    }
}
