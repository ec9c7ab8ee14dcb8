//! The abstract sink render commands are handed to. A `Renderer` is the one
//! seam between this crate and pixels (or SVG, or a test harness); the core
//! never depends on anything concrete on the other side of it.

use crate::protocol::RenderCommand;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("renderer backend failed: {0}")]
    Backend(String),
}

/// Implemented by adapters (GPU, fallback raster, SVG). Scissor semantics:
/// a `SetClip`/`ClearClip` pair must nest like a stack; `stacks_balanced`
/// in `crate::protocol` can assert this for a command list before it's
/// handed to a renderer.
pub trait Renderer {
    fn submit(&mut self, commands: &[RenderCommand]) -> Result<(), RendererError>;
}

/// A reference `Renderer` that discards everything. Useful for exercising
/// the façade/viewer end to end without a real backend.
#[derive(Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn submit(&mut self, _commands: &[RenderCommand]) -> Result<(), RendererError> {
        Ok(())
    }
}

/// A reference `Renderer` that records command counts by variant, used by
/// tests to assert ordering/volume without asserting on pixels.
#[derive(Default)]
pub struct CountingRenderer {
    pub rects: usize,
    pub texts: usize,
    pub lines: usize,
    pub groups_begun: usize,
}

impl Renderer for CountingRenderer {
    fn submit(&mut self, commands: &[RenderCommand]) -> Result<(), RendererError> {
        for cmd in commands {
            match cmd {
                RenderCommand::DrawRect { .. } => self.rects += 1,
                RenderCommand::DrawText { .. } => self.texts += 1,
                RenderCommand::DrawLine { .. } => self.lines += 1,
                RenderCommand::BeginGroup { .. } => self.groups_begun += 1,
                _ => {}
            }
        }
        Ok(())
    }
}
