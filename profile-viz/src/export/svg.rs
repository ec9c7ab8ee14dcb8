//! `RenderCommand` → standalone SVG. One `<defs>` section collects every
//! `clipPath` up front, followed by the rendered content groups, matching
//! spec.md §6's export shape. Text is emitted as plain `<text>` with
//! `text-anchor` carrying horizontal alignment; no glyph-metrics measurement
//! happens here, exactly as spec.md's open question on SVG text resolves —
//! that's left to whatever renders the SVG.

use std::fmt::Write as _;

use crate::geometry::{Point, Rect};
use crate::protocol::{RenderCommand, TextAlign};
use crate::theme::Theme;

pub fn render_svg(commands: &[RenderCommand], width: f32, height: f32, theme: &Theme) -> String {
    let mut defs = String::new();
    let mut body = String::new();
    let mut clip_seq = 0u32;

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                fill_token,
                border_token,
                label,
                ..
            } => {
                let fill = theme.resolve(*fill_token).to_css();
                let stroke = border_token
                    .map(|t| theme.resolve(t).to_css())
                    .unwrap_or_else(|| "none".to_string());
                let title = label
                    .as_ref()
                    .map(|l| format!("<title>{}</title>", escape(l)))
                    .unwrap_or_default();
                let _ = write!(
                    body,
                    "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{fill}\" stroke=\"{stroke}\">{title}</rect>",
                    rect.x, rect.y, rect.w, rect.h
                );
            }
            RenderCommand::DrawText {
                pos,
                text,
                token,
                font_size,
                align,
            } => {
                let fill = theme.resolve(*token).to_css();
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                let _ = write!(
                    body,
                    "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{:.2}\" fill=\"{fill}\" text-anchor=\"{anchor}\">{}</text>",
                    pos.x,
                    pos.y,
                    font_size,
                    escape(text)
                );
            }
            RenderCommand::DrawLine { from, to, token, width } => {
                let stroke = theme.resolve(*token).to_css();
                let _ = write!(
                    body,
                    "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{stroke}\" stroke-width=\"{:.2}\"/>",
                    from.x, from.y, to.x, to.y, width
                );
            }
            RenderCommand::SetClip { rect } => {
                let id = format!("clip{clip_seq}");
                clip_seq += 1;
                let _ = write!(defs, "<clipPath id=\"{id}\">{}</clipPath>", rect_path(*rect));
                let _ = write!(body, "<g clip-path=\"url(#{id})\">");
            }
            RenderCommand::ClearClip => {
                body.push_str("</g>");
            }
            RenderCommand::PushTransform { translate, scale } => {
                let _ = write!(
                    body,
                    "<g transform=\"translate({:.2} {:.2}) scale({:.3} {:.3})\">",
                    translate.x, translate.y, scale.x, scale.y
                );
            }
            RenderCommand::PopTransform => {
                body.push_str("</g>");
            }
            RenderCommand::BeginGroup { id, label } => {
                let title = label
                    .as_ref()
                    .map(|l| format!("<title>{}</title>", escape(l)))
                    .unwrap_or_default();
                let _ = write!(body, "<g id=\"{}\">{title}", escape(id));
            }
            RenderCommand::EndGroup => {
                body.push_str("</g>");
            }
        }
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\"><defs>{defs}</defs>{body}</svg>"
    )
}

fn rect_path(rect: Rect) -> String {
    format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"/>",
        rect.x, rect.y, rect.w, rect.h
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{Theme, ThemeToken};

    #[test]
    fn wraps_content_in_a_sized_svg_document() {
        let commands = vec![RenderCommand::rect(Rect::new(0.0, 0.0, 10.0, 20.0), ThemeToken::BarFill)];
        let svg = render_svg(&commands, 800.0, 600.0, &Theme::dark());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"800\""));
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn clip_pairs_produce_one_defs_entry_and_a_wrapping_group() {
        let commands = vec![
            RenderCommand::SetClip {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            },
            RenderCommand::rect(Rect::new(1.0, 1.0, 2.0, 2.0), ThemeToken::BarFill),
            RenderCommand::ClearClip,
        ];
        let svg = render_svg(&commands, 100.0, 100.0, &Theme::light());
        assert!(svg.contains("<clipPath"));
        assert!(svg.contains("clip-path=\"url(#clip0)\""));
    }

    #[test]
    fn text_escapes_reserved_characters() {
        let commands = vec![RenderCommand::DrawText {
            pos: Point::ZERO,
            text: "a < b & c".into(),
            token: ThemeToken::TextPrimary,
            font_size: 12.0,
            align: TextAlign::Left,
        }];
        let svg = render_svg(&commands, 10.0, 10.0, &Theme::dark());
        assert!(svg.contains("a &lt; b &amp; c"));
    }
}
