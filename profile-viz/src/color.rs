//! Span → theme-token selection. A closed mode set, each mode a pure
//! function of the span and its containing profile — no per-frame state.

use crate::model::{Profile, Span};
use crate::theme::ThemeToken;

/// The 6-token ramp `ByName`/`ByDepth` cycle through, giving consistent
/// per-symbol/per-depth hues across frames and across view transforms.
const RAMP: [ThemeToken; 6] = [
    ThemeToken::FlameHot,
    ThemeToken::FlameWarm,
    ThemeToken::FlameCold,
    ThemeToken::BarFill,
    ThemeToken::AsyncSpanFill,
    ThemeToken::FrameGood,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    ByName,
    ByDepth,
}

/// Category tokens override both modes when a span carries a category.
/// The mapping from category name to token is itself data, kept small and
/// explicit rather than hashed, since the category vocabulary is bounded and
/// semantically meaningful (unlike span names).
fn category_token(category: &str) -> Option<ThemeToken> {
    match category {
        "layout" | "paint" => Some(ThemeToken::FlameWarm),
        "script" | "js" => Some(ThemeToken::FlameHot),
        "gc" | "idle" => Some(ThemeToken::FlameCold),
        "network" => Some(ThemeToken::NetworkBar),
        _ => None,
    }
}

fn hash_name(name: &str) -> u64 {
    // FNV-1a: deterministic across runs/platforms, unlike `DefaultHasher`,
    // which matters here since the same name must map to the same ramp slot
    // in every frame and every exported SVG.
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in name.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

pub struct ColorMapper {
    mode: ColorMode,
}

impl ColorMapper {
    pub fn new(mode: ColorMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ColorMode) {
        self.mode = mode;
    }

    pub fn token_for(&self, profile: &Profile, span: &Span) -> ThemeToken {
        if let Some(category_id) = span.category {
            if let Some(token) = category_token(profile.strings.resolve(category_id)) {
                return token;
            }
        }
        match self.mode {
            ColorMode::ByName => {
                let name = profile.name_of(span);
                RAMP[(hash_name(name) % RAMP.len() as u64) as usize]
            }
            ColorMode::ByDepth => RAMP[span.depth as usize % RAMP.len()],
        }
    }
}
