//! Semantic color tokens and the themes that resolve them to RGBA.
//!
//! Themes are data, not inheritance: a [`Theme`] is a total lookup table over
//! the closed [`ThemeToken`] enumeration, built once and indexed on every
//! frame. There is no dynamic color computation anywhere downstream of this
//! module.

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Renders as a CSS `rgba(...)` string, used by the SVG exporter.
    pub fn to_css(self) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            self.r,
            self.g,
            self.b,
            self.a as f32 / 255.0
        )
    }
}

/// Closed enumeration of every semantic color name the viewer draws with.
/// Adding a new token requires updating every [`Theme`] constructor, by
/// design: there is no "unknown token" fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ThemeToken {
    Background,
    Surface,
    Border,
    TextPrimary,
    TextSecondary,
    TextMuted,
    LaneBackground,
    LaneBorder,
    LaneHeaderBackground,
    LaneHeaderText,
    FlameHot,
    FlameWarm,
    FlameCold,
    FlameNeutral,
    SelectionHighlight,
    HoverHighlight,
    SearchHighlight,
    ToolbarBackground,
    ToolbarText,
    ToolbarTabActive,
    ToolbarTabHover,
    MinimapBackground,
    MinimapViewport,
    TableRowEven,
    TableRowOdd,
    TableHeaderBackground,
    TableBorder,
    BarFill,
    CounterFill,
    CounterLine,
    CounterText,
    MarkerLine,
    MarkerText,
    AsyncSpanFill,
    AsyncSpanBorder,
    FrameGood,
    FrameWarning,
    FrameDropped,
    FlowArrow,
    NetworkBar,
    NetworkTtfb,
}

impl ThemeToken {
    /// Every variant, in declaration order. Used to build a dense lookup
    /// table and by tests that assert a `Theme` resolves every token.
    pub const ALL: &'static [ThemeToken] = &[
        ThemeToken::Background,
        ThemeToken::Surface,
        ThemeToken::Border,
        ThemeToken::TextPrimary,
        ThemeToken::TextSecondary,
        ThemeToken::TextMuted,
        ThemeToken::LaneBackground,
        ThemeToken::LaneBorder,
        ThemeToken::LaneHeaderBackground,
        ThemeToken::LaneHeaderText,
        ThemeToken::FlameHot,
        ThemeToken::FlameWarm,
        ThemeToken::FlameCold,
        ThemeToken::FlameNeutral,
        ThemeToken::SelectionHighlight,
        ThemeToken::HoverHighlight,
        ThemeToken::SearchHighlight,
        ThemeToken::ToolbarBackground,
        ThemeToken::ToolbarText,
        ThemeToken::ToolbarTabActive,
        ThemeToken::ToolbarTabHover,
        ThemeToken::MinimapBackground,
        ThemeToken::MinimapViewport,
        ThemeToken::TableRowEven,
        ThemeToken::TableRowOdd,
        ThemeToken::TableHeaderBackground,
        ThemeToken::TableBorder,
        ThemeToken::BarFill,
        ThemeToken::CounterFill,
        ThemeToken::CounterLine,
        ThemeToken::CounterText,
        ThemeToken::MarkerLine,
        ThemeToken::MarkerText,
        ThemeToken::AsyncSpanFill,
        ThemeToken::AsyncSpanBorder,
        ThemeToken::FrameGood,
        ThemeToken::FrameWarning,
        ThemeToken::FrameDropped,
        ThemeToken::FlowArrow,
        ThemeToken::NetworkBar,
        ThemeToken::NetworkTtfb,
    ];

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|&t| t == self)
            .expect("ThemeToken::ALL must list every variant")
    }
}

/// A total mapping from [`ThemeToken`] to [`Rgba`].
#[derive(Debug, Clone)]
pub struct Theme {
    name: &'static str,
    colors: Vec<Rgba>,
}

impl Theme {
    fn from_table(name: &'static str, table: &[(ThemeToken, Rgba)]) -> Self {
        let mut colors = vec![Rgba::opaque(0, 0, 0); ThemeToken::ALL.len()];
        for &(token, rgba) in table {
            colors[token.index()] = rgba;
        }
        Self { name, colors }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolves a token to its color. Total: every token has an entry.
    pub fn resolve(&self, token: ThemeToken) -> Rgba {
        self.colors[token.index()]
    }

    pub fn dark() -> Self {
        use ThemeToken::*;
        Self::from_table(
            "dark",
            &[
                (Background, Rgba::opaque(0x12, 0x13, 0x16)),
                (Surface, Rgba::opaque(0x1b, 0x1d, 0x22)),
                (Border, Rgba::opaque(0x2c, 0x2f, 0x36)),
                (TextPrimary, Rgba::opaque(0xe8, 0xea, 0xed)),
                (TextSecondary, Rgba::opaque(0xa8, 0xac, 0xb5)),
                (TextMuted, Rgba::opaque(0x6b, 0x70, 0x7a)),
                (LaneBackground, Rgba::opaque(0x17, 0x18, 0x1c)),
                (LaneBorder, Rgba::opaque(0x2c, 0x2f, 0x36)),
                (LaneHeaderBackground, Rgba::opaque(0x20, 0x22, 0x27)),
                (LaneHeaderText, Rgba::opaque(0xe8, 0xea, 0xed)),
                (FlameHot, Rgba::opaque(0xe0, 0x6c, 0x53)),
                (FlameWarm, Rgba::opaque(0xe0, 0xa5, 0x53)),
                (FlameCold, Rgba::opaque(0x53, 0x8a, 0xe0)),
                (FlameNeutral, Rgba::opaque(0x4a, 0x4e, 0x57)),
                (SelectionHighlight, Rgba::new(0x4f, 0x8c, 0xff, 110)),
                (HoverHighlight, Rgba::new(0xff, 0xff, 0xff, 40)),
                (SearchHighlight, Rgba::new(0xff, 0xd7, 0x33, 160)),
                (ToolbarBackground, Rgba::opaque(0x1b, 0x1d, 0x22)),
                (ToolbarText, Rgba::opaque(0xe8, 0xea, 0xed)),
                (ToolbarTabActive, Rgba::opaque(0x2c, 0x2f, 0x36)),
                (ToolbarTabHover, Rgba::opaque(0x24, 0x26, 0x2c)),
                (MinimapBackground, Rgba::opaque(0x0d, 0x0e, 0x10)),
                (MinimapViewport, Rgba::new(0x4f, 0x8c, 0xff, 70)),
                (TableRowEven, Rgba::opaque(0x17, 0x18, 0x1c)),
                (TableRowOdd, Rgba::opaque(0x1b, 0x1d, 0x22)),
                (TableHeaderBackground, Rgba::opaque(0x20, 0x22, 0x27)),
                (TableBorder, Rgba::opaque(0x2c, 0x2f, 0x36)),
                (BarFill, Rgba::opaque(0x53, 0x8a, 0xe0)),
                (CounterFill, Rgba::new(0x53, 0xe0, 0xa5, 90)),
                (CounterLine, Rgba::opaque(0x53, 0xe0, 0xa5)),
                (CounterText, Rgba::opaque(0xa8, 0xac, 0xb5)),
                (MarkerLine, Rgba::opaque(0xe0, 0xa5, 0x53)),
                (MarkerText, Rgba::opaque(0xe8, 0xea, 0xed)),
                (AsyncSpanFill, Rgba::opaque(0x8a, 0x53, 0xe0)),
                (AsyncSpanBorder, Rgba::opaque(0xb0, 0x8a, 0xf0)),
                (FrameGood, Rgba::opaque(0x53, 0xe0, 0x7a)),
                (FrameWarning, Rgba::opaque(0xe0, 0xc2, 0x53)),
                (FrameDropped, Rgba::opaque(0xe0, 0x53, 0x53)),
                (FlowArrow, Rgba::opaque(0xe8, 0xea, 0xed)),
                (NetworkBar, Rgba::opaque(0x53, 0x8a, 0xe0)),
                (NetworkTtfb, Rgba::opaque(0x4a, 0x4e, 0x57)),
            ],
        )
    }

    pub fn light() -> Self {
        use ThemeToken::*;
        Self::from_table(
            "light",
            &[
                (Background, Rgba::opaque(0xfa, 0xfa, 0xfb)),
                (Surface, Rgba::opaque(0xff, 0xff, 0xff)),
                (Border, Rgba::opaque(0xdd, 0xdf, 0xe2)),
                (TextPrimary, Rgba::opaque(0x17, 0x18, 0x1c)),
                (TextSecondary, Rgba::opaque(0x4a, 0x4e, 0x57)),
                (TextMuted, Rgba::opaque(0x8a, 0x8e, 0x97)),
                (LaneBackground, Rgba::opaque(0xff, 0xff, 0xff)),
                (LaneBorder, Rgba::opaque(0xdd, 0xdf, 0xe2)),
                (LaneHeaderBackground, Rgba::opaque(0xf0, 0xf1, 0xf3)),
                (LaneHeaderText, Rgba::opaque(0x17, 0x18, 0x1c)),
                (FlameHot, Rgba::opaque(0xd1, 0x4f, 0x36)),
                (FlameWarm, Rgba::opaque(0xd1, 0x8c, 0x36)),
                (FlameCold, Rgba::opaque(0x36, 0x70, 0xd1)),
                (FlameNeutral, Rgba::opaque(0xc6, 0xc9, 0xce)),
                (SelectionHighlight, Rgba::new(0x2f, 0x6c, 0xe0, 110)),
                (HoverHighlight, Rgba::new(0x00, 0x00, 0x00, 30)),
                (SearchHighlight, Rgba::new(0xe0, 0xad, 0x00, 160)),
                (ToolbarBackground, Rgba::opaque(0xff, 0xff, 0xff)),
                (ToolbarText, Rgba::opaque(0x17, 0x18, 0x1c)),
                (ToolbarTabActive, Rgba::opaque(0xf0, 0xf1, 0xf3)),
                (ToolbarTabHover, Rgba::opaque(0xf6, 0xf7, 0xf8)),
                (MinimapBackground, Rgba::opaque(0xf0, 0xf1, 0xf3)),
                (MinimapViewport, Rgba::new(0x2f, 0x6c, 0xe0, 70)),
                (TableRowEven, Rgba::opaque(0xff, 0xff, 0xff)),
                (TableRowOdd, Rgba::opaque(0xf6, 0xf7, 0xf8)),
                (TableHeaderBackground, Rgba::opaque(0xf0, 0xf1, 0xf3)),
                (TableBorder, Rgba::opaque(0xdd, 0xdf, 0xe2)),
                (BarFill, Rgba::opaque(0x36, 0x70, 0xd1)),
                (CounterFill, Rgba::new(0x36, 0xd1, 0x8c, 90)),
                (CounterLine, Rgba::opaque(0x36, 0xd1, 0x8c)),
                (CounterText, Rgba::opaque(0x4a, 0x4e, 0x57)),
                (MarkerLine, Rgba::opaque(0xd1, 0x8c, 0x36)),
                (MarkerText, Rgba::opaque(0x17, 0x18, 0x1c)),
                (AsyncSpanFill, Rgba::opaque(0x8c, 0x36, 0xd1)),
                (AsyncSpanBorder, Rgba::opaque(0x6a, 0x1f, 0xa8)),
                (FrameGood, Rgba::opaque(0x2f, 0xa8, 0x53)),
                (FrameWarning, Rgba::opaque(0xc9, 0x9a, 0x1f)),
                (FrameDropped, Rgba::opaque(0xc9, 0x3a, 0x3a)),
                (FlowArrow, Rgba::opaque(0x17, 0x18, 0x1c)),
                (NetworkBar, Rgba::opaque(0x36, 0x70, 0xd1)),
                (NetworkTtfb, Rgba::opaque(0xc6, 0xc9, 0xce)),
            ],
        )
    }
}
