//! One parser per supported capture format, sharing the tree builder in
//! [`builder`]. [`detect`] sniffs the format from the raw bytes; [`parse`]
//! dispatches to the matching module and validates the result before
//! returning it.

pub mod builder;
pub mod chrome;
pub mod collapsed;
pub mod firefox;
pub mod perf;
pub mod pix;
pub mod pprof;
pub mod react_devtools;
pub mod speedscope;
pub mod tracy;
pub mod v8;

use crate::error::ParseError;
use crate::model::{self, Profile, ProfileFormat, Span, SpanIndex};

/// What a format's parser does and does not reconstruct. Resolves spec.md
/// §9's open question on PIX/Tracy coverage: both parsers implement a
/// conservative common subset, and callers can check which parts of a
/// capture they actually got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatCapabilities {
    pub spans: bool,
    pub counters: bool,
    pub markers: bool,
    pub async_spans: bool,
    pub frames: bool,
    pub flow_edges: bool,
}

impl FormatCapabilities {
    pub const FULL: FormatCapabilities = FormatCapabilities {
        spans: true,
        counters: true,
        markers: true,
        async_spans: true,
        frames: true,
        flow_edges: true,
    };

    pub const SPANS_ONLY: FormatCapabilities = FormatCapabilities {
        spans: true,
        ..FormatCapabilities::NONE
    };

    pub const NONE: FormatCapabilities = FormatCapabilities {
        spans: false,
        counters: false,
        markers: false,
        async_spans: false,
        frames: false,
        flow_edges: false,
    };
}

/// Implemented once per supported capture format.
pub trait Parser {
    fn format(&self) -> ProfileFormat;
    fn capabilities(&self) -> FormatCapabilities;
    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError>;
}

/// Content-sniffs `bytes` to a format, preferring structural checks (magic
/// bytes, top-level JSON shape) over extension-less heuristics, falling
/// back to line-oriented text heuristics for perf script and collapsed
/// stacks, which have no distinguishing header.
pub fn detect(bytes: &[u8]) -> Option<ProfileFormat> {
    if pprof::looks_like_pprof(bytes) {
        return Some(ProfileFormat::Pprof);
    }
    if tracy::looks_like_tracy(bytes) {
        return Some(ProfileFormat::Tracy);
    }
    if pix::looks_like_pix(bytes) {
        return Some(ProfileFormat::Pix);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        let trimmed = text.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
                if speedscope::looks_like_speedscope(&value) {
                    return Some(ProfileFormat::Speedscope);
                }
                if v8::looks_like_v8(&value) {
                    return Some(ProfileFormat::V8CpuProfile);
                }
                if firefox::looks_like_firefox(&value) {
                    return Some(ProfileFormat::FirefoxGecko);
                }
                if react_devtools::looks_like_react_devtools(&value) {
                    return Some(ProfileFormat::ReactDevTools);
                }
                if chrome::looks_like_chrome(&value) {
                    return Some(ProfileFormat::ChromeTrace);
                }
            }
        }
        if collapsed::looks_like_collapsed(trimmed) {
            return Some(ProfileFormat::CollapsedStacks);
        }
        if perf::looks_like_perf_script(trimmed) {
            return Some(ProfileFormat::PerfScript);
        }
    }
    None
}

/// Detects and parses `bytes` in one call, then validates the result (a
/// parser bug that produces a malformed arena is a
/// [`ParseError::TreeConstructionFailed`], not a silent corrupt `Profile`).
pub fn parse(bytes: &[u8]) -> Result<Profile, ParseError> {
    let format = detect(bytes).ok_or(ParseError::InvalidFormat)?;
    let profile = match format {
        ProfileFormat::ChromeTrace => chrome::ChromeParser.parse(bytes)?,
        ProfileFormat::FirefoxGecko => firefox::FirefoxParser.parse(bytes)?,
        ProfileFormat::Speedscope => speedscope::SpeedscopeParser.parse(bytes)?,
        ProfileFormat::V8CpuProfile => v8::V8Parser.parse(bytes)?,
        ProfileFormat::Pprof => pprof::PprofParser.parse(bytes)?,
        ProfileFormat::Pix => pix::PixParser.parse(bytes)?,
        ProfileFormat::Tracy => tracy::TracyParser.parse(bytes)?,
        ProfileFormat::PerfScript => perf::PerfParser.parse(bytes)?,
        ProfileFormat::CollapsedStacks => collapsed::CollapsedParser.parse(bytes)?,
        ProfileFormat::ReactDevTools => react_devtools::ReactDevToolsParser.parse(bytes)?,
    };
    model::validate(&profile).map_err(ParseError::TreeConstructionFailed)?;
    Ok(profile)
}

/// Sorts threads by `(name, id)` and each thread's span roots by start
/// time, the stable ordering spec.md §4.1 requires of every parser. Shared
/// so format modules don't each reimplement it slightly differently.
pub(crate) fn finish_profile(mut profile: Profile) -> Profile {
    profile.threads.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    for thread in &mut profile.threads {
        thread.span_root_ids.sort_by_key(|idx| profile.span_arena[idx.0].start_us);
    }
    profile
}

/// Deepest `depth` reachable from `idx`, walked iteratively over the
/// sibling chain at each level so a pathologically wide sampled-stack tree
/// doesn't recurse once per sibling.
pub(crate) fn subtree_max_depth(arena: &[Span], idx: SpanIndex) -> u16 {
    let mut depth = arena[idx.0].depth;
    let mut child = arena[idx.0].first_child;
    while let Some(c) = child {
        depth = depth.max(subtree_max_depth(arena, c));
        child = arena[c.0].next_sibling;
    }
    depth
}

/// Number of spans in the subtree rooted at `idx`, inclusive.
pub(crate) fn count_subtree(arena: &[Span], idx: SpanIndex) -> usize {
    let mut count = 1;
    let mut child = arena[idx.0].first_child;
    while let Some(c) = child {
        count += count_subtree(arena, c);
        child = arena[c.0].next_sibling;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_returns_none_for_garbage() {
        assert_eq!(detect(b"\x00\x01\x02not a profile"), None);
    }

    #[test]
    fn detect_recognizes_chrome_trace_events() {
        let bytes = br#"{"traceEvents":[{"ph":"B","name":"f","ts":0,"pid":1,"tid":1}]}"#;
        assert_eq!(detect(bytes), Some(ProfileFormat::ChromeTrace));
    }

    #[test]
    fn detect_recognizes_collapsed_stacks() {
        let bytes = b"main;foo;bar 10\nmain;foo;baz 5\n";
        assert_eq!(detect(bytes), Some(ProfileFormat::CollapsedStacks));
    }
}
