//! `perf script` text output (also what `perf script | stackcollapse-perf.pl`
//! consumes upstream of folded format): blank-line-separated blocks, each a
//! header line (`comm  pid/tid [cpu]  timestamp:  count  event:`) followed
//! by indented `address symbol+offset (module)` frame lines, leaf-first.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ParseError;
use crate::model::{Profile, ProfileFormat, StringTable, Thread, ThreadId};

use super::builder::SpanTreeBuilder;
use super::{FormatCapabilities, Parser};

pub struct PerfParser;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<comm>.+?)\s+(?P<pid>\d+)(?:/(?P<tid>\d+))?\s+(?:\[\d+\]\s+)?(?P<ts>\d+\.\d+):")
            .expect("static perf script header regex is valid")
    })
}

fn frame_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[0-9a-fA-F]+\s+(?P<sym>[^(]+?)(?:\s+\([^)]*\))?\s*$")
            .expect("static perf script frame regex is valid")
    })
}

pub fn looks_like_perf_script(text: &str) -> bool {
    text.lines().find(|l| !l.trim().is_empty()).is_some_and(|l| header_re().is_match(l))
}

impl Parser for PerfParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::PerfScript
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::SPANS_ONLY
    }

    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ParseError::TreeConstructionFailed("perf script output must be UTF-8 text".into()))?;

        let mut samples: Vec<(i64, Vec<String>)> = Vec::new();
        let mut current_ts: Option<f64> = None;
        let mut current_frames: Vec<String> = Vec::new();

        let flush = |ts: Option<f64>, frames: &mut Vec<String>, samples: &mut Vec<(i64, Vec<String>)>| {
            if let Some(ts) = ts {
                if !frames.is_empty() {
                    let mut stack = std::mem::take(frames);
                    stack.reverse();
                    samples.push(((ts * 1_000_000.0).round() as i64, stack));
                }
            }
        };

        for line in text.lines() {
            if line.trim().is_empty() {
                flush(current_ts, &mut current_frames, &mut samples);
                current_ts = None;
                continue;
            }
            if let Some(caps) = header_re().captures(line) {
                flush(current_ts, &mut current_frames, &mut samples);
                current_ts = caps.name("ts").and_then(|m| m.as_str().parse().ok());
                continue;
            }
            if let Some(caps) = frame_re().captures(line) {
                current_frames.push(caps["sym"].trim().to_string());
            }
        }
        flush(current_ts, &mut current_frames, &mut samples);

        if samples.is_empty() {
            return Err(ParseError::TreeConstructionFailed("no perf script samples found".into()));
        }
        samples.sort_by_key(|(ts, _)| *ts);
        let sample_period_us = if samples.len() > 1 {
            (samples[1].0 - samples[0].0).max(1)
        } else {
            1
        };

        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let thread_id = ThreadId(0);
        let roots = builder.build_from_samples(thread_id, &mut strings, &samples, sample_period_us);
        let max_depth = roots
            .iter()
            .map(|r| super::subtree_max_depth(&builder.arena, *r))
            .max()
            .unwrap_or(0);
        let span_count = roots.iter().map(|r| super::count_subtree(&builder.arena, *r)).sum();
        let end_time_us = roots.iter().map(|r| builder.arena[r.0].end_us).max().unwrap_or(0);

        let threads = vec![Thread {
            id: thread_id,
            name: "perf".into(),
            sort_key: ("perf".into(), 0),
            span_root_ids: roots,
            span_count,
            max_depth,
        }];

        let profile = Profile {
            name: None,
            format: ProfileFormat::PerfScript,
            start_time_us: 0,
            end_time_us,
            threads,
            counters: vec![],
            markers: vec![],
            async_spans: vec![],
            frames: vec![],
            flow_edges: vec![],
            span_arena: builder.arena,
            strings,
        };
        Ok(super::finish_profile(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "swapper 0/0 [000] 1.000000: 1 cycles:\n\
            \tffffffff81234567 main+0x10 (vmlinux)\n\
            \tffffffff81234568 work+0x20 (vmlinux)\n\
            \n\
            swapper 0/0 [000] 1.000100: 1 cycles:\n\
            \tffffffff81234567 main+0x10 (vmlinux)\n\
            \tffffffff81234569 other+0x30 (vmlinux)\n";

    #[test]
    fn recognizes_perf_script_header() {
        assert!(looks_like_perf_script(SCRIPT));
        assert!(!looks_like_perf_script("main;foo;bar 10\n"));
    }

    #[test]
    fn leaf_first_frames_are_reversed_to_root_first() {
        let profile = PerfParser.parse(SCRIPT.as_bytes()).unwrap();
        let root = profile.span_by_index(profile.threads[0].span_root_ids[0]);
        assert_eq!(profile.name_of(root), "main");
    }
}
