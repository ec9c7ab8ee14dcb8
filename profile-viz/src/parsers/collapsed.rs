//! Folded/collapsed stacks (Brendan Gregg's `stackcollapse` format):
//! `frame;frame;frame count`, one stack per line, root-first and
//! semicolon-joined, with a trailing whitespace-separated sample count.
//! Every line becomes one synthetic sample on a single thread, spaced one
//! unit apart so relative weight shows up as span width.

use crate::error::ParseError;
use crate::model::{Profile, ProfileFormat, StringTable, Thread, ThreadId};

use super::builder::SpanTreeBuilder;
use super::{FormatCapabilities, Parser};

pub struct CollapsedParser;

pub fn looks_like_collapsed(text: &str) -> bool {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .take(5)
        .all(|l| matches!(parse_line(l), Some(_)))
        && text.lines().any(|l| !l.trim().is_empty())
}

fn parse_line(line: &str) -> Option<(Vec<&str>, u64)> {
    let (stack_part, count_part) = line.trim_end().rsplit_once(' ')?;
    let count: u64 = count_part.parse().ok()?;
    if stack_part.is_empty() {
        return None;
    }
    Some((stack_part.split(';').collect(), count))
}

impl Parser for CollapsedParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::CollapsedStacks
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::SPANS_ONLY
    }

    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ParseError::TreeConstructionFailed("collapsed stacks must be UTF-8 text".into()))?;

        let mut samples: Vec<(i64, Vec<String>)> = Vec::new();
        let mut ts = 0i64;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let (frames, count) = parse_line(line).ok_or_else(|| {
                ParseError::TreeConstructionFailed(format!("malformed collapsed-stack line: {line:?}"))
            })?;
            let stack: Vec<String> = frames.into_iter().map(String::from).collect();
            // One synthetic sample per occurrence, so a count-of-10 stack
            // occupies ten times the width of a count-of-1 stack.
            for _ in 0..count.max(1) {
                samples.push((ts, stack.clone()));
                ts += 1;
            }
        }
        if samples.is_empty() {
            return Err(ParseError::TreeConstructionFailed("no stacks found".into()));
        }

        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let thread_id = ThreadId(0);
        let roots = builder.build_from_samples(thread_id, &mut strings, &samples, 1);
        let max_depth = roots
            .iter()
            .map(|r| super::subtree_max_depth(&builder.arena, *r))
            .max()
            .unwrap_or(0);
        let span_count = roots.iter().map(|r| super::count_subtree(&builder.arena, *r)).sum();
        let end_time_us = roots.iter().map(|r| builder.arena[r.0].end_us).max().unwrap_or(0);

        let threads = vec![Thread {
            id: thread_id,
            name: "stacks".into(),
            sort_key: ("stacks".into(), 0),
            span_root_ids: roots,
            span_count,
            max_depth,
        }];

        let profile = Profile {
            name: None,
            format: ProfileFormat::CollapsedStacks,
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
