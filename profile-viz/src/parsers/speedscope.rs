//! Speedscope's `$schema`-tagged JSON: a shared frame list plus one or more
//! profiles, each either "sampled" (a weighted stack per sample) or
//! "evented" (open/close events). https://www.speedscope.app/file-format-schema.json

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::model::{Profile, ProfileFormat, SpanFlags, StringTable, Thread, ThreadId};

use super::builder::{SpanTreeBuilder, ThreadEvent};
use super::{FormatCapabilities, Parser};

pub struct SpeedscopeParser;

#[derive(Deserialize)]
struct RawFile {
    shared: RawShared,
    profiles: Vec<RawProfile>,
}

#[derive(Deserialize)]
struct RawShared {
    frames: Vec<RawFrame>,
}

#[derive(Deserialize)]
struct RawFrame {
    name: String,
}

#[derive(Deserialize)]
struct RawProfile {
    #[serde(rename = "type")]
    kind: String,
    name: Option<String>,
    #[serde(default = "default_unit")]
    unit: String,
    #[serde(default)]
    samples: Vec<Vec<usize>>,
    #[serde(default)]
    weights: Vec<f64>,
    #[serde(default)]
    events: Vec<RawEvent>,
}

fn default_unit() -> String {
    "microseconds".into()
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    at: f64,
    frame: usize,
}

pub fn looks_like_speedscope(value: &Value) -> bool {
    value
        .get("$schema")
        .and_then(Value::as_str)
        .is_some_and(|s| s.contains("speedscope"))
        || (value.get("shared").and_then(|s| s.get("frames")).is_some()
            && value.get("profiles").and_then(Value::as_array).is_some())
}

impl Parser for SpeedscopeParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::Speedscope
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::SPANS_ONLY
    }

    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError> {
        let raw: RawFile = serde_json::from_slice(bytes)?;
        if raw.profiles.is_empty() {
            return Err(ParseError::TreeConstructionFailed("no profiles in speedscope file".into()));
        }

        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let mut threads = Vec::new();
        let mut max_end = 0i64;

        for (thread_index, raw_profile) in raw.profiles.iter().enumerate() {
            let thread_id = ThreadId(thread_index as u64);
            let scale = unit_to_us_scale(&raw_profile.unit);
            let roots = match raw_profile.kind.as_str() {
                "evented" => build_evented(&mut builder, thread_id, &mut strings, raw_profile, &raw.shared, scale)?,
                "sampled" => build_sampled(&mut builder, thread_id, &mut strings, raw_profile, &raw.shared, scale),
                other => {
                    return Err(ParseError::TreeConstructionFailed(format!(
                        "unknown speedscope profile type {other:?}"
                    )))
                }
            };
            let max_depth = roots
                .iter()
                .map(|r| super::subtree_max_depth(&builder.arena, *r))
                .max()
                .unwrap_or(0);
            let span_count = roots.iter().map(|r| super::count_subtree(&builder.arena, *r)).sum();
            for &root in &roots {
                max_end = max_end.max(builder.arena[root.0].end_us);
            }
            let name = raw_profile.name.clone().unwrap_or_else(|| format!("profile {thread_index}"));
            threads.push(Thread {
                id: thread_id,
                name: name.clone(),
                sort_key: (name, thread_id.0),
                span_root_ids: roots,
                span_count,
                max_depth,
            });
        }

        let profile = Profile {
            name: None,
            format: ProfileFormat::Speedscope,
            start_time_us: 0,
            end_time_us: max_end,
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

fn unit_to_us_scale(unit: &str) -> f64 {
    match unit {
        "nanoseconds" => 0.001,
        "milliseconds" => 1000.0,
        "seconds" => 1_000_000.0,
        _ => 1.0,
    }
}

fn build_evented(
    builder: &mut SpanTreeBuilder,
    thread_id: ThreadId,
    strings: &mut StringTable,
    raw_profile: &RawProfile,
    shared: &RawShared,
    scale: f64,
) -> Result<Vec<crate::model::SpanIndex>, ParseError> {
    let events = raw_profile
        .events
        .iter()
        .map(|e| {
            let ts_us = (e.at * scale).round() as i64;
            let name = shared.frames.get(e.frame).map(|f| f.name.clone()).unwrap_or_default();
            match e.kind.as_str() {
                "O" => Ok(ThreadEvent::Begin { ts_us, name, category: None, flags: SpanFlags::EMPTY }),
                "C" => Ok(ThreadEvent::End { ts_us }),
                other => Err(ParseError::TreeConstructionFailed(format!("unknown event type {other:?}"))),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    builder.build_from_events(thread_id, strings, &events)
}

fn build_sampled(
    builder: &mut SpanTreeBuilder,
    thread_id: ThreadId,
    strings: &mut StringTable,
    raw_profile: &RawProfile,
    shared: &RawShared,
    scale: f64,
) -> Vec<crate::model::SpanIndex> {
    let mut ts = 0.0;
    let samples: Vec<(i64, Vec<String>)> = raw_profile
        .samples
        .iter()
        .enumerate()
        .map(|(i, frame_indices)| {
            let sample_ts = (ts * scale).round() as i64;
            ts += raw_profile.weights.get(i).copied().unwrap_or(0.0);
            let stack = frame_indices
                .iter()
                .map(|&idx| shared.frames.get(idx).map(|f| f.name.clone()).unwrap_or_default())
                .collect();
            (sample_ts, stack)
        })
        .collect();
    // sampled profiles have no fixed sampling period; approximate the final
    // sample's duration with the weight it was already given.
    let period_us = raw_profile.weights.last().copied().unwrap_or(0.0) * scale;
    builder.build_from_samples(thread_id, strings, &samples, period_us.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_evented_profile() {
        let json = br#"{
            "$schema": "https://www.speedscope.app/file-format-schema.json",
            "shared": {"frames": [{"name": "a"}, {"name": "b"}]},
            "profiles": [{
                "type": "evented",
                "name": "main",
                "unit": "microseconds",
                "events": [
                    {"type": "O", "at": 0, "frame": 0},
                    {"type": "O", "at": 10, "frame": 1},
                    {"type": "C", "at": 40, "frame": 1},
                    {"type": "C", "at": 100, "frame": 0}
                ]
            }]
        }"#;
        let profile = SpeedscopeParser.parse(json).unwrap();
        assert_eq!(profile.threads.len(), 1);
        assert_eq!(profile.span_arena.len(), 2);
    }

    #[test]
    fn parses_sampled_profile() {
        let json = br#"{
            "shared": {"frames": [{"name": "a"}, {"name": "b"}]},
            "profiles": [{
                "type": "sampled",
                "unit": "microseconds",
                "samples": [[0], [0, 1]],
                "weights": [10, 10]
            }]
        }"#;
        let profile = SpeedscopeParser.parse(json).unwrap();
        assert_eq!(profile.threads.len(), 1);
        assert!(!profile.span_arena.is_empty());
    }
}
