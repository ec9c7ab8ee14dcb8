//! V8 CPU profile JSON (`console.profile()` / `--prof` / DevTools export): a
//! flat `nodes` array forming a call tree via `children` ids, plus parallel
//! `samples`/`timeDeltas` arrays giving which node id was on-CPU at each
//! sample and the microseconds since the previous one.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::model::{Profile, ProfileFormat, StringTable, Thread, ThreadId};

use super::builder::SpanTreeBuilder;
use super::{FormatCapabilities, Parser};

pub struct V8Parser;

#[derive(Deserialize)]
struct RawProfile {
    nodes: Vec<RawNode>,
    #[serde(rename = "startTime", default)]
    start_time: i64,
    samples: Vec<u64>,
    #[serde(rename = "timeDeltas")]
    time_deltas: Vec<i64>,
}

#[derive(Deserialize)]
struct RawNode {
    id: u64,
    #[serde(rename = "callFrame")]
    call_frame: RawCallFrame,
    #[serde(default)]
    children: Vec<u64>,
}

#[derive(Deserialize)]
struct RawCallFrame {
    #[serde(rename = "functionName")]
    function_name: String,
}

pub fn looks_like_v8(value: &Value) -> bool {
    value.get("nodes").and_then(Value::as_array).is_some()
        && value.get("samples").and_then(Value::as_array).is_some()
        && value.get("timeDeltas").and_then(Value::as_array).is_some()
}

impl Parser for V8Parser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::V8CpuProfile
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::SPANS_ONLY
    }

    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError> {
        let raw: RawProfile = serde_json::from_slice(bytes)?;
        if raw.nodes.is_empty() {
            return Err(ParseError::TreeConstructionFailed("profile has no call tree nodes".into()));
        }

        let mut parent_of: HashMap<u64, u64> = HashMap::new();
        let mut name_of: HashMap<u64, &str> = HashMap::new();
        for node in &raw.nodes {
            name_of.insert(node.id, node.call_frame.function_name.as_str());
            for &child in &node.children {
                parent_of.insert(child, node.id);
            }
        }

        let mut samples = Vec::with_capacity(raw.samples.len());
        let mut ts = raw.start_time;
        for (i, &node_id) in raw.samples.iter().enumerate() {
            ts += raw.time_deltas.get(i).copied().unwrap_or(0);
            let stack = stack_for_node(node_id, &parent_of, &name_of);
            samples.push((ts, stack));
        }
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
            name: "main".into(),
            sort_key: ("main".into(), 0),
            span_root_ids: roots,
            span_count,
            max_depth,
        }];

        let profile = Profile {
            name: None,
            format: ProfileFormat::V8CpuProfile,
            start_time_us: raw.start_time,
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

fn stack_for_node(node_id: u64, parent_of: &HashMap<u64, u64>, name_of: &HashMap<u64, &str>) -> Vec<String> {
    let mut stack = Vec::new();
    let mut cursor = Some(node_id);
    while let Some(id) = cursor {
        if let Some(&name) = name_of.get(&id) {
            stack.push(name.to_string());
        }
        cursor = parent_of.get(&id).copied();
    }
    stack.reverse();
    stack
}
