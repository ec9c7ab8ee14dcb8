//! Firefox Profiler processed-profile JSON (not Gecko format). Field
//! layout grounded directly on the teacher's `profiler-sdk::schema`: a
//! thread's stacks are a tree encoded by a `prefix` column in its
//! `stack_table`, and each sample names a stack index rather than a frame
//! list directly, so every sample is walked root-to-leaf through
//! `stack_table`/`frame_table`/`func_table` before reaching the shared
//! sampled-stack builder.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::model::{Profile, ProfileFormat, StringTable, Thread, ThreadId};

use super::builder::SpanTreeBuilder;
use super::{FormatCapabilities, Parser};

pub struct FirefoxParser;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfile {
    meta: RawMeta,
    threads: Vec<RawThread>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeta {
    interval: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawThread {
    name: String,
    pid: Value,
    tid: Value,
    samples: RawSamplesTable,
    stack_table: RawStackTable,
    frame_table: RawFrameTable,
    func_table: RawFuncTable,
    string_array: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSamplesTable {
    stack: Vec<Option<usize>>,
    time: Vec<f64>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawStackTable {
    frame: Vec<usize>,
    prefix: Vec<Option<usize>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrameTable {
    func: Vec<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFuncTable {
    name: Vec<usize>,
}

pub fn looks_like_firefox(value: &Value) -> bool {
    value.get("meta").is_some()
        && value.get("threads").and_then(Value::as_array).is_some()
        && value
            .get("threads")
            .and_then(Value::as_array)
            .and_then(|t| t.first())
            .is_some_and(|t| t.get("stackTable").is_some())
}

impl Parser for FirefoxParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::FirefoxGecko
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::SPANS_ONLY
    }

    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError> {
        let raw: RawProfile = serde_json::from_slice(bytes)?;
        if raw.threads.is_empty() {
            return Err(ParseError::TreeConstructionFailed("profile has no threads".into()));
        }
        let sample_period_us = (raw.meta.interval * 1000.0).round() as i64;

        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let mut threads = Vec::new();
        let mut max_end = i64::MIN;

        for raw_thread in &raw.threads {
            let thread_id = thread_key(&raw_thread.pid, &raw_thread.tid);
            let samples = stack_samples(raw_thread)?;
            let roots = builder.build_from_samples(thread_id, &mut strings, &samples, sample_period_us);
            let max_depth = roots
                .iter()
                .map(|r| super::subtree_max_depth(&builder.arena, *r))
                .max()
                .unwrap_or(0);
            let span_count = roots.iter().map(|r| super::count_subtree(&builder.arena, *r)).sum();
            for &root in &roots {
                max_end = max_end.max(builder.arena[root.0].end_us);
            }
            threads.push(Thread {
                id: thread_id,
                name: raw_thread.name.clone(),
                sort_key: (raw_thread.name.clone(), thread_id.0),
                span_root_ids: roots,
                span_count,
                max_depth,
            });
        }
        if max_end == i64::MIN {
            max_end = 0;
        }

        let profile = Profile {
            name: None,
            format: ProfileFormat::FirefoxGecko,
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

/// Walks `samples.stack[i]` up through `stack_table.prefix` to the root,
/// resolving each stack node to its function name, then reverses to get a
/// root-first frame list per the teacher's documented walk:
/// `sample -> stack -> frame -> func -> name`.
fn stack_samples(thread: &RawThread) -> Result<Vec<(i64, Vec<String>)>, ParseError> {
    let mut out = Vec::with_capacity(thread.samples.stack.len());
    for (i, stack_idx) in thread.samples.stack.iter().enumerate() {
        let ts_us = (thread.samples.time[i] * 1000.0).round() as i64;
        let mut frames = Vec::new();
        let mut cursor = *stack_idx;
        while let Some(idx) = cursor {
            let frame_idx = *thread.stack_table.frame.get(idx).ok_or_else(|| {
                ParseError::TreeConstructionFailed("stack table frame index out of range".into())
            })?;
            let func_idx = *thread.frame_table.func.get(frame_idx).ok_or_else(|| {
                ParseError::TreeConstructionFailed("frame table func index out of range".into())
            })?;
            let name_idx = *thread.func_table.name.get(func_idx).ok_or_else(|| {
                ParseError::TreeConstructionFailed("func table name index out of range".into())
            })?;
            let name = thread.string_array.get(name_idx).cloned().unwrap_or_default();
            frames.push(name);
            cursor = thread.stack_table.prefix[idx];
        }
        frames.reverse();
        out.push((ts_us, frames));
    }
    Ok(out)
}

fn thread_key(pid: &Value, tid: &Value) -> ThreadId {
    let pid = pid.as_u64().unwrap_or(0);
    let tid = tid.as_u64().unwrap_or(0);
    ThreadId((pid << 32) | tid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> Vec<u8> {
        br#"{
            "meta": {"interval": 1.0},
            "threads": [{
                "name": "GeckoMain",
                "pid": 1,
                "tid": 1,
                "samples": {"stack": [0, 1], "time": [0.0, 1.0]},
                "stackTable": {"frame": [0, 1], "prefix": [null, 0]},
                "frameTable": {"func": [0, 1]},
                "funcTable": {"name": [0, 1]},
                "stringArray": ["main", "work"]
            }]
        }"#
        .to_vec()
    }

    #[test]
    fn looks_like_firefox_matches_stack_table_shape() {
        let value: Value = serde_json::from_slice(&sample_json()).unwrap();
        assert!(looks_like_firefox(&value));
    }

    #[test]
    fn walks_prefix_chain_into_root_first_stacks() {
        let profile = FirefoxParser.parse(&sample_json()).unwrap();
        assert_eq!(profile.threads.len(), 1);
        let root = profile.span_by_index(profile.threads[0].span_root_ids[0]);
        assert_eq!(profile.name_of(root), "main");
        let child = profile.span_by_index(root.first_child.unwrap());
        assert_eq!(profile.name_of(child), "work");
    }
}
