//! React DevTools profiler export: one root per profiled React tree, each
//! with a `commitData` array of commit-timed renders. A commit becomes a
//! root span on its root's thread; the components it re-rendered become
//! that commit's children, so nesting reflects "rendered during this
//! commit" rather than React's fiber tree.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::model::{Profile, ProfileFormat, SpanFlags, StringTable, Thread, ThreadId};

use super::builder::{SpanTreeBuilder, ThreadEvent};
use super::{FormatCapabilities, Parser};

pub struct ReactDevToolsParser;

#[derive(Deserialize)]
struct RawExport {
    #[serde(rename = "dataForRoots")]
    data_for_roots: Vec<RawRoot>,
}

#[derive(Deserialize)]
struct RawRoot {
    #[serde(rename = "displayName")]
    display_name: String,
    #[serde(rename = "commitData")]
    commit_data: Vec<RawCommit>,
}

#[derive(Deserialize)]
struct RawCommit {
    timestamp: f64,
    duration: f64,
    #[serde(rename = "fiberActualDurations", default)]
    fiber_actual_durations: Vec<(String, f64)>,
}

pub fn looks_like_react_devtools(value: &Value) -> bool {
    value
        .get("dataForRoots")
        .and_then(Value::as_array)
        .and_then(|roots| roots.first())
        .is_some_and(|root| root.get("commitData").is_some())
}

impl Parser for ReactDevToolsParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::ReactDevTools
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::SPANS_ONLY
    }

    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError> {
        let raw: RawExport = serde_json::from_slice(bytes)?;
        if raw.data_for_roots.is_empty() {
            return Err(ParseError::TreeConstructionFailed("export has no profiled roots".into()));
        }

        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let mut threads = Vec::new();
        let mut max_end = 0i64;

        for (root_index, root) in raw.data_for_roots.iter().enumerate() {
            let thread_id = ThreadId(root_index as u64);
            let mut events = Vec::new();
            for (commit_index, commit) in root.commit_data.iter().enumerate() {
                let start_us = (commit.timestamp * 1000.0).round() as i64;
                let end_us = start_us + (commit.duration * 1000.0).round() as i64;
                events.push(ThreadEvent::Begin {
                    ts_us: start_us,
                    name: format!("commit {commit_index}"),
                    category: Some("commit".into()),
                    flags: SpanFlags::EMPTY,
                });
                // Sub-slices for each component's contribution to the
                // commit are approximated as back-to-back children filling
                // the commit's duration in the order DevTools recorded them.
                let mut cursor = start_us;
                for (name, actual_duration_ms) in &commit.fiber_actual_durations {
                    let dur_us = (actual_duration_ms * 1000.0).round() as i64;
                    events.push(ThreadEvent::Begin {
                        ts_us: cursor,
                        name: name.clone(),
                        category: None,
                        flags: SpanFlags::EMPTY,
                    });
                    cursor += dur_us;
                    events.push(ThreadEvent::End { ts_us: cursor });
                }
                events.push(ThreadEvent::End { ts_us: end_us.max(cursor) });
            }
            let roots = builder.build_from_events(thread_id, &mut strings, &events)?;
            let max_depth = roots
                .iter()
                .map(|r| super::subtree_max_depth(&builder.arena, *r))
                .max()
                .unwrap_or(0);
            let span_count = roots.iter().map(|r| super::count_subtree(&builder.arena, *r)).sum();
            for &r in &roots {
                max_end = max_end.max(builder.arena[r.0].end_us);
            }
            threads.push(Thread {
                id: thread_id,
                name: root.display_name.clone(),
                sort_key: (root.display_name.clone(), thread_id.0),
                span_root_ids: roots,
                span_count,
                max_depth,
            });
        }

        let profile = Profile {
            name: None,
            format: ProfileFormat::ReactDevTools,
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static [u8] {
        br#"{
            "dataForRoots": [{
                "displayName": "App",
                "commitData": [{
                    "timestamp": 0,
                    "duration": 5,
                    "fiberActualDurations": [["Header", 1.0], ["List", 3.0]]
                }]
            }]
        }"#
    }

    #[test]
    fn detects_commit_data_shape() {
        let value: Value = serde_json::from_slice(sample_json()).unwrap();
        assert!(looks_like_react_devtools(&value));
    }

    #[test]
    fn commit_becomes_root_with_component_children() {
        let profile = ReactDevToolsParser.parse(sample_json()).unwrap();
        let commit = profile.span_by_index(profile.threads[0].span_root_ids[0]);
        assert_eq!(profile.name_of(commit), "commit 0");
        let header = profile.span_by_index(commit.first_child.unwrap());
        assert_eq!(profile.name_of(header), "Header");
    }
}
