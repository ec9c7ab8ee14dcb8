//! Chrome Trace Event Format: a flat `traceEvents` array of `B`/`E` (begin/
//! end) and `X` (complete, i.e. already-durationed) events, keyed by
//! `pid`/`tid`. https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::model::{Profile, ProfileFormat, SpanFlags, StringTable, Thread, ThreadId};

use super::builder::{SpanTreeBuilder, ThreadEvent};
use super::{FormatCapabilities, Parser};

pub struct ChromeParser;

#[derive(Deserialize)]
struct RawEvent {
    ph: String,
    name: Option<String>,
    cat: Option<String>,
    ts: f64,
    dur: Option<f64>,
    pid: Option<Value>,
    tid: Option<Value>,
}

#[derive(Deserialize)]
struct RawTrace {
    #[serde(rename = "traceEvents")]
    trace_events: Vec<RawEvent>,
}

pub fn looks_like_chrome(value: &Value) -> bool {
    value.get("traceEvents").and_then(Value::as_array).is_some()
        || value.as_array().is_some_and(|events| {
            events.first().is_some_and(|e| e.get("ph").is_some() && e.get("ts").is_some())
        })
}

impl Parser for ChromeParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::ChromeTrace
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::SPANS_ONLY
    }

    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError> {
        let raw: Vec<RawEvent> = if let Ok(trace) = serde_json::from_slice::<RawTrace>(bytes) {
            trace.trace_events
        } else {
            serde_json::from_slice(bytes)?
        };
        if raw.is_empty() {
            return Err(ParseError::TreeConstructionFailed("no trace events".into()));
        }

        let min_ts = raw.iter().map(|e| e.ts).fold(f64::INFINITY, f64::min);
        if !min_ts.is_finite() {
            return Err(ParseError::InconsistentTimestamps);
        }

        let mut by_thread: HashMap<ThreadId, Vec<ThreadEvent>> = HashMap::new();
        for event in &raw {
            let thread_id = thread_key(event.pid.as_ref(), event.tid.as_ref());
            let ts_us = (event.ts - min_ts).round() as i64;
            match event.ph.as_str() {
                "B" => by_thread.entry(thread_id).or_default().push(ThreadEvent::Begin {
                    ts_us,
                    name: event.name.clone().unwrap_or_default(),
                    category: event.cat.clone(),
                    flags: SpanFlags::EMPTY,
                }),
                "E" => by_thread.entry(thread_id).or_default().push(ThreadEvent::End { ts_us }),
                "X" => {
                    let dur_us = event.dur.unwrap_or(0.0).round() as i64;
                    let entry = by_thread.entry(thread_id).or_default();
                    entry.push(ThreadEvent::Begin {
                        ts_us,
                        name: event.name.clone().unwrap_or_default(),
                        category: event.cat.clone(),
                        flags: SpanFlags::EMPTY,
                    });
                    entry.push(ThreadEvent::End { ts_us: ts_us + dur_us });
                }
                _ => {}
            }
        }
        if by_thread.is_empty() {
            return Err(ParseError::TreeConstructionFailed("no B/E/X span events found".into()));
        }

        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let mut threads = Vec::new();
        let mut max_end = 0i64;

        for (thread_id, events) in by_thread {
            let roots = builder.build_from_events(thread_id, &mut strings, &events)?;
            let max_depth = roots
                .iter()
                .map(|r| super::subtree_max_depth(&builder.arena, *r))
                .max()
                .unwrap_or(0);
            for &root in &roots {
                max_end = max_end.max(builder.arena[root.0].end_us);
            }
            threads.push(Thread {
                id: thread_id,
                name: format!("thread {}", thread_id.0),
                sort_key: (format!("thread {}", thread_id.0), thread_id.0),
                span_root_ids: roots,
                span_count: 0,
                max_depth,
            });
        }
        for thread in &mut threads {
            thread.span_count = thread
                .span_root_ids
                .iter()
                .map(|r| super::count_subtree(&builder.arena, *r))
                .sum();
        }

        let profile = Profile {
            name: None,
            format: ProfileFormat::ChromeTrace,
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

fn thread_key(pid: Option<&Value>, tid: Option<&Value>) -> ThreadId {
    let pid = pid.and_then(Value::as_u64).unwrap_or(0);
    let tid = tid.and_then(Value::as_u64).unwrap_or(0);
    ThreadId((pid << 32) | tid)
}
