//! gzip-compressed protobuf, per the pprof wire format
//! (github.com/google/pprof/proto/profile.proto). The message types below
//! are hand-written `prost::Message` impls mirroring that schema field for
//! field — there's no `.proto` file or build-time codegen here, just the
//! struct shapes `prost`'s derive macro needs.

use std::io::Read;

use flate2::read::GzDecoder;
use prost::Message;

use crate::error::ParseError;
use crate::model::{Profile, ProfileFormat, StringTable, Thread, ThreadId};

use super::builder::SpanTreeBuilder;
use super::{FormatCapabilities, Parser};

pub struct PprofParser;

#[derive(Clone, PartialEq, Message)]
struct RawProfile {
    #[prost(message, repeated, tag = "1")]
    sample_type: Vec<RawValueType>,
    #[prost(message, repeated, tag = "2")]
    sample: Vec<RawSample>,
    #[prost(message, repeated, tag = "3")]
    mapping: Vec<RawMapping>,
    #[prost(message, repeated, tag = "4")]
    location: Vec<RawLocation>,
    #[prost(message, repeated, tag = "5")]
    function: Vec<RawFunction>,
    #[prost(string, repeated, tag = "6")]
    string_table: Vec<String>,
    #[prost(int64, tag = "9")]
    time_nanos: i64,
    #[prost(int64, tag = "10")]
    duration_nanos: i64,
    #[prost(message, optional, tag = "11")]
    period_type: Option<RawValueType>,
    #[prost(int64, tag = "12")]
    period: i64,
}

#[derive(Clone, PartialEq, Message)]
struct RawValueType {
    #[prost(int64, tag = "1")]
    r#type: i64,
    #[prost(int64, tag = "2")]
    unit: i64,
}

#[derive(Clone, PartialEq, Message)]
struct RawSample {
    #[prost(uint64, repeated, tag = "1")]
    location_id: Vec<u64>,
    #[prost(int64, repeated, tag = "2")]
    value: Vec<i64>,
}

#[derive(Clone, PartialEq, Message)]
struct RawMapping {
    #[prost(uint64, tag = "1")]
    id: u64,
}

#[derive(Clone, PartialEq, Message)]
struct RawLocation {
    #[prost(uint64, tag = "1")]
    id: u64,
    #[prost(message, repeated, tag = "4")]
    line: Vec<RawLine>,
}

#[derive(Clone, PartialEq, Message)]
struct RawLine {
    #[prost(uint64, tag = "1")]
    function_id: u64,
}

#[derive(Clone, PartialEq, Message)]
struct RawFunction {
    #[prost(uint64, tag = "1")]
    id: u64,
    #[prost(int64, tag = "2")]
    name: i64,
}

pub fn looks_like_pprof(bytes: &[u8]) -> bool {
    // gzip magic (pprof's usual on-disk form) or a protobuf stream whose
    // first bytes decode as a plausible field-1 (sample_type) tag.
    bytes.starts_with(&[0x1f, 0x8b]) || RawProfile::decode(bytes).is_ok_and(|p| !p.sample.is_empty())
}

impl Parser for PprofParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::Pprof
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::SPANS_ONLY
    }

    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError> {
        let decoded;
        let payload: &[u8] = if bytes.starts_with(&[0x1f, 0x8b]) {
            let mut gz = GzDecoder::new(bytes);
            let mut buf = Vec::new();
            gz.read_to_end(&mut buf).map_err(|_| ParseError::Truncated)?;
            decoded = buf;
            &decoded
        } else {
            bytes
        };
        let raw = RawProfile::decode(payload)
            .map_err(|e| ParseError::TreeConstructionFailed(format!("invalid pprof protobuf: {e}")))?;
        if raw.sample.is_empty() {
            return Err(ParseError::TreeConstructionFailed("profile has no samples".into()));
        }

        let resolve = |idx: i64| raw.string_table.get(idx as usize).cloned().unwrap_or_default();
        let function_name: std::collections::HashMap<u64, String> =
            raw.function.iter().map(|f| (f.id, resolve(f.name))).collect();
        let location_frame: std::collections::HashMap<u64, String> = raw
            .location
            .iter()
            .map(|loc| {
                let name = loc
                    .line
                    .first()
                    .and_then(|l| function_name.get(&l.function_id))
                    .cloned()
                    .unwrap_or_default();
                (loc.id, name)
            })
            .collect();

        // A sample's `value` carries whatever metrics `sample_type`
        // declares; the last one is used as this occurrence's weight
        // (commonly cpu-nanoseconds for a cpu profile).
        let mut samples: Vec<(i64, Vec<String>, i64)> = Vec::with_capacity(raw.sample.len());
        let mut ts = 0i64;
        for sample in &raw.sample {
            let weight_ns = sample.value.last().copied().unwrap_or(1).max(1);
            let weight_us = (weight_ns / 1000).max(1);
            // pprof stores locations leaf-first; reverse to root-first.
            let stack: Vec<String> =
                sample.location_id.iter().rev().map(|id| location_frame.get(id).cloned().unwrap_or_default()).collect();
            samples.push((ts, stack, weight_us));
            ts += weight_us;
        }
        let last_weight_us = samples.last().map(|(_, _, w)| *w).unwrap_or(1);
        let timed_samples: Vec<(i64, Vec<String>)> = samples.into_iter().map(|(ts, stack, _)| (ts, stack)).collect();

        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let thread_id = ThreadId(0);
        let roots = builder.build_from_samples(thread_id, &mut strings, &timed_samples, last_weight_us);
        let max_depth = roots
            .iter()
            .map(|r| super::subtree_max_depth(&builder.arena, *r))
            .max()
            .unwrap_or(0);
        let span_count = roots.iter().map(|r| super::count_subtree(&builder.arena, *r)).sum();
        let end_time_us = roots.iter().map(|r| builder.arena[r.0].end_us).max().unwrap_or(0);

        let threads = vec![Thread {
            id: thread_id,
            name: "pprof".into(),
            sort_key: ("pprof".into(), 0),
            span_root_ids: roots,
            span_count,
            max_depth,
        }];

        let profile = Profile {
            name: None,
            format: ProfileFormat::Pprof,
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

    fn sample_profile() -> RawProfile {
        RawProfile {
            sample_type: vec![RawValueType { r#type: 0, unit: 0 }],
            sample: vec![
                RawSample { location_id: vec![2, 1], value: vec![1000] },
                RawSample { location_id: vec![1], value: vec![2000] },
            ],
            mapping: vec![],
            location: vec![
                RawLocation { id: 1, line: vec![RawLine { function_id: 1 }] },
                RawLocation { id: 2, line: vec![RawLine { function_id: 2 }] },
            ],
            function: vec![
                RawFunction { id: 1, name: 1 },
                RawFunction { id: 2, name: 2 },
            ],
            string_table: vec![String::new(), "main".into(), "work".into()],
            time_nanos: 0,
            duration_nanos: 3000,
            period_type: None,
            period: 1,
        }
    }

    #[test]
    fn recognizes_encoded_protobuf() {
        let bytes = sample_profile().encode_to_vec();
        assert!(looks_like_pprof(&bytes));
    }

    #[test]
    fn reverses_leaf_first_locations_to_root_first() {
        let bytes = sample_profile().encode_to_vec();
        let profile = PprofParser.parse(&bytes).unwrap();
        let root = profile.span_by_index(profile.threads[0].span_root_ids[0]);
        assert_eq!(profile.name_of(root), "main");
    }
}
