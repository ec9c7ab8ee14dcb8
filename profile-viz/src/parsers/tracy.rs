//! Tracy capture, common-subset binary encoding (zones + plot counters; no
//! lock contention, memory, or GPU zone data). Per spec.md §9's open
//! question on PIX/Tracy coverage, this parser declares exactly what it
//! reconstructs via [`FormatCapabilities`] rather than claiming full
//! protocol coverage.
//!
//! Layout (all integers little-endian via `byteorder`):
//! ```text
//! magic:          8 bytes, b"TracyPrf"
//! version:        u32
//! thread_count:   u32
//! thread* {
//!     name_len:   u16
//!     name:       name_len bytes, utf8
//!     event_count: u32
//!     event* {
//!         kind:   u8      (0 = zone begin, 1 = zone end)
//!         ts_us:  i64
//!         name_len: u16   (present only when kind == 0)
//!         name:   name_len bytes, utf8
//!     }
//! }
//! counter_count:  u32
//! counter* {
//!     name_len:   u16
//!     name:       name_len bytes, utf8
//!     sample_count: u32
//!     sample* { ts_us: i64, value: f64 }
//! }
//! ```

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::ParseError;
use crate::model::{Counter, CounterSample, Profile, ProfileFormat, SpanFlags, StringTable, Thread, ThreadId};

use super::builder::{SpanTreeBuilder, ThreadEvent};
use super::{FormatCapabilities, Parser};

pub struct TracyParser;

const MAGIC: &[u8; 8] = b"TracyPrf";

pub fn looks_like_tracy(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

impl Parser for TracyParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::Tracy
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities { spans: true, counters: true, ..FormatCapabilities::NONE }
    }

    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError> {
        if !looks_like_tracy(bytes) {
            return Err(ParseError::InvalidFormat);
        }
        let mut cursor = Cursor::new(bytes);
        cursor.set_position(MAGIC.len() as u64);
        let _version = read_u32(&mut cursor)?;
        let thread_count = read_u32(&mut cursor)?;

        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let mut threads = Vec::new();
        let mut max_end = 0i64;

        for thread_index in 0..thread_count {
            let name = read_string(&mut cursor)?;
            let event_count = read_u32(&mut cursor)?;
            let mut events = Vec::with_capacity(event_count as usize);
            for _ in 0..event_count {
                let kind = read_u8(&mut cursor)?;
                let ts_us = read_i64(&mut cursor)?;
                match kind {
                    0 => {
                        let name = read_string(&mut cursor)?;
                        events.push(ThreadEvent::Begin { ts_us, name, category: None, flags: SpanFlags::EMPTY });
                    }
                    1 => events.push(ThreadEvent::End { ts_us }),
                    other => {
                        return Err(ParseError::TreeConstructionFailed(format!("unknown tracy event kind {other}")))
                    }
                }
            }
            let thread_id = ThreadId(thread_index as u64);
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
                name: name.clone(),
                sort_key: (name, thread_id.0),
                span_root_ids: roots,
                span_count,
                max_depth,
            });
        }

        let counter_count = read_u32(&mut cursor)?;
        let mut counters = Vec::with_capacity(counter_count as usize);
        for _ in 0..counter_count {
            let name = read_string(&mut cursor)?;
            let sample_count = read_u32(&mut cursor)?;
            let mut samples = Vec::with_capacity(sample_count as usize);
            for _ in 0..sample_count {
                let timestamp_us = read_i64(&mut cursor)?;
                let value = read_f64(&mut cursor)?;
                samples.push(CounterSample { timestamp_us, value });
            }
            counters.push(Counter { name, unit: None, samples });
        }

        let profile = Profile {
            name: None,
            format: ProfileFormat::Tracy,
            start_time_us: 0,
            end_time_us: max_end,
            threads,
            counters,
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

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8, ParseError> {
    cursor.read_u8().map_err(truncated)
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, ParseError> {
    cursor.read_u32::<LittleEndian>().map_err(truncated)
}

fn read_i64(cursor: &mut Cursor<&[u8]>) -> Result<i64, ParseError> {
    cursor.read_i64::<LittleEndian>().map_err(truncated)
}

fn read_f64(cursor: &mut Cursor<&[u8]>) -> Result<f64, ParseError> {
    cursor.read_f64::<LittleEndian>().map_err(truncated)
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> Result<String, ParseError> {
    let len = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let mut buf = vec![0u8; len as usize];
    cursor.read_exact(&mut buf).map_err(truncated)?;
    String::from_utf8(buf).map_err(|_| ParseError::TreeConstructionFailed("non-utf8 name in tracy capture".into()))
}

fn truncated(_: std::io::Error) -> ParseError {
    ParseError::Truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn write_string(buf: &mut Vec<u8>, s: &str) {
        buf.write_u16::<LittleEndian>(s.len() as u16).unwrap();
        buf.write_all(s.as_bytes()).unwrap();
    }

    fn sample_capture() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.write_u32::<LittleEndian>(1).unwrap(); // version
        buf.write_u32::<LittleEndian>(1).unwrap(); // thread_count
        write_string(&mut buf, "Worker");
        buf.write_u32::<LittleEndian>(2).unwrap(); // event_count
        buf.write_u8(0).unwrap();
        buf.write_i64::<LittleEndian>(0).unwrap();
        write_string(&mut buf, "zone_a");
        buf.write_u8(1).unwrap();
        buf.write_i64::<LittleEndian>(500).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap(); // counter_count
        buf
    }

    #[test]
    fn recognizes_magic_bytes() {
        assert!(looks_like_tracy(&sample_capture()));
        assert!(!looks_like_tracy(b"not tracy"));
    }

    #[test]
    fn parses_one_zone() {
        let profile = TracyParser.parse(&sample_capture()).unwrap();
        assert_eq!(profile.threads.len(), 1);
        let span = &profile.span_arena[0];
        assert_eq!(span.end_us, 500);
    }
}
