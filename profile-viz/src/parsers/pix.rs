//! PIX GPU capture, common-subset binary encoding (CPU-side timing events
//! plus frame boundaries; no GPU counters, resource barriers, or shader
//! debug data). See [`super::tracy`] for the same capability-flag approach
//! applied to the other binary format.
//!
//! Layout (all integers little-endian via `byteorder`):
//! ```text
//! magic:         4 bytes, b"PIXC"
//! version:       u32
//! thread_count:  u32
//! thread* {
//!     name_len:  u16
//!     name:      name_len bytes, utf8
//!     event_count: u32
//!     event* {
//!         kind:  u8      (0 = begin, 1 = end)
//!         ts_us: i64
//!         name_len: u16  (present only when kind == 0)
//!         name:  name_len bytes, utf8
//!     }
//! }
//! frame_count:   u32
//! frame* { index: u32, start_us: i64, end_us: i64, budget_us: i64, classification: u8 }
//! ```

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::ParseError;
use crate::model::{
    FrameClassification, Profile, ProfileFormat, RenderFrame, SpanFlags, StringTable, Thread, ThreadId,
};

use super::builder::{SpanTreeBuilder, ThreadEvent};
use super::{FormatCapabilities, Parser};

pub struct PixParser;

const MAGIC: &[u8; 4] = b"PIXC";

pub fn looks_like_pix(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

impl Parser for PixParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::Pix
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities { spans: true, frames: true, ..FormatCapabilities::NONE }
    }

    fn parse(&self, bytes: &[u8]) -> Result<Profile, ParseError> {
        if !looks_like_pix(bytes) {
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
                        return Err(ParseError::TreeConstructionFailed(format!("unknown pix event kind {other}")))
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

        let frame_count = read_u32(&mut cursor)?;
        let mut frames = Vec::with_capacity(frame_count as usize);
        for _ in 0..frame_count {
            let index = read_u32(&mut cursor)?;
            let start_us = read_i64(&mut cursor)?;
            let end_us = read_i64(&mut cursor)?;
            let budget_us = read_i64(&mut cursor)?;
            let classification = match read_u8(&mut cursor)? {
                0 => FrameClassification::Good,
                1 => FrameClassification::Warning,
                2 => FrameClassification::Dropped,
                other => {
                    return Err(ParseError::TreeConstructionFailed(format!(
                        "unknown pix frame classification {other}"
                    )))
                }
            };
            max_end = max_end.max(end_us);
            frames.push(RenderFrame { index, start_us, end_us, budget_us, classification });
        }

        let profile = Profile {
            name: None,
            format: ProfileFormat::Pix,
            start_time_us: 0,
            end_time_us: max_end,
            threads,
            counters: vec![],
            markers: vec![],
            async_spans: vec![],
            frames,
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

fn read_string(cursor: &mut Cursor<&[u8]>) -> Result<String, ParseError> {
    let len = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let mut buf = vec![0u8; len as usize];
    cursor.read_exact(&mut buf).map_err(truncated)?;
    String::from_utf8(buf).map_err(|_| ParseError::TreeConstructionFailed("non-utf8 name in pix capture".into()))
}

fn truncated(_: std::io::Error) -> ParseError {
    ParseError::Truncated
}
