//! The normalized in-memory profile model every parser builds and every view
//! transform reads.
//!
//! Spans live in one arena per profile (`Profile::span_arena`) and are
//! navigated by index, never by reference, mirroring the teacher's
//! `stack_table`/`frame_table` indirection (`profiler-sdk::schema`) — the
//! difference here is that a profile owns a single flat arena of built spans
//! instead of a per-thread stack tree that has to be walked to materialize a
//! span on every access.

use std::collections::HashMap;

/// Stable identifier of a span within a profile. `0` is reserved for "no
/// span" (e.g. an unselected `SelectedSpan`, a frame with no owning span).
/// Concretely `arena_index + 1`, so converting back to an arena index is a
/// single checked subtraction; see [`Profile::span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct FrameId(pub u64);

impl FrameId {
    pub const NONE: FrameId = FrameId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// `pub(crate)`, not `pub`: only parsers (which build the arena) and this
    /// module's own tests need to mint a `FrameId` from a position; everyone
    /// else receives one already attached to a `Span`.
    pub(crate) fn from_index(index: SpanIndex) -> Self {
        FrameId(index.0 as u64 + 1)
    }

    fn to_index(self) -> Option<SpanIndex> {
        self.0.checked_sub(1).map(|i| SpanIndex(i as usize))
    }
}

/// Arena index into `Profile::span_arena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanIndex(pub usize);

/// Opaque thread identifier, stable within a single profile (not across
/// profiles in a session — see `Session::aligned_time`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ThreadId(pub u64);

/// A tiny hand-rolled bitflags macro: the corpus doesn't pull in the
/// `bitflags` crate for anything this small, so the flag set is implemented
/// directly rather than adding a dependency for three bits.
macro_rules! bitflags_lite {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(const $flag:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub $ty);

        impl $name {
            pub const EMPTY: $name = $name(0);
            $(pub const $flag: $name = $name($value);)*

            pub fn contains(self, other: $name) -> bool {
                (self.0 & other.0) == other.0
            }

            pub fn insert(&mut self, other: $name) {
                self.0 |= other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }
    };
}

bitflags_lite! {
    /// Boolean attributes of a span that don't warrant their own field.
    pub struct SpanFlags: u8 {
        const ASYNC      = 0b0001;
        const FRAME_COST = 0b0010;
        const MARKER     = 0b0100;
    }
}

/// A time-bounded unit of work within a thread.
///
/// Invariants (checked by [`crate::model::validate`]):
/// - `start_us <= end_us`
/// - `depth(child) == depth(parent) + 1`
/// - children are sorted by `start_us` and non-overlapping
/// - `self_time_us == (end_us - start_us) - sum(child durations)`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub frame_id: FrameId,
    pub parent: Option<SpanIndex>,
    pub first_child: Option<SpanIndex>,
    pub next_sibling: Option<SpanIndex>,
    pub name: StringId,
    pub category: Option<StringId>,
    pub thread_id: ThreadId,
    pub depth: u16,
    pub start_us: i64,
    pub end_us: i64,
    pub self_time_us: i64,
    pub flags: SpanFlags,
}

impl Span {
    pub fn duration_us(&self) -> i64 {
        self.end_us - self.start_us
    }
}

// `Option<SpanIndex>` needs its own (de)serialization since `SpanIndex` is a
// plain newtype without derive support for serde on tuple structs holding
// `usize` across arena boundaries; using serde's derive directly on the
// newtype is sufficient, so these impls just forward.
impl serde::Serialize for SpanIndex {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(self.0 as u64)
    }
}

impl<'de> serde::Deserialize<'de> for SpanIndex {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(SpanIndex(u64::deserialize(d)? as usize))
    }
}

/// Index into `Profile::strings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct StringId(pub u32);

/// Per-profile name interning table. Parsers intern every span/func/category
/// name through this so the arena stores a 4-byte index instead of a heap
/// string per span, grounded on the teacher's shared `string_array` +
/// per-table index columns (`profiler-sdk::schema`).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StringTable {
    strings: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, StringId>,
}

impl StringTable {
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = StringId(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), id);
        id
    }

    pub fn resolve(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Rebuilds the dedup index after a round-trip deserialize, where the
    /// `HashMap` was skipped. Call before interning further names into a
    /// table that was just deserialized.
    pub fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, s) in self.strings.iter().enumerate() {
            self.index.insert(s.clone(), StringId(i as u32));
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub name: String,
    /// Orders threads in the UI; lower sorts first. Assigned by the parser
    /// from (name, id) so sorting is stable across re-parses.
    pub sort_key: (String, u64),
    pub span_root_ids: Vec<SpanIndex>,
    pub span_count: usize,
    pub max_depth: u16,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct CounterSample {
    pub timestamp_us: i64,
    pub value: f64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Counter {
    pub name: String,
    pub unit: Option<String>,
    /// Sorted by `timestamp_us`.
    pub samples: Vec<CounterSample>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Marker {
    pub timestamp_us: i64,
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AsyncSpan {
    pub id: u64,
    pub name: String,
    pub start_us: i64,
    pub end_us: i64,
    pub origin_thread: Option<ThreadId>,
    pub target_thread: Option<ThreadId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FrameClassification {
    Good,
    Warning,
    Dropped,
}

/// A vsync/display frame boundary, distinct from [`FrameId`] (a span
/// identity) and from `RenderCommand` (a draw instruction) — named
/// `RenderFrame` here purely to keep those three uses of "frame" from
/// colliding in code, per spec.md §3's `Frame` entity.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RenderFrame {
    pub index: u32,
    pub start_us: i64,
    pub end_us: i64,
    pub budget_us: i64,
    pub classification: FrameClassification,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FlowEdge {
    pub name: String,
    pub from_ts: i64,
    pub from_tid: ThreadId,
    pub to_ts: i64,
    pub to_tid: ThreadId,
}

/// The source format a `Profile` was parsed from, carried through so exports
/// and diagnostics can report provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProfileFormat {
    ChromeTrace,
    FirefoxGecko,
    Speedscope,
    V8CpuProfile,
    Pprof,
    Pix,
    Tracy,
    PerfScript,
    CollapsedStacks,
    ReactDevTools,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub format: ProfileFormat,
    pub start_time_us: i64,
    pub end_time_us: i64,
    pub threads: Vec<Thread>,
    pub counters: Vec<Counter>,
    pub markers: Vec<Marker>,
    pub async_spans: Vec<AsyncSpan>,
    pub frames: Vec<RenderFrame>,
    pub flow_edges: Vec<FlowEdge>,
    pub span_arena: Vec<Span>,
    pub strings: StringTable,
}

impl Profile {
    pub fn span(&self, id: FrameId) -> Option<&Span> {
        id.to_index().and_then(|idx| self.span_arena.get(idx.0))
    }

    pub fn span_by_index(&self, index: SpanIndex) -> &Span {
        &self.span_arena[index.0]
    }

    pub fn frame_id_of(&self, index: SpanIndex) -> FrameId {
        FrameId::from_index(index)
    }

    pub fn name_of(&self, span: &Span) -> &str {
        self.strings.resolve(span.name)
    }

    pub fn parent(&self, span: &Span) -> Option<&Span> {
        span.parent.map(|idx| self.span_by_index(idx))
    }

    pub fn children(&self, span: &Span) -> impl Iterator<Item = &Span> {
        struct Children<'p> {
            profile: &'p Profile,
            next: Option<SpanIndex>,
        }
        impl<'p> Iterator for Children<'p> {
            type Item = &'p Span;
            fn next(&mut self) -> Option<&'p Span> {
                let idx = self.next?;
                let span = self.profile.span_by_index(idx);
                self.next = span.next_sibling;
                Some(span)
            }
        }
        Children {
            profile: self,
            next: span.first_child,
        }
    }

    pub fn duration_us(&self) -> i64 {
        self.end_time_us - self.start_time_us
    }

    /// A derived display label: the profile's own name, or a positional
    /// fallback for formats that carry none (most sampled formats don't).
    pub fn label(&self, position: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Profile {}", position + 1))
    }
}

/// Checks the invariants spec.md §8 requires to hold after every command.
/// Returns the first violation found, or `None` if the profile is well
/// formed. Parsers call this before returning; the façade never needs to,
/// since profiles are immutable after construction.
pub fn validate(profile: &Profile) -> Result<(), String> {
    if profile.start_time_us > profile.end_time_us {
        return Err("profile start_time_us > end_time_us".into());
    }
    for (i, span) in profile.span_arena.iter().enumerate() {
        if span.start_us > span.end_us {
            return Err(format!("span {i}: start_us > end_us"));
        }
        if span.start_us < profile.start_time_us || span.end_us > profile.end_time_us {
            return Err(format!("span {i}: out of profile time range"));
        }
        if let Some(parent_idx) = span.parent {
            let parent = profile.span_by_index(parent_idx);
            if span.depth != parent.depth + 1 {
                return Err(format!("span {i}: depth != parent.depth + 1"));
            }
            if span.start_us < parent.start_us || span.end_us > parent.end_us {
                return Err(format!("span {i}: not contained in parent's interval"));
            }
        } else if span.depth != 0 {
            return Err(format!("span {i}: root span with nonzero depth"));
        }
    }
    for thread in &profile.threads {
        let mut prev_end: Option<i64> = None;
        for &root in &thread.span_root_ids {
            let span = profile.span_by_index(root);
            if let Some(prev) = prev_end {
                if prev > span.start_us {
                    return Err(format!("thread {:?}: root spans overlap", thread.id));
                }
            }
            prev_end = Some(span.end_us);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> Profile {
        let mut strings = StringTable::default();
        let name_a = strings.intern("A");
        let name_b = strings.intern("B");
        let name_c = strings.intern("C");

        // A(0..1000) with children B(100..400), C(500..900); self_time(A)=300.
        let span_arena = vec![
            Span {
                frame_id: FrameId::from_index(SpanIndex(0)),
                parent: None,
                first_child: Some(SpanIndex(1)),
                next_sibling: None,
                name: name_a,
                category: None,
                thread_id: ThreadId(1),
                depth: 0,
                start_us: 0,
                end_us: 1000,
                self_time_us: 300,
                flags: SpanFlags::EMPTY,
            },
            Span {
                frame_id: FrameId::from_index(SpanIndex(1)),
                parent: Some(SpanIndex(0)),
                first_child: None,
                next_sibling: Some(SpanIndex(2)),
                name: name_b,
                category: None,
                thread_id: ThreadId(1),
                depth: 1,
                start_us: 100,
                end_us: 400,
                self_time_us: 300,
                flags: SpanFlags::EMPTY,
            },
            Span {
                frame_id: FrameId::from_index(SpanIndex(2)),
                parent: Some(SpanIndex(0)),
                first_child: None,
                next_sibling: None,
                name: name_c,
                category: None,
                thread_id: ThreadId(1),
                depth: 1,
                start_us: 500,
                end_us: 900,
                self_time_us: 400,
                flags: SpanFlags::EMPTY,
            },
        ];

        Profile {
            name: None,
            format: ProfileFormat::ChromeTrace,
            start_time_us: 0,
            end_time_us: 1000,
            threads: vec![Thread {
                id: ThreadId(1),
                name: "main".into(),
                sort_key: ("main".into(), 1),
                span_root_ids: vec![SpanIndex(0)],
                span_count: 3,
                max_depth: 1,
            }],
            counters: vec![],
            markers: vec![],
            async_spans: vec![],
            frames: vec![],
            flow_edges: vec![],
            span_arena,
            strings,
        }
    }

    #[test]
    fn frame_id_round_trips_through_arena_index() {
        let id = FrameId::from_index(SpanIndex(41));
        assert_eq!(id.to_index(), Some(SpanIndex(41)));
        assert!(FrameId::NONE.is_none());
    }

    #[test]
    fn validates_well_formed_profile() {
        assert!(validate(&sample_profile()).is_ok());
    }

    #[test]
    fn children_iterator_walks_siblings() {
        let profile = sample_profile();
        let root = profile.span_by_index(SpanIndex(0));
        let names: Vec<&str> = profile
            .children(root)
            .map(|s| profile.name_of(s))
            .collect();
        assert_eq!(names, vec!["B", "C"]);
    }

    #[test]
    fn rejects_span_outside_profile_range() {
        let mut profile = sample_profile();
        profile.span_arena[1].end_us = 5000;
        assert!(validate(&profile).is_err());
    }
}
