//! Shared span-tree construction, factored out so every format module
//! translates to one of two small event streams instead of each
//! reimplementing tree reconciliation: per spec.md §9, "factor a small,
//! shared span-tree builder that consumes a stream of (begin/end/sample)
//! events; format modules translate to that stream."

use std::collections::HashMap;

use crate::error::ParseError;
use crate::model::{FrameId, Span, SpanFlags, SpanIndex, StringId, StringTable, ThreadId};

/// One begin/end pair event, already demultiplexed to a single thread by
/// the calling format module.
pub enum ThreadEvent {
    Begin {
        ts_us: i64,
        name: String,
        category: Option<String>,
        flags: SpanFlags,
    },
    End {
        ts_us: i64,
    },
}

/// Builds the `span_arena` for a whole profile across however many threads
/// call into it. Threads are built one at a time; a thread's spans occupy a
/// contiguous range of the arena in the order they were closed/flattened.
#[derive(Default)]
pub struct SpanTreeBuilder {
    pub arena: Vec<Span>,
}

impl SpanTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles a stream of well-nested `Begin`/`End` events (Chrome's
    /// `B`/`E`, or a flat `X` duration translated to a `Begin`+`End` pair by
    /// the caller) into a span tree for `thread_id`. Returns that thread's
    /// root span indices, in the order their opening events occurred.
    pub fn build_from_events(
        &mut self,
        thread_id: ThreadId,
        strings: &mut StringTable,
        events: &[ThreadEvent],
    ) -> Result<Vec<SpanIndex>, ParseError> {
        let mut open: Vec<SpanIndex> = Vec::new();
        let mut roots: Vec<SpanIndex> = Vec::new();
        let mut last_child: HashMap<SpanIndex, SpanIndex> = HashMap::new();

        for event in events {
            match event {
                ThreadEvent::Begin { ts_us, name, category, flags } => {
                    let name_id = strings.intern(name);
                    let category_id = category.as_deref().map(|c| strings.intern(c));
                    let parent = open.last().copied();
                    let depth = parent.map(|p| self.arena[p.0].depth + 1).unwrap_or(0);

                    let idx = SpanIndex(self.arena.len());
                    self.arena.push(Span {
                        frame_id: FrameId::from_index(idx),
                        parent,
                        first_child: None,
                        next_sibling: None,
                        name: name_id,
                        category: category_id,
                        thread_id,
                        depth,
                        start_us: *ts_us,
                        end_us: *ts_us,
                        self_time_us: 0,
                        flags: *flags,
                    });
                    self.link_child(parent, idx, &mut roots, &mut last_child);
                    open.push(idx);
                }
                ThreadEvent::End { ts_us } => {
                    let idx = open.pop().ok_or_else(|| {
                        ParseError::TreeConstructionFailed("end event with no matching begin".into())
                    })?;
                    self.arena[idx.0].end_us = *ts_us;
                }
            }
        }
        if !open.is_empty() {
            return Err(ParseError::TreeConstructionFailed("unclosed span at end of trace".into()));
        }

        finalize_self_time(&mut self.arena, &roots);
        Ok(roots)
    }

    /// Reconstructs spans from sampled stacks: "consecutive samples sharing
    /// a prefix extend the spans at those prefix depths; the first
    /// differing frame closes the previous span and opens a new one"
    /// (spec.md §4.1). `stacks` are root-first (`stacks[i][0]` is the
    /// outermost frame). The last sample's spans are closed at
    /// `last_ts + sample_period_us`, approximating their duration as
    /// sampling-period × sample-count at that depth.
    pub fn build_from_samples(
        &mut self,
        thread_id: ThreadId,
        strings: &mut StringTable,
        samples: &[(i64, Vec<String>)],
        sample_period_us: i64,
    ) -> Vec<SpanIndex> {
        let mut roots: Vec<SpanIndex> = Vec::new();
        let mut last_child: HashMap<SpanIndex, SpanIndex> = HashMap::new();
        // `open[d]` is the span currently representing depth `d`.
        let mut open: Vec<SpanIndex> = Vec::new();
        let mut prev_stack: Vec<StringId> = Vec::new();

        for (ts, stack) in samples {
            let interned: Vec<StringId> = stack.iter().map(|s| strings.intern(s)).collect();
            let shared = common_prefix_len(&prev_stack, &interned);

            for depth in (shared..open.len()).rev() {
                self.arena[open[depth].0].end_us = *ts;
            }
            open.truncate(shared);

            for (depth, name_id) in interned.iter().enumerate().skip(shared) {
                let parent = open.last().copied();
                let idx = SpanIndex(self.arena.len());
                self.arena.push(Span {
                    frame_id: FrameId::from_index(idx),
                    parent,
                    first_child: None,
                    next_sibling: None,
                    name: *name_id,
                    category: None,
                    thread_id,
                    depth: depth as u16,
                    start_us: *ts,
                    end_us: *ts,
                    self_time_us: 0,
                    flags: SpanFlags::EMPTY,
                });
                self.link_child(parent, idx, &mut roots, &mut last_child);
                open.push(idx);
            }
            prev_stack = interned;
        }

        let last_ts = samples.last().map(|(ts, _)| *ts).unwrap_or(0);
        for idx in &open {
            self.arena[idx.0].end_us = last_ts + sample_period_us;
        }

        finalize_self_time(&mut self.arena, &roots);
        roots
    }

    fn link_child(
        &mut self,
        parent: Option<SpanIndex>,
        child: SpanIndex,
        roots: &mut Vec<SpanIndex>,
        last_child: &mut HashMap<SpanIndex, SpanIndex>,
    ) {
        match parent {
            None => roots.push(child),
            Some(p) => {
                if let Some(&prev) = last_child.get(&p) {
                    self.arena[prev.0].next_sibling = Some(child);
                } else {
                    self.arena[p.0].first_child = Some(child);
                }
                last_child.insert(p, child);
            }
        }
    }
}

fn common_prefix_len(a: &[StringId], b: &[StringId]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// `self_time(span) = duration(span) - sum(duration(direct child))`, walked
/// bottom-up over each thread's roots via post-order DFS so every child's
/// duration is known before its parent's self-time is computed.
fn finalize_self_time(arena: &mut [Span], roots: &[SpanIndex]) {
    for &root in roots {
        finalize_subtree(arena, root);
    }
}

fn finalize_subtree(arena: &mut [Span], idx: SpanIndex) {
    let mut child = arena[idx.0].first_child;
    let mut children_duration = 0i64;
    while let Some(c) = child {
        finalize_subtree(arena, c);
        children_duration += arena[c.0].duration_us();
        child = arena[c.0].next_sibling;
    }
    let span = &mut arena[idx.0];
    span.self_time_us = span.duration_us() - children_duration;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_build_nested_tree_with_correct_self_time() {
        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let events = vec![
            ThreadEvent::Begin { ts_us: 0, name: "A".into(), category: None, flags: SpanFlags::EMPTY },
            ThreadEvent::Begin { ts_us: 100, name: "B".into(), category: None, flags: SpanFlags::EMPTY },
            ThreadEvent::End { ts_us: 400 },
            ThreadEvent::Begin { ts_us: 500, name: "C".into(), category: None, flags: SpanFlags::EMPTY },
            ThreadEvent::End { ts_us: 900 },
            ThreadEvent::End { ts_us: 1000 },
        ];
        let roots = builder.build_from_events(ThreadId(1), &mut strings, &events).unwrap();
        assert_eq!(roots.len(), 1);
        let a = &builder.arena[roots[0].0];
        assert_eq!(a.self_time_us, 300);
        assert_eq!(a.duration_us(), 1000);
    }

    #[test]
    fn unmatched_end_is_a_tree_construction_error() {
        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let events = vec![ThreadEvent::End { ts_us: 0 }];
        assert!(matches!(
            builder.build_from_events(ThreadId(1), &mut strings, &events),
            Err(ParseError::TreeConstructionFailed(_))
        ));
    }

    #[test]
    fn samples_merge_shared_prefix_into_one_span() {
        let mut strings = StringTable::default();
        let mut builder = SpanTreeBuilder::new();
        let samples = vec![
            (0, vec!["main".to_string(), "foo".to_string()]),
            (10, vec!["main".to_string(), "foo".to_string()]),
            (20, vec!["main".to_string(), "bar".to_string()]),
        ];
        let roots = builder.build_from_samples(ThreadId(1), &mut strings, &samples, 10);
        assert_eq!(roots.len(), 1);
        let main = &builder.arena[roots[0].0];
        assert_eq!(main.duration_us(), 30);
        assert_eq!(main.first_child, Some(SpanIndex(1)));
        let foo = &builder.arena[1];
        assert_eq!(foo.start_us, 0);
        assert_eq!(foo.end_us, 20);
        let bar_idx = foo.next_sibling.unwrap();
        let bar = &builder.arena[bar_idx.0];
        assert_eq!(bar.start_us, 20);
        assert_eq!(bar.end_us, 30);
    }
}
