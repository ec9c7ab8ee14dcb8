//! Holds the ordered set of loaded profiles and their cross-profile time
//! alignment. Grounded on the teacher's `FullStateReader` as "the orchestrator
//! that owns everything else and answers queries against it"
//! (`state-reader::full_state_reader`), generalized from a state cache to a
//! profile list.

use tracing::{debug, info};

use crate::error::SessionError;
use crate::model::Profile;

/// Opaque handle into a [`Session`]'s profile list. Stable for the lifetime
/// of the session (removing a profile does not renumber the others; it
/// leaves a hole that `profile()` reports as `UnknownProfileHandle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileHandle(pub u32);

struct Entry {
    profile: Profile,
    offset_us: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionInfo {
    pub profile_count: usize,
    pub virtual_start_us: i64,
    pub virtual_end_us: i64,
}

#[derive(Debug, Clone)]
pub struct ProfileSummary {
    pub handle: ProfileHandle,
    pub label: String,
    pub offset_us: i64,
}

#[derive(Default)]
pub struct Session {
    entries: Vec<Option<Entry>>,
    next_handle: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an already-parsed profile with zero offset. Parsing itself
    /// happens upstream (see `crate::parsers`); the session only owns the
    /// result, per spec.md's single-threaded cooperative model: the parse
    /// step may run off-thread, but the built `Profile` is delivered here
    /// atomically.
    pub fn add_profile(&mut self, profile: Profile) -> ProfileHandle {
        let handle = ProfileHandle(self.next_handle);
        self.next_handle += 1;
        info!(handle = handle.0, "profile added to session");
        self.entries.push(Some(Entry {
            profile,
            offset_us: 0,
        }));
        handle
    }

    pub fn clear(&mut self) {
        debug!(count = self.entries.len(), "clearing session");
        self.entries.clear();
        self.next_handle = 0;
    }

    pub fn remove_profile(&mut self, handle: ProfileHandle) -> Result<(), SessionError> {
        let slot = self.slot_mut(handle)?;
        *slot = None;
        Ok(())
    }

    pub fn set_offset(&mut self, handle: ProfileHandle, offset_us: i64) -> Result<(), SessionError> {
        self.slot_mut(handle)?.offset_us = offset_us;
        Ok(())
    }

    pub fn profile(&self, handle: ProfileHandle) -> Result<&Profile, SessionError> {
        Ok(&self.slot(handle)?.profile)
    }

    pub fn offset(&self, handle: ProfileHandle) -> Result<i64, SessionError> {
        Ok(self.slot(handle)?.offset_us)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.is_none())
    }

    pub fn handles(&self) -> impl Iterator<Item = ProfileHandle> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|_| ProfileHandle(i as u32)))
    }

    /// Aligned time for profile `p`'s local timestamp `t`:
    /// `t - p.start_time + p.offset`.
    pub fn aligned_time(&self, handle: ProfileHandle, local_us: i64) -> Result<i64, SessionError> {
        let entry = self.slot(handle)?;
        Ok(local_us - entry.profile.start_time_us + entry.offset_us)
    }

    pub fn info(&self) -> Result<SessionInfo, SessionError> {
        if self.is_empty() {
            return Err(SessionError::EmptySession);
        }
        let mut start = i64::MAX;
        let mut end = i64::MIN;
        let mut count = 0;
        for entry in self.entries.iter().flatten() {
            count += 1;
            let aligned_start = entry.offset_us;
            let aligned_end = entry.offset_us + entry.profile.duration_us();
            start = start.min(aligned_start);
            end = end.max(aligned_end);
        }
        Ok(SessionInfo {
            profile_count: count,
            virtual_start_us: start,
            virtual_end_us: end,
        })
    }

    pub fn summaries(&self) -> Vec<ProfileSummary> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                e.as_ref().map(|entry| ProfileSummary {
                    handle: ProfileHandle(i as u32),
                    label: entry.profile.label(i),
                    offset_us: entry.offset_us,
                })
            })
            .collect()
    }

    fn slot(&self, handle: ProfileHandle) -> Result<&Entry, SessionError> {
        self.entries
            .get(handle.0 as usize)
            .and_then(|e| e.as_ref())
            .ok_or(SessionError::UnknownProfileHandle)
    }

    fn slot_mut(&mut self, handle: ProfileHandle) -> Result<&mut Entry, SessionError> {
        self.entries
            .get_mut(handle.0 as usize)
            .and_then(|e| e.as_mut())
            .ok_or(SessionError::UnknownProfileHandle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Profile, ProfileFormat, StringTable};

    fn empty_profile(start: i64, end: i64) -> Profile {
        Profile {
            name: None,
            format: ProfileFormat::ChromeTrace,
            start_time_us: start,
            end_time_us: end,
            threads: vec![],
            counters: vec![],
            markers: vec![],
            async_spans: vec![],
            frames: vec![],
            flow_edges: vec![],
            span_arena: vec![],
            strings: StringTable::default(),
        }
    }

    #[test]
    fn empty_session_errors_on_info() {
        let session = Session::new();
        assert!(matches!(session.info(), Err(SessionError::EmptySession)));
    }

    #[test]
    fn virtual_range_spans_offset_profiles() {
        let mut session = Session::new();
        let a = session.add_profile(empty_profile(0, 1000));
        let b = session.add_profile(empty_profile(0, 500));
        session.set_offset(b, 2000).unwrap();

        let info = session.info().unwrap();
        assert_eq!(info.profile_count, 2);
        assert_eq!(info.virtual_start_us, 0);
        assert_eq!(info.virtual_end_us, 2500);
        let _ = a;
    }

    #[test]
    fn unknown_handle_errors() {
        let session = Session::new();
        assert!(matches!(
            session.profile(ProfileHandle(0)),
            Err(SessionError::UnknownProfileHandle)
        ));
    }
}
