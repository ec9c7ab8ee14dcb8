//! JSON export/import. The schema is `{ "version": 1, "profile": <Profile> }`
//! for a single profile, or `{ "version": 1, "profiles": [...] }` for a whole
//! session; both are exactly `Profile`'s own derived `serde` shape (spec.md
//! §6 calls for fields "mirroring §3's Profile, plus a version integer"), so
//! load → export → load round-trips losslessly with no hand-written mapping
//! layer to drift out of sync with the model.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::ExportError;
use crate::model::Profile;
use crate::session::Session;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ProfileDocument {
    version: u32,
    profile: Profile,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionEntry {
    offset_us: i64,
    profile: Profile,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionDocument {
    version: u32,
    profiles: Vec<SessionEntry>,
}

pub fn export_profile(profile: &Profile) -> Result<String, ExportError> {
    let doc = ProfileDocument {
        version: SCHEMA_VERSION,
        profile: profile.clone(),
    };
    let json = serde_json::to_string_pretty(&doc).inspect_err(|e| {
        error!(error = %e, "failed to serialize profile to json");
    })?;
    debug!(bytes = json.len(), "exported profile json");
    Ok(json)
}

pub fn import_profile(json: &str) -> Result<Profile, ExportError> {
    let mut doc: ProfileDocument = serde_json::from_str(json)?;
    doc.profile.strings.rebuild_index();
    Ok(doc.profile)
}

pub fn export_session(session: &Session) -> Result<String, ExportError> {
    let mut profiles = Vec::new();
    for handle in session.handles() {
        let profile = session.profile(handle).map_err(|_| ExportError::NoProfileLoaded)?;
        let offset_us = session.offset(handle).map_err(|_| ExportError::NoProfileLoaded)?;
        profiles.push(SessionEntry {
            offset_us,
            profile: profile.clone(),
        });
    }
    let profile_count = profiles.len();
    let doc = SessionDocument {
        version: SCHEMA_VERSION,
        profiles,
    };
    let json = serde_json::to_string_pretty(&doc).inspect_err(|e| {
        error!(error = %e, "failed to serialize session to json");
    })?;
    debug!(profile_count, "exported session json");
    Ok(json)
}

pub fn import_session(json: &str) -> Result<Vec<(i64, Profile)>, ExportError> {
    let doc: SessionDocument = serde_json::from_str(json)?;
    Ok(doc
        .profiles
        .into_iter()
        .map(|mut e| {
            e.profile.strings.rebuild_index();
            (e.offset_us, e.profile)
        })
        .collect())
}
