// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-scanning [`ProfileStore`] (spec.md §1 collaborator table:
//! "profile YAML/TOML parsing"). `fleetd-core::profile` only defines the
//! document shape and the trait; loading a directory of `*.toml` files
//! and deriving each profile's name from its filename is this crate's job.

use std::collections::HashMap;
use std::path::Path;

use fleetd_core::{parse_profile_toml, Profile, ProfileStore};

#[derive(Debug, thiserror::Error)]
pub enum LoadProfilesError {
    #[error("reading profiles directory {0:?}: {1}")]
    ReadDir(std::path::PathBuf, std::io::Error),

    #[error("reading profile file {0:?}: {1}")]
    ReadFile(std::path::PathBuf, std::io::Error),

    #[error("parsing profile file {0:?}: {1}")]
    Parse(std::path::PathBuf, fleetd_core::ProfileError),
}

/// In-memory map of profiles loaded once at startup, keyed by name.
pub struct DirectoryProfileStore {
    profiles: HashMap<String, Profile>,
}

impl DirectoryProfileStore {
    /// Loads every `*.toml` file directly under `dir`. A profile's `name`
    /// is the filename stem, overriding whatever (if anything) the
    /// document itself sets — this mirrors `parse_profile_toml`'s own doc
    /// comment: "collaborators that load profiles from named files derive
    /// [the name] from the filename and set it after parsing".
    ///
    /// A missing directory is not an error: it yields an empty store, so
    /// a fresh state dir with no profiles configured still starts up.
    pub fn load(dir: &Path) -> Result<Self, LoadProfilesError> {
        let mut profiles = HashMap::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self { profiles });
            }
            Err(e) => return Err(LoadProfilesError::ReadDir(dir.to_path_buf(), e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| LoadProfilesError::ReadDir(dir.to_path_buf(), e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            let body = std::fs::read_to_string(&path).map_err(|e| LoadProfilesError::ReadFile(path.clone(), e))?;
            let mut profile = parse_profile_toml(&body).map_err(|e| LoadProfilesError::Parse(path.clone(), e))?;
            profile.name = stem.to_string();
            profiles.insert(profile.name.clone(), profile);
        }
        Ok(Self { profiles })
    }

    pub fn into_map(self) -> HashMap<String, Profile> {
        self.profiles
    }
}

impl ProfileStore for DirectoryProfileStore {
    fn get(&self, name: &str) -> Option<Profile> {
        self.profiles.get(name).cloned()
    }

    fn list(&self) -> Vec<Profile> {
        self.profiles.values().cloned().collect()
    }
}
