// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Persistent component state.
//!
//! Every hook runs in a fresh process, so anything a component wants to
//! remember has to go through a [`PersistentState`] store. Each component
//! owns the records under its own name; the store does not police that.

use crate::error::{HookError, HookResult};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable byte storage keyed by component name.
pub trait PersistentState {
    /// Associate `data` with `name`, replacing any earlier value.
    fn save(&mut self, name: &str, data: &[u8]) -> HookResult<()>;

    /// The bytes most recently saved under `name`, or `None` if nothing
    /// was ever saved.
    fn load(&self, name: &str) -> HookResult<Option<Vec<u8>>>;
}

/// Stores each record as a file in a directory.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the record, so a killed process leaves either the old or
/// the new value behind.
#[derive(Debug, Clone)]
pub struct DirState {
    dir: PathBuf,
}

impl DirState {
    /// Open (creating if needed) a state directory.
    pub fn new(dir: impl AsRef<Path>) -> HookResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, name: &str) -> HookResult<PathBuf> {
        validate_state_name(name)?;
        Ok(self.dir.join(name))
    }
}

impl PersistentState for DirState {
    fn save(&mut self, name: &str, data: &[u8]) -> HookResult<()> {
        let path = self.record_path(name)?;
        let io_err = |source| HookError::StateIo {
            name: name.to_string(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(data).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        tracing::debug!(name = %name, bytes = data.len(), "Saved state");
        Ok(())
    }

    fn load(&self, name: &str) -> HookResult<Option<Vec<u8>>> {
        let path = self.record_path(name)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(HookError::StateIo {
                name: name.to_string(),
                source,
            }),
        }
    }
}

/// Check that `name` can key a state record.
///
/// State names become file names, so they are limited to ASCII letters,
/// digits, `.`, `_` and `-`, and may not be empty or start with `.`.
pub fn validate_state_name(name: &str) -> HookResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(HookError::InvalidStateName(name.to_string()))
    }
}
