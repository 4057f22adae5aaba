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

//! In-memory persistent state.

use charmhook_core::state::validate_state_name;
use charmhook_core::{HookResult, PersistentState};
use std::cell::Cell;
use std::collections::BTreeMap;

/// [`PersistentState`] kept in memory, counting every load and save.
///
/// Names are checked the same way the on-disk store checks them.
#[derive(Debug, Default)]
pub struct MemState {
    records: BTreeMap<String, Vec<u8>>,
    saves: Vec<String>,
    loads: Cell<usize>,
}

impl MemState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes last saved under `name`.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.records.get(name).map(Vec::as_slice)
    }

    /// Seed `name` as if it had been saved by an earlier invocation.
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.records.insert(name.into(), data.into());
    }

    /// Names passed to `save`, in call order.
    pub fn saves(&self) -> &[String] {
        &self.saves
    }

    pub fn load_count(&self) -> usize {
        self.loads.get()
    }

    /// Forget the load and save counts, keeping the records.
    pub fn reset_counts(&mut self) {
        self.saves.clear();
        self.loads.set(0);
    }
}

impl PersistentState for MemState {
    fn save(&mut self, name: &str, data: &[u8]) -> HookResult<()> {
        validate_state_name(name)?;
        self.saves.push(name.to_string());
        self.records.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn load(&self, name: &str) -> HookResult<Option<Vec<u8>>> {
        self.loads.set(self.loads.get() + 1);
        validate_state_name(name)?;
        Ok(self.records.get(name).cloned())
    }
}
