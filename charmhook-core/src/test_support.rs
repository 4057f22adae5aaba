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

//! Minimal fakes for unit tests inside this crate.

use crate::error::{HookError, HookResult};
use crate::runner::ToolRunner;
use crate::state::PersistentState;
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

/// Records every call and answers with empty output.
#[derive(Default)]
pub(crate) struct NullRunner {
    pub calls: Arc<Mutex<Vec<Vec<String>>>>,
    pub closes: Arc<Mutex<usize>>,
    pub fail_close: bool,
}

impl ToolRunner for NullRunner {
    fn run(&mut self, command: &str, args: &[String]) -> HookResult<Vec<u8>> {
        let mut call = vec![command.to_string()];
        call.extend_from_slice(args);
        self.calls.lock().push(call);
        Ok(Vec::new())
    }

    fn close(&mut self) -> HookResult<()> {
        let mut closes = self.closes.lock();
        *closes += 1;
        if *closes > 1 {
            return Err(HookError::RunnerClosedTwice);
        }
        if self.fail_close {
            return Err(HookError::ToolFailed {
                command: "close".to_string(),
                message: "flush failed".to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory state that counts its traffic.
#[derive(Default)]
pub(crate) struct CountingState {
    pub records: HashMap<String, Vec<u8>>,
    pub loads: Cell<usize>,
    pub saves: usize,
    pub fail_save: bool,
    pub fail_load: bool,
}

impl CountingState {
    fn io_error(name: &str, op: &str) -> HookError {
        HookError::StateIo {
            name: name.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, format!("{op} failed")),
        }
    }
}

impl PersistentState for CountingState {
    fn save(&mut self, name: &str, data: &[u8]) -> HookResult<()> {
        self.saves += 1;
        if self.fail_save {
            return Err(Self::io_error(name, "save"));
        }
        self.records.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn load(&self, name: &str) -> HookResult<Option<Vec<u8>>> {
        self.loads.set(self.loads.get() + 1);
        if self.fail_load {
            return Err(Self::io_error(name, "load"));
        }
        Ok(self.records.get(name).cloned())
    }
}
