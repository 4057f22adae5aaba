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

//! Runs hook tools as child processes.

use super::ToolRunner;
use crate::error::{HookError, HookResult};
use std::path::PathBuf;
use std::process::Command;

/// Tool runner that executes each hook tool as a child process.
///
/// With a tools directory configured the tool is `<dir>/<command>`,
/// otherwise it is looked up on `PATH` (the agent puts its tools there
/// for the duration of a hook).
#[derive(Debug, Default)]
pub struct ExecRunner {
    tools_dir: Option<PathBuf>,
    closed: bool,
}

impl ExecRunner {
    pub fn new(tools_dir: Option<PathBuf>) -> Self {
        Self {
            tools_dir,
            closed: false,
        }
    }

    fn program(&self, command: &str) -> PathBuf {
        match &self.tools_dir {
            Some(dir) => dir.join(command),
            None => PathBuf::from(command),
        }
    }
}

impl ToolRunner for ExecRunner {
    fn run(&mut self, command: &str, args: &[String]) -> HookResult<Vec<u8>> {
        let program = self.program(command);
        tracing::debug!(command = %command, args = ?args, "Running hook tool");

        let output = Command::new(&program)
            .args(args)
            .output()
            .map_err(|e| HookError::ToolFailed {
                command: command.to_string(),
                message: format!("cannot execute {}: {}", program.display(), e),
            })?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(HookError::ToolFailed {
                command: command.to_string(),
                message: format!("{}: {}", output.status, stderr.trim()),
            })
        }
    }

    fn close(&mut self) -> HookResult<()> {
        if self.closed {
            return Err(HookError::RunnerClosedTwice);
        }
        self.closed = true;
        Ok(())
    }
}
