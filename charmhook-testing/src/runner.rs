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

//! Fake hook tool runner.

use charmhook_core::runner::tools;
use charmhook_core::{HookError, HookResult, ToolRunner};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Answers tool calls that are not handled by the runner itself.
pub type RunFn = dyn FnMut(&str, &[String]) -> HookResult<Vec<u8>>;

/// Everything a [`RecordingRunner`] observed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Recording {
    /// Tool calls as `[command, args...]`, in call order.
    pub record: Vec<Vec<String>>,
    /// Messages sent with `juju-log`.
    pub logs: Vec<String>,
    /// Whether the runner has been closed.
    pub closed: bool,
}

/// [`ToolRunner`] for tests.
///
/// - `juju-log` takes exactly one argument, which goes to [`Recording::logs`]
/// - `config-get` is answered from the configured config map
/// - `unit-get` is answered from the configured addresses
///
/// Every other call is appended to [`Recording::record`] and answered by
/// the run function, or with empty output when there is none. None of the
/// three tools above ever appear in the record.
pub struct RecordingRunner {
    config: Map<String, Value>,
    public_address: String,
    private_address: String,
    run_fn: Option<Arc<Mutex<Box<RunFn>>>>,
    recording: Arc<Mutex<Recording>>,
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            config: Map::new(),
            public_address: String::new(),
            private_address: String::new(),
            run_fn: None,
            recording: Arc::new(Mutex::new(Recording::default())),
        }
    }

    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = config;
        self
    }

    pub fn with_addresses(
        mut self,
        public_address: impl Into<String>,
        private_address: impl Into<String>,
    ) -> Self {
        self.public_address = public_address.into();
        self.private_address = private_address.into();
        self
    }

    pub fn with_run_fn(
        mut self,
        run_fn: impl FnMut(&str, &[String]) -> HookResult<Vec<u8>> + 'static,
    ) -> Self {
        self.run_fn = Some(Arc::new(Mutex::new(Box::new(run_fn))));
        self
    }

    pub(crate) fn with_shared(
        mut self,
        run_fn: Option<Arc<Mutex<Box<RunFn>>>>,
        recording: Arc<Mutex<Recording>>,
    ) -> Self {
        self.run_fn = run_fn;
        self.recording = recording;
        self
    }

    /// Handle on what this runner observes; stays valid after the runner
    /// has been moved into a context.
    pub fn recording(&self) -> Arc<Mutex<Recording>> {
        self.recording.clone()
    }

    fn config_get(&self, args: &[String]) -> HookResult<Vec<u8>> {
        let value = match tools::config_get_key(args) {
            Some(key) => self.config.get(key).cloned().unwrap_or(Value::Null),
            None => Value::Object(self.config.clone()),
        };
        Ok(serde_json::to_vec(&value)?)
    }

    fn unit_get(&self, args: &[String]) -> HookResult<Vec<u8>> {
        match args {
            [attr] if attr == tools::PUBLIC_ADDRESS => Ok(self.public_address.clone().into_bytes()),
            [attr] if attr == tools::PRIVATE_ADDRESS => Ok(self.private_address.clone().into_bytes()),
            [attr] => Err(HookError::invalid_args(tools::UNIT_GET, format!("unknown attribute {attr:?}"))),
            _ => Err(HookError::invalid_args(
                tools::UNIT_GET,
                format!("expected exactly one argument, got {}", args.len()),
            )),
        }
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&mut self, command: &str, args: &[String]) -> HookResult<Vec<u8>> {
        match command {
            tools::JUJU_LOG => {
                let [message] = args else {
                    return Err(HookError::invalid_args(
                        tools::JUJU_LOG,
                        format!("expected exactly one argument, got {}", args.len()),
                    ));
                };
                tracing::info!(target: "charmhook_testing::juju_log", "{}", message);
                self.recording.lock().logs.push(message.clone());
                return Ok(Vec::new());
            }
            tools::CONFIG_GET => return self.config_get(args),
            tools::UNIT_GET => return self.unit_get(args),
            _ => {}
        }

        let mut call = Vec::with_capacity(args.len() + 1);
        call.push(command.to_string());
        call.extend_from_slice(args);
        self.recording.lock().record.push(call);

        match &self.run_fn {
            Some(run_fn) => {
                let mut run_fn = run_fn.lock();
                (&mut **run_fn)(command, args)
            }
            None => Ok(Vec::new()),
        }
    }

    fn close(&mut self) -> HookResult<()> {
        let mut recording = self.recording.lock();
        if recording.closed {
            return Err(HookError::RunnerClosedTwice);
        }
        recording.closed = true;
        Ok(())
    }
}
