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

//! Hook tool invocation.
//!
//! Everything a hook learns from or tells the agent goes through a fixed
//! vocabulary of hook tools (`config-get`, `relation-set`, ...). The
//! [`ToolRunner`] trait is the seam between the framework and whatever
//! actually carries those calls: child processes in production
//! ([`ExecRunner`]) or an in-memory recorder in tests.

mod exec;

pub use exec::ExecRunner;

use crate::error::HookResult;

/// Invokes hook tools on behalf of a single hook invocation.
pub trait ToolRunner {
    /// Run `command` with positional `args` and return its raw output.
    ///
    /// Empty output is a success; only a failure of the tool itself is an
    /// error.
    fn run(&mut self, command: &str, args: &[String]) -> HookResult<Vec<u8>>;

    /// Flush and release the runner.
    ///
    /// Must be called exactly once. A second call returns
    /// [`HookError::RunnerClosedTwice`](crate::error::HookError::RunnerClosedTwice).
    fn close(&mut self) -> HookResult<()>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for Box<R> {
    fn run(&mut self, command: &str, args: &[String]) -> HookResult<Vec<u8>> {
        (**self).run(command, args)
    }

    fn close(&mut self) -> HookResult<()> {
        (**self).close()
    }
}

/// Names and argument shapes of the hook tools.
pub mod tools {
    pub const JUJU_LOG: &str = "juju-log";
    pub const CONFIG_GET: &str = "config-get";
    pub const UNIT_GET: &str = "unit-get";
    pub const RELATION_IDS: &str = "relation-ids";
    pub const RELATION_LIST: &str = "relation-list";
    pub const RELATION_GET: &str = "relation-get";
    pub const RELATION_SET: &str = "relation-set";
    pub const OPEN_PORT: &str = "open-port";
    pub const CLOSE_PORT: &str = "close-port";

    pub const PUBLIC_ADDRESS: &str = "public-address";
    pub const PRIVATE_ADDRESS: &str = "private-address";

    fn json_format() -> Vec<String> {
        vec!["--format".to_string(), "json".to_string()]
    }

    /// `config-get --format json` or `config-get --format json -- <key>`.
    pub fn config_get_args(key: Option<&str>) -> Vec<String> {
        let mut args = json_format();
        if let Some(key) = key {
            args.push("--".to_string());
            args.push(key.to_string());
        }
        args
    }

    /// Extracts the key from `config-get` arguments; `None` asks for the
    /// whole configuration.
    pub fn config_get_key(args: &[String]) -> Option<&str> {
        if args.len() < 4 {
            None
        } else {
            Some(args[3].as_str())
        }
    }

    pub fn relation_ids_args(relation_name: &str) -> Vec<String> {
        let mut args = json_format();
        args.push(relation_name.to_string());
        args
    }

    pub fn relation_list_args(relation_id: &str) -> Vec<String> {
        let mut args = json_format();
        args.extend(["-r".to_string(), relation_id.to_string()]);
        args
    }

    pub fn relation_get_args(relation_id: &str, unit: &str) -> Vec<String> {
        let mut args = json_format();
        args.extend([
            "-r".to_string(),
            relation_id.to_string(),
            "-".to_string(),
            unit.to_string(),
        ]);
        args
    }

    /// `relation-set -r <id> k=v ...`; an empty value unsets the key.
    pub fn relation_set_args<'a>(
        relation_id: &str,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Vec<String> {
        let mut args = vec!["-r".to_string(), relation_id.to_string()];
        args.extend(pairs.into_iter().map(|(k, v)| format!("{}={}", k, v)));
        args
    }

    pub fn port_args(port: u16, protocol: &str) -> Vec<String> {
        vec![format!("{}/{}", port, protocol)]
    }
}
