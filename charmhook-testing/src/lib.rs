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

//! Test utilities for charmhook components.
//!
//! ```rust,ignore
//! use charmhook_testing::HookHarness;
//!
//! let mut harness = HookHarness::new(|r| my_charm::register(r))
//!     .with_config("port", 8080);
//! harness.run_hook("config-changed", None, None)?;
//! assert_eq!(harness.record(), vec![vec!["open-port", "8080/tcp"]]);
//! ```

mod harness;
mod runner;
mod state;

pub use harness::{HookHarness, CHARM_DIR, UNIT, UUID};
pub use runner::{Recording, RecordingRunner, RunFn};
pub use state::MemState;
