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

//! # charmhook-core
//!
//! Hook execution framework for charmed service units.
//!
//! The agent runs one short-lived process per hook. Inside it, components
//! registered on a [`HookRegistry`] get a [`Context`] describing the unit
//! and its relations, run in registration order, and may persist a blob of
//! state that is handed back to them the next time they run.
//!
//! ## Crate layout
//!
//! - [`hooks`]: registry, handlers and the dispatcher
//! - [`context`]: per-invocation view of the unit and its hook tools
//! - [`relation`]: relation ids, units and settings
//! - [`state`]: persisted handler state
//! - [`runner`]: the hook tool transport
//! - [`entry`]: `main` for a charm binary

pub mod config;
pub mod context;
pub mod entry;
pub mod error;
pub mod hooks;
pub mod relation;
pub mod runner;
pub mod state;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use config::{HookConfig, HookEnv};
pub use context::{Context, ContextBuilder};
pub use entry::run_main;
pub use error::{ErrorKind, HookError, HookResult};
pub use hooks::{
    register_main_hooks, CallbackHandler, DispatchReport, HookDispatcher, HookHandler,
    HookRegistry, JsonStateHandler, NoOpHandler, StateUpdate,
};
pub use relation::{RelationId, RelationSnapshot, RelationUnits, Settings, UnitId};
pub use runner::{ExecRunner, ToolRunner};
pub use state::{DirState, PersistentState};
