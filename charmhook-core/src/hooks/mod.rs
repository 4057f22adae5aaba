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

//! Hook registration and dispatch.
//!
//! Components declare which hooks they care about on a [`HookRegistry`]
//! during setup. When the process starts for a hook, the
//! [`HookDispatcher`] runs the matching handlers in registration order:
//!
//! - **Named**: one specific hook, e.g. `config-changed`
//! - **Relation**: every hook of a relation, e.g. `db-relation-*`
//! - **Any**: every hook that fires
//!
//! # Example
//!
//! ```rust,ignore
//! use charmhook_core::hooks::{HookRegistry, HookDispatcher, JsonStateHandler};
//!
//! let mut registry = HookRegistry::new();
//! registry.register_hook("config-changed", JsonStateHandler::new("counter", |ctx, n: &mut u32| {
//!     *n += 1;
//!     ctx.log(format!("config changed {} times", n))?;
//!     Ok(())
//! }))?;
//!
//! HookDispatcher::new(&registry).dispatch(&mut ctx, &mut state)?;
//! ```

mod dispatcher;
mod handlers;
mod names;
mod registry;

pub use dispatcher::{DispatchReport, HookDispatcher};
pub use handlers::{
    BoxedHookHandler, CallbackHandler, HookHandler, JsonStateHandler, NoOpHandler, StateUpdate,
};
pub use names::{
    is_valid_hook_name, relation_hook_names, relation_name_of_hook, MAIN_HOOKS,
    RELATION_HOOK_KINDS,
};
pub use registry::{register_main_hooks, HookFilter, HookRegistry, RegisteredHook};
