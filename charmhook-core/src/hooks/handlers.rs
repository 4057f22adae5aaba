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

//! Hook handler traits and implementations.

use crate::context::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// What a handler did to its component's persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    /// Leave the stored record alone.
    Unchanged,
    /// Replace the stored record with these bytes.
    Changed(Vec<u8>),
}

/// Component logic run when a hook fires.
pub trait HookHandler {
    /// Name of the component; also the key its state is stored under.
    fn name(&self) -> &str;

    /// Handle the current hook.
    ///
    /// `state` is whatever this component last saved, or `None` on its
    /// first run.
    fn handle(&self, ctx: &mut Context, state: Option<&[u8]>) -> anyhow::Result<StateUpdate>;
}

/// Type alias for a boxed hook handler.
pub type BoxedHookHandler = Box<dyn HookHandler>;

/// Handler that does nothing, for declaring interest in a hook.
pub struct NoOpHandler {
    name: String,
}

impl NoOpHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl HookHandler for NoOpHandler {
    fn handle(&self, _ctx: &mut Context, _state: Option<&[u8]>) -> anyhow::Result<StateUpdate> {
        Ok(StateUpdate::Unchanged)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handler that invokes a callback function with the raw state bytes.
pub struct CallbackHandler<F>
where
    F: Fn(&mut Context, Option<&[u8]>) -> anyhow::Result<StateUpdate>,
{
    name: String,
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(&mut Context, Option<&[u8]>) -> anyhow::Result<StateUpdate>,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> HookHandler for CallbackHandler<F>
where
    F: Fn(&mut Context, Option<&[u8]>) -> anyhow::Result<StateUpdate>,
{
    fn handle(&self, ctx: &mut Context, state: Option<&[u8]>) -> anyhow::Result<StateUpdate> {
        (self.callback)(ctx, state)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handler whose state is a JSON-encoded value of type `T`.
///
/// The callback edits the decoded value in place. The value is saved again
/// only when its encoding differs from what was loaded; a component that has
/// never saved starts from `T::default()`.
pub struct JsonStateHandler<T, F> {
    name: String,
    callback: F,
    _state: PhantomData<fn() -> T>,
}

impl<T, F> JsonStateHandler<T, F>
where
    T: Serialize + DeserializeOwned + Default,
    F: Fn(&mut Context, &mut T) -> anyhow::Result<()>,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
            _state: PhantomData,
        }
    }
}

impl<T, F> HookHandler for JsonStateHandler<T, F>
where
    T: Serialize + DeserializeOwned + Default,
    F: Fn(&mut Context, &mut T) -> anyhow::Result<()>,
{
    fn handle(&self, ctx: &mut Context, state: Option<&[u8]>) -> anyhow::Result<StateUpdate> {
        let mut value: T = match state {
            Some(bytes) if !bytes.is_empty() => serde_json::from_slice(bytes)?,
            _ => T::default(),
        };
        let before = serde_json::to_vec(&value)?;

        (self.callback)(ctx, &mut value)?;

        let after = serde_json::to_vec(&value)?;
        if after == before {
            Ok(StateUpdate::Unchanged)
        } else {
            Ok(StateUpdate::Changed(after))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
