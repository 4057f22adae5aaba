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

//! Runs hooks in-process against fake tools and in-memory state.

use crate::runner::{Recording, RecordingRunner, RunFn};
use crate::state::MemState;
use charmhook_core::{
    register_main_hooks, ContextBuilder, DispatchReport, HookDispatcher, HookRegistry, HookResult,
    RelationSnapshot, UnitId,
};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Model UUID every harness context reports.
pub const UUID: &str = "373b309b-4a86-4f13-88e2-c213d97075b8";
/// Unit every harness context runs as.
pub const UNIT: &str = "someunit/0";
/// Charm directory every harness context reports.
pub const CHARM_DIR: &str = "/nowhere";

type RegisterFn = dyn Fn(&mut HookRegistry) -> HookResult<()>;

/// Drives a charm's components through hooks without an agent.
///
/// Each call to [`run_hook`](Self::run_hook) builds a fresh registry with
/// the charm's registration function, declares the lifecycle hooks, and
/// dispatches against a [`RecordingRunner`] and the harness's [`MemState`].
/// State survives from one run to the next, like it does on a real unit.
pub struct HookHarness {
    register_hooks: Box<RegisterFn>,
    /// Relation data visible to the hook.
    pub relations: RelationSnapshot,
    /// Charm configuration returned by `config-get`.
    pub config: Map<String, Value>,
    pub public_address: String,
    pub private_address: String,
    /// Persistent state shared by every run.
    pub state: MemState,
    run_fn: Option<Arc<Mutex<Box<RunFn>>>>,
    recording: Arc<Mutex<Recording>>,
}

impl HookHarness {
    pub fn new(register_hooks: impl Fn(&mut HookRegistry) -> HookResult<()> + 'static) -> Self {
        Self {
            register_hooks: Box::new(register_hooks),
            relations: RelationSnapshot::new(),
            config: Map::new(),
            public_address: String::new(),
            private_address: String::new(),
            state: MemState::new(),
            run_fn: None,
            recording: Arc::new(Mutex::new(Recording::default())),
        }
    }

    pub fn with_relations(mut self, relations: RelationSnapshot) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
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

    /// Answer recorded tool calls with `run_fn` instead of empty output.
    pub fn with_run_fn(
        mut self,
        run_fn: impl FnMut(&str, &[String]) -> HookResult<Vec<u8>> + 'static,
    ) -> Self {
        self.run_fn = Some(Arc::new(Mutex::new(Box::new(run_fn))));
        self
    }

    /// Run `hook_name`. For a relation hook, `relation_id` is the relation
    /// it fires in and `remote_unit` the unit it fires for.
    ///
    /// Tool calls accumulate in [`record`](Self::record) across runs; the
    /// closed flag is reset at the start of every run.
    pub fn run_hook(
        &mut self,
        hook_name: &str,
        relation_id: Option<&str>,
        remote_unit: Option<&str>,
    ) -> HookResult<DispatchReport> {
        let registry = self.registry()?;
        self.recording.lock().closed = false;

        let runner = RecordingRunner::new()
            .with_config(self.config.clone())
            .with_addresses(self.public_address.clone(), self.private_address.clone())
            .with_shared(self.run_fn.clone(), self.recording.clone());

        let mut builder = ContextBuilder::new(hook_name)
            .uuid(UUID)
            .unit(UNIT)
            .charm_dir(CHARM_DIR)
            .relations(self.relations.clone());
        if let Some(id) = relation_id {
            builder = builder.relation(id, remote_unit.map(UnitId::from));
        }
        let mut ctx = builder.runner(Box::new(runner)).build()?;

        HookDispatcher::new(&registry).dispatch(&mut ctx, &mut self.state)
    }

    fn registry(&self) -> HookResult<HookRegistry> {
        let mut registry = HookRegistry::new();
        (self.register_hooks)(&mut registry)?;
        register_main_hooks(&mut registry);
        Ok(registry)
    }

    /// Every hook name the charm would get a hook file for.
    pub fn hook_names(&self) -> HookResult<BTreeSet<String>> {
        Ok(self.registry()?.hook_names().clone())
    }

    /// Recorded tool calls as `[command, args...]`.
    pub fn record(&self) -> Vec<Vec<String>> {
        self.recording.lock().record.clone()
    }

    /// Forget the recorded tool calls, keeping logs and state.
    pub fn clear_record(&mut self) {
        self.recording.lock().record.clear();
    }

    /// Messages sent with `juju-log`.
    pub fn logs(&self) -> Vec<String> {
        self.recording.lock().logs.clone()
    }

    /// Whether the last run closed its runner.
    pub fn closed(&self) -> bool {
        self.recording.lock().closed
    }
}
