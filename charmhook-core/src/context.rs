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

//! Per-invocation hook context.
//!
//! A [`Context`] is built once per process. It carries the unit's identity,
//! the hook that fired (and its relation, for relation hooks), the relation
//! snapshot, and the tool runner every handler talks to the agent through.

use crate::error::{HookError, HookResult};
use crate::relation::{run_json, RelationId, RelationSnapshot, RelationUnits, Settings, UnitId};
use crate::runner::{tools, ToolRunner};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything a handler can see about the current hook invocation.
pub struct Context {
    uuid: String,
    unit: UnitId,
    charm_dir: PathBuf,
    hook_name: String,
    relation_id: Option<RelationId>,
    relation_name: Option<String>,
    remote_unit: Option<UnitId>,
    relations: RelationSnapshot,
    /// Settings this unit has written during the invocation, by relation.
    local_settings: BTreeMap<RelationId, Settings>,
    runner: Box<dyn ToolRunner>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("uuid", &self.uuid)
            .field("unit", &self.unit)
            .field("charm_dir", &self.charm_dir)
            .field("hook_name", &self.hook_name)
            .field("relation_id", &self.relation_id)
            .field("relation_name", &self.relation_name)
            .field("remote_unit", &self.remote_unit)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Model (environment) UUID.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// The unit this hook runs for.
    pub fn unit(&self) -> &UnitId {
        &self.unit
    }

    pub fn charm_dir(&self) -> &Path {
        &self.charm_dir
    }

    pub fn hook_name(&self) -> &str {
        &self.hook_name
    }

    pub fn relation_id(&self) -> Option<&RelationId> {
        self.relation_id.as_ref()
    }

    pub fn relation_name(&self) -> Option<&str> {
        self.relation_name.as_deref()
    }

    pub fn remote_unit(&self) -> Option<&UnitId> {
        self.remote_unit.as_ref()
    }

    pub fn is_relation_hook(&self) -> bool {
        self.relation_id.is_some()
    }

    pub fn relations(&self) -> &RelationSnapshot {
        &self.relations
    }

    /// Relation ids of the relation called `name`, or of the current
    /// relation when `name` is `None`.
    pub fn relation_ids(&self, name: Option<&str>) -> Vec<RelationId> {
        match name.or(self.relation_name.as_deref()) {
            Some(name) => self.relations.ids_for(name).to_vec(),
            None => Vec::new(),
        }
    }

    /// Units currently taking part in relation `id`.
    pub fn relation_units(&self, id: &RelationId) -> Vec<UnitId> {
        self.relations
            .units(id)
            .map(|units| units.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every member unit of relation `id` with its settings.
    pub fn all_relation_units(&self, id: &RelationId) -> RelationUnits {
        self.relations.units(id).cloned().unwrap_or_default()
    }

    /// Settings `unit` has published into relation `id`.
    ///
    /// For the local unit this reflects anything written with
    /// [`set_relation_with_id`](Self::set_relation_with_id) earlier in the
    /// same invocation.
    pub fn relation_settings(&self, id: &RelationId, unit: &UnitId) -> Option<Settings> {
        if unit == &self.unit {
            if let Some(local) = self.local_settings.get(id) {
                return Some(local.clone());
            }
        }
        self.relations
            .units(id)
            .and_then(|units| units.get(unit))
            .cloned()
    }

    /// Value of `key` published by the remote unit of the current relation.
    pub fn get_relation(&self, key: &str) -> HookResult<Option<String>> {
        let (id, unit) = match (&self.relation_id, &self.remote_unit) {
            (Some(id), Some(unit)) => (id, unit),
            _ => return Err(HookError::NotRelationHook(self.hook_name.clone())),
        };
        Ok(self
            .relation_settings(id, unit)
            .and_then(|settings| settings.get(key).cloned()))
    }

    /// Publish settings into the current relation.
    pub fn set_relation<'a>(
        &mut self,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> HookResult<()> {
        let id = self
            .relation_id
            .clone()
            .ok_or_else(|| HookError::NotRelationHook(self.hook_name.clone()))?;
        self.set_relation_with_id(&id, pairs)
    }

    /// Publish settings into relation `id`. An empty value removes the key.
    ///
    /// The local view is updated before the tool runs so later reads in
    /// this invocation see the new values.
    pub fn set_relation_with_id<'a>(
        &mut self,
        id: &RelationId,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> HookResult<()> {
        let pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
        if pairs.is_empty() {
            return Ok(());
        }

        let current = self.relation_settings(id, &self.unit).unwrap_or_default();
        let local = self.local_settings.entry(id.clone()).or_insert(current);
        for (key, value) in &pairs {
            if value.is_empty() {
                local.remove(*key);
            } else {
                local.insert(key.to_string(), value.to_string());
            }
        }

        self.run(
            tools::RELATION_SET,
            &tools::relation_set_args(id.as_str(), pairs),
        )?;
        Ok(())
    }

    /// Send a line to the agent's log.
    pub fn log(&mut self, message: impl AsRef<str>) -> HookResult<()> {
        let message = message.as_ref();
        tracing::debug!(hook = %self.hook_name, "{}", message);
        self.run(tools::JUJU_LOG, &[message.to_string()])?;
        Ok(())
    }

    /// Value of one configuration option, `None` when it is unset.
    pub fn config_value<T: DeserializeOwned>(&mut self, key: &str) -> HookResult<Option<T>> {
        run_json(
            &mut *self.runner,
            tools::CONFIG_GET,
            &tools::config_get_args(Some(key)),
        )
    }

    /// The whole charm configuration.
    pub fn all_config(&mut self) -> HookResult<serde_json::Map<String, serde_json::Value>> {
        Ok(run_json(
            &mut *self.runner,
            tools::CONFIG_GET,
            &tools::config_get_args(None),
        )?
        .unwrap_or_default())
    }

    pub fn public_address(&mut self) -> HookResult<String> {
        self.unit_get(tools::PUBLIC_ADDRESS)
    }

    pub fn private_address(&mut self) -> HookResult<String> {
        self.unit_get(tools::PRIVATE_ADDRESS)
    }

    fn unit_get(&mut self, attribute: &str) -> HookResult<String> {
        let output = self.run(tools::UNIT_GET, &[attribute.to_string()])?;
        let address = String::from_utf8(output).map_err(|e| HookError::ToolOutput {
            command: tools::UNIT_GET.to_string(),
            message: e.to_string(),
        })?;
        Ok(address.trim().to_string())
    }

    /// Open `port` (e.g. `80`, `"tcp"`) on the unit's public address.
    pub fn open_port(&mut self, port: u16, protocol: &str) -> HookResult<()> {
        self.run(tools::OPEN_PORT, &tools::port_args(port, protocol))?;
        Ok(())
    }

    pub fn close_port(&mut self, port: u16, protocol: &str) -> HookResult<()> {
        self.run(tools::CLOSE_PORT, &tools::port_args(port, protocol))?;
        Ok(())
    }

    /// Run an arbitrary hook tool and return its raw output.
    pub fn run_tool(&mut self, command: &str, args: &[String]) -> HookResult<Vec<u8>> {
        self.run(command, args)
    }

    fn run(&mut self, command: &str, args: &[String]) -> HookResult<Vec<u8>> {
        self.runner.run(command, args)
    }

    pub(crate) fn close_runner(&mut self) -> HookResult<()> {
        self.runner.close()
    }
}

/// Builder for [`Context`].
pub struct ContextBuilder {
    uuid: String,
    unit: UnitId,
    charm_dir: PathBuf,
    hook_name: String,
    relation: Option<(RelationId, Option<UnitId>)>,
    relations: RelationSnapshot,
    runner: Option<Box<dyn ToolRunner>>,
}

impl ContextBuilder {
    pub fn new(hook_name: impl Into<String>) -> Self {
        Self {
            uuid: String::new(),
            unit: UnitId::from(""),
            charm_dir: PathBuf::new(),
            hook_name: hook_name.into(),
            relation: None,
            relations: RelationSnapshot::default(),
            runner: None,
        }
    }

    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    pub fn unit(mut self, unit: impl Into<UnitId>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn charm_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.charm_dir = dir.into();
        self
    }

    /// Mark the hook as relation-scoped, fired for `remote_unit` (absent
    /// for `-broken` hooks) in relation `id`.
    pub fn relation(mut self, id: impl Into<RelationId>, remote_unit: Option<UnitId>) -> Self {
        self.relation = Some((id.into(), remote_unit));
        self
    }

    pub fn relations(mut self, relations: RelationSnapshot) -> Self {
        self.relations = relations;
        self
    }

    pub fn runner(mut self, runner: Box<dyn ToolRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Build the context.
    ///
    /// For a relation hook the relation id must appear in the snapshot;
    /// otherwise this fails with [`HookError::UnknownRelationId`] after
    /// closing the runner.
    pub fn build(self) -> HookResult<Context> {
        let mut runner = self
            .runner
            .ok_or_else(|| HookError::ConfigError("no tool runner configured".to_string()))?;

        let (relation_id, relation_name, remote_unit) = match self.relation {
            Some((id, remote_unit)) => match self.relations.relation_name(&id) {
                Ok(name) => (Some(id), Some(name), remote_unit),
                Err(e) => {
                    if let Err(close_err) = runner.close() {
                        tracing::warn!(error = %close_err, "Failed to close tool runner");
                    }
                    return Err(e);
                }
            },
            None => (None, None, None),
        };

        Ok(Context {
            uuid: self.uuid,
            unit: self.unit,
            charm_dir: self.charm_dir,
            hook_name: self.hook_name,
            relation_id,
            relation_name,
            remote_unit,
            relations: self.relations,
            local_settings: BTreeMap::new(),
            runner,
        })
    }
}
