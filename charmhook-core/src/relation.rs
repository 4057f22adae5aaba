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

//! Relation bookkeeping.
//!
//! A [`RelationSnapshot`] is the invocation's view of every relation the
//! unit takes part in: which relation ids exist for each declared relation
//! name, which units are members of each id, and what each member has
//! published.

use crate::error::{HookError, HookResult};
use crate::runner::{tools, ToolRunner};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Identifies one instance of a relation, e.g. `db:3`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationId(pub String);

/// Identifies a unit, e.g. `mysql/0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                $ty(s.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                $ty(s)
            }
        }
    };
}

string_id!(RelationId);
string_id!(UnitId);

/// Settings published by one unit into one relation.
pub type Settings = BTreeMap<String, String>;

/// Units of one relation id and their settings.
pub type RelationUnits = BTreeMap<UnitId, Settings>;

/// In-memory view of the relations visible to this invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationSnapshot {
    /// Relation id -> member unit -> settings.
    pub relations: BTreeMap<RelationId, RelationUnits>,
    /// Relation name -> relation ids, in the order the agent reported them.
    pub relation_ids: BTreeMap<String, Vec<RelationId>>,
}

impl RelationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as an instance of the relation called `name`.
    pub fn with_relation(mut self, name: &str, id: impl Into<RelationId>) -> Self {
        let id = id.into();
        self.relations.entry(id.clone()).or_default();
        let ids = self.relation_ids.entry(name.to_string()).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
        self
    }

    /// Record `unit` as a member of relation `id` with the given settings.
    pub fn with_unit<K, V>(
        mut self,
        id: impl Into<RelationId>,
        unit: impl Into<UnitId>,
        settings: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let settings = settings
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.relations
            .entry(id.into())
            .or_default()
            .insert(unit.into(), settings);
        self
    }

    /// Relation ids recorded for `name`; empty when the relation has none.
    pub fn ids_for(&self, name: &str) -> &[RelationId] {
        self.relation_ids
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Units and settings of relation `id`.
    pub fn units(&self, id: &RelationId) -> Option<&RelationUnits> {
        self.relations.get(id)
    }

    /// Builds an index from relation id to relation name.
    pub fn name_index(&self) -> HashMap<&RelationId, &str> {
        self.relation_ids
            .iter()
            .flat_map(|(name, ids)| ids.iter().map(move |id| (id, name.as_str())))
            .collect()
    }

    /// Resolves the relation name that `id` belongs to.
    ///
    /// An id the snapshot has never seen means the agent invoked a relation
    /// hook for a relation it did not establish, which is a contract
    /// violation.
    pub fn relation_name(&self, id: &RelationId) -> HookResult<String> {
        self.name_index()
            .get(id)
            .map(|name| name.to_string())
            .ok_or_else(|| HookError::UnknownRelationId(id.to_string()))
    }

    /// Fetch the snapshot for the given relation names through hook tools.
    ///
    /// Uses `relation-ids`, `relation-list` and `relation-get` for each
    /// name, id and unit in turn.
    pub fn fetch<'a>(
        runner: &mut dyn ToolRunner,
        relation_names: impl IntoIterator<Item = &'a str>,
    ) -> HookResult<Self> {
        let mut snapshot = RelationSnapshot::new();

        for name in relation_names {
            let ids: Vec<RelationId> = run_json(
                runner,
                tools::RELATION_IDS,
                &tools::relation_ids_args(name),
            )?
            .unwrap_or_default();
            snapshot.relation_ids.insert(name.to_string(), ids.clone());

            for id in ids {
                let units: Vec<UnitId> = run_json(
                    runner,
                    tools::RELATION_LIST,
                    &tools::relation_list_args(id.as_str()),
                )?
                .unwrap_or_default();

                let mut members = RelationUnits::new();
                for unit in units {
                    let settings: Settings = run_json(
                        runner,
                        tools::RELATION_GET,
                        &tools::relation_get_args(id.as_str(), unit.as_str()),
                    )?
                    .unwrap_or_default();
                    members.insert(unit, settings);
                }
                snapshot.relations.insert(id, members);
            }
        }

        tracing::debug!(
            relation_count = snapshot.relations.len(),
            "Fetched relation snapshot"
        );
        Ok(snapshot)
    }
}

/// Runs a tool that prints JSON; empty output and `null` both decode to
/// `None`.
pub(crate) fn run_json<T: serde::de::DeserializeOwned>(
    runner: &mut dyn ToolRunner,
    command: &str,
    args: &[String],
) -> HookResult<Option<T>> {
    let output = runner.run(command, args)?;
    if output.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<T>>(&output).map_err(|e| HookError::ToolOutput {
        command: command.to_string(),
        message: e.to_string(),
    })
}
