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

//! Process configuration and the hook environment

use crate::error::{HookError, HookResult};
use crate::relation::{RelationId, UnitId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_STATE_DIR: &str = "CHARMHOOK_STATE_DIR";
pub const ENV_TOOLS_DIR: &str = "CHARMHOOK_TOOLS_DIR";
pub const ENV_LOG: &str = "CHARMHOOK_LOG";

/// Configuration of the hook process itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Directory holding persisted component state.
    /// Defaults to `charm-state` next to the charm directory.
    pub state_dir: Option<PathBuf>,

    /// Directory holding the hook tools (tools are looked up on `PATH` if unset)
    pub tools_dir: Option<PathBuf>,

    /// `tracing` filter directive
    pub log_filter: String,

    /// Query relation data before dispatch
    pub fetch_relations: bool,
}

/// Framework events at `info`, everything else (the charm's own targets
/// included) at `warn`.
pub const DEFAULT_LOG_FILTER: &str = "warn,charmhook=info";

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            tools_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            fetch_relations: true,
        }
    }
}

impl HookConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml(text: &str) -> HookResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Defaults overlaid with the `CHARMHOOK_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values found through `lookup` onto this configuration.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|v| !v.is_empty()) {
            self.state_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup(ENV_TOOLS_DIR).filter(|v| !v.is_empty()) {
            self.tools_dir = Some(PathBuf::from(dir));
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            self.log_filter = filter;
        }
        self
    }

    /// State directory to use for a charm installed at `charm_dir`.
    pub fn state_dir_for(&self, charm_dir: &Path) -> PathBuf {
        match &self.state_dir {
            Some(dir) => dir.clone(),
            None => charm_dir
                .parent()
                .unwrap_or(charm_dir)
                .join("charm-state"),
        }
    }
}

/// Identity of the running hook, as handed over by the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct HookEnv {
    pub hook_name: String,
    pub unit: UnitId,
    pub uuid: String,
    pub charm_dir: PathBuf,
    pub relation_id: Option<RelationId>,
    pub remote_unit: Option<UnitId>,
}

impl HookEnv {
    /// Read the hook environment of the current process.
    pub fn from_env() -> HookResult<Self> {
        let argv0 = std::env::args().next();
        Self::from_lookup(|key| std::env::var(key).ok(), argv0.as_deref())
    }

    /// Build the hook environment from `lookup`. The hook name falls back
    /// to the file name of `argv0` when `JUJU_HOOK_NAME` is unset, which is
    /// how a symlinked hook is started.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        argv0: Option<&str>,
    ) -> HookResult<Self> {
        let present = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &str| present(key).ok_or_else(|| HookError::MissingEnv(key.to_string()));

        let hook_name = match present("JUJU_HOOK_NAME") {
            Some(name) => name,
            None => argv0
                .and_then(|arg| Path::new(arg).file_name())
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .ok_or_else(|| HookError::MissingEnv("JUJU_HOOK_NAME".to_string()))?,
        };

        let uuid = match present("JUJU_MODEL_UUID") {
            Some(uuid) => uuid,
            None => required("JUJU_ENV_UUID")?,
        };

        Ok(Self {
            hook_name,
            unit: UnitId::from(required("JUJU_UNIT_NAME")?),
            uuid,
            charm_dir: PathBuf::from(required("CHARM_DIR")?),
            relation_id: present("JUJU_RELATION_ID").map(RelationId::from),
            remote_unit: present("JUJU_REMOTE_UNIT").map(UnitId::from),
        })
    }
}
