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

//! Process entry point for a charm binary.
//!
//! A charm is a single executable. Every hook file in the charm's `hooks/`
//! directory is a symlink to it, and [`run_main`] works out which hook
//! fired from the environment.

use crate::config::{HookConfig, HookEnv};
use crate::context::{Context, ContextBuilder};
use crate::error::{HookError, HookResult};
use crate::hooks::{
    is_valid_hook_name, register_main_hooks, relation_name_of_hook, DispatchReport,
    HookDispatcher, HookRegistry,
};
use crate::relation::RelationSnapshot;
use crate::runner::{ExecRunner, ToolRunner};
use crate::state::DirState;
use crate::telemetry::init_logging;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Optional TOML file in the charm directory holding a [`HookConfig`].
pub const CONFIG_FILE: &str = "charmhook.toml";

/// Run the hook this process was started for.
///
/// `register` adds the charm's components to the registry. The lifecycle
/// hooks are declared before it runs. Any error is logged and turned into
/// a failing exit code.
pub fn run_main<F>(register: F) -> ExitCode
where
    F: FnOnce(&mut HookRegistry) -> HookResult<()>,
{
    let env = HookEnv::from_env();
    let config = match &env {
        Ok(env) => load_config(&env.charm_dir),
        Err(_) => Ok(HookConfig::from_env()),
    };
    let filter = config
        .as_ref()
        .map(|c| c.log_filter.clone())
        .unwrap_or_else(|_| HookConfig::default().log_filter);
    init_logging(&filter);

    let result = env.and_then(|env| run(&env, &config?, register));
    match result {
        Ok(report) => {
            tracing::info!(
                hook = %report.hook_name,
                handlers = report.handler_count,
                saved = report.saved.len(),
                total_time_us = report.total_time_us,
                "Hook completed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, kind = ?e.kind(), "Hook failed");
            ExitCode::FAILURE
        }
    }
}

fn run<F>(env: &HookEnv, config: &HookConfig, register: F) -> HookResult<DispatchReport>
where
    F: FnOnce(&mut HookRegistry) -> HookResult<()>,
{
    // Nothing on disk or in the hook tools is touched for a malformed name.
    if !is_valid_hook_name(&env.hook_name) {
        return Err(HookError::InvalidHookName(env.hook_name.clone()));
    }

    let mut registry = HookRegistry::new();
    register_main_hooks(&mut registry);
    register(&mut registry)?;

    let mut state = DirState::new(config.state_dir_for(&env.charm_dir))?;
    let mut ctx = build_context(env, config, &registry)?;
    HookDispatcher::new(&registry).dispatch(&mut ctx, &mut state)
}

/// Read `charmhook.toml` from the charm directory if there is one, then
/// apply the environment overrides.
pub fn load_config(charm_dir: &Path) -> HookResult<HookConfig> {
    let path = charm_dir.join(CONFIG_FILE);
    let base = match std::fs::read_to_string(&path) {
        Ok(text) => HookConfig::from_toml(&text)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => HookConfig::default(),
        Err(e) => return Err(e.into()),
    };
    Ok(base.with_overrides(|key| std::env::var(key).ok()))
}

/// Build the context for `env`, talking to the real hook tools.
pub fn build_context(
    env: &HookEnv,
    config: &HookConfig,
    registry: &HookRegistry,
) -> HookResult<Context> {
    build_context_with(env, config, registry, Box::new(ExecRunner::new(config.tools_dir.clone())))
}

/// Build the context for `env` around `runner`.
///
/// With `fetch_relations` set, the relation snapshot is queried for every
/// declared relation plus the relation of the running hook. If the query
/// fails the runner is closed before the error is returned.
pub fn build_context_with(
    env: &HookEnv,
    config: &HookConfig,
    registry: &HookRegistry,
    mut runner: Box<dyn ToolRunner>,
) -> HookResult<Context> {
    let relations = if config.fetch_relations {
        let mut names: BTreeSet<&str> = registry.relation_names().iter().map(String::as_str).collect();
        if let Some(name) = relation_name_of_hook(&env.hook_name) {
            names.insert(name);
        }
        match RelationSnapshot::fetch(runner.as_mut(), names) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if let Err(close_err) = runner.close() {
                    tracing::warn!(error = %close_err, "Failed to close tool runner");
                }
                return Err(e);
            }
        }
    } else {
        RelationSnapshot::new()
    };

    let mut builder = ContextBuilder::new(env.hook_name.clone())
        .uuid(env.uuid.clone())
        .unit(env.unit.clone())
        .charm_dir(env.charm_dir.clone())
        .relations(relations);
    if let Some(id) = &env.relation_id {
        builder = builder.relation(id.clone(), env.remote_unit.clone());
    }
    builder.runner(runner).build()
}

/// Point a hook file for every name in `registry` at `exe`.
///
/// Existing entries with those names are replaced. Returns the links
/// created, in hook-name order.
#[cfg(unix)]
pub fn install_hook_links(
    registry: &HookRegistry,
    hooks_dir: &Path,
    exe: &Path,
) -> HookResult<Vec<PathBuf>> {
    std::fs::create_dir_all(hooks_dir)?;

    let mut links = Vec::with_capacity(registry.hook_names().len());
    for name in registry.hook_names() {
        let link = hooks_dir.join(name);
        if std::fs::symlink_metadata(&link).is_ok() {
            if link.is_dir() && !link.is_symlink() {
                return Err(HookError::ConfigError(format!(
                    "{} is a directory",
                    link.display()
                )));
            }
            std::fs::remove_file(&link)?;
        }
        std::os::unix::fs::symlink(exe, &link)?;
        tracing::debug!(hook = %name, link = %link.display(), "Installed hook link");
        links.push(link);
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NoOpHandler;
    use crate::relation::{RelationId, UnitId};
    use crate::test_support::NullRunner;

    fn env(hook: &str) -> HookEnv {
        HookEnv {
            hook_name: hook.to_string(),
            unit: UnitId::from("wordpress/0"),
            uuid: "uuid".to_string(),
            charm_dir: PathBuf::from("/charm"),
            relation_id: None,
            remote_unit: None,
        }
    }

    #[test]
    fn test_build_context_queries_declared_relations() {
        let mut registry = HookRegistry::new();
        registry.register_relation("db", NoOpHandler::new("db")).unwrap();
        let runner = NullRunner::default();
        let calls = runner.calls.clone();

        let ctx = build_context_with(
            &env("install"),
            &HookConfig::default(),
            &registry,
            Box::new(runner),
        )
        .unwrap();

        assert_eq!(ctx.hook_name(), "install");
        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], "relation-ids");
        assert_eq!(calls[0].last().map(String::as_str), Some("db"));
    }

    #[test]
    fn test_build_context_without_fetch() {
        let registry = HookRegistry::new();
        let runner = NullRunner::default();
        let calls = runner.calls.clone();
        let closes = runner.closes.clone();
        let config = HookConfig {
            fetch_relations: false,
            ..Default::default()
        };

        let mut hook_env = env("db-relation-joined");
        hook_env.relation_id = Some(RelationId::from("db:3"));
        let err = build_context_with(&hook_env, &config, &registry, Box::new(runner)).unwrap_err();

        assert!(matches!(err, HookError::UnknownRelationId(_)));
        assert!(calls.lock().is_empty());
        assert_eq!(*closes.lock(), 1);
    }

    #[test]
    fn test_run_rejects_invalid_hook_name_first() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("charm-state");
        let config = HookConfig {
            state_dir: Some(state_dir.clone()),
            ..Default::default()
        };

        let mut registered = false;
        let err = run(&env("Not A Hook"), &config, |_| {
            registered = true;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, HookError::InvalidHookName(ref name) if name == "Not A Hook"));
        assert!(!registered);
        assert!(!state_dir.exists());

        let mut hook_env = env("Not A Hook");
        hook_env.relation_id = Some(RelationId::from("db:1"));
        let err = run(&hook_env, &config, |_| Ok(())).unwrap_err();
        assert!(matches!(err, HookError::InvalidHookName(_)));
        assert!(!state_dir.exists());
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.fetch_relations);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "fetch_relations = false\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(!config.fetch_relations);
    }

    #[cfg(unix)]
    #[test]
    fn test_install_hook_links() {
        let dir = tempfile::tempdir().unwrap();
        let hooks_dir = dir.path().join("hooks");
        let exe = dir.path().join("charm-bin");

        let mut registry = HookRegistry::new();
        register_main_hooks(&mut registry);
        registry.register_relation("db", NoOpHandler::new("db")).unwrap();

        std::fs::create_dir_all(&hooks_dir).unwrap();
        std::fs::write(hooks_dir.join("install"), "#!/bin/sh\n").unwrap();

        let links = install_hook_links(&registry, &hooks_dir, &exe).unwrap();
        assert_eq!(links.len(), registry.hook_names().len());
        assert_eq!(std::fs::read_link(hooks_dir.join("install")).unwrap(), exe);
        assert_eq!(
            std::fs::read_link(hooks_dir.join("db-relation-broken")).unwrap(),
            exe
        );

        // Running it again replaces the links in place.
        let again = install_hook_links(&registry, &hooks_dir, &exe).unwrap();
        assert_eq!(again, links);
    }
}
