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

//! Hook registry for managing registered hooks and handlers.

use super::handlers::{BoxedHookHandler, HookHandler};
use super::names::{is_valid_hook_name, relation_hook_names, relation_name_of_hook, MAIN_HOOKS};
use crate::error::{HookError, HookResult};
use crate::state::validate_state_name;
use std::collections::BTreeSet;

/// Which hooks a registration is interested in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookFilter {
    /// Exactly this hook.
    Named(String),
    /// Every hook of the relation with this name.
    Relation(String),
    /// Every hook that fires.
    Any,
}

impl HookFilter {
    pub fn matches(&self, hook_name: &str) -> bool {
        match self {
            HookFilter::Named(name) => name == hook_name,
            HookFilter::Relation(relation) => {
                relation_name_of_hook(hook_name) == Some(relation.as_str())
            }
            HookFilter::Any => true,
        }
    }
}

/// A registered hook with its handler.
pub struct RegisteredHook {
    /// Hooks this registration fires for.
    pub filter: HookFilter,
    /// The handler to execute.
    pub handler: BoxedHookHandler,
}

impl RegisteredHook {
    /// Name of the handler (and of its persisted state).
    pub fn name(&self) -> &str {
        self.handler.name()
    }
}

impl std::fmt::Debug for RegisteredHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredHook")
            .field("filter", &self.filter)
            .field("handler", &self.handler.name())
            .finish()
    }
}

/// Registry of hook handlers.
///
/// Components register during setup, before dispatch. Handlers for a hook
/// run in the order they were registered, whatever filter they used.
#[derive(Debug, Default)]
pub struct HookRegistry {
    hooks: Vec<RegisteredHook>,
    hook_names: BTreeSet<String>,
    relation_names: BTreeSet<String>,
}

impl HookRegistry {
    /// Create a new empty hook registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` when the hook called `hook_name` fires.
    pub fn register_hook(
        &mut self,
        hook_name: impl Into<String>,
        handler: impl HookHandler + 'static,
    ) -> HookResult<()> {
        let hook_name = hook_name.into();
        let handler = boxed(handler)?;
        self.declare_hook(&hook_name)?;
        self.push(HookFilter::Named(hook_name), handler);
        Ok(())
    }

    /// Run `handler` for every hook of the relation called `relation_name`
    /// (joined, changed, departed and broken).
    pub fn register_relation(
        &mut self,
        relation_name: impl Into<String>,
        handler: impl HookHandler + 'static,
    ) -> HookResult<()> {
        let relation_name = relation_name.into();
        let handler = boxed(handler)?;
        self.declare_relation(&relation_name)?;
        self.push(HookFilter::Relation(relation_name), handler);
        Ok(())
    }

    /// Run `handler` for every hook that fires.
    ///
    /// This adds no hook names: the handler only runs for hooks something
    /// else declared.
    pub fn register_any(&mut self, handler: impl HookHandler + 'static) -> HookResult<()> {
        let handler = boxed(handler)?;
        self.push(HookFilter::Any, handler);
        Ok(())
    }

    /// Declare interest in `hook_name` without attaching a handler.
    pub fn declare_hook(&mut self, hook_name: &str) -> HookResult<()> {
        if !is_valid_hook_name(hook_name) {
            return Err(HookError::InvalidHookName(hook_name.to_string()));
        }
        self.hook_names.insert(hook_name.to_string());
        Ok(())
    }

    /// Declare the relation called `relation_name` and all of its hooks.
    pub fn declare_relation(&mut self, relation_name: &str) -> HookResult<()> {
        let names = relation_hook_names(relation_name);
        if let Some(bad) = names.iter().find(|n| !is_valid_hook_name(n)) {
            return Err(HookError::InvalidHookName(bad.clone()));
        }
        self.hook_names.extend(names);
        self.relation_names.insert(relation_name.to_string());
        Ok(())
    }

    fn push(&mut self, filter: HookFilter, handler: BoxedHookHandler) {
        tracing::trace!(handler = %handler.name(), filter = ?filter, "Registered hook handler");
        self.hooks.push(RegisteredHook { filter, handler });
    }

    /// Every hook name some component is interested in, sorted.
    pub fn hook_names(&self) -> &BTreeSet<String> {
        &self.hook_names
    }

    /// Every declared relation name, sorted.
    pub fn relation_names(&self) -> &BTreeSet<String> {
        &self.relation_names
    }

    /// Handlers for `hook_name`, in registration order.
    pub fn handlers_for<'a>(&'a self, hook_name: &'a str) -> impl Iterator<Item = &'a RegisteredHook> {
        self.hooks.iter().filter(move |h| h.filter.matches(hook_name))
    }

    /// Get the number of registered hooks.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}

/// The handler's name keys its persisted state, so it has to be a valid
/// state name before anything is registered.
fn boxed(handler: impl HookHandler + 'static) -> HookResult<BoxedHookHandler> {
    validate_state_name(handler.name())?;
    Ok(Box::new(handler))
}

/// Declare the lifecycle hooks every unit receives, so the process is
/// prepared for them even if no component handles them.
pub fn register_main_hooks(registry: &mut HookRegistry) {
    for name in MAIN_HOOKS {
        registry.hook_names.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::super::handlers::NoOpHandler;
    use super::*;

    #[test]
    fn test_register_hook() {
        let mut registry = HookRegistry::new();
        registry
            .register_hook("config-changed", NoOpHandler::new("a"))
            .unwrap();

        assert_eq!(registry.handlers_for("config-changed").count(), 1);
        assert_eq!(registry.handlers_for("install").count(), 0);
        assert!(registry.hook_names().contains("config-changed"));
    }

    #[test]
    fn test_rejects_invalid_hook_name() {
        let mut registry = HookRegistry::new();
        let err = registry
            .register_hook("Bad Name", NoOpHandler::new("a"))
            .unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(registry.hook_count(), 0);
        assert!(registry.hook_names().is_empty());
    }

    #[test]
    fn test_rejects_invalid_relation_name() {
        let mut registry = HookRegistry::new();
        assert!(registry
            .register_relation("Db", NoOpHandler::new("a"))
            .is_err());
        assert!(registry.relation_names().is_empty());
    }

    #[test]
    fn test_rejects_invalid_state_name() {
        let mut registry = HookRegistry::new();
        for name in ["my comp", "a/b", "", ".hidden"] {
            let err = registry
                .register_hook("install", NoOpHandler::new(name))
                .unwrap_err();
            assert!(matches!(err, HookError::InvalidStateName(ref n) if n == name));
            assert!(registry.register_relation("db", NoOpHandler::new(name)).is_err());
            assert!(registry.register_any(NoOpHandler::new(name)).is_err());
        }
        assert_eq!(registry.hook_count(), 0);
        assert!(registry.hook_names().is_empty());
        assert!(registry.relation_names().is_empty());
    }

    #[test]
    fn test_relation_registration_expands() {
        let mut registry = HookRegistry::new();
        registry.register_relation("db", NoOpHandler::new("db")).unwrap();

        let names: Vec<_> = registry.hook_names().iter().cloned().collect();
        assert_eq!(
            names,
            vec![
                "db-relation-broken",
                "db-relation-changed",
                "db-relation-departed",
                "db-relation-joined"
            ]
        );
        assert_eq!(registry.handlers_for("db-relation-departed").count(), 1);
        assert_eq!(registry.handlers_for("website-relation-joined").count(), 0);
        assert!(registry.relation_names().contains("db"));
    }

    #[test]
    fn test_registration_order() {
        let mut registry = HookRegistry::new();
        registry.register_hook("start", NoOpHandler::new("first")).unwrap();
        registry.register_any(NoOpHandler::new("second")).unwrap();
        registry.register_hook("start", NoOpHandler::new("third")).unwrap();
        registry.register_hook("stop", NoOpHandler::new("other")).unwrap();

        let order: Vec<_> = registry.handlers_for("start").map(|h| h.name()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_any_adds_no_hook_names() {
        let mut registry = HookRegistry::new();
        registry.register_any(NoOpHandler::new("all")).unwrap();
        assert!(registry.hook_names().is_empty());
        assert_eq!(registry.handlers_for("install").count(), 1);
    }

    #[test]
    fn test_main_hooks() {
        let mut registry = HookRegistry::new();
        register_main_hooks(&mut registry);
        for name in MAIN_HOOKS {
            assert!(registry.hook_names().contains(*name));
        }
        assert_eq!(registry.hook_count(), 0);
    }
}
