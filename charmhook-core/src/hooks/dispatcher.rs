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

//! Hook dispatcher for running the handlers of the hook that fired.

use super::handlers::StateUpdate;
use super::names::is_valid_hook_name;
use super::registry::HookRegistry;
use crate::context::Context;
use crate::error::{HookError, HookResult};
use crate::state::PersistentState;
use std::time::Instant;

/// Result of dispatching one hook.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Hook that was dispatched.
    pub hook_name: String,
    /// Number of handlers that ran.
    pub handler_count: usize,
    /// Names whose state was saved, in save order.
    pub saved: Vec<String>,
    /// Total dispatch time in microseconds.
    pub total_time_us: u64,
}

/// Runs the handlers registered for the context's hook.
///
/// Handlers run one at a time in registration order. Each handler's state
/// is loaded just before it runs and saved straight after it if it changed,
/// so a failing handler leaves the state of the handlers before it saved
/// and the ones after it untouched. The first failure stops the dispatch.
pub struct HookDispatcher<'r> {
    registry: &'r HookRegistry,
}

impl<'r> HookDispatcher<'r> {
    pub fn new(registry: &'r HookRegistry) -> Self {
        Self { registry }
    }

    /// Dispatch the hook in `ctx`, then close its tool runner.
    ///
    /// The runner is closed exactly once whatever happens. A close failure
    /// is only reported when the dispatch itself succeeded.
    pub fn dispatch(
        &self,
        ctx: &mut Context,
        state: &mut dyn PersistentState,
    ) -> HookResult<DispatchReport> {
        let result = self.run_handlers(ctx, state);
        let closed = ctx.close_runner();

        match (result, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "Failed to close tool runner");
                }
                Err(e)
            }
        }
    }

    fn run_handlers(
        &self,
        ctx: &mut Context,
        state: &mut dyn PersistentState,
    ) -> HookResult<DispatchReport> {
        let start = Instant::now();
        let hook_name = ctx.hook_name().to_string();

        if !is_valid_hook_name(&hook_name) {
            return Err(HookError::InvalidHookName(hook_name));
        }

        let mut report = DispatchReport {
            hook_name: hook_name.clone(),
            handler_count: 0,
            saved: Vec::new(),
            total_time_us: 0,
        };

        for hook in self.registry.handlers_for(&hook_name) {
            let name = hook.name();
            tracing::debug!(hook = %hook_name, handler = %name, "Running handler");

            let loaded = state.load(name)?;
            let update = hook
                .handler
                .handle(ctx, loaded.as_deref())
                .map_err(|source| HookError::HandlerFailed {
                    handler: name.to_string(),
                    source,
                })?;
            report.handler_count += 1;

            if let StateUpdate::Changed(data) = update {
                state.save(name, &data)?;
                report.saved.push(name.to_string());
            }
        }

        report.total_time_us = start.elapsed().as_micros() as u64;

        tracing::debug!(
            hook = %hook_name,
            handler_count = report.handler_count,
            saved = report.saved.len(),
            total_time_us = report.total_time_us,
            "Hook dispatch completed"
        );

        Ok(report)
    }
}
