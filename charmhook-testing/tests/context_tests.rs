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

//! Context behaviour as seen by handlers running under the harness.

use charmhook_core::hooks::relation_name_of_hook;
use charmhook_core::{
    CallbackHandler, Context, HookError, HookRegistry, RelationId, RelationSnapshot, StateUpdate,
    UnitId,
};
use charmhook_testing::{HookHarness, CHARM_DIR, UNIT, UUID};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

fn db_relations() -> RelationSnapshot {
    RelationSnapshot::new()
        .with_relation("db", "db:3")
        .with_relation("website", "website:1")
        .with_unit("db:3", "mysql/2", [("host", "10.0.0.3")])
        .with_unit("db:3", "mysql/0", [("host", "10.0.0.1"), ("password", "s3cret")])
        .with_unit("db:3", "mysql/1", [("host", "10.0.0.2")])
        .with_unit("website:1", "haproxy/0", [("port", "80")])
}

/// Harness with a single handler for `hook` running `check`.
fn harness_with<F>(hook: &'static str, check: F) -> HookHarness
where
    F: Fn(&mut Context) -> anyhow::Result<()> + 'static,
{
    let check = Arc::new(check);
    HookHarness::new(move |r: &mut HookRegistry| {
        let check = check.clone();
        let handler = CallbackHandler::new("inspector", move |ctx, _| {
            check(ctx)?;
            Ok(StateUpdate::Unchanged)
        });
        match relation_name_of_hook(hook) {
            Some(relation) => r.register_relation(relation, handler),
            None => r.register_hook(hook, handler),
        }
    })
    .with_relations(db_relations())
}

#[test]
fn test_identity() {
    let seen = Arc::new(Mutex::new(None));
    let out = seen.clone();
    let mut harness = harness_with("install", move |ctx| {
        *out.lock() = Some((
            ctx.uuid().to_string(),
            ctx.unit().to_string(),
            ctx.charm_dir().to_path_buf(),
            ctx.hook_name().to_string(),
            ctx.is_relation_hook(),
        ));
        Ok(())
    });

    harness.run_hook("install", None, None).unwrap();

    let (uuid, unit, charm_dir, hook, is_relation) = seen.lock().clone().unwrap();
    assert_eq!(uuid, UUID);
    assert_eq!(unit, UNIT);
    assert_eq!(charm_dir, std::path::PathBuf::from(CHARM_DIR));
    assert_eq!(hook, "install");
    assert!(!is_relation);
}

#[test]
fn test_relation_hook_context() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let out = seen.clone();
    let mut harness = harness_with("db-relation-changed", move |ctx| {
        let id = ctx.relation_id().cloned().unwrap();
        let units = ctx.relation_units(&id);
        *out.lock() = vec![
            ctx.relation_name().unwrap_or_default().to_string(),
            id.to_string(),
            ctx.remote_unit().map(UnitId::to_string).unwrap_or_default(),
            units.iter().map(UnitId::as_str).collect::<Vec<_>>().join(","),
            ctx.get_relation("password")?.unwrap_or_default(),
        ];
        Ok(())
    });

    harness
        .run_hook("db-relation-changed", Some("db:3"), Some("mysql/0"))
        .unwrap();

    assert_eq!(
        *seen.lock(),
        vec!["db", "db:3", "mysql/0", "mysql/0,mysql/1,mysql/2", "s3cret"]
    );
}

#[test]
fn test_unknown_relation_id_fails_before_handlers() {
    let ran = Arc::new(Mutex::new(false));
    let flag = ran.clone();
    let mut harness = harness_with("db-relation-joined", move |_| {
        *flag.lock() = true;
        Ok(())
    });

    let err = harness
        .run_hook("db-relation-joined", Some("db:42"), Some("mysql/9"))
        .unwrap_err();

    assert!(matches!(err, HookError::UnknownRelationId(ref id) if id == "db:42"));
    assert!(err.is_contract_violation());
    assert!(!*ran.lock());
    assert_eq!(harness.state.load_count(), 0);
    assert!(harness.closed());
}

#[test]
fn test_relation_ids_and_all_units() {
    let seen = Arc::new(Mutex::new(None));
    let out = seen.clone();
    let mut harness = harness_with("website-relation-joined", move |ctx| {
        let current = ctx.relation_ids(None);
        let db = ctx.relation_ids(Some("db"));
        let missing = ctx.relation_ids(Some("cache"));
        let all = ctx.all_relation_units(&RelationId::from("db:3"));
        *out.lock() = Some((current, db, missing, all));
        Ok(())
    });

    harness
        .run_hook("website-relation-joined", Some("website:1"), Some("haproxy/0"))
        .unwrap();

    let (current, db, missing, all) = seen.lock().clone().unwrap();
    assert_eq!(current, vec![RelationId::from("website:1")]);
    assert_eq!(db, vec![RelationId::from("db:3")]);
    assert!(missing.is_empty());
    assert_eq!(all.len(), 3);
    assert_eq!(all[&UnitId::from("mysql/1")]["host"], "10.0.0.2");
}

#[test]
fn test_set_relation_is_recorded_and_visible() {
    let seen = Arc::new(Mutex::new(None));
    let out = seen.clone();
    let mut harness = harness_with("db-relation-joined", move |ctx| {
        ctx.set_relation([("database", "blog"), ("user", "wp")])?;
        ctx.set_relation([("user", "")])?;
        let id = RelationId::from("db:3");
        let unit = ctx.unit().clone();
        *out.lock() = ctx.relation_settings(&id, &unit);
        assert!(!ctx.relation_units(&id).contains(&unit));
        Ok(())
    });

    harness
        .run_hook("db-relation-joined", Some("db:3"), Some("mysql/0"))
        .unwrap();

    let local = seen.lock().clone().unwrap();
    assert_eq!(local.get("database").map(String::as_str), Some("blog"));
    assert!(!local.contains_key("user"));
    assert_eq!(
        harness.record(),
        vec![
            vec!["relation-set", "-r", "db:3", "database=blog", "user=wp"],
            vec!["relation-set", "-r", "db:3", "user="],
        ]
    );
}

#[test]
fn test_get_relation_outside_relation_hook() {
    let mut harness = harness_with("start", |ctx| {
        assert!(matches!(
            ctx.get_relation("host"),
            Err(HookError::NotRelationHook(_))
        ));
        Ok(())
    });
    harness.run_hook("start", None, None).unwrap();
}

#[test]
fn test_config_and_addresses() {
    let seen = Arc::new(Mutex::new(None));
    let out = seen.clone();
    let mut harness = harness_with("config-changed", move |ctx| {
        let port: Option<u16> = ctx.config_value("port")?;
        let missing: Option<String> = ctx.config_value("nope")?;
        let all = ctx.all_config()?;
        let public = ctx.public_address()?;
        let private = ctx.private_address()?;
        *out.lock() = Some((port, missing, all, public, private));
        Ok(())
    })
    .with_config("port", 8080)
    .with_config("title", "My blog")
    .with_addresses("blog.example.com", "10.1.2.3");

    harness.run_hook("config-changed", None, None).unwrap();

    let (port, missing, all, public, private) = seen.lock().clone().unwrap();
    assert_eq!(port, Some(8080));
    assert_eq!(missing, None);
    assert_eq!(
        serde_json::Value::Object(all),
        json!({"port": 8080, "title": "My blog"})
    );
    assert_eq!(public, "blog.example.com");
    assert_eq!(private, "10.1.2.3");
    assert!(harness.record().is_empty());
}

#[test]
fn test_log_goes_to_logs_not_record() {
    let mut harness = harness_with("update-status", |ctx| {
        ctx.log("all good")?;
        ctx.open_port(443, "tcp")?;
        ctx.close_port(80, "tcp")?;
        Ok(())
    });

    harness.run_hook("update-status", None, None).unwrap();

    assert_eq!(harness.logs(), vec!["all good"]);
    assert_eq!(
        harness.record(),
        vec![vec!["open-port", "443/tcp"], vec!["close-port", "80/tcp"]]
    );
}

#[test]
fn test_run_fn_answers_tools() {
    let mut harness = harness_with("leader-elected", |ctx| {
        let out = ctx.run_tool("is-leader", &["--format".to_string(), "json".to_string()])?;
        assert_eq!(out, b"true");
        let err = ctx.run_tool("status-set", &[]).unwrap_err();
        assert!(matches!(err, HookError::ToolFailed { .. }));
        Ok(())
    })
    .with_run_fn(|command, _| match command {
        "is-leader" => Ok(b"true".to_vec()),
        _ => Err(HookError::ToolFailed {
            command: command.to_string(),
            message: "exit status 1".to_string(),
        }),
    });

    harness.run_hook("leader-elected", None, None).unwrap();
    assert_eq!(
        harness.record(),
        vec![vec!["is-leader", "--format", "json"], vec!["status-set"]]
    );
}

#[test]
fn test_tool_error_fails_handler() {
    let mut harness = harness_with("start", |ctx| {
        ctx.run_tool("status-set", &["active".to_string()])?;
        Ok(())
    })
    .with_run_fn(|command, _| {
        Err(HookError::ToolFailed {
            command: command.to_string(),
            message: "boom".to_string(),
        })
    });

    let err = harness.run_hook("start", None, None).unwrap_err();
    let HookError::HandlerFailed { source, .. } = err else {
        panic!("expected handler failure");
    };
    assert!(matches!(
        source.downcast_ref::<HookError>(),
        Some(HookError::ToolFailed { .. })
    ));
    assert!(harness.closed());
}
