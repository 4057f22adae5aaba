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

//! Hook name vocabulary and validation.

use once_cell::sync::Lazy;
use regex::Regex;

static HOOK_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").expect("hook name pattern"));

/// Lifecycle hooks every unit may receive regardless of its relations.
pub const MAIN_HOOKS: &[&str] = &[
    "install",
    "start",
    "stop",
    "upgrade-charm",
    "config-changed",
    "leader-elected",
    "leader-settings-changed",
    "update-status",
];

/// Suffixes of the hooks fired for every relation.
pub const RELATION_HOOK_KINDS: &[&str] = &["joined", "changed", "departed", "broken"];

/// Reports whether `name` can be used as a hook name.
///
/// Hook names are lowercase words of letters and digits joined by single
/// hyphens, e.g. `config-changed` or `db2-relation-joined`.
pub fn is_valid_hook_name(name: &str) -> bool {
    HOOK_NAME.is_match(name)
}

/// All hook names fired for the relation called `relation_name`.
pub fn relation_hook_names(relation_name: &str) -> Vec<String> {
    RELATION_HOOK_KINDS
        .iter()
        .map(|kind| format!("{}-relation-{}", relation_name, kind))
        .collect()
}

/// Splits a relation hook name into its relation name, or `None` for
/// hooks that are not relation hooks.
pub fn relation_name_of_hook(hook_name: &str) -> Option<&str> {
    RELATION_HOOK_KINDS.iter().find_map(|kind| {
        hook_name
            .strip_suffix(kind)
            .and_then(|rest| rest.strip_suffix("-relation-"))
            .filter(|name| !name.is_empty())
    })
}
