//! Callbacks around editor actions, run in registration order.

use grid::{editor_state::FieldMap, table::DataTable};
use model::core::value::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Continue,
    /// Stops the action; nothing further is persisted.
    Abort,
}

impl From<bool> for HookOutcome {
    fn from(proceed: bool) -> Self {
        if proceed {
            HookOutcome::Continue
        } else {
            HookOutcome::Abort
        }
    }
}

/// Receives the instance and the row as submitted.
pub type EntityHook<E> = Arc<dyn Fn(&DataTable, &E, &FieldMap) -> HookOutcome + Send + Sync>;

/// Receives the identifiers of the removed rows.
pub type RemoveHook = Arc<dyn Fn(&DataTable, &[Value]) -> HookOutcome + Send + Sync>;

pub struct Hooks<E> {
    pub before_create: Vec<EntityHook<E>>,
    pub after_create: Vec<EntityHook<E>>,
    pub before_edit: Vec<EntityHook<E>>,
    pub after_edit: Vec<EntityHook<E>>,
    pub before_remove: Vec<RemoveHook>,
    pub after_remove: Vec<RemoveHook>,
}

impl<E> Default for Hooks<E> {
    fn default() -> Self {
        Self {
            before_create: Vec::new(),
            after_create: Vec::new(),
            before_edit: Vec::new(),
            after_edit: Vec::new(),
            before_remove: Vec::new(),
            after_remove: Vec::new(),
        }
    }
}

/// Runs `hooks` until one aborts.
pub(crate) fn run_entity_hooks<E>(
    hooks: &[EntityHook<E>],
    table: &DataTable,
    instance: &E,
    row: &FieldMap,
) -> HookOutcome {
    for hook in hooks {
        if hook(table, instance, row) == HookOutcome::Abort {
            return HookOutcome::Abort;
        }
    }
    HookOutcome::Continue
}

pub(crate) fn run_remove_hooks(hooks: &[RemoveHook], table: &DataTable, ids: &[Value]) -> HookOutcome {
    for hook in hooks {
        if hook(table, ids) == HookOutcome::Abort {
            return HookOutcome::Abort;
        }
    }
    HookOutcome::Continue
}
