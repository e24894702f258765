//! Authorization gate for control-list transitions.
//!
//! Every workflow operation calls the gate explicitly at its top; the gate
//! is an injected dependency so tests can substitute their own policy. It
//! is a pure predicate: same inputs, same answer, no side effects.

use crate::domain::{Actor, ControlList, ListStatus};

/// Decides whether an actor may move a control list to a target status.
pub trait AccessPolicy: Send + Sync {
    fn can_transition(&self, actor: &Actor, list: &ControlList, target: ListStatus) -> bool;
}

/// Default policy: role plus ownership/scope checks, fail-closed.
///
/// - `Draft → Pending`: only the assigned operator.
/// - `Pending → Approved | Rejected`: only a supervisor-capable actor whose
///   managed scope covers the list's company.
/// - Anything else is denied.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleScopeGate;

impl AccessPolicy for RoleScopeGate {
    fn can_transition(&self, actor: &Actor, list: &ControlList, target: ListStatus) -> bool {
        match (list.status, target) {
            (ListStatus::Draft, ListStatus::Pending) => actor.id == list.operator_id,
            (ListStatus::Pending, ListStatus::Approved)
            | (ListStatus::Pending, ListStatus::Rejected) => actor.supervises(list.company_id),
            _ => false,
        }
    }
}
