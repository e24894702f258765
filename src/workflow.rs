//! The control-list state machine and the workflow operations built on it.
//!
//! Lifecycle: `Draft → Pending → Approved | Rejected`, terminal states are
//! never left. Every operation runs the same pipeline: rate limit, then
//! authorization gate, then business-rule validation, then a compare-and-set
//! commit, then event emission and notification dispatch. Nothing mutates
//! before the commit; dispatch runs strictly after it and its failures are
//! logged, never propagated into the committed result.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::authz::AccessPolicy;
use crate::config::DecisionPolicy;
use crate::delivery::DeliveryChannel;
use crate::dispatch::{Directory, NotificationDispatcher};
use crate::domain::{
    ActorId, ControlList, ControlListId, DomainEvent, ItemCounts, ListStatus, Machine,
    MachineId, MachinePayload,
};
use crate::error::WorkflowError;
use crate::rate_limit::RateLimiter;
use crate::store::WorkflowStore;
use crate::validate;

/// A supervisor's verdict on a pending control list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn target_status(self) -> ListStatus {
        match self {
            Decision::Approved => ListStatus::Approved,
            Decision::Rejected => ListStatus::Rejected,
        }
    }
}

/// Inbound emergency alert payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyAlert {
    pub alert_type: String,
    pub message: String,
    #[serde(default)]
    pub machine_id: Option<MachineId>,
}

/// Result of a committed control-list transition. The committed record and
/// its domain event travel together: one is never observable without the
/// other.
#[derive(Debug, Clone)]
pub struct TransitionReceipt {
    pub list: ControlList,
    pub event: DomainEvent,
    /// False when post-commit notification dispatch failed; the transition
    /// itself stands regardless.
    pub dispatch_ok: bool,
}

/// Result of a committed machine write.
#[derive(Debug, Clone)]
pub struct MachineReceipt {
    pub machine: Machine,
    /// Present only when the operational status actually changed.
    pub event: Option<DomainEvent>,
    pub dispatch_ok: bool,
}

pub struct WorkflowEngine<S, P, D, C> {
    store: S,
    gate: P,
    dispatcher: NotificationDispatcher<D, C>,
    limiter: RateLimiter,
    policy: DecisionPolicy,
}

impl<S, P, D, C> WorkflowEngine<S, P, D, C>
where
    S: WorkflowStore,
    P: AccessPolicy,
    D: Directory,
    C: DeliveryChannel,
{
    pub fn new(
        store: S,
        gate: P,
        dispatcher: NotificationDispatcher<D, C>,
        limiter: RateLimiter,
        policy: DecisionPolicy,
    ) -> Self {
        Self {
            store,
            gate,
            dispatcher,
            limiter,
            policy,
        }
    }

    /// Submits a draft control list for review: `Draft → Pending`.
    ///
    /// Item counts are recomputed here and frozen; later item edits never
    /// retroactively change a decided list.
    pub fn submit_control_list(
        &self,
        list_id: ControlListId,
        actor_id: ActorId,
    ) -> Result<TransitionReceipt, WorkflowError> {
        self.limiter.check(actor_id)?;
        let actor = self.resolve_actor(actor_id)?;
        let list = self.store.control_list(list_id)?;

        if list.status != ListStatus::Draft {
            return Err(WorkflowError::Conflict(format!(
                "control list {list_id} is {} and cannot be submitted",
                list.status
            )));
        }
        if !self.gate.can_transition(&actor, &list, ListStatus::Pending) {
            return Err(WorkflowError::Authorization(format!(
                "actor {actor_id} may not submit control list {list_id}"
            )));
        }
        validate::validate_submission(&list).map_err(WorkflowError::Validation)?;

        let expected_version = list.version;
        let mut updated = list;
        updated.counts = ItemCounts::from_items(&updated.items);
        updated.status = ListStatus::Pending;
        updated.submitted_at = Some(Utc::now());

        let committed = self.store.commit_list(updated, expected_version)?;
        let event = DomainEvent::ControlListSubmitted {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            list_id: committed.id,
            list_title: committed.title.clone(),
            company_id: committed.company_id,
            machine_id: committed.machine_id,
            operator_id: committed.operator_id,
            total_items: committed.counts.total,
            passed_items: committed.counts.passed,
            failed_items: committed.counts.failed,
        };

        info!(list_id, actor_id, "control list submitted for review");
        let dispatch_ok = self.dispatch_after_commit(&event);
        Ok(TransitionReceipt {
            list: committed,
            event,
            dispatch_ok,
        })
    }

    /// Applies a supervisor decision: `Pending → Approved | Rejected`.
    ///
    /// Concurrent decisions on the same list are serialized by the store's
    /// compare-and-set: at most one transition out of `Pending` succeeds,
    /// the loser gets a `Conflict`.
    pub fn decide_control_list(
        &self,
        list_id: ControlListId,
        actor_id: ActorId,
        decision: Decision,
        note: Option<String>,
    ) -> Result<TransitionReceipt, WorkflowError> {
        self.limiter.check(actor_id)?;
        let actor = self.resolve_actor(actor_id)?;
        let list = self.store.control_list(list_id)?;

        if list.status.is_terminal() {
            return Err(WorkflowError::Conflict(format!(
                "control list {list_id} is already {}",
                list.status
            )));
        }
        if list.status != ListStatus::Pending {
            return Err(WorkflowError::Conflict(format!(
                "control list {list_id} is {} and cannot be decided",
                list.status
            )));
        }

        let target = decision.target_status();
        if !self.gate.can_transition(&actor, &list, target) {
            return Err(WorkflowError::Authorization(format!(
                "actor {actor_id} may not decide control list {list_id}"
            )));
        }
        validate::validate_decision_note(decision, note.as_deref(), &self.policy)
            .map_err(WorkflowError::Validation)?;

        let expected_version = list.version;
        let mut updated = list;
        updated.status = target;
        updated.decided_at = Some(Utc::now());
        updated.decided_by = Some(actor_id);
        updated.decision_note = note.clone();

        let committed = self.store.commit_list(updated, expected_version)?;
        let event = match decision {
            Decision::Approved => DomainEvent::ControlListApproved {
                event_id: Uuid::new_v4(),
                occurred_at: Utc::now(),
                list_id: committed.id,
                list_title: committed.title.clone(),
                company_id: committed.company_id,
                operator_id: committed.operator_id,
                decided_by: actor_id,
                note,
            },
            Decision::Rejected => DomainEvent::ControlListRejected {
                event_id: Uuid::new_v4(),
                occurred_at: Utc::now(),
                list_id: committed.id,
                list_title: committed.title.clone(),
                company_id: committed.company_id,
                operator_id: committed.operator_id,
                decided_by: actor_id,
                note,
            },
        };

        info!(list_id, actor_id, decision = ?decision, "control list decided");
        let dispatch_ok = self.dispatch_after_commit(&event);
        Ok(TransitionReceipt {
            list: committed,
            event,
            dispatch_ok,
        })
    }

    /// Registers a new machine under the actor's company.
    pub fn create_machine(
        &self,
        actor_id: ActorId,
        payload: MachinePayload,
    ) -> Result<Machine, WorkflowError> {
        self.limiter.check(actor_id)?;
        let actor = self.resolve_actor(actor_id)?;
        if !actor.role.is_supervisor_capable() {
            return Err(WorkflowError::Authorization(format!(
                "actor {actor_id} may not register machines"
            )));
        }

        let serial_taken = self.store.serial_taken(&payload.serial_number, None)?;
        validate::validate_machine(&payload, serial_taken).map_err(WorkflowError::Validation)?;

        let id = self.store.allocate_machine_id()?;
        let machine = Machine::from_payload(id, actor.company_id, payload);
        let committed = self.store.commit_machine(machine, 0)?;
        info!(machine_id = committed.id, actor_id, "machine registered");
        Ok(committed)
    }

    /// Updates a machine; emits `MachineStatusChanged` only when the
    /// operational status actually changed.
    pub fn update_machine(
        &self,
        machine_id: MachineId,
        actor_id: ActorId,
        payload: MachinePayload,
    ) -> Result<MachineReceipt, WorkflowError> {
        self.limiter.check(actor_id)?;
        let actor = self.resolve_actor(actor_id)?;
        let machine = self.store.machine(machine_id)?;

        if !actor.supervises(machine.company_id) {
            return Err(WorkflowError::Authorization(format!(
                "actor {actor_id} may not update machine {machine_id}"
            )));
        }

        let serial_taken = self
            .store
            .serial_taken(&payload.serial_number, Some(machine_id))?;
        validate::validate_machine(&payload, serial_taken).map_err(WorkflowError::Validation)?;

        let expected_version = machine.version;
        let old_status = machine.status;
        let mut updated = machine;
        updated.apply_payload(payload);

        let committed = self.store.commit_machine(updated, expected_version)?;
        if old_status == committed.status {
            return Ok(MachineReceipt {
                machine: committed,
                event: None,
                dispatch_ok: true,
            });
        }

        let event = DomainEvent::MachineStatusChanged {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            machine_id: committed.id,
            machine_name: committed.name.clone(),
            company_id: committed.company_id,
            old_status,
            new_status: committed.status,
        };
        info!(
            machine_id,
            old_status = %old_status,
            new_status = %committed.status,
            "machine status changed"
        );
        let dispatch_ok = self.dispatch_after_commit(&event);
        Ok(MachineReceipt {
            machine: committed,
            event: Some(event),
            dispatch_ok,
        })
    }

    /// Raises an emergency alert. There is no state to commit here, so a
    /// failure to queue the notification is reported to the caller.
    pub fn raise_emergency_alert(
        &self,
        actor_id: ActorId,
        alert: EmergencyAlert,
    ) -> Result<DomainEvent, WorkflowError> {
        self.limiter.check(actor_id)?;
        let actor = self.resolve_actor(actor_id)?;

        // The alert scopes to the machine's company when a machine is named.
        let company_id = match alert.machine_id {
            Some(machine_id) => self.store.machine(machine_id)?.company_id,
            None => actor.company_id,
        };

        let event = DomainEvent::EmergencyAlertRaised {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            company_id,
            alert_type: alert.alert_type,
            message: alert.message,
            machine_id: alert.machine_id,
            raised_by: actor_id,
        };
        warn!(
            actor_id,
            company_id = event.company_id(),
            kind = event.kind_name(),
            "emergency alert raised"
        );
        self.dispatcher.dispatch(&event)?;
        Ok(event)
    }

    /// Actor identity that cannot be resolved is an authentication
    /// failure, not a missing record.
    fn resolve_actor(&self, actor_id: ActorId) -> Result<crate::domain::Actor, WorkflowError> {
        self.store.actor(actor_id).map_err(|e| match e {
            WorkflowError::NotFound { .. } => WorkflowError::Authentication(format!(
                "actor {actor_id} could not be established"
            )),
            other => other,
        })
    }

    /// Post-commit dispatch: failures go to the operational log, never back
    /// to the caller whose transition already committed.
    fn dispatch_after_commit(&self, event: &DomainEvent) -> bool {
        match self.dispatcher.dispatch(event) {
            Ok(_) => true,
            Err(e) => {
                error!(
                    error = %e,
                    kind = event.kind_name(),
                    "notification dispatch failed after commit"
                );
                false
            }
        }
    }
}
