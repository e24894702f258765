use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::{ActorId, CompanyId};
use super::control_list::ControlListId;
use super::machine::{MachineId, MachineStatus};

/// An immutable record of a state change, consumed by the notification
/// dispatcher. Carries the minimal payload needed to render a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    ControlListSubmitted {
        event_id: Uuid,
        occurred_at: DateTime<Utc>,
        list_id: ControlListId,
        list_title: String,
        company_id: CompanyId,
        machine_id: MachineId,
        operator_id: ActorId,
        total_items: u32,
        passed_items: u32,
        failed_items: u32,
    },
    ControlListApproved {
        event_id: Uuid,
        occurred_at: DateTime<Utc>,
        list_id: ControlListId,
        list_title: String,
        company_id: CompanyId,
        operator_id: ActorId,
        decided_by: ActorId,
        note: Option<String>,
    },
    ControlListRejected {
        event_id: Uuid,
        occurred_at: DateTime<Utc>,
        list_id: ControlListId,
        list_title: String,
        company_id: CompanyId,
        operator_id: ActorId,
        decided_by: ActorId,
        note: Option<String>,
    },
    MachineStatusChanged {
        event_id: Uuid,
        occurred_at: DateTime<Utc>,
        machine_id: MachineId,
        machine_name: String,
        company_id: CompanyId,
        old_status: MachineStatus,
        new_status: MachineStatus,
    },
    EmergencyAlertRaised {
        event_id: Uuid,
        occurred_at: DateTime<Utc>,
        company_id: CompanyId,
        alert_type: String,
        message: String,
        machine_id: Option<MachineId>,
        raised_by: ActorId,
    },
}

impl DomainEvent {
    pub fn event_id(&self) -> Uuid {
        match self {
            DomainEvent::ControlListSubmitted { event_id, .. }
            | DomainEvent::ControlListApproved { event_id, .. }
            | DomainEvent::ControlListRejected { event_id, .. }
            | DomainEvent::MachineStatusChanged { event_id, .. }
            | DomainEvent::EmergencyAlertRaised { event_id, .. } => *event_id,
        }
    }

    pub fn company_id(&self) -> CompanyId {
        match self {
            DomainEvent::ControlListSubmitted { company_id, .. }
            | DomainEvent::ControlListApproved { company_id, .. }
            | DomainEvent::ControlListRejected { company_id, .. }
            | DomainEvent::MachineStatusChanged { company_id, .. }
            | DomainEvent::EmergencyAlertRaised { company_id, .. } => *company_id,
        }
    }

    /// Deduplication key derived from event identity. Control-list
    /// transitions are one-shot per list, so their keys are deterministic:
    /// replaying the same logical event yields the same key and the
    /// dispatcher queues its jobs at most once. Machine status transitions
    /// and emergency alerts can legitimately recur, so each occurrence
    /// keys on its own event id.
    pub fn dedup_key(&self) -> String {
        match self {
            DomainEvent::ControlListSubmitted { list_id, .. } => {
                format!("control-list:{list_id}:submitted")
            }
            DomainEvent::ControlListApproved { list_id, .. } => {
                format!("control-list:{list_id}:approved")
            }
            DomainEvent::ControlListRejected { list_id, .. } => {
                format!("control-list:{list_id}:rejected")
            }
            DomainEvent::MachineStatusChanged {
                event_id,
                machine_id,
                ..
            } => {
                // A machine may go out of service more than once; every
                // committed transition gets its own notification.
                format!("machine:{machine_id}:status:{event_id}")
            }
            DomainEvent::EmergencyAlertRaised { event_id, .. } => {
                // Alerts are never coalesced; each raise is its own event.
                format!("emergency:{event_id}")
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            DomainEvent::ControlListSubmitted { .. } => "control_list_submitted",
            DomainEvent::ControlListApproved { .. } => "control_list_approved",
            DomainEvent::ControlListRejected { .. } => "control_list_rejected",
            DomainEvent::MachineStatusChanged { .. } => "machine_status_changed",
            DomainEvent::EmergencyAlertRaised { .. } => "emergency_alert_raised",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted(list_id: ControlListId) -> DomainEvent {
        DomainEvent::ControlListSubmitted {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            list_id,
            list_title: "Daily check".into(),
            company_id: 10,
            machine_id: 42,
            operator_id: 3,
            total_items: 5,
            passed_items: 4,
            failed_items: 1,
        }
    }

    #[test]
    fn dedup_key_is_deterministic_per_logical_event() {
        let a = submitted(7);
        let b = submitted(7);
        // Distinct event ids, same logical identity.
        assert_ne!(a.event_id(), b.event_id());
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_eq!(a.dedup_key(), "control-list:7:submitted");
    }

    #[test]
    fn dedup_key_distinguishes_lists_and_transitions() {
        assert_ne!(submitted(7).dedup_key(), submitted(8).dedup_key());
    }

    #[test]
    fn emergency_alerts_are_never_coalesced() {
        let make = || DomainEvent::EmergencyAlertRaised {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            company_id: 10,
            alert_type: "fire".into(),
            message: "Fire near bay 3".into(),
            machine_id: Some(42),
            raised_by: 1,
        };
        assert_ne!(make().dedup_key(), make().dedup_key());
    }

    #[test]
    fn event_serializes_with_kind_tag() {
        let json = serde_json::to_string(&submitted(7)).unwrap();
        assert!(json.contains("\"kind\":\"control_list_submitted\""));
    }

    #[test]
    fn repeated_status_transitions_get_distinct_keys() {
        let make = || DomainEvent::MachineStatusChanged {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            machine_id: 42,
            machine_name: "EX-1".into(),
            company_id: 10,
            old_status: MachineStatus::Active,
            new_status: MachineStatus::OutOfService,
        };
        // Identical transitions recur; each committed occurrence must be
        // its own logical event.
        let first = make();
        assert_ne!(first.dedup_key(), make().dedup_key());
        // Replaying the same event still yields the same key.
        assert_eq!(first.dedup_key(), first.clone().dedup_key());
    }
}
